//! DIAN nested-document extraction.
//!
//! Colombian electronic invoices arrive as a UBL `AttachedDocument` envelope
//! that carries the complete commercial invoice embedded *as text* inside one
//! description node. Extraction is two-stage:
//!
//! 1. [`extract_embedded_invoice`] — pull the embedded text out of the envelope.
//! 2. [`parse_invoice`] — reparse that text as an independent UBL document and
//!    extract the fixed field set into an [`InvoiceRecord`].
//!
//! Extraction is tolerant, not a conformance checker: fields are matched by
//! first occurrence (mirroring the historical behavior), unknown content is
//! ignored, and no schema validation happens.
//!
//! [`InvoiceRecord`]: crate::core::InvoiceRecord

mod envelope;
mod invoice;

pub use envelope::extract_embedded_invoice;
pub use invoice::parse_invoice;

/// Envelope node whose text content is the embedded invoice document.
pub const EMBEDDED_INVOICE_NODE: &str = "cbc:Description";

/// Withholding scheme-name fragment classifying an income-tax block.
pub const INCOME_TAX_SCHEME: &str = "RENTA";

/// Withholding scheme-name fragment classifying a local-tax block.
pub const LOCAL_TAX_SCHEME: &str = "ICA";
