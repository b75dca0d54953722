use quick_xml::Reader;
use quick_xml::events::Event;
use rust_decimal::Decimal;
use std::str::FromStr;

use super::{INCOME_TAX_SCHEME, LOCAL_TAX_SCHEME};
use crate::core::{CATEGORY_LABEL, DateValue, ExtractionError, InvoiceRecord};

/// Parse an embedded UBL invoice document into an [`InvoiceRecord`].
///
/// Scalar fields are matched first-occurrence-wins across the whole document;
/// withholding totals are matched per `cac:WithholdingTaxTotal` block and
/// classified by scheme name. Blocks whose scheme matches neither income tax
/// nor local tax are ignored. When several blocks classify to the same kind,
/// the last one encountered wins (historical behavior, deliberately not
/// summed).
pub fn parse_invoice(invoice_xml: &str) -> Result<InvoiceRecord, ExtractionError> {
    let mut reader = Reader::from_str(invoice_xml);
    reader.config_mut().trim_text(true);

    let mut record = ParsedRecord::default();
    let mut path: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = std::str::from_utf8(e.name().as_ref())
                    .unwrap_or("")
                    .to_string();
                if name == "cac:WithholdingTaxTotal" {
                    record.current_withholding = Some(ParsedWithholding::default());
                }
                path.push(name);
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default().to_string();
                if !text.is_empty() {
                    record.handle_text(&path, &text);
                }
            }
            Ok(Event::CData(ref e)) => {
                let text = String::from_utf8_lossy(e).to_string();
                if !text.trim().is_empty() {
                    record.handle_text(&path, text.trim());
                }
            }
            Ok(Event::End(_)) => {
                let ended = path.pop().unwrap_or_default();
                if ended == "cac:WithholdingTaxTotal" {
                    record.finish_withholding()?;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractionError::Xml(e.to_string())),
            _ => {}
        }
    }

    record.into_record()
}

#[derive(Default)]
struct ParsedRecord {
    supplier_tax_id: Option<String>,
    supplier_name: Option<String>,
    invoice_number: Option<String>,
    issue_date: Option<String>,
    taxable_base: Option<String>,
    total_amount: Option<String>,
    withheld_income_tax: Option<Decimal>,
    withheld_local_tax: Option<Decimal>,
    current_withholding: Option<ParsedWithholding>,
}

#[derive(Default)]
struct ParsedWithholding {
    amount: Option<String>,
    scheme_name: Option<String>,
}

impl ParsedRecord {
    fn handle_text(&mut self, path: &[String], text: &str) {
        let leaf = path.last().map(|s| s.as_str()).unwrap_or("");
        let parent = if path.len() >= 2 {
            path[path.len() - 2].as_str()
        } else {
            ""
        };
        let in_withholding = path.iter().any(|p| p == "cac:WithholdingTaxTotal");

        if in_withholding {
            if let Some(block) = self.current_withholding.as_mut() {
                match leaf {
                    "cbc:TaxAmount" if parent == "cac:WithholdingTaxTotal" => {
                        set_first(&mut block.amount, text);
                    }
                    "cbc:Name" if parent == "cac:TaxScheme" => {
                        set_first(&mut block.scheme_name, text);
                    }
                    _ => {}
                }
            }
            return;
        }

        match leaf {
            // Root-level identification: invoice number and issue date sit
            // directly under the document element.
            "cbc:ID" if path.len() == 2 => set_first(&mut self.invoice_number, text),
            "cbc:IssueDate" if path.len() == 2 => set_first(&mut self.issue_date, text),
            "cbc:CompanyID" => set_first(&mut self.supplier_tax_id, text),
            "cbc:RegistrationName" => set_first(&mut self.supplier_name, text),
            "cbc:LineExtensionAmount" => set_first(&mut self.taxable_base, text),
            "cbc:PayableAmount" => set_first(&mut self.total_amount, text),
            _ => {}
        }
    }

    fn finish_withholding(&mut self) -> Result<(), ExtractionError> {
        let Some(block) = self.current_withholding.take() else {
            return Ok(());
        };
        let scheme = match &block.scheme_name {
            Some(name) => name.to_uppercase(),
            None => return Ok(()),
        };

        let slot = if scheme.contains(INCOME_TAX_SCHEME) {
            &mut self.withheld_income_tax
        } else if scheme.contains(LOCAL_TAX_SCHEME) {
            &mut self.withheld_local_tax
        } else {
            return Ok(());
        };

        let raw = block
            .amount
            .ok_or(ExtractionError::MissingField("cbc:TaxAmount"))?;
        *slot = Some(parse_decimal("cbc:TaxAmount", &raw)?);
        Ok(())
    }

    fn into_record(self) -> Result<InvoiceRecord, ExtractionError> {
        let supplier_tax_id = require(self.supplier_tax_id, "cbc:CompanyID")?;
        let supplier_name = require(self.supplier_name, "cbc:RegistrationName")?;
        let invoice_number = require(self.invoice_number, "cbc:ID")?;
        let issue_date_raw = require(self.issue_date, "cbc:IssueDate")?;
        let taxable_base = parse_decimal(
            "cbc:LineExtensionAmount",
            &require(self.taxable_base, "cbc:LineExtensionAmount")?,
        )?;
        let total_amount = parse_decimal(
            "cbc:PayableAmount",
            &require(self.total_amount, "cbc:PayableAmount")?,
        )?;

        Ok(InvoiceRecord {
            supplier_tax_id,
            supplier_name,
            invoice_number,
            issue_date: DateValue::parse(&issue_date_raw),
            total_amount,
            taxable_base,
            withheld_income_tax: self.withheld_income_tax.unwrap_or_default(),
            withheld_local_tax: self.withheld_local_tax.unwrap_or_default(),
            category_label: CATEGORY_LABEL.to_string(),
        })
    }
}

fn set_first(slot: &mut Option<String>, text: &str) {
    if slot.is_none() {
        *slot = Some(text.to_string());
    }
}

fn require(value: Option<String>, field: &'static str) -> Result<String, ExtractionError> {
    value.ok_or(ExtractionError::MissingField(field))
}

fn parse_decimal(field: &'static str, raw: &str) -> Result<Decimal, ExtractionError> {
    Decimal::from_str(raw.trim()).map_err(|_| ExtractionError::InvalidField {
        field,
        value: raw.to_string(),
    })
}
