use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Base date of the 1900 serial-date system (serial 0).
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// A cell's content.
///
/// Numbers keep their source text so untouched cells round-trip exactly.
/// Text is always owned (shared strings are resolved at load time).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    /// Numeric value, verbatim `<v>` text.
    Number(String),
    /// String value, written back as an inline string.
    Text(String),
    Bool(bool),
    /// Formula with its cached result, both verbatim. `attrs` carries the
    /// `<f>` element's attributes (`t`, `si`, `ref`, ...) so shared-formula
    /// groups keep their structure; a follower cell has an empty `expr`.
    Formula {
        expr: String,
        attrs: Vec<(String, String)>,
        cached: Option<String>,
    },
    /// Any typed value we do not interpret (errors, ISO dates): the `t`
    /// attribute plus the raw `<v>` text, preserved as-is.
    Raw { t: String, v: String },
}

/// One cell: value plus the style index from the sheet's `s` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cell {
    pub value: CellValue,
    pub style: Option<u32>,
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: CellValue::Text(value.into()),
            style: None,
        }
    }

    pub fn number(value: Decimal) -> Self {
        Self {
            value: CellValue::Number(value.normalize().to_string()),
            style: None,
        }
    }

    /// A date cell: the 1900-system serial number, styled by the caller.
    pub fn date(value: NaiveDate) -> Self {
        let (y, m, d) = SERIAL_EPOCH;
        let epoch = NaiveDate::from_ymd_opt(y, m, d).expect("valid epoch");
        let serial = value.signed_duration_since(epoch).num_days();
        Self {
            value: CellValue::Number(serial.to_string()),
            style: None,
        }
    }

    pub fn with_style(mut self, style: Option<u32>) -> Self {
        self.style = style;
        self
    }

    /// Text content, if this is a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// True when the cell carries no value (it may still carry a style).
    pub fn is_blank(&self) -> bool {
        self.value == CellValue::Empty
    }
}
