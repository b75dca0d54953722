use super::XlsxError;

/// Convert a 1-based column index to letters ("A", "Z", "AA", ...).
pub fn column_letters(col: u32) -> String {
    debug_assert!(col >= 1);
    let mut n = col;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push(b'A' + rem);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).expect("ASCII letters")
}

/// Convert column letters to a 1-based index.
pub fn column_index(letters: &str) -> Result<u32, XlsxError> {
    if letters.is_empty() {
        return Err(XlsxError::InvalidReference(letters.to_string()));
    }
    let mut col = 0u32;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return Err(XlsxError::InvalidReference(letters.to_string()));
        }
        let digit = ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
        // Checked: a malformed file can carry arbitrarily long letter runs
        col = col
            .checked_mul(26)
            .and_then(|c| c.checked_add(digit))
            .ok_or_else(|| XlsxError::InvalidReference(letters.to_string()))?;
    }
    Ok(col)
}

/// A single cell position, 1-based in both dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parse an A1-style reference ("B7"). Absolute markers (`$`) are accepted
    /// and discarded.
    pub fn parse(reference: &str) -> Result<Self, XlsxError> {
        let cleaned: String = reference.chars().filter(|c| *c != '$').collect();
        let split = cleaned
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| XlsxError::InvalidReference(reference.to_string()))?;
        let (letters, digits) = cleaned.split_at(split);
        let col = column_index(letters)?;
        let row: u32 = digits
            .parse()
            .map_err(|_| XlsxError::InvalidReference(reference.to_string()))?;
        if row == 0 {
            return Err(XlsxError::InvalidReference(reference.to_string()));
        }
        Ok(Self { row, col })
    }
}

impl std::fmt::Display for CellRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", column_letters(self.col), self.row)
    }
}

/// A rectangular cell range ("B4:I10").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: CellRef,
    pub end: CellRef,
}

impl Range {
    pub fn new(start: CellRef, end: CellRef) -> Self {
        Self { start, end }
    }

    /// Parse an A1-style range reference. A bare cell reference is treated as
    /// a single-cell range.
    pub fn parse(reference: &str) -> Result<Self, XlsxError> {
        match reference.split_once(':') {
            Some((start, end)) => Ok(Self {
                start: CellRef::parse(start)?,
                end: CellRef::parse(end)?,
            }),
            None => {
                let cell = CellRef::parse(reference)?;
                Ok(Self {
                    start: cell,
                    end: cell,
                })
            }
        }
    }

    /// Number of columns spanned.
    pub fn column_count(&self) -> u32 {
        self.end.col - self.start.col + 1
    }
}

impl std::fmt::Display for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}
