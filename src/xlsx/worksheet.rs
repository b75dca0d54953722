use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::BTreeMap;
use std::io::{BufRead, Cursor};

use super::reference::{CellRef, Range};
use super::table::Table;
use super::{Cell, CellValue, XlsxError};

/// One sparse worksheet row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    /// Cells keyed by 1-based column index.
    pub cells: BTreeMap<u32, Cell>,
    /// Source `<row>` attributes other than `r` and `spans` (`ht`, `s`,
    /// `customHeight`, `hidden`, ...), re-emitted verbatim.
    pub(crate) attrs: Vec<(String, String)>,
}

/// An in-memory worksheet: sparse rows plus the sheet's original XML.
///
/// Edits happen on the row model; [`Worksheet::to_xml`] re-emits the original
/// sheet XML with only the `<sheetData>` subtree and the `<dimension>`
/// reference replaced.
#[derive(Debug, Clone)]
pub struct Worksheet {
    name: String,
    pub(crate) zip_path: String,
    source_xml: Vec<u8>,
    rows: BTreeMap<u32, Row>,
    /// Table objects anchored on this sheet.
    pub tables: Vec<Table>,
}

impl Worksheet {
    /// Parse a worksheet part, resolving shared-string cells through `shared`.
    pub(crate) fn parse(
        name: String,
        zip_path: String,
        xml: Vec<u8>,
        shared: &[String],
    ) -> Result<Self, XlsxError> {
        let mut reader = Reader::from_reader(xml.as_slice());
        reader.config_mut().trim_text(false);

        let mut rows: BTreeMap<u32, Row> = BTreeMap::new();
        let mut buf = Vec::new();

        // Per-cell parse state
        let mut current: Option<(CellRef, Option<u32>, String)> = None;
        let mut value: Option<String> = None;
        let mut formula: Option<String> = None;
        let mut formula_attrs: Vec<(String, String)> = Vec::new();
        let mut inline: Option<String> = None;
        let mut capture: Capture = Capture::None;
        let mut next_row = 1u32;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                    if e.local_name().as_ref() == b"row" =>
                {
                    let mut index = None;
                    for attr in e.attributes() {
                        let attr = attr?;
                        if attr.key.as_ref() == b"r" {
                            index = attr.unescape_value()?.parse::<u32>().ok();
                        }
                    }
                    let index = index.unwrap_or(next_row);
                    next_row = index + 1;
                    // `spans` is derived metadata and goes stale after edits
                    rows.entry(index).or_default().attrs =
                        element_attributes(e, &[b"r".as_slice(), b"spans".as_slice()])?;
                }
                Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"c" => {
                    // Self-closing cell: style only
                    let (cell_ref, style, _) = cell_attributes(e, &name)?;
                    rows.entry(cell_ref.row).or_default().cells.insert(
                        cell_ref.col,
                        Cell {
                            value: CellValue::Empty,
                            style,
                        },
                    );
                }
                Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"c" => {
                    current = Some(cell_attributes(e, &name)?);
                    value = None;
                    formula = None;
                    formula_attrs.clear();
                    inline = None;
                }
                Ok(Event::Start(ref e)) if current.is_some() => match e.local_name().as_ref() {
                    b"v" => capture = Capture::Value,
                    b"f" => {
                        capture = Capture::Formula;
                        formula_attrs = element_attributes(e, &[])?;
                        formula.get_or_insert_default();
                    }
                    b"t" => capture = Capture::Inline,
                    _ => {}
                },
                // A shared-formula follower: `<f t="shared" si="N"/>`
                Ok(Event::Empty(ref e))
                    if current.is_some() && e.local_name().as_ref() == b"f" =>
                {
                    formula_attrs = element_attributes(e, &[])?;
                    formula.get_or_insert_default();
                }
                Ok(Event::Text(ref e)) if current.is_some() => {
                    let text = e.unescape().unwrap_or_default();
                    match capture {
                        Capture::Value => value.get_or_insert_default().push_str(&text),
                        Capture::Formula => formula.get_or_insert_default().push_str(&text),
                        Capture::Inline => inline.get_or_insert_default().push_str(&text),
                        Capture::None => {}
                    }
                }
                Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                    b"v" | b"f" | b"t" => capture = Capture::None,
                    b"c" => {
                        if let Some((cell_ref, style, kind)) = current.take() {
                            let cell = Cell {
                                value: build_value(
                                    kind,
                                    value.take(),
                                    formula.take(),
                                    std::mem::take(&mut formula_attrs),
                                    inline.take(),
                                    shared,
                                )?,
                                style,
                            };
                            rows.entry(cell_ref.row)
                                .or_default()
                                .cells
                                .insert(cell_ref.col, cell);
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(e.into()),
                _ => {}
            }
            buf.clear();
        }

        Ok(Self {
            name,
            zip_path,
            source_xml: xml,
            rows,
            tables: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Iterate rows in ascending order.
    pub fn rows(&self) -> impl Iterator<Item = (u32, &Row)> {
        self.rows.iter().map(|(r, row)| (*r, row))
    }

    pub fn row(&self, row: u32) -> Option<&Row> {
        self.rows.get(&row)
    }

    pub fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.rows.get(&row)?.cells.get(&col)
    }

    /// Get or create a cell.
    pub fn cell_mut(&mut self, row: u32, col: u32) -> &mut Cell {
        self.rows.entry(row).or_default().cells.entry(col).or_default()
    }

    pub fn set_cell(&mut self, row: u32, col: u32, cell: Cell) {
        self.rows.entry(row).or_default().cells.insert(col, cell);
    }

    /// Overwrite row `dst` with a full copy of row `src` (values, formulas,
    /// styles).
    pub fn copy_row(&mut self, src: u32, dst: u32) {
        let copied = self.rows.get(&src).cloned().unwrap_or_default();
        self.rows.insert(dst, copied);
    }

    /// Blank every cell value in a row, keeping the cells and their styles.
    pub fn clear_row_values(&mut self, row: u32) {
        if let Some(row) = self.rows.get_mut(&row) {
            for cell in row.cells.values_mut() {
                cell.value = CellValue::Empty;
            }
        }
    }

    /// Move every row at or below `from` down by one. The vacated row has no
    /// cells afterwards.
    pub fn shift_rows_down(&mut self, from: u32) {
        let tail = self.rows.split_off(&from);
        self.rows
            .extend(tail.into_iter().map(|(index, row)| (index + 1, row)));
    }

    /// Highest populated row index, 0 when the sheet is empty.
    pub fn max_row(&self) -> u32 {
        self.rows.keys().next_back().copied().unwrap_or(0)
    }

    fn dimension(&self) -> String {
        let mut bounds: Option<(CellRef, CellRef)> = None;
        for (r, row) in &self.rows {
            for c in row.cells.keys() {
                let cell = CellRef::new(*r, *c);
                bounds = Some(match bounds {
                    None => (cell, cell),
                    Some((min, max)) => (
                        CellRef::new(min.row.min(cell.row), min.col.min(cell.col)),
                        CellRef::new(max.row.max(cell.row), max.col.max(cell.col)),
                    ),
                });
            }
        }
        match bounds {
            Some((min, max)) if min == max => min.to_string(),
            Some((min, max)) => Range::new(min, max).to_string(),
            None => "A1".to_string(),
        }
    }

    /// Re-emit the sheet XML with the current row model spliced in.
    pub(crate) fn to_xml(&self) -> Result<Vec<u8>, XlsxError> {
        let mut reader = Reader::from_reader(self.source_xml.as_slice());
        reader.config_mut().trim_text(false);
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"sheetData" => {
                    self.write_sheet_data(&mut writer)?;
                    skip_subtree(&mut reader, b"sheetData")?;
                }
                Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"sheetData" => {
                    self.write_sheet_data(&mut writer)?;
                }
                Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"dimension" => {
                    let mut elem = BytesStart::new("dimension");
                    elem.push_attribute(("ref", self.dimension().as_str()));
                    writer.write_event(Event::Empty(elem))?;
                }
                Ok(Event::Eof) => break,
                Ok(event) => writer.write_event(event.into_owned())?,
                Err(e) => return Err(e.into()),
            }
            buf.clear();
        }

        Ok(writer.into_inner().into_inner())
    }

    fn write_sheet_data(&self, writer: &mut Writer<Cursor<Vec<u8>>>) -> Result<(), XlsxError> {
        writer.write_event(Event::Start(BytesStart::new("sheetData")))?;
        for (index, row) in &self.rows {
            if row.cells.is_empty() && row.attrs.is_empty() {
                continue;
            }
            let mut row_elem = BytesStart::new("row");
            row_elem.push_attribute(("r", index.to_string().as_str()));
            for (key, value) in &row.attrs {
                row_elem.push_attribute((key.as_str(), value.as_str()));
            }
            if row.cells.is_empty() {
                writer.write_event(Event::Empty(row_elem))?;
                continue;
            }
            writer.write_event(Event::Start(row_elem))?;
            for (col, cell) in &row.cells {
                write_cell(writer, CellRef::new(*index, *col), cell)?;
            }
            writer.write_event(Event::End(quick_xml::events::BytesEnd::new("row")))?;
        }
        writer.write_event(Event::End(quick_xml::events::BytesEnd::new("sheetData")))?;
        Ok(())
    }
}

enum Capture {
    None,
    Value,
    Formula,
    Inline,
}

fn cell_attributes(
    e: &BytesStart<'_>,
    sheet_name: &str,
) -> Result<(CellRef, Option<u32>, String), XlsxError> {
    let mut cell_ref = None;
    let mut style = None;
    let mut kind = String::new();
    for attr in e.attributes() {
        let attr = attr?;
        match attr.key.as_ref() {
            b"r" => cell_ref = Some(CellRef::parse(&attr.unescape_value()?)?),
            b"s" => style = attr.unescape_value()?.parse::<u32>().ok(),
            b"t" => kind = attr.unescape_value()?.into_owned(),
            _ => {}
        }
    }
    let cell_ref = cell_ref.ok_or_else(|| {
        XlsxError::Structure(format!("cell without reference on sheet {sheet_name:?}"))
    })?;
    Ok((cell_ref, style, kind))
}

fn build_value(
    kind: String,
    value: Option<String>,
    formula: Option<String>,
    formula_attrs: Vec<(String, String)>,
    inline: Option<String>,
    shared: &[String],
) -> Result<CellValue, XlsxError> {
    if let Some(expr) = formula {
        return Ok(CellValue::Formula {
            expr,
            attrs: formula_attrs,
            cached: value,
        });
    }
    Ok(match kind.as_str() {
        "" | "n" => match value {
            Some(v) => CellValue::Number(v),
            None => CellValue::Empty,
        },
        "s" => {
            let raw = value.unwrap_or_default();
            let index: usize = raw
                .trim()
                .parse()
                .map_err(|_| XlsxError::Structure(format!("bad shared string index {raw:?}")))?;
            let text = shared.get(index).ok_or_else(|| {
                XlsxError::Structure(format!("shared string index {index} out of range"))
            })?;
            CellValue::Text(text.clone())
        }
        "inlineStr" => CellValue::Text(inline.unwrap_or_default()),
        "str" => CellValue::Text(value.unwrap_or_default()),
        "b" => CellValue::Bool(matches!(value.as_deref(), Some("1") | Some("true"))),
        other => CellValue::Raw {
            t: other.to_string(),
            v: value.unwrap_or_default(),
        },
    })
}

fn write_cell(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    at: CellRef,
    cell: &Cell,
) -> Result<(), XlsxError> {
    use quick_xml::events::BytesEnd;

    let mut elem = BytesStart::new("c");
    elem.push_attribute(("r", at.to_string().as_str()));
    if let Some(style) = cell.style {
        elem.push_attribute(("s", style.to_string().as_str()));
    }

    match &cell.value {
        CellValue::Empty => {
            writer.write_event(Event::Empty(elem))?;
        }
        CellValue::Number(v) => {
            writer.write_event(Event::Start(elem))?;
            write_text_element(writer, "v", v)?;
            writer.write_event(Event::End(BytesEnd::new("c")))?;
        }
        CellValue::Text(text) => {
            elem.push_attribute(("t", "inlineStr"));
            writer.write_event(Event::Start(elem))?;
            writer.write_event(Event::Start(BytesStart::new("is")))?;
            let mut t = BytesStart::new("t");
            t.push_attribute(("xml:space", "preserve"));
            writer.write_event(Event::Start(t))?;
            writer.write_event(Event::Text(BytesText::new(text)))?;
            writer.write_event(Event::End(BytesEnd::new("t")))?;
            writer.write_event(Event::End(BytesEnd::new("is")))?;
            writer.write_event(Event::End(BytesEnd::new("c")))?;
        }
        CellValue::Bool(b) => {
            elem.push_attribute(("t", "b"));
            writer.write_event(Event::Start(elem))?;
            write_text_element(writer, "v", if *b { "1" } else { "0" })?;
            writer.write_event(Event::End(BytesEnd::new("c")))?;
        }
        CellValue::Formula {
            expr,
            attrs,
            cached,
        } => {
            writer.write_event(Event::Start(elem))?;
            let mut f = BytesStart::new("f");
            for (key, value) in attrs {
                f.push_attribute((key.as_str(), value.as_str()));
            }
            if expr.is_empty() {
                // Shared-formula follower
                writer.write_event(Event::Empty(f))?;
            } else {
                writer.write_event(Event::Start(f))?;
                writer.write_event(Event::Text(BytesText::new(expr)))?;
                writer.write_event(Event::End(BytesEnd::new("f")))?;
            }
            if let Some(cached) = cached {
                write_text_element(writer, "v", cached)?;
            }
            writer.write_event(Event::End(BytesEnd::new("c")))?;
        }
        CellValue::Raw { t, v } => {
            elem.push_attribute(("t", t.as_str()));
            writer.write_event(Event::Start(elem))?;
            write_text_element(writer, "v", v)?;
            writer.write_event(Event::End(BytesEnd::new("c")))?;
        }
    }
    Ok(())
}

fn element_attributes(
    e: &BytesStart<'_>,
    skip: &[&[u8]],
) -> Result<Vec<(String, String)>, XlsxError> {
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        if skip.contains(&attr.key.as_ref()) {
            continue;
        }
        attrs.push((
            String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            attr.unescape_value()?.into_owned(),
        ));
    }
    Ok(attrs)
}

fn write_text_element(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    name: &str,
    text: &str,
) -> Result<(), XlsxError> {
    use quick_xml::events::BytesEnd;
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Consume events until the end tag matching an already-consumed start tag.
pub(crate) fn skip_subtree<R: BufRead>(
    reader: &mut Reader<R>,
    tag: &[u8],
) -> Result<(), XlsxError> {
    let mut depth = 0u32;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == tag => depth += 1,
            Ok(Event::End(ref e)) if e.local_name().as_ref() == tag => {
                if depth == 0 {
                    return Ok(());
                }
                depth -= 1;
            }
            Ok(Event::Eof) => {
                return Err(XlsxError::Structure(format!(
                    "unterminated <{}>",
                    String::from_utf8_lossy(tag)
                )));
            }
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }
}
