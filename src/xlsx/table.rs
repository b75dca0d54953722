use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::io::Cursor;

use super::reference::Range;
use super::worksheet::skip_subtree;
use super::XlsxError;

/// One declared table column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumn {
    /// Sequential ordinal id, unique within the table.
    pub id: u32,
    /// Column name, sourced from the header cell.
    pub name: String,
}

/// A structured table object (`xl/tables/tableN.xml`).
///
/// Holds the structural metadata that must stay internally consistent after
/// every edit: the declared cell range, the header row count, the autofilter
/// range, and the column list. Serialization rewrites exactly those parts of
/// the original XML; everything else (style info, extra attributes) streams
/// through verbatim.
#[derive(Debug, Clone)]
pub struct Table {
    pub(crate) zip_path: String,
    source_xml: Vec<u8>,
    /// Display name of the table.
    pub name: String,
    /// Declared range, header row included.
    pub range: Range,
    pub header_row_count: u32,
    pub autofilter: Option<Range>,
    pub columns: Vec<TableColumn>,
}

impl Table {
    pub(crate) fn parse(zip_path: String, xml: Vec<u8>) -> Result<Self, XlsxError> {
        let mut reader = Reader::from_reader(xml.as_slice());
        reader.config_mut().trim_text(true);

        let mut name = String::new();
        let mut range = None;
        let mut header_row_count = 1u32;
        let mut autofilter = None;
        let mut columns = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                    match e.local_name().as_ref() {
                        b"table" => {
                            for attr in e.attributes() {
                                let attr = attr?;
                                match attr.key.as_ref() {
                                    b"ref" => {
                                        range = Some(Range::parse(&attr.unescape_value()?)?);
                                    }
                                    b"headerRowCount" => {
                                        header_row_count =
                                            attr.unescape_value()?.parse().unwrap_or(1);
                                    }
                                    b"displayName" => {
                                        name = attr.unescape_value()?.into_owned();
                                    }
                                    b"name" if name.is_empty() => {
                                        name = attr.unescape_value()?.into_owned();
                                    }
                                    _ => {}
                                }
                            }
                        }
                        b"autoFilter" => {
                            for attr in e.attributes() {
                                let attr = attr?;
                                if attr.key.as_ref() == b"ref" {
                                    autofilter = Some(Range::parse(&attr.unescape_value()?)?);
                                }
                            }
                        }
                        b"tableColumn" => {
                            let mut id = 0u32;
                            let mut col_name = String::new();
                            for attr in e.attributes() {
                                let attr = attr?;
                                match attr.key.as_ref() {
                                    b"id" => id = attr.unescape_value()?.parse().unwrap_or(0),
                                    b"name" => col_name = attr.unescape_value()?.into_owned(),
                                    _ => {}
                                }
                            }
                            columns.push(TableColumn { id, name: col_name });
                        }
                        _ => {}
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(e.into()),
                _ => {}
            }
            buf.clear();
        }

        let range = range.ok_or_else(|| {
            XlsxError::Structure(format!("table part {zip_path:?} has no ref attribute"))
        })?;

        Ok(Self {
            zip_path,
            source_xml: xml,
            name,
            range,
            header_row_count,
            autofilter,
            columns,
        })
    }

    /// Re-emit the table XML with the current structural metadata.
    pub(crate) fn to_xml(&self) -> Result<Vec<u8>, XlsxError> {
        let mut reader = Reader::from_reader(self.source_xml.as_slice());
        reader.config_mut().trim_text(false);
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        let mut buf = Vec::new();
        let mut saw_autofilter = false;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"table" => {
                    writer.write_event(Event::Start(self.table_start(e)?))?;
                }
                Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"table" => {
                    writer.write_event(Event::Empty(self.table_start(e)?))?;
                }
                Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"autoFilter" => {
                    saw_autofilter = true;
                    writer.write_event(Event::Start(self.autofilter_elem(e)?))?;
                }
                Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"autoFilter" => {
                    saw_autofilter = true;
                    writer.write_event(Event::Empty(self.autofilter_elem(e)?))?;
                }
                Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"tableColumns" => {
                    self.write_columns(&mut writer, &mut saw_autofilter)?;
                    skip_subtree(&mut reader, b"tableColumns")?;
                }
                Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"tableColumns" => {
                    self.write_columns(&mut writer, &mut saw_autofilter)?;
                }
                Ok(Event::Eof) => break,
                Ok(event) => writer.write_event(event.into_owned())?,
                Err(e) => return Err(e.into()),
            }
            buf.clear();
        }

        Ok(writer.into_inner().into_inner())
    }

    fn table_start(&self, original: &BytesStart<'_>) -> Result<BytesStart<'static>, XlsxError> {
        let mut elem = BytesStart::new("table");
        for attr in original.attributes() {
            let attr = attr?;
            if matches!(attr.key.as_ref(), b"ref" | b"headerRowCount") {
                continue;
            }
            elem.push_attribute(attr);
        }
        elem.push_attribute(("ref", self.range.to_string().as_str()));
        elem.push_attribute(("headerRowCount", self.header_row_count.to_string().as_str()));
        Ok(elem)
    }

    fn autofilter_elem(&self, original: &BytesStart<'_>) -> Result<BytesStart<'static>, XlsxError> {
        let mut elem = BytesStart::new("autoFilter");
        for attr in original.attributes() {
            let attr = attr?;
            if attr.key.as_ref() == b"ref" {
                continue;
            }
            elem.push_attribute(attr);
        }
        let reference = self
            .autofilter
            .unwrap_or(self.range)
            .to_string();
        elem.push_attribute(("ref", reference.as_str()));
        Ok(elem)
    }

    fn write_columns(
        &self,
        writer: &mut Writer<Cursor<Vec<u8>>>,
        saw_autofilter: &mut bool,
    ) -> Result<(), XlsxError> {
        use quick_xml::events::BytesEnd;

        // An autofilter set on the model but absent from the source XML is
        // injected here; schema order puts it directly before tableColumns.
        if !*saw_autofilter {
            if let Some(filter) = self.autofilter {
                let mut elem = BytesStart::new("autoFilter");
                elem.push_attribute(("ref", filter.to_string().as_str()));
                writer.write_event(Event::Empty(elem))?;
            }
            *saw_autofilter = true;
        }

        let mut cols = BytesStart::new("tableColumns");
        cols.push_attribute(("count", self.columns.len().to_string().as_str()));
        writer.write_event(Event::Start(cols))?;
        for column in &self.columns {
            let mut elem = BytesStart::new("tableColumn");
            elem.push_attribute(("id", column.id.to_string().as_str()));
            elem.push_attribute(("name", column.name.as_str()));
            writer.write_event(Event::Empty(elem))?;
        }
        writer.write_event(Event::End(BytesEnd::new("tableColumns")))?;
        Ok(())
    }
}
