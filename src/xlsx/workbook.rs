use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::styles::register_number_format;
use super::table::Table;
use super::worksheet::Worksheet;
use super::XlsxError;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const STYLES_PART: &str = "xl/styles.xml";
const TABLE_REL_TYPE_SUFFIX: &str = "/table";

/// Ledger date display format (`14/8/2025` style).
const DATE_FORMAT_CODE: &str = "d/mm/yyyy";

/// An XLSX workbook held fully in memory.
///
/// Every zip entry is kept as raw bytes; worksheets and their tables are
/// additionally parsed into editable models. Saving rewrites the whole zip:
/// edited parts are re-emitted, everything else goes back byte-for-byte.
#[derive(Debug)]
pub struct Workbook {
    entries: Vec<(String, Vec<u8>)>,
    sheets: Vec<Worksheet>,
    date_style: Option<u32>,
}

impl Workbook {
    /// Open a workbook file.
    pub fn open(path: &Path) -> Result<Self, XlsxError> {
        Self::from_bytes(std::fs::read(path)?)
    }

    /// Open a workbook from its zip bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, XlsxError> {
        let mut zip = ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = Vec::with_capacity(zip.len());
        for index in 0..zip.len() {
            let mut file = zip.by_index(index)?;
            if file.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            entries.push((file.name().to_string(), data));
        }

        let shared = match entry(&entries, SHARED_STRINGS_PART) {
            Some(xml) => parse_shared_strings(xml)?,
            None => Vec::new(),
        };

        let workbook_xml = entry(&entries, WORKBOOK_PART)
            .ok_or_else(|| XlsxError::Structure(format!("missing {WORKBOOK_PART}")))?;
        let sheet_refs = parse_sheet_refs(workbook_xml)?;
        let workbook_rels = entry(&entries, WORKBOOK_RELS_PART)
            .ok_or_else(|| XlsxError::Structure(format!("missing {WORKBOOK_RELS_PART}")))?;
        let rels = parse_rels(workbook_rels)?;

        let mut sheets = Vec::with_capacity(sheet_refs.len());
        for (sheet_name, rel_id) in sheet_refs {
            let rel = rels.iter().find(|r| r.id == rel_id).ok_or_else(|| {
                XlsxError::Structure(format!("sheet {sheet_name:?}: unknown relationship {rel_id}"))
            })?;
            let sheet_path = resolve_path("xl", &rel.target);
            let sheet_xml = entry(&entries, &sheet_path)
                .ok_or_else(|| XlsxError::Structure(format!("missing {sheet_path}")))?;
            let mut sheet =
                Worksheet::parse(sheet_name, sheet_path.clone(), sheet_xml.to_vec(), &shared)?;
            sheet.tables = load_tables(&entries, &sheet_path)?;
            sheets.push(sheet);
        }

        Ok(Self {
            entries,
            sheets,
            date_style: None,
        })
    }

    /// Look up a sheet by its exact name.
    pub fn sheet(&self, name: &str) -> Option<&Worksheet> {
        self.sheets.iter().find(|s| s.name() == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Worksheet> {
        self.sheets.iter_mut().find(|s| s.name() == name)
    }

    /// Cell-format index for date display, registering it in `styles.xml` on
    /// first use.
    pub fn date_style_id(&mut self) -> Result<u32, XlsxError> {
        if let Some(id) = self.date_style {
            return Ok(id);
        }
        let styles = entry(&self.entries, STYLES_PART)
            .ok_or_else(|| XlsxError::Structure(format!("missing {STYLES_PART}")))?;
        let (patched, id) = register_number_format(styles, DATE_FORMAT_CODE)?;
        if let Some(slot) = self
            .entries
            .iter_mut()
            .find(|(name, _)| name == STYLES_PART)
        {
            slot.1 = patched;
        }
        self.date_style = Some(id);
        Ok(id)
    }

    /// Serialize the workbook back to zip bytes (single full rewrite).
    pub fn to_bytes(&self) -> Result<Vec<u8>, XlsxError> {
        let mut patched: HashMap<&str, Vec<u8>> = HashMap::new();
        for sheet in &self.sheets {
            patched.insert(sheet.zip_path.as_str(), sheet.to_xml()?);
            for table in &sheet.tables {
                patched.insert(table.zip_path.as_str(), table.to_xml()?);
            }
        }

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, bytes) in &self.entries {
            writer.start_file(name.clone(), options)?;
            match patched.get(name.as_str()) {
                Some(replacement) => writer.write_all(replacement)?,
                None => writer.write_all(bytes)?,
            }
        }
        Ok(writer.finish()?.into_inner())
    }

    /// Write the workbook to `path`.
    pub fn save(&self, path: &Path) -> Result<(), XlsxError> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }
}

fn entry<'a>(entries: &'a [(String, Vec<u8>)], path: &str) -> Option<&'a [u8]> {
    entries
        .iter()
        .find(|(name, _)| name == path)
        .map(|(_, bytes)| bytes.as_slice())
}

fn load_tables(
    entries: &[(String, Vec<u8>)],
    sheet_path: &str,
) -> Result<Vec<Table>, XlsxError> {
    let (dir, file) = sheet_path
        .rsplit_once('/')
        .unwrap_or(("", sheet_path));
    let rels_path = format!("{dir}/_rels/{file}.rels");
    let Some(rels_xml) = entry(entries, &rels_path) else {
        return Ok(Vec::new());
    };

    let mut tables = Vec::new();
    for rel in parse_rels(rels_xml)? {
        if !rel.kind.ends_with(TABLE_REL_TYPE_SUFFIX) {
            continue;
        }
        let table_path = resolve_path(dir, &rel.target);
        let table_xml = entry(entries, &table_path)
            .ok_or_else(|| XlsxError::Structure(format!("missing {table_path}")))?;
        tables.push(Table::parse(table_path.clone(), table_xml.to_vec())?);
    }
    Ok(tables)
}

struct Relationship {
    id: String,
    kind: String,
    target: String,
}

fn parse_rels(xml: &[u8]) -> Result<Vec<Relationship>, XlsxError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut rels = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let mut rel = Relationship {
                    id: String::new(),
                    kind: String::new(),
                    target: String::new(),
                };
                for attr in e.attributes() {
                    let attr = attr?;
                    match attr.key.as_ref() {
                        b"Id" => rel.id = attr.unescape_value()?.into_owned(),
                        b"Type" => rel.kind = attr.unescape_value()?.into_owned(),
                        b"Target" => rel.target = attr.unescape_value()?.into_owned(),
                        _ => {}
                    }
                }
                rels.push(rel);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }
    Ok(rels)
}

fn parse_sheet_refs(xml: &[u8]) -> Result<Vec<(String, String)>, XlsxError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut sheets = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.local_name().as_ref() == b"sheet" =>
            {
                let mut name = String::new();
                let mut rel_id = String::new();
                for attr in e.attributes() {
                    let attr = attr?;
                    match attr.key.as_ref() {
                        b"name" => name = attr.unescape_value()?.into_owned(),
                        b"r:id" => rel_id = attr.unescape_value()?.into_owned(),
                        _ => {}
                    }
                }
                sheets.push((name, rel_id));
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }
    Ok(sheets)
}

fn parse_shared_strings(xml: &[u8]) -> Result<Vec<String>, XlsxError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut strings = Vec::new();
    let mut buf = Vec::new();
    let mut in_item = false;
    let mut in_text = false;
    let mut in_phonetic = false;
    let mut current = String::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"si" => {
                    in_item = true;
                    current.clear();
                }
                b"rPh" => in_phonetic = true,
                b"t" if in_item && !in_phonetic => in_text = true,
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_text => {
                current.push_str(&e.unescape().unwrap_or_default());
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"si" => {
                    in_item = false;
                    strings.push(std::mem::take(&mut current));
                }
                b"rPh" => in_phonetic = false,
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

/// Resolve a relationship target against the directory of its source part.
fn resolve_path(base_dir: &str, target: &str) -> String {
    let joined = match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None if base_dir.is_empty() => target.to_string(),
        None => format!("{base_dir}/{target}"),
    };
    let mut parts: Vec<&str> = Vec::new();
    for part in joined.split('/') {
        match part {
            "." | "" => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}
