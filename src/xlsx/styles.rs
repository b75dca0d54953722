use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::io::Cursor;

use super::XlsxError;

/// First id available for custom number formats; lower ids are built-in.
const FIRST_CUSTOM_NUMFMT_ID: u32 = 164;

/// Register a custom number format plus a cell format referencing it in a
/// `styles.xml` part. Returns the patched XML and the cell-format index.
///
/// Idempotent against the file: an existing `numFmt` with the same format
/// code is reused, and when a cell format already references it the XML is
/// returned unchanged. Otherwise two passes over the XML: one to size
/// `numFmts`/`cellXfs`, one to splice the new entries in while everything
/// else streams through verbatim.
pub(crate) fn register_number_format(
    styles_xml: &[u8],
    format_code: &str,
) -> Result<(Vec<u8>, u32), XlsxError> {
    let survey = survey(styles_xml, format_code)?;
    if let Some(index) = survey.matching_xf_index {
        return Ok((styles_xml.to_vec(), index));
    }
    let (numfmt_id, add_numfmt) = match survey.matching_numfmt_id {
        Some(id) => (id, false),
        None => (
            survey.max_numfmt_id.map_or(FIRST_CUSTOM_NUMFMT_ID, |id| {
                id.max(FIRST_CUSTOM_NUMFMT_ID - 1) + 1
            }),
            true,
        ),
    };
    let new_xf_index = survey.cellxfs_count;

    let mut reader = Reader::from_reader(styles_xml);
    reader.config_mut().trim_text(false);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"styleSheet" => {
                writer.write_event(Event::Start(e.to_owned()))?;
                if add_numfmt && !survey.has_numfmts {
                    // numFmts must precede fonts; right after the root is safe.
                    let mut fmts = BytesStart::new("numFmts");
                    fmts.push_attribute(("count", "1"));
                    writer.write_event(Event::Start(fmts))?;
                    write_numfmt(&mut writer, numfmt_id, format_code)?;
                    writer.write_event(Event::End(BytesEnd::new("numFmts")))?;
                }
            }
            Ok(Event::Start(ref e)) if add_numfmt && e.local_name().as_ref() == b"numFmts" => {
                writer.write_event(Event::Start(bump_count(e, survey.numfmts_count + 1)?))?;
            }
            Ok(Event::End(ref e)) if add_numfmt && e.local_name().as_ref() == b"numFmts" => {
                write_numfmt(&mut writer, numfmt_id, format_code)?;
                writer.write_event(Event::End(e.to_owned()))?;
            }
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"cellXfs" => {
                writer.write_event(Event::Start(bump_count(e, survey.cellxfs_count + 1)?))?;
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"cellXfs" => {
                write_xf(&mut writer, numfmt_id)?;
                writer.write_event(Event::End(e.to_owned()))?;
            }
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"cellXfs" => {
                writer.write_event(Event::Start(bump_count(e, survey.cellxfs_count + 1)?))?;
                write_xf(&mut writer, numfmt_id)?;
                writer.write_event(Event::End(BytesEnd::new("cellXfs")))?;
            }
            Ok(Event::Eof) => break,
            Ok(event) => writer.write_event(event.into_owned())?,
            Err(e) => return Err(e.into()),
        }
        buf.clear();
    }

    Ok((writer.into_inner().into_inner(), new_xf_index))
}

struct Survey {
    has_numfmts: bool,
    numfmts_count: u32,
    max_numfmt_id: Option<u32>,
    cellxfs_count: u32,
    /// Existing `numFmt` with the requested format code.
    matching_numfmt_id: Option<u32>,
    /// Existing cell format referencing that `numFmt`.
    matching_xf_index: Option<u32>,
}

fn survey(styles_xml: &[u8], format_code: &str) -> Result<Survey, XlsxError> {
    let mut reader = Reader::from_reader(styles_xml);
    reader.config_mut().trim_text(true);

    let mut survey = Survey {
        has_numfmts: false,
        numfmts_count: 0,
        max_numfmt_id: None,
        cellxfs_count: 0,
        matching_numfmt_id: None,
        matching_xf_index: None,
    };
    let mut saw_cellxfs = false;
    let mut in_cellxfs = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"cellXfs" => {
                saw_cellxfs = true;
                in_cellxfs = true;
            }
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"cellXfs" => {
                saw_cellxfs = true;
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"cellXfs" => in_cellxfs = false,
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"numFmts" => survey.has_numfmts = true,
                b"numFmt" => {
                    survey.numfmts_count += 1;
                    let mut id = None;
                    let mut code_matches = false;
                    for attr in e.attributes() {
                        let attr = attr?;
                        match attr.key.as_ref() {
                            b"numFmtId" => id = attr.unescape_value()?.parse::<u32>().ok(),
                            b"formatCode" => {
                                code_matches = attr.unescape_value()? == format_code;
                            }
                            _ => {}
                        }
                    }
                    if let Some(id) = id {
                        survey.max_numfmt_id =
                            Some(survey.max_numfmt_id.map_or(id, |m: u32| m.max(id)));
                        if code_matches {
                            survey.matching_numfmt_id = Some(id);
                        }
                    }
                }
                // xf children are counted instead of trusting the count attribute
                b"xf" if in_cellxfs => {
                    if let Some(wanted) = survey.matching_numfmt_id {
                        for attr in e.attributes() {
                            let attr = attr?;
                            if attr.key.as_ref() == b"numFmtId"
                                && attr.unescape_value()?.parse::<u32>().ok() == Some(wanted)
                            {
                                survey.matching_xf_index = Some(survey.cellxfs_count);
                            }
                        }
                    }
                    survey.cellxfs_count += 1;
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    if !saw_cellxfs {
        return Err(XlsxError::Structure(
            "styles.xml has no cellXfs element".into(),
        ));
    }
    Ok(survey)
}

fn bump_count(original: &BytesStart<'_>, count: u32) -> Result<BytesStart<'static>, XlsxError> {
    let name = String::from_utf8_lossy(original.local_name().as_ref()).into_owned();
    let mut elem = BytesStart::new(name);
    for attr in original.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == b"count" {
            continue;
        }
        elem.push_attribute(attr);
    }
    elem.push_attribute(("count", count.to_string().as_str()));
    Ok(elem)
}

fn write_numfmt(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    id: u32,
    format_code: &str,
) -> Result<(), XlsxError> {
    let mut elem = BytesStart::new("numFmt");
    elem.push_attribute(("numFmtId", id.to_string().as_str()));
    elem.push_attribute(("formatCode", format_code));
    writer.write_event(Event::Empty(elem))?;
    Ok(())
}

fn write_xf(writer: &mut Writer<Cursor<Vec<u8>>>, numfmt_id: u32) -> Result<(), XlsxError> {
    let mut elem = BytesStart::new("xf");
    elem.push_attribute(("numFmtId", numfmt_id.to_string().as_str()));
    elem.push_attribute(("fontId", "0"));
    elem.push_attribute(("fillId", "0"));
    elem.push_attribute(("borderId", "0"));
    elem.push_attribute(("xfId", "0"));
    elem.push_attribute(("applyNumberFormat", "1"));
    writer.write_event(Event::Empty(elem))?;
    Ok(())
}
