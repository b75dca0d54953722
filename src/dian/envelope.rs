use quick_xml::Reader;
use quick_xml::events::Event;

use super::EMBEDDED_INVOICE_NODE;
use crate::core::ExtractionError;

/// Extract the embedded invoice document from an `AttachedDocument` envelope.
///
/// Returns the trimmed text content of the first `cbc:Description` node
/// (character data or CDATA — DIAN senders use both). Fails with
/// [`ExtractionError::MissingNode`] when the envelope has no such node.
pub fn extract_embedded_invoice(envelope_xml: &str) -> Result<String, ExtractionError> {
    let mut reader = Reader::from_str(envelope_xml);
    reader.config_mut().trim_text(false);

    let mut inside = false;
    let mut depth = 0u32;
    let mut embedded = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = e.name();
                let name = std::str::from_utf8(name.as_ref()).unwrap_or("");
                if inside {
                    depth += 1;
                } else if name == EMBEDDED_INVOICE_NODE {
                    inside = true;
                    depth = 0;
                }
            }
            Ok(Event::Text(ref e)) if inside => {
                embedded.push_str(&e.unescape().unwrap_or_default());
            }
            Ok(Event::CData(ref e)) if inside => {
                embedded.push_str(&String::from_utf8_lossy(e));
            }
            Ok(Event::End(_)) if inside => {
                if depth == 0 {
                    let text = embedded.trim();
                    if text.is_empty() {
                        return Err(ExtractionError::MissingNode(EMBEDDED_INVOICE_NODE));
                    }
                    return Ok(text.to_string());
                }
                depth -= 1;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractionError::Xml(e.to_string())),
            _ => {}
        }
    }

    Err(ExtractionError::MissingNode(EMBEDDED_INVOICE_NODE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulls_cdata_content() {
        let envelope = r#"<?xml version="1.0"?>
            <AttachedDocument>
              <cac:Attachment>
                <cac:ExternalReference>
                  <cbc:MimeCode>text/xml</cbc:MimeCode>
                  <cbc:Description><![CDATA[<Invoice><cbc:ID>F-1</cbc:ID></Invoice>]]></cbc:Description>
                </cac:ExternalReference>
              </cac:Attachment>
            </AttachedDocument>"#;
        let embedded = extract_embedded_invoice(envelope).unwrap();
        assert_eq!(embedded, "<Invoice><cbc:ID>F-1</cbc:ID></Invoice>");
    }

    #[test]
    fn pulls_escaped_text_content() {
        let envelope = concat!(
            "<AttachedDocument><cbc:Description>",
            "&lt;Invoice&gt;&lt;cbc:ID&gt;F-2&lt;/cbc:ID&gt;&lt;/Invoice&gt;",
            "</cbc:Description></AttachedDocument>"
        );
        let embedded = extract_embedded_invoice(envelope).unwrap();
        assert_eq!(embedded, "<Invoice><cbc:ID>F-2</cbc:ID></Invoice>");
    }

    #[test]
    fn missing_description_node_fails() {
        let envelope = "<AttachedDocument><cbc:ID>1</cbc:ID></AttachedDocument>";
        let err = extract_embedded_invoice(envelope).unwrap_err();
        assert!(matches!(err, ExtractionError::MissingNode("cbc:Description")));
    }

    #[test]
    fn first_description_wins() {
        let envelope = concat!(
            "<AttachedDocument>",
            "<cbc:Description>first</cbc:Description>",
            "<cbc:Description>second</cbc:Description>",
            "</AttachedDocument>"
        );
        assert_eq!(extract_embedded_invoice(envelope).unwrap(), "first");
    }
}
