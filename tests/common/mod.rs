//! Shared fixtures: a minimal but complete ledger workbook (zip built in
//! memory) and DIAN envelope/invoice XML builders.
#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::Path;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub const SHEET_NAME: &str = "RETENCION 2025";

/// Header row of the fixture table.
pub const HEADER_ROW: u32 = 4;
/// Row carrying the pre-existing data row.
pub const DATA_ROW: u32 = 5;
/// Row carrying the `TOTALES` sentinel in the pristine fixture.
pub const SENTINEL_ROW: u32 = 6;

const CONTENT_TYPES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    r#"<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
    r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
    r#"<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#,
    r#"<Override PartName="/xl/tables/table1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.table+xml"/>"#,
    r#"</Types>"#,
);

const ROOT_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
    r#"</Relationships>"#,
);

const WORKBOOK: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    r#"<sheets><sheet name="RETENCION 2025" sheetId="1" r:id="rId1"/></sheets>"#,
    r#"</workbook>"#,
);

const WORKBOOK_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>"#,
    r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
    r#"<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
    r#"</Relationships>"#,
);

const SHARED_STRINGS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="2" uniqueCount="2">"#,
    r#"<si><t>Proveedor</t></si><si><t>TOTALES</t></si>"#,
    r#"</sst>"#,
);

const STYLES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    r#"<fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>"#,
    r#"<fills count="1"><fill><patternFill patternType="none"/></fill></fills>"#,
    r#"<borders count="1"><border/></borders>"#,
    r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
    r#"<cellXfs count="3">"#,
    r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#,
    r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0" applyAlignment="1"/>"#,
    r#"<xf numFmtId="4" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>"#,
    r#"</cellXfs>"#,
    r#"</styleSheet>"#,
);

const SHEET: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    r#"<dimension ref="A4:I6"/>"#,
    r#"<sheetData>"#,
    r#"<row r="4">"#,
    r#"<c r="B4" s="1" t="s"><v>0</v></c>"#,
    r#"<c r="C4" s="1" t="inlineStr"><is><t>NIT</t></is></c>"#,
    r#"<c r="E4" s="1" t="inlineStr"><is><t>Fecha</t></is></c>"#,
    r#"<c r="F4" s="1" t="inlineStr"><is><t>Factura</t></is></c>"#,
    r#"<c r="G4" s="1" t="inlineStr"><is><t>Valor</t></is></c>"#,
    r#"<c r="H4" s="1" t="inlineStr"><is><t>Base</t></is></c>"#,
    r#"<c r="I4" s="1" t="inlineStr"><is><t>Concepto</t></is></c>"#,
    r#"</row>"#,
    r#"<row r="5">"#,
    r#"<c r="B5" t="inlineStr"><is><t>Anterior SAS</t></is></c>"#,
    r#"<c r="C5" t="inlineStr"><is><t>800999888</t></is></c>"#,
    r#"<c r="G5" s="2"><v>500000</v></c>"#,
    r#"<c r="H5" s="2"><v>420168</v></c>"#,
    r#"</row>"#,
    r#"<row r="6" ht="18" customHeight="1">"#,
    r#"<c r="A6" s="1" t="s"><v>1</v></c>"#,
    r#"<c r="G6" s="2"><f>SUM(G5:G5)</f><v>500000</v></c>"#,
    r#"<c r="H6" s="2"><f>SUM(H5:H5)</f><v>420168</v></c>"#,
    r#"</row>"#,
    r#"</sheetData>"#,
    r#"<tableParts count="1"><tablePart r:id="rId1"/></tableParts>"#,
    r#"</worksheet>"#,
);

const SHEET_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/table" Target="../tables/table1.xml"/>"#,
    r#"</Relationships>"#,
);

const TABLE: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<table xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
    r#"id="1" name="Retenciones" displayName="Retenciones" ref="A4:I5" headerRowCount="1" totalsRowShown="0">"#,
    r#"<autoFilter ref="A4:I5"/>"#,
    r#"<tableColumns count="9">"#,
    r#"<tableColumn id="1" name="Column1"/>"#,
    r#"<tableColumn id="2" name="Proveedor"/>"#,
    r#"<tableColumn id="3" name="NIT"/>"#,
    r#"<tableColumn id="4" name="Column4"/>"#,
    r#"<tableColumn id="5" name="Fecha"/>"#,
    r#"<tableColumn id="6" name="Factura"/>"#,
    r#"<tableColumn id="7" name="Valor"/>"#,
    r#"<tableColumn id="8" name="Base"/>"#,
    r#"<tableColumn id="9" name="Concepto"/>"#,
    r#"</tableColumns>"#,
    r#"<tableStyleInfo name="TableStyleMedium2" showRowStripes="1"/>"#,
    r#"</table>"#,
);

/// Build the fixture workbook as zip bytes: one sheet named `RETENCION 2025`
/// with a header row, one data row, a `TOTALES` sentinel row with SUM
/// formulas, and a table object spanning `A4:I5`.
pub fn ledger_workbook() -> Vec<u8> {
    let parts: &[(&str, &str)] = &[
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("xl/workbook.xml", WORKBOOK),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
        ("xl/sharedStrings.xml", SHARED_STRINGS),
        ("xl/styles.xml", STYLES),
        ("xl/worksheets/sheet1.xml", SHEET),
        ("xl/worksheets/_rels/sheet1.xml.rels", SHEET_RELS),
        ("xl/tables/table1.xml", TABLE),
    ];

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, content) in parts {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Write the fixture workbook to disk.
pub fn write_ledger_workbook(path: &Path) {
    std::fs::write(path, ledger_workbook()).unwrap();
}

/// Build an embedded UBL invoice document.
///
/// `withholdings` is a list of `(scheme_name, amount)` pairs, one
/// `cac:WithholdingTaxTotal` block each.
pub fn invoice_xml(
    supplier_name: &str,
    supplier_nit: &str,
    invoice_number: &str,
    issue_date: &str,
    total: &str,
    base: &str,
    withholdings: &[(&str, &str)],
) -> String {
    let mut blocks = String::new();
    for (scheme, amount) in withholdings {
        blocks.push_str(&format!(
            concat!(
                "<cac:WithholdingTaxTotal>",
                "<cbc:TaxAmount currencyID=\"COP\">{amount}</cbc:TaxAmount>",
                "<cac:TaxSubtotal><cac:TaxCategory><cac:TaxScheme>",
                "<cbc:Name>{scheme}</cbc:Name>",
                "</cac:TaxScheme></cac:TaxCategory></cac:TaxSubtotal>",
                "</cac:WithholdingTaxTotal>",
            ),
            amount = amount,
            scheme = scheme,
        ));
    }

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            "<Invoice ",
            r#"xmlns:cbc="urn:oasis:names:specification:ubl:schema:xsd:CommonBasicComponents-2" "#,
            r#"xmlns:cac="urn:oasis:names:specification:ubl:schema:xsd:CommonAggregateComponents-2">"#,
            "<cbc:ID>{number}</cbc:ID>",
            "<cbc:IssueDate>{date}</cbc:IssueDate>",
            "<cac:AccountingSupplierParty><cac:Party><cac:PartyTaxScheme>",
            "<cbc:RegistrationName>{name}</cbc:RegistrationName>",
            "<cbc:CompanyID>{nit}</cbc:CompanyID>",
            "</cac:PartyTaxScheme></cac:Party></cac:AccountingSupplierParty>",
            "{blocks}",
            "<cac:LegalMonetaryTotal>",
            "<cbc:LineExtensionAmount currencyID=\"COP\">{base}</cbc:LineExtensionAmount>",
            "<cbc:PayableAmount currencyID=\"COP\">{total}</cbc:PayableAmount>",
            "</cac:LegalMonetaryTotal>",
            "</Invoice>",
        ),
        number = invoice_number,
        date = issue_date,
        name = supplier_name,
        nit = supplier_nit,
        blocks = blocks,
        base = base,
        total = total,
    )
}

/// Wrap an invoice document in an `AttachedDocument` envelope, embedded as
/// CDATA the way DIAN senders deliver it.
pub fn envelope_xml(invoice: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            "<AttachedDocument>",
            "<cbc:ID>AD-1</cbc:ID>",
            "<cac:Attachment><cac:ExternalReference>",
            "<cbc:MimeCode>text/xml</cbc:MimeCode>",
            "<cbc:Description><![CDATA[{invoice}]]></cbc:Description>",
            "</cac:ExternalReference></cac:Attachment>",
            "</AttachedDocument>",
        ),
        invoice = invoice,
    )
}

/// A complete envelope for a simple invoice with both withholding kinds.
pub fn sample_envelope(supplier_name: &str, invoice_number: &str, issue_date: &str) -> String {
    envelope_xml(&invoice_xml(
        supplier_name,
        "900123456",
        invoice_number,
        issue_date,
        "1190000",
        "1000000",
        &[("RENTA", "25000"), ("ICA", "9660")],
    ))
}
