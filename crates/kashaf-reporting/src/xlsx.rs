//! Minimal SpreadsheetML (`.xlsx`) writer.
//!
//! Produces a single-sheet workbook with a bold header row. Text is stored as
//! inline strings and page numbers as numeric cells, so no shared-string
//! table is needed.

use std::io::{Cursor, Write};

use kashaf_core::{IndexRecord, Page};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::{COLUMNS, ExportError};

const SHEET_NAME: &str = "Sheet1";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

// Cell style 1 is the bold header.
const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/></cellXfs><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles></styleSheet>"#;

fn workbook_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        SHEET_NAME
    )
}

/// Escape text for XML content and attributes, dropping characters XML 1.0
/// cannot represent.
pub fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if c < '\x20' || c == '\u{FFFE}' || c == '\u{FFFF}' => {}
            c => out.push(c),
        }
    }
    out
}

/// Spreadsheet column letters for a 0-based index (0 → A, 26 → AA).
pub fn column_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

enum Cell<'a> {
    Text(&'a str),
    Number(u32),
}

fn write_row(out: &mut String, row: usize, cells: &[Cell<'_>], style: Option<u32>) {
    out.push_str(&format!(r#"<row r="{}">"#, row));
    let style_attr = style.map(|s| format!(r#" s="{}""#, s)).unwrap_or_default();
    for (col, cell) in cells.iter().enumerate() {
        let reference = format!("{}{}", column_name(col), row);
        match cell {
            Cell::Text(text) => out.push_str(&format!(
                r#"<c r="{}" t="inlineStr"{}><is><t xml:space="preserve">{}</t></is></c>"#,
                reference,
                style_attr,
                xml_escape(text)
            )),
            Cell::Number(n) => out.push_str(&format!(
                r#"<c r="{}"{}><v>{}</v></c>"#,
                reference, style_attr, n
            )),
        }
    }
    out.push_str("</row>");
}

/// The worksheet XML: header row, then one row per record.
pub fn sheet_xml(records: &[IndexRecord]) -> String {
    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );

    let header: Vec<Cell<'_>> = COLUMNS.iter().map(|h| Cell::Text(h)).collect();
    write_row(&mut out, 1, &header, Some(1));

    for (i, r) in records.iter().enumerate() {
        let unknown = Page::Unknown.to_string();
        let page = match r.page {
            Page::Number(n) => Cell::Number(n),
            Page::Unknown => Cell::Text(&unknown),
        };
        let cells = [
            Cell::Text(&r.excerpt),
            Cell::Text(&r.category),
            Cell::Text(&r.title),
            Cell::Text(&r.rationale),
            page,
        ];
        write_row(&mut out, i + 2, &cells, None);
    }

    out.push_str("</sheetData></worksheet>");
    out
}

/// Build a complete `.xlsx` package in memory.
pub fn write_workbook(records: &[IndexRecord]) -> Result<Vec<u8>, ExportError> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let parts: [(&str, String); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", ROOT_RELS.to_string()),
        ("xl/workbook.xml", workbook_xml()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.to_string()),
        ("xl/styles.xml", STYLES.to_string()),
        ("xl/worksheets/sheet1.xml", sheet_xml(records)),
    ];

    for (name, content) in &parts {
        zip.start_file(*name, options)?;
        zip.write_all(content.as_bytes())?;
    }

    Ok(zip.finish()?.into_inner())
}
