//! Paragraph text extraction from `.docx` (WordprocessingML) packages.
//!
//! Only top-level body paragraphs are read; paragraphs inside tables, text
//! boxes and content controls are skipped, as are tracked insertions. Page
//! and column breaks contribute no text. Blank paragraphs are dropped and the
//! rest joined with `\n`.

use std::io::{Cursor, Read};

use kashaf_core::DocumentError;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Archive member holding the main document body.
const BODY_PART: &str = "word/document.xml";

/// Default limit on the uncompressed body size (256 MB).
pub const DEFAULT_MAX_BODY_SIZE: u64 = 256 * 1024 * 1024;

/// Extract the body text of a `.docx` file held in memory.
/// `max_body_size` limits the uncompressed body (0 = unlimited).
pub fn extract_text(data: &[u8], max_body_size: u64) -> Result<String, DocumentError> {
    let xml = read_body_part(data, max_body_size)?;
    let paragraphs = body_paragraphs(&xml)?;
    tracing::debug!(paragraphs = paragraphs.len(), "extracted docx paragraphs");
    Ok(paragraphs
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

fn read_body_part(data: &[u8], max_body_size: u64) -> Result<Vec<u8>, DocumentError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))
        .map_err(|e| DocumentError::Malformed(format!("failed to open package: {}", e)))?;

    let mut part = archive.by_name(BODY_PART).map_err(|e| {
        DocumentError::Malformed(format!("missing {} in package: {}", BODY_PART, e))
    })?;

    if max_body_size > 0 && part.size() > max_body_size {
        return Err(DocumentError::Malformed(format!(
            "document body is {} bytes, over the {} byte limit",
            part.size(),
            max_body_size
        )));
    }

    let mut xml = Vec::with_capacity(part.size() as usize);
    part.read_to_end(&mut xml)
        .map_err(|e| DocumentError::Malformed(format!("failed to inflate {}: {}", BODY_PART, e)))?;
    Ok(xml)
}

/// Text of every top-level `w:p` in document order, blank ones included.
pub fn body_paragraphs(xml: &[u8]) -> Result<Vec<String>, DocumentError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;
    // Depth inside elements whose text is not part of the body paragraph text.
    let mut nested = 0usize;
    let mut in_text = false;
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| {
            DocumentError::Malformed(format!(
                "XML error at byte {}: {}",
                reader.buffer_position(),
                e
            ))
        })?;

        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"tbl" | b"txbxContent" | b"sdt" | b"ins" => nested += 1,
                b"p" if nested == 0 => current = Some(String::new()),
                b"t" => in_text = nested == 0 && current.is_some(),
                _ => {}
            },
            Event::Empty(e) => {
                if nested == 0
                    && let Some(text) = current.as_mut()
                {
                    match e.local_name().as_ref() {
                        b"tab" => text.push('\t'),
                        b"br" if is_line_break(&e) => text.push('\n'),
                        b"cr" => text.push('\n'),
                        _ => {}
                    }
                }
                // An empty <w:p/> is still a paragraph.
                if nested == 0 && e.local_name().as_ref() == b"p" {
                    paragraphs.push(String::new());
                }
            }
            Event::Text(t) => {
                if in_text && let Some(text) = current.as_mut() {
                    let unescaped = t.unescape().map_err(|e| {
                        DocumentError::Malformed(format!("bad XML escape: {}", e))
                    })?;
                    text.push_str(&unescaped);
                }
            }
            Event::CData(t) => {
                if in_text && let Some(text) = current.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"tbl" | b"txbxContent" | b"sdt" | b"ins" => nested = nested.saturating_sub(1),
                b"p" if nested == 0 => {
                    if let Some(text) = current.take() {
                        paragraphs.push(text);
                    }
                }
                b"t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

/// `w:br` is a line break unless its `w:type` names a page or column break.
fn is_line_break(e: &BytesStart) -> bool {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == b"type")
        .is_none_or(|attr| attr.value.as_ref() == b"textWrapping")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            body
        )
    }

    #[test]
    fn runs_are_concatenated() {
        let xml = wrap(
            r#"<w:p><w:r><w:t>Hello </w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>world</w:t></w:r></w:p>"#,
        );
        assert_eq!(body_paragraphs(xml.as_bytes()).unwrap(), vec!["Hello world"]);
    }

    #[test]
    fn escaped_page_marker_survives() {
        let xml = wrap(r#"<w:p><w:r><w:t>&lt;/&lt;12&gt;نص</w:t></w:r></w:p>"#);
        assert_eq!(body_paragraphs(xml.as_bytes()).unwrap(), vec!["</<12>نص"]);
    }

    #[test]
    fn tabs_and_breaks() {
        let xml = wrap(r#"<w:p><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t><w:br/><w:t>c</w:t></w:r></w:p>"#);
        assert_eq!(body_paragraphs(xml.as_bytes()).unwrap(), vec!["a\tb\nc"]);
    }

    #[test]
    fn page_and_column_breaks_are_dropped() {
        let xml = wrap(
            r#"<w:p><w:r><w:t>end</w:t><w:br w:type="page"/><w:t>start</w:t></w:r></w:p>
<w:p><w:r><w:t>left</w:t><w:br w:type="column"/><w:t>right</w:t></w:r></w:p>"#,
        );
        assert_eq!(
            body_paragraphs(xml.as_bytes()).unwrap(),
            vec!["endstart", "leftright"]
        );
    }

    #[test]
    fn text_wrapping_break_is_newline() {
        let xml = wrap(
            r#"<w:p><w:r><w:t>a</w:t><w:br w:type="textWrapping" w:clear="all"/><w:t>b</w:t></w:r></w:p>"#,
        );
        assert_eq!(body_paragraphs(xml.as_bytes()).unwrap(), vec!["a\nb"]);
    }

    #[test]
    fn inserted_runs_are_skipped() {
        let xml = wrap(
            r#"<w:p><w:r><w:t>a</w:t></w:r><w:ins w:id="1" w:author="x"><w:r><w:t>INS</w:t></w:r></w:ins></w:p>"#,
        );
        assert_eq!(body_paragraphs(xml.as_bytes()).unwrap(), vec!["a"]);
    }

    #[test]
    fn content_control_paragraphs_are_skipped() {
        let xml = wrap(
            r#"<w:p><w:r><w:t>before</w:t></w:r></w:p>
<w:sdt><w:sdtPr><w:alias w:val="box"/></w:sdtPr><w:sdtContent><w:p><w:r><w:t>inside</w:t></w:r></w:p></w:sdtContent></w:sdt>
<w:p><w:r><w:t>after</w:t></w:r></w:p>"#,
        );
        assert_eq!(
            body_paragraphs(xml.as_bytes()).unwrap(),
            vec!["before", "after"]
        );
    }

    #[test]
    fn table_paragraphs_are_skipped() {
        let xml = wrap(
            r#"<w:p><w:r><w:t>before</w:t></w:r></w:p>
<w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
<w:p><w:r><w:t>after</w:t></w:r></w:p>"#,
        );
        assert_eq!(
            body_paragraphs(xml.as_bytes()).unwrap(),
            vec!["before", "after"]
        );
    }

    #[test]
    fn deleted_text_is_ignored() {
        let xml = wrap(
            r#"<w:p><w:del><w:r><w:delText>gone</w:delText></w:r></w:del><w:r><w:t xml:space="preserve"> kept </w:t></w:r></w:p>"#,
        );
        assert_eq!(body_paragraphs(xml.as_bytes()).unwrap(), vec![" kept "]);
    }

    #[test]
    fn empty_paragraphs_are_reported() {
        let xml = wrap(r#"<w:p/><w:p><w:r><w:t>x</w:t></w:r></w:p><w:p></w:p>"#);
        assert_eq!(body_paragraphs(xml.as_bytes()).unwrap(), vec!["", "x", ""]);
    }

    #[test]
    fn malformed_xml_is_an_error() {
        let xml = wrap(r#"<w:p><w:r><w:t>oops</w:r></w:p>"#);
        assert!(matches!(
            body_paragraphs(xml.as_bytes()),
            Err(DocumentError::Malformed(_))
        ));
    }

    #[test]
    fn not_a_zip() {
        assert!(matches!(
            extract_text(b"PK but not really", 0),
            Err(DocumentError::Malformed(_))
        ));
    }
}
