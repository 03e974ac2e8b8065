//! Splitting document text into pages using inline `</<N>` markers.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::{Page, PageChunk};

/// `</<N>` opens page N. `\d` is Unicode-aware, so digits from any script
/// are captured and normalized in [`parse_page_number`].
static PAGE_MARKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"</<(\d+)>").unwrap());

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageMarkerError {
    #[error("page marker at byte {offset} has an unreadable number {token:?}")]
    InvalidNumber { token: String, offset: usize },
}

/// Split `text` into page chunks.
///
/// Each marker's number applies to the text after it, up to the next marker
/// or the end of the text. Anything before the first marker is dropped, and
/// chunk content is trimmed. Page numbers are taken as written: duplicates
/// and out-of-order numbers are kept.
pub fn split_pages(text: &str) -> Result<Vec<PageChunk>, PageMarkerError> {
    let markers: Vec<_> = PAGE_MARKER_RE.captures_iter(text).collect();
    let mut chunks = Vec::with_capacity(markers.len());

    for (i, caps) in markers.iter().enumerate() {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let digits = &caps[1];
        let page = parse_page_number(digits).ok_or_else(|| PageMarkerError::InvalidNumber {
            token: digits.to_string(),
            offset: whole.start(),
        })?;

        let end = markers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(text.len());

        chunks.push(PageChunk {
            page,
            content: text[whole.end()..end].trim().to_string(),
        });
    }

    tracing::debug!(pages = chunks.len(), "split text into pages");
    Ok(chunks)
}

/// The zero of every Unicode decimal digit block, sorted. Each block holds
/// ten consecutive code points, zero through nine.
const DIGIT_ZEROS: [char; 76] = [
    '\u{0030}', '\u{0660}', '\u{06F0}', '\u{07C0}', '\u{0966}', '\u{09E6}', '\u{0A66}',
    '\u{0AE6}', '\u{0B66}', '\u{0BE6}', '\u{0C66}', '\u{0CE6}', '\u{0D66}', '\u{0DE6}',
    '\u{0E50}', '\u{0ED0}', '\u{0F20}', '\u{1040}', '\u{1090}', '\u{17E0}', '\u{1810}',
    '\u{1946}', '\u{19D0}', '\u{1A80}', '\u{1A90}', '\u{1B50}', '\u{1BB0}', '\u{1C40}',
    '\u{1C50}', '\u{A620}', '\u{A8D0}', '\u{A900}', '\u{A9D0}', '\u{A9F0}', '\u{AA50}',
    '\u{ABF0}', '\u{FF10}', '\u{104A0}', '\u{10D30}', '\u{10D40}', '\u{11066}', '\u{110F0}',
    '\u{11136}', '\u{111D0}', '\u{112F0}', '\u{11450}', '\u{114D0}', '\u{11650}', '\u{116C0}',
    '\u{116D0}', '\u{116DA}', '\u{11730}', '\u{118E0}', '\u{11950}', '\u{11BF0}', '\u{11C50}',
    '\u{11D50}', '\u{11DA0}', '\u{11F50}', '\u{16130}', '\u{16A60}', '\u{16AC0}', '\u{16B50}',
    '\u{16D70}', '\u{1CCF0}', '\u{1D7CE}', '\u{1D7D8}', '\u{1D7E2}', '\u{1D7EC}', '\u{1D7F6}',
    '\u{1E140}', '\u{1E2F0}', '\u{1E4F0}', '\u{1E5F1}', '\u{1E950}', '\u{1FBF0}',
];

/// Value of a Unicode decimal digit, in any script.
fn digit_value(c: char) -> Option<u32> {
    let idx = DIGIT_ZEROS.partition_point(|&zero| zero <= c);
    let zero = DIGIT_ZEROS[idx.checked_sub(1)?];
    let d = c as u32 - zero as u32;
    (d < 10).then_some(d)
}

/// Parse a run of decimal digits from any script; scripts may be mixed.
/// Returns `None` on overflow.
fn parse_page_number(digits: &str) -> Option<u32> {
    let mut value: u32 = 0;
    for c in digits.chars() {
        value = value.checked_mul(10)?.checked_add(digit_value(c)?)?;
    }
    Some(value)
}

/// Page of the first chunk whose content contains `excerpt`.
///
/// An excerpt that also occurs verbatim on an earlier page resolves to that
/// earlier page. An empty excerpt matches the first page.
pub fn find_page(excerpt: &str, pages: &[PageChunk]) -> Page {
    pages
        .iter()
        .find(|chunk| chunk.content.contains(excerpt))
        .map(|chunk| Page::Number(chunk.page))
        .unwrap_or(Page::Unknown)
}
