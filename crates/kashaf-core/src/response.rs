//! Parsing the model's pipe-delimited reply into index records.

use crate::pages::find_page;
use crate::{IndexRecord, PageChunk};

/// Minimum number of `|`-separated fields for a line to become a record.
pub const MIN_FIELDS: usize = 4;

/// Characters that end a reply line. `\r\n` counts as a single break.
const LINE_BREAKS: [char; 10] = [
    '\n', '\r', '\x0b', '\x0c', '\x1c', '\x1d', '\x1e', '\u{85}', '\u{2028}', '\u{2029}',
];

/// Turn a raw model reply into records, one per qualifying line.
///
/// A line qualifies when it splits into at least four fields; fields past
/// the fourth are ignored. Other lines are skipped without error, so an
/// empty or free-form reply yields an empty vec. Records keep the reply's
/// line order.
pub fn parse_reply(reply: &str, pages: &[PageChunk]) -> Vec<IndexRecord> {
    reply_lines(reply)
        .enumerate()
        .filter_map(|(n, line)| {
            let record = parse_line(line, pages);
            if record.is_none() && !line.trim().is_empty() {
                tracing::debug!(line = n + 1, "skipping reply line without four fields");
            }
            record
        })
        .collect()
}

fn reply_lines(reply: &str) -> impl Iterator<Item = &str> {
    reply
        .split("\r\n")
        .flat_map(|part| part.split(LINE_BREAKS))
}

fn parse_line(line: &str, pages: &[PageChunk]) -> Option<IndexRecord> {
    let fields: Vec<&str> = line.split('|').map(str::trim).collect();
    if fields.len() < MIN_FIELDS {
        return None;
    }

    let excerpt = fields[0];
    Some(IndexRecord {
        excerpt: excerpt.to_string(),
        category: fields[1].to_string(),
        title: fields[2].to_string(),
        rationale: fields[3].to_string(),
        page: find_page(excerpt, pages),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Page;

    fn pages() -> Vec<PageChunk> {
        vec![
            PageChunk {
                page: 10,
                content: "قال الله تعالى في كتابه".into(),
            },
            PageChunk {
                page: 11,
                content: "وأجمع العلماء على ذلك، قال الله تعالى".into(),
            },
        ]
    }

    #[test]
    fn four_fields_trimmed() {
        let records = parse_reply("  قال الله تعالى |  تفسير الآيات | عنوان  |سبب ", &pages());
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.excerpt, "قال الله تعالى");
        assert_eq!(r.category, "تفسير الآيات");
        assert_eq!(r.title, "عنوان");
        assert_eq!(r.rationale, "سبب");
        assert_eq!(r.page, Page::Number(10));
    }

    #[test]
    fn short_lines_are_dropped() {
        let reply = "a | b | c\nheading only\n\n| x |";
        assert!(parse_reply(reply, &pages()).is_empty());
    }

    #[test]
    fn extra_fields_are_ignored() {
        let records = parse_reply("وأجمع العلماء | الإجماع | ع | س | extra | more", &pages());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].rationale, "س");
        assert_eq!(records[0].page, Page::Number(11));
    }

    #[test]
    fn valid_lines_keep_reply_order() {
        let reply = "\
z | c1 | t1 | r1
not a record
a | c2 | t2 | r2
also | not
m | c3 | t3 | r3";
        let records = parse_reply(reply, &[]);
        let excerpts: Vec<_> = records.iter().map(|r| r.excerpt.as_str()).collect();
        assert_eq!(excerpts, vec!["z", "a", "m"]);
        assert!(records.iter().all(|r| r.page == Page::Unknown));
    }

    #[test]
    fn unmatched_excerpt_is_unknown() {
        let records = parse_reply("لا يوجد | الخلاف | ع | س", &pages());
        assert_eq!(records[0].page, Page::Unknown);
    }

    #[test]
    fn crlf_lines() {
        let records = parse_reply("a | b | c | d\r\ne | f | g | h\r\n", &[]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].rationale, "h");
    }

    #[test]
    fn lone_carriage_return_separates_lines() {
        let records = parse_reply("a | b | c | d\re | f | g | h", &[]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].rationale, "d");
        assert_eq!(records[1].excerpt, "e");
    }

    #[test]
    fn unicode_line_separators() {
        for sep in ["\u{2028}", "\u{2029}", "\u{85}", "\x0b", "\x0c", "\x1e"] {
            let reply = format!("a | b | c | d{sep}e | f | g | h");
            let records = parse_reply(&reply, &[]);
            assert_eq!(records.len(), 2, "separator {:?}", sep);
            assert_eq!(records[1].rationale, "h");
        }
    }

    #[test]
    fn empty_reply() {
        assert!(parse_reply("", &pages()).is_empty());
        assert!(parse_reply("   \n\n", &pages()).is_empty());
    }
}
