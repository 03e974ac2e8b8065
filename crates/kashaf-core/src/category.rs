use std::collections::BTreeMap;

use serde::Serialize;

use crate::IndexRecord;

/// The eight index categories the model is asked to classify into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    VerseExegesis,
    HadithCommentary,
    HadithGrading,
    Consensus,
    Disagreement,
    Preference,
    RulesAndDistinctions,
    PersonalPositions,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::VerseExegesis,
        Category::HadithCommentary,
        Category::HadithGrading,
        Category::Consensus,
        Category::Disagreement,
        Category::Preference,
        Category::RulesAndDistinctions,
        Category::PersonalPositions,
    ];

    /// The Arabic label used in the prompt and expected back in replies.
    pub fn label(&self) -> &'static str {
        match self {
            Category::VerseExegesis => "تفسير الآيات",
            Category::HadithCommentary => "شروح الأحاديث",
            Category::HadithGrading => "الأحكام الحديثية",
            Category::Consensus => "الإجماع",
            Category::Disagreement => "الخلاف",
            Category::Preference => "الترجيح",
            Category::RulesAndDistinctions => "القواعد والضوابط والفروق والتقاسيم",
            Category::PersonalPositions => "المواقف الشخصية",
        }
    }

    pub fn english_name(&self) -> &'static str {
        match self {
            Category::VerseExegesis => "Qur'anic exegesis",
            Category::HadithCommentary => "Hadith commentary",
            Category::HadithGrading => "Hadith grading",
            Category::Consensus => "Consensus",
            Category::Disagreement => "Disagreement",
            Category::Preference => "Preference",
            Category::RulesAndDistinctions => "Rules and distinctions",
            Category::PersonalPositions => "Personal positions",
        }
    }

    /// Match a model-written label. Tolerates a leading list number
    /// ("3. الإجماع") and surrounding whitespace.
    pub fn from_label(label: &str) -> Option<Category> {
        let stripped = label
            .trim()
            .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == '-' || c == ')')
            .trim();
        Category::ALL.into_iter().find(|c| c.label() == stripped)
    }
}

/// Record counts per category, plus those with an unrecognized label or an
/// unresolved page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategorySummary {
    pub total: usize,
    pub by_category: BTreeMap<Category, usize>,
    pub other: usize,
    pub unknown_pages: usize,
}

impl CategorySummary {
    pub fn from_records(records: &[IndexRecord]) -> Self {
        let mut summary = CategorySummary {
            total: records.len(),
            ..Default::default()
        };
        for record in records {
            match Category::from_label(&record.category) {
                Some(c) => *summary.by_category.entry(c).or_insert(0) += 1,
                None => summary.other += 1,
            }
            if record.page.is_unknown() {
                summary.unknown_pages += 1;
            }
        }
        summary
    }

    pub fn count(&self, category: Category) -> usize {
        self.by_category.get(&category).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Page;

    fn record(category: &str, page: Page) -> IndexRecord {
        IndexRecord {
            excerpt: "x".into(),
            category: category.into(),
            title: String::new(),
            rationale: String::new(),
            page,
        }
    }

    #[test]
    fn labels_are_distinct() {
        let mut labels: Vec<_> = Category::ALL.iter().map(|c| c.label()).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), 8);
    }

    #[test]
    fn from_label_tolerates_numbering() {
        assert_eq!(Category::from_label("الإجماع"), Some(Category::Consensus));
        assert_eq!(Category::from_label(" 4. الإجماع "), Some(Category::Consensus));
        assert_eq!(Category::from_label("تفسير"), None);
    }

    #[test]
    fn summary_counts() {
        let records = vec![
            record("الخلاف", Page::Number(1)),
            record("الخلاف", Page::Unknown),
            record("something else", Page::Number(2)),
        ];
        let s = CategorySummary::from_records(&records);
        assert_eq!(s.total, 3);
        assert_eq!(s.count(Category::Disagreement), 2);
        assert_eq!(s.count(Category::Consensus), 0);
        assert_eq!(s.other, 1);
        assert_eq!(s.unknown_pages, 1);
    }
}
