use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod analyze;
pub mod backend;
pub mod category;
pub mod config_file;
pub mod llm;
pub mod pages;
pub mod prompt;
pub mod response;

// Re-export for convenience
pub use analyze::{analyze_document, analyze_text};
pub use backend::{DocumentBackend, DocumentError};
pub use category::{Category, CategorySummary};
pub use llm::{ChatRequest, InferenceBackend, InferenceError};
pub use pages::{PageMarkerError, find_page, split_pages};
pub use response::parse_reply;

/// Label shown in place of a page number when an excerpt could not be located.
pub const UNKNOWN_PAGE: &str = "غير معروف";

pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Text belonging to one page, as delimited by `</<N>` markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageChunk {
    pub page: u32,
    pub content: String,
}

/// Source page of an index record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PageRepr", into = "PageRepr")]
pub enum Page {
    Number(u32),
    Unknown,
}

impl Page {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Page::Unknown)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Page::Number(n) => write!(f, "{}", n),
            Page::Unknown => f.write_str(UNKNOWN_PAGE),
        }
    }
}

/// Wire form of [`Page`]: a bare number, or the sentinel label.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum PageRepr {
    Number(u32),
    Label(String),
}

impl From<PageRepr> for Page {
    fn from(repr: PageRepr) -> Self {
        match repr {
            PageRepr::Number(n) => Page::Number(n),
            PageRepr::Label(_) => Page::Unknown,
        }
    }
}

impl From<Page> for PageRepr {
    fn from(page: Page) -> Self {
        match page {
            Page::Number(n) => PageRepr::Number(n),
            Page::Unknown => PageRepr::Label(UNKNOWN_PAGE.to_string()),
        }
    }
}

/// One row of the extracted index.
///
/// `category` is the label exactly as the model wrote it; it is not checked
/// against [`Category::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub excerpt: String,
    pub category: String,
    pub title: String,
    pub rationale: String,
    pub page: Page,
}

/// The outcome of one analysis run. Owned by the caller; nothing is cached
/// between runs.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub model: String,
    pub pages: Vec<PageChunk>,
    pub records: Vec<IndexRecord>,
}

impl Analysis {
    pub fn summary(&self) -> CategorySummary {
        CategorySummary::from_records(&self.records)
    }
}

/// Failure of an analysis run, tagged by the stage that failed.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("could not read document: {0}")]
    DocumentRead(#[from] DocumentError),
    #[error("invalid page marker: {0}")]
    PageMarker(#[from] PageMarkerError),
    #[error("inference request failed: {0}")]
    ExternalService(#[from] InferenceError),
}

impl AnalysisError {
    /// Short machine-readable tag for the failing stage.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::DocumentRead(_) => "document_read",
            AnalysisError::PageMarker(_) => "page_marker",
            AnalysisError::ExternalService(_) => "external_service",
        }
    }
}

/// Progress events emitted during an analysis run.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Reading {
        source: String,
    },
    PagesSplit {
        pages: usize,
    },
    Requesting {
        backend: String,
        model: String,
        prompt_chars: usize,
    },
    ReplyReceived {
        chars: usize,
        elapsed: Duration,
    },
    Parsed {
        records: usize,
        unknown_pages: usize,
    },
}

/// Settings for one analysis run.
#[derive(Clone)]
pub struct Config {
    /// Model identifier passed through to the provider unchanged.
    pub model: String,
    pub api_key: Option<String>,
    /// Base URL of an OpenAI-compatible API, without the `/chat/completions` suffix.
    pub base_url: String,
    pub temperature: f32,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl Config {
    /// Overlay values from a config file onto this config. Unset file
    /// values leave the current ones alone.
    pub fn apply_file(&mut self, file: &config_file::ConfigFile) {
        if let Some(key) = file.api_keys.as_ref().and_then(|a| a.openai_key.clone()) {
            self.api_key = Some(key);
        }
        if let Some(model) = &file.model {
            if let Some(name) = &model.name {
                self.model = name.clone();
            }
            if let Some(url) = &model.base_url {
                self.base_url = url.clone();
            }
            if let Some(t) = model.temperature {
                self.temperature = t;
            }
        }
    }

    /// Overlay `OPENAI_API_KEY`, `KASHAF_MODEL` and `KASHAF_BASE_URL`
    /// looked up through `env`. Blank values are ignored.
    pub fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        let lookup = |name: &str| env(name).filter(|v| !v.trim().is_empty());
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(model) = lookup("KASHAF_MODEL") {
            self.model = model;
        }
        if let Some(url) = lookup("KASHAF_BASE_URL") {
            self.base_url = url;
        }
    }

    /// The credential, if one is set and non-blank.
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_masks_api_key() {
        let config = Config {
            api_key: Some("sk-secret".into()),
            ..Config::default()
        };
        let dbg = format!("{:?}", config);
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("***"));
    }

    #[test]
    fn blank_credential_is_none() {
        let config = Config {
            api_key: Some("   ".into()),
            ..Config::default()
        };
        assert_eq!(config.credential(), None);
    }

    #[test]
    fn page_serializes_as_number_or_label() {
        assert_eq!(serde_json::to_string(&Page::Number(7)).unwrap(), "7");
        assert_eq!(
            serde_json::to_string(&Page::Unknown).unwrap(),
            format!("\"{}\"", UNKNOWN_PAGE)
        );
        let p: Page = serde_json::from_str("\"unknown\"").unwrap();
        assert_eq!(p, Page::Unknown);
        let p: Page = serde_json::from_str("12").unwrap();
        assert_eq!(p, Page::Number(12));
    }

    #[test]
    fn apply_env_skips_blank_values() {
        let mut config = Config::default();
        config.apply_env(|name| match name {
            "KASHAF_MODEL" => Some("gpt-4o-mini".to_string()),
            "OPENAI_API_KEY" => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.api_key, None);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn apply_file_overrides_only_set_values() {
        let file = config_file::ConfigFile {
            model: Some(config_file::ModelConfig {
                name: Some("gpt-4o".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let mut config = Config::default();
        config.apply_file(&file);
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api_key, None);
    }
}
