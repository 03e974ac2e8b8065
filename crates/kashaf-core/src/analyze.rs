//! One analysis run: read, split into pages, ask the model, parse the reply.

use std::path::Path;
use std::time::Instant;

use crate::backend::DocumentBackend;
use crate::llm::{ChatRequest, InferenceBackend, InferenceError, OpenAiBackend};
use crate::prompt::{SYSTEM_PROMPT, build_prompt};
use crate::{Analysis, AnalysisError, Config, ProgressEvent, pages, response};

/// Build the hosted-API backend for `config`, failing if no credential is set.
pub fn openai_backend(config: &Config) -> Result<OpenAiBackend, InferenceError> {
    let key = config.credential().ok_or(InferenceError::MissingApiKey)?;
    Ok(OpenAiBackend::new(key, config.base_url.clone()))
}

/// Analyze already-extracted document text.
///
/// Pages are split before the model is called, so a bad page marker fails
/// without spending a request.
pub async fn analyze_text(
    text: &str,
    config: &Config,
    backend: &dyn InferenceBackend,
    client: &reqwest::Client,
    progress: impl Fn(ProgressEvent),
) -> Result<Analysis, AnalysisError> {
    let pages = pages::split_pages(text)?;
    progress(ProgressEvent::PagesSplit { pages: pages.len() });
    if pages.is_empty() {
        tracing::warn!("no page markers found; every record will have an unknown page");
    }

    let request = ChatRequest {
        model: config.model.clone(),
        system: SYSTEM_PROMPT.to_string(),
        user: build_prompt(text),
        temperature: config.temperature,
    };
    progress(ProgressEvent::Requesting {
        backend: backend.name().to_string(),
        model: request.model.clone(),
        prompt_chars: request.user.chars().count(),
    });

    let started = Instant::now();
    let reply = backend.complete(&request, client).await?;
    let elapsed = started.elapsed();
    progress(ProgressEvent::ReplyReceived {
        chars: reply.chars().count(),
        elapsed,
    });

    let records = response::parse_reply(&reply, &pages);
    let unknown_pages = records.iter().filter(|r| r.page.is_unknown()).count();
    progress(ProgressEvent::Parsed {
        records: records.len(),
        unknown_pages,
    });

    tracing::info!(
        backend = backend.name(),
        model = %config.model,
        pages = pages.len(),
        records = records.len(),
        unknown_pages,
        elapsed_ms = elapsed.as_millis() as u64,
        "analysis complete"
    );

    Ok(Analysis {
        model: config.model.clone(),
        pages,
        records,
    })
}

/// Read `path` with `reader`, then run [`analyze_text`] on its contents.
pub async fn analyze_document(
    path: &Path,
    reader: &dyn DocumentBackend,
    config: &Config,
    backend: &dyn InferenceBackend,
    client: &reqwest::Client,
    progress: impl Fn(ProgressEvent),
) -> Result<Analysis, AnalysisError> {
    progress(ProgressEvent::Reading {
        source: path.display().to_string(),
    });
    let text = reader.extract_text(path)?;
    analyze_text(&text, config, backend, client, progress).await
}
