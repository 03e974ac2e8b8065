//! Inference backend trait and implementations for the hosted model API.

pub mod openai;
pub mod replay;

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

pub use openai::OpenAiBackend;
pub use replay::ReplayBackend;

/// One chat-style request: a system instruction plus a single user message.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

/// Failure talking to the inference provider.
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("no API key configured")]
    MissingApiKey,
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider rejected the credentials (HTTP {status}): {message}")]
    Unauthorized { status: u16, message: String },
    #[error("rate limited or out of quota (429): {message}")]
    RateLimited { message: String },
    #[error("provider returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// A model provider that completes one chat request.
pub trait InferenceBackend: Send + Sync {
    /// Short name for logs (e.g. "openai").
    fn name(&self) -> &str;

    /// Send the request and return the reply text. Exactly one request is
    /// made; failures are not retried.
    fn complete<'a>(
        &'a self,
        request: &'a ChatRequest,
        client: &'a reqwest::Client,
    ) -> Pin<Box<dyn Future<Output = Result<String, InferenceError>> + Send + 'a>>;
}
