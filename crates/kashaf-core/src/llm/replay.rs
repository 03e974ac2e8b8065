//! Backend that answers every request with a saved reply.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{ChatRequest, InferenceBackend, InferenceError};

/// Returns a fixed reply instead of calling a provider.
///
/// Used by the CLI to re-parse a reply captured earlier, and by tests.
/// Records the last prompt it was given and how many times it was called.
pub struct ReplayBackend {
    reply: Result<String, (u16, String)>,
    last_request: Mutex<Option<ChatRequest>>,
    call_count: AtomicUsize,
}

impl ReplayBackend {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
            last_request: Mutex::new(None),
            call_count: AtomicUsize::new(0),
        }
    }

    /// A backend whose every call fails with an HTTP status error.
    pub fn failing(status: u16, message: impl Into<String>) -> Self {
        Self {
            reply: Err((status, message.into())),
            last_request: Mutex::new(None),
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.last_request.lock().ok().and_then(|r| r.clone())
    }
}

impl InferenceBackend for ReplayBackend {
    fn name(&self) -> &str {
        "replay"
    }

    fn complete<'a>(
        &'a self,
        request: &'a ChatRequest,
        _client: &'a reqwest::Client,
    ) -> Pin<Box<dyn Future<Output = Result<String, InferenceError>> + Send + 'a>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        Box::pin(async move {
            match &self.reply {
                Ok(text) => Ok(text.trim().to_string()),
                Err((status, message)) => Err(InferenceError::Status {
                    status: *status,
                    message: message.clone(),
                }),
            }
        })
    }
}
