use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use super::{ChatRequest, InferenceBackend, InferenceError};

/// OpenAI-compatible chat completions endpoint.
pub struct OpenAiBackend {
    pub api_key: String,
    pub base_url: String,
}

impl OpenAiBackend {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

fn request_body(request: &ChatRequest) -> ChatBody<'_> {
    ChatBody {
        model: &request.model,
        messages: [
            Message {
                role: "system",
                content: &request.system,
            },
            Message {
                role: "user",
                content: &request.user,
            },
        ],
        temperature: request.temperature,
    }
}

/// Pull the first choice's text out of a chat completions payload.
pub fn parse_completion(body: &str) -> Result<String, InferenceError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| InferenceError::MalformedResponse(format!("invalid JSON: {}", e)))?;
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| InferenceError::MalformedResponse("no choices in response".into()))?;
    let content = choice
        .message
        .content
        .ok_or_else(|| InferenceError::MalformedResponse("choice has no content".into()))?;
    Ok(content.trim().to_string())
}

/// Best-effort human-readable message from an error payload.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.chars().take(300).collect())
}

impl InferenceBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    fn complete<'a>(
        &'a self,
        request: &'a ChatRequest,
        client: &'a reqwest::Client,
    ) -> Pin<Box<dyn Future<Output = Result<String, InferenceError>> + Send + 'a>> {
        Box::pin(async move {
            if self.api_key.trim().is_empty() {
                return Err(InferenceError::MissingApiKey);
            }

            let url = self.endpoint();
            tracing::debug!(url = %url, model = %request.model, "sending chat completion request");

            let resp = client
                .post(&url)
                .bearer_auth(self.api_key.trim())
                .json(&request_body(request))
                .send()
                .await?;

            let status = resp.status();
            let body = resp.text().await?;

            match status.as_u16() {
                200..=299 => parse_completion(&body),
                401 | 403 => Err(InferenceError::Unauthorized {
                    status: status.as_u16(),
                    message: error_message(&body),
                }),
                429 => Err(InferenceError::RateLimited {
                    message: error_message(&body),
                }),
                code => Err(InferenceError::Status {
                    status: code,
                    message: error_message(&body),
                }),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ChatRequest {
        ChatRequest {
            model: "gpt-4".into(),
            system: "sys".into(),
            user: "user text".into(),
            temperature: 0.2,
        }
    }

    #[test]
    fn body_shape() {
        let req = request();
        let value = serde_json::to_value(request_body(&req)).unwrap();
        assert_eq!(value["model"], "gpt-4");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][0]["content"], "sys");
        assert_eq!(value["messages"][1]["role"], "user");
        assert_eq!(value["messages"][1]["content"], "user text");
        assert!((value["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        let backend = OpenAiBackend::new("k", "http://localhost:8080/v1/");
        assert_eq!(backend.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn parse_first_choice_trimmed() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"\n a | b | c | d \n"}},{"message":{"content":"ignored"}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "a | b | c | d");
    }

    #[test]
    fn parse_rejects_missing_choices() {
        assert!(matches!(
            parse_completion(r#"{"choices":[]}"#),
            Err(InferenceError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_completion("not json"),
            Err(InferenceError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_completion(r#"{"choices":[{"message":{"content":null}}]}"#),
            Err(InferenceError::MalformedResponse(_))
        ));
    }

    #[test]
    fn error_message_prefers_provider_text() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        assert_eq!(error_message(body), "Incorrect API key provided");
        assert_eq!(error_message("plain failure"), "plain failure");
    }

    #[tokio::test]
    async fn blank_key_fails_without_request() {
        let backend = OpenAiBackend::new("  ", "http://127.0.0.1:9");
        let client = reqwest::Client::new();
        let err = backend.complete(&request(), &client).await.unwrap_err();
        assert!(matches!(err, InferenceError::MissingApiKey));
    }
}
