//! Structured-output client for the answer provider.
//!
//! One request per question: a fixed tutor persona, the question embedded in
//! a minimal template, and a response schema with two required fields
//! (`answer`, `suggestions`). The decoded payload is validated before it is
//! returned; nothing partially-valid escapes this module.

pub mod error;

pub use error::CompletionError;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::assets::config::duration_serde;

/// Persona and output contract sent with every request.
const SYSTEM_INSTRUCTION: &str = "You are an expert AI tutor for computer science students. \
Your primary goal is to provide clear, accurate, and easy-to-understand answers to their \
computer science questions. When a user asks a question, you must provide a comprehensive \
answer and then suggest three relevant follow-up questions to encourage deeper learning. \
Always respond in the JSON format defined by the schema.";

/// Default provider API base URL.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default completion model.
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Provider phrases that identify a rejected credential.
const KEY_REJECTED_MARKERS: &[&str] = &["API_KEY_INVALID", "API key not valid"];

/// Configuration for the completion client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Provider API key. Provisioning is the caller's concern.
    pub api_key: Option<String>,
    /// Provider API base URL.
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// Request timeout.
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
    /// Connection timeout.
    #[serde(with = "duration_serde")]
    pub connect_timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl CompletionConfig {
    /// Create a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the provider API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the provider base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the model name.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Validated provider result: the answer plus follow-up suggestions.
///
/// Three suggestions are requested via the prompt, but any non-negative
/// count is accepted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    /// Answer text.
    pub answer: String,
    /// Follow-up questions.
    pub suggestions: Vec<String>,
}

/// Seam for anything that can answer a study question.
#[async_trait]
pub trait AnswerProvider: Send + Sync {
    /// Ask `question` and return a validated completion.
    ///
    /// # Errors
    /// Returns a [`CompletionError`] normalizing every provider failure.
    async fn ask(&self, question: &str) -> Result<Completion, CompletionError>;
}

/// HTTP client for the structured completion endpoint.
#[derive(Debug)]
pub struct CompletionClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl CompletionClient {
    /// Create a client from `config`.
    ///
    /// # Errors
    /// Returns a configuration fault if the API key or base URL is unusable,
    /// and a provider fault if the HTTP client cannot be built.
    pub fn new(config: CompletionConfig) -> Result<Self, CompletionError> {
        let api_key = match config.api_key {
            Some(key) if !key.trim().is_empty() => key,
            _ => return Err(CompletionError::Configuration),
        };
        if url::Url::parse(&config.base_url).is_err() {
            return Err(CompletionError::Configuration);
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|err| CompletionError::Provider(err.to_string()))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model,
        })
    }
}

#[async_trait]
impl AnswerProvider for CompletionClient {
    async fn ask(&self, question: &str) -> Result<Completion, CompletionError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let request = build_request(question);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| CompletionError::Provider(err.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CompletionError::Configuration);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if KEY_REJECTED_MARKERS.iter().any(|marker| body.contains(marker)) {
                return Err(CompletionError::Configuration);
            }
            return Err(CompletionError::Provider(format!(
                "provider returned status {status}"
            )));
        }

        let payload: GenerateResponse = response
            .json()
            .await
            .map_err(|err| CompletionError::Provider(err.to_string()))?;

        let text = extract_text(&payload).ok_or_else(|| {
            CompletionError::Provider("response carried no text part".to_string())
        })?;

        decode_completion(&text)
    }
}

/// Build the provider request for one question.
fn build_request(question: &str) -> GenerateRequest {
    GenerateRequest {
        system_instruction: Content {
            parts: vec![Part {
                text: SYSTEM_INSTRUCTION.to_string(),
            }],
        },
        contents: vec![Content {
            parts: vec![Part {
                text: format!("Question: \"{question}\""),
            }],
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json",
            response_schema: response_schema(),
        },
    }
}

/// Schema the provider must shape its response to.
fn response_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "answer": {
                "type": "STRING",
                "description": "A detailed and accurate answer to the user's question, formatted for a computer science student."
            },
            "suggestions": {
                "type": "ARRAY",
                "description": "Three relevant follow-up questions a student might ask.",
                "items": { "type": "STRING" }
            }
        },
        "required": ["answer", "suggestions"]
    })
}

/// Concatenate the text parts of the first candidate, if any.
fn extract_text(response: &GenerateResponse) -> Option<String> {
    let candidate = response.candidates.as_ref()?.first()?;
    let parts = candidate.content.as_ref()?.parts.as_ref()?;

    let mut out = String::new();
    for part in parts {
        if let Some(text) = &part.text {
            out.push_str(text);
        }
    }
    if out.is_empty() { None } else { Some(out) }
}

/// Decode and validate the structured payload.
///
/// Typed decoding enforces the contract: a string `answer` must be present
/// and `suggestions` must be a sequence of strings. Anything else folds into
/// a provider fault.
fn decode_completion(text: &str) -> Result<Completion, CompletionError> {
    serde_json::from_str(text.trim())
        .map_err(|err| CompletionError::Provider(format!("invalid completion payload: {err}")))
}

// Provider request structures

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: serde_json::Value,
}

// Provider response structures

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn candidate_body(inner: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [
                { "content": { "parts": [ { "text": inner } ] } }
            ]
        })
    }

    fn client_for(server: &MockServer) -> CompletionClient {
        CompletionClient::new(
            CompletionConfig::new()
                .with_api_key("test-key")
                .with_base_url(server.uri()),
        )
        .unwrap()
    }

    #[test]
    fn test_missing_api_key_is_configuration_fault() {
        let err = CompletionClient::new(CompletionConfig::default()).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("invalid"));
    }

    #[test]
    fn test_blank_api_key_is_configuration_fault() {
        let config = CompletionConfig::new().with_api_key("   ");
        assert!(CompletionClient::new(config).is_err());
    }

    #[test]
    fn test_decode_valid_payload() {
        let completion = decode_completion(
            r#"{"answer":"A LIFO structure.","suggestions":["What is a queue?","What is a heap?","What is recursion?"]}"#,
        )
        .unwrap();
        assert_eq!(completion.answer, "A LIFO structure.");
        assert_eq!(completion.suggestions.len(), 3);
    }

    #[test]
    fn test_decode_tolerates_any_suggestion_count() {
        let none = decode_completion(r#"{"answer":"ok","suggestions":[]}"#).unwrap();
        assert!(none.suggestions.is_empty());

        let five = decode_completion(r#"{"answer":"ok","suggestions":["a","b","c","d","e"]}"#)
            .unwrap();
        assert_eq!(five.suggestions.len(), 5);
    }

    #[test]
    fn test_decode_rejects_missing_answer() {
        let err = decode_completion(r#"{"suggestions":["a"]}"#).unwrap_err();
        assert!(matches!(err, CompletionError::Provider(_)));
    }

    #[test]
    fn test_decode_rejects_non_sequence_suggestions() {
        let err = decode_completion(r#"{"answer":"ok","suggestions":"not a list"}"#).unwrap_err();
        assert!(matches!(err, CompletionError::Provider(_)));
    }

    #[test]
    fn test_request_shape() {
        let request = build_request("What is a stack?");
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value["contents"][0]["parts"][0]["text"],
            "Question: \"What is a stack?\""
        );
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(
            value["generationConfig"]["responseSchema"]["required"],
            serde_json::json!(["answer", "suggestions"])
        );
    }

    #[tokio::test]
    async fn test_ask_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(candidate_body(
                r#"{"answer":"A LIFO structure.","suggestions":["What is a queue?","What is a heap?","What is recursion?"]}"#,
            )))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let completion = client.ask("What is a stack?").await.unwrap();

        assert_eq!(completion.answer, "A LIFO structure.");
        assert_eq!(
            completion.suggestions,
            vec!["What is a queue?", "What is a heap?", "What is recursion?"]
        );
    }

    #[tokio::test]
    async fn test_ask_maps_rejected_key_to_configuration_fault() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_string(r#"{"error":{"status":"INVALID_ARGUMENT","message":"API key not valid. Please pass a valid API key."}}"#),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.ask("What is a stack?").await.unwrap_err();

        assert!(err.is_configuration());
        assert!(err.to_string().contains("invalid"));
    }

    #[tokio::test]
    async fn test_ask_maps_server_error_to_provider_fault() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.ask("What is a stack?").await.unwrap_err();

        assert!(matches!(err, CompletionError::Provider(_)));
    }

    #[tokio::test]
    async fn test_ask_rejects_malformed_inner_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(candidate_body("not json at all")),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.ask("What is a stack?").await.unwrap_err();

        assert!(matches!(err, CompletionError::Provider(_)));
    }
}
