//! # OptiNote SOAP
//!
//! Reformats free-text ophthalmic notes into SOAP structure (Subjective, Objective, Assessment,
//! Plan) through an OpenAI-compatible chat-completions endpoint.
//!
//! One request per call: no retries, no streaming. The client timeout is the only timeout.

use optinote_types::SecretText;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_CONTEXT: &str = "General ophthalmology";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

const MAX_TOKENS: u32 = 600;
const TEMPERATURE: f32 = 0.2;

#[derive(Debug, thiserror::Error)]
pub enum SoapError {
    #[error("Please enter some clinical notes to format.")]
    EmptyInput,
    #[error("API key required. Set GROQ_API_KEY to enable SOAP formatting.")]
    MissingApiKey,
    #[error("{message}")]
    Provider { status: u16, message: String },
    #[error("request to SOAP provider failed: {0}")]
    Transport(String),
}

pub type SoapResult<T> = std::result::Result<T, SoapError>;

/// Endpoint, model and timeout for the chat-completions provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SoapConfig {
    pub endpoint: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for SoapConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            model: DEFAULT_MODEL.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl SoapConfig {
    /// Defaults with optional overrides; blank overrides are ignored.
    pub fn from_overrides(endpoint: Option<String>, model: Option<String>) -> Self {
        let non_blank = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let defaults = Self::default();
        Self {
            endpoint: non_blank(endpoint).unwrap_or(defaults.endpoint),
            model: non_blank(model).unwrap_or(defaults.model),
            timeout: defaults.timeout,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

/// Request body for the chat-completions endpoint.
#[derive(Debug, Serialize, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ProviderErrorBody {
    error: Option<ProviderErrorDetail>,
}

#[derive(Deserialize)]
struct ProviderErrorDetail {
    message: Option<String>,
}

/// System prompt for the given context label (e.g. "Glaucoma clinic").
pub fn system_prompt(context: &str) -> String {
    format!(
        "You are a specialist ophthalmic clinical documentation assistant.\n\
         Convert free-text clinical notes into a structured SOAP note format for {context}.\n\
         Use precise ophthalmic terminology. Be concise and clinical.\n\
         Format the response EXACTLY as:\n\
         \n\
         SUBJECTIVE\n\
         [patient complaints, symptoms, history]\n\
         \n\
         OBJECTIVE\n\
         [examination findings, measurements, test results]\n\
         \n\
         ASSESSMENT\n\
         [diagnosis, clinical impression]\n\
         \n\
         PLAN\n\
         [management, follow-up, referrals]\n\
         \n\
         Do not add disclaimers, explanations, or anything outside the SOAP structure."
    )
}

pub fn request_body(model: &str, context: &str, input: &str) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage {
                role: "system",
                content: system_prompt(context),
            },
            ChatMessage {
                role: "user",
                content: format!("Format this ophthalmic clinical note into SOAP format:\n\n{input}"),
            },
        ],
        max_tokens: MAX_TOKENS,
        temperature: TEMPERATURE,
    }
}

/// The provider's `error.message` if the body carries one, else `API error <status>`.
pub fn provider_error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<ProviderErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("API error {status}"))
}

/// Chat-completions client that produces SOAP notes.
#[derive(Clone, Debug)]
pub struct SoapFormatter {
    config: SoapConfig,
    client: reqwest::Client,
}

impl SoapFormatter {
    /// # Errors
    ///
    /// Returns `SoapError::Transport` if the HTTP client cannot be constructed.
    pub fn new(config: SoapConfig) -> SoapResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SoapError::Transport(e.to_string()))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &SoapConfig {
        &self.config
    }

    /// Formats `input` as a SOAP note.
    ///
    /// `context` falls back to "General ophthalmology" when absent or blank. The first choice's
    /// content is returned trimmed and may be empty.
    ///
    /// # Errors
    ///
    /// - `EmptyInput` if `input` is blank.
    /// - `MissingApiKey` if no key is configured.
    /// - `Provider` for a non-success status.
    /// - `Transport` if the request cannot be sent or the response cannot be read.
    pub async fn format(
        &self,
        input: &str,
        context: Option<&str>,
        api_key: Option<&SecretText>,
    ) -> SoapResult<String> {
        let input = input.trim();
        if input.is_empty() {
            return Err(SoapError::EmptyInput);
        }
        let api_key = api_key.ok_or(SoapError::MissingApiKey)?;
        let context = context
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CONTEXT);

        let body = request_body(&self.config.model, context, input);
        tracing::debug!(model = %self.config.model, context, "requesting SOAP formatting");

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SoapError::Transport(format!(
                        "request timed out after {}s",
                        self.config.timeout.as_secs()
                    ))
                } else {
                    SoapError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = provider_error_message(status.as_u16(), &text);
            tracing::warn!(status = status.as_u16(), %message, "SOAP provider returned an error");
            return Err(SoapError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| SoapError::Transport(format!("unreadable provider response: {e}")))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default())
    }
}
