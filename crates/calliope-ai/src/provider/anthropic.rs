//! Anthropic messages API over blocking HTTP.

use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{GenerateOptions, ProviderSettings, TextProvider, error_message};
use crate::error::ProviderError;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 800;
const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a fiction writing assistant ensuring character consistency.";
const NAME: &str = "anthropic";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Client for the Anthropic `/messages` endpoint.
pub struct AnthropicProvider {
    client: Client,
    api_key: HeaderValue,
    model: String,
    temperature: f32,
    base_url: String,
}

impl AnthropicProvider {
    /// Build a client. `base_url` defaults to the public Anthropic API.
    ///
    /// A key that cannot be sent as a header is a configuration error.
    pub fn new(
        settings: &ProviderSettings,
        api_key: String,
        base_url: Option<String>,
    ) -> Result<Self, ProviderError> {
        let mut api_key = HeaderValue::from_str(api_key.trim())
            .map_err(|_| ProviderError::Configuration("invalid Anthropic API key".into()))?;
        api_key.set_sensitive(true);
        let client = Client::builder()
            .build()
            .map_err(|e| ProviderError::Configuration(format!("cannot build HTTP client: {e}")))?;
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        debug!(model = %settings.model, url = %base_url, "created Anthropic client");
        Ok(Self {
            client,
            api_key,
            model: settings.model.clone(),
            temperature: settings.temperature,
            base_url,
        })
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-api-key", self.api_key.clone());
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        headers
    }

    fn request<'a>(&'a self, prompt: &'a str, options: &'a GenerateOptions) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.model,
            max_tokens: options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: options.temperature.unwrap_or(self.temperature),
            system: options
                .system_prompt
                .as_deref()
                .unwrap_or(DEFAULT_SYSTEM_PROMPT),
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        }
    }
}

impl TextProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    #[instrument(skip_all, fields(provider = NAME, model = %self.model))]
    fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String, ProviderError> {
        let body = self.request(prompt, options);
        debug!(prompt_chars = prompt.len(), "sending request");

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .headers(self.headers())
            .json(&body)
            .send()
            .map_err(|e| {
                error!(error = %e, "HTTP request failed");
                ProviderError::transport(NAME, e.to_string(), e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            error!(%status, "API error");
            return Err(ProviderError::status(
                NAME,
                status.as_u16(),
                error_message(&text),
            ));
        }

        let parsed: MessagesResponse = response.json().map_err(|e| {
            error!(error = %e, "failed to parse response");
            ProviderError::transport(NAME, format!("invalid response: {e}"), e)
        })?;

        parsed
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .map(|text| text.trim().to_string())
            .ok_or_else(|| ProviderError::gateway(NAME, "response contained no text"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderKind;
    use crate::provider::test_server::serve_once;

    fn settings() -> ProviderSettings {
        ProviderSettings {
            kind: ProviderKind::Anthropic,
            model: "claude-test".into(),
            temperature: 0.5,
            openai_api_key: None,
            anthropic_api_key: None,
        }
    }

    #[test]
    fn request_applies_defaults() {
        let provider = AnthropicProvider::new(&settings(), "k".into(), None).unwrap();
        let options = GenerateOptions::new();
        let json = serde_json::to_value(provider.request("Hi", &options)).unwrap();

        assert_eq!(json["max_tokens"], 800);
        assert_eq!(json["system"], DEFAULT_SYSTEM_PROMPT);
        assert_eq!(json["messages"][0]["content"], "Hi");
    }

    #[test]
    fn generate_sends_headers_and_reads_text_block() {
        let (base, handle) = serve_once(
            "200 OK",
            r#"{"content":[{"type":"text","text":" Consistent. "}],"stop_reason":"end_turn"}"#,
        );
        let provider = AnthropicProvider::new(&settings(), "key-1".into(), Some(base)).unwrap();

        let out = provider
            .generate("Check", &GenerateOptions::new().with_max_tokens(64))
            .unwrap();
        assert_eq!(out, "Consistent.");

        let request = handle.join().unwrap().to_lowercase();
        assert!(request.starts_with("post /messages"));
        assert!(request.contains("x-api-key: key-1"));
        assert!(request.contains("anthropic-version: 2023-06-01"));
        assert!(request.contains("\"max_tokens\":64"));
    }

    #[test]
    fn invalid_key_is_rejected_at_construction() {
        let result = AnthropicProvider::new(&settings(), "bad\nkey".into(), None);
        assert!(matches!(result, Err(ProviderError::Configuration(_))));
    }

    #[test]
    fn transport_failure_keeps_its_source() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        let provider = AnthropicProvider::new(&settings(), "key".into(), Some(base)).unwrap();

        let err = provider.generate("Check", &GenerateOptions::new()).unwrap_err();
        assert!(matches!(err, ProviderError::Gateway { status: None, .. }));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn server_error_is_reported() {
        let (base, handle) = serve_once("529 Overloaded", r#"{"error":{"message":"Overloaded"}}"#);
        let provider = AnthropicProvider::new(&settings(), "key".into(), Some(base)).unwrap();

        let err = provider.generate("Check", &GenerateOptions::new()).unwrap_err();
        handle.join().unwrap();
        assert!(matches!(
            err,
            ProviderError::Gateway {
                status: Some(529),
                ..
            }
        ));
    }
}
