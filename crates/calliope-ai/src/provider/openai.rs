//! OpenAI chat completions over blocking HTTP.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{GenerateOptions, ProviderSettings, TextProvider, error_message};
use crate::error::ProviderError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful writing assistant.";
const NAME: &str = "openai";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    model: String,
    temperature: f32,
    base_url: String,
}

impl OpenAiProvider {
    /// Build a client. `base_url` defaults to the public OpenAI API.
    pub fn new(
        settings: &ProviderSettings,
        api_key: String,
        base_url: Option<String>,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ProviderError::Configuration(format!("cannot build HTTP client: {e}")))?;
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        debug!(model = %settings.model, url = %base_url, "created OpenAI client");
        Ok(Self {
            client,
            api_key,
            model: settings.model.clone(),
            temperature: settings.temperature,
            base_url,
        })
    }

    fn request<'a>(&'a self, prompt: &'a str, options: &'a GenerateOptions) -> ChatRequest<'a> {
        let system = options
            .system_prompt
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_PROMPT);
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: options.temperature.unwrap_or(self.temperature),
            max_tokens: options.max_tokens,
        }
    }
}

impl TextProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    #[instrument(skip_all, fields(provider = NAME, model = %self.model))]
    fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String, ProviderError> {
        let body = self.request(prompt, options);
        debug!(prompt_chars = prompt.len(), "sending request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
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

        let parsed: ChatResponse = response.json().map_err(|e| {
            error!(error = %e, "failed to parse response");
            ProviderError::transport(NAME, format!("invalid response: {e}"), e)
        })?;
        debug!(choices = parsed.choices.len(), "received response");

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default()
            .trim()
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderKind;
    use crate::provider::test_server::serve_once;

    fn settings() -> ProviderSettings {
        ProviderSettings {
            kind: ProviderKind::OpenAi,
            model: "gpt-4".into(),
            temperature: 0.7,
            openai_api_key: None,
            anthropic_api_key: None,
        }
    }

    #[test]
    fn request_uses_defaults() {
        let provider = OpenAiProvider::new(&settings(), "k".into(), None).unwrap();
        let options = GenerateOptions::new();
        let json = serde_json::to_value(provider.request("Hi", &options)).unwrap();

        assert_eq!(json["model"], "gpt-4");
        assert_eq!(json["messages"][0]["content"], DEFAULT_SYSTEM_PROMPT);
        assert_eq!(json["messages"][1]["role"], "user");
        assert!((json["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn generate_returns_first_choice_trimmed() {
        let (base, handle) = serve_once(
            "200 OK",
            r#"{"choices":[{"message":{"role":"assistant","content":"  A scene.\n"}}]}"#,
        );
        let provider = OpenAiProvider::new(&settings(), "sk-test".into(), Some(base)).unwrap();
        let options = GenerateOptions::new().with_temperature(0.0);

        let out = provider.generate("Write", &options).unwrap();
        assert_eq!(out, "A scene.");

        let request = handle.join().unwrap();
        assert!(request.starts_with("POST /chat/completions"));
        assert!(request.to_lowercase().contains("authorization: bearer sk-test"));
    }

    #[test]
    fn error_status_becomes_gateway_error() {
        let (base, handle) = serve_once(
            "401 Unauthorized",
            r#"{"error":{"message":"Incorrect API key provided"}}"#,
        );
        let provider = OpenAiProvider::new(&settings(), "bad".into(), Some(base)).unwrap();

        let err = provider.generate("Write", &GenerateOptions::new()).unwrap_err();
        handle.join().unwrap();
        match err {
            ProviderError::Gateway {
                provider,
                status,
                message,
                source,
            } => {
                assert_eq!(provider, "openai");
                assert_eq!(status, Some(401));
                assert_eq!(message, "Incorrect API key provided");
                assert!(source.is_none());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn transport_failure_keeps_its_source() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        let provider = OpenAiProvider::new(&settings(), "sk-test".into(), Some(base)).unwrap();

        let err = provider.generate("Write", &GenerateOptions::new()).unwrap_err();
        assert!(matches!(err, ProviderError::Gateway { status: None, .. }));
        let source = std::error::Error::source(&err).expect("transport error source");
        assert!(source.downcast_ref::<reqwest::Error>().is_some());
    }
}
