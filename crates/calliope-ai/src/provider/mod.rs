//! Text-generation backends behind one trait.
//!
//! The closed set of backends is modelled as the [`Provider`] enum. Remote
//! backends are compiled in through the `openai` and `anthropic` cargo
//! features; asking for one that was compiled out is a configuration error.

#[cfg(feature = "anthropic")]
mod anthropic;
mod local;
#[cfg(feature = "openai")]
mod openai;

use std::fmt;
use std::str::FromStr;

use calliope_core::Console;
use calliope_core::config::{AiConfig, resolve_secret};

use crate::error::ProviderError;

#[cfg(feature = "anthropic")]
pub use anthropic::AnthropicProvider;
pub use local::LocalProvider;
#[cfg(feature = "openai")]
pub use openai::OpenAiProvider;

/// Per-call generation options. Unset fields fall back to the backend's
/// defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateOptions {
    /// System prompt for this call.
    pub system_prompt: Option<String>,
    /// Sampling temperature for this call.
    pub temperature: Option<f32>,
    /// Upper bound on generated tokens.
    pub max_tokens: Option<u32>,
}

impl GenerateOptions {
    /// Options with every field unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Set the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the token limit.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A backend that turns a prompt into text.
pub trait TextProvider {
    /// Short backend name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Generate a completion for `prompt`.
    fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String, ProviderError>;
}

/// The supported backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// OpenAI chat completions.
    OpenAi,
    /// Anthropic messages.
    Anthropic,
    /// Offline placeholder that echoes the prompt.
    Local,
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "claude" | "anthropic" => Ok(Self::Anthropic),
            "local" => Ok(Self::Local),
            other => Err(ProviderError::Configuration(format!(
                "unsupported provider '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Local => "local",
        })
    }
}

/// Backend selection and credentials, resolved once from `config.yaml`.
#[derive(Clone, PartialEq)]
pub struct ProviderSettings {
    /// Which backend to build.
    pub kind: ProviderKind,
    /// Model identifier.
    pub model: String,
    /// Default temperature when a call does not set one.
    pub temperature: f32,
    /// OpenAI key from configuration, if any.
    pub openai_api_key: Option<String>,
    /// Anthropic key from configuration, if any.
    pub anthropic_api_key: Option<String>,
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("kind", &self.kind)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "***"))
            .field("anthropic_api_key", &self.anthropic_api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl ProviderSettings {
    /// Build settings from the `ai:` section, expanding `${VAR}` placeholders
    /// through `env`.
    pub fn from_config<F>(config: &AiConfig, env: F) -> Result<Self, ProviderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            kind: config.default_provider.parse()?,
            model: config.model.clone(),
            temperature: config.temperature,
            openai_api_key: resolve_secret(config.openai_api_key.as_deref(), &env),
            anthropic_api_key: resolve_secret(config.anthropic_api_key.as_deref(), &env),
        })
    }
}

/// A constructed backend.
pub enum Provider<'c> {
    /// OpenAI chat completions.
    #[cfg(feature = "openai")]
    OpenAi(OpenAiProvider),
    /// Anthropic messages.
    #[cfg(feature = "anthropic")]
    Anthropic(AnthropicProvider),
    /// Offline placeholder.
    Local(LocalProvider<'c>),
}

impl<'c> Provider<'c> {
    /// Build the backend named by `settings`.
    ///
    /// Credentials come from the settings first and from the environment
    /// (`OPENAI_API_KEY`, `ANTHROPIC_API_KEY`) second. `OPENAI_BASE_URL` and
    /// `ANTHROPIC_BASE_URL` override the endpoints.
    pub fn from_settings<F>(
        settings: &ProviderSettings,
        env: F,
        console: &'c dyn Console,
    ) -> Result<Self, ProviderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        tracing::debug!(provider = %settings.kind, model = %settings.model, "building provider");
        match settings.kind {
            ProviderKind::OpenAi => openai_backend(settings, &env),
            ProviderKind::Anthropic => anthropic_backend(settings, &env),
            ProviderKind::Local => Ok(Self::Local(LocalProvider::new(settings, console))),
        }
    }
}

#[cfg(feature = "openai")]
fn openai_backend<'c, F>(settings: &ProviderSettings, env: &F) -> Result<Provider<'c>, ProviderError>
where
    F: Fn(&str) -> Option<String>,
{
    let key = credential(settings.openai_api_key.as_deref(), env, "OPENAI_API_KEY")
        .ok_or_else(|| ProviderError::Configuration("OpenAI API key is not configured".into()))?;
    let base_url = env("OPENAI_BASE_URL").filter(|u| !u.trim().is_empty());
    Ok(Provider::OpenAi(OpenAiProvider::new(settings, key, base_url)?))
}

#[cfg(not(feature = "openai"))]
fn openai_backend<'c, F>(_settings: &ProviderSettings, _env: &F) -> Result<Provider<'c>, ProviderError>
where
    F: Fn(&str) -> Option<String>,
{
    Err(ProviderError::Configuration(
        "openai backend unavailable: built without the `openai` feature".into(),
    ))
}

#[cfg(feature = "anthropic")]
fn anthropic_backend<'c, F>(
    settings: &ProviderSettings,
    env: &F,
) -> Result<Provider<'c>, ProviderError>
where
    F: Fn(&str) -> Option<String>,
{
    let key = credential(settings.anthropic_api_key.as_deref(), env, "ANTHROPIC_API_KEY")
        .ok_or_else(|| {
            ProviderError::Configuration("Anthropic API key is not configured".into())
        })?;
    let base_url = env("ANTHROPIC_BASE_URL").filter(|u| !u.trim().is_empty());
    Ok(Provider::Anthropic(AnthropicProvider::new(
        settings, key, base_url,
    )?))
}

#[cfg(not(feature = "anthropic"))]
fn anthropic_backend<'c, F>(
    _settings: &ProviderSettings,
    _env: &F,
) -> Result<Provider<'c>, ProviderError>
where
    F: Fn(&str) -> Option<String>,
{
    Err(ProviderError::Configuration(
        "anthropic backend unavailable: built without the `anthropic` feature".into(),
    ))
}

#[cfg(any(feature = "openai", feature = "anthropic"))]
fn credential<F>(configured: Option<&str>, env: &F, var: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    configured
        .filter(|k| !k.trim().is_empty())
        .map(str::to_string)
        .or_else(|| env(var).filter(|k| !k.trim().is_empty()))
}

/// Pull `error.message` out of a JSON error body, falling back to the raw
/// body.
#[cfg(any(feature = "openai", feature = "anthropic"))]
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

impl TextProvider for Provider<'_> {
    fn name(&self) -> &'static str {
        match self {
            #[cfg(feature = "openai")]
            Self::OpenAi(p) => p.name(),
            #[cfg(feature = "anthropic")]
            Self::Anthropic(p) => p.name(),
            Self::Local(p) => p.name(),
        }
    }

    fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String, ProviderError> {
        match self {
            #[cfg(feature = "openai")]
            Self::OpenAi(p) => p.generate(prompt, options),
            #[cfg(feature = "anthropic")]
            Self::Anthropic(p) => p.generate(prompt, options),
            Self::Local(p) => p.generate(prompt, options),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_server {
    //! A one-shot HTTP server for exercising the remote backends.

    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Serve exactly one response, returning the base URL and a handle that
    /// yields the raw request.
    pub fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
            request
        });
        (format!("http://{addr}"), handle)
    }

    fn read_request(stream: &mut impl Read) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        if name.eq_ignore_ascii_case("content-length") {
                            value.trim().parse::<usize>().ok()
                        } else {
                            None
                        }
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use calliope_core::{RecordingConsole, SilentConsole};

    use super::*;

    fn settings(kind: ProviderKind) -> ProviderSettings {
        ProviderSettings {
            kind,
            model: "test-model".into(),
            temperature: 0.7,
            openai_api_key: None,
            anthropic_api_key: None,
        }
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn parse_provider_kinds() {
        assert_eq!("OpenAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!("claude".parse::<ProviderKind>().unwrap(), ProviderKind::Anthropic);
        assert_eq!("anthropic".parse::<ProviderKind>().unwrap(), ProviderKind::Anthropic);
        assert_eq!("local".parse::<ProviderKind>().unwrap(), ProviderKind::Local);
        assert!(matches!(
            "gemini".parse::<ProviderKind>(),
            Err(ProviderError::Configuration(_))
        ));
    }

    #[test]
    fn settings_expand_placeholders() {
        let env: HashMap<&str, &str> = HashMap::from([("OPENAI_API_KEY", "sk-test")]);
        let lookup = |k: &str| env.get(k).map(|v| v.to_string());
        let settings = ProviderSettings::from_config(&AiConfig::default(), lookup).unwrap();

        assert_eq!(settings.kind, ProviderKind::OpenAi);
        assert_eq!(settings.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.anthropic_api_key, None);
    }

    #[test]
    fn settings_debug_hides_keys() {
        let mut s = settings(ProviderKind::OpenAi);
        s.openai_api_key = Some("sk-secret".into());
        assert!(!format!("{s:?}").contains("sk-secret"));
    }

    #[test]
    fn unknown_provider_in_config_is_rejected() {
        let config = AiConfig {
            default_provider: "mystery".into(),
            ..AiConfig::default()
        };
        assert!(ProviderSettings::from_config(&config, no_env).is_err());
    }

    #[test]
    fn local_provider_needs_no_credentials() {
        let console = RecordingConsole::new();
        let provider = Provider::from_settings(&settings(ProviderKind::Local), no_env, &console)
            .unwrap();
        assert_eq!(provider.name(), "local");

        let out = provider.generate("Hello", &GenerateOptions::new()).unwrap();
        assert_eq!(out, "[LOCAL MODEL PLACEHOLDER]\nHello");
        assert_eq!(console.warnings().len(), 1);
    }

    #[cfg(feature = "openai")]
    #[test]
    fn openai_without_key_is_a_configuration_error() {
        let result = Provider::from_settings(&settings(ProviderKind::OpenAi), no_env, &SilentConsole);
        assert!(matches!(result, Err(ProviderError::Configuration(_))));
    }

    #[cfg(feature = "anthropic")]
    #[test]
    fn anthropic_key_falls_back_to_environment() {
        let env = |k: &str| (k == "ANTHROPIC_API_KEY").then(|| "key".to_string());
        let provider =
            Provider::from_settings(&settings(ProviderKind::Anthropic), env, &SilentConsole).unwrap();
        assert_eq!(provider.name(), "anthropic");
    }

    #[cfg(any(feature = "openai", feature = "anthropic"))]
    #[test]
    fn error_message_prefers_json_field() {
        assert_eq!(
            error_message(r#"{"error":{"message":"bad key","type":"auth"}}"#),
            "bad key"
        );
        assert_eq!(error_message(" plain text "), "plain text");
    }
}
