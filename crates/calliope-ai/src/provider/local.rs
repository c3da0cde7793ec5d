use calliope_core::Console;

use super::{GenerateOptions, ProviderSettings, TextProvider};
use crate::error::ProviderError;

/// Offline stand-in for a local model: echoes the prompt back.
pub struct LocalProvider<'c> {
    model: String,
    console: &'c dyn Console,
}

impl<'c> LocalProvider<'c> {
    /// A placeholder provider that reports through `console`.
    pub fn new(settings: &ProviderSettings, console: &'c dyn Console) -> Self {
        Self {
            model: settings.model.clone(),
            console,
        }
    }
}

impl TextProvider for LocalProvider<'_> {
    fn name(&self) -> &'static str {
        "local"
    }

    fn generate(&self, prompt: &str, _options: &GenerateOptions) -> Result<String, ProviderError> {
        tracing::debug!(model = %self.model, "local provider called");
        self.console
            .warn("Local provider is not yet implemented. Returning prompt as placeholder.");
        Ok(format!("[LOCAL MODEL PLACEHOLDER]\n{prompt}"))
    }
}
