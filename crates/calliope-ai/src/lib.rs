//! AI assistance for Calliope: text-generation providers, the character
//! consistency checker and the scene generator.
//!
//! Every component takes its [`TextProvider`] and
//! [`Console`](calliope_core::Console) as arguments, so tests can substitute
//! scripted providers and recording consoles.

/// Character consistency checking.
pub mod consistency;
/// Error types for providers and AI features.
pub mod error;
/// Text-generation backends.
pub mod provider;
/// Scene generation.
pub mod scene;

/// Re-export the consistency entry point.
pub use consistency::run_consistency_check;
/// Re-export error types.
pub use error::{AiError, AiResult, ProviderError};
/// Re-export provider types.
pub use provider::{GenerateOptions, Provider, ProviderKind, ProviderSettings, TextProvider};
/// Re-export scene generation types.
pub use scene::{SceneRequest, build_character_context, generate_scene};
