//! Core types for Calliope: the project layout, the character cast, mention
//! scanning, templates, version control and manuscript export.
//!
//! Nothing in this crate talks to a language model. The AI-backed features
//! live in `calliope-ai` and build on the types defined here.

/// Character records and partial updates.
pub mod character;
/// Project configuration and metadata documents.
pub mod config;
/// User-facing output sinks.
pub mod console;
/// Error types used throughout the crate.
pub mod error;
/// Manuscript export.
pub mod export;
/// Version control through the `git` binary.
pub mod git;
/// Character mention scanning.
pub mod mentions;
/// Project directory layout and bootstrap.
pub mod project;
/// The persisted character cast.
pub mod store;
/// Character and scene templates.
pub mod template;
/// Small shared helpers.
pub mod util;
/// YAML document reading and writing.
pub mod yaml;

/// Re-export character types.
pub use character::{Character, CharacterUpdate, Relationship};
/// Re-export configuration types.
pub use config::{ProjectConfig, ProjectMetadata};
/// Re-export console types.
pub use console::{Console, RecordingConsole, SilentConsole, TerminalConsole};
/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export mention types.
pub use mentions::{MentionMap, extract_mentions};
/// Re-export the project layout.
pub use project::ProjectPaths;
/// Re-export the character store.
pub use store::CharacterStore;
