//! Project configuration (`config.yaml`) and metadata (`metadata.yaml`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::project::ProjectPaths;
use crate::util::now_iso;
use crate::yaml::{read_yaml, write_yaml};

/// The whole `config.yaml` document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Title, genre and targets.
    pub project: ProjectSection,
    /// Text-generation provider settings.
    pub ai: AiConfig,
    /// Git automation.
    pub git: GitConfig,
    /// Keys this version does not know about, kept on save.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// `project:` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSection {
    /// Working title of the novel.
    pub name: String,
    /// Genre used when prompting for scenes.
    pub genre: String,
    /// Target length of the finished manuscript.
    pub target_word_count: u64,
    /// Author shown in exports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            name: "My Novel".into(),
            genre: "romance".into(),
            target_word_count: 80_000,
            author: None,
        }
    }
}

/// `ai:` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// `openai`, `claude`/`anthropic` or `local`.
    pub default_provider: String,
    /// Model identifier passed to the backend.
    pub model: String,
    /// Sampling temperature for scene generation.
    pub temperature: f32,
    /// OpenAI key, or a `${VAR}` placeholder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
    /// Anthropic key, or a `${VAR}` placeholder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anthropic_api_key: Option<String>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            default_provider: "openai".into(),
            model: "gpt-4".into(),
            temperature: 0.7,
            openai_api_key: Some("${OPENAI_API_KEY}".into()),
            anthropic_api_key: Some("${ANTHROPIC_API_KEY}".into()),
        }
    }
}

/// `git:` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// Commit automatically after commands that change the project.
    pub auto_commit: bool,
    /// Prepended to every commit message.
    pub commit_prefix: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            auto_commit: true,
            commit_prefix: "✍️".into(),
        }
    }
}

impl GitConfig {
    /// Apply the configured prefix to a commit message.
    pub fn message(&self, message: &str) -> String {
        format!("{} {}", self.commit_prefix, message).trim().to_string()
    }
}

impl ProjectConfig {
    /// Load `config.yaml`, writing the defaults first if it does not exist.
    pub fn load(paths: &ProjectPaths) -> CoreResult<Self> {
        if !paths.config_file.exists() {
            Self::default().save(paths)?;
        }
        read_yaml(&paths.config_file)
    }

    /// Overwrite `config.yaml`.
    pub fn save(&self, paths: &ProjectPaths) -> CoreResult<()> {
        write_yaml(&paths.config_file, self)
    }
}

/// Resolve a credential value from configuration.
///
/// Blank values count as absent. A `${VAR}` placeholder is looked up through
/// `env` and counts as absent when the variable is unset or blank.
pub fn resolve_secret<F>(value: Option<&str>, env: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    match value.strip_prefix("${").and_then(|v| v.strip_suffix('}')) {
        Some(var) => env(var).filter(|v| !v.trim().is_empty()),
        None => Some(value.to_string()),
    }
}

/// The `metadata.yaml` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectMetadata {
    /// Schema version of the project layout.
    pub project_version: String,
    /// Last recorded manuscript word count.
    pub word_count: u64,
    /// When the project was created.
    pub created_at: Option<String>,
    /// When the metadata was last refreshed.
    pub last_modified: Option<String>,
}

impl Default for ProjectMetadata {
    fn default() -> Self {
        Self {
            project_version: "0.1.0".into(),
            word_count: 0,
            created_at: None,
            last_modified: None,
        }
    }
}

impl ProjectMetadata {
    /// Metadata for a project created right now.
    pub fn fresh() -> Self {
        let now = now_iso();
        Self {
            created_at: Some(now.clone()),
            last_modified: Some(now),
            ..Self::default()
        }
    }

    /// Load `metadata.yaml`, writing the defaults first if it does not exist.
    pub fn load(paths: &ProjectPaths) -> CoreResult<Self> {
        if !paths.metadata_file.exists() {
            Self::default().save(paths)?;
        }
        read_yaml(&paths.metadata_file)
    }

    /// Overwrite `metadata.yaml`.
    pub fn save(&self, paths: &ProjectPaths) -> CoreResult<()> {
        write_yaml(&paths.metadata_file, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> (tempfile::TempDir, ProjectPaths) {
        let dir = tempfile::tempdir().unwrap();
        let paths = ProjectPaths::new(dir.path());
        paths.ensure_structure().unwrap();
        (dir, paths)
    }

    #[test]
    fn load_writes_defaults_when_missing() {
        let (_dir, paths) = project();
        let config = ProjectConfig::load(&paths).unwrap();
        assert_eq!(config.project.name, "My Novel");
        assert_eq!(config.ai.model, "gpt-4");
        assert!(config.git.auto_commit);
        assert!(paths.config_file.exists());
    }

    #[test]
    fn save_round_trips_changes() {
        let (_dir, paths) = project();
        let mut config = ProjectConfig::load(&paths).unwrap();
        config.project.name = "Test Novel".into();
        config.save(&paths).unwrap();

        let updated = ProjectConfig::load(&paths).unwrap();
        assert_eq!(updated.project.name, "Test Novel");
    }

    #[test]
    fn partial_file_fills_in_defaults_and_keeps_unknown_keys() {
        let (_dir, paths) = project();
        std::fs::write(
            &paths.config_file,
            "project:\n  name: Sparse\nai:\n  default_provider: local\nstyle:\n  voice: wry\n",
        )
        .unwrap();

        let config = ProjectConfig::load(&paths).unwrap();
        assert_eq!(config.project.name, "Sparse");
        assert_eq!(config.project.genre, "romance");
        assert_eq!(config.ai.default_provider, "local");
        assert!((config.ai.temperature - 0.7).abs() < f32::EPSILON);
        assert!(config.extra.contains_key("style"));
    }

    #[test]
    fn commit_message_prefix() {
        let git = GitConfig {
            auto_commit: true,
            commit_prefix: String::new(),
        };
        assert_eq!(git.message("Add character: Elena"), "Add character: Elena");
        assert_eq!(GitConfig::default().message("x"), "✍️ x");
    }

    #[test]
    fn resolve_secret_handles_literals_and_placeholders() {
        let env = |name: &str| (name == "SET").then(|| "from-env".to_string());
        assert_eq!(resolve_secret(Some("sk-literal"), env), Some("sk-literal".into()));
        assert_eq!(resolve_secret(Some("${SET}"), env), Some("from-env".into()));
        assert_eq!(resolve_secret(Some("${UNSET}"), env), None);
        assert_eq!(resolve_secret(Some("  "), env), None);
        assert_eq!(resolve_secret(None, env), None);
    }

    #[test]
    fn metadata_fresh_is_stamped() {
        let (_dir, paths) = project();
        ProjectMetadata::fresh().save(&paths).unwrap();
        let meta = ProjectMetadata::load(&paths).unwrap();
        assert!(meta.created_at.is_some());
        assert_eq!(meta.project_version, "0.1.0");
    }
}
