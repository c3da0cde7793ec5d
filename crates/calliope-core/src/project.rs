//! Project layout: the fixed set of directories and files under a project root.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{ProjectConfig, ProjectMetadata};
use crate::error::{CoreError, CoreResult};
use crate::store::CharacterFile;
use crate::yaml::write_yaml;

/// Name of the hidden directory that marks a project root.
pub const CONFIG_DIR_NAME: &str = ".calliope";

/// How many directories [`ProjectPaths::resolve_root`] checks, the start included.
const MAX_ROOT_SEARCH_DEPTH: usize = 5;

const GITIGNORE: &str = "\
# Environment variables
.env
.env.local

# Calliope specific
.calliope/consistency_reports/
exports/
*.docx
*.pdf

# OS
.DS_Store
Thumbs.db

# Editors
.vscode/
.idea/
*.swp
*.swo
";

const BUILTIN_TEMPLATES: &[(&str, &str, &str)] = &[
    (
        "characters",
        "romance-protagonist",
        "\
name: Protagonist
age: 29
physical: Warm eyes, an easy smile, ink-stained fingers
personality:
  - witty
  - guarded
  - fiercely loyal
backstory: Left a promising career in the city to rebuild the family bookshop.
role: protagonist
",
    ),
    (
        "characters",
        "love-interest",
        "\
name: Love Interest
age: 32
physical: Tall, weathered hands, a scar through one eyebrow
personality:
  - steady
  - dry humour
  - slow to trust
backstory: Returned home after a decade away and is not ready to talk about why.
role: love interest
",
    ),
    (
        "scenes",
        "meet-cute",
        "\
name: Meet Cute
premise: Two strangers reach for the last copy of the same book.
beats:
  - An awkward collision
  - Banter that reveals opposing views
  - A reason to meet again
",
    ),
];

/// Strongly typed paths for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    /// The project root directory.
    pub root: PathBuf,
    /// `.calliope/`
    pub config_dir: PathBuf,
    /// `.calliope/config.yaml`
    pub config_file: PathBuf,
    /// `.calliope/characters.yaml`
    pub characters_file: PathBuf,
    /// `.calliope/metadata.yaml`
    pub metadata_file: PathBuf,
    /// `.calliope/consistency_reports/`
    pub reports_dir: PathBuf,
    /// `chapters/`
    pub chapters_dir: PathBuf,
    /// `scenes/`
    pub scenes_dir: PathBuf,
    /// `notes/`
    pub notes_dir: PathBuf,
    /// `exports/`
    pub exports_dir: PathBuf,
    /// `templates/`
    pub templates_dir: PathBuf,
}

impl ProjectPaths {
    /// Compute every project path below `root`. Nothing is created.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let config_dir = root.join(CONFIG_DIR_NAME);
        Self {
            config_file: config_dir.join("config.yaml"),
            characters_file: config_dir.join("characters.yaml"),
            metadata_file: config_dir.join("metadata.yaml"),
            reports_dir: config_dir.join("consistency_reports"),
            chapters_dir: root.join("chapters"),
            scenes_dir: root.join("scenes"),
            notes_dir: root.join("notes"),
            exports_dir: root.join("exports"),
            templates_dir: root.join("templates"),
            config_dir,
            root,
        }
    }

    /// Look for a project root at `start` or up to four parents above it.
    pub fn resolve_root(start: &Path) -> Option<PathBuf> {
        let mut current = Some(start);
        for _ in 0..MAX_ROOT_SEARCH_DEPTH {
            let dir = current?;
            if dir.join(CONFIG_DIR_NAME).is_dir() {
                return Some(dir.to_path_buf());
            }
            current = dir.parent();
        }
        None
    }

    /// Project name, taken from the root directory name.
    pub fn project_name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.root.display().to_string())
    }

    /// Render `path` relative to the root when it lives below it.
    pub fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }

    /// Create the directory layout if any part is missing.
    pub fn ensure_structure(&self) -> CoreResult<()> {
        for dir in [
            &self.config_dir,
            &self.reports_dir,
            &self.chapters_dir,
            &self.scenes_dir,
            &self.notes_dir,
            &self.exports_dir,
        ] {
            fs::create_dir_all(dir).map_err(|e| CoreError::io(dir, e))?;
        }
        Ok(())
    }

    /// Write default config, an empty cast, fresh metadata, starter content,
    /// `.gitignore` and the built-in templates.
    pub fn bootstrap(&self) -> CoreResult<()> {
        self.ensure_structure()?;
        ProjectConfig::default().save(self)?;
        write_yaml(&self.characters_file, &CharacterFile::default())?;
        ProjectMetadata::fresh().save(self)?;

        write_file(&self.root.join(".gitignore"), GITIGNORE)?;
        write_file(
            &self.chapters_dir.join("chapter-01.md"),
            "# Chapter 01\n\nWrite your story...",
        )?;
        write_file(&self.notes_dir.join("ideas.md"), "# Story Ideas\n\n- ")?;

        for (category, name, body) in BUILTIN_TEMPLATES {
            let path = self.templates_dir.join(category).join(format!("{name}.yaml"));
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| CoreError::io(parent, e))?;
            }
            write_file(&path, body)?;
        }

        tracing::info!(root = %self.root.display(), "bootstrapped project");
        Ok(())
    }

    /// Every `*.md` file in `chapters/` and `scenes/`, each directory sorted.
    pub fn manuscript_files(&self) -> CoreResult<Vec<PathBuf>> {
        let mut files = markdown_files(&self.chapters_dir)?;
        files.extend(markdown_files(&self.scenes_dir)?);
        Ok(files)
    }

    /// Total whitespace-separated words across chapters and scenes.
    pub fn word_count(&self) -> CoreResult<usize> {
        let mut total = 0;
        for file in self.manuscript_files()? {
            let text = fs::read_to_string(&file).map_err(|e| CoreError::io(&file, e))?;
            total += text.split_whitespace().count();
        }
        Ok(total)
    }
}

/// Sorted `*.md` files directly inside `dir`. A missing directory is empty.
pub fn markdown_files(dir: &Path) -> CoreResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(dir).map_err(|e| CoreError::io(dir, e))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "md"))
        .collect();
    files.sort();
    Ok(files)
}

fn write_file(path: &Path, contents: &str) -> CoreResult<()> {
    fs::write(path, contents).map_err(|e| CoreError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_laid_out_under_root() {
        let paths = ProjectPaths::new("/tmp/novel");
        assert_eq!(paths.config_file, Path::new("/tmp/novel/.calliope/config.yaml"));
        assert_eq!(
            paths.reports_dir,
            Path::new("/tmp/novel/.calliope/consistency_reports")
        );
        assert_eq!(paths.chapters_dir, Path::new("/tmp/novel/chapters"));
        assert_eq!(paths.project_name(), "novel");
    }

    #[test]
    fn bootstrap_creates_layout_and_starter_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ProjectPaths::new(dir.path().join("novel"));
        paths.bootstrap().unwrap();

        assert!(paths.config_file.exists());
        assert!(paths.characters_file.exists());
        assert!(paths.metadata_file.exists());
        assert!(paths.reports_dir.is_dir());
        assert!(paths.chapters_dir.join("chapter-01.md").exists());
        assert!(paths.notes_dir.join("ideas.md").exists());
        assert!(paths.root.join(".gitignore").exists());
        assert!(
            paths
                .templates_dir
                .join("characters/romance-protagonist.yaml")
                .exists()
        );
    }

    #[test]
    fn resolve_root_walks_up_from_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ProjectPaths::new(dir.path());
        paths.ensure_structure().unwrap();

        let found = ProjectPaths::resolve_root(&paths.chapters_dir).unwrap();
        assert_eq!(found, dir.path());
    }

    #[test]
    fn resolve_root_checks_four_parents() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ProjectPaths::new(dir.path());
        paths.ensure_structure().unwrap();

        let four_down = dir.path().join("a/b/c/d");
        let five_down = four_down.join("e");
        fs::create_dir_all(&five_down).unwrap();
        assert_eq!(ProjectPaths::resolve_root(&four_down).unwrap(), dir.path());
        assert!(ProjectPaths::resolve_root(&five_down).is_none());
    }

    #[test]
    fn resolve_root_gives_up_outside_a_project() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ProjectPaths::resolve_root(dir.path()).is_none());
    }

    #[test]
    fn word_count_spans_chapters_and_scenes() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ProjectPaths::new(dir.path());
        paths.ensure_structure().unwrap();
        fs::write(paths.chapters_dir.join("a.md"), "one two three").unwrap();
        fs::write(paths.scenes_dir.join("b.md"), "four five").unwrap();
        fs::write(paths.scenes_dir.join("ignored.txt"), "six").unwrap();

        assert_eq!(paths.word_count().unwrap(), 5);
        assert_eq!(paths.manuscript_files().unwrap().len(), 2);
    }
}
