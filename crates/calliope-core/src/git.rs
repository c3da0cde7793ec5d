//! Thin wrapper over the `git` command line.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{CoreError, CoreResult};
use crate::project::ProjectPaths;

const FALLBACK_NAME: &str = "Calliope";
const FALLBACK_EMAIL: &str = "calliope@localhost";

/// A git work tree rooted at a project directory.
#[derive(Debug, Clone)]
pub struct GitRepo {
    root: PathBuf,
}

impl GitRepo {
    /// Open the repository whose work tree root is `path`.
    pub fn open(path: &Path) -> CoreResult<Self> {
        if !path.join(".git").exists() {
            return Err(CoreError::Git(format!(
                "no git repository found at {}",
                path.display()
            )));
        }
        Ok(Self {
            root: path.to_path_buf(),
        })
    }

    /// Initialise a repository at `path` and commit whatever is there.
    pub fn init(path: &Path, initial_message: &str) -> CoreResult<Self> {
        let repo = Self {
            root: path.to_path_buf(),
        };
        repo.run(&["init", "--quiet"])?;
        repo.commit(initial_message)?;
        tracing::info!(root = %path.display(), "initialised git repository");
        Ok(repo)
    }

    /// Open the repository at `path`, initialising one if there is none.
    pub fn ensure(path: &Path) -> CoreResult<Self> {
        match Self::open(path) {
            Ok(repo) => Ok(repo),
            Err(_) => Self::init(path, "Initial commit"),
        }
    }

    /// The work tree root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stage everything and commit if anything changed. Returns whether a
    /// commit was created.
    pub fn commit(&self, message: &str) -> CoreResult<bool> {
        self.run(&["add", "--all"])?;
        if !self.is_dirty()? {
            tracing::debug!("nothing to commit");
            return Ok(false);
        }
        let mut args: Vec<String> = self.identity_args();
        args.extend(["commit", "--quiet", "-m", message].map(String::from));
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run(&refs)?;
        tracing::info!(message, "created commit");
        Ok(true)
    }

    /// Whether the work tree has staged, unstaged or untracked changes.
    pub fn is_dirty(&self) -> CoreResult<bool> {
        Ok(!self.run(&["status", "--porcelain"])?.trim().is_empty())
    }

    /// `(staged, modified_or_untracked)` paths, each sorted and deduplicated.
    pub fn status(&self) -> CoreResult<(Vec<String>, Vec<String>)> {
        let out = self.run(&["status", "--porcelain", "--untracked-files=all"])?;
        let (mut staged, mut modified) = parse_porcelain(&out);
        staged.sort();
        staged.dedup();
        modified.sort();
        modified.dedup();
        Ok((staged, modified))
    }

    /// Recent history with file stats.
    pub fn log(&self, max_entries: usize) -> CoreResult<String> {
        let count = format!("-{max_entries}");
        self.run(&["log", &count, "--stat", "--decorate"])
            .map_err(|_| CoreError::Git("failed to read git log".into()))
    }

    /// Create a branch at HEAD without switching to it.
    pub fn create_branch(&self, name: &str) -> CoreResult<()> {
        self.run(&["branch", name])
            .map(|_| ())
            .map_err(|_| CoreError::Git(format!("failed to create branch {name}")))
    }

    /// Working-tree diff, optionally limited to one path.
    pub fn diff(&self, path: Option<&str>) -> CoreResult<String> {
        let result = match path {
            Some(p) => self.run(&["diff", "--word-diff", "--", p]),
            None => self.run(&["diff", "--word-diff"]),
        };
        result.map_err(|_| CoreError::Git("failed to obtain diff".into()))
    }

    fn identity_args(&self) -> Vec<String> {
        let configured = self
            .run(&["config", "user.email"])
            .is_ok_and(|email| !email.trim().is_empty());
        if configured {
            return Vec::new();
        }
        vec![
            "-c".into(),
            format!("user.name={FALLBACK_NAME}"),
            "-c".into(),
            format!("user.email={FALLBACK_EMAIL}"),
        ]
    }

    fn run(&self, args: &[&str]) -> CoreResult<String> {
        tracing::debug!(?args, root = %self.root.display(), "running git");
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .map_err(|e| CoreError::Git(format!("cannot run git: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CoreError::Git(format!(
                "git {} failed: {}",
                args.first().copied().unwrap_or_default(),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn parse_porcelain(out: &str) -> (Vec<String>, Vec<String>) {
    let mut staged = Vec::new();
    let mut modified = Vec::new();
    for line in out.lines() {
        let mut chars = line.chars();
        let (Some(x), Some(y)) = (chars.next(), chars.next()) else {
            continue;
        };
        let Some(path) = line.get(3..) else {
            continue;
        };
        // Renames are reported as "old -> new"; keep the new path.
        let path = path.rsplit(" -> ").next().unwrap_or(path).to_string();
        if x == '?' {
            modified.push(path);
            continue;
        }
        if x != ' ' {
            staged.push(path.clone());
        }
        if y != ' ' {
            modified.push(path);
        }
    }
    (staged, modified)
}

/// Status summary with the manuscript word count.
pub fn human_status(repo: &GitRepo, paths: &ProjectPaths) -> CoreResult<String> {
    let (staged, modified) = repo.status()?;
    let word_count = paths.word_count()?;

    let mut out = String::new();
    let _ = writeln!(out, "Project Status: {}\n", paths.project_name());
    let _ = writeln!(out, "Word Count: {} words", group_thousands(word_count));
    if !modified.is_empty() {
        let _ = writeln!(out, "Modified/Untracked: {} file(s)", modified.len());
    }
    if !staged.is_empty() {
        let _ = writeln!(out, "Staged: {} file(s)", staged.len());
    }
    out.push_str("\nGit Status:\n");
    if staged.is_empty() && modified.is_empty() {
        out.push_str("  Clean working tree\n");
    }
    for (label, items) in [("Staged", &staged), ("Modified/Untracked", &modified)] {
        if items.is_empty() {
            continue;
        }
        let _ = writeln!(out, "  {label}:");
        for item in items {
            let _ = writeln!(out, "    - {item}");
        }
    }
    Ok(out)
}

fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn git_available() -> bool {
        Command::new("git").arg("--version").output().is_ok()
    }

    fn project() -> (tempfile::TempDir, ProjectPaths) {
        let dir = tempfile::tempdir().unwrap();
        let paths = ProjectPaths::new(dir.path().join("novel"));
        paths.bootstrap().unwrap();
        (dir, paths)
    }

    #[test]
    fn parse_porcelain_splits_staged_and_modified() {
        let out = "M  chapters/a.md\n M scenes/b.md\nMM notes.md\n?? new.md\nR  old.md -> renamed.md\n";
        let (staged, modified) = parse_porcelain(out);
        assert_eq!(staged, vec!["chapters/a.md", "notes.md", "renamed.md"]);
        assert_eq!(modified, vec!["scenes/b.md", "notes.md", "new.md"]);
    }

    #[test]
    fn thousands_are_grouped() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(80_000), "80,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn open_without_repository_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(GitRepo::open(dir.path()), Err(CoreError::Git(_))));
    }

    #[test]
    fn commit_adds_file() {
        if !git_available() {
            return;
        }
        let (_dir, paths) = project();
        let repo = GitRepo::ensure(&paths.root).unwrap();
        assert!(!repo.is_dirty().unwrap());

        fs::write(paths.chapters_dir.join("chapter-02.md"), "Content").unwrap();
        assert!(repo.commit("Add chapter 2").unwrap());
        assert!(!repo.is_dirty().unwrap());
        assert!(!repo.commit("Nothing").unwrap());
        assert!(repo.log(5).unwrap().contains("Add chapter 2"));
    }

    #[test]
    fn human_status_lists_changes() {
        if !git_available() {
            return;
        }
        let (_dir, paths) = project();
        let repo = GitRepo::ensure(&paths.root).unwrap();
        fs::write(paths.scenes_dir.join("draft.md"), "three little words").unwrap();

        let status = human_status(&repo, &paths).unwrap();
        assert!(status.contains("Project Status: novel"));
        assert!(status.contains("scenes/draft.md"));
    }

    #[test]
    fn create_branch_twice_fails() {
        if !git_available() {
            return;
        }
        let (_dir, paths) = project();
        let repo = GitRepo::ensure(&paths.root).unwrap();
        repo.create_branch("alternate-ending").unwrap();
        assert!(repo.create_branch("alternate-ending").is_err());
    }
}
