pub mod character;
pub mod check;
pub mod cleanup;
pub mod config;
pub mod export;
pub mod generate;
pub mod git;
pub mod info;
pub mod init;
pub mod template;

use std::collections::HashMap;
use std::env;
use std::fmt::Display;
use std::io::{self, BufRead, StdinLock, Write};
use std::path::Path;
use std::str::FromStr;

use calliope_ai::{Provider, ProviderSettings};
use calliope_core::git::GitRepo;
use calliope_core::{Console, ProjectConfig, ProjectPaths};

/// Resolve the project from the current directory and make sure its layout
/// exists.
fn open_project() -> Result<ProjectPaths, String> {
    let cwd = env::current_dir().map_err(|e| format!("cannot read current directory: {e}"))?;
    let root = ProjectPaths::resolve_root(&cwd)
        .ok_or("Not a Calliope project. Run `calliope init <project>` first.")?;
    let paths = ProjectPaths::new(root);
    paths.ensure_structure().map_err(|e| e.to_string())?;
    tracing::debug!(root = %paths.root.display(), "resolved project");
    Ok(paths)
}

fn load_config(paths: &ProjectPaths) -> Result<ProjectConfig, String> {
    ProjectConfig::load(paths).map_err(|e| e.to_string())
}

fn open_repo(paths: &ProjectPaths) -> Result<GitRepo, String> {
    GitRepo::ensure(&paths.root).map_err(|e| e.to_string())
}

/// Commit everything with the configured prefix when auto-commit is on.
/// Failures are reported as warnings; the command itself already succeeded.
fn autocommit(console: &dyn Console, paths: &ProjectPaths, config: &ProjectConfig, message: &str) {
    if !config.git.auto_commit {
        return;
    }
    let result = GitRepo::ensure(&paths.root).and_then(|repo| repo.commit(&config.git.message(message)));
    if let Err(e) = result {
        tracing::warn!(error = %e, "auto-commit failed");
        console.warn(&format!("Auto-commit skipped: {e}"));
    }
}

/// Environment lookup: the process environment first, then the project's
/// `.env` file.
struct EnvLookup {
    dotenv: HashMap<String, String>,
}

impl EnvLookup {
    fn load(root: &Path) -> Self {
        let path = root.join(".env");
        let dotenv = match dotenvy::from_path_iter(&path) {
            Ok(iter) => iter.filter_map(Result::ok).collect(),
            Err(_) => HashMap::new(),
        };
        tracing::debug!(entries = dotenv.len(), "loaded .env");
        Self { dotenv }
    }

    fn get(&self, key: &str) -> Option<String> {
        env::var(key)
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.dotenv.get(key).cloned())
    }
}

fn build_provider<'c>(
    paths: &ProjectPaths,
    config: &ProjectConfig,
    console: &'c dyn Console,
) -> Result<Provider<'c>, String> {
    let env = EnvLookup::load(&paths.root);
    let settings =
        ProviderSettings::from_config(&config.ai, |k| env.get(k)).map_err(|e| e.to_string())?;
    Provider::from_settings(&settings, |k| env.get(k), console).map_err(|e| e.to_string())
}

/// Line-based prompts on any buffered reader.
pub struct Prompter<R> {
    input: R,
}

impl Prompter<StdinLock<'static>> {
    /// Prompt on the process's stdin.
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock())
    }
}

impl<R: BufRead> Prompter<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }

    /// Read one line; `None` at end of input.
    fn read(&mut self, label: &str) -> Result<Option<String>, String> {
        print!("{label}: ");
        io::stdout().flush().map_err(|e| e.to_string())?;
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => {
                println!();
                Ok(None)
            }
            Ok(_) => Ok(Some(line.trim().to_string())),
            Err(e) => Err(e.to_string()),
        }
    }

    /// Ask with a default that is used for blank answers and at end of input.
    pub fn ask(&mut self, label: &str, default: &str) -> Result<String, String> {
        let label = if default.is_empty() {
            label.to_string()
        } else {
            format!("{label} [{default}]")
        };
        Ok(self
            .read(&label)?
            .filter(|answer| !answer.is_empty())
            .unwrap_or_else(|| default.to_string()))
    }

    /// Ask until a non-blank answer is given.
    pub fn ask_required(&mut self, label: &str) -> Result<String, String> {
        loop {
            match self.read(label)? {
                Some(answer) if !answer.is_empty() => return Ok(answer),
                Some(_) => continue,
                None => return Err(format!("no answer given for '{label}'")),
            }
        }
    }

    /// Yes/no question.
    pub fn confirm(&mut self, label: &str, default: bool) -> Result<bool, String> {
        let hint = if default { "Y/n" } else { "y/N" };
        let answer = self.read(&format!("{label} [{hint}]"))?;
        Ok(match answer.as_deref().map(str::to_lowercase).as_deref() {
            Some("y" | "yes") => true,
            Some("n" | "no") => false,
            _ => default,
        })
    }

    /// Ask for a value parsed with `FromStr`, repeating on invalid input.
    pub fn ask_parsed<T>(&mut self, label: &str, default: T) -> Result<T, String>
    where
        T: FromStr + Display,
    {
        let label = format!("{label} [{default}]");
        loop {
            match self.read(&label)? {
                None => return Ok(default),
                Some(answer) if answer.is_empty() => return Ok(default),
                Some(answer) => match answer.parse() {
                    Ok(value) => return Ok(value),
                    Err(_) => println!("  '{answer}' is not a valid value"),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn ask_uses_default_for_blank_and_eof() {
        let mut prompter = Prompter::new(Cursor::new("\n"));
        assert_eq!(prompter.ask("Tone", "tense").unwrap(), "tense");
        assert_eq!(prompter.ask("Tone", "tense").unwrap(), "tense");
    }

    #[test]
    fn ask_required_skips_blank_lines() {
        let mut prompter = Prompter::new(Cursor::new("\n  \nElena\n"));
        assert_eq!(prompter.ask_required("Name").unwrap(), "Elena");
        assert!(prompter.ask_required("Name").is_err());
    }

    #[test]
    fn confirm_reads_yes_and_no() {
        let mut prompter = Prompter::new(Cursor::new("yes\nN\n\n"));
        assert!(prompter.confirm("Go?", false).unwrap());
        assert!(!prompter.confirm("Go?", true).unwrap());
        assert!(prompter.confirm("Go?", true).unwrap());
    }

    #[test]
    fn ask_parsed_retries_invalid_input() {
        let mut prompter = Prompter::new(Cursor::new("many\n1200\n"));
        assert_eq!(prompter.ask_parsed("Words", 800u32).unwrap(), 1200);
        assert_eq!(prompter.ask_parsed("Words", 800u32).unwrap(), 800);
    }
}
