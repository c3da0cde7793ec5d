//! Character consistency checks: scan files for mentions, ask the provider
//! to compare the text against the cast, and save the answer as a report.

use std::fs;
use std::path::{Path, PathBuf};

use calliope_core::util::{now_iso, timestamp_stem};
use calliope_core::{CharacterStore, Console, ProjectPaths, extract_mentions};

use crate::error::{AiError, AiResult};
use crate::provider::{GenerateOptions, TextProvider};

const REPORT_HEADER: &str = "Calliope Character Consistency Report";
const SYSTEM_PROMPT: &str = "You are an editorial assistant focused on continuity and consistency.";
const EMPTY_DATABASE: &str = "No characters defined yet.";

const PROMPT_TEMPLATE: &str = "\
You are a fiction writing assistant checking for character consistency.

Character Database:
{character_database}

Text being analyzed:
{text}

Check for:
1. Physical description contradictions
2. Personality inconsistencies
3. Relationship status changes that don't align
4. Timeline issues

Output format:
CONSISTENT: [list any consistent elements]
WARNINGS: [list potential issues]
CONTRADICTIONS: [list clear contradictions with line references]
";

/// Plain-text dump of the cast: each name followed by `- key: value` lines.
pub fn character_database_dump(store: &CharacterStore) -> String {
    let mut lines = Vec::new();
    for character in store.list() {
        lines.push(character.name.clone());
        lines.extend(
            character
                .fields()
                .into_iter()
                .map(|(key, value)| format!("- {key}: {value}")),
        );
        lines.push(String::new());
    }
    lines.join("\n").trim().to_string()
}

/// Build the consistency prompt for a database dump and the combined text.
pub fn build_prompt(character_database: &str, text: &str) -> String {
    let database = if character_database.trim().is_empty() {
        EMPTY_DATABASE
    } else {
        character_database
    };
    PROMPT_TEMPLATE
        .replace("{character_database}", database)
        .replace("{text}", text)
}

/// Check `files` against the cast and write a report under the project's
/// report directory. Returns the report path.
///
/// Missing files are skipped with a warning. When none of the files can be
/// read nothing is sent and nothing is written.
pub fn run_consistency_check(
    provider: &dyn TextProvider,
    paths: &ProjectPaths,
    store: &CharacterStore,
    files: &[PathBuf],
    console: &dyn Console,
) -> AiResult<PathBuf> {
    let names = store.names();
    let mut snippets = Vec::new();
    let mut mention_report = Vec::new();

    for file in files {
        if !file.is_file() {
            console.warn(&format!("Skipping missing file {}", file.display()));
            continue;
        }
        let text = fs::read_to_string(file).map_err(|e| AiError::io(file, e))?;
        let mentions = extract_mentions(&text, &names);

        snippets.push(format!("# File: {}", paths.relative(file).display()));
        snippets.push(text);

        if !mentions.is_empty() {
            mention_report.push(format!("{}:", file_name(file)));
            for mention in &mentions {
                let lines: Vec<String> = mention.lines.iter().map(usize::to_string).collect();
                mention_report.push(format!("  - {}: lines {}", mention.name, lines.join(", ")));
            }
        }
    }

    if snippets.is_empty() {
        return Err(AiError::Validation(
            "no valid files provided for consistency check".into(),
        ));
    }

    let prompt = build_prompt(&character_database_dump(store), &snippets.join("\n\n"));
    console.info("Running AI consistency check...");
    tracing::info!(provider = provider.name(), files = files.len(), "running consistency check");
    let options = GenerateOptions::new()
        .with_system_prompt(SYSTEM_PROMPT)
        .with_temperature(0.0);
    let output = provider.generate(&prompt, &options)?;

    let report_path = paths
        .reports_dir
        .join(format!("{}.txt", timestamp_stem(&now_iso())));
    fs::create_dir_all(&paths.reports_dir).map_err(|e| AiError::io(&paths.reports_dir, e))?;

    let mut content = vec![REPORT_HEADER.to_string(), String::new()];
    if !mention_report.is_empty() {
        content.push("Mentions:".into());
        content.extend(mention_report);
        content.push(String::new());
    }
    content.push(output.trim().to_string());
    content.push(String::new());
    fs::write(&report_path, content.join("\n")).map_err(|e| AiError::io(&report_path, e))?;

    console.success(&format!(
        "Saved consistency report to {}",
        report_path.display()
    ));
    Ok(report_path)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
