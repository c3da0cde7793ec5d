//! Compile the chapters of a project into a single manuscript file.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;

use chrono::Utc;

use crate::config::ProjectConfig;
use crate::error::{CoreError, CoreResult};
use crate::project::{ProjectPaths, markdown_files};
use crate::util::title_from_stem;

/// Output formats for `calliope export`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// `.md`
    Markdown,
    /// `.txt`, same content as markdown.
    Txt,
    /// `.docx` via pandoc.
    Docx,
    /// `.pdf` via pandoc.
    Pdf,
}

impl ExportFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Txt => "txt",
            Self::Docx => "docx",
            Self::Pdf => "pdf",
        }
    }

    fn needs_pandoc(self) -> bool {
        matches!(self, Self::Docx | Self::Pdf)
    }
}

impl FromStr for ExportFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "txt" | "text" => Ok(Self::Txt),
            "docx" => Ok(Self::Docx),
            "pdf" => Ok(Self::Pdf),
            other => Err(CoreError::Export(format!(
                "unsupported export format '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Markdown => "Markdown",
            Self::Txt => "text",
            Self::Docx => "DOCX",
            Self::Pdf => "PDF",
        };
        f.write_str(name)
    }
}

/// Chapter titles and files, sorted by file name.
pub fn collect_chapters(paths: &ProjectPaths) -> CoreResult<Vec<(String, PathBuf)>> {
    Ok(markdown_files(&paths.chapters_dir)?
        .into_iter()
        .map(|file| {
            let stem = file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            (title_from_stem(&stem), file)
        })
        .collect())
}

/// Join chapters into one markdown document.
pub fn compose_markdown(
    chapters: &[(String, PathBuf)],
    title: &str,
    author: Option<&str>,
) -> CoreResult<String> {
    let mut lines = vec![format!("# {title}")];
    if let Some(author) = author.filter(|a| !a.trim().is_empty()) {
        lines.push(format!("### by {author}"));
    }
    lines.push(String::new());
    for (chapter_title, path) in chapters {
        let body = fs::read_to_string(path).map_err(|e| CoreError::io(path, e))?;
        lines.push(format!("# {chapter_title}"));
        lines.push(String::new());
        lines.push(body);
        lines.push(String::new());
    }
    Ok(format!("{}\n", lines.join("\n").trim()))
}

/// Export the manuscript to `exports/<root>-<YYYYmmdd-HHMMSS>.<ext>` and
/// return the written path.
pub fn export_project(
    paths: &ProjectPaths,
    config: &ProjectConfig,
    format: ExportFormat,
) -> CoreResult<PathBuf> {
    let chapters = collect_chapters(paths)?;
    if chapters.is_empty() {
        return Err(CoreError::Export("no chapters found to export".into()));
    }

    let title = if config.project.name.trim().is_empty() {
        paths.project_name()
    } else {
        config.project.name.clone()
    };
    let markdown = compose_markdown(&chapters, &title, config.project.author.as_deref())?;

    fs::create_dir_all(&paths.exports_dir).map_err(|e| CoreError::io(&paths.exports_dir, e))?;
    let stamp = Utc::now().format("%Y%m%d-%H%M%S");
    let base = format!("{}-{stamp}", paths.project_name());

    if !format.needs_pandoc() {
        let output = paths.exports_dir.join(format!("{base}.{}", format.extension()));
        fs::write(&output, markdown).map_err(|e| CoreError::io(&output, e))?;
        tracing::info!(path = %output.display(), %format, "exported manuscript");
        return Ok(output);
    }

    let source = paths.exports_dir.join(format!("{base}.md"));
    fs::write(&source, markdown).map_err(|e| CoreError::io(&source, e))?;
    let output = paths.exports_dir.join(format!("{base}.{}", format.extension()));
    run_pandoc(&source, &output, format)?;
    tracing::info!(path = %output.display(), %format, "exported manuscript");
    Ok(output)
}

fn run_pandoc(source: &Path, output: &Path, format: ExportFormat) -> CoreResult<()> {
    let result = Command::new("pandoc")
        .arg(source)
        .arg("-o")
        .arg(output)
        .output();
    match result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => Err(CoreError::Export(format!(
            "pandoc failed to produce {format}: {}",
            String::from_utf8_lossy(&out.stderr).trim()
        ))),
        Err(_) => Err(CoreError::Export(format!(
            "pandoc is required for {format} export"
        ))),
    }
}
