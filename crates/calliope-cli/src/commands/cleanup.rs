use std::fs;
use std::path::PathBuf;

use calliope_core::Console;

use super::Prompter;

pub fn run(console: &dyn Console, yes: bool) -> Result<(), String> {
    let paths = super::open_project()?;

    let mut files: Vec<PathBuf> = Vec::new();
    for dir in [&paths.exports_dir, &paths.reports_dir] {
        let Ok(entries) = fs::read_dir(dir) else {
            continue;
        };
        files.extend(
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_file()),
        );
    }

    if files.is_empty() {
        console.warn("Nothing to clean.");
        return Ok(());
    }
    if !yes && !Prompter::stdin().confirm("Delete generated exports and reports?", false)? {
        console.warn("Aborted.");
        return Ok(());
    }

    for file in &files {
        fs::remove_file(file).map_err(|e| format!("cannot remove {}: {e}", file.display()))?;
    }
    tracing::info!(removed = files.len(), "cleaned generated files");
    console.success(&format!("Cleanup complete. Removed {} file(s).", files.len()));
    Ok(())
}
