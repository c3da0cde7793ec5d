use std::env;
use std::path::PathBuf;

use calliope_ai::run_consistency_check;
use calliope_core::{CharacterStore, Console};

pub fn run(console: &dyn Console, files: &[PathBuf], all: bool) -> Result<(), String> {
    let paths = super::open_project()?;
    let config = super::load_config(&paths)?;
    let store = CharacterStore::open(&paths).map_err(|e| e.to_string())?;

    let targets: Vec<PathBuf> = if all {
        paths.manuscript_files().map_err(|e| e.to_string())?
    } else {
        let cwd = env::current_dir().map_err(|e| format!("cannot read current directory: {e}"))?;
        files.iter().map(|f| cwd.join(f)).collect()
    };
    if targets.is_empty() {
        return Err("Provide files or use --all.".into());
    }

    let provider = super::build_provider(&paths, &config, console)?;
    let report = run_consistency_check(&provider, &paths, &store, &targets, console)
        .map_err(|e| e.to_string())?;
    println!("  Report saved to {}", report.display());
    Ok(())
}
