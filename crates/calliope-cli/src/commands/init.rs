use std::env;
use std::fs;

use calliope_core::git::GitRepo;
use calliope_core::{Console, ProjectConfig, ProjectPaths};
use colored::Colorize;

pub fn run(console: &dyn Console, name: &str) -> Result<(), String> {
    let cwd = env::current_dir().map_err(|e| format!("cannot read current directory: {e}"))?;
    let root = cwd.join(name);

    let occupied = fs::read_dir(&root).is_ok_and(|mut entries| entries.next().is_some());
    if occupied {
        return Err(format!(
            "directory {} already exists and is not empty",
            root.display()
        ));
    }

    let paths = ProjectPaths::new(&root);
    paths.bootstrap().map_err(|e| e.to_string())?;

    let mut config = ProjectConfig::load(&paths).map_err(|e| e.to_string())?;
    config.project.name = paths.project_name();
    config.save(&paths).map_err(|e| e.to_string())?;

    if let Err(e) = GitRepo::init(&root, "Initial commit") {
        tracing::warn!(error = %e, "git initialisation failed");
        console.warn(&format!("Project created without version control: {e}"));
    }

    console.success(&format!("Initialized Calliope project at {}", root.display()));
    println!();
    println!("{}", "Next steps:".bold());
    println!("  cd {name}");
    println!("  calliope character add <name>   # Build your cast");
    println!("  calliope check --all            # Check character consistency");
    println!("  calliope status                 # Word count and changes");

    Ok(())
}
