use calliope_core::Console;
use calliope_core::git::human_status;

use super::Prompter;

pub fn status() -> Result<(), String> {
    let paths = super::open_project()?;
    let repo = super::open_repo(&paths)?;
    let summary = human_status(&repo, &paths).map_err(|e| e.to_string())?;
    print!("{summary}");
    Ok(())
}

pub fn commit(console: &dyn Console, message: Option<&str>) -> Result<(), String> {
    let paths = super::open_project()?;
    let config = super::load_config(&paths)?;
    let repo = super::open_repo(&paths)?;

    let message = match message.filter(|m| !m.trim().is_empty()) {
        Some(m) => m.to_string(),
        None => Prompter::stdin().ask_required("Commit message")?,
    };
    let created = repo
        .commit(&config.git.message(&message))
        .map_err(|e| e.to_string())?;
    if created {
        console.success("Commit created.");
    } else {
        console.warn("Nothing to commit.");
    }
    Ok(())
}

pub fn log(count: usize) -> Result<(), String> {
    let paths = super::open_project()?;
    let repo = super::open_repo(&paths)?;
    print!("{}", repo.log(count).map_err(|e| e.to_string())?);
    Ok(())
}

pub fn branch(console: &dyn Console, name: &str) -> Result<(), String> {
    let paths = super::open_project()?;
    let repo = super::open_repo(&paths)?;
    repo.create_branch(name).map_err(|e| e.to_string())?;
    console.success(&format!("Created branch {name}"));
    Ok(())
}

pub fn diff(file: Option<&str>) -> Result<(), String> {
    let paths = super::open_project()?;
    let repo = super::open_repo(&paths)?;
    let output = repo.diff(file).map_err(|e| e.to_string())?;
    if output.trim().is_empty() {
        println!("  No changes.");
    } else {
        print!("{output}");
    }
    Ok(())
}
