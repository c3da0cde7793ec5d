use calliope_core::ProjectMetadata;
use comfy_table::{ContentArrangement, Table};

pub fn run() -> Result<(), String> {
    let paths = super::open_project()?;
    let config = super::load_config(&paths)?;
    let metadata = ProjectMetadata::load(&paths).map_err(|e| e.to_string())?;
    let words = paths.word_count().map_err(|e| e.to_string())?;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec!["Project".to_string(), config.project.name.clone()]);
    table.add_row(vec!["Genre".to_string(), config.project.genre.clone()]);
    if let Some(author) = &config.project.author {
        table.add_row(vec!["Author".to_string(), author.clone()]);
    }
    table.add_row(vec![
        "Words".to_string(),
        format!("{words} / {}", config.project.target_word_count),
    ]);
    table.add_row(vec!["Version".to_string(), metadata.project_version.clone()]);
    table.add_row(vec![
        "Created".to_string(),
        metadata.created_at.clone().unwrap_or_else(|| "-".into()),
    ]);
    table.add_row(vec![
        "Last modified".to_string(),
        metadata.last_modified.clone().unwrap_or_else(|| "-".into()),
    ]);

    println!("{table}");
    Ok(())
}
