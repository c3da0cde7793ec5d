use calliope_core::Console;
use calliope_core::export::{ExportFormat, export_project};

pub fn run(console: &dyn Console, format: &str) -> Result<(), String> {
    let paths = super::open_project()?;
    let config = super::load_config(&paths)?;
    let format = format
        .parse::<ExportFormat>()
        .map_err(|e| e.to_string())?;

    let output = export_project(&paths, &config, format).map_err(|e| e.to_string())?;
    console.success(&format!("Exported {format} to {}", output.display()));
    Ok(())
}
