use std::fs::OpenOptions;
use std::io::Write;

use calliope_ai::ProviderKind;
use calliope_core::Console;

use super::Prompter;

const OPENAI_KEY_VAR: &str = "OPENAI_API_KEY";
const ANTHROPIC_KEY_VAR: &str = "ANTHROPIC_API_KEY";

pub fn ai(console: &dyn Console) -> Result<(), String> {
    let paths = super::open_project()?;
    let mut config = super::load_config(&paths)?;
    let mut prompter = Prompter::stdin();

    let provider = prompter.ask(
        "Default provider (openai, claude, local)",
        &config.ai.default_provider,
    )?;
    provider.parse::<ProviderKind>().map_err(|e| e.to_string())?;
    let model = prompter.ask("Model", &config.ai.model)?;
    let temperature = prompter.ask_parsed("Temperature", config.ai.temperature)?;
    let openai_key = prompter.ask("OpenAI API key (leave blank to keep current)", "")?;
    let anthropic_key = prompter.ask("Anthropic Claude API key (leave blank to keep current)", "")?;

    config.ai.default_provider = provider.to_lowercase();
    config.ai.model = model;
    config.ai.temperature = temperature;
    // config.yaml is committed; keys live only in the ignored .env.
    if !openai_key.is_empty() {
        config.ai.openai_api_key = Some(placeholder(OPENAI_KEY_VAR));
    }
    if !anthropic_key.is_empty() {
        config.ai.anthropic_api_key = Some(placeholder(ANTHROPIC_KEY_VAR));
    }
    config.save(&paths).map_err(|e| e.to_string())?;

    let mut env_lines = Vec::new();
    if !openai_key.is_empty() {
        env_lines.push(format!("{OPENAI_KEY_VAR}={openai_key}"));
    }
    if !anthropic_key.is_empty() {
        env_lines.push(format!("{ANTHROPIC_KEY_VAR}={anthropic_key}"));
    }
    if !env_lines.is_empty() {
        let env_path = paths.root.join(".env");
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&env_path)
            .map_err(|e| format!("cannot open {}: {e}", env_path.display()))?;
        writeln!(file, "{}", env_lines.join("\n"))
            .map_err(|e| format!("cannot write {}: {e}", env_path.display()))?;
        console.success(&format!("Updated {}", env_path.display()));
    }

    console.success("AI configuration saved.");
    Ok(())
}

fn placeholder(var: &str) -> String {
    format!("${{{var}}}")
}
