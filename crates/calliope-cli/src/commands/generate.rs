use calliope_ai::scene::DEFAULT_WORD_COUNT;
use calliope_ai::{SceneRequest, generate_scene};
use calliope_core::util::human_join;
use calliope_core::{CharacterStore, Console};

use super::Prompter;

pub fn scene(console: &dyn Console, name: &str, append_to: Option<&str>) -> Result<(), String> {
    let paths = super::open_project()?;
    let config = super::load_config(&paths)?;
    let store = CharacterStore::open(&paths).map_err(|e| e.to_string())?;
    let provider = super::build_provider(&paths, &config, console)?;

    let mut prompter = Prompter::stdin();
    let premise = prompter.ask_required("Scene description/premise")?;

    let available = store.names();
    let mut characters = Vec::new();
    loop {
        if !available.is_empty() {
            console.info(&format!("Available characters: {}", human_join(&available)));
        }
        let pick = prompter.ask("Include character (leave blank to finish)", "")?;
        if pick.is_empty() {
            break;
        }
        characters.push(pick);
    }

    let tone = prompter.ask("Tone/Mood", "romantic tension")?;
    let pov_default = characters.first().cloned().unwrap_or_default();
    let pov = prompter.ask("POV character", &pov_default)?;
    let word_count = prompter.ask_parsed("Target word count", DEFAULT_WORD_COUNT)?;
    let instructions = prompter.ask("Additional instructions", "")?;

    let mut request = SceneRequest::new(name, premise).with_characters(characters);
    request.tone = tone;
    request.pov = pov;
    request.word_count = word_count;
    request.instructions = instructions;
    if let Some(target) = append_to {
        request = request.with_append_to(target);
    }

    let scene_path = generate_scene(&provider, &paths, &config, &store, &request, console)
        .map_err(|e| e.to_string())?;
    super::autocommit(console, &paths, &config, &format!("Generate scene: {name}"));
    console.success(&format!("Scene saved to {}", scene_path.display()));
    Ok(())
}
