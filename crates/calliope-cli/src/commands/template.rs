use std::fs;

use calliope_core::template::{
    SceneTemplate, TemplateCategory, apply_character_template, list_templates, load_template,
    mapping_str,
};
use calliope_core::util::{slugify, title_from_stem};
use calliope_core::{CharacterStore, Console};
use comfy_table::{ContentArrangement, Table};

use super::Prompter;

pub fn list() -> Result<(), String> {
    let paths = super::open_project()?;
    let templates = list_templates(&paths).map_err(|e| e.to_string())?;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Category", "Templates"]);
    for (category, names) in &templates {
        let names = if names.is_empty() {
            "None".to_string()
        } else {
            names.join(", ")
        };
        table.add_row(vec![category.clone(), names]);
    }
    println!("{table}");
    Ok(())
}

pub fn apply(console: &dyn Console, category: &str, name: &str) -> Result<(), String> {
    let paths = super::open_project()?;
    let category = TemplateCategory::parse(category)
        .ok_or_else(|| format!("unknown template category '{category}' (use character or scene)"))?;
    let config = super::load_config(&paths)?;
    let (_, mut data) = load_template(&paths, category, name).map_err(|e| e.to_string())?;
    let mut prompter = Prompter::stdin();

    match category {
        TemplateCategory::Character => {
            let default_name = mapping_str(&data, "name")
                .map(str::to_string)
                .unwrap_or_else(|| title_from_stem(name));
            let character_name = prompter.ask("Character name", &default_name)?;
            data.insert("name".into(), character_name.clone().into());

            let mut store = CharacterStore::open(&paths).map_err(|e| e.to_string())?;
            apply_character_template(&mut store, data).map_err(|e| e.to_string())?;
            super::autocommit(
                console,
                &paths,
                &config,
                &format!("Add character: {character_name}"),
            );
            console.success(&format!(
                "Character template '{name}' applied as {character_name}."
            ));
        }
        TemplateCategory::Scene => {
            let scene = SceneTemplate::from_mapping(data).map_err(|e| e.to_string())?;
            let default_name = scene.name.clone().unwrap_or_else(|| name.to_string());
            let scene_name = prompter.ask("Scene file name", &default_name)?;

            let scene_path = paths.scenes_dir.join(format!("{}.md", slugify(&scene_name)));
            fs::write(&scene_path, scene.render(&scene_name))
                .map_err(|e| format!("cannot write {}: {e}", scene_path.display()))?;
            super::autocommit(
                console,
                &paths,
                &config,
                &format!("Add scene template: {scene_name}"),
            );
            console.success(&format!(
                "Scene template '{name}' created at {}",
                scene_path.display()
            ));
        }
    }
    Ok(())
}
