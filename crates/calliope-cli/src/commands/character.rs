use calliope_core::util::split_list;
use calliope_core::{Character, CharacterStore, CharacterUpdate, Console, Relationship};
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use super::Prompter;

pub fn add(console: &dyn Console, name: &str) -> Result<(), String> {
    let paths = super::open_project()?;
    let config = super::load_config(&paths)?;
    let mut store = CharacterStore::open(&paths).map_err(|e| e.to_string())?;
    if store.get(name).is_some() {
        return Err(format!("character '{name}' already exists"));
    }

    let mut prompter = Prompter::stdin();
    let mut character = Character::new(name);
    character.age = non_empty(prompter.ask("Age", "")?);
    character.physical = non_empty(prompter.ask("Physical description", "")?);
    character.personality = split_list(&prompter.ask("Personality traits (comma separated)", "")?);
    character.backstory = non_empty(prompter.ask("Backstory", "")?);
    character.role = non_empty(prompter.ask("Role in story", "")?);

    while prompter.confirm("Add relationship?", false)? {
        let other = prompter.ask_required("Related character name")?;
        let kind = prompter.ask("Relationship type", "relationship")?;
        let notes = prompter.ask("Notes", "")?;
        character
            .relationships
            .push(Relationship::new(other, kind).with_notes(notes));
    }
    while prompter.confirm("Add custom attribute?", false)? {
        let key = prompter.ask_required("Attribute name")?;
        let value = prompter.ask_required("Attribute value")?;
        character.custom.insert(key, value);
    }

    store.add(character).map_err(|e| e.to_string())?;
    super::autocommit(console, &paths, &config, &format!("Add character: {name}"));
    console.success(&format!("Character '{name}' added."));
    Ok(())
}

pub fn list(console: &dyn Console) -> Result<(), String> {
    let paths = super::open_project()?;
    let store = CharacterStore::open(&paths).map_err(|e| e.to_string())?;
    if store.is_empty() {
        console.warn("No characters found. Add one with `calliope character add`.");
        return Ok(());
    }

    let mut characters: Vec<&Character> = store.list().iter().collect();
    characters.sort_by(|a, b| a.name.cmp(&b.name));

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Role", "Traits"]);
    for character in characters {
        table.add_row(vec![
            character.name.clone(),
            character.role.clone().unwrap_or_else(|| "-".into()),
            if character.personality.is_empty() {
                "-".into()
            } else {
                character.personality.join(", ")
            },
        ]);
    }

    println!("{table}");
    println!();
    println!("  {} characters", store.len());
    Ok(())
}

pub fn show(name: &str) -> Result<(), String> {
    let paths = super::open_project()?;
    let store = CharacterStore::open(&paths).map_err(|e| e.to_string())?;
    let character = store
        .get(name)
        .ok_or_else(|| format!("character '{name}' not found"))?;

    println!("  {}", character.name.bold());
    for line in character.detail_lines().iter().skip(1) {
        println!("  {line}");
    }
    Ok(())
}

pub fn edit(console: &dyn Console, name: &str) -> Result<(), String> {
    let paths = super::open_project()?;
    let config = super::load_config(&paths)?;
    let mut store = CharacterStore::open(&paths).map_err(|e| e.to_string())?;
    let current = store
        .get(name)
        .ok_or_else(|| format!("character '{name}' not found"))?;

    let mut prompter = Prompter::stdin();
    let update = CharacterUpdate::new()
        .age(prompter.ask("Age", current.age.as_deref().unwrap_or_default())?)
        .physical(prompter.ask(
            "Physical description",
            current.physical.as_deref().unwrap_or_default(),
        )?)
        .backstory(prompter.ask("Backstory", current.backstory.as_deref().unwrap_or_default())?)
        .role(prompter.ask("Role", current.role.as_deref().unwrap_or_default())?)
        .personality(split_list(&prompter.ask(
            "Personality traits (comma separated)",
            &current.personality.join(", "),
        )?));

    let updated = store.update(name, update).map_err(|e| e.to_string())?;
    super::autocommit(
        console,
        &paths,
        &config,
        &format!("Update character: {}", updated.name),
    );
    console.success(&format!("Character '{}' updated.", updated.name));
    Ok(())
}

pub fn remove(console: &dyn Console, name: &str) -> Result<(), String> {
    let paths = super::open_project()?;
    let config = super::load_config(&paths)?;
    let mut store = CharacterStore::open(&paths).map_err(|e| e.to_string())?;
    let removed = store.remove(name).map_err(|e| e.to_string())?;
    super::autocommit(
        console,
        &paths,
        &config,
        &format!("Remove character: {}", removed.name),
    );
    console.success(&format!("Character '{}' removed.", removed.name));
    Ok(())
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() { None } else { Some(value) }
}
