//! YAML templates for characters and scenes under `templates/<category>/`.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::character::Character;
use crate::error::{CoreError, CoreResult};
use crate::project::ProjectPaths;
use crate::store::CharacterStore;

/// Template categories known to the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateCategory {
    /// `templates/characters/`
    Character,
    /// `templates/scenes/`
    Scene,
}

impl TemplateCategory {
    /// Parse `character`/`characters` or `scene`/`scenes`, ignoring case.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "character" | "characters" => Some(Self::Character),
            "scene" | "scenes" => Some(Self::Scene),
            _ => None,
        }
    }

    /// Directory name below `templates/`.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Character => "characters",
            Self::Scene => "scenes",
        }
    }
}

/// Template names grouped by category directory, both sorted.
pub fn list_templates(paths: &ProjectPaths) -> CoreResult<BTreeMap<String, Vec<String>>> {
    let base = &paths.templates_dir;
    if !base.is_dir() {
        return Err(CoreError::Template("templates directory not found".into()));
    }
    let mut result = BTreeMap::new();
    for entry in fs::read_dir(base).map_err(|e| CoreError::io(base, e))? {
        let entry = entry.map_err(|e| CoreError::io(base, e))?;
        let dir = entry.path();
        if !dir.is_dir() {
            continue;
        }
        let mut names: Vec<String> = fs::read_dir(&dir)
            .map_err(|e| CoreError::io(&dir, e))?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "yaml"))
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        names.sort();
        result.insert(entry.file_name().to_string_lossy().into_owned(), names);
    }
    Ok(result)
}

/// Load `templates/<category>/<name>.yaml` as a YAML mapping.
pub fn load_template(
    paths: &ProjectPaths,
    category: TemplateCategory,
    name: &str,
) -> CoreResult<(PathBuf, Mapping)> {
    let dir = paths.templates_dir.join(category.dir_name());
    if !dir.is_dir() {
        return Err(CoreError::Template(format!(
            "no templates found for '{}'",
            category.dir_name()
        )));
    }
    let path = dir.join(format!("{name}.yaml"));
    if !path.exists() {
        return Err(CoreError::Template(format!(
            "template '{name}' not found in {}",
            category.dir_name()
        )));
    }
    let text = fs::read_to_string(&path).map_err(|e| CoreError::io(&path, e))?;
    let value: Value = serde_yaml::from_str(&text).map_err(|source| CoreError::Yaml {
        path: path.clone(),
        source,
    })?;
    match value {
        Value::Mapping(map) => Ok((path, map)),
        Value::Null => Ok((path, Mapping::new())),
        _ => Err(CoreError::Template(format!(
            "template {} has invalid structure",
            path.display()
        ))),
    }
}

/// Read a string field from a template mapping.
pub fn mapping_str<'a>(map: &'a Mapping, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

/// Turn a character template into a stored character.
pub fn apply_character_template(store: &mut CharacterStore, data: Mapping) -> CoreResult<Character> {
    let has_name = mapping_str(&data, "name").is_some_and(|n| !n.trim().is_empty());
    if !has_name {
        return Err(CoreError::Template(
            "character template must include a name".into(),
        ));
    }
    let character: Character = serde_yaml::from_value(Value::Mapping(data))
        .map_err(|e| CoreError::Template(format!("invalid character template: {e}")))?;
    store.add(character)
}

/// A scene skeleton: title, premise and story beats.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SceneTemplate {
    /// Suggested scene name.
    pub name: Option<String>,
    /// One-paragraph premise.
    pub premise: String,
    /// Ordered story beats.
    pub beats: Vec<String>,
}

impl SceneTemplate {
    /// Parse a scene template mapping.
    pub fn from_mapping(data: Mapping) -> CoreResult<Self> {
        serde_yaml::from_value(Value::Mapping(data))
            .map_err(|e| CoreError::Template(format!("invalid scene template: {e}")))
    }

    /// Markdown skeleton for a scene titled `title`.
    pub fn render(&self, title: &str) -> String {
        let mut lines = vec![format!("# {title}"), String::new(), self.premise.clone()];
        if !self.beats.is_empty() {
            lines.push(String::new());
            lines.push("## Story Beats".into());
            lines.extend(self.beats.iter().map(|b| format!("- {b}")));
        }
        format!("{}\n", lines.join("\n").trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> (tempfile::TempDir, ProjectPaths) {
        let dir = tempfile::tempdir().unwrap();
        let paths = ProjectPaths::new(dir.path());
        paths.bootstrap().unwrap();
        (dir, paths)
    }

    #[test]
    fn list_templates_groups_by_category() {
        let (_dir, paths) = project();
        let templates = list_templates(&paths).unwrap();
        assert!(templates.contains_key("characters"));
        assert_eq!(
            templates["characters"],
            vec!["love-interest", "romance-protagonist"]
        );
        assert_eq!(templates["scenes"], vec!["meet-cute"]);
    }

    #[test]
    fn list_templates_without_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ProjectPaths::new(dir.path());
        assert!(matches!(
            list_templates(&paths),
            Err(CoreError::Template(_))
        ));
    }

    #[test]
    fn load_character_template() {
        let (_dir, paths) = project();
        let (path, data) =
            load_template(&paths, TemplateCategory::Character, "romance-protagonist").unwrap();
        assert!(path.to_string_lossy().ends_with(".yaml"));
        assert!(mapping_str(&data, "name").is_some());
    }

    #[test]
    fn missing_template_is_reported() {
        let (_dir, paths) = project();
        let err = load_template(&paths, TemplateCategory::Scene, "nope").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn non_mapping_template_is_rejected() {
        let (_dir, paths) = project();
        fs::write(paths.templates_dir.join("scenes/list.yaml"), "- a\n").unwrap();
        assert!(matches!(
            load_template(&paths, TemplateCategory::Scene, "list"),
            Err(CoreError::Template(_))
        ));
    }

    #[test]
    fn apply_character_template_adds_to_store() {
        let (_dir, paths) = project();
        let mut store = CharacterStore::open(&paths).unwrap();
        let (_, mut data) =
            load_template(&paths, TemplateCategory::Character, "love-interest").unwrap();
        data.insert("name".into(), "Marcus".into());

        let stored = apply_character_template(&mut store, data).unwrap();
        assert_eq!(stored.name, "Marcus");
        assert_eq!(stored.age.as_deref(), Some("32"));
        assert!(store.get("marcus").is_some());
    }

    #[test]
    fn apply_character_template_requires_name() {
        let (_dir, paths) = project();
        let mut store = CharacterStore::open(&paths).unwrap();
        let err = apply_character_template(&mut store, Mapping::new()).unwrap_err();
        assert!(matches!(err, CoreError::Template(_)));
    }

    #[test]
    fn scene_template_renders_beats() {
        let scene = SceneTemplate {
            name: None,
            premise: "They meet.".into(),
            beats: vec!["Collision".into(), "Banter".into()],
        };
        assert_eq!(
            scene.render("Meet Cute"),
            "# Meet Cute\n\nThey meet.\n\n## Story Beats\n- Collision\n- Banter\n"
        );
    }
}
