//! Character records and partial updates.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// One member of the cast as stored in `characters.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    /// Unique (case-insensitive) name.
    pub name: String,
    /// Age as written by the author; numbers are kept as text.
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub age: Option<String>,
    /// Physical description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical: Option<String>,
    /// Personality traits in the order given.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub personality: Vec<String>,
    /// Backstory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backstory: Option<String>,
    /// Role in the story.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Relationships to other characters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<Relationship>,
    /// Free-form attributes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom: BTreeMap<String, String>,
    /// Set when the record is first added.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Refreshed on every update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

/// A directed relationship from one character to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Name of the related character.
    pub character: String,
    /// Kind of relationship, e.g. "sister" or "rival".
    #[serde(rename = "type", default = "default_relationship_kind")]
    pub kind: String,
    /// Free-text notes.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

fn default_relationship_kind() -> String {
    "relationship".into()
}

impl Relationship {
    /// Create a relationship without notes.
    pub fn new(character: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            character: character.into(),
            kind: kind.into(),
            notes: String::new(),
        }
    }

    /// Attach notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

impl std::fmt::Display for Relationship {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.character, self.kind)?;
        if !self.notes.is_empty() {
            write!(f, " {}", self.notes)?;
        }
        Ok(())
    }
}

impl Character {
    /// A character with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            age: None,
            physical: None,
            personality: Vec::new(),
            backstory: None,
            role: None,
            relationships: Vec::new(),
            custom: BTreeMap::new(),
            created_at: None,
            last_modified: None,
        }
    }

    /// Set the age.
    pub fn with_age(mut self, age: impl Into<String>) -> Self {
        self.age = Some(age.into());
        self
    }

    /// Set the physical description.
    pub fn with_physical(mut self, physical: impl Into<String>) -> Self {
        self.physical = Some(physical.into());
        self
    }

    /// Set the personality traits.
    pub fn with_personality<I, S>(mut self, traits: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.personality = traits.into_iter().map(Into::into).collect();
        self
    }

    /// Set the backstory.
    pub fn with_backstory(mut self, backstory: impl Into<String>) -> Self {
        self.backstory = Some(backstory.into());
        self
    }

    /// Set the role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Add a relationship.
    pub fn with_relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Add a custom attribute.
    pub fn with_custom(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom.insert(key.into(), value.into());
        self
    }

    /// Whether `name` refers to this character, ignoring case.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }

    /// Non-empty fields other than the name, in display order, rendered as
    /// `(field key, text)`.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        push_text(&mut out, "age", &self.age);
        push_text(&mut out, "physical", &self.physical);
        if !self.personality.is_empty() {
            out.push(("personality", self.personality.join(", ")));
        }
        push_text(&mut out, "backstory", &self.backstory);
        push_text(&mut out, "role", &self.role);
        if !self.relationships.is_empty() {
            let rels: Vec<String> = self.relationships.iter().map(|r| r.to_string()).collect();
            out.push(("relationships", rels.join(", ")));
        }
        if !self.custom.is_empty() {
            let custom: Vec<String> = self.custom.iter().map(|(k, v)| format!("{k}: {v}")).collect();
            out.push(("custom", custom.join(", ")));
        }
        if let Some(ts) = &self.created_at {
            out.push(("created_at", ts.clone()));
        }
        if let Some(ts) = &self.last_modified {
            out.push(("last_modified", ts.clone()));
        }
        out
    }

    /// "Field: value" lines for terminal display, starting with the name.
    pub fn detail_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("Name: {}", self.name)];
        lines.extend(
            self.fields()
                .into_iter()
                .map(|(key, value)| format!("{}: {value}", field_label(key))),
        );
        lines
    }

    /// Shallow merge: every field present in `update` replaces the current one.
    pub fn apply(&mut self, update: CharacterUpdate) {
        let CharacterUpdate {
            name,
            age,
            physical,
            personality,
            backstory,
            role,
            relationships,
            custom,
        } = update;
        if let Some(name) = name {
            self.name = name;
        }
        if let Some(age) = age {
            self.age = non_blank(age);
        }
        if let Some(physical) = physical {
            self.physical = non_blank(physical);
        }
        if let Some(personality) = personality {
            self.personality = personality;
        }
        if let Some(backstory) = backstory {
            self.backstory = non_blank(backstory);
        }
        if let Some(role) = role {
            self.role = non_blank(role);
        }
        if let Some(relationships) = relationships {
            self.relationships = relationships;
        }
        if let Some(custom) = custom {
            self.custom = custom;
        }
    }
}

/// A partial character. `None` leaves the stored field untouched; `Some`
/// replaces it (an empty string clears a text field).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharacterUpdate {
    /// Rename the character.
    pub name: Option<String>,
    /// New age.
    pub age: Option<String>,
    /// New physical description.
    pub physical: Option<String>,
    /// Replacement trait list.
    pub personality: Option<Vec<String>>,
    /// New backstory.
    pub backstory: Option<String>,
    /// New role.
    pub role: Option<String>,
    /// Replacement relationship list.
    pub relationships: Option<Vec<Relationship>>,
    /// Replacement custom attributes.
    pub custom: Option<BTreeMap<String, String>>,
}

impl CharacterUpdate {
    /// An update that changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the role.
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Set the age.
    pub fn age(mut self, age: impl Into<String>) -> Self {
        self.age = Some(age.into());
        self
    }

    /// Set the physical description.
    pub fn physical(mut self, physical: impl Into<String>) -> Self {
        self.physical = Some(physical.into());
        self
    }

    /// Replace the trait list.
    pub fn personality(mut self, traits: Vec<String>) -> Self {
        self.personality = Some(traits);
        self
    }

    /// Set the backstory.
    pub fn backstory(mut self, backstory: impl Into<String>) -> Self {
        self.backstory = Some(backstory.into());
        self
    }
}

fn push_text(out: &mut Vec<(&'static str, String)>, key: &'static str, value: &Option<String>) {
    if let Some(v) = value.as_deref().filter(|v| !v.trim().is_empty()) {
        out.push((key, v.to_string()));
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() { None } else { Some(value) }
}

fn field_label(key: &str) -> String {
    match key {
        "created_at" => "Created".into(),
        "last_modified" => "Last Modified".into(),
        other => crate::util::title_from_stem(other),
    }
}

/// Accept any YAML scalar (string, number, bool) as text.
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_yaml::Value>::deserialize(deserializer)? {
        None | Some(serde_yaml::Value::Null) => Ok(None),
        Some(serde_yaml::Value::String(s)) => Ok(Some(s)),
        Some(serde_yaml::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(serde_yaml::Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(_) => Err(D::Error::custom("expected a scalar value")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_age_is_read_as_text() {
        let c: Character = serde_yaml::from_str("name: Elena\nage: 28\n").unwrap();
        assert_eq!(c.age.as_deref(), Some("28"));
    }

    #[test]
    fn empty_fields_are_not_serialized() {
        let yaml = serde_yaml::to_string(&Character::new("Marcus")).unwrap();
        assert_eq!(yaml.trim(), "name: Marcus");
    }

    #[test]
    fn relationship_kind_is_serialized_as_type() {
        let c = Character::new("Elena")
            .with_relationship(Relationship::new("Marcus", "rival").with_notes("since school"));
        let yaml = serde_yaml::to_string(&c).unwrap();
        assert!(yaml.contains("type: rival"));

        let back: Character = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.relationships[0].notes, "since school");
    }

    #[test]
    fn relationship_kind_defaults() {
        let r: Relationship = serde_yaml::from_str("character: Ana\n").unwrap();
        assert_eq!(r.kind, "relationship");
        assert_eq!(r.to_string(), "Ana (relationship)");
    }

    #[test]
    fn apply_overwrites_present_fields_only() {
        let mut c = Character::new("Elena")
            .with_age("28")
            .with_personality(["witty"]);
        c.apply(CharacterUpdate::new().role("lead").age(""));

        assert_eq!(c.role.as_deref(), Some("lead"));
        assert_eq!(c.age, None);
        assert_eq!(c.personality, vec!["witty"]);
    }

    #[test]
    fn detail_lines_skip_empty_fields() {
        let c = Character::new("Elena")
            .with_personality(["witty", "guarded"])
            .with_custom("eye colour", "green");
        let lines = c.detail_lines();
        assert_eq!(
            lines,
            vec![
                "Name: Elena",
                "Personality: witty, guarded",
                "Custom: eye colour: green",
            ]
        );
    }

    #[test]
    fn is_named_ignores_case() {
        assert!(Character::new("Elena").is_named("ELENA"));
        assert!(!Character::new("Elena").is_named("Elen"));
    }
}
