//! The character store: the cast, loaded once and rewritten on every change.
//!
//! A novel's cast is small, so the whole file is read at construction and the
//! whole file is written after each mutation. Do not reuse this pattern for
//! anything that grows without bound.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::character::{Character, CharacterUpdate};
use crate::error::{CoreError, CoreResult};
use crate::project::ProjectPaths;
use crate::util::now_iso;
use crate::yaml::{read_yaml, write_yaml};

/// On-disk shape of `characters.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterFile {
    /// All characters in insertion order.
    #[serde(default)]
    pub characters: Vec<Character>,
}

/// CRUD over the cast, keyed by case-insensitive name.
#[derive(Debug)]
pub struct CharacterStore {
    path: PathBuf,
    data: CharacterFile,
}

impl CharacterStore {
    /// Load the project's character file, creating an empty one if missing.
    pub fn open(paths: &ProjectPaths) -> CoreResult<Self> {
        let path = paths.characters_file.clone();
        if !path.exists() {
            write_yaml(&path, &CharacterFile::default())?;
        }
        let data = read_yaml(&path)?;
        Ok(Self { path, data })
    }

    /// All characters in insertion order.
    pub fn list(&self) -> &[Character] {
        &self.data.characters
    }

    /// Character names sorted alphabetically.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .data
            .characters
            .iter()
            .filter(|c| !c.name.is_empty())
            .map(|c| c.name.clone())
            .collect();
        names.sort();
        names
    }

    /// Number of characters.
    pub fn len(&self) -> usize {
        self.data.characters.len()
    }

    /// Whether the cast is empty.
    pub fn is_empty(&self) -> bool {
        self.data.characters.is_empty()
    }

    /// Look up a character by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<Character> {
        self.position(name).map(|i| self.data.characters[i].clone())
    }

    /// Add a new character and persist.
    ///
    /// The name is trimmed. Stamps `created_at` and `last_modified` when they
    /// are not set.
    pub fn add(&mut self, mut character: Character) -> CoreResult<Character> {
        character.name = character.name.trim().to_string();
        if character.name.is_empty() {
            return Err(CoreError::Validation("character name must not be empty".into()));
        }
        if self.position(&character.name).is_some() {
            return Err(CoreError::DuplicateName(character.name));
        }

        let now = now_iso();
        if character.created_at.is_none() {
            character.created_at = Some(now.clone());
        }
        if character.last_modified.is_none() {
            character.last_modified = Some(now);
        }

        let mut next = self.data.clone();
        next.characters.push(character.clone());
        self.commit(next)?;
        tracing::debug!(name = %character.name, "added character");
        Ok(character)
    }

    /// Merge `update` into the named character, refresh `last_modified`, persist.
    pub fn update(&mut self, name: &str, mut update: CharacterUpdate) -> CoreResult<Character> {
        let index = self
            .position(name)
            .ok_or_else(|| CoreError::NotFound(name.to_string()))?;

        if let Some(new_name) = update.name.as_mut() {
            *new_name = new_name.trim().to_string();
            if new_name.is_empty() {
                return Err(CoreError::Validation("character name must not be empty".into()));
            }
            if self.position(new_name).is_some_and(|other| other != index) {
                return Err(CoreError::DuplicateName(new_name.clone()));
            }
        }

        let mut merged = self.data.characters[index].clone();
        merged.apply(update);
        merged.last_modified = Some(now_iso());
        let mut next = self.data.clone();
        next.characters[index] = merged.clone();
        self.commit(next)?;
        tracing::debug!(name = %merged.name, "updated character");
        Ok(merged)
    }

    /// Remove the named character and persist. Returns the removed record.
    pub fn remove(&mut self, name: &str) -> CoreResult<Character> {
        let index = self
            .position(name)
            .ok_or_else(|| CoreError::NotFound(name.to_string()))?;
        let mut next = self.data.clone();
        let removed = next.characters.remove(index);
        self.commit(next)?;
        tracing::debug!(name = %removed.name, "removed character");
        Ok(removed)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.data.characters.iter().position(|c| c.is_named(name))
    }

    /// Write `next` to disk and only then make it the in-memory state.
    fn commit(&mut self, next: CharacterFile) -> CoreResult<()> {
        write_yaml(&self.path, &next)?;
        self.data = next;
        Ok(())
    }
}
