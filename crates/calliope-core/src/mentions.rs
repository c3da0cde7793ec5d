//! Find the lines on which known character names appear.

use regex::{Regex, RegexBuilder};

/// Lines on which one character is mentioned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    /// The character name as supplied by the caller.
    pub name: String,
    /// 1-based line numbers, ascending, each at most once.
    pub lines: Vec<usize>,
}

/// Mentions per character, in the order the names were supplied. Names that
/// never occur are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MentionMap {
    mentions: Vec<Mention>,
}

impl MentionMap {
    /// Line numbers for `name` (exact, as supplied), if it was found.
    pub fn get(&self, name: &str) -> Option<&[usize]> {
        self.mentions
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.lines.as_slice())
    }

    /// Iterate over the matched characters.
    pub fn iter(&self) -> impl Iterator<Item = &Mention> {
        self.mentions.iter()
    }

    /// Number of characters with at least one mention.
    pub fn len(&self) -> usize {
        self.mentions.len()
    }

    /// Whether no character was mentioned.
    pub fn is_empty(&self) -> bool {
        self.mentions.is_empty()
    }
}

impl<'a> IntoIterator for &'a MentionMap {
    type Item = &'a Mention;
    type IntoIter = std::slice::Iter<'a, Mention>;

    fn into_iter(self) -> Self::IntoIter {
        self.mentions.iter()
    }
}

/// Scan `text` line by line for whole-word, case-insensitive occurrences of
/// each name.
///
/// Names are matched literally. There is no stemming or fuzzy matching, and
/// a name that is a word inside a longer name ("Ann" in "Ann Marie") matches
/// both.
pub fn extract_mentions<S: AsRef<str>>(text: &str, names: &[S]) -> MentionMap {
    let patterns: Vec<(&str, Regex)> = names
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| !name.trim().is_empty())
        .filter_map(|name| word_pattern(name).map(|re| (name, re)))
        .collect();

    let mut mentions: Vec<Mention> = patterns
        .iter()
        .map(|(name, _)| Mention {
            name: (*name).to_string(),
            lines: Vec::new(),
        })
        .collect();

    for (index, line) in text.lines().enumerate() {
        for (slot, (_, re)) in mentions.iter_mut().zip(&patterns) {
            if re.is_match(line) {
                slot.lines.push(index + 1);
            }
        }
    }

    mentions.retain(|m| !m.lines.is_empty());
    MentionMap { mentions }
}

fn word_pattern(name: &str) -> Option<Regex> {
    let escaped = regex::escape(name.trim());
    let result = RegexBuilder::new(&format!(r"\b{escaped}\b"))
        .case_insensitive(true)
        .build();
    match result {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(name, error = %e, "skipping name that cannot be matched");
            None
        }
    }
}
