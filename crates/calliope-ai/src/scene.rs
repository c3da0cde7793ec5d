//! Draft scenes from a premise and the stored cast.

use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::PathBuf;

use calliope_core::util::slugify;
use calliope_core::{CharacterStore, Console, ProjectConfig, ProjectPaths};

use crate::error::{AiError, AiResult};
use crate::provider::{GenerateOptions, TextProvider};

const SYSTEM_PROMPT: &str =
    "You are a fiction writing assistant crafting emotionally resonant scenes.";
const NO_CHARACTERS: &str = "No character details available.";

/// Tone used when the request leaves it blank.
pub const DEFAULT_TONE: &str = "emotional";
/// Point of view used when the request leaves it blank.
pub const DEFAULT_POV: &str = "third-person limited";
/// Target length used when the request leaves it at zero.
pub const DEFAULT_WORD_COUNT: u32 = 800;

const PROMPT_TEMPLATE: &str = "\
Write a scene for a {genre} novel with the following details:

Characters involved:
{characters_block}

Scene premise: {premise}
Tone: {tone}
POV: {pov}
Target length: ~{word_count} words

Write in a natural, engaging style. Maintain character consistency with the provided details. Focus on showing rather than telling. Include sensory details and emotional depth.

Additional instructions:
{instructions}
";

/// Everything the author supplies for one scene.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneRequest {
    /// Scene title; also names the output file.
    pub scene_name: String,
    /// What happens.
    pub premise: String,
    /// Characters to describe to the model.
    pub characters: Vec<String>,
    /// Emotional tone. Blank means [`DEFAULT_TONE`].
    pub tone: String,
    /// Narrative point of view. Blank means [`DEFAULT_POV`].
    pub pov: String,
    /// Target length. Zero means [`DEFAULT_WORD_COUNT`].
    pub word_count: u32,
    /// Extra guidance. Blank means "None".
    pub instructions: String,
    /// Chapter file (relative to the project root) to append the scene to.
    pub append_to: Option<String>,
}

impl SceneRequest {
    /// A request with the given name and premise and every other field
    /// defaulted.
    pub fn new(scene_name: impl Into<String>, premise: impl Into<String>) -> Self {
        Self {
            scene_name: scene_name.into(),
            premise: premise.into(),
            ..Self::default()
        }
    }

    /// Set the characters involved.
    pub fn with_characters(mut self, characters: Vec<String>) -> Self {
        self.characters = characters;
        self
    }

    /// Set the chapter to append to.
    pub fn with_append_to(mut self, path: impl Into<String>) -> Self {
        self.append_to = Some(path.into());
        self
    }
}

/// Character block for the prompt. Names not in the store are skipped.
pub fn build_character_context<S: AsRef<str>>(store: &CharacterStore, names: &[S]) -> String {
    let mut blocks = Vec::new();
    for name in names {
        let Some(character) = store.get(name.as_ref()) else {
            continue;
        };
        let mut lines = vec![format!("- {}", character.name)];
        let personality = character.personality.join(", ");
        let fields = [
            ("Age", character.age.as_deref()),
            ("Physical", character.physical.as_deref()),
            ("Personality", Some(personality.as_str())),
            ("Backstory", character.backstory.as_deref()),
            ("Role", character.role.as_deref()),
        ];
        for (label, value) in fields {
            if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
                lines.push(format!("  {label}: {value}"));
            }
        }
        if !character.relationships.is_empty() {
            lines.push("  Relationships:".into());
            for rel in &character.relationships {
                lines.push(format!("    - {} ({}) {}", rel.character, rel.kind, rel.notes));
            }
        }
        blocks.push(lines.join("\n"));
    }
    if blocks.is_empty() {
        NO_CHARACTERS.to_string()
    } else {
        blocks.join("\n")
    }
}

/// Fill the scene prompt, applying defaults for blank fields.
pub fn build_prompt(genre: &str, characters_block: &str, request: &SceneRequest) -> String {
    let tone = or_default(&request.tone, DEFAULT_TONE);
    let pov = or_default(&request.pov, DEFAULT_POV);
    let instructions = or_default(&request.instructions, "None");
    let word_count = if request.word_count == 0 {
        DEFAULT_WORD_COUNT
    } else {
        request.word_count
    };
    PROMPT_TEMPLATE
        .replace("{genre}", genre)
        .replace("{characters_block}", characters_block)
        .replace("{premise}", &request.premise)
        .replace("{tone}", tone)
        .replace("{pov}", pov)
        .replace("{word_count}", &word_count.to_string())
        .replace("{instructions}", instructions)
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() { default } else { value }
}

/// Generate a scene, write it to `scenes/<slug>.md` and optionally append it
/// to a chapter. Returns the scene file path.
pub fn generate_scene(
    provider: &dyn TextProvider,
    paths: &ProjectPaths,
    config: &ProjectConfig,
    store: &CharacterStore,
    request: &SceneRequest,
    console: &dyn Console,
) -> AiResult<PathBuf> {
    let slug = slugify(&request.scene_name);
    if slug.is_empty() {
        return Err(AiError::Validation("scene name must not be empty".into()));
    }

    let characters_block = build_character_context(store, &request.characters);
    let prompt = build_prompt(&config.project.genre, &characters_block, request);

    console.info("Generating scene...");
    tracing::info!(provider = provider.name(), scene = %request.scene_name, "generating scene");
    let options = GenerateOptions::new()
        .with_system_prompt(SYSTEM_PROMPT)
        .with_temperature(config.ai.temperature);
    let output = provider.generate(&prompt, &options)?;

    fs::create_dir_all(&paths.scenes_dir).map_err(|e| AiError::io(&paths.scenes_dir, e))?;
    let scene_path = paths.scenes_dir.join(format!("{slug}.md"));
    fs::write(&scene_path, format!("{output}\n")).map_err(|e| AiError::io(&scene_path, e))?;

    if let Some(target) = request.append_to.as_deref().filter(|t| !t.trim().is_empty()) {
        let chapter = paths.root.join(target);
        if let Some(parent) = chapter.parent() {
            fs::create_dir_all(parent).map_err(|e| AiError::io(parent, e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&chapter)
            .map_err(|e| AiError::io(&chapter, e))?;
        write!(file, "\n\n# Scene: {}\n\n{output}\n", request.scene_name)
            .map_err(|e| AiError::io(&chapter, e))?;
        tracing::debug!(chapter = %chapter.display(), "appended scene");
    }

    Ok(scene_path)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use calliope_core::{Character, Relationship, SilentConsole};

    use super::*;
    use crate::error::ProviderError;

    struct CannedProvider {
        reply: &'static str,
        last: RefCell<Option<(String, GenerateOptions)>>,
    }

    impl CannedProvider {
        fn new(reply: &'static str) -> Self {
            Self {
                reply,
                last: RefCell::new(None),
            }
        }
    }

    impl TextProvider for CannedProvider {
        fn name(&self) -> &'static str {
            "canned"
        }

        fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String, ProviderError> {
            *self.last.borrow_mut() = Some((prompt.to_string(), options.clone()));
            Ok(self.reply.to_string())
        }
    }

    fn project() -> (tempfile::TempDir, ProjectPaths, CharacterStore) {
        let dir = tempfile::tempdir().unwrap();
        let paths = ProjectPaths::new(dir.path());
        paths.ensure_structure().unwrap();
        let mut store = CharacterStore::open(&paths).unwrap();
        store
            .add(
                Character::new("Elena")
                    .with_age("28")
                    .with_personality(["witty", "guarded"])
                    .with_relationship(Relationship::new("Marcus", "ex").with_notes("still raw")),
            )
            .unwrap();
        (dir, paths, store)
    }

    #[test]
    fn character_context_lists_known_characters() {
        let (_dir, _paths, store) = project();
        let block = build_character_context(&store, &["elena", "Ghost"]);
        assert_eq!(
            block,
            "- Elena\n  Age: 28\n  Personality: witty, guarded\n  Relationships:\n    - Marcus (ex) still raw"
        );
    }

    #[test]
    fn character_context_without_known_names() {
        let (_dir, _paths, store) = project();
        assert_eq!(
            build_character_context::<&str>(&store, &[]),
            "No character details available."
        );
        assert_eq!(
            build_character_context(&store, &["Ghost"]),
            "No character details available."
        );
    }

    #[test]
    fn prompt_applies_defaults() {
        let request = SceneRequest::new("Rain", "They argue in the rain.");
        let prompt = build_prompt("romance", "- Elena", &request);
        assert!(prompt.starts_with("Write a scene for a romance novel"));
        assert!(prompt.contains("Tone: emotional\nPOV: third-person limited\nTarget length: ~800 words"));
        assert!(prompt.ends_with("Additional instructions:\nNone\n"));
    }

    #[test]
    fn generate_writes_scene_file() {
        let (_dir, paths, store) = project();
        let mut config = ProjectConfig::default();
        config.ai.temperature = 0.9;
        let provider = CannedProvider::new("She laughed.");
        let request = SceneRequest::new("First Kiss", "A kiss.").with_characters(vec!["Elena".into()]);

        let path =
            generate_scene(&provider, &paths, &config, &store, &request, &SilentConsole).unwrap();

        assert_eq!(path, paths.scenes_dir.join("first-kiss.md"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "She laughed.\n");
        let last = provider.last.borrow();
        let (prompt, options) = last.as_ref().unwrap();
        assert!(prompt.contains("- Elena\n  Age: 28"));
        assert_eq!(options.temperature, Some(0.9));
    }

    #[test]
    fn generate_appends_to_chapter() {
        let (_dir, paths, store) = project();
        let chapter = paths.chapters_dir.join("chapter-01.md");
        fs::write(&chapter, "# Chapter 01").unwrap();
        let provider = CannedProvider::new("Thunder.");
        let request = SceneRequest::new("Storm", "A storm.").with_append_to("chapters/chapter-01.md");

        generate_scene(
            &provider,
            &paths,
            &ProjectConfig::default(),
            &store,
            &request,
            &SilentConsole,
        )
        .unwrap();

        assert_eq!(
            fs::read_to_string(&chapter).unwrap(),
            "# Chapter 01\n\n# Scene: Storm\n\nThunder.\n"
        );
    }

    #[test]
    fn append_creates_missing_directories() {
        let (_dir, paths, store) = project();
        let provider = CannedProvider::new("Quiet.");
        let request = SceneRequest::new("Dawn", "Morning.").with_append_to("drafts/part-two/ch-9.md");

        generate_scene(
            &provider,
            &paths,
            &ProjectConfig::default(),
            &store,
            &request,
            &SilentConsole,
        )
        .unwrap();

        let appended = fs::read_to_string(paths.root.join("drafts/part-two/ch-9.md")).unwrap();
        assert_eq!(appended, "\n\n# Scene: Dawn\n\nQuiet.\n");
    }

    #[test]
    fn blank_scene_name_is_rejected() {
        let (_dir, paths, store) = project();
        let provider = CannedProvider::new("unused");
        let err = generate_scene(
            &provider,
            &paths,
            &ProjectConfig::default(),
            &store,
            &SceneRequest::new("  ", "x"),
            &SilentConsole,
        )
        .unwrap_err();
        assert!(matches!(err, AiError::Validation(_)));
        assert!(provider.last.borrow().is_none());
    }
}
