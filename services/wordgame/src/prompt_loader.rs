use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const DEFAULT_TRANSCRIPTION_PROMPT: &str = "Please provide a verbatim transcription of this audio file. The audio contains a person speaking.";

pub fn load_prompts(dir_path: &Path) -> Result<HashMap<String, String>> {
    let mut prompts = HashMap::new();

    for entry in fs::read_dir(dir_path)
        .with_context(|| format!("Failed to read prompts directory: {}", dir_path.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("md") {
            let prompt_key = path
                .file_stem()
                .and_then(|s| s.to_str())
                .context("Could not get file stem for prompt file")?
                .to_string();

            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read prompt file: {}", path.display()))?;

            prompts.insert(prompt_key, content);
        }
    }

    Ok(prompts)
}

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("Missing required prompt: {0}.md")]
    Missing(String),
}

/// The templates the vendor adapter fills in.
#[derive(Debug, Clone)]
pub struct Prompts {
    word_list: String,
    card_image: String,
    transcription: String,
}

impl Prompts {
    /// `word_list` and `card_image` are required; `transcription` falls back to a built-in instruction.
    pub fn from_map(mut prompts: HashMap<String, String>) -> Result<Self, PromptError> {
        let mut take = |key: &str| {
            prompts
                .remove(key)
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
        };
        let word_list = take("word_list").ok_or_else(|| PromptError::Missing("word_list".into()))?;
        let card_image =
            take("card_image").ok_or_else(|| PromptError::Missing("card_image".into()))?;
        let transcription =
            take("transcription").unwrap_or_else(|| DEFAULT_TRANSCRIPTION_PROMPT.to_string());
        Ok(Self {
            word_list,
            card_image,
            transcription,
        })
    }

    pub fn load(dir_path: &Path) -> Result<Self> {
        let prompts = load_prompts(dir_path)?;
        Ok(Self::from_map(prompts)?)
    }

    pub fn word_list(&self, count: usize) -> String {
        self.word_list.replace("{count}", &count.to_string())
    }

    pub fn card_image(&self, word: &str) -> String {
        self.card_image.replace("{word}", word)
    }

    pub fn transcription(&self) -> &str {
        &self.transcription
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_load_prompts_successfully() -> Result<()> {
        let dir = tempdir()?;
        let dir_path = dir.path();

        // `{{...}}` in `writeln!` writes single braces to the file.
        let mut file1 = File::create(dir_path.join("word_list.md"))?;
        writeln!(file1, "Give me {{count}} words.")?;

        let mut file2 = File::create(dir_path.join("card_image.md"))?;
        writeln!(file2, "A picture of a {{word}}.")?;

        let mut ignored_file = File::create(dir_path.join("config.txt"))?;
        writeln!(ignored_file, "some config")?;

        std::fs::create_dir(dir_path.join("subdir"))?;

        let prompts = load_prompts(dir_path)?;

        assert_eq!(prompts.len(), 2, "Should only load .md files");
        assert_eq!(prompts.get("word_list").unwrap(), "Give me {count} words.\n");
        assert!(prompts.get("config").is_none());

        Ok(())
    }

    #[test]
    fn test_load_prompts_from_nonexistent_dir() {
        let result = load_prompts(Path::new("nonexistent_dir_for_testing_prompts"));
        assert!(result.is_err());
    }

    #[test]
    fn test_prompts_render_placeholders() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("word_list.md"), "Give me {count} words.\n")?;
        fs::write(dir.path().join("card_image.md"), "A picture of a {word}.")?;

        let prompts = Prompts::load(dir.path())?;
        assert_eq!(prompts.word_list(5), "Give me 5 words.");
        assert_eq!(prompts.card_image("cat"), "A picture of a cat.");
        assert_eq!(prompts.transcription(), DEFAULT_TRANSCRIPTION_PROMPT);
        Ok(())
    }

    #[test]
    fn test_missing_required_prompt() {
        let mut map = HashMap::new();
        map.insert("word_list".to_string(), "Give me {count} words.".to_string());
        let err = Prompts::from_map(map).unwrap_err();
        assert!(matches!(err, PromptError::Missing(ref key) if key == "card_image"));
    }

    #[test]
    fn test_shipped_prompts_are_complete() -> Result<()> {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("prompts");
        let prompts = Prompts::load(&dir)?;
        assert!(prompts.word_list(10).contains("10"));
        assert!(prompts.card_image("dog").contains("\"dog\""));
        assert_ne!(prompts.transcription(), DEFAULT_TRANSCRIPTION_PROMPT);
        Ok(())
    }
}
