use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::story::StoryConfiguration;
use crate::services::image::ImageConfig;
use crate::services::llm::TextConfig;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_output")]
    pub output_folder: String,

    /// Skip the interactive form and use `story` as-is.
    #[serde(default)]
    pub unattended: bool,

    #[serde(default = "default_binding_delay")]
    pub binding_delay_ms: u64,

    pub text: TextConfig,

    pub image: ImageConfig,

    /// Pre-filled story request. Used as form defaults when attended.
    #[serde(default)]
    pub story: Option<StoryConfiguration>,
}

fn default_output() -> String {
    "output".to_string()
}
fn default_binding_delay() -> u64 {
    500
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("config.yml"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("{} not found. Please create one.", path.display());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.output_folder)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::{Moral, Theme};

    #[test]
    fn test_load_minimal_config() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join("config.yml");
        fs::write(
            &path,
            r#"
text:
  provider: gemini
  gemini:
    api_key: abc
image:
  provider: imagen
  imagen:
    api_key: abc
"#,
        )?;

        let config = Config::load_from(&path)?;
        assert_eq!(config.output_folder, "output");
        assert!(!config.unattended);
        assert_eq!(config.binding_delay_ms, 500);
        assert_eq!(config.text.timeout_seconds, 60);

        let gemini = config.text.gemini.as_ref().unwrap();
        assert_eq!(gemini.model, "gemini-2.0-flash");
        assert_eq!(gemini.base_url, "https://generativelanguage.googleapis.com/v1beta");
        assert_eq!(config.image.imagen.as_ref().unwrap().model, "imagen-3.0-generate-002");
        assert!(config.story.is_none());
        Ok(())
    }

    #[test]
    fn test_load_unattended_config_with_story() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join("config.yml");
        fs::write(
            &path,
            r#"
output_folder: books
unattended: true
binding_delay_ms: 0
text:
  provider: ollama
  timeout_seconds: 120
  ollama:
    base_url: http://localhost:11434
    model: llama3
image:
  provider: openai
  openai:
    api_key: sk-test
story:
  reader_age: 5
  theme: space
  character_name: Lily
  page_count: 3
  moral: courage
"#,
        )?;

        let config = Config::load_from(&path)?;
        assert!(config.unattended);
        assert_eq!(config.text.timeout_seconds, 120);
        assert_eq!(config.image.openai.as_ref().unwrap().size, "1024x1024");

        let story = config.story.unwrap();
        assert_eq!(story.theme, Theme::Space);
        assert_eq!(story.moral, Moral::Courage);
        Ok(())
    }

    #[test]
    fn test_example_config_is_valid() -> Result<()> {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config.example.yml");
        let config = Config::load_from(&path)?;
        assert_eq!(config.text.provider, "gemini");
        config.story.expect("example has a story").validate()?;
        Ok(())
    }

    #[test]
    fn test_missing_config_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = Config::load_from(&temp_dir.path().join("config.yml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_ensure_directories() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let output = temp_dir.path().join("books");
        let yaml = format!(
            "output_folder: {}\ntext:\n  provider: gemini\nimage:\n  provider: imagen\n",
            output.display()
        );
        let config: Config = serde_yaml_ng::from_str(&yaml)?;
        config.ensure_directories()?;
        assert!(output.is_dir());
        Ok(())
    }
}
