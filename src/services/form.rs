use crate::core::catalog::{Moral, Theme};
use crate::core::config::Config;
use crate::core::story::{
    StoryConfiguration, MAX_PAGE_COUNT, MAX_READER_AGE, MIN_PAGE_COUNT, MIN_READER_AGE,
};
use anyhow::{bail, Result};
use inquire::validator::Validation;
use inquire::{CustomType, Select, Text};

/// Produces the story request, either from config (unattended) or by asking.
pub fn collect_story_configuration(config: &Config) -> Result<StoryConfiguration> {
    if config.unattended {
        let Some(story) = &config.story else {
            bail!("Unattended mode needs a `story` section in config.yml");
        };
        story.validate()?;
        return Ok(story.clone());
    }

    let story = prompt_story_configuration(config.story.as_ref())?;
    story.validate()?;
    Ok(story)
}

fn prompt_story_configuration(defaults: Option<&StoryConfiguration>) -> Result<StoryConfiguration> {
    let reader_age = CustomType::<u8>::new("How old is the reader?")
        .with_default(defaults.map_or(5, |d| d.reader_age))
        .with_help_message(&format!("{} to {}", MIN_READER_AGE, MAX_READER_AGE))
        .with_validator(|age: &u8| {
            if (MIN_READER_AGE..=MAX_READER_AGE).contains(age) {
                Ok(Validation::Valid)
            } else {
                Ok(Validation::Invalid(
                    format!("Pick an age from {} to {}", MIN_READER_AGE, MAX_READER_AGE).into(),
                ))
            }
        })
        .prompt()?;

    let theme = Select::new("Where does the story happen?", Theme::ALL.to_vec())
        .with_starting_cursor(starting_cursor(&Theme::ALL, defaults.map(|d| d.theme)))
        .prompt()?;

    let default_name = defaults.map_or("", |d| d.character_name.as_str());
    let character_name = Text::new("What is the hero's name?")
        .with_default(default_name)
        .with_validator(|name: &str| {
            if name.trim().is_empty() {
                Ok(Validation::Invalid("The hero needs a name".into()))
            } else {
                Ok(Validation::Valid)
            }
        })
        .prompt()?;

    let default_description = defaults.map_or("", |d| d.character_description.as_str());
    let character_description = Text::new("Describe the hero (optional):")
        .with_default(default_description)
        .with_placeholder("a curious and kind child")
        .prompt()?;

    let default_prompt = defaults.map_or("", |d| d.story_prompt.as_str());
    let story_prompt = Text::new("Any ideas for the story? (optional)")
        .with_default(default_prompt)
        .prompt()?;

    let page_count = CustomType::<usize>::new("How many pages?")
        .with_default(defaults.map_or(5, |d| d.page_count))
        .with_help_message(&format!("{} to {}", MIN_PAGE_COUNT, MAX_PAGE_COUNT))
        .with_validator(|count: &usize| {
            if (MIN_PAGE_COUNT..=MAX_PAGE_COUNT).contains(count) {
                Ok(Validation::Valid)
            } else {
                Ok(Validation::Invalid(
                    format!("Pick between {} and {} pages", MIN_PAGE_COUNT, MAX_PAGE_COUNT).into(),
                ))
            }
        })
        .prompt()?;

    let moral = Select::new("What should the story teach?", Moral::ALL.to_vec())
        .with_starting_cursor(starting_cursor(&Moral::ALL, defaults.map(|d| d.moral)))
        .prompt()?;

    Ok(StoryConfiguration {
        reader_age,
        theme,
        character_name: character_name.trim().to_string(),
        character_description: character_description.trim().to_string(),
        story_prompt: story_prompt.trim().to_string(),
        page_count,
        moral,
    })
}

fn starting_cursor<T: PartialEq>(options: &[T], selected: Option<T>) -> usize {
    selected
        .and_then(|s| options.iter().position(|o| *o == s))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::image::ImageConfig;
    use crate::services::llm::TextConfig;

    fn config(unattended: bool, story: Option<StoryConfiguration>) -> Config {
        Config {
            output_folder: "output".to_string(),
            unattended,
            binding_delay_ms: 0,
            text: TextConfig {
                provider: "gemini".to_string(),
                timeout_seconds: 60,
                gemini: None,
                ollama: None,
                openai: None,
            },
            image: ImageConfig {
                provider: "imagen".to_string(),
                timeout_seconds: 60,
                imagen: None,
                openai: None,
            },
            story,
        }
    }

    fn lily() -> StoryConfiguration {
        StoryConfiguration {
            reader_age: 5,
            theme: Theme::Space,
            character_name: "Lily".to_string(),
            character_description: String::new(),
            story_prompt: String::new(),
            page_count: 3,
            moral: Moral::Courage,
        }
    }

    #[test]
    fn test_unattended_uses_configured_story() {
        let story = collect_story_configuration(&config(true, Some(lily()))).unwrap();
        assert_eq!(story, lily());
    }

    #[test]
    fn test_unattended_without_story_fails() {
        assert!(collect_story_configuration(&config(true, None)).is_err());
    }

    #[test]
    fn test_unattended_validates_story() {
        let mut story = lily();
        story.page_count = 42;
        assert!(collect_story_configuration(&config(true, Some(story))).is_err());
    }

    #[test]
    fn test_starting_cursor() {
        assert_eq!(starting_cursor(&Theme::ALL, Some(Theme::Jungle)), 2);
        assert_eq!(starting_cursor(&Moral::ALL, None), 0);
    }
}
