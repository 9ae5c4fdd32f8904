use crate::core::catalog::{Moral, Theme};
use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MIN_READER_AGE: u8 = 1;
pub const MAX_READER_AGE: u8 = 12;
pub const MIN_PAGE_COUNT: usize = 3;
pub const MAX_PAGE_COUNT: usize = 10;

pub const DEFAULT_CHARACTER_DESCRIPTION: &str = "a curious and kind child";

// --- Input ---

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StoryConfiguration {
    pub reader_age: u8,
    pub theme: Theme,
    pub character_name: String,
    #[serde(default)]
    pub character_description: String,
    #[serde(default)]
    pub story_prompt: String,
    pub page_count: usize,
    pub moral: Moral,
}

impl StoryConfiguration {
    /// Description used in prompts; falls back to a generic one when left blank.
    pub fn character_description(&self) -> &str {
        let desc = self.character_description.trim();
        if desc.is_empty() {
            DEFAULT_CHARACTER_DESCRIPTION
        } else {
            desc
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.character_name.trim().is_empty() {
            bail!("Character name is required");
        }
        if !(MIN_READER_AGE..=MAX_READER_AGE).contains(&self.reader_age) {
            bail!(
                "Reader age must be between {} and {}, got {}",
                MIN_READER_AGE,
                MAX_READER_AGE,
                self.reader_age
            );
        }
        if !(MIN_PAGE_COUNT..=MAX_PAGE_COUNT).contains(&self.page_count) {
            bail!(
                "Page count must be between {} and {}, got {}",
                MIN_PAGE_COUNT,
                MAX_PAGE_COUNT,
                self.page_count
            );
        }
        Ok(())
    }
}

// --- Images ---

/// Either an inline `data:` URL or a placeholder URL. Always renderable.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn inline(mime_type: &str, base64_payload: &str) -> Self {
        Self(format!("data:{};base64,{}", mime_type, base64_payload))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_placeholder(&self) -> bool {
        !self.0.starts_with("data:")
    }

    /// Returns `(mime_type, bytes)` for inline images, `None` for URLs.
    pub fn decode_inline(&self) -> Result<Option<(String, Vec<u8>)>> {
        let Some(rest) = self.0.strip_prefix("data:") else {
            return Ok(None);
        };
        let (mime_type, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| anyhow!("Malformed inline image reference"))?;
        let bytes = BASE64
            .decode(payload.as_bytes())
            .context("Inline image base64 decode failed")?;
        Ok(Some((mime_type.to_string(), bytes)))
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// --- Progress ---

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct GenerationProgress {
    pub status_message: String,
    pub percent_complete: f32,
    pub partial_cover: Option<ImageRef>,
    pub partial_title: Option<String>,
}

impl GenerationProgress {
    pub fn new(status_message: impl Into<String>, percent_complete: f32) -> Self {
        Self {
            status_message: status_message.into(),
            percent_complete,
            partial_cover: None,
            partial_title: None,
        }
    }

    pub fn with_partial(mut self, title: &str, cover: &ImageRef) -> Self {
        self.partial_title = Some(title.to_string());
        self.partial_cover = Some(cover.clone());
        self
    }
}

// --- Output ---

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Page {
    pub text: String,
    pub image: ImageRef,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Story {
    pub title: String,
    pub cover: ImageRef,
    pub pages: Vec<Page>,
}
