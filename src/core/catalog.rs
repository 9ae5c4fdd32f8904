use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// --- Themes ---

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Fairytale,
    Space,
    Jungle,
    Underwater,
}

impl Theme {
    pub const ALL: [Theme; 4] = [Theme::Fairytale, Theme::Space, Theme::Jungle, Theme::Underwater];

    pub fn key(&self) -> &'static str {
        match self {
            Theme::Fairytale => "fairytale",
            Theme::Space => "space",
            Theme::Jungle => "jungle",
            Theme::Underwater => "underwater",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Theme::Fairytale => "Enchanted Fairytale",
            Theme::Space => "Space Adventure",
            Theme::Jungle => "Jungle Expedition",
            Theme::Underwater => "Underwater Kingdom",
        }
    }

    /// Illustration style fed into every image prompt for this theme.
    pub fn style(&self) -> &'static str {
        match self {
            Theme::Fairytale => {
                "whimsical watercolor storybook illustration, soft pastel colors, castles and enchanted forests"
            }
            Theme::Space => {
                "bright cartoon illustration, glowing planets and twinkling stars, friendly rockets"
            }
            Theme::Jungle => {
                "lush colorful picture-book art, tropical leaves, playful jungle animals"
            }
            Theme::Underwater => {
                "gentle gouache illustration, coral reefs, shimmering light rays, smiling sea creatures"
            }
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_lowercase();
        Theme::ALL
            .into_iter()
            .find(|t| t.key() == key)
            .ok_or_else(|| anyhow!("Unknown theme: {}", s))
    }
}

// --- Morals ---

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Moral {
    Sharing,
    Kindness,
    Courage,
    Honesty,
}

impl Moral {
    pub const ALL: [Moral; 4] = [Moral::Sharing, Moral::Kindness, Moral::Courage, Moral::Honesty];

    pub fn key(&self) -> &'static str {
        match self {
            Moral::Sharing => "sharing",
            Moral::Kindness => "kindness",
            Moral::Courage => "courage",
            Moral::Honesty => "honesty",
        }
    }

    pub fn phrase(&self) -> &'static str {
        match self {
            Moral::Sharing => "the joy of sharing with others",
            Moral::Kindness => "being kind to everyone, even when it is hard",
            Moral::Courage => "finding the courage to face your fears",
            Moral::Honesty => "why telling the truth always matters",
        }
    }
}

impl fmt::Display for Moral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.key(), self.phrase())
    }
}

impl FromStr for Moral {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_lowercase();
        Moral::ALL
            .into_iter()
            .find(|m| m.key() == key)
            .ok_or_else(|| anyhow!("Unknown moral: {}", s))
    }
}
