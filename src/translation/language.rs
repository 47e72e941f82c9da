/*!
 * Translation directions and per-run language configuration.
 */

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::language_utils;

/// Supported source/target pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    ZhToFr,
    FrToZh,
    ZhToEn,
    EnToZh,
    EnToFr,
    FrToEn,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::ZhToFr,
        Direction::FrToZh,
        Direction::ZhToEn,
        Direction::EnToZh,
        Direction::EnToFr,
        Direction::FrToEn,
    ];

    /// ISO 639-1 code of the source language
    pub fn source(&self) -> &'static str {
        match self {
            Self::ZhToFr | Self::ZhToEn => "zh",
            Self::FrToZh | Self::FrToEn => "fr",
            Self::EnToZh | Self::EnToFr => "en",
        }
    }

    /// ISO 639-1 code of the target language
    pub fn target(&self) -> &'static str {
        match self {
            Self::FrToZh | Self::EnToZh => "zh",
            Self::ZhToFr | Self::EnToFr => "fr",
            Self::ZhToEn | Self::FrToEn => "en",
        }
    }

    /// Configuration key, e.g. `zh_to_fr`
    pub fn key(&self) -> &'static str {
        match self {
            Self::ZhToFr => "zh_to_fr",
            Self::FrToZh => "fr_to_zh",
            Self::ZhToEn => "zh_to_en",
            Self::EnToZh => "en_to_zh",
            Self::EnToFr => "en_to_fr",
            Self::FrToEn => "fr_to_en",
        }
    }

    /// The same pair the other way round
    pub fn reverse(&self) -> Self {
        match self {
            Self::ZhToFr => Self::FrToZh,
            Self::FrToZh => Self::ZhToFr,
            Self::ZhToEn => Self::EnToZh,
            Self::EnToZh => Self::ZhToEn,
            Self::EnToFr => Self::FrToEn,
            Self::FrToEn => Self::EnToFr,
        }
    }

    /// Whether Chinese is on either side
    pub fn involves_chinese(&self) -> bool {
        self.source() == "zh" || self.target() == "zh"
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Direction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|d| d.key() == normalized || format!("{}_{}", d.source(), d.target()) == normalized)
            .ok_or_else(|| anyhow!("Invalid direction: {} (expected one of zh_to_fr, fr_to_zh, zh_to_en, en_to_zh, en_to_fr, fr_to_en)", s))
    }
}

/// Language settings of one run; immutable once built
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageConfig {
    pub direction: Direction,
    pub source_code: String,
    pub target_code: String,
    /// Human readable pair, e.g. "Chinese → French"
    pub display_name: String,
    /// Ordered term → hint pairs for this direction
    pub context_terms: Vec<(String, String)>,
}

impl LanguageConfig {
    pub fn new(direction: Direction, context_terms: Vec<(String, String)>) -> Self {
        let name = |code: &str| language_utils::get_language_name(code).unwrap_or_else(|_| code.to_string());
        Self {
            direction,
            source_code: direction.source().to_string(),
            target_code: direction.target().to_string(),
            display_name: format!("{} → {}", name(direction.source()), name(direction.target())),
            context_terms,
        }
    }
}
