use rand::seq::IndexedRandom;
use rand::Rng;
use std::collections::HashMap;
use std::path::Path;

const BUNDLED_PRESETS: &str = include_str!("../../presets/faces.json");

/// Fixed registry of reference faces, grouped by category.
#[derive(Debug, Clone)]
pub struct PresetRegistry {
    categories: HashMap<String, Vec<String>>,
}

impl PresetRegistry {
    /// Category names are matched case-insensitively. Empty categories are dropped.
    pub fn new(categories: HashMap<String, Vec<String>>) -> Self {
        let categories = categories
            .into_iter()
            .filter(|(_, urls)| !urls.is_empty())
            .map(|(name, urls)| (name.to_ascii_lowercase(), urls))
            .collect();
        Self { categories }
    }

    pub fn bundled() -> Result<Self, PresetError> {
        Self::from_json(BUNDLED_PRESETS)
    }

    pub fn from_json(json: &str) -> Result<Self, PresetError> {
        let categories: HashMap<String, Vec<String>> = serde_json::from_str(json)?;
        Ok(Self::new(categories))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PresetError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    /// Pick one entry of `category` uniformly at random.
    pub fn select<R: Rng + ?Sized>(&self, category: &str, rng: &mut R) -> Result<&str, PresetError> {
        self.categories
            .get(&category.trim().to_ascii_lowercase())
            .and_then(|urls| urls.choose(rng))
            .map(String::as_str)
            .ok_or_else(|| PresetError::UnknownCategory(category.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PresetError {
    #[error("Unknown preset category {0:?}")]
    UnknownCategory(String),

    #[error("Failed to read preset registry: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid preset registry: {0}")]
    Parse(#[from] serde_json::Error),
}
