//! Prompt catalog
//!
//! Maps the theme and tone keys sent by clients to the prompt fragments the
//! model sees. Unknown keys resolve to the fallback fragments, never to an
//! error. The catalog is validated once at startup.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors found while loading or validating a catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog has no {0}")]
    Empty(&'static str),

    #[error("{kind} entry has an empty key")]
    EmptyKey { kind: &'static str },

    #[error("{kind} entry `{key}` has an empty fragment")]
    EmptyFragment { kind: &'static str, key: String },

    #[error("fallback {0} fragment is empty")]
    EmptyFallback(&'static str),

    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One theme or tone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Label shown to users
    pub label: String,
    /// Natural-language fragment inserted into the prompt
    pub fragment: String,
}

impl CatalogEntry {
    fn new(label: &str, fragment: &str) -> Self {
        Self {
            label: label.to_string(),
            fragment: fragment.to_string(),
        }
    }
}

/// Theme and tone prompt fragments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptCatalog {
    pub themes: BTreeMap<String, CatalogEntry>,
    pub tones: BTreeMap<String, CatalogEntry>,
    pub fallback_theme: String,
    pub fallback_tone: String,
}

impl Default for PromptCatalog {
    fn default() -> Self {
        let themes = [
            ("dinosaures", "Dinosaures", "une aventure préhistorique parmi des dinosaures gentils et curieux"),
            ("espace", "Espace", "un voyage dans l'espace à bord d'une fusée, entre planètes et étoiles"),
            ("pirates", "Pirates", "une chasse au trésor avec un équipage de pirates bienveillants"),
            ("princesses", "Princesses", "un royaume enchanté où une princesse courageuse mène l'aventure"),
            ("animaux", "Animaux", "une aventure dans la forêt avec des animaux qui parlent"),
            ("magie", "Magie", "un monde magique rempli de sorts, de potions et de créatures fantastiques"),
            ("ocean", "Océan", "une exploration sous-marine avec des poissons, des dauphins et des coraux"),
            ("chevaliers", "Chevaliers", "une quête de chevaliers au grand cœur dans un château médiéval"),
            ("super-heros", "Super-héros", "une journée où l'enfant découvre un super-pouvoir pour aider les autres"),
            ("nature", "Nature", "une promenade pleine de découvertes au fil des saisons"),
        ]
        .into_iter()
        .map(|(key, label, fragment)| (key.to_string(), CatalogEntry::new(label, fragment)))
        .collect();

        let tones = [
            ("doux", "Doux", "un ton doux et apaisant, idéal avant de dormir"),
            ("drole", "Drôle", "un ton drôle et plein de situations amusantes"),
            ("aventureux", "Aventureux", "un ton dynamique, plein de rebondissements"),
            ("educatif", "Éducatif", "un ton éducatif qui glisse quelques faits simples et vrais"),
            ("poetique", "Poétique", "un ton poétique avec de jolies images et quelques rimes"),
        ]
        .into_iter()
        .map(|(key, label, fragment)| (key.to_string(), CatalogEntry::new(label, fragment)))
        .collect();

        Self {
            themes,
            tones,
            fallback_theme: "une aventure merveilleuse pleine de découvertes".to_string(),
            fallback_tone: "un ton chaleureux et bienveillant".to_string(),
        }
    }
}

impl PromptCatalog {
    /// Load a catalog from a JSON file and validate it
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        let catalog: Self = serde_json::from_str(&raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check that every key and fragment is non-empty and fallbacks exist
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.themes.is_empty() {
            return Err(CatalogError::Empty("themes"));
        }
        for (kind, entries) in [("theme", &self.themes), ("tone", &self.tones)] {
            for (key, entry) in entries {
                if key.trim().is_empty() {
                    return Err(CatalogError::EmptyKey { kind });
                }
                if entry.fragment.trim().is_empty() {
                    return Err(CatalogError::EmptyFragment {
                        kind,
                        key: key.clone(),
                    });
                }
            }
        }
        if self.fallback_theme.trim().is_empty() {
            return Err(CatalogError::EmptyFallback("theme"));
        }
        if self.fallback_tone.trim().is_empty() {
            return Err(CatalogError::EmptyFallback("tone"));
        }
        Ok(())
    }

    /// Prompt fragment for a theme key, or the fallback
    pub fn theme_fragment(&self, key: &str) -> &str {
        self.themes
            .get(normalize(key).as_str())
            .map(|e| e.fragment.as_str())
            .unwrap_or(&self.fallback_theme)
    }

    /// Prompt fragment for a tone key, or the fallback
    pub fn tone_fragment(&self, key: Option<&str>) -> &str {
        key.and_then(|k| self.tones.get(normalize(k).as_str()))
            .map(|e| e.fragment.as_str())
            .unwrap_or(&self.fallback_tone)
    }

    /// Whether the theme key is known
    pub fn has_theme(&self, key: &str) -> bool {
        self.themes.contains_key(normalize(key).as_str())
    }
}

fn normalize(key: &str) -> String {
    key.trim().to_lowercase()
}
