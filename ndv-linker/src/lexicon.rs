//! Lexicon: canonical skill keys and their surface forms
//!
//! One tagged-data artifact replaces the per-script keyword tables. The built-in
//! lexicon is embedded from `data/lexicon.toml`; a file with the same layout can
//! replace it at run time.

use crate::error::ConfigError;
use crate::normalizer::{fold, normalize_phrase};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

const BUILTIN_LEXICON: &str = include_str!("../data/lexicon.toml");

/// Canonical key with the surface forms it expands to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymEntry {
    /// Normalized key, matched against the normalized label text
    pub canonical_key: String,

    /// Folded surface forms in file order, without duplicates
    pub surface_forms: Vec<String>,
}

/// Read-only synonym table used during matching
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lexicon {
    entries: Vec<SynonymEntry>,
}

#[derive(Debug, Deserialize)]
struct LexiconFile {
    #[serde(rename = "entry", default)]
    entries: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    key: String,
    forms: Vec<String>,
}

impl Lexicon {
    /// Lexicon shipped with the crate
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_toml_str(BUILTIN_LEXICON)
    }

    /// Load a lexicon file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let lexicon = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), entries = lexicon.len(), "Loaded lexicon");
        Ok(lexicon)
    }

    /// Parse and validate a lexicon document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: LexiconFile = toml::from_str(content).map_err(|source| ConfigError::Parse {
            what: "lexicon",
            source,
        })?;

        Self::from_entries(file.entries.into_iter().map(|e| (e.key, e.forms)))
    }

    /// Build a lexicon from `(key, forms)` pairs, normalizing and validating them
    ///
    /// # Errors
    /// Empty key, key without forms, blank form, or two keys that normalize to
    /// the same text.
    pub fn from_entries<I, K, F, S>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, F)>,
        K: AsRef<str>,
        F: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen_keys = HashSet::new();
        let mut normalized = Vec::new();

        for (raw_key, raw_forms) in entries {
            let canonical_key = normalize_phrase(raw_key.as_ref());
            if canonical_key.is_empty() {
                return Err(ConfigError::Lexicon(format!(
                    "entry key '{}' is empty after normalization",
                    raw_key.as_ref()
                )));
            }
            if !seen_keys.insert(canonical_key.clone()) {
                return Err(ConfigError::Lexicon(format!(
                    "duplicate key '{}'",
                    canonical_key
                )));
            }

            let mut surface_forms: Vec<String> = Vec::new();
            for raw_form in raw_forms {
                let form = fold(raw_form.as_ref().trim());
                if form.is_empty() {
                    return Err(ConfigError::Lexicon(format!(
                        "key '{}' has a blank surface form",
                        canonical_key
                    )));
                }
                if !surface_forms.contains(&form) {
                    surface_forms.push(form);
                }
            }

            if surface_forms.is_empty() {
                return Err(ConfigError::Lexicon(format!(
                    "key '{}' has no surface forms",
                    canonical_key
                )));
            }

            normalized.push(SynonymEntry {
                canonical_key,
                surface_forms,
            });
        }

        Ok(Self {
            entries: normalized,
        })
    }

    pub fn entries(&self) -> &[SynonymEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
