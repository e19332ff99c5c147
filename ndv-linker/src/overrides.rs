//! Manual override table
//!
//! Human corrections keyed by video id. An overridden video skips automatic
//! ranking entirely and receives exactly the listed milestones.

use crate::error::ConfigError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Corrected association set for one video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideEntry {
    pub video_id: i64,

    /// Milestones in file order, without duplicates
    pub milestone_ids: Vec<i64>,

    /// Free-text justification kept for auditing
    pub reason: Option<String>,
}

/// Override table keyed by video id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideTable {
    entries: BTreeMap<i64, OverrideEntry>,
}

#[derive(Debug, Deserialize)]
struct OverrideFile {
    #[serde(rename = "override", default)]
    overrides: Vec<RawOverride>,
}

#[derive(Debug, Deserialize)]
struct RawOverride {
    video_id: i64,
    milestones: Vec<i64>,
    #[serde(default)]
    reason: Option<String>,
}

impl OverrideTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load an override file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), overrides = table.len(), "Loaded override table");
        Ok(table)
    }

    /// Parse and validate an override document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: OverrideFile = toml::from_str(content).map_err(|source| ConfigError::Parse {
            what: "override table",
            source,
        })?;

        let mut table = Self::default();
        for raw in file.overrides {
            table.insert(OverrideEntry {
                video_id: raw.video_id,
                milestone_ids: raw.milestones,
                reason: raw.reason.filter(|r| !r.trim().is_empty()),
            })?;
        }
        Ok(table)
    }

    /// Add one override
    ///
    /// # Errors
    /// Non-positive ids, an empty milestone list, or a second entry for the
    /// same video.
    pub fn insert(&mut self, mut entry: OverrideEntry) -> Result<(), ConfigError> {
        if entry.video_id <= 0 {
            return Err(ConfigError::Overrides(format!(
                "invalid video id {}",
                entry.video_id
            )));
        }
        if entry.milestone_ids.is_empty() {
            return Err(ConfigError::Overrides(format!(
                "video {} lists no milestones",
                entry.video_id
            )));
        }
        if let Some(bad) = entry.milestone_ids.iter().find(|id| **id <= 0) {
            return Err(ConfigError::Overrides(format!(
                "video {} lists invalid milestone id {}",
                entry.video_id, bad
            )));
        }
        if self.entries.contains_key(&entry.video_id) {
            return Err(ConfigError::Overrides(format!(
                "video {} overridden more than once",
                entry.video_id
            )));
        }

        let mut unique = Vec::with_capacity(entry.milestone_ids.len());
        for id in entry.milestone_ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        entry.milestone_ids = unique;

        self.entries.insert(entry.video_id, entry);
        Ok(())
    }

    pub fn get(&self, video_id: i64) -> Option<&OverrideEntry> {
        self.entries.get(&video_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
