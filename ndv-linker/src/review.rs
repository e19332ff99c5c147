//! Review interchange file
//!
//! JSON object keyed by video id, listing milestone ids:
//!
//! ```json
//! { "185": [7409, 7404], "212": [7808] }
//! ```
//!
//! Written by `suggest` for human review and read back by `apply`.

use crate::engine::AssociationPlan;
use crate::error::{InputError, LinkerResult, RecordKind};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewFile {
    pub associations: BTreeMap<i64, Vec<i64>>,
}

impl ReviewFile {
    pub fn from_plan(plan: &AssociationPlan) -> Self {
        Self {
            associations: plan.mapping(),
        }
    }

    pub fn to_json(&self) -> LinkerResult<String> {
        let keyed: BTreeMap<String, &Vec<i64>> = self
            .associations
            .iter()
            .map(|(video_id, ids)| (video_id.to_string(), ids))
            .collect();
        Ok(serde_json::to_string_pretty(&keyed)?)
    }

    /// Parse a review document
    ///
    /// Keys must be distinct positive video ids; anything else is an [`InputError`].
    pub fn from_json(content: &str) -> LinkerResult<Self> {
        let keyed: BTreeMap<String, Vec<i64>> = serde_json::from_str(content)?;

        let mut associations = BTreeMap::new();
        for (key, ids) in keyed {
            let video_id = key
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|id| *id > 0)
                .ok_or_else(|| InputError::InvalidReviewKey(key.clone()))?;
            if associations.insert(video_id, ids).is_some() {
                return Err(InputError::Duplicate {
                    record: RecordKind::Video,
                    id: video_id,
                }
                .into());
            }
        }

        Ok(Self { associations })
    }

    pub fn write(&self, path: &Path) -> LinkerResult<()> {
        std::fs::write(path, self.to_json()?)?;
        info!(
            path = %path.display(),
            videos = self.associations.len(),
            "Wrote review file"
        );
        Ok(())
    }

    pub fn read(path: &Path) -> LinkerResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let review = Self::from_json(&content)?;
        info!(
            path = %path.display(),
            videos = review.associations.len(),
            "Read review file"
        );
        Ok(review)
    }
}
