//! Engine input records
//!
//! Validated, immutable views of the video source and the milestone catalog.
//! Optional text fields are `None` when absent or blank; they never cause errors.

use crate::error::{InputError, RecordKind};
use ndv_common::db::{MilestoneRow, VideoRow};

/// Name prefix marking a milestone as withdrawn from matching
pub const QUARANTINE_PREFIX: &str = "[CUARENTENA]";

/// Video to be matched against the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct VideoLabel {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub source_tag: Option<String>,
}

impl VideoLabel {
    /// Build a label with only a title
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            source_tag: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = non_blank(Some(description.into()));
        self
    }

    pub fn with_source_tag(mut self, tag: impl Into<String>) -> Self {
        self.source_tag = non_blank(Some(tag.into()));
        self
    }

    /// Free text handed to the normalizer: title, then description when present
    pub fn label_text(&self) -> String {
        match &self.description {
            Some(description) => format!("{} {}", self.title, description),
            None => self.title.clone(),
        }
    }
}

impl TryFrom<VideoRow> for VideoLabel {
    type Error = InputError;

    fn try_from(row: VideoRow) -> Result<Self, Self::Error> {
        if row.id <= 0 {
            return Err(InputError::InvalidId {
                record: RecordKind::Video,
                id: row.id,
            });
        }

        let title = non_blank(row.title).ok_or(InputError::MissingField {
            record: RecordKind::Video,
            id: row.id,
            field: "title",
        })?;

        Ok(Self {
            id: row.id,
            title,
            description: non_blank(row.description),
            source_tag: non_blank(row.source_tag),
        })
    }
}

/// Normative milestone catalog entry
#[derive(Debug, Clone, PartialEq)]
pub struct MilestoneRecord {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub domain: Option<String>,
    pub source_tag: Option<String>,
    pub typical_age_months: Option<f64>,
}

impl MilestoneRecord {
    /// Build a record with only a name
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            domain: None,
            source_tag: None,
            typical_age_months: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = non_blank(Some(description.into()));
        self
    }

    pub fn with_source_tag(mut self, tag: impl Into<String>) -> Self {
        self.source_tag = non_blank(Some(tag.into()));
        self
    }

    pub fn with_age_months(mut self, months: f64) -> Self {
        self.typical_age_months = Some(months).filter(|m| m.is_finite());
        self
    }

    /// Withdrawn entries never become candidates
    pub fn is_quarantined(&self) -> bool {
        self.name.trim_start().starts_with(QUARANTINE_PREFIX)
    }
}

impl TryFrom<MilestoneRow> for MilestoneRecord {
    type Error = InputError;

    fn try_from(row: MilestoneRow) -> Result<Self, Self::Error> {
        if row.id <= 0 {
            return Err(InputError::InvalidId {
                record: RecordKind::Milestone,
                id: row.id,
            });
        }

        let name = non_blank(row.name).ok_or(InputError::MissingField {
            record: RecordKind::Milestone,
            id: row.id,
            field: "name",
        })?;

        Ok(Self {
            id: row.id,
            name,
            description: non_blank(row.description),
            domain: non_blank(row.domain),
            source_tag: non_blank(row.source_tag),
            typical_age_months: row.typical_age_months.filter(|m| m.is_finite()),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
