//! Video catalog - entries, drafts and the in-memory store
//!
//! Provides:
//! - `VideoEntry`: one cataloged video
//! - `VideoDraft`: the explicit form value passed into add/update
//! - `CatalogStore`: most-recent-first collection with title search

pub mod store;

pub use store::CatalogStore;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ArchiveError, Result};

/// One cataloged video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoEntry {
    /// Opaque identifier, immutable after creation
    pub id: String,

    pub title: String,

    /// URL of the first screenshot
    pub primary_image: String,

    /// URL of the second screenshot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_image: Option<String>,

    /// External video link
    pub video_link: String,

    /// External subtitle/fansub link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle_link: Option<String>,

    /// Set once at creation, never touched by edits
    pub date_added: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl VideoEntry {
    /// Check the fields every stored entry must carry
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(ArchiveError::Validation("id is required".to_string()));
        }
        require("title", &self.title)?;
        require("video_link", &self.video_link)?;
        require("primary_image", &self.primary_image)?;
        Ok(())
    }
}

/// In-progress add/edit form
///
/// Image fields left as `None` mean "no replacement": `add` rejects a draft
/// without a primary image, `update` keeps the stored URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoDraft {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub video_link: String,

    #[serde(default)]
    pub subtitle_link: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub primary_image: Option<String>,

    #[serde(default)]
    pub secondary_image: Option<String>,
}

impl VideoDraft {
    pub fn new(title: impl Into<String>, video_link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            video_link: video_link.into(),
            ..Self::default()
        }
    }

    pub fn with_primary_image(mut self, url: impl Into<String>) -> Self {
        self.primary_image = Some(url.into());
        self
    }

    pub fn with_secondary_image(mut self, url: impl Into<String>) -> Self {
        self.secondary_image = Some(url.into());
        self
    }

    pub fn with_subtitle_link(mut self, url: impl Into<String>) -> Self {
        self.subtitle_link = Some(url.into());
        self
    }

    pub fn with_description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Validate the text fields both add and update require
    pub fn validate_required(&self) -> Result<()> {
        require("title", &self.title)?;
        require("video_link", &self.video_link)
    }

    /// Trim required fields and collapse blank optional fields to `None`
    pub(crate) fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            video_link: self.video_link.trim().to_string(),
            subtitle_link: non_blank(self.subtitle_link),
            description: non_blank(self.description),
            primary_image: non_blank(self.primary_image),
            secondary_image: non_blank(self.secondary_image),
        }
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ArchiveError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
