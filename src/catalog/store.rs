//! In-memory catalog store
//!
//! Owns the ordered list of entries. Newest entries sit at index 0.
//! All operations are synchronous and leave the list untouched on error.

use std::collections::HashSet;

use chrono::{Local, NaiveDate};
use tracing::{debug, info};
use uuid::Uuid;

use super::{VideoDraft, VideoEntry};
use crate::error::{ArchiveError, Result};

/// Most-recent-first collection of video entries
#[derive(Debug, Clone)]
pub struct CatalogStore {
    entries: Vec<VideoEntry>,
    today: fn() -> NaiveDate,
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            today: local_today,
        }
    }

    /// Use a fixed calendar for `date_added` (tests, replays)
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Build a store from seed records, keeping their order
    pub fn from_seed(seed: Vec<VideoEntry>) -> Result<Self> {
        let mut seen = HashSet::new();
        for entry in &seed {
            entry.validate()?;
            if !seen.insert(entry.id.clone()) {
                return Err(ArchiveError::Validation(format!(
                    "duplicate seed id: {}",
                    entry.id
                )));
            }
        }

        debug!(count = seed.len(), "Catalog seeded");

        Ok(Self {
            entries: seed,
            today: local_today,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Entries in current order
    pub fn list(&self) -> &[VideoEntry] {
        &self.entries
    }

    /// Case-insensitive substring match on titles; empty term matches all
    pub fn search(&self, term: &str) -> Vec<VideoEntry> {
        if term.is_empty() {
            return self.entries.clone();
        }

        let needle = term.to_lowercase();
        self.entries
            .iter()
            .filter(|e| e.title.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: &str) -> Result<&VideoEntry> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| not_found(id))
    }

    /// Validate a draft and prepend it as a new entry
    pub fn add(&mut self, draft: VideoDraft) -> Result<VideoEntry> {
        let draft = draft.normalized();
        draft.validate_required()?;
        let primary_image = draft
            .primary_image
            .ok_or_else(|| ArchiveError::Validation("primary_image is required".to_string()))?;

        let entry = VideoEntry {
            id: self.fresh_id(),
            title: draft.title,
            primary_image,
            secondary_image: draft.secondary_image,
            video_link: draft.video_link,
            subtitle_link: draft.subtitle_link,
            date_added: (self.today)(),
            description: draft.description,
        };

        self.entries.insert(0, entry.clone());
        info!(id = %entry.id, title = %entry.title, "Entry added");

        Ok(entry)
    }

    /// Replace an entry's content in place; `id` and `date_added` never change
    pub fn update(&mut self, id: &str, draft: VideoDraft) -> Result<VideoEntry> {
        let index = self.position(id)?;
        let draft = draft.normalized();
        draft.validate_required()?;

        let current = &mut self.entries[index];
        current.title = draft.title;
        current.video_link = draft.video_link;
        current.subtitle_link = draft.subtitle_link;
        current.description = draft.description;
        if let Some(url) = draft.primary_image {
            current.primary_image = url;
        }
        if let Some(url) = draft.secondary_image {
            current.secondary_image = Some(url);
        }

        info!(id = %current.id, title = %current.title, "Entry updated");
        Ok(current.clone())
    }

    /// Delete an entry. Removing an unknown id is an error, not a no-op.
    pub fn remove(&mut self, id: &str) -> Result<VideoEntry> {
        let index = self.position(id)?;
        let removed = self.entries.remove(index);
        info!(id = %removed.id, "Entry removed");
        Ok(removed)
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| not_found(id))
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if !self.contains(&id) {
                return id;
            }
        }
    }
}

fn not_found(id: &str) -> ArchiveError {
    ArchiveError::NotFound(format!("video {}", id))
}
