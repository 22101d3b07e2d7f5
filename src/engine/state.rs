use std::collections::BTreeMap;

use chrono::{DateTime, Local};

use super::models::{AppRecord, CatalogEntry};

/// Outcome of one sync cycle.
#[derive(Clone, Debug, Default)]
pub struct SyncReport {
    pub seeded: bool,
    pub remote_entries: usize,
    pub planned: usize,
    pub updated: Vec<String>,
    /// Identifier to error message; these stay planned for the next cycle.
    pub failed: BTreeMap<String, String>,
    /// Identifiers the remote manifest no longer lists.
    pub stale: Vec<String>,
    pub pruned: Vec<String>,
    pub finished_at: Option<DateTime<Local>>,
}

impl SyncReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn summary(&self) -> String {
        let mut text = format!(
            "{} apps listed, {} updated",
            self.remote_entries,
            self.updated.len()
        );
        if !self.failed.is_empty() {
            text.push_str(&format!(", {} failed", self.failed.len()));
        }
        if !self.pruned.is_empty() {
            text.push_str(&format!(", {} removed", self.pruned.len()));
        }
        text
    }
}

// Emitted by the engine; the presentation layer owns the list these update.
#[derive(Clone, Debug)]
pub enum SyncEvent {
    Started,
    /// Cached catalog, sent before any network work.
    Loaded(Vec<CatalogEntry>),
    Planned { total: usize },
    RecordUpdated(CatalogEntry),
    RecordFailed { identifier: String, error: String },
    Finished(SyncReport),
    Failed(String),
}

// Actions triggered by the user from the UI layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserAction {
    Download(AppRecord),
    ShowMore(AppRecord),
    Follow,
    BuyCoffee,
    Report,
}
