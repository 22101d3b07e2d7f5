use std::borrow::Cow;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Local;
use futures_util::StreamExt;
use futures_util::stream;
use log::{debug, error, info, warn};
use tokio::sync::mpsc;

use crate::config::PanelConfig;
use crate::engine::models::{CatalogEntry, Manifest};
use crate::engine::state::{SyncEvent, SyncReport};
use crate::error::SyncError;
use crate::networking::CatalogSource;
use crate::seed;
use crate::storage::{ManifestStore, normalize_identifier};

pub mod models;
pub mod planner;
pub mod state;

pub struct SyncEngine {
    store: ManifestStore,
    source: Arc<dyn CatalogSource>,
    seed_archive: Cow<'static, [u8]>,
    max_concurrent: usize,
    prune_stale: bool,
    cancel_flag: Arc<AtomicBool>,
}

impl SyncEngine {
    pub fn new(
        store: ManifestStore,
        source: Arc<dyn CatalogSource>,
        config: &PanelConfig,
        cancel_flag: Arc<AtomicBool>,
    ) -> Self {
        Self {
            store,
            source,
            seed_archive: Cow::Borrowed(seed::BUNDLED_ARCHIVE),
            max_concurrent: config.max_concurrent_fetches.max(1),
            prune_stale: config.prune_stale,
            cancel_flag,
        }
    }

    #[must_use]
    pub fn with_seed_archive(mut self, archive: impl Into<Cow<'static, [u8]>>) -> Self {
        self.seed_archive = archive.into();
        self
    }

    pub fn store(&self) -> &ManifestStore {
        &self.store
    }

    /// Seed on first run, then publish whatever the cache holds.
    pub fn load_cached(
        &self,
        updates: &mpsc::UnboundedSender<SyncEvent>,
    ) -> Result<Vec<CatalogEntry>, SyncError> {
        info!("sync: loading cached catalog from {}", self.store.root().display());
        seed::seed_if_missing(&self.store, &self.seed_archive)?;
        let manifest = self.store.load()?;
        let (entries, failures) = self.store.load_records(&manifest);
        if !failures.is_empty() {
            warn!("sync: {} cached records could not be read", failures.len());
        }
        let listed: BTreeSet<String> = manifest.identifiers().map(normalize_identifier).collect();
        let unlisted = self
            .store
            .detail_stems()
            .into_iter()
            .filter(|stem| !listed.contains(stem))
            .count();
        if unlisted > 0 {
            debug!("sync: {unlisted} cached detail files are not listed in the manifest");
        }
        let _ = updates.send(SyncEvent::Loaded(entries.clone()));
        Ok(entries)
    }

    /// Run one update cycle and report its outcome on `updates`.
    pub async fn sync(
        &self,
        updates: &mpsc::UnboundedSender<SyncEvent>,
    ) -> Result<SyncReport, SyncError> {
        self.reset_cancel_flag();
        updates.send(SyncEvent::Started).ok();
        match self.run_cycle(updates).await {
            Ok(report) => {
                info!("sync: finished ({})", report.summary());
                updates.send(SyncEvent::Finished(report.clone())).ok();
                Ok(report)
            }
            Err(err) => {
                if matches!(err, SyncError::Cancelled) {
                    warn!("sync: cancelled");
                } else {
                    error!("sync: failed: {err}");
                }
                updates.send(SyncEvent::Failed(err.to_string())).ok();
                Err(err)
            }
        }
    }

    async fn run_cycle(
        &self,
        updates: &mpsc::UnboundedSender<SyncEvent>,
    ) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::default();
        match seed::seed_if_missing(&self.store, &self.seed_archive) {
            Ok(seeded) => report.seeded = seeded,
            Err(err) => warn!("sync: bundled data unavailable ({err}); continuing from network"),
        }

        let local = match self.store.load() {
            Ok(local) => local,
            Err(err) => {
                warn!("sync: cached manifest unreadable ({err}); refetching everything");
                Manifest::new()
            }
        };

        self.check_cancel()?;
        let remote = self.source.fetch_manifest().await?;
        report.remote_entries = remote.len();

        let planned = planner::plan(&remote, &local);
        report.planned = planned.len();
        info!(
            "sync: remote lists {} apps, {} need fetching",
            remote.len(),
            planned.len()
        );
        updates.send(SyncEvent::Planned {
            total: planned.len(),
        })
        .ok();

        let mut failed: BTreeSet<String> = BTreeSet::new();
        let mut cancelled = false;
        let source = self.source.as_ref();
        let cancel_flag = self.cancel_flag.as_ref();
        let mut fetches = stream::iter(planned)
            .map(move |identifier| async move {
                if cancel_flag.load(Ordering::SeqCst) {
                    return (identifier, None);
                }
                let result = source.fetch_detail(&identifier).await;
                (identifier, Some(result))
            })
            .buffer_unordered(self.max_concurrent);

        while let Some((identifier, result)) = fetches.next().await {
            let outcome = match result {
                None => {
                    cancelled = true;
                    failed.insert(identifier);
                    continue;
                }
                Some(Ok(payload)) => self
                    .store
                    .write_detail(&identifier, &payload.raw)
                    .map(|_| payload.record)
                    .map_err(|e| e.to_string()),
                Some(Err(err)) => Err(err.to_string()),
            };
            match outcome {
                Ok(record) => {
                    debug!("sync: cached {identifier} {}", record.version);
                    report.updated.push(identifier.clone());
                    updates
                        .send(SyncEvent::RecordUpdated(CatalogEntry { identifier, record }))
                        .ok();
                }
                Err(message) => {
                    warn!("sync: {identifier} not updated: {message}");
                    updates
                        .send(SyncEvent::RecordFailed {
                            identifier: identifier.clone(),
                            error: message.clone(),
                        })
                        .ok();
                    report.failed.insert(identifier.clone(), message);
                    failed.insert(identifier);
                }
            }
        }
        drop(fetches);
        report.updated.sort();

        // Fetched entries are committed even when the cycle was cancelled.
        let settled = planner::settle(&remote, &local, &failed);
        self.store.save(&settled)?;
        if cancelled {
            return Err(SyncError::Cancelled);
        }

        report.stale = planner::stale(&remote, &local).into_iter().collect();
        if self.prune_stale {
            report.pruned = self.prune(&remote, &report.stale);
        } else if !report.stale.is_empty() {
            debug!("sync: retaining {} stale records", report.stale.len());
        }

        report.finished_at = Some(Local::now());
        Ok(report)
    }

    fn prune(&self, remote: &Manifest, stale: &[String]) -> Vec<String> {
        let live: BTreeSet<String> = remote.identifiers().map(normalize_identifier).collect();
        let mut pruned = Vec::new();
        for identifier in stale {
            // Two identifiers may normalize to the same file name.
            if live.contains(&normalize_identifier(identifier)) {
                continue;
            }
            match self.store.remove_detail(identifier) {
                Ok(()) => pruned.push(identifier.clone()),
                Err(err) => warn!("sync: failed to prune {identifier}: {err}"),
            }
        }
        pruned
    }

    fn check_cancel(&self) -> Result<(), SyncError> {
        if self.cancel_flag.load(Ordering::SeqCst) {
            debug!("cancel flag observed set");
            return Err(SyncError::Cancelled);
        }
        Ok(())
    }

    fn reset_cancel_flag(&self) {
        self.cancel_flag.store(false, Ordering::SeqCst);
        debug!("cancel flag reset");
    }
}
