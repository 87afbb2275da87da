//! Scan, partition, delete in bounded batches, report.
//!
//! Batches are committed one after another. A rejected batch is recorded
//! and the run moves on; batches that already committed stay committed.
//! Re-running against an unchanged store deletes nothing further.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::settings::Settings;
use crate::error::SweepError;
use crate::services::guard::Clearance;
use crate::services::rule::{partition, MembershipRule, Partition};
use crate::store::{DocumentStore, MAX_BATCH_SIZE};

/// One reconciliation: which collection, which rule, which ids to spare.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilePlan {
    pub collection: String,
    pub rule: MembershipRule,
    #[serde(default)]
    pub protected: BTreeSet<String>,
}

impl ReconcilePlan {
    pub fn new(collection: impl Into<String>, rule: MembershipRule) -> Self {
        Self {
            collection: collection.into(),
            rule,
            protected: BTreeSet::new(),
        }
    }

    pub fn with_protected<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protected.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn from_json_file(path: &Path) -> Result<Self, SweepError> {
        let raw = fs::read_to_string(path)
            .map_err(|e| SweepError::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&raw)
            .map_err(|e| SweepError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Plan-level ids plus any the rule itself protects.
    pub fn protected_set(&self) -> BTreeSet<String> {
        let mut ids = self.protected.clone();
        ids.extend(self.rule.protected_ids().cloned());
        ids
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    Committed { index: usize, size: usize },
    Rejected {
        index: usize,
        ids: Vec<String>,
        reason: String,
    },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileReport {
    pub collection: String,
    pub scanned: usize,
    pub deleted: usize,
    pub kept: usize,
    /// Ids whose batch was rejected.
    pub failures: Vec<String>,
    pub batches: Vec<BatchOutcome>,
    /// Ids the rule wanted gone but the protected set kept.
    pub clamped: Vec<String>,
    /// Ids a dry run would delete.
    pub pending: Vec<String>,
    /// Ids removed by committed batches, in commit order.
    pub deleted_ids: Vec<String>,
    pub dry_run: bool,
}

impl ReconcileReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn rejected_batches(&self) -> Vec<usize> {
        self.batches
            .iter()
            .filter_map(|b| match b {
                BatchOutcome::Rejected { index, .. } => Some(*index),
                BatchOutcome::Committed { .. } => None,
            })
            .collect()
    }

    pub fn ensure_complete(self) -> Result<Self, SweepError> {
        if self.is_complete() {
            return Ok(self);
        }
        Err(SweepError::PartialBatchFailure {
            collection: self.collection.clone(),
            failed: self.failures.len(),
            batches: self.rejected_batches(),
        })
    }

    pub fn summary(&self) -> String {
        if self.dry_run {
            format!(
                "{}: scanned={} would_delete={} kept={} protected_hits={}",
                self.collection,
                self.scanned,
                self.pending.len(),
                self.kept,
                self.clamped.len()
            )
        } else {
            format!(
                "{}: scanned={} deleted={} kept={} failed={} protected_hits={}",
                self.collection,
                self.scanned,
                self.deleted,
                self.kept,
                self.failures.len(),
                self.clamped.len()
            )
        }
    }
}

/// Splits ids into consecutive batches of at most `limit` (itself capped at
/// [`MAX_BATCH_SIZE`]).
pub fn chunk_ids(ids: &[String], limit: usize) -> Vec<Vec<String>> {
    let limit = limit.clamp(1, MAX_BATCH_SIZE);
    ids.chunks(limit).map(<[String]>::to_vec).collect()
}

pub struct Reconciler<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
    batch_limit: usize,
}

impl<'a, S: DocumentStore + ?Sized> Reconciler<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            batch_limit: MAX_BATCH_SIZE,
        }
    }

    pub fn with_batch_limit(mut self, limit: usize) -> Self {
        self.batch_limit = limit.clamp(1, MAX_BATCH_SIZE);
        self
    }

    async fn snapshot_partition(&self, plan: &ReconcilePlan) -> Result<Partition, SweepError> {
        let records = self.store.fetch_all(&plan.collection).await?;
        info!(
            collection = %plan.collection,
            scanned = records.len(),
            "snapshot fetched"
        );
        Ok(partition(records, &plan.rule, &plan.protected_set()))
    }

    /// Computes the delete set without touching the store.
    pub async fn preview(&self, plan: &ReconcilePlan) -> Result<ReconcileReport, SweepError> {
        let split = self.snapshot_partition(plan).await?;

        Ok(ReconcileReport {
            collection: plan.collection.clone(),
            scanned: split.keep.len() + split.delete.len(),
            kept: split.keep.len(),
            clamped: split.clamped,
            pending: split.delete.into_iter().map(|r| r.id).collect(),
            dry_run: true,
            ..Default::default()
        })
    }

    /// Single snapshot read, then deletes everything the plan marks.
    pub async fn apply(
        &self,
        plan: &ReconcilePlan,
        clearance: &Clearance,
    ) -> Result<ReconcileReport, SweepError> {
        let preview = self.preview(plan).await?;
        self.commit(preview, clearance).await
    }

    /// Deletes exactly the `pending` ids of a preview, without reading the
    /// collection again.
    pub async fn commit(
        &self,
        mut preview: ReconcileReport,
        clearance: &Clearance,
    ) -> Result<ReconcileReport, SweepError> {
        let doomed = std::mem::take(&mut preview.pending);
        let mut report = ReconcileReport {
            dry_run: false,
            ..preview
        };

        if doomed.is_empty() {
            info!(collection = %report.collection, "nothing to delete");
            return Ok(report);
        }

        let batches = chunk_ids(&doomed, self.batch_limit);
        let total = batches.len();
        info!(
            collection = %report.collection,
            target = %clearance.target(),
            records = doomed.len(),
            batches = total,
            "deleting"
        );

        for (i, batch) in batches.into_iter().enumerate() {
            let index = i + 1;
            match self.store.delete_batch(&report.collection, &batch).await {
                Ok(()) => {
                    debug!(index, total, size = batch.len(), "batch committed");
                    report.deleted += batch.len();
                    report.batches.push(BatchOutcome::Committed {
                        index,
                        size: batch.len(),
                    });
                    report.deleted_ids.extend(batch);
                }
                Err(e) => {
                    warn!(index, total, size = batch.len(), error = %e, "batch rejected");
                    report.failures.extend(batch.iter().cloned());
                    report.batches.push(BatchOutcome::Rejected {
                        index,
                        ids: batch,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }

    /// Previews `plan` with the settings' protected ids added, then commits
    /// the previewed set. `authorize` is only called when something would be
    /// deleted and the run is not a dry run.
    pub async fn run<F>(
        &self,
        plan: ReconcilePlan,
        settings: &Settings,
        authorize: F,
    ) -> Result<ReconcileReport, SweepError>
    where
        F: FnOnce() -> Result<Clearance, SweepError>,
    {
        let plan = plan.with_protected(settings.protected_ids.iter().cloned());
        let preview = self.preview(&plan).await?;

        if settings.dry_run || preview.pending.is_empty() {
            return Ok(ReconcileReport {
                dry_run: settings.dry_run,
                ..preview
            });
        }

        info!(
            collection = %plan.collection,
            pending = preview.pending.len(),
            "records marked for deletion"
        );
        let clearance = authorize()?;
        self.commit(preview, &clearance).await
    }
}
