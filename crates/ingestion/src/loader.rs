//! Idempotent batch loader
//!
//! Drives bulk insertion of canonical records into the external store:
//! at-most-once-per-identity delivery, a hard bound on unflushed records, and
//! per-record failure collection that never aborts the run.
//!
//! Submissions pass through one `&mut self` path, so identity checks are
//! always serialized with any flush of the same key. Dropping the loader
//! mid-run is equivalent to cutting the source stream short; the store is
//! left in a valid, re-ingestable state.

use crate::fingerprint::fingerprint;
use crate::normalizer::CanonicalRecord;
use crate::report::{FailureReport, RunReport};
use crate::store::{StorePoint, VectorStore};
use crate::{IngestionError, Result};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Batch loader tuning knobs
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Flush whenever this many records are buffered
    pub batch_size: usize,
    /// Upper bound on one bulk upsert call
    pub flush_timeout: Duration,
    /// Stop accepting records after this many submissions
    pub max_objects: Option<usize>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 200,
            flush_timeout: Duration::from_secs(30),
            max_objects: Some(20_000),
        }
    }
}

/// Delivers a stream of canonical records to the external store
pub struct BatchLoader<S: VectorStore> {
    store: S,
    config: LoaderConfig,
    buffer: Vec<(Uuid, CanonicalRecord)>,
    buffered_keys: HashSet<Uuid>,
    seen: u64,
    stored: u64,
    duplicates: u64,
    skipped: u64,
    failures: FailureReport,
    finished: bool,
}

impl<S: VectorStore> BatchLoader<S> {
    pub fn new(store: S, config: LoaderConfig) -> Result<Self> {
        if config.batch_size == 0 {
            return Err(IngestionError::ConfigError(
                "batch_size must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            store,
            config,
            buffer: Vec::new(),
            buffered_keys: HashSet::new(),
            seen: 0,
            stored: 0,
            duplicates: 0,
            skipped: 0,
            failures: FailureReport::new(),
            finished: false,
        })
    }

    /// Whether the run has reached its configured submission cap
    pub fn at_capacity(&self) -> bool {
        self.config
            .max_objects
            .is_some_and(|max| self.seen >= max as u64)
    }

    /// Failures collected so far
    pub fn failures(&self) -> &FailureReport {
        &self.failures
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Count a row the normalizer rejected; it is seen but never stored
    pub fn record_skipped(&mut self) -> Result<()> {
        self.ensure_active()?;
        self.seen += 1;
        self.skipped += 1;
        Ok(())
    }

    /// Submit one record for storage.
    ///
    /// Computes the record's identity key, skips it if the store already
    /// holds that key (at-most-once delivery under retried or overlapping
    /// runs), and otherwise buffers it. Reaching the configured batch size
    /// triggers a synchronous flush before returning.
    pub async fn submit(&mut self, record: CanonicalRecord) -> Result<()> {
        self.ensure_active()?;
        self.seen += 1;

        let key = fingerprint(&record)?;

        if self.buffered_keys.contains(&key) {
            debug!(%key, "duplicate of a buffered record, skipping");
            self.duplicates += 1;
            return Ok(());
        }

        match self.store.exists(key).await {
            Ok(true) => {
                debug!(%key, "already present in store, skipping");
                self.duplicates += 1;
                return Ok(());
            }
            Ok(false) => {}
            // Presence is only an optimization over the store's keyed upsert;
            // on a failed check the record is sent anyway.
            Err(e) => warn!(%key, "presence check failed, submitting anyway: {}", e),
        }

        self.buffer.push((key, record));
        self.buffered_keys.insert(key);

        if self.buffer.len() >= self.config.batch_size {
            self.flush().await?;
        }

        Ok(())
    }

    /// Flush any remaining partial batch and report the run's totals.
    ///
    /// Every loader operation after this one fails with `AlreadyFinished`.
    pub async fn finish(&mut self) -> Result<RunReport> {
        self.ensure_active()?;
        self.flush().await?;
        self.finished = true;

        info!(
            seen = self.seen,
            stored = self.stored,
            duplicates = self.duplicates,
            skipped = self.skipped,
            failed = self.failures.len(),
            "ingestion run finished"
        );

        Ok(RunReport {
            seen: self.seen,
            stored: self.stored,
            duplicates: self.duplicates,
            skipped: self.skipped,
            failures: self.failures.clone(),
        })
    }

    /// Submit the current batch to the store as one bulk operation.
    ///
    /// The buffer is cleared unconditionally afterward: a failed item is not
    /// retried automatically, since blind retry can mask systematic schema
    /// errors. A timeout or whole-call store failure leaves every item's fate
    /// unknown and is recorded as a failure for each; a subsequent idempotent
    /// re-run resolves those safely.
    async fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let batch: Vec<(Uuid, CanonicalRecord)> = std::mem::take(&mut self.buffer);
        self.buffered_keys.clear();

        let mut points = Vec::with_capacity(batch.len());
        for (key, record) in &batch {
            points.push(StorePoint::from_record(*key, record)?);
        }

        debug!("Flushing batch of {} records", points.len());

        match tokio::time::timeout(self.config.flush_timeout, self.store.bulk_upsert(points)).await
        {
            Ok(Ok(outcomes)) => {
                for outcome in outcomes {
                    match outcome {
                        crate::store::ItemOutcome::Stored(_) => self.stored += 1,
                        crate::store::ItemOutcome::Rejected { key, reason } => {
                            self.failures.push(key, reason);
                        }
                    }
                }
            }
            Ok(Err(e)) => {
                warn!("Batch upsert failed: {}", e);
                let reason = e.to_string();
                for (key, _) in &batch {
                    self.failures.push(*key, reason.clone());
                }
            }
            Err(_) => {
                warn!(
                    "Batch upsert timed out after {:?}",
                    self.config.flush_timeout
                );
                let reason = format!(
                    "store call timed out after {}s",
                    self.config.flush_timeout.as_secs_f64()
                );
                for (key, _) in &batch {
                    self.failures.push(*key, reason.clone());
                }
            }
        }

        Ok(())
    }

    fn ensure_active(&self) -> Result<()> {
        if self.finished {
            Err(IngestionError::AlreadyFinished)
        } else {
            Ok(())
        }
    }
}
