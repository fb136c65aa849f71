//! Concurrent availability pipeline
//!
//! One producer feeds the pending queue, a pool of workers runs the checks
//! and re-queues failures, and the collector on the calling task writes the
//! results. Every generated domain produces exactly one result unless the
//! run is cancelled.

pub mod collector;
pub mod worker;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio::io::AsyncWrite;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::config::{self, PipelineConfig};
use crate::dns::AvailabilityCheck;
use crate::error::{DomaineratorError, Result};
use crate::internal_error;

pub use collector::{estimate_total, Progress, Tally};
pub use worker::RetryItem;

use collector::Collector;
use worker::Worker;

/// Outcome of a finished or interrupted run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub total: u64,
    pub processed: u64,
    pub written: u64,
    pub available: u64,
    pub failed: u64,
    /// Attempts that were re-queued
    pub retried: u64,
    pub elapsed: Duration,
    pub started_at: DateTime<Utc>,
    pub interrupted: bool,
}

impl RunSummary {
    pub fn is_complete(&self) -> bool {
        !self.interrupted && self.processed == self.total
    }
}

/// Producer, worker pool and collector wired around one checker
pub struct Pipeline {
    checker: Arc<dyn AvailabilityCheck>,
    config: PipelineConfig,
    cancel: CancellationToken,
}

impl Pipeline {
    pub fn new(checker: Arc<dyn AvailabilityCheck>, config: PipelineConfig) -> Self {
        Self {
            checker,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an external token, e.g. one cancelled on Ctrl-C
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Check every domain and write the results to `sink`
    pub async fn run<W, F>(&self, domains: Vec<String>, sink: &mut W, on_progress: F) -> Result<RunSummary>
    where
        W: AsyncWrite + Unpin,
        F: Fn(&Progress),
    {
        if domains.is_empty() {
            return Err(DomaineratorError::NoCandidates);
        }

        let started_at = Utc::now();
        let started = std::time::Instant::now();
        let total = domains.len() as u64;
        let workers = self.config.worker_count();
        let capacity = workers * 2;

        // Stops the pool once the collector is done; an external cancel cascades into it
        let shutdown = self.cancel.child_token();
        let retried = Arc::new(AtomicU64::new(0));

        let (pending_tx, pending_rx) = mpsc::channel::<String>(capacity);
        let (retry_tx, retry_rx) = mpsc::unbounded_channel();
        let (complete_tx, complete_rx) = mpsc::channel(capacity);

        tracing::info!(total, workers, retry = ?self.config.retry, "Starting availability checks");

        let producer = tokio::spawn(produce(domains, pending_tx, shutdown.clone()));

        let pending_rx = Arc::new(Mutex::new(pending_rx));
        let retry_rx = Arc::new(Mutex::new(retry_rx));
        let handles: Vec<_> = (0..workers)
            .map(|id| {
                let worker = Worker {
                    id,
                    checker: Arc::clone(&self.checker),
                    pending: Arc::clone(&pending_rx),
                    retry_rx: Arc::clone(&retry_rx),
                    retry_tx: retry_tx.clone(),
                    complete: complete_tx.clone(),
                    policy: self.config.retry,
                    retried: Arc::clone(&retried),
                    cancel: shutdown.clone(),
                };
                tokio::spawn(worker.run())
            })
            .collect();

        // Workers own the remaining handles, so the complete queue closes once they all stop
        drop(complete_tx);
        drop(retry_tx);
        drop(pending_rx);
        drop(retry_rx);

        let collector = Collector {
            sink,
            output: self.config.output,
            total,
            progress_interval: self.config.progress_interval,
            on_progress,
            cancel: shutdown.clone(),
        };
        let collected = collector.run(complete_rx).await;

        shutdown.cancel();
        let joined = join_all(handles).await;
        let produced = producer.await;

        let tally = collected?;
        if let Some(e) = joined.into_iter().find_map(|r| r.err()) {
            return Err(internal_error!("worker task failed: {}", e));
        }
        if let Err(e) = produced {
            return Err(internal_error!("producer task failed: {}", e));
        }

        let summary = RunSummary {
            total,
            processed: tally.processed,
            written: tally.written,
            available: tally.available,
            failed: tally.failed,
            retried: retried.load(Ordering::Relaxed),
            elapsed: started.elapsed(),
            started_at,
            interrupted: self.cancel.is_cancelled() && tally.processed < total,
        };

        tracing::info!(
            processed = summary.processed,
            written = summary.written,
            available = summary.available,
            failed = summary.failed,
            retried = summary.retried,
            elapsed_ms = config::millis(summary.elapsed),
            interrupted = summary.interrupted,
            "Availability checks finished"
        );
        Ok(summary)
    }
}

/// Feed every domain into the pending queue, then close it
async fn produce(domains: Vec<String>, pending: mpsc::Sender<String>, cancel: CancellationToken) {
    for domain in domains {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Producer cancelled");
                return;
            }
            sent = pending.send(domain) => {
                if sent.is_err() {
                    return;
                }
            }
        }
    }
    tracing::debug!("All domains queued");
}
