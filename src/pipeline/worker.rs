//! Query workers
//!
//! Every worker takes domains from the shared pending and retry queues,
//! runs one check per item, and either reports a result or re-queues the
//! domain with a backoff delay.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::config::RetryPolicy;
use crate::dns::AvailabilityCheck;
use crate::types::QueryResult;

/// A domain waiting for its next attempt
#[derive(Debug, Clone)]
pub struct RetryItem {
    pub domain: String,
    /// Attempts already made
    pub attempts: u32,
    /// Earliest instant the next attempt may start
    pub ready_at: Instant,
}

impl RetryItem {
    fn fresh(domain: String) -> Self {
        Self {
            domain,
            attempts: 0,
            ready_at: Instant::now(),
        }
    }
}

pub(crate) type SharedReceiver<T> = Arc<Mutex<mpsc::Receiver<T>>>;
pub(crate) type SharedRetryReceiver = Arc<Mutex<mpsc::UnboundedReceiver<RetryItem>>>;

pub(crate) struct Worker {
    pub id: usize,
    pub checker: Arc<dyn AvailabilityCheck>,
    pub pending: SharedReceiver<String>,
    pub retry_rx: SharedRetryReceiver,
    pub retry_tx: mpsc::UnboundedSender<RetryItem>,
    pub complete: mpsc::Sender<QueryResult>,
    pub policy: RetryPolicy,
    pub retried: Arc<AtomicU64>,
    pub cancel: CancellationToken,
}

enum Next {
    Item(RetryItem),
    PendingClosed,
    Stop,
}

impl Worker {
    pub(crate) async fn run(self) {
        let mut pending_open = true;
        tracing::trace!(worker = self.id, "Worker started");

        loop {
            let next = if pending_open {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => Next::Stop,
                    domain = recv_shared(&self.pending) => match domain {
                        Some(domain) => Next::Item(RetryItem::fresh(domain)),
                        None => Next::PendingClosed,
                    },
                    item = recv_retry(&self.retry_rx) => item.map_or(Next::Stop, Next::Item),
                }
            } else {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => Next::Stop,
                    item = recv_retry(&self.retry_rx) => item.map_or(Next::Stop, Next::Item),
                }
            };

            let item = match next {
                Next::Item(item) => item,
                Next::PendingClosed => {
                    pending_open = false;
                    continue;
                }
                Next::Stop => break,
            };

            if item.ready_at > Instant::now() {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => break,
                    _ = sleep_until(item.ready_at) => {}
                }
            }

            // No new attempt once shutdown has begun
            if self.cancel.is_cancelled() {
                break;
            }
            if !self.attempt(item).await {
                break;
            }
        }

        tracing::trace!(worker = self.id, "Worker stopped");
    }

    /// Run one attempt. Returns false once results can no longer be delivered.
    async fn attempt(&self, item: RetryItem) -> bool {
        let attempts = item.attempts + 1;

        let result = match self.checker.check(&item.domain).await {
            Ok(code) => QueryResult::answered(item.domain, code, attempts),
            Err(e) if self.policy.allows_retry(attempts) => {
                if e.is_transient() {
                    tracing::debug!(worker = self.id, domain = %item.domain, attempts, error = %e, "Query failed, retrying");
                } else {
                    tracing::warn!(worker = self.id, domain = %item.domain, attempts, error = %e, "Query failed, retrying");
                }
                if self.cancel.is_cancelled() {
                    return false;
                }

                self.retried.fetch_add(1, Ordering::Relaxed);
                let retry = RetryItem {
                    ready_at: Instant::now() + self.policy.backoff(attempts),
                    domain: item.domain,
                    attempts,
                };
                return self.retry_tx.send(retry).is_ok();
            }
            Err(e) => {
                tracing::warn!(worker = self.id, domain = %item.domain, attempts, error = %e, "Giving up on domain");
                QueryResult::failed(item.domain, attempts, e.to_string())
            }
        };

        self.complete.send(result).await.is_ok()
    }
}

async fn recv_shared<T>(rx: &Mutex<mpsc::Receiver<T>>) -> Option<T> {
    rx.lock().await.recv().await
}

async fn recv_retry(rx: &Mutex<mpsc::UnboundedReceiver<RetryItem>>) -> Option<RetryItem> {
    rx.lock().await.recv().await
}
