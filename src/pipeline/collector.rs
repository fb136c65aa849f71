//! Result collector
//!
//! The only owner of the output sink. Counts every result against the
//! total, writes the ones that pass the availability filter and reports
//! progress.

use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::OutputConfig;
use crate::error::{DomaineratorError, Result};
use crate::types::QueryResult;

/// Progress snapshot handed to the progress callback
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub processed: u64,
    pub total: u64,
    pub written: u64,
    pub available: u64,
    pub failed: u64,
    pub elapsed: Duration,
    /// Projected duration of the whole run
    pub estimated_total: Option<Duration>,
    pub estimated_remaining: Option<Duration>,
}

impl Progress {
    fn new(tally: &Tally, total: u64, elapsed: Duration) -> Self {
        let estimated_total = estimate_total(elapsed, tally.processed, total);
        Self {
            processed: tally.processed,
            total,
            written: tally.written,
            available: tally.available,
            failed: tally.failed,
            elapsed,
            estimated_total,
            estimated_remaining: estimated_total.map(|t| t.saturating_sub(elapsed)),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.processed >= self.total
    }
}

/// `elapsed * total / processed`, undefined before the first result
pub fn estimate_total(elapsed: Duration, processed: u64, total: u64) -> Option<Duration> {
    if processed == 0 {
        return None;
    }
    Some(Duration::from_secs_f64(elapsed.as_secs_f64() * total as f64 / processed as f64))
}

/// Counters kept by the collector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub processed: u64,
    pub written: u64,
    pub available: u64,
    pub failed: u64,
}

pub(crate) struct Collector<'a, W, F> {
    pub sink: &'a mut W,
    pub output: OutputConfig,
    pub total: u64,
    pub progress_interval: u64,
    pub on_progress: F,
    pub cancel: CancellationToken,
}

impl<'a, W, F> Collector<'a, W, F>
where
    W: AsyncWrite + Unpin,
    F: Fn(&Progress),
{
    /// Drain `complete` until every domain is accounted for or the queue closes
    pub(crate) async fn run(self, mut complete: mpsc::Receiver<QueryResult>) -> Result<Tally> {
        let started = Instant::now();
        let interval = self.progress_interval.max(1);
        let mut tally = Tally::default();

        while tally.processed < self.total {
            let Some(result) = complete.recv().await else {
                tracing::debug!(processed = tally.processed, total = self.total, "Complete queue closed early");
                break;
            };

            tally.processed += 1;
            if result.is_available() {
                tally.available += 1;
            }
            if result.is_failed() {
                tally.failed += 1;
            }

            if self.output.should_write(&result) {
                let line = match result.to_line(self.output.format) {
                    Ok(line) => line,
                    Err(e) => {
                        self.cancel.cancel();
                        return Err(e);
                    }
                };
                if let Err(e) = self.sink.write_all(line.as_bytes()).await {
                    self.cancel.cancel();
                    return Err(DomaineratorError::output_write(e.to_string()));
                }
                tally.written += 1;
            }

            if tally.processed % interval == 0 && tally.processed < self.total {
                (self.on_progress)(&Progress::new(&tally, self.total, started.elapsed()));
            }
        }

        if let Err(e) = self.sink.flush().await {
            self.cancel.cancel();
            return Err(DomaineratorError::output_write(e.to_string()));
        }

        (self.on_progress)(&Progress::new(&tally, self.total, started.elapsed()));
        Ok(tally)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_total() {
        assert_eq!(estimate_total(Duration::from_secs(10), 0, 100), None);
        assert_eq!(
            estimate_total(Duration::from_secs(10), 25, 100),
            Some(Duration::from_secs(40))
        );
    }

    #[test]
    fn test_progress_remaining() {
        let tally = Tally {
            processed: 50,
            ..Tally::default()
        };
        let progress = Progress::new(&tally, 100, Duration::from_secs(30));
        assert_eq!(progress.estimated_total, Some(Duration::from_secs(60)));
        assert_eq!(progress.estimated_remaining, Some(Duration::from_secs(30)));
        assert!(!progress.is_complete());
    }
}
