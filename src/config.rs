//! Run configuration
//!
//! Built once at startup from the command line and passed by reference to
//! the generator, checker and pipeline. Nothing mutates it afterwards.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::dns::{self, DEFAULT_DNS_SERVERS};
use crate::error::Result;
use crate::generator::GenerateOptions;
use crate::suffix::DEFAULT_PUBLIC_SUFFIXES;
use crate::types::{OutputFormat, Protocol, ServerSelection};

pub const DEFAULT_WORKERS: usize = 50;
pub const MAX_WORKERS: usize = 1000;
pub const DEFAULT_TIMEOUT_MS: u64 = 4000;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_BACKOFF_MS: u64 = 250;
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 5000;
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 10;

/// Complete immutable configuration of one run
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub input: InputConfig,
    pub generate: GenerateOptions,
    pub check: CheckConfig,
    pub pipeline: PipelineConfig,
}

/// Where the words and suffixes come from and where results go
#[derive(Debug, Clone)]
pub struct InputConfig {
    pub prefixes: PathBuf,
    pub suffixes: PathBuf,
    pub output: PathBuf,
    /// Comma separated public suffixes
    pub public_suffixes: String,
    /// Add every known bare TLD to the suffix list
    pub include_tlds: bool,
    /// Regex every word must match
    pub word_filter: Option<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            prefixes: PathBuf::new(),
            suffixes: PathBuf::new(),
            output: PathBuf::new(),
            public_suffixes: DEFAULT_PUBLIC_SUFFIXES.to_string(),
            include_tlds: false,
            word_filter: None,
        }
    }
}

/// DNS checker settings
#[derive(Debug, Clone)]
pub struct CheckConfig {
    pub servers: Vec<SocketAddr>,
    pub protocol: Protocol,
    /// Per-attempt timeout
    pub timeout: Duration,
    pub selection: ServerSelection,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            servers: dns::parse_dns_servers(DEFAULT_DNS_SERVERS).unwrap_or_default(),
            protocol: Protocol::Udp,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            selection: ServerSelection::Random,
        }
    }
}

impl CheckConfig {
    /// Parse servers and protocol from their command line form
    pub fn from_args(servers: &str, protocol: &str, timeout_ms: u64, selection: ServerSelection) -> Result<Self> {
        Ok(Self {
            servers: dns::parse_dns_servers(servers)?,
            protocol: protocol.parse()?,
            timeout: Duration::from_millis(timeout_ms),
            selection,
        })
    }
}

/// How failed attempts are retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per domain including the first. `None` retries forever.
    pub max_attempts: Option<u32>,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
            base_backoff: Duration::from_millis(DEFAULT_BACKOFF_MS),
            max_backoff: Duration::from_millis(DEFAULT_MAX_BACKOFF_MS),
        }
    }
}

impl RetryPolicy {
    /// Retry immediately, forever
    pub fn unbounded() -> Self {
        Self {
            max_attempts: None,
            base_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Whether a domain that failed `attempts` times may be tried again
    pub fn allows_retry(&self, attempts: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempts < max)
    }

    /// Delay before the retry that follows failed attempt number `attempt`
    pub fn backoff(&self, attempt: u32) -> Duration {
        if self.base_backoff.is_zero() || attempt == 0 {
            return Duration::ZERO;
        }
        let exponent = (attempt - 1).min(16);
        self.base_backoff
            .checked_mul(1u32 << exponent)
            .map_or(self.max_backoff, |d| d.min(self.max_backoff))
    }
}

/// Worker pool and collector settings
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub workers: usize,
    pub retry: RetryPolicy,
    pub output: OutputConfig,
    /// Report progress every this many results
    pub progress_interval: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            retry: RetryPolicy::default(),
            output: OutputConfig::default(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl PipelineConfig {
    /// Worker count clamped to the supported range
    pub fn worker_count(&self) -> usize {
        self.workers.clamp(1, MAX_WORKERS)
    }
}

/// What the collector writes
#[derive(Debug, Clone, Copy)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Persist only NXDOMAIN results
    pub avail_only: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Simple,
            avail_only: true,
        }
    }
}

impl OutputConfig {
    pub fn should_write(&self, result: &crate::types::QueryResult) -> bool {
        !self.avail_only || result.is_available()
    }
}

/// Whole milliseconds in `d`, saturating at `u64::MAX`
pub fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
