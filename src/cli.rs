//! Command line interface

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use crate::config::{
    CheckConfig, Config, InputConfig, OutputConfig, PipelineConfig, RetryPolicy, DEFAULT_BACKOFF_MS,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_BACKOFF_MS, DEFAULT_PROGRESS_INTERVAL, DEFAULT_TIMEOUT_MS,
    DEFAULT_WORKERS,
};
use crate::config_error;
use crate::dns::DEFAULT_DNS_SERVERS;
use crate::error::Result;
use crate::generator::GenerateOptions;
use crate::suffix::DEFAULT_PUBLIC_SUFFIXES;
use crate::types::{OutputFormat, ServerSelection};

/// Combine word lists into domain names and check which ones are free
#[derive(Parser, Debug, Clone)]
#[command(name = "domainerator")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate domain names from word lists and check their availability over DNS")]
pub struct Cli {
    /// File with one prefix word per line
    #[arg(value_name = "PREFIXES")]
    pub prefixes: PathBuf,

    /// File with one suffix word per line
    #[arg(value_name = "SUFFIXES")]
    pub suffixes: PathBuf,

    /// File the results are written to
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Also combine single words with the public suffixes
    #[arg(long, help_heading = "Generation")]
    pub single: bool,

    /// Allow a word to be combined with itself
    #[arg(long, help_heading = "Generation")]
    pub itself: bool,

    /// Also generate hyphenated names
    #[arg(long, help_heading = "Generation")]
    pub hyphen: bool,

    /// Generate domain hacks (ind.ex)
    #[arg(long, help_heading = "Generation")]
    pub hacks: bool,

    /// Fuse overlapping words (data + taxi = dataxi)
    #[arg(long, help_heading = "Generation")]
    pub fuse: bool,

    /// Add every known top level domain to the public suffixes
    #[arg(long, help_heading = "Generation")]
    pub tlds: bool,

    /// Allow non-ASCII domain names
    #[arg(long, help_heading = "Generation")]
    pub utf8: bool,

    /// Comma separated public suffixes
    #[arg(long, env = "DOMAINERATOR_PS", default_value = DEFAULT_PUBLIC_SUFFIXES, help_heading = "Generation")]
    pub ps: String,

    /// Maximum domain length
    #[arg(long, default_value_t = 64, help_heading = "Generation")]
    pub maxlen: usize,

    /// Minimum length of combined labels
    #[arg(long, default_value_t = 3, help_heading = "Generation")]
    pub minlen: usize,

    /// Drop names registrars refuse, like com.net
    #[arg(long, default_value_t = true, action = ArgAction::Set, value_name = "BOOL", help_heading = "Generation")]
    pub strict: bool,

    /// Keep only words matching this regex
    #[arg(long, value_name = "REGEX", help_heading = "Generation")]
    pub filter: Option<String>,

    /// Comma separated DNS servers (ip or ip:port)
    #[arg(long, env = "DOMAINERATOR_DNS", default_value = DEFAULT_DNS_SERVERS, help_heading = "Checking")]
    pub dns: String,

    /// Transport for DNS queries: udp or tcp
    #[arg(long, default_value = "udp", help_heading = "Checking")]
    pub proto: String,

    /// How servers are picked per query: random or round-robin
    #[arg(long, default_value = "random", help_heading = "Checking")]
    pub pick: String,

    /// Number of concurrent workers
    #[arg(short = 'c', long = "concurrency", default_value_t = DEFAULT_WORKERS, help_heading = "Checking")]
    pub concurrency: usize,

    /// Attempts per domain, 0 retries until an answer arrives
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS, help_heading = "Checking")]
    pub retries: u32,

    /// Base delay before a retry, doubled on every failure
    #[arg(long = "backoff-ms", default_value_t = DEFAULT_BACKOFF_MS, help_heading = "Checking")]
    pub backoff_ms: u64,

    /// Timeout of a single query
    #[arg(long = "timeout-ms", default_value_t = DEFAULT_TIMEOUT_MS, help_heading = "Checking")]
    pub timeout_ms: u64,

    /// Write only available domains
    #[arg(long, default_value_t = true, action = ArgAction::Set, value_name = "BOOL", help_heading = "Output")]
    pub avail: bool,

    /// Write JSON lines
    #[arg(long, help_heading = "Output")]
    pub json: bool,

    /// Hide the progress bar
    #[arg(short, long, help_heading = "Output")]
    pub quiet: bool,

    /// More logging (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, help_heading = "Output")]
    pub verbose: u8,
}

impl Cli {
    /// Validate the arguments and build the run configuration
    pub fn into_config(self) -> Result<Config> {
        if self.maxlen == 0 {
            return Err(config_error!("--maxlen must be greater than zero"));
        }
        if self.minlen > self.maxlen {
            return Err(config_error!(
                "--minlen ({}) cannot exceed --maxlen ({})",
                self.minlen,
                self.maxlen
            ));
        }
        if self.timeout_ms == 0 {
            return Err(config_error!("--timeout-ms must be greater than zero"));
        }

        let selection: ServerSelection = self.pick.parse()?;
        let check = CheckConfig::from_args(&self.dns, &self.proto, self.timeout_ms, selection)?;

        let format = if self.json {
            OutputFormat::Json
        } else if self.avail {
            OutputFormat::Simple
        } else {
            OutputFormat::Verbose
        };

        let retry = RetryPolicy {
            max_attempts: (self.retries > 0).then_some(self.retries),
            base_backoff: Duration::from_millis(self.backoff_ms),
            max_backoff: Duration::from_millis(DEFAULT_MAX_BACKOFF_MS.max(self.backoff_ms)),
        };

        Ok(Config {
            input: InputConfig {
                prefixes: self.prefixes,
                suffixes: self.suffixes,
                output: self.output,
                public_suffixes: self.ps,
                include_tlds: self.tlds,
                word_filter: self.filter,
            },
            generate: GenerateOptions {
                include_single_words: self.single,
                hyphenate: self.hyphen,
                include_self_pairing: self.itself,
                domain_hacks: self.hacks,
                fuse: self.fuse,
                min_label_length: self.minlen,
                max_domain_length: self.maxlen,
                allow_utf8: self.utf8,
                strict: self.strict,
            },
            check,
            pipeline: PipelineConfig {
                workers: self.concurrency,
                retry,
                output: OutputConfig {
                    format,
                    avail_only: self.avail,
                },
                progress_interval: DEFAULT_PROGRESS_INTERVAL,
            },
        })
    }

    /// Log filter for the `-v` count; `RUST_LOG` wins when set
    pub fn log_filter(&self) -> EnvFilter {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return filter;
        }
        match self.verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    }
}
