//! Domainerator - domain name generation and DNS availability checking
//!
//! Combines word lists with public suffixes and checks every candidate with
//! an NS query through a pool of concurrent workers.

pub mod cli;
pub mod config;
pub mod dns;
pub mod error;
pub mod generator;
pub mod pipeline;
pub mod suffix;
pub mod types;
pub mod wordlist;

// Re-export commonly used types
pub use config::{CheckConfig, Config, OutputConfig, PipelineConfig, RetryPolicy};
pub use error::{DomaineratorError, Result, WordListKind};
pub use types::{OutputFormat, Protocol, QueryOutcome, QueryResult, ResponseCode, ServerSelection};

// Re-export main functionality
pub use dns::{AvailabilityCheck, DnsChecker};
pub use generator::{DomainGenerator, GenerateOptions};
pub use pipeline::{Pipeline, Progress, RunSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library
pub fn init() -> Result<()> {
    // Load .env file if it exists
    dotenv::dotenv().ok();
    Ok(())
}
