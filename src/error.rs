//! Error handling for domainerator

use thiserror::Error;

/// Main error type for domainerator
#[derive(Error, Debug, Clone)]
pub enum DomaineratorError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Word list error ({path}): {message}")]
    WordList {
        path: String,
        message: String,
        kind: WordListKind,
    },

    #[error("Invalid word filter '{pattern}': {message}")]
    Filter { pattern: String, message: String },

    #[error("Public Suffix {suffix:?} is unknown")]
    UnknownSuffix { suffix: String },

    #[error("Empty Public Suffix list")]
    EmptySuffixList,

    #[error("You need to specify a DNS server")]
    NoDnsServers,

    #[error("Invalid DNS server '{server}': {message}")]
    InvalidDnsServer { server: String, message: String },

    #[error("Unknown protocol '{protocol}' (expected udp or tcp)")]
    UnknownProtocol { protocol: String },

    #[error("Cannot create output file {path}: {message}")]
    OutputCreate { path: String, message: String },

    #[error("Cannot write output: {message}")]
    OutputWrite { message: String },

    #[error("No domains were generated with the given word lists and options")]
    NoCandidates,

    #[error("DNS query for '{domain}' at {server} failed: {message}")]
    Query {
        domain: String,
        server: String,
        message: String,
    },

    #[error("Timeout error: {operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Network error: {message}")]
    Network {
        message: String,
        status_code: Option<u16>,
        url: Option<String>,
    },

    #[error("Parse error: {message}")]
    Parse {
        message: String,
        content: Option<String>,
    },

    #[error("IO error: {message}")]
    Io {
        message: String,
        path: Option<String>,
    },

    #[error("Run interrupted")]
    Interrupted,

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Which word list a [`DomaineratorError::WordList`] refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordListKind {
    Prefixes,
    Suffixes,
}

impl std::fmt::Display for WordListKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WordListKind::Prefixes => write!(f, "prefixes"),
            WordListKind::Suffixes => write!(f, "suffixes"),
        }
    }
}

impl DomaineratorError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a word list error
    pub fn word_list(kind: WordListKind, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WordList {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create an invalid filter error
    pub fn filter(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Filter {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create an unknown public suffix error
    pub fn unknown_suffix(suffix: impl Into<String>) -> Self {
        Self::UnknownSuffix {
            suffix: suffix.into(),
        }
    }

    /// Create an invalid DNS server error
    pub fn invalid_dns_server(server: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDnsServer {
            server: server.into(),
            message: message.into(),
        }
    }

    /// Create an unknown protocol error
    pub fn unknown_protocol(protocol: impl Into<String>) -> Self {
        Self::UnknownProtocol {
            protocol: protocol.into(),
        }
    }

    /// Create an output creation error
    pub fn output_create(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::OutputCreate {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an output write error
    pub fn output_write(message: impl Into<String>) -> Self {
        Self::OutputWrite {
            message: message.into(),
        }
    }

    /// Create a DNS query error
    pub fn query(
        domain: impl Into<String>,
        server: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Query {
            domain: domain.into(),
            server: server.into(),
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Create a network error
    pub fn network(
        message: impl Into<String>,
        status_code: Option<u16>,
        url: Option<String>,
    ) -> Self {
        Self::Network {
            message: message.into(),
            status_code,
            url,
        }
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>, content: Option<String>) -> Self {
        Self::Parse {
            message: message.into(),
            content,
        }
    }

    /// Create an IO error
    pub fn io(message: impl Into<String>, path: Option<String>) -> Self {
        Self::Io {
            message: message.into(),
            path,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error comes from a single DNS attempt and is worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Query { .. } | Self::Timeout { .. } | Self::Network { .. } | Self::Parse { .. }
        )
    }

    /// Process exit code for fatal errors. Every fatal precondition has its own code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::WordList {
                kind: WordListKind::Prefixes,
                ..
            } => 10,
            Self::WordList {
                kind: WordListKind::Suffixes,
                ..
            } => 11,
            Self::Filter { .. } => 12,
            Self::UnknownSuffix { .. } | Self::EmptySuffixList => 20,
            Self::NoDnsServers | Self::InvalidDnsServer { .. } => 30,
            Self::UnknownProtocol { .. } => 31,
            Self::Config { .. } => 32,
            Self::OutputCreate { .. } => 40,
            Self::OutputWrite { .. } => 41,
            Self::NoCandidates => 50,
            Self::Interrupted => 130,
            _ => 1,
        }
    }

    /// Get user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            Self::Config { message } => {
                format!("❌ Configuration problem: {}\n💡 Use --help for usage information", message)
            }
            Self::WordList { kind, path, message } => {
                format!("❌ Cannot load {} word list '{}': {}\n💡 Use one word per line", kind, path, message)
            }
            Self::Filter { pattern, message } => {
                format!("❌ Invalid word filter '{}': {}", pattern, message)
            }
            Self::UnknownSuffix { suffix } => {
                format!("❌ Public Suffix {:?} is unknown\n💡 Run update-suffixes to refresh the bundled list", suffix)
            }
            Self::EmptySuffixList => "❌ The Public Suffix list is empty\n💡 Pass --ps com,net,org".to_string(),
            Self::NoDnsServers => "❌ You need to specify a DNS server\n💡 Pass --dns 8.8.8.8,1.1.1.1".to_string(),
            Self::InvalidDnsServer { server, message } => {
                format!("❌ Invalid DNS server '{}': {}", server, message)
            }
            Self::UnknownProtocol { protocol } => {
                format!("❌ Unknown protocol '{}'\n💡 Use udp or tcp", protocol)
            }
            Self::OutputCreate { path, message } => {
                format!("❌ Cannot create output file '{}': {}\n💡 Check file permissions and paths", path, message)
            }
            Self::OutputWrite { message } => {
                format!("❌ Writing results failed: {}\n💡 Check free disk space", message)
            }
            Self::NoCandidates => {
                "❌ No domains were generated\n💡 Relax --minlen/--maxlen or enable --single".to_string()
            }
            Self::Query { domain, server, message } => {
                format!("⚠️  Could not query '{}' at {}: {}", domain, server, message)
            }
            Self::Timeout { operation, timeout_ms } => {
                format!("⏱️  Operation '{}' timed out after {}ms\n💡 Try increasing --timeout-ms or reducing concurrency", operation, timeout_ms)
            }
            Self::Network { message, status_code, .. } => {
                let status = status_code.map_or(String::new(), |c| format!(" ({})", c));
                format!("❌ Network error{}: {}\n💡 Check your internet connection", status, message)
            }
            Self::Parse { message, .. } => {
                format!("❌ Parse error: {}", message)
            }
            Self::Io { message, path } => {
                let path_info = path.as_ref().map_or(String::new(), |p| format!(" ({})", p));
                format!("❌ File error{}: {}\n💡 Check file permissions and paths", path_info, message)
            }
            Self::Interrupted => "⚡ Interrupted, partial results were written".to_string(),
            Self::Internal { message } => {
                format!("❌ Internal error: {}\n💡 This is a bug, please report it", message)
            }
        }
    }
}

/// Convert from common error types
impl From<reqwest::Error> for DomaineratorError {
    fn from(err: reqwest::Error) -> Self {
        let status_code = err.status().map(|s| s.as_u16());
        let url = err.url().map(|u| u.to_string());

        if err.is_timeout() {
            Self::timeout("HTTP request", 30_000)
        } else if err.is_connect() {
            Self::network("Connection failed", status_code, url)
        } else {
            Self::network(err.to_string(), status_code, url)
        }
    }
}

impl From<serde_json::Error> for DomaineratorError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(err.to_string(), None)
    }
}

impl From<std::io::Error> for DomaineratorError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string(), None)
    }
}

impl From<hickory_proto::error::ProtoError> for DomaineratorError {
    fn from(err: hickory_proto::error::ProtoError) -> Self {
        Self::parse(err.to_string(), None)
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, DomaineratorError>;

/// Helper macros for common error patterns
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::error::DomaineratorError::config($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::DomaineratorError::config(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! internal_error {
    ($msg:expr) => {
        $crate::error::DomaineratorError::internal($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::DomaineratorError::internal(format!($fmt, $($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let errors = [
            DomaineratorError::word_list(WordListKind::Prefixes, "p.txt", "empty"),
            DomaineratorError::word_list(WordListKind::Suffixes, "s.txt", "empty"),
            DomaineratorError::filter("(", "unclosed group"),
            DomaineratorError::unknown_suffix("unk"),
            DomaineratorError::NoDnsServers,
            DomaineratorError::unknown_protocol("sctp"),
            DomaineratorError::config("bad value"),
            DomaineratorError::output_create("/nope/out.txt", "denied"),
            DomaineratorError::output_write("disk full"),
            DomaineratorError::NoCandidates,
        ];
        let mut codes: Vec<i32> = errors.iter().map(|e| e.exit_code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
        assert!(codes.iter().all(|&c| c != 0));
    }

    #[test]
    fn test_transient_errors() {
        assert!(DomaineratorError::timeout("NS query", 4000).is_transient());
        assert!(DomaineratorError::query("x.com", "8.8.8.8:53", "refused").is_transient());
        assert!(!DomaineratorError::NoCandidates.is_transient());
        assert!(!DomaineratorError::output_write("broken pipe").is_transient());
    }

    #[test]
    fn test_unknown_suffix_message() {
        let err = DomaineratorError::unknown_suffix("unk");
        assert_eq!(err.to_string(), "Public Suffix \"unk\" is unknown");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = DomaineratorError::from(json_err);
        assert!(matches!(err, DomaineratorError::Parse { .. }));
        assert_eq!(err.exit_code(), 1);
    }
}
