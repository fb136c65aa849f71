//! Core types and structures for domainerator

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::str::FromStr;

use crate::error::DomaineratorError;

/// DNS response code (RCODE) of an answered NS query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    NoError,
    FormErr,
    ServFail,
    NXDomain,
    NotImp,
    Refused,
    YXDomain,
    YXRRSet,
    NXRRSet,
    NotAuth,
    NotZone,
    BadSig,
    BadKey,
    BadTime,
    BadMode,
    BadName,
    BadAlg,
    BadTrunc,
    BadCookie,
    Unknown(u16),
}

impl ResponseCode {
    /// Conventional upper-case mnemonic, as printed by dig
    pub fn name(&self) -> String {
        let name = match self {
            ResponseCode::NoError => "NOERROR",
            ResponseCode::FormErr => "FORMERR",
            ResponseCode::ServFail => "SERVFAIL",
            ResponseCode::NXDomain => "NXDOMAIN",
            ResponseCode::NotImp => "NOTIMP",
            ResponseCode::Refused => "REFUSED",
            ResponseCode::YXDomain => "YXDOMAIN",
            ResponseCode::YXRRSet => "YXRRSET",
            ResponseCode::NXRRSet => "NXRRSET",
            ResponseCode::NotAuth => "NOTAUTH",
            ResponseCode::NotZone => "NOTZONE",
            ResponseCode::BadSig => "BADSIG",
            ResponseCode::BadKey => "BADKEY",
            ResponseCode::BadTime => "BADTIME",
            ResponseCode::BadMode => "BADMODE",
            ResponseCode::BadName => "BADNAME",
            ResponseCode::BadAlg => "BADALG",
            ResponseCode::BadTrunc => "BADTRUNC",
            ResponseCode::BadCookie => "BADCOOKIE",
            ResponseCode::Unknown(code) => return format!("RCODE{}", code),
        };
        name.to_string()
    }

    /// NXDOMAIN is the proxy for "likely available for registration"
    pub fn is_available(&self) -> bool {
        *self == ResponseCode::NXDomain
    }
}

impl From<u16> for ResponseCode {
    fn from(value: u16) -> Self {
        match value {
            0 => ResponseCode::NoError,
            1 => ResponseCode::FormErr,
            2 => ResponseCode::ServFail,
            3 => ResponseCode::NXDomain,
            4 => ResponseCode::NotImp,
            5 => ResponseCode::Refused,
            6 => ResponseCode::YXDomain,
            7 => ResponseCode::YXRRSet,
            8 => ResponseCode::NXRRSet,
            9 => ResponseCode::NotAuth,
            10 => ResponseCode::NotZone,
            16 => ResponseCode::BadSig,
            17 => ResponseCode::BadKey,
            18 => ResponseCode::BadTime,
            19 => ResponseCode::BadMode,
            20 => ResponseCode::BadName,
            21 => ResponseCode::BadAlg,
            22 => ResponseCode::BadTrunc,
            23 => ResponseCode::BadCookie,
            other => ResponseCode::Unknown(other),
        }
    }
}

impl From<hickory_proto::op::ResponseCode> for ResponseCode {
    fn from(code: hickory_proto::op::ResponseCode) -> Self {
        ResponseCode::from(u16::from(code))
    }
}

impl std::fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Serialize for ResponseCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name())
    }
}

/// Transport used for NS queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    #[default]
    Udp,
    Tcp,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Udp => write!(f, "udp"),
            Protocol::Tcp => write!(f, "tcp"),
        }
    }
}

impl FromStr for Protocol {
    type Err = DomaineratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "udp" => Ok(Protocol::Udp),
            "tcp" => Ok(Protocol::Tcp),
            other => Err(DomaineratorError::unknown_protocol(other)),
        }
    }
}

/// How a DNS server is picked for each query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerSelection {
    /// Uniformly random server per query
    #[default]
    Random,
    /// Rotate through the server list, one step per query
    RoundRobin,
}

impl std::fmt::Display for ServerSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerSelection::Random => write!(f, "random"),
            ServerSelection::RoundRobin => write!(f, "round-robin"),
        }
    }
}

impl FromStr for ServerSelection {
    type Err = DomaineratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "random" => Ok(ServerSelection::Random),
            "round-robin" | "roundrobin" | "rr" => Ok(ServerSelection::RoundRobin),
            other => Err(DomaineratorError::config(format!(
                "Unknown server selection '{}' (expected random or round-robin)",
                other
            ))),
        }
    }
}

/// Final outcome of one domain's query chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "rcode", rename_all = "lowercase")]
pub enum QueryOutcome {
    /// The server answered with this response code
    Answered(ResponseCode),
    /// Every attempt failed and the retry budget is spent
    Failed,
}

impl std::fmt::Display for QueryOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryOutcome::Answered(code) => write!(f, "{}", code),
            QueryOutcome::Failed => write!(f, "FAILED"),
        }
    }
}

/// Availability check result for one candidate domain
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub domain: String,
    pub outcome: QueryOutcome,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl QueryResult {
    pub fn answered(domain: impl Into<String>, code: ResponseCode, attempts: u32) -> Self {
        Self {
            domain: domain.into(),
            outcome: QueryOutcome::Answered(code),
            attempts,
            error: None,
            checked_at: Utc::now(),
        }
    }

    pub fn failed(domain: impl Into<String>, attempts: u32, error: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            outcome: QueryOutcome::Failed,
            attempts,
            error: Some(error.into()),
            checked_at: Utc::now(),
        }
    }

    /// True when the domain answered NXDOMAIN
    pub fn is_available(&self) -> bool {
        matches!(self.outcome, QueryOutcome::Answered(code) if code.is_available())
    }

    pub fn is_failed(&self) -> bool {
        self.outcome == QueryOutcome::Failed
    }

    /// Format for the output file
    pub fn to_line(&self, format: OutputFormat) -> crate::error::Result<String> {
        let line = match format {
            OutputFormat::Simple => format!("{}\n", self.domain),
            OutputFormat::Verbose => format!(
                "{}\t{}\t{:?}\n",
                self.domain,
                self.outcome,
                self.error.as_deref().unwrap_or("")
            ),
            OutputFormat::Json => format!("{}\n", serde_json::to_string(self)?),
        };
        Ok(line)
    }
}

/// Output line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `domain\n`
    #[default]
    Simple,
    /// `domain\tRCODE\t"error"\n`
    Verbose,
    /// One JSON object per line
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Simple => write!(f, "simple"),
            OutputFormat::Verbose => write!(f, "verbose"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
