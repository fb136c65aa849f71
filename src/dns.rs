//! DNS NS availability checker
//!
//! One NS query per attempt, sent straight to a recursive resolver over UDP
//! or TCP. Only the response code matters: NXDOMAIN means the name is not
//! delegated and is likely available.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{Name, RecordType};
use rand::seq::SliceRandom;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tokio::time::timeout;

use crate::config::{self, CheckConfig};
use crate::error::{DomaineratorError, Result};
use crate::types::{Protocol, ResponseCode, ServerSelection};
use crate::wordlist;

/// Resolvers used when none are configured
pub const DEFAULT_DNS_SERVERS: &str = "8.8.8.8,8.8.4.4,4.2.2.1,4.2.2.2,4.2.2.3,4.2.2.4,4.2.2.5,4.2.2.6,198.153.192.1,198.153.194.1,67.138.54.100,207.225.209.66";

pub const DNS_PORT: u16 = 53;

const MAX_UDP_PAYLOAD: usize = 4096;

/// Seam between the worker pool and the network
#[async_trait]
pub trait AvailabilityCheck: Send + Sync {
    /// Run one query attempt for `domain`
    async fn check(&self, domain: &str) -> Result<ResponseCode>;
}

/// Checker issuing NS queries against the configured resolvers
#[derive(Debug)]
pub struct DnsChecker {
    config: CheckConfig,
    next_server: AtomicUsize,
}

impl DnsChecker {
    pub fn new(config: CheckConfig) -> Result<Self> {
        if config.servers.is_empty() {
            return Err(DomaineratorError::NoDnsServers);
        }
        Ok(Self {
            config,
            next_server: AtomicUsize::new(0),
        })
    }

    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    /// Pick the server for the next query
    pub fn pick_server(&self) -> Result<SocketAddr> {
        let servers = &self.config.servers;
        match self.config.selection {
            ServerSelection::Random => servers
                .choose(&mut rand::thread_rng())
                .copied()
                .ok_or(DomaineratorError::NoDnsServers),
            ServerSelection::RoundRobin => {
                if servers.is_empty() {
                    return Err(DomaineratorError::NoDnsServers);
                }
                let index = self.next_server.fetch_add(1, Ordering::Relaxed) % servers.len();
                Ok(servers[index])
            }
        }
    }

    /// Query `server` for the NS records of `domain`
    pub async fn query(&self, domain: &str, server: SocketAddr) -> Result<ResponseCode> {
        let id: u16 = rand::random();
        let packet = build_query(domain, id)?;
        let timeout_ms = config::millis(self.config.timeout);

        let exchange = async {
            match self.config.protocol {
                Protocol::Udp => exchange_udp(server, &packet, id).await,
                Protocol::Tcp => exchange_tcp(server, &packet, id).await,
            }
        };

        match timeout(self.config.timeout, exchange).await {
            Ok(Ok(code)) => {
                tracing::trace!(domain = %domain, server = %server, rcode = %code, "NS query answered");
                Ok(code)
            }
            Ok(Err(e)) => Err(DomaineratorError::query(domain, server.to_string(), e.to_string())),
            Err(_) => Err(DomaineratorError::timeout(
                format!("NS query for {} at {}", domain, server),
                timeout_ms,
            )),
        }
    }
}

#[async_trait]
impl AvailabilityCheck for DnsChecker {
    async fn check(&self, domain: &str) -> Result<ResponseCode> {
        let server = self.pick_server()?;
        self.query(domain, server).await
    }
}

/// Encode an NS query with recursion desired
pub fn build_query(domain: &str, id: u16) -> Result<Vec<u8>> {
    let fqdn = if domain.ends_with('.') {
        domain.to_string()
    } else {
        format!("{}.", domain)
    };
    let name = Name::from_utf8(&fqdn)?;

    let mut message = Message::new();
    message
        .set_id(id)
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true)
        .add_query(Query::query(name, RecordType::NS));

    Ok(message.to_vec()?)
}

/// Decode a response. `None` when it belongs to another query.
pub fn parse_response(bytes: &[u8], expected_id: u16) -> Result<Option<ResponseCode>> {
    let message = Message::from_vec(bytes)?;
    if message.id() != expected_id || message.message_type() != MessageType::Response {
        return Ok(None);
    }
    Ok(Some(ResponseCode::from(message.response_code())))
}

async fn exchange_udp(server: SocketAddr, packet: &[u8], id: u16) -> Result<ResponseCode> {
    let local: SocketAddr = match server.ip() {
        IpAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
        IpAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
    };
    let socket = UdpSocket::bind(local).await?;
    socket.connect(server).await?;
    socket.send(packet).await?;

    let mut buf = vec![0u8; MAX_UDP_PAYLOAD];
    loop {
        let len = socket.recv(&mut buf).await?;
        match parse_response(&buf[..len], id)? {
            Some(code) => return Ok(code),
            None => tracing::trace!(server = %server, "Ignoring datagram with foreign id"),
        }
    }
}

async fn exchange_tcp(server: SocketAddr, packet: &[u8], id: u16) -> Result<ResponseCode> {
    let len = u16::try_from(packet.len())
        .map_err(|_| DomaineratorError::parse("query does not fit a TCP frame", None))?;

    let mut stream = TcpStream::connect(server).await?;
    let mut frame = Vec::with_capacity(packet.len() + 2);
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(packet);
    stream.write_all(&frame).await?;

    let mut len_buf = [0u8; 2];
    stream.read_exact(&mut len_buf).await?;
    let mut buf = vec![0u8; u16::from_be_bytes(len_buf) as usize];
    stream.read_exact(&mut buf).await?;

    parse_response(&buf, id)?
        .ok_or_else(|| DomaineratorError::parse("response id does not match the query", None))
}

/// Parse one server as `ip`, `ip:port` or `[ipv6]:port`
pub fn parse_dns_server(server: &str) -> Result<SocketAddr> {
    if let Ok(addr) = server.parse::<SocketAddr>() {
        return Ok(addr);
    }
    server
        .parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, DNS_PORT))
        .map_err(|e| DomaineratorError::invalid_dns_server(server, e.to_string()))
}

/// Parse a comma separated server list
pub fn parse_dns_servers(csv: &str) -> Result<Vec<SocketAddr>> {
    let servers = wordlist::from_csv(csv)
        .iter()
        .map(|s| parse_dns_server(s))
        .collect::<Result<Vec<_>>>()?;

    if servers.is_empty() {
        return Err(DomaineratorError::NoDnsServers);
    }
    Ok(servers)
}
