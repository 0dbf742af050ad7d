//! Raw listener, bind scope and composite key domain models.

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Protocol
// ============================================================================

/// Transport protocol of a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Protocol {
    #[serde(rename = "TCP")]
    Tcp,
    #[serde(rename = "UDP")]
    Udp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tcp" | "tcp6" => Ok(Protocol::Tcp),
            "udp" | "udp6" => Ok(Protocol::Udp),
            other => Err(format!("unknown protocol '{}'", other)),
        }
    }
}

// ============================================================================
// RawListener
// ============================================================================

/// One endpoint as reported by the OS enumeration, before any enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawListener {
    pub protocol: Protocol,
    /// Bind address as reported (e.g. "0.0.0.0", "[::1]", "*").
    pub local_address: String,
    pub local_port: u16,
    /// Socket state (e.g. "LISTEN", "ESTABLISHED", "UNCONN").
    pub state: String,
    pub owning_pid: u32,
    pub remote_address: Option<String>,
    pub remote_port: Option<u16>,
}

impl RawListener {
    /// Create a listening endpoint without a remote peer.
    pub fn listening(
        protocol: Protocol,
        local_address: impl Into<String>,
        local_port: u16,
        owning_pid: u32,
    ) -> Self {
        let state = match protocol {
            Protocol::Tcp => "LISTEN",
            Protocol::Udp => "UNCONN",
        };
        Self {
            protocol,
            local_address: local_address.into(),
            local_port,
            state: state.to_string(),
            owning_pid,
            remote_address: None,
            remote_port: None,
        }
    }

    /// Attach a remote peer (TCP only; ignored for UDP when records are built).
    pub fn with_remote(mut self, address: impl Into<String>, port: u16) -> Self {
        self.remote_address = Some(address.into());
        self.remote_port = Some(port);
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }

    /// Check the fields every record relies on.
    pub fn validate(&self) -> Result<()> {
        if self.local_port == 0 {
            return Err(Error::malformed(self, "local port 0 is not a bound endpoint"));
        }
        if self.local_address.trim().is_empty() {
            return Err(Error::malformed(self, "empty local address"));
        }
        Ok(())
    }

    pub fn key(&self) -> CompositeKey {
        CompositeKey::new(self.protocol, self.local_port, self.owning_pid)
    }
}

impl std::fmt::Display for RawListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}:{} (PID: {})",
            self.protocol, self.local_address, self.local_port, self.owning_pid
        )
    }
}

// ============================================================================
// BindingScope
// ============================================================================

/// Which interfaces can reach a listener, derived from its bind address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindingScope {
    #[serde(rename = "PublicAllIPv4")]
    PublicAllIpv4,
    #[serde(rename = "PublicAllIPv6")]
    PublicAllIpv6,
    #[serde(rename = "LocalhostIPv4")]
    LocalhostIpv4,
    #[serde(rename = "LocalhostIPv6")]
    LocalhostIpv6,
    SpecificInterface(String),
}

impl BindingScope {
    /// Classify a bind address.
    ///
    /// Equivalent spellings classify identically: `::` and
    /// `0:0:0:0:0:0:0:0`, bracketed forms, zone suffixes and IPv4-mapped
    /// IPv6 addresses are canonicalized before matching. `*` is the
    /// wildcard `ss` prints for an any-address bind.
    pub fn classify(address: &str) -> Self {
        match canonical_ip(address) {
            Some(IpAddr::V4(v4)) if v4.is_unspecified() => BindingScope::PublicAllIpv4,
            Some(IpAddr::V6(v6)) if v6.is_unspecified() => BindingScope::PublicAllIpv6,
            Some(IpAddr::V4(v4)) if v4.is_loopback() => BindingScope::LocalhostIpv4,
            Some(IpAddr::V6(v6)) if v6.is_loopback() => BindingScope::LocalhostIpv6,
            Some(ip) => BindingScope::SpecificInterface(ip.to_string()),
            None => BindingScope::SpecificInterface(address.trim().to_string()),
        }
    }

    /// Reachable on every interface.
    pub fn is_public(&self) -> bool {
        matches!(self, BindingScope::PublicAllIpv4 | BindingScope::PublicAllIpv6)
    }

    /// Reachable from this host only.
    pub fn is_localhost(&self) -> bool {
        matches!(self, BindingScope::LocalhostIpv4 | BindingScope::LocalhostIpv6)
    }
}

impl std::fmt::Display for BindingScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindingScope::PublicAllIpv4 => write!(f, "Public (all IPv4)"),
            BindingScope::PublicAllIpv6 => write!(f, "Public (all IPv6)"),
            BindingScope::LocalhostIpv4 => write!(f, "Localhost (IPv4)"),
            BindingScope::LocalhostIpv6 => write!(f, "Localhost (IPv6)"),
            BindingScope::SpecificInterface(addr) => write!(f, "Interface {}", addr),
        }
    }
}

/// Parse a bind address into its canonical IP form.
fn canonical_ip(address: &str) -> Option<IpAddr> {
    let trimmed = address.trim();
    let unbracketed = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);
    let without_zone = unbracketed.split('%').next().unwrap_or(unbracketed);

    if without_zone == "*" {
        return Some(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    }

    match without_zone.parse::<IpAddr>().ok()? {
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => Some(IpAddr::V4(v4)),
            None => Some(IpAddr::V6(v6)),
        },
        v4 => Some(v4),
    }
}

// ============================================================================
// CompositeKey
// ============================================================================

/// Identity of a listener across scans: (protocol, local port, pid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompositeKey {
    pub protocol: Protocol,
    pub local_port: u16,
    pub pid: u32,
}

impl CompositeKey {
    pub fn new(protocol: Protocol, local_port: u16, pid: u32) -> Self {
        Self {
            protocol,
            local_port,
            pid,
        }
    }
}

impl std::fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/pid {}", self.protocol, self.local_port, self.pid)
    }
}
