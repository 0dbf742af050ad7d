//! Port record domain model: one assessed listener in one snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BindingScope, CompositeKey, Protocol, RiskLevel, SignatureStatus};
use crate::knowledge::PortCategory;

// ============================================================================
// PortRecord
// ============================================================================

/// A fully enriched and assessed listener.
///
/// Records are rebuilt from scratch on every scan. Across scans a listener is
/// identified only by its [`CompositeKey`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortRecord {
    // Endpoint
    pub local_port: u16,
    pub protocol: Protocol,
    pub state: String,
    pub local_address: String,
    pub binding_scope: BindingScope,
    /// Remote peer, TCP only.
    pub remote_address: Option<String>,
    pub remote_port: Option<u16>,

    // Process
    pub pid: u32,
    pub process_name: String,
    pub executable_path: String,
    pub owning_user: String,
    pub signature_status: SignatureStatus,

    // Service
    pub service_name: Option<String>,
    pub service_display_name: String,
    pub service_description: String,
    pub service_start_type: String,
    pub service_state: String,
    pub is_system_service: bool,

    // Knowledge
    pub port_name: String,
    pub service_hint: String,
    pub purpose: String,
    pub recommendation: String,
    pub category: PortCategory,
    pub baseline_risk: RiskLevel,

    // Assessment
    pub risk: RiskLevel,
    pub risk_reason: String,
    pub is_suspicious: bool,

    pub timestamp: DateTime<Utc>,
}

impl PortRecord {
    pub fn key(&self) -> CompositeKey {
        CompositeKey::new(self.protocol, self.local_port, self.pid)
    }

    /// Get the formatted port number for display (e.g., "TCP/3000").
    pub fn display_port(&self) -> String {
        format!("{}/{}", self.protocol, self.local_port)
    }

    /// Check if this record matches a search query.
    pub fn matches_search(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let query_lower = query.to_lowercase();
        self.process_name.to_lowercase().contains(&query_lower)
            || self.local_port.to_string().contains(&query_lower)
            || self.pid.to_string().contains(&query_lower)
            || self.local_address.to_lowercase().contains(&query_lower)
            || self.owning_user.to_lowercase().contains(&query_lower)
            || self.executable_path.to_lowercase().contains(&query_lower)
            || self.port_name.to_lowercase().contains(&query_lower)
            || self
                .service_name
                .as_deref()
                .is_some_and(|s| s.to_lowercase().contains(&query_lower))
    }
}

impl std::fmt::Display for PortRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}:{} (PID: {}, Process: {}, Risk: {})",
            self.protocol, self.local_address, self.local_port, self.pid, self.process_name, self.risk
        )
    }
}

/// Sort records by risk (most severe first), then by ascending port.
pub fn sort_records(records: &mut [PortRecord]) {
    records.sort_by(|a, b| {
        b.risk
            .cmp(&a.risk)
            .then_with(|| a.local_port.cmp(&b.local_port))
    });
}

// ============================================================================
// RemediationTarget
// ============================================================================

/// The handle remediation tooling (firewall, process, service actions) needs
/// to act on a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationTarget {
    pub pid: u32,
    pub protocol: Protocol,
    pub local_port: u16,
    pub service_name: Option<String>,
}

impl From<&PortRecord> for RemediationTarget {
    fn from(record: &PortRecord) -> Self {
        Self {
            pid: record.pid,
            protocol: record.protocol,
            local_port: record.local_port,
            service_name: record.service_name.clone(),
        }
    }
}
