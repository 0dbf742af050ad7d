//! Scan filter criteria.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{DiffEvent, PortRecord, Protocol, RawListener, RiskLevel};

/// Filter criteria for a scan.
///
/// Protocol and port criteria are checked against raw listeners before any
/// identity resolution; the remaining criteria depend on the assessment and
/// are checked against finished records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanFilter {
    /// Only this protocol.
    #[serde(default)]
    pub protocol: Option<Protocol>,
    /// Only this local port.
    #[serde(default)]
    pub port: Option<u16>,
    /// Minimum risk level (inclusive).
    #[serde(default)]
    pub min_risk: Option<RiskLevel>,
    /// Explicit set of risk levels to keep. Empty keeps all.
    #[serde(default)]
    pub risk_levels: HashSet<RiskLevel>,
    /// Only suspicious records.
    #[serde(default)]
    pub suspicious_only: bool,
    /// Text to search across record fields.
    #[serde(default)]
    pub search_text: String,
}

impl ScanFilter {
    /// Create a new filter with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the filter has any active conditions.
    pub fn is_active(&self) -> bool {
        self.protocol.is_some()
            || self.port.is_some()
            || self.min_risk.is_some()
            || !self.risk_levels.is_empty()
            || self.suspicious_only
            || !self.search_text.is_empty()
    }

    /// Criteria that can be decided before resolution.
    pub fn admits_listener(&self, listener: &RawListener) -> bool {
        if let Some(protocol) = self.protocol {
            if listener.protocol != protocol {
                return false;
            }
        }
        if let Some(port) = self.port {
            if listener.local_port != port {
                return false;
            }
        }
        true
    }

    /// The protocol and port criteria alone.
    pub fn listener_criteria(&self) -> ScanFilter {
        ScanFilter {
            protocol: self.protocol,
            port: self.port,
            ..ScanFilter::default()
        }
    }

    /// Whether a change event concerns a record this filter shows.
    ///
    /// A risk change passes when the record matches at either its old or
    /// its new risk, so a listener crossing the threshold is still reported.
    pub fn admits_event(&self, event: &DiffEvent) -> bool {
        match event {
            DiffEvent::BaselineEstablished { .. } => true,
            DiffEvent::NewPort { record } | DiffEvent::ClosedPort { record } => self.matches(record),
            DiffEvent::RiskChanged {
                old_risk, record, ..
            } => {
                if self.matches(record) {
                    return true;
                }
                let mut before = record.clone();
                before.risk = *old_risk;
                self.matches(&before)
            }
        }
    }

    /// Check if an assessed record matches all filter criteria.
    pub fn matches(&self, record: &PortRecord) -> bool {
        if let Some(protocol) = self.protocol {
            if record.protocol != protocol {
                return false;
            }
        }
        if let Some(port) = self.port {
            if record.local_port != port {
                return false;
            }
        }
        if let Some(min) = self.min_risk {
            if record.risk < min {
                return false;
            }
        }
        if !self.risk_levels.is_empty() && !self.risk_levels.contains(&record.risk) {
            return false;
        }
        if self.suspicious_only && !record.is_suspicious {
            return false;
        }
        if !self.search_text.is_empty() && !record.matches_search(&self.search_text) {
            return false;
        }
        true
    }

    pub fn with_protocol(mut self, protocol: Option<Protocol>) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    pub fn with_min_risk(mut self, min_risk: Option<RiskLevel>) -> Self {
        self.min_risk = min_risk;
        self
    }

    pub fn with_risk_levels(mut self, levels: impl IntoIterator<Item = RiskLevel>) -> Self {
        self.risk_levels = levels.into_iter().collect();
        self
    }

    pub fn with_suspicious_only(mut self, enabled: bool) -> Self {
        self.suspicious_only = enabled;
        self
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }
}

/// Apply a filter to a list of records.
pub fn filter_records(records: &[PortRecord], filter: &ScanFilter) -> Vec<PortRecord> {
    records
        .iter()
        .filter(|r| filter.matches(r))
        .cloned()
        .collect()
}
