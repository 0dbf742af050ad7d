//! Port knowledge base - baseline metadata for well-known ports.
//!
//! The registry is built once at startup (builtin table plus optional
//! configured overrides) and shared read-only. Lookups are total: ports
//! without an entry get a synthesized fallback whose baseline depends on
//! whether the port is in the reserved range.

mod builtin;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::RiskLevel;

/// Highest port number of the reserved (privileged) range.
pub const RESERVED_PORT_MAX: u16 = 1024;

/// Broad functional category of a well-known port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PortCategory {
    RemoteAccess,
    FileSharing,
    FileTransfer,
    Mail,
    Directory,
    Database,
    Web,
    Infrastructure,
    Management,
    Development,
    #[default]
    Unknown,
}

impl PortCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            PortCategory::RemoteAccess => "Remote Access",
            PortCategory::FileSharing => "File Sharing",
            PortCategory::FileTransfer => "File Transfer",
            PortCategory::Mail => "Mail",
            PortCategory::Directory => "Directory",
            PortCategory::Database => "Database",
            PortCategory::Web => "Web",
            PortCategory::Infrastructure => "Infrastructure",
            PortCategory::Management => "Management",
            PortCategory::Development => "Development",
            PortCategory::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for PortCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Baseline metadata for one port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortKnowledgeEntry {
    pub port: u16,
    pub name: String,
    pub service_hint: String,
    pub baseline_risk: RiskLevel,
    pub purpose: String,
    pub recommendation: String,
    #[serde(default)]
    pub category: PortCategory,
}

impl PortKnowledgeEntry {
    /// Entry synthesized for a port the registry knows nothing about.
    pub fn fallback(port: u16) -> Self {
        let (baseline_risk, purpose) = if port <= RESERVED_PORT_MAX {
            (RiskLevel::Medium, "Reserved system port")
        } else {
            (RiskLevel::Unknown, "Unregistered port")
        };
        Self {
            port,
            name: "Unknown".to_string(),
            service_hint: "Unknown".to_string(),
            baseline_risk,
            purpose: purpose.to_string(),
            recommendation: "Investigate the owning process".to_string(),
            category: PortCategory::Unknown,
        }
    }
}

/// Immutable registry of port knowledge keyed by port number.
#[derive(Debug, Clone, Default)]
pub struct PortKnowledgeBase {
    entries: HashMap<u16, PortKnowledgeEntry>,
}

impl PortKnowledgeBase {
    /// Registry with the builtin well-known port table.
    pub fn builtin() -> Self {
        Self::from_entries(builtin::entries())
    }

    /// Registry holding exactly the given entries. Later entries win per port.
    pub fn from_entries(entries: impl IntoIterator<Item = PortKnowledgeEntry>) -> Self {
        let entries = entries.into_iter().map(|e| (e.port, e)).collect();
        Self { entries }
    }

    /// Layer additional entries over this registry.
    pub fn with_overrides(mut self, overrides: impl IntoIterator<Item = PortKnowledgeEntry>) -> Self {
        for entry in overrides {
            self.entries.insert(entry.port, entry);
        }
        self
    }

    /// Knowledge for a port. Never fails.
    pub fn lookup(&self, port: u16) -> PortKnowledgeEntry {
        self.entries
            .get(&port)
            .cloned()
            .unwrap_or_else(|| PortKnowledgeEntry::fallback(port))
    }

    pub fn contains(&self, port: u16) -> bool {
        self.entries.contains_key(&port)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, ascending by port.
    pub fn entries(&self) -> Vec<&PortKnowledgeEntry> {
        let mut entries: Vec<_> = self.entries.values().collect();
        entries.sort_by_key(|e| e.port);
        entries
    }

    /// Rank of a risk level: Critical=4, High=3, Medium=2, Low=1, Unknown=0.
    pub fn risk_ordinal(level: RiskLevel) -> u8 {
        level.ordinal()
    }
}
