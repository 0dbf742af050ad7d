//! Change events emitted while watching listeners.

use serde::{Deserialize, Serialize};

use super::{CompositeKey, PortRecord, RiskLevel};

/// Which non-mandatory events a watch should report.
///
/// Closed listeners and new Critical/High listeners are always reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertFlags {
    /// Report every newly opened listener.
    #[serde(default = "default_true")]
    pub on_new_ports: bool,
    /// Report newly opened listeners flagged as suspicious.
    #[serde(default = "default_true")]
    pub on_suspicious: bool,
    /// Report risk level transitions of persisting listeners.
    #[serde(default = "default_true")]
    pub on_risk_change: bool,
}

fn default_true() -> bool {
    true
}

impl Default for AlertFlags {
    fn default() -> Self {
        Self {
            on_new_ports: true,
            on_suspicious: true,
            on_risk_change: true,
        }
    }
}

impl AlertFlags {
    /// All optional alerts disabled.
    pub fn none() -> Self {
        Self {
            on_new_ports: false,
            on_suspicious: false,
            on_risk_change: false,
        }
    }

    /// Whether a newly opened listener should be reported.
    pub fn should_alert_new(&self, record: &PortRecord) -> bool {
        self.on_new_ports || (self.on_suspicious && record.is_suspicious) || record.risk.is_elevated()
    }
}

/// A change between two consecutive snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum DiffEvent {
    /// First snapshot retained; no diff was computed.
    BaselineEstablished { count: usize },
    /// A listener present now that was absent before.
    NewPort { record: PortRecord },
    /// A listener present before that is gone now (the retained record).
    ClosedPort { record: PortRecord },
    /// A persisting listener whose risk level changed.
    RiskChanged {
        key: CompositeKey,
        old_risk: RiskLevel,
        new_risk: RiskLevel,
        record: PortRecord,
    },
}

impl DiffEvent {
    /// Composite key the event is about, if it concerns one listener.
    pub fn key(&self) -> Option<CompositeKey> {
        match self {
            DiffEvent::BaselineEstablished { .. } => None,
            DiffEvent::NewPort { record } | DiffEvent::ClosedPort { record } => Some(record.key()),
            DiffEvent::RiskChanged { key, .. } => Some(*key),
        }
    }
}

impl std::fmt::Display for DiffEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiffEvent::BaselineEstablished { count } => {
                write!(f, "Baseline established with {} listeners", count)
            }
            DiffEvent::NewPort { record } => write!(
                f,
                "NEW {} ({}, {} risk{})",
                record.key(),
                record.process_name,
                record.risk,
                if record.is_suspicious { ", suspicious" } else { "" }
            ),
            DiffEvent::ClosedPort { record } => {
                write!(f, "CLOSED {} ({})", record.key(), record.process_name)
            }
            DiffEvent::RiskChanged {
                key,
                old_risk,
                new_risk,
                ..
            } => write!(f, "RISK {} {} -> {}", key, old_risk, new_risk),
        }
    }
}
