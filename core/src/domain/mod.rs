//! Domain layer - Pure business logic and data models.
//!
//! This module contains domain entities that represent core business concepts.
//! These types have no I/O dependencies and can be tested in isolation.

mod event;
mod filter;
mod identity;
mod listener;
pub(crate) mod record;
mod risk_level;

// Re-export all domain types
pub use event::{AlertFlags, DiffEvent};
pub use filter::{filter_records, ScanFilter};
pub use identity::{
    ProcessDetails, ProcessIdentity, ServiceBinding, SignatureStatus, IDLE_PID, SYSTEM_PID,
};
pub use listener::{BindingScope, CompositeKey, Protocol, RawListener};
pub use record::{sort_records, PortRecord, RemediationTarget};
pub use risk_level::RiskLevel;
