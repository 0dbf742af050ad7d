//! PortGuard Core Library
//!
//! Local network exposure auditing. Provides functionality to:
//! - Enumerate listening TCP/UDP endpoints and their owning processes
//! - Resolve process, signature and service-manager identity
//! - Score each listener with an ordered, explainable risk rule pipeline
//! - Diff consecutive snapshots into new/closed/risk-changed events
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure business logic and data models
//! - `knowledge`: Well-known port registry
//! - `risk`: Risk assessment engine and rules
//! - `snapshot`: Raw listeners to assessed records
//! - `monitor`: Snapshot diffing
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: External system implementations
//! - `application`: Use case services
//!
//! # Platform Support
//! - Linux: Uses `ss`, procfs and `systemctl`
//! - Other platforms: enumeration reports `UnsupportedPlatform`

// Hexagonal architecture layers
pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub mod config;
pub mod error;
pub mod knowledge;
pub mod monitor;
pub mod risk;
pub mod snapshot;

// Re-export domain types (primary API)
pub use domain::{
    filter_records, sort_records, AlertFlags, BindingScope, CompositeKey, DiffEvent,
    PortRecord, Protocol, RawListener, RemediationTarget, RiskLevel, ScanFilter,
    ServiceBinding, SignatureStatus,
};

// Re-export other commonly used types
pub use adapters::{JsonSink, SystemIdentityResolver, SystemListenerSource};
pub use application::{AuditService, StopReason, WatchOptions, WatchSummary};
pub use config::{Config, ConfigStore};
pub use error::{Error, Result};
pub use knowledge::{PortCategory, PortKnowledgeBase, PortKnowledgeEntry};
pub use monitor::{ChangeMonitor, MonitorState};
pub use risk::{RiskAssessment, RiskAssessmentEngine};
pub use snapshot::{ListenerSnapshotBuilder, SnapshotOutcome};

/// Audit service wired to the current platform's adapters.
pub type SystemAuditService = AuditService<SystemListenerSource, SystemIdentityResolver>;
