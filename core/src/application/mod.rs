//! Application layer - Use case services.
//!
//! This module contains application services that orchestrate
//! domain logic and adapter interactions.
//!
//! Services are designed to be thin orchestrators that:
//! - Accept domain types as inputs
//! - Use ports (traits) for external dependencies
//! - Return domain types as outputs

mod audit_service;

pub use audit_service::{
    AuditService, StopReason, WatchOptions, WatchSummary, DEFAULT_WATCH_INTERVAL,
};
