//! Ports layer - Trait definitions (interfaces).
//!
//! This module defines the interfaces that the application layer uses
//! to interact with external systems. Implementations live in `adapters`.

mod identity;
mod listener_source;
mod report;

pub use identity::IdentityResolver;
pub use listener_source::ListenerSource;
pub use report::ReportSink;
