//! Listener enumeration port (interface).

use crate::domain::RawListener;
use crate::error::Result;

/// Port for enumerating local network endpoints.
///
/// This trait defines the interface to the OS data source. Implementations
/// handle platform-specific details (ss, netstat, iphlpapi, etc.)
pub trait ListenerSource: Send + Sync {
    /// Enumerate TCP and UDP endpoints with their owning pids.
    ///
    /// An error means the data source itself is unavailable; the whole scan
    /// fails.
    fn enumerate(&self) -> impl std::future::Future<Output = Result<Vec<RawListener>>> + Send;
}
