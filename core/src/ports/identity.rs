//! Identity resolver port (interface).

use crate::domain::{ProcessDetails, ServiceBinding, SignatureStatus};

/// Port for resolving who owns a listener.
///
/// None of these calls fail from the caller's point of view: a process that
/// exited, an unreadable executable or an unknown service surface as `None`
/// or as a sentinel [`SignatureStatus`].
pub trait IdentityResolver: Send + Sync {
    /// Name, executable path and user of a live process.
    fn resolve_process(
        &self,
        pid: u32,
    ) -> impl std::future::Future<Output = Option<ProcessDetails>> + Send;

    /// Code-signature verdict for an executable.
    fn resolve_signature(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = SignatureStatus> + Send;

    /// The service-manager unit owning a process, if any.
    fn resolve_service(
        &self,
        pid: u32,
    ) -> impl std::future::Future<Output = Option<ServiceBinding>> + Send;
}
