//! Operating-system adapters.
//!
//! Platform-specific listener enumeration and identity resolution.

#[cfg(target_os = "linux")]
mod linux;

#[cfg_attr(target_os = "linux", allow(dead_code))]
mod unsupported;

#[cfg(target_os = "linux")]
mod utils;

use crate::domain::{ProcessDetails, RawListener, ServiceBinding, SignatureStatus};
use crate::error::Result;
use crate::ports::{IdentityResolver, ListenerSource};

/// The listener source for the current platform.
pub struct SystemListenerSource {
    #[cfg(target_os = "linux")]
    inner: linux::LinuxListenerSource,

    #[cfg(not(target_os = "linux"))]
    inner: unsupported::UnsupportedListenerSource,
}

impl SystemListenerSource {
    pub fn new() -> Self {
        Self {
            #[cfg(target_os = "linux")]
            inner: linux::LinuxListenerSource::new(),

            #[cfg(not(target_os = "linux"))]
            inner: unsupported::UnsupportedListenerSource,
        }
    }
}

impl Default for SystemListenerSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ListenerSource for SystemListenerSource {
    async fn enumerate(&self) -> Result<Vec<RawListener>> {
        self.inner.enumerate().await
    }
}

/// The identity resolver for the current platform.
pub struct SystemIdentityResolver {
    #[cfg(target_os = "linux")]
    inner: linux::LinuxIdentityResolver,

    #[cfg(not(target_os = "linux"))]
    inner: unsupported::UnsupportedIdentityResolver,
}

impl SystemIdentityResolver {
    pub fn new() -> Self {
        Self {
            #[cfg(target_os = "linux")]
            inner: linux::LinuxIdentityResolver::new(),

            #[cfg(not(target_os = "linux"))]
            inner: unsupported::UnsupportedIdentityResolver,
        }
    }
}

impl Default for SystemIdentityResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityResolver for SystemIdentityResolver {
    async fn resolve_process(&self, pid: u32) -> Option<ProcessDetails> {
        self.inner.resolve_process(pid).await
    }

    async fn resolve_signature(&self, path: &str) -> SignatureStatus {
        self.inner.resolve_signature(path).await
    }

    async fn resolve_service(&self, pid: u32) -> Option<ServiceBinding> {
        self.inner.resolve_service(pid).await
    }
}
