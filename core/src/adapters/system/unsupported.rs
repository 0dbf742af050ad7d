//! Fallback adapters for platforms without a listener source yet.

use crate::domain::{ProcessDetails, RawListener, ServiceBinding, SignatureStatus};
use crate::error::{Error, Result};
use crate::ports::{IdentityResolver, ListenerSource};

pub struct UnsupportedListenerSource;

impl ListenerSource for UnsupportedListenerSource {
    async fn enumerate(&self) -> Result<Vec<RawListener>> {
        Err(Error::UnsupportedPlatform(format!(
            "listener enumeration is not implemented for {}",
            std::env::consts::OS
        )))
    }
}

pub struct UnsupportedIdentityResolver;

impl IdentityResolver for UnsupportedIdentityResolver {
    async fn resolve_process(&self, _pid: u32) -> Option<ProcessDetails> {
        None
    }

    async fn resolve_signature(&self, _path: &str) -> SignatureStatus {
        SignatureStatus::Unknown
    }

    async fn resolve_service(&self, _pid: u32) -> Option<ServiceBinding> {
        None
    }
}
