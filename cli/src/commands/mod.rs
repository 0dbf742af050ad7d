pub mod config;
pub mod scan;
pub mod watch;

use anyhow::Result;
use portguard_core::{
    Config, ConfigStore, SystemAuditService, SystemIdentityResolver, SystemListenerSource,
};

/// Load the stored config and build an audit service from it.
pub async fn load_service() -> Result<(Config, SystemAuditService)> {
    let config = ConfigStore::new()?.load().await?;
    let service = SystemAuditService::new(
        SystemListenerSource::new(),
        SystemIdentityResolver::new(),
        config.risk_engine(),
    );
    Ok((config, service))
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("sshd", 10), "sshd");
        assert_eq!(truncate("systemd-resolved", 8), "systemd…");
        assert_eq!(truncate("äöüäöü", 4), "äöü…");
    }
}
