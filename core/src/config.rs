//! Configuration management for scan defaults and watch alerts.
//!
//! Stores configuration in JSON format at `~/.portguard/config.json`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::{AlertFlags, RiskLevel};
use crate::error::{Error, Result};
use crate::knowledge::{PortKnowledgeBase, PortKnowledgeEntry};
use crate::risk::{DevToolAllowList, RiskAssessmentEngine, DEFAULT_DEV_TOOLS};

/// Configuration data stored in JSON format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Watch interval in seconds.
    #[serde(default = "default_refresh_interval", rename = "refreshInterval")]
    pub refresh_interval: u64,

    /// Report every newly opened listener while watching.
    #[serde(default = "default_true", rename = "alertOnNewPorts")]
    pub alert_on_new_ports: bool,

    /// Report newly opened suspicious listeners while watching.
    #[serde(default = "default_true", rename = "alertOnSuspicious")]
    pub alert_on_suspicious: bool,

    /// Report risk changes of persisting listeners while watching.
    #[serde(default = "default_true", rename = "alertOnRiskChange")]
    pub alert_on_risk_change: bool,

    /// Default minimum risk for scans.
    #[serde(default, rename = "minRisk", skip_serializing_if = "Option::is_none")]
    pub min_risk: Option<RiskLevel>,

    /// Executables treated as developer tools by the risk engine.
    #[serde(default = "default_dev_tools", rename = "devToolAllowList")]
    pub dev_tool_allow_list: Vec<String>,

    /// Entries added to, or replacing, the builtin port knowledge.
    #[serde(default, rename = "knowledgeOverrides")]
    pub knowledge_overrides: Vec<PortKnowledgeEntry>,
}

fn default_refresh_interval() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

fn default_dev_tools() -> Vec<String> {
    DEFAULT_DEV_TOOLS.iter().map(|s| s.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval: default_refresh_interval(),
            alert_on_new_ports: true,
            alert_on_suspicious: true,
            alert_on_risk_change: true,
            min_risk: None,
            dev_tool_allow_list: default_dev_tools(),
            knowledge_overrides: Vec::new(),
        }
    }
}

impl Config {
    pub fn alert_flags(&self) -> AlertFlags {
        AlertFlags {
            on_new_ports: self.alert_on_new_ports,
            on_suspicious: self.alert_on_suspicious,
            on_risk_change: self.alert_on_risk_change,
        }
    }

    /// Builtin knowledge with this config's overrides applied.
    pub fn knowledge_base(&self) -> PortKnowledgeBase {
        PortKnowledgeBase::builtin().with_overrides(self.knowledge_overrides.iter().cloned())
    }

    /// A risk engine using this config's knowledge and dev-tool list.
    pub fn risk_engine(&self) -> RiskAssessmentEngine {
        RiskAssessmentEngine::new(Arc::new(self.knowledge_base()))
            .with_dev_tools(DevToolAllowList::new(&self.dev_tool_allow_list))
    }
}

/// Configuration store for managing settings.
///
/// Handles reading and writing configuration to `~/.portguard/config.json`.
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    /// Create a new config store with the default path.
    ///
    /// Default path: `~/.portguard/config.json`
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        let config_path = home.join(".portguard").join("config.json");

        Ok(Self { config_path })
    }

    /// Create a config store with a custom path (for testing).
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load configuration from disk.
    ///
    /// Returns default config if the file doesn't exist.
    pub async fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub async fn save(&self, config: &Config) -> Result<()> {
        if let Some(config_dir) = self.config_path.parent() {
            if !config_dir.exists() {
                fs::create_dir_all(config_dir).await.map_err(|e| {
                    Error::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        // Write atomically by writing to temp file then renaming
        let temp_path = self.config_path.with_extension("json.tmp");

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to create temp config file: {}", e)))?;

        file.write_all(content.as_bytes())
            .await
            .map_err(|e| Error::Config(format!("Failed to write config: {}", e)))?;

        file.sync_all()
            .await
            .map_err(|e| Error::Config(format!("Failed to sync config: {}", e)))?;

        fs::rename(&temp_path, &self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to rename config file: {}", e)))?;

        Ok(())
    }

    /// Restore defaults on disk.
    pub async fn reset(&self) -> Result<Config> {
        let config = Config::default();
        self.save(&config).await?;
        Ok(config)
    }

    /// Get the watch interval in seconds.
    pub async fn get_refresh_interval(&self) -> Result<u64> {
        let config = self.load().await?;
        Ok(config.refresh_interval)
    }

    /// Set the watch interval in seconds.
    pub async fn set_refresh_interval(&self, interval: u64) -> Result<()> {
        if interval == 0 {
            return Err(Error::Config(
                "Refresh interval must be at least 1 second".to_string(),
            ));
        }
        let mut config = self.load().await?;
        config.refresh_interval = interval;
        self.save(&config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::PortCategory;
    use tempfile::tempdir;

    async fn test_store() -> (ConfigStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        (ConfigStore::with_path(path), dir)
    }

    #[tokio::test]
    async fn test_load_nonexistent() {
        let (store, _dir) = test_store().await;
        let config = store.load().await.unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.refresh_interval, 5);
        assert_eq!(config.alert_flags(), AlertFlags::default());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let (store, _dir) = test_store().await;

        let config = Config {
            refresh_interval: 30,
            alert_on_new_ports: false,
            min_risk: Some(RiskLevel::High),
            dev_tool_allow_list: vec!["ollama".to_string()],
            ..Config::default()
        };
        store.save(&config).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, config);
        assert!(!loaded.alert_flags().on_new_ports);
        assert!(!store.config_path().with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let (store, dir) = test_store().await;
        std::fs::create_dir_all(dir.path().join("nested")).unwrap();
        std::fs::write(
            store.config_path(),
            r#"{ "refreshInterval": 10, "alertOnRiskChange": false, "minRisk": "Medium" }"#,
        )
        .unwrap();

        let config = store.load().await.unwrap();
        assert_eq!(config.refresh_interval, 10);
        assert!(config.alert_on_new_ports);
        assert!(!config.alert_on_risk_change);
        assert_eq!(config.min_risk, Some(RiskLevel::Medium));
        assert!(config.dev_tool_allow_list.contains(&"node".to_string()));
    }

    #[tokio::test]
    async fn test_invalid_file_is_config_error() {
        let (store, dir) = test_store().await;
        std::fs::create_dir_all(dir.path().join("nested")).unwrap();
        std::fs::write(store.config_path(), "{ not json").unwrap();

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_refresh_interval() {
        let (store, _dir) = test_store().await;

        store.set_refresh_interval(15).await.unwrap();
        assert_eq!(store.get_refresh_interval().await.unwrap(), 15);
        assert!(store.set_refresh_interval(0).await.is_err());

        let config = store.reset().await.unwrap();
        assert_eq!(config.refresh_interval, 5);
        assert_eq!(store.get_refresh_interval().await.unwrap(), 5);
    }

    #[test]
    fn test_knowledge_overrides_reach_engine() {
        let config = Config {
            knowledge_overrides: vec![PortKnowledgeEntry {
                port: 9999,
                name: "Backup-Agent".to_string(),
                service_hint: "backupd".to_string(),
                baseline_risk: RiskLevel::Low,
                purpose: "Nightly backups".to_string(),
                recommendation: "Restrict to the backup server".to_string(),
                category: PortCategory::Management,
            }],
            ..Config::default()
        };

        let engine = config.risk_engine();
        assert_eq!(engine.knowledge().lookup(9999).name, "Backup-Agent");
        assert_eq!(engine.knowledge().lookup(22).name, "SSH");
    }
}
