//! Config command - show and edit stored settings.

use anyhow::Result;
use portguard_core::ConfigStore;

pub async fn show(json: bool) -> Result<()> {
    let store = ConfigStore::new()?;
    let config = store.load().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("Config file:          {}", store.config_path().display());
    println!("Refresh interval:     {}s", config.refresh_interval);
    println!("Alert on new ports:   {}", config.alert_on_new_ports);
    println!("Alert on suspicious:  {}", config.alert_on_suspicious);
    println!("Alert on risk change: {}", config.alert_on_risk_change);
    match config.min_risk {
        Some(level) => println!("Minimum risk:         {}", level),
        None => println!("Minimum risk:         (none)"),
    }
    println!("Dev tools:            {}", config.dev_tool_allow_list.join(", "));
    if !config.knowledge_overrides.is_empty() {
        println!("\nKnowledge overrides:");
        for entry in &config.knowledge_overrides {
            println!("  {:<6} {:<16} {}", entry.port, entry.name, entry.baseline_risk);
        }
    }
    Ok(())
}

pub async fn set_interval(seconds: u64) -> Result<()> {
    let store = ConfigStore::new()?;
    store.set_refresh_interval(seconds).await?;
    println!("Refresh interval set to {}s", seconds);
    Ok(())
}

pub async fn reset() -> Result<()> {
    let store = ConfigStore::new()?;
    store.reset().await?;
    println!("Configuration reset to defaults ({})", store.config_path().display());
    Ok(())
}
