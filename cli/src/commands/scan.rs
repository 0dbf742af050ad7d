//! Scan command - show assessed listeners.

use anyhow::Result;
use clap::Args;
use portguard_core::ports::ReportSink;
use portguard_core::{JsonSink, PortRecord, Protocol, RiskLevel, ScanFilter};

use super::{load_service, truncate};

#[derive(Args, Debug, Default, Clone)]
pub struct ScanArgs {
    /// Only this protocol (tcp or udp)
    #[arg(long)]
    pub protocol: Option<Protocol>,

    /// Only this local port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Only listeners at or above this risk level
    #[arg(long)]
    pub min_risk: Option<RiskLevel>,

    /// Only listeners flagged as suspicious
    #[arg(long)]
    pub suspicious_only: bool,

    /// Case-insensitive text match on process, service or port name
    #[arg(short, long)]
    pub search: Option<String>,
}

impl ScanArgs {
    /// The filter these flags describe; `default_min_risk` applies when no
    /// `--min-risk` was given.
    pub fn filter(&self, default_min_risk: Option<RiskLevel>) -> ScanFilter {
        let mut filter = ScanFilter::new()
            .with_protocol(self.protocol)
            .with_port(self.port)
            .with_min_risk(self.min_risk.or(default_min_risk))
            .with_suspicious_only(self.suspicious_only);
        if let Some(text) = &self.search {
            filter = filter.with_search(text.clone());
        }
        filter
    }
}

pub async fn run(args: ScanArgs, json: bool) -> Result<()> {
    let (config, service) = load_service().await?;
    let filter = args.filter(config.min_risk);
    let outcome = service.scan(&filter).await?;

    if json {
        let mut sink = JsonSink::new(std::io::stdout().lock());
        sink.write_records(&outcome.records)?;
        sink.finish()?;
        return Ok(());
    }

    if outcome.records.is_empty() {
        println!("No listening ports found.");
        return Ok(());
    }

    print_table(&outcome.records);

    let suspicious = outcome.records.iter().filter(|r| r.is_suspicious).count();
    println!(
        "\nTotal: {} listeners ({} suspicious)",
        outcome.records.len(),
        suspicious
    );
    if outcome.skipped > 0 {
        println!("Skipped {} malformed listeners", outcome.skipped);
    }
    Ok(())
}

fn print_table(records: &[PortRecord]) {
    println!(
        "{:<9} {:<5} {:<6} {:<22} {:<8} {:<18} {:<20} REASON",
        "RISK", "PROTO", "PORT", "ADDRESS", "PID", "PROCESS", "SERVICE"
    );
    println!("{}", "-".repeat(120));

    for record in records {
        let risk = if record.is_suspicious {
            format!("{}!", record.risk)
        } else {
            record.risk.to_string()
        };
        let service = record
            .service_name
            .as_deref()
            .unwrap_or(&record.service_display_name);

        println!(
            "{:<9} {:<5} {:<6} {:<22} {:<8} {:<18} {:<20} {}",
            risk,
            record.protocol,
            record.local_port,
            truncate(&record.local_address, 22),
            record.pid,
            truncate(&record.process_name, 18),
            truncate(service, 20),
            record.risk_reason
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_min_risk_is_fallback() {
        let args = ScanArgs::default();
        let filter = args.filter(Some(RiskLevel::Medium));
        assert_eq!(filter.min_risk, Some(RiskLevel::Medium));

        let args = ScanArgs {
            min_risk: Some(RiskLevel::Critical),
            ..ScanArgs::default()
        };
        assert_eq!(args.filter(Some(RiskLevel::Medium)).min_risk, Some(RiskLevel::Critical));
    }

    #[test]
    fn test_default_args_filter_nothing() {
        assert!(!ScanArgs::default().filter(None).is_active());
    }
}
