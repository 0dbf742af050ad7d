//! Watch command - rescan periodically and report changes.

use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use clap::Args;
use portguard_core::ports::ReportSink;
use portguard_core::{AlertFlags, DiffEvent, JsonSink, StopReason, WatchOptions, WatchSummary};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::load_service;
use super::scan::ScanArgs;

#[derive(Args, Debug, Default, Clone)]
pub struct WatchArgs {
    /// Seconds between scans (default from config)
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Stop after this many minutes
    #[arg(short, long)]
    pub duration: Option<u64>,

    /// Do not report every new listener (Critical/High ones are still reported)
    #[arg(long)]
    pub no_alert_new: bool,

    /// Do not report new suspicious listeners specifically
    #[arg(long)]
    pub no_alert_suspicious: bool,

    /// Do not report risk level changes
    #[arg(long)]
    pub no_alert_risk_change: bool,

    #[command(flatten)]
    pub scan: ScanArgs,
}

impl WatchArgs {
    /// Config flags with command-line opt-outs applied.
    fn alert_flags(&self, configured: AlertFlags) -> AlertFlags {
        AlertFlags {
            on_new_ports: configured.on_new_ports && !self.no_alert_new,
            on_suspicious: configured.on_suspicious && !self.no_alert_suspicious,
            on_risk_change: configured.on_risk_change && !self.no_alert_risk_change,
        }
    }
}

pub async fn run(args: WatchArgs, json: bool) -> Result<()> {
    let (config, service) = load_service().await?;

    let interval = args.interval.unwrap_or(config.refresh_interval).max(1);
    let options = WatchOptions {
        interval: Duration::from_secs(interval),
        duration: args.duration.map(|m| Duration::from_secs(m * 60)),
        alert_flags: args.alert_flags(config.alert_flags()),
        filter: args.scan.filter(config.min_risk),
    };

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    if !json {
        println!("Watching listeners every {}s (Ctrl-C to stop)", interval);
    }

    let (tx, mut rx) = mpsc::channel::<DiffEvent>(64);
    let printer = async move {
        let mut sink = json.then(|| JsonSink::new(std::io::stdout()));
        while let Some(event) = rx.recv().await {
            match sink.as_mut() {
                Some(sink) => {
                    if let Err(e) = sink.write_event(&event) {
                        warn!(error = %e, "Failed to write event");
                    }
                }
                None => println!("[{}] {}", Local::now().format("%H:%M:%S"), event),
            }
        }
    };

    let (summary, ()) = tokio::join!(service.watch(options, cancel, tx), printer);
    print_summary(&summary, json)?;
    Ok(())
}

fn print_summary(summary: &WatchSummary, json: bool) -> Result<()> {
    if json {
        eprintln!("{}", serde_json::to_string(summary)?);
        return Ok(());
    }

    let reason = match summary.stop_reason {
        StopReason::DurationElapsed => "duration elapsed",
        StopReason::Cancelled => "interrupted",
        StopReason::ReceiverClosed => "output closed",
    };
    println!(
        "\nStopped ({}): {} scans, {} events",
        reason, summary.scans_completed, summary.events_emitted
    );
    Ok(())
}
