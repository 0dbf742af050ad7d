//! Example: Scan and assess all listening ports.

use std::sync::Arc;

use portguard_core::{
    AuditService, PortKnowledgeBase, RiskAssessmentEngine, ScanFilter, SystemIdentityResolver,
    SystemListenerSource,
};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    println!("Scanning listeners...\n");

    let engine = RiskAssessmentEngine::new(Arc::new(PortKnowledgeBase::builtin()));
    let service = AuditService::new(
        SystemListenerSource::new(),
        SystemIdentityResolver::new(),
        engine,
    );

    match service.scan(&ScanFilter::new()).await {
        Ok(outcome) => {
            if outcome.records.is_empty() {
                println!("No listening ports found.");
                return;
            }

            println!(
                "{:<9} {:<5} {:<6} {:<8} {:<20} {}",
                "RISK", "PROTO", "PORT", "PID", "PROCESS", "REASON"
            );
            println!("{}", "-".repeat(100));

            for record in &outcome.records {
                println!(
                    "{:<9} {:<5} {:<6} {:<8} {:<20} {}",
                    record.risk,
                    record.protocol,
                    record.local_port,
                    record.pid,
                    record.process_name.chars().take(20).collect::<String>(),
                    record.risk_reason
                );
            }

            println!(
                "\nTotal: {} listeners, {} skipped",
                outcome.records.len(),
                outcome.skipped
            );
        }
        Err(e) => {
            eprintln!("Error scanning listeners: {}", e);
        }
    }
}
