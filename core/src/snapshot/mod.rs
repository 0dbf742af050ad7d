//! Listener snapshot builder.
//!
//! Turns raw OS listeners into ordered, assessed [`PortRecord`]s. Listeners
//! are resolved one at a time: a process may exit between enumeration and
//! inspection, and a serial walk keeps each record's view consistent.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::domain::{
    sort_records, BindingScope, ProcessDetails, ProcessIdentity, PortRecord, Protocol,
    RawListener, ScanFilter, ServiceBinding, SignatureStatus,
};
use crate::ports::IdentityResolver;
use crate::risk::RiskAssessmentEngine;

/// Records of one scan plus how many listeners had to be skipped.
#[derive(Debug, Clone, Default)]
pub struct SnapshotOutcome {
    pub records: Vec<PortRecord>,
    pub skipped: usize,
}

/// How much of a listener's ownership could be resolved.
enum Ownership {
    /// Owned by a service-manager unit.
    Service(ProcessIdentity, ServiceBinding),
    /// A live process that no service manager owns.
    Standalone(ProcessIdentity),
    /// Neither the process nor a service could be found.
    Unavailable(ProcessIdentity),
}

/// Builds assessed snapshots from raw listeners.
pub struct ListenerSnapshotBuilder<R: IdentityResolver> {
    resolver: R,
    engine: RiskAssessmentEngine,
}

impl<R: IdentityResolver> ListenerSnapshotBuilder<R> {
    pub fn new(resolver: R, engine: RiskAssessmentEngine) -> Self {
        Self { resolver, engine }
    }

    pub fn engine(&self) -> &RiskAssessmentEngine {
        &self.engine
    }

    /// Build the ordered snapshot for one enumeration.
    ///
    /// Malformed listeners are logged and counted, never fatal. Records are
    /// sorted by risk (most severe first), then by port.
    pub async fn build(&self, listeners: &[RawListener], filter: &ScanFilter) -> SnapshotOutcome {
        let scanned_at = Utc::now();
        let mut outcome = SnapshotOutcome::default();
        let mut seen = HashSet::new();

        for listener in listeners {
            if !filter.admits_listener(listener) {
                continue;
            }
            if let Err(e) = listener.validate() {
                warn!(listener = %listener, error = %e, "Skipping malformed listener");
                outcome.skipped += 1;
                continue;
            }
            if !seen.insert(listener.key()) {
                debug!(listener = %listener, "Duplicate listener key, keeping first");
                continue;
            }

            let record = self.build_record(listener, scanned_at).await;
            if filter.matches(&record) {
                outcome.records.push(record);
            }
        }

        sort_records(&mut outcome.records);
        debug!(
            records = outcome.records.len(),
            skipped = outcome.skipped,
            "Snapshot built"
        );
        outcome
    }

    async fn build_record(&self, listener: &RawListener, scanned_at: DateTime<Utc>) -> PortRecord {
        let ownership = self.resolve_ownership(listener.owning_pid).await;
        let (identity, service) = match &ownership {
            Ownership::Service(identity, binding) => (identity, Some(binding)),
            Ownership::Standalone(identity) | Ownership::Unavailable(identity) => (identity, None),
        };

        let port = listener.local_port;
        let knowledge = self.engine.knowledge().lookup(port);
        let assessment = self.engine.assess(
            port,
            &listener.local_address,
            &identity.executable_path,
            identity.signature_status,
            service,
        );

        let (remote_address, remote_port) = match listener.protocol {
            Protocol::Tcp => (listener.remote_address.clone(), listener.remote_port),
            Protocol::Udp => (None, None),
        };

        let mut record = PortRecord {
            local_port: port,
            protocol: listener.protocol,
            state: listener.state.clone(),
            local_address: listener.local_address.clone(),
            binding_scope: BindingScope::classify(&listener.local_address),
            remote_address,
            remote_port,
            pid: listener.owning_pid,
            process_name: identity.process_name.clone(),
            executable_path: identity.executable_path.clone(),
            owning_user: identity.owning_user.clone(),
            signature_status: identity.signature_status,
            service_name: None,
            service_display_name: String::new(),
            service_description: String::new(),
            service_start_type: "N/A".to_string(),
            service_state: "N/A".to_string(),
            is_system_service: false,
            port_name: knowledge.name,
            service_hint: knowledge.service_hint,
            purpose: knowledge.purpose,
            recommendation: knowledge.recommendation,
            category: knowledge.category,
            baseline_risk: assessment.base_risk,
            risk: assessment.final_risk,
            risk_reason: assessment.reason(),
            is_suspicious: assessment.is_suspicious,
            timestamp: scanned_at,
        };

        match ownership {
            Ownership::Service(_, binding) => {
                record.service_name = binding.service_name;
                record.service_display_name = binding.display_name;
                record.service_description = binding.description;
                record.service_start_type = binding.start_type;
                record.service_state = binding.state;
                record.is_system_service = binding.is_system_service;
            }
            Ownership::Standalone(_) => {
                record.service_display_name = "Standalone process".to_string();
                record.service_description = "Not running as a service".to_string();
            }
            Ownership::Unavailable(_) => {
                record.service_display_name = "Unknown".to_string();
                record.service_description = "Information unavailable".to_string();
            }
        }

        record
    }

    async fn resolve_ownership(&self, pid: u32) -> Ownership {
        if let Some(identity) = ProcessIdentity::sentinel(pid) {
            return Ownership::Service(identity, ServiceBinding::kernel());
        }

        let details = self.resolver.resolve_process(pid).await;
        let service = self.resolver.resolve_service(pid).await;

        match (details, service) {
            (Some(details), Some(binding)) => {
                let identity = self.identify(pid, details).await;
                Ownership::Service(identity, binding)
            }
            (Some(details), None) => Ownership::Standalone(self.identify(pid, details).await),
            (None, Some(binding)) => {
                // Process vanished or is hidden from us; fall back to what
                // the service manager knows about its binary.
                let identity = if binding.binary_path.is_empty() {
                    ProcessIdentity::unavailable(pid)
                } else {
                    let name = binary_name(&binding.binary_path);
                    let details = ProcessDetails::new(name, binding.binary_path.clone(), "Unknown");
                    self.identify(pid, details).await
                };
                Ownership::Service(identity, binding)
            }
            (None, None) => {
                debug!(pid = pid, "No process or service information");
                Ownership::Unavailable(ProcessIdentity::unavailable(pid))
            }
        }
    }

    async fn identify(&self, pid: u32, details: ProcessDetails) -> ProcessIdentity {
        let signature = if details.path.is_empty() {
            SignatureStatus::Unknown
        } else {
            self.resolver.resolve_signature(&details.path).await
        };
        ProcessIdentity::from_details(pid, details, signature)
    }
}

fn binary_name(path: &str) -> String {
    path.rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(path)
        .to_string()
}
