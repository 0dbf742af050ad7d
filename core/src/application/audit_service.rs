//! Listener audit application service.

use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::{
    AlertFlags, DiffEvent, PortRecord, Protocol, RawListener, RemediationTarget, ScanFilter,
};
use crate::error::Result;
use crate::monitor::ChangeMonitor;
use crate::ports::{IdentityResolver, ListenerSource};
use crate::risk::RiskAssessmentEngine;
use crate::snapshot::{ListenerSnapshotBuilder, SnapshotOutcome};

/// Default pause between watch scans.
pub const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(5);

/// Parameters of one watch session.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub interval: Duration,
    /// Stop after this long; run until cancelled when `None`.
    pub duration: Option<Duration>,
    pub alert_flags: AlertFlags,
    pub filter: ScanFilter,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_WATCH_INTERVAL,
            duration: None,
            alert_flags: AlertFlags::default(),
            filter: ScanFilter::default(),
        }
    }
}

/// Why a watch session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    DurationElapsed,
    Cancelled,
    ReceiverClosed,
}

/// Totals reported when a watch session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchSummary {
    /// Scans that completed and were compared.
    pub scans_completed: u64,
    pub events_emitted: u64,
    pub stop_reason: StopReason,
}

/// Application service for scanning and watching listeners.
///
/// Enumeration goes through the `ListenerSource` port and enrichment through
/// the `IdentityResolver` port, so either can be swapped for tests. The
/// latest scan is cached for lookups by port or pid.
pub struct AuditService<S: ListenerSource, R: IdentityResolver> {
    source: S,
    builder: ListenerSnapshotBuilder<R>,
    records_cache: RwLock<Vec<PortRecord>>,
}

impl<S: ListenerSource, R: IdentityResolver> AuditService<S, R> {
    pub fn new(source: S, resolver: R, engine: RiskAssessmentEngine) -> Self {
        Self {
            source,
            builder: ListenerSnapshotBuilder::new(resolver, engine),
            records_cache: RwLock::new(Vec::new()),
        }
    }

    /// Enumerate, assess and cache one snapshot.
    ///
    /// Fails only when enumeration itself fails; malformed listeners are
    /// counted in [`SnapshotOutcome::skipped`].
    pub async fn scan(&self, filter: &ScanFilter) -> Result<SnapshotOutcome> {
        let raw: Vec<RawListener> = self.source.enumerate().await?;
        let outcome = self.builder.build(&raw, filter).await;
        if outcome.skipped > 0 {
            warn!(
                skipped = outcome.skipped,
                total = raw.len(),
                "Some listeners could not be assessed"
            );
        }
        *self.records_cache.write() = outcome.records.clone();
        Ok(outcome)
    }

    /// Records of the latest scan.
    pub fn get_records(&self) -> Vec<PortRecord> {
        self.records_cache.read().clone()
    }

    /// Cached records bound to a port, on either protocol.
    pub fn find_by_port(&self, port: u16) -> Vec<PortRecord> {
        self.records_cache
            .read()
            .iter()
            .filter(|r| r.local_port == port)
            .cloned()
            .collect()
    }

    /// Cached records owned by a pid.
    pub fn find_by_pid(&self, pid: u32) -> Vec<PortRecord> {
        self.records_cache
            .read()
            .iter()
            .filter(|r| r.pid == pid)
            .cloned()
            .collect()
    }

    /// Remediation handle for a cached listener.
    pub fn remediation_target(&self, protocol: Protocol, port: u16) -> Option<RemediationTarget> {
        self.records_cache
            .read()
            .iter()
            .find(|r| r.protocol == protocol && r.local_port == port)
            .map(RemediationTarget::from)
    }

    /// Scan repeatedly and send every change to `events`.
    ///
    /// Stops when `cancel` fires, even while a send waits on a full
    /// channel, when `options.duration` elapses or when the receiver is
    /// dropped. A failed scan skips its cycle and leaves the retained
    /// snapshot untouched. Risk, suspicious and search criteria of
    /// `options.filter` select which events are sent, never what counts as
    /// closed. The interval is a plain sleep between the end of one cycle
    /// and the start of the next.
    pub async fn watch(
        &self,
        options: WatchOptions,
        cancel: CancellationToken,
        events: mpsc::Sender<DiffEvent>,
    ) -> WatchSummary {
        let deadline = options.duration.map(|d| Instant::now() + d);
        let mut monitor = ChangeMonitor::new(options.alert_flags);
        // The monitor diffs every listener; assessment filters only pick
        // which events are sent.
        let listener_filter = options.filter.listener_criteria();
        let mut scans_completed = 0u64;
        let mut events_emitted = 0u64;

        info!(
            interval_secs = options.interval.as_secs(),
            "Watching listeners"
        );

        let stop_reason = 'watch: loop {
            if cancel.is_cancelled() {
                break StopReason::Cancelled;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                break StopReason::DurationElapsed;
            }

            match self.scan(&listener_filter).await {
                Ok(outcome) => {
                    scans_completed += 1;
                    let visible = outcome
                        .records
                        .iter()
                        .filter(|r| options.filter.matches(r))
                        .count();
                    for event in monitor.observe(outcome.records) {
                        let event = match event {
                            DiffEvent::BaselineEstablished { .. } => {
                                DiffEvent::BaselineEstablished { count: visible }
                            }
                            other if options.filter.admits_event(&other) => other,
                            _ => continue,
                        };
                        debug!(event = %event, "Change detected");
                        tokio::select! {
                            _ = cancel.cancelled() => break 'watch StopReason::Cancelled,
                            sent = events.send(event) => {
                                if sent.is_err() {
                                    break 'watch StopReason::ReceiverClosed;
                                }
                            }
                        }
                        events_emitted += 1;
                    }
                }
                Err(e) => warn!(error = %e, "Scan failed, skipping cycle"),
            }

            let mut wake = Instant::now() + options.interval;
            if let Some(d) = deadline {
                wake = wake.min(d);
            }

            tokio::select! {
                _ = cancel.cancelled() => break 'watch StopReason::Cancelled,
                _ = events.closed() => break 'watch StopReason::ReceiverClosed,
                _ = tokio::time::sleep_until(wake) => {}
            }
        };

        info!(
            scans = scans_completed,
            events = events_emitted,
            reason = ?stop_reason,
            "Watch stopped"
        );

        WatchSummary {
            scans_completed,
            events_emitted,
            stop_reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Arc;

    use parking_lot::Mutex;

    use crate::domain::{ProcessDetails, RiskLevel, ServiceBinding, SignatureStatus};
    use crate::error::Error;
    use crate::knowledge::PortKnowledgeBase;

    /// Mock source replaying scripted enumerations; `None` fails the scan.
    /// The last script entry repeats forever.
    struct MockSource {
        script: Mutex<VecDeque<Option<Vec<RawListener>>>>,
    }

    impl MockSource {
        fn new(script: Vec<Option<Vec<RawListener>>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
            }
        }
    }

    impl ListenerSource for MockSource {
        async fn enumerate(&self) -> Result<Vec<RawListener>> {
            let mut script = self.script.lock();
            let next = if script.len() > 1 {
                script.pop_front().flatten()
            } else {
                script.front().cloned().flatten()
            };
            next.ok_or_else(|| Error::CommandFailed("ss unavailable".to_string()))
        }
    }

    /// Every pid is a standalone process.
    struct MockResolver;

    impl IdentityResolver for MockResolver {
        async fn resolve_process(&self, pid: u32) -> Option<ProcessDetails> {
            Some(ProcessDetails::new(
                format!("proc{}", pid),
                format!("/usr/bin/proc{}", pid),
                "root",
            ))
        }

        async fn resolve_signature(&self, _path: &str) -> SignatureStatus {
            SignatureStatus::NotApplicable
        }

        async fn resolve_service(&self, _pid: u32) -> Option<ServiceBinding> {
            None
        }
    }

    fn service(script: Vec<Option<Vec<RawListener>>>) -> AuditService<MockSource, MockResolver> {
        let engine = RiskAssessmentEngine::new(Arc::new(PortKnowledgeBase::builtin()));
        AuditService::new(MockSource::new(script), MockResolver, engine)
    }

    fn http(pid: u32) -> RawListener {
        RawListener::listening(Protocol::Tcp, "0.0.0.0", 80, pid)
    }

    fn ssh(pid: u32) -> RawListener {
        RawListener::listening(Protocol::Tcp, "0.0.0.0", 22, pid)
    }

    fn options(duration_secs: u64) -> WatchOptions {
        WatchOptions {
            interval: Duration::from_secs(5),
            duration: Some(Duration::from_secs(duration_secs)),
            ..WatchOptions::default()
        }
    }

    #[tokio::test]
    async fn test_scan_caches_records() {
        let service = service(vec![Some(vec![
            http(100),
            ssh(200),
            RawListener::listening(Protocol::Udp, "127.0.0.1", 80, 300),
        ])]);

        assert!(service.get_records().is_empty());

        let outcome = service.scan(&ScanFilter::new()).await.unwrap();
        assert_eq!(outcome.records.len(), 3);
        assert_eq!(service.get_records().len(), 3);
        assert_eq!(service.find_by_port(80).len(), 2);
        assert_eq!(service.find_by_pid(200)[0].local_port, 22);
        assert!(service.find_by_port(9999).is_empty());

        let target = service.remediation_target(Protocol::Tcp, 22).unwrap();
        assert_eq!(target.pid, 200);
        assert_eq!(target.service_name, None);
    }

    #[tokio::test]
    async fn test_scan_failure_is_explicit() {
        let service = service(vec![None]);
        let err = service.scan(&ScanFilter::new()).await.unwrap_err();
        assert!(matches!(err, Error::CommandFailed(_)));
    }

    #[tokio::test]
    async fn test_scan_reports_skipped() {
        let service = service(vec![Some(vec![
            http(100),
            RawListener::listening(Protocol::Tcp, "0.0.0.0", 0, 100),
        ])]);
        let outcome = service.scan(&ScanFilter::new()).await.unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.skipped, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_reports_changes_until_duration() {
        let service = service(vec![
            Some(vec![http(100)]),
            Some(vec![http(100), ssh(200)]),
            Some(vec![ssh(200)]),
        ]);
        let (tx, mut rx) = mpsc::channel(16);

        // Scans at t=0, 5 and 10; the deadline at 12 ends the third sleep.
        let summary = service.watch(options(12), CancellationToken::new(), tx).await;
        assert_eq!(summary.stop_reason, StopReason::DurationElapsed);
        assert_eq!(summary.scans_completed, 3);
        assert_eq!(summary.events_emitted, 3);

        assert_eq!(rx.recv().await, Some(DiffEvent::BaselineEstablished { count: 1 }));
        match rx.recv().await {
            Some(DiffEvent::NewPort { record }) => assert_eq!(record.local_port, 22),
            other => panic!("expected NewPort, got {:?}", other),
        }
        match rx.recv().await {
            Some(DiffEvent::ClosedPort { record }) => assert_eq!(record.pid, 100),
            other => panic!("expected ClosedPort, got {:?}", other),
        }
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_cancelled_during_sleep() {
        let service = service(vec![Some(vec![http(100)])]);
        let (tx, _rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(7)).await;
            trigger.cancel();
        });

        let summary = service.watch(options(3600), cancel, tx).await;
        assert_eq!(summary.stop_reason, StopReason::Cancelled);
        assert_eq!(summary.scans_completed, 2);
        assert_eq!(summary.events_emitted, 1);
    }

    #[tokio::test]
    async fn test_watch_pre_cancelled_never_scans() {
        let service = service(vec![Some(vec![http(100)])]);
        let (tx, _rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = service.watch(WatchOptions::default(), cancel, tx).await;
        assert_eq!(summary.stop_reason, StopReason::Cancelled);
        assert_eq!(summary.scans_completed, 0);
        assert!(service.get_records().is_empty());
    }

    #[tokio::test]
    async fn test_watch_stops_when_receiver_dropped() {
        let service = service(vec![Some(vec![http(100)])]);
        let (tx, rx) = mpsc::channel(16);
        drop(rx);

        let summary = service
            .watch(WatchOptions::default(), CancellationToken::new(), tx)
            .await;
        assert_eq!(summary.stop_reason, StopReason::ReceiverClosed);
        assert_eq!(summary.scans_completed, 1);
        assert_eq!(summary.events_emitted, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_failed_scan_keeps_baseline() {
        let service = service(vec![
            Some(vec![http(100)]),
            None,
            Some(vec![http(100), ssh(200)]),
        ]);
        let (tx, mut rx) = mpsc::channel(16);

        let summary = service.watch(options(11), CancellationToken::new(), tx).await;
        assert_eq!(summary.scans_completed, 2);
        assert_eq!(summary.events_emitted, 2);

        assert!(matches!(rx.recv().await, Some(DiffEvent::BaselineEstablished { count: 1 })));
        // The failed cycle must not have looked like every listener closing.
        match rx.recv().await {
            Some(DiffEvent::NewPort { record }) => {
                assert_eq!(record.local_port, 22);
                assert_eq!(record.risk, RiskLevel::High);
            }
            other => panic!("expected NewPort, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_filter_keeps_hidden_listeners_open() {
        let lowered = RawListener::listening(Protocol::Tcp, "127.0.0.1", 80, 100);
        let proxy = RawListener::listening(Protocol::Tcp, "0.0.0.0", 8080, 300);
        let service = service(vec![
            Some(vec![http(100)]),
            Some(vec![lowered, proxy]),
            Some(vec![http(100)]),
        ]);
        let (tx, mut rx) = mpsc::channel(16);
        let options = WatchOptions {
            filter: ScanFilter::new().with_min_risk(Some(RiskLevel::High)),
            ..options(12)
        };

        let summary = service.watch(options, CancellationToken::new(), tx).await;
        assert_eq!(summary.scans_completed, 3);
        assert_eq!(summary.events_emitted, 3);

        assert_eq!(rx.recv().await, Some(DiffEvent::BaselineEstablished { count: 1 }));
        // Dropping below the threshold is a risk change, not a close.
        match rx.recv().await {
            Some(DiffEvent::RiskChanged {
                old_risk, new_risk, record, ..
            }) => {
                assert_eq!(record.local_port, 80);
                assert_eq!(old_risk, RiskLevel::High);
                assert_eq!(new_risk, RiskLevel::Medium);
            }
            other => panic!("expected RiskChanged, got {:?}", other),
        }
        // Rising again is a risk change, not a new listener. The Low 8080
        // listener opens and closes without an event.
        match rx.recv().await {
            Some(DiffEvent::RiskChanged {
                old_risk, new_risk, ..
            }) => {
                assert_eq!(old_risk, RiskLevel::Medium);
                assert_eq!(new_risk, RiskLevel::High);
            }
            other => panic!("expected RiskChanged, got {:?}", other),
        }
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_cancelled_while_channel_full() {
        let service = service(vec![Some(vec![http(100)]), Some(vec![http(100), ssh(200)])]);
        // Capacity one and nobody reading: the second event blocks.
        let (tx, _rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(7)).await;
            trigger.cancel();
        });

        let summary = service.watch(options(3600), cancel, tx).await;
        assert_eq!(summary.stop_reason, StopReason::Cancelled);
        assert_eq!(summary.scans_completed, 2);
        assert_eq!(summary.events_emitted, 1);
    }
}
