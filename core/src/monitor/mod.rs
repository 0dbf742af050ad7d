//! Change monitor: diffs consecutive snapshots into [`DiffEvent`]s.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{AlertFlags, CompositeKey, DiffEvent, PortRecord};

/// Lifecycle of a [`ChangeMonitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonitorState {
    /// No snapshot observed yet.
    Uninitialized,
    /// Exactly one snapshot observed; it is the baseline.
    Baselined,
    /// At least one comparison has run.
    Comparing,
}

/// Retains the previous snapshot and reports what changed.
#[derive(Debug, Clone)]
pub struct ChangeMonitor {
    state: MonitorState,
    retained: BTreeMap<CompositeKey, PortRecord>,
    scan_count: u64,
    flags: AlertFlags,
}

impl ChangeMonitor {
    pub fn new(flags: AlertFlags) -> Self {
        Self {
            state: MonitorState::Uninitialized,
            retained: BTreeMap::new(),
            scan_count: 0,
            flags,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Snapshots observed so far.
    pub fn scan_count(&self) -> u64 {
        self.scan_count
    }

    pub fn flags(&self) -> AlertFlags {
        self.flags
    }

    /// The retained snapshot in key order.
    pub fn retained(&self) -> impl Iterator<Item = &PortRecord> {
        self.retained.values()
    }

    /// Feed the next snapshot and return the events it produces.
    ///
    /// The first snapshot only establishes the baseline. Later snapshots
    /// yield new listeners, then closed ones, then risk changes, each in
    /// ascending key order. The new snapshot replaces the retained one.
    pub fn observe(&mut self, records: Vec<PortRecord>) -> Vec<DiffEvent> {
        let mut current = BTreeMap::new();
        for record in records {
            current.entry(record.key()).or_insert(record);
        }
        self.scan_count += 1;

        if self.state == MonitorState::Uninitialized {
            let count = current.len();
            self.retained = current;
            self.state = MonitorState::Baselined;
            info!(count = count, "Baseline established");
            return vec![DiffEvent::BaselineEstablished { count }];
        }

        let mut opened = Vec::new();
        let mut risk_changes = Vec::new();
        for (key, record) in &current {
            match self.retained.get(key) {
                None => {
                    if self.flags.should_alert_new(record) {
                        opened.push(DiffEvent::NewPort {
                            record: record.clone(),
                        });
                    } else {
                        debug!(key = %key, "New listener below alert threshold");
                    }
                }
                Some(previous) if self.flags.on_risk_change && previous.risk != record.risk => {
                    risk_changes.push(DiffEvent::RiskChanged {
                        key: *key,
                        old_risk: previous.risk,
                        new_risk: record.risk,
                        record: record.clone(),
                    });
                }
                Some(_) => {}
            }
        }

        let mut retained = std::mem::replace(&mut self.retained, current);
        let closed: Vec<DiffEvent> = {
            let current = &self.retained;
            retained.retain(|key, _| !current.contains_key(key));
            retained
                .into_values()
                .map(|record| DiffEvent::ClosedPort { record })
                .collect()
        };

        self.state = MonitorState::Comparing;

        let mut events = opened;
        events.extend(closed);
        events.extend(risk_changes);
        debug!(scan = self.scan_count, events = events.len(), "Snapshot compared");
        events
    }

    /// Forget the retained snapshot; the next observation re-baselines.
    pub fn reset(&mut self) {
        self.retained.clear();
        self.state = MonitorState::Uninitialized;
    }
}

impl Default for ChangeMonitor {
    fn default() -> Self {
        Self::new(AlertFlags::default())
    }
}
