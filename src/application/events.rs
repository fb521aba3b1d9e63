//! Append-only event surface for external reporting.
//!
//! Two capped ring buffers: agent activity (what the loop did) and
//! rebalance decisions (what it concluded, acted on or not). Both are
//! injected into the components that feed them — no process-wide
//! singletons — and readers always receive cloned snapshots, newest first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::domain::RebalanceTrigger;

const MAX_ACTIVITIES: usize = 100;
const MAX_DECISIONS: usize = 50;

/// Category of agent activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    RebalanceCheck,
    FeeCollection,
    PositionOpened,
    PositionClosed,
    PriceAlert,
    HealthCheck,
    MigrationCheck,
    AgentStarted,
    AgentStopped,
}

/// One logged agent action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub timestamp: DateTime<Utc>,
    pub kind: ActivityKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Capped in-memory log of agent actions.
pub struct ActivityLog {
    entries: Mutex<VecDeque<Activity>>,
    capacity: usize,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::with_capacity(MAX_ACTIVITIES)
    }
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn push(&self, kind: ActivityKind, message: impl Into<String>) {
        self.push_with_details(kind, message, None);
    }

    pub fn push_with_details(
        &self,
        kind: ActivityKind,
        message: impl Into<String>,
        details: Option<serde_json::Value>,
    ) {
        let mut entries = self.entries.lock().unwrap();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(Activity {
            timestamp: Utc::now(),
            kind,
            message: message.into(),
            details,
        });
    }

    /// Snapshot of recorded activity, newest first.
    pub fn recent(&self) -> Vec<Activity> {
        self.entries.lock().unwrap().iter().rev().cloned().collect()
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

/// One recorded evaluation outcome, whether or not action was taken.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub timestamp: DateTime<Utc>,
    pub position_id: String,
    pub trigger: Option<RebalanceTrigger>,
    pub should_rebalance: bool,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_benefit: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<u8>,
}

/// Capped in-memory log of rebalance decisions.
pub struct DecisionLog {
    entries: Mutex<VecDeque<DecisionRecord>>,
    capacity: usize,
}

impl Default for DecisionLog {
    fn default() -> Self {
        Self::with_capacity(MAX_DECISIONS)
    }
}

impl DecisionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn record(&self, record: DecisionRecord) {
        let mut entries = self.entries.lock().unwrap();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(record);
    }

    /// Snapshot of recorded decisions, newest first.
    pub fn recent(&self) -> Vec<DecisionRecord> {
        self.entries.lock().unwrap().iter().rev().cloned().collect()
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}
