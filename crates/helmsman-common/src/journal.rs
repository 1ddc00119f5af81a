//! Decision journal
//!
//! Records the events an operator wants to review after the fact:
//! - Payloads blocked by the contract validator
//! - Decisions replaced by a safe fallback after an internal fault
//! - Candidate actions downgraded by the safety guard
//!
//! Entries are forwarded to every registered [`JournalSink`] and the most
//! recent ones are kept in a bounded in-memory ring per kind.

use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::types::action::Action;
use crate::types::environment::Environment;

/// Why a journal entry was written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalKind {
    /// Payload failed the runtime contract
    ContractViolation,
    /// A collaborator failed and the safe fallback was applied
    InternalFault,
    /// Safety guard replaced the candidate action with NOOP
    SafetyDowngrade,
}

impl JournalKind {
    /// Whether this kind lands in the blocked ring (vs. the downgrade ring)
    pub fn is_blocked(&self) -> bool {
        !matches!(self, JournalKind::SafetyDowngrade)
    }
}

impl fmt::Display for JournalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JournalKind::ContractViolation => write!(f, "CONTRACT"),
            JournalKind::InternalFault => write!(f, "FAULT"),
            JournalKind::SafetyDowngrade => write!(f, "DOWNGRADE"),
        }
    }
}

/// Journal entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique entry ID
    pub entry_id: String,

    /// When the entry was recorded
    pub timestamp: DateTime<Utc>,

    /// Entry kind
    pub kind: JournalKind,

    /// Application, if it could be established
    pub app_id: Option<String>,

    /// Environment, if it could be established
    pub env: Option<Environment>,

    /// Machine-readable code (e.g. `invalid_env`)
    pub code: Option<String>,

    /// Human-readable reason
    pub reason: String,

    /// Action proposed before the safety guard, for downgrades
    pub original_action: Option<Action>,

    /// Action that was actually emitted
    pub final_action: Action,
}

impl JournalEntry {
    /// Create a new journal entry; the emitted action defaults to NOOP
    pub fn new(kind: JournalKind, reason: impl Into<String>) -> Self {
        Self {
            entry_id: Uuid::now_v7().to_string(),
            timestamp: Utc::now(),
            kind,
            app_id: None,
            env: None,
            code: None,
            reason: reason.into(),
            original_action: None,
            final_action: Action::Noop,
        }
    }

    /// Set the application
    pub fn with_app(mut self, app_id: &str) -> Self {
        self.app_id = Some(app_id.to_string());
        self
    }

    /// Set the environment
    pub fn with_env(mut self, env: Environment) -> Self {
        self.env = Some(env);
        self
    }

    /// Set the machine-readable code
    pub fn with_code(mut self, code: &str) -> Self {
        self.code = Some(code.to_string());
        self
    }

    /// Record the action replaced by the guard
    pub fn with_original_action(mut self, action: Action) -> Self {
        self.original_action = Some(action);
        self
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Destination for journal entries
pub trait JournalSink: Send + Sync {
    /// Write a journal entry
    fn write(&self, entry: &JournalEntry);
}

/// Sink that forwards entries to `tracing`
pub struct TracingJournalSink;

impl JournalSink for TracingJournalSink {
    fn write(&self, entry: &JournalEntry) {
        let line = format!(
            "[{}] {} app={} env={} final={} - {}",
            entry.kind,
            entry.entry_id,
            entry.app_id.as_deref().unwrap_or("-"),
            entry.env.map(|e| e.as_str()).unwrap_or("-"),
            entry.final_action,
            entry.reason,
        );

        match entry.kind {
            JournalKind::SafetyDowngrade => info!("{}", line),
            JournalKind::ContractViolation | JournalKind::InternalFault => warn!("{}", line),
        }
    }
}

/// Bounded journal of blocked events and downgrades
pub struct DecisionJournal {
    sinks: Vec<Box<dyn JournalSink>>,
    blocked: RwLock<VecDeque<JournalEntry>>,
    downgrades: RwLock<VecDeque<JournalEntry>>,
    capacity: usize,
}

impl Default for DecisionJournal {
    fn default() -> Self {
        Self::new(crate::DEFAULT_JOURNAL_CAPACITY)
    }
}

impl DecisionJournal {
    /// Create a journal retaining `capacity` entries per kind, logging via `tracing`
    pub fn new(capacity: usize) -> Self {
        Self {
            sinks: vec![Box::new(TracingJournalSink)],
            blocked: RwLock::new(VecDeque::new()),
            downgrades: RwLock::new(VecDeque::new()),
            capacity,
        }
    }

    /// Add a sink
    pub fn add_sink(&mut self, sink: Box<dyn JournalSink>) {
        self.sinks.push(sink);
    }

    /// Record an entry; a panicking sink never takes the caller down
    pub fn record(&self, entry: JournalEntry) {
        for sink in &self.sinks {
            if panic::catch_unwind(AssertUnwindSafe(|| sink.write(&entry))).is_err() {
                error!(entry_id = %entry.entry_id, kind = %entry.kind, "Journal sink panicked");
            }
        }

        if self.capacity == 0 {
            return;
        }

        let ring = if entry.kind.is_blocked() {
            &self.blocked
        } else {
            &self.downgrades
        };

        let mut ring = ring.write();
        while ring.len() >= self.capacity {
            ring.pop_front();
        }
        ring.push_back(entry);
    }

    /// Recent blocked events, oldest first
    pub fn blocked_actions(&self) -> Vec<JournalEntry> {
        self.blocked.read().iter().cloned().collect()
    }

    /// Recent safety downgrades, oldest first
    pub fn downgrades(&self) -> Vec<JournalEntry> {
        self.downgrades.read().iter().cloned().collect()
    }

    /// Drop every retained entry
    pub fn clear(&self) {
        self.blocked.write().clear();
        self.downgrades.write().clear();
    }
}
