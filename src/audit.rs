//! Security audit events.
//!
//! Every security-relevant action emits exactly one event: login outcomes,
//! registration outcomes, each recovery step, and engine faults. The sink is
//! fire-and-forget; recording never fails or blocks the calling operation,
//! and the sink's own storage is somebody else's problem.

use chrono::{DateTime, Utc};
use std::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::error::EngineError;

/// One security-relevant action and how it ended.
#[derive(Clone, Debug)]
pub struct AuditEvent {
    pub at: DateTime<Utc>,
    /// Absent when the action never resolved to an account.
    pub account_id: Option<Uuid>,
    pub action: &'static str,
    pub outcome: &'static str,
    pub message: String,
}

impl AuditEvent {
    #[must_use]
    pub fn new(
        at: DateTime<Utc>,
        account_id: Option<Uuid>,
        action: &'static str,
        outcome: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            at,
            account_id,
            action,
            outcome,
            message: message.into(),
        }
    }

    /// Event for an aborted operation.
    #[must_use]
    pub fn fault(
        at: DateTime<Utc>,
        account_id: Option<Uuid>,
        action: &'static str,
        error: &EngineError,
    ) -> Self {
        Self::new(at, account_id, action, "fault", error.to_string())
    }
}

/// Destination for audit events.
///
/// Implementations must swallow their own failures; callers get no result to
/// inspect and never wait on delivery.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Sink that writes one structured log line per event.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogAuditSink;

impl AuditSink for LogAuditSink {
    fn record(&self, event: AuditEvent) {
        let account = event
            .account_id
            .map_or_else(|| "unknown".to_string(), |id| id.to_string());
        info!(
            target: "security",
            at = %event.at.to_rfc3339(),
            account = %account,
            action = event.action,
            outcome = event.outcome,
            "{}",
            event.message
        );
    }
}

/// Capturing sink for tests.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far, in order.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    #[test]
    fn memory_sink_keeps_events_in_order() {
        let sink = MemoryAuditSink::new();
        let now = Utc::now();
        sink.record(AuditEvent::new(now, None, "login", "unknown_account", "no such email"));
        sink.record(AuditEvent::new(
            now,
            Some(Uuid::new_v4()),
            "login",
            "success",
            "",
        ));

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].outcome, "unknown_account");
        assert_eq!(events[1].outcome, "success");
        assert!(events[0].account_id.is_none());
    }

    #[test]
    fn fault_events_carry_the_error_text() {
        let err = EngineError::from(StoreError::message("connection refused"));
        let event = AuditEvent::fault(Utc::now(), None, "login", &err);
        assert_eq!(event.outcome, "fault");
        assert!(event.message.contains("connection refused"));
    }

    #[test]
    fn log_sink_accepts_events() {
        // Only exercises the formatting path; output goes to the subscriber.
        LogAuditSink.record(AuditEvent::new(Utc::now(), None, "login", "success", "ok"));
    }
}
