// Structured audit records for impersonation and mentor decisions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Severity levels for structured log classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Debug,
}

/// Kinds of decision that get audited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    ImpersonationStarted,
    ImpersonationSwitched,
    ImpersonationReverted,
    ImpersonationDenied,
    MentorAssigned,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::ImpersonationStarted => "impersonation_started",
            AuditAction::ImpersonationSwitched => "impersonation_switched",
            AuditAction::ImpersonationReverted => "impersonation_reverted",
            AuditAction::ImpersonationDenied => "impersonation_denied",
            AuditAction::MentorAssigned => "mentor_assigned",
        }
    }
}

/// Audit record passed to the log sink
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub who: String,
    pub action: AuditAction,
    pub target: Option<String>,
    pub context: Option<String>,
    pub severity: LogLevel,
}

impl AuditEvent {
    pub fn new(who: &str, action: AuditAction) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            who: who.to_string(),
            action,
            target: None,
            context: None,
            severity: LogLevel::Info,
        }
    }

    /// Sets log severity
    pub fn with_severity(mut self, level: LogLevel) -> Self {
        self.severity = level;
        self
    }

    pub fn with_target(mut self, target: &str) -> Self {
        self.target = Some(target.to_string());
        self
    }

    /// Adds optional context string
    pub fn with_context(mut self, ctx: String) -> Self {
        self.context = Some(ctx);
        self
    }

    /// Writes the event to the `audit` tracing target.
    pub fn write_to_log(&self) {
        let target = self.target.as_deref().unwrap_or("-");
        let context = self.context.as_deref().unwrap_or("");
        match self.severity {
            LogLevel::Debug => {
                tracing::debug!(target: "audit", id = %self.id, who = %self.who, action = self.action.as_str(), target_user = target, context)
            }
            LogLevel::Info => {
                tracing::info!(target: "audit", id = %self.id, who = %self.who, action = self.action.as_str(), target_user = target, context)
            }
            LogLevel::Warn => {
                tracing::warn!(target: "audit", id = %self.id, who = %self.who, action = self.action.as_str(), target_user = target, context)
            }
            LogLevel::Error => {
                tracing::error!(target: "audit", id = %self.id, who = %self.who, action = self.action.as_str(), target_user = target, context)
            }
        }
    }
}

/// Destination for audit events. The host may forward them to a database.
pub trait AuditSink {
    fn record(&self, event: AuditEvent);
}

/// Sink that writes events through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        event.write_to_log();
    }
}

/// Sink that drops everything, used when auditing is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _event: AuditEvent) {}
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let event = AuditEvent::new("alice", AuditAction::ImpersonationDenied)
            .with_severity(LogLevel::Warn)
            .with_target("bob")
            .with_context("privilege".to_string());

        assert_eq!(event.who, "alice");
        assert_eq!(event.target.as_deref(), Some("bob"));
        assert_eq!(event.severity, LogLevel::Warn);
        assert!(!event.id.is_empty());
    }

    #[test]
    fn test_serializes_action_snake_case() {
        let event = AuditEvent::new("alice", AuditAction::MentorAssigned);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"mentor_assigned\""));
        assert!(json.contains("\"severity\":\"INFO\""));
    }
}
