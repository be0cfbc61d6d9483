use crate::error::Result;
use crate::validate::ValidationResult;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Started,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Failed,
}

/// One step-level audit event emitted by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepEvent {
    pub step_name: String,
    pub timestamp: DateTime<Local>,
    pub status: StepStatus,
    pub duration_ms: Option<f64>,
    pub details: Value,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl StepEvent {
    pub fn started(step_name: &str, details: Value) -> Self {
        Self {
            step_name: step_name.to_string(),
            timestamp: Local::now(),
            status: StepStatus::Started,
            duration_ms: None,
            details,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn completed(step_name: &str, duration_ms: f64, details: Value) -> Self {
        Self {
            step_name: step_name.to_string(),
            timestamp: Local::now(),
            status: StepStatus::Completed,
            duration_ms: Some(duration_ms),
            details,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn failed(step_name: &str, duration_ms: f64, errors: Vec<String>) -> Self {
        Self {
            step_name: step_name.to_string(),
            timestamp: Local::now(),
            status: StepStatus::Failed,
            duration_ms: Some(duration_ms),
            details: Value::Null,
            errors,
            warnings: Vec::new(),
        }
    }
}

/// Audit collaborator seam. Persistence (files, databases) lives behind an
/// implementation; the pipeline only emits events and never depends on the
/// sink succeeding.
pub trait AuditSink {
    /// Opens a session and returns its identifier.
    fn start_session(&mut self, user_id: &str, source: &str, file_hash: &str) -> Result<String>;

    fn record_step(&mut self, session_id: &str, event: StepEvent) -> Result<()>;

    fn set_template_used(&mut self, session_id: &str, template_id: &str) -> Result<()>;

    fn add_validation_results(
        &mut self,
        session_id: &str,
        results: &ValidationResult,
    ) -> Result<()>;

    fn add_output_file(&mut self, session_id: &str, path: &str) -> Result<()>;

    fn end_session(&mut self, session_id: &str, status: SessionStatus) -> Result<()>;
}

/// Complete audit trail of one processing run, as kept by the in-memory
/// sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub session_id: String,
    pub user_id: String,
    pub source: String,
    pub input_file_hash: String,
    pub processing_start: DateTime<Local>,
    pub processing_end: Option<DateTime<Local>>,
    pub status: SessionStatus,
    pub steps: Vec<StepEvent>,
    pub validation_results: Option<ValidationResult>,
    pub template_used: String,
    pub output_files: Vec<String>,
}

/// Reference sink that accumulates audit records in memory. Useful for
/// tests and for callers that persist records themselves after the run.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    sessions: Vec<AuditRecord>,
    counter: usize,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sessions(&self) -> &[AuditRecord] {
        &self.sessions
    }

    pub fn session(&self, session_id: &str) -> Option<&AuditRecord> {
        self.sessions.iter().find(|s| s.session_id == session_id)
    }

    fn session_mut(&mut self, session_id: &str) -> Option<&mut AuditRecord> {
        self.sessions.iter_mut().find(|s| s.session_id == session_id)
    }
}

impl AuditSink for MemoryAuditSink {
    fn start_session(&mut self, user_id: &str, source: &str, file_hash: &str) -> Result<String> {
        self.counter += 1;
        let session_id = format!(
            "{}-{:04}",
            Local::now().format("%Y%m%d%H%M%S"),
            self.counter
        );

        self.sessions.push(AuditRecord {
            session_id: session_id.clone(),
            user_id: user_id.to_string(),
            source: source.to_string(),
            input_file_hash: file_hash.to_string(),
            processing_start: Local::now(),
            processing_end: None,
            status: SessionStatus::InProgress,
            steps: Vec::new(),
            validation_results: None,
            template_used: String::new(),
            output_files: Vec::new(),
        });

        Ok(session_id)
    }

    fn record_step(&mut self, session_id: &str, event: StepEvent) -> Result<()> {
        if let Some(session) = self.session_mut(session_id) {
            session.steps.push(event);
        }
        Ok(())
    }

    fn set_template_used(&mut self, session_id: &str, template_id: &str) -> Result<()> {
        if let Some(session) = self.session_mut(session_id) {
            session.template_used = template_id.to_string();
        }
        Ok(())
    }

    fn add_validation_results(
        &mut self,
        session_id: &str,
        results: &ValidationResult,
    ) -> Result<()> {
        if let Some(session) = self.session_mut(session_id) {
            session.validation_results = Some(results.clone());
        }
        Ok(())
    }

    fn add_output_file(&mut self, session_id: &str, path: &str) -> Result<()> {
        if let Some(session) = self.session_mut(session_id) {
            session.output_files.push(path.to_string());
        }
        Ok(())
    }

    fn end_session(&mut self, session_id: &str, status: SessionStatus) -> Result<()> {
        if let Some(session) = self.session_mut(session_id) {
            session.status = status;
            session.processing_end = Some(Local::now());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_session_lifecycle() {
        let mut sink = MemoryAuditSink::new();
        let id = sink.start_session("analyst", "ledger.csv", "abc123").unwrap();

        sink.record_step(&id, StepEvent::started("data_ingestion", json!({"source": "ledger.csv"})))
            .unwrap();
        sink.record_step(&id, StepEvent::completed("data_ingestion", 12.5, Value::Null))
            .unwrap();
        sink.set_template_used(&id, "trial_balance").unwrap();
        sink.end_session(&id, SessionStatus::Completed).unwrap();

        let record = sink.session(&id).unwrap();
        assert_eq!(record.status, SessionStatus::Completed);
        assert_eq!(record.steps.len(), 2);
        assert_eq!(record.steps[0].status, StepStatus::Started);
        assert_eq!(record.steps[1].duration_ms, Some(12.5));
        assert_eq!(record.template_used, "trial_balance");
        assert!(record.processing_end.is_some());
    }

    #[test]
    fn test_unique_session_ids() {
        let mut sink = MemoryAuditSink::new();
        let a = sink.start_session("u", "a.csv", "").unwrap();
        let b = sink.start_session("u", "b.csv", "").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_event_serialization() {
        let event = StepEvent::failed("validation", 3.0, vec!["does not balance".to_string()]);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"failed\""));
        assert!(json.contains("does not balance"));
    }
}
