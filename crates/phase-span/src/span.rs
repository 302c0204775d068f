//! Recorded span types.
//!
//! Defines `RecordedSpan`, `SpanId` and `SpanStatus`, the backend-neutral
//! shape of one instrumented pipeline phase.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::{BatchId, SpanContext};
use crate::recorder::SpanStart;

/// Opaque handle for a span issued by a recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpanId(Uuid);

impl SpanId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SpanId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Status of a recorded span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanStatus {
    Running,
    Completed,
    Failed,
}

/// A single span as seen by the in-memory backend.
///
/// `resource` stays `None` until a resource is explicitly assigned, so
/// "never set" and "set to the empty string" remain distinguishable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedSpan {
    pub span_id: SpanId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<SpanId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<BatchId>,
    pub phase_key: String,
    pub name: String,
    pub service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    pub status: SpanStatus,
    pub tags: HashMap<String, String>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set by `finish`; a sealed span rejects every further write.
    pub sealed: bool,
}

impl RecordedSpan {
    /// Create a running span from a start request.
    pub fn new(span_id: SpanId, start: SpanStart) -> Self {
        let SpanContext {
            batch_id,
            parent_span_id,
        } = start.context;

        Self {
            span_id,
            parent_span_id,
            batch_id,
            phase_key: start.phase_key,
            name: start.name,
            service: start.service,
            resource: None,
            status: SpanStatus::Running,
            tags: HashMap::new(),
            started_at: Utc::now(),
            ended_at: None,
            duration_ms: None,
            error: None,
            sealed: false,
        }
    }

    /// Whether the phase this span covers is still running.
    pub fn is_open(&self) -> bool {
        self.status == SpanStatus::Running
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn set_tag(&mut self, key: &str, value: &str) {
        self.tags.insert(key.to_string(), value.to_string());
    }

    /// Record an error. The status flips to `Failed` when the span closes.
    pub fn fail(&mut self, error: &str) {
        self.error = Some(error.to_string());
    }

    /// Stamp the end of the phase.
    pub fn close(&mut self) {
        if !self.is_open() {
            return;
        }
        let now = Utc::now();
        self.status = if self.error.is_some() {
            SpanStatus::Failed
        } else {
            SpanStatus::Completed
        };
        self.ended_at = Some(now);
        self.duration_ms = Some((now - self.started_at).num_milliseconds().max(0) as u64);
    }

    /// Seal the span. Closes it first if the phase never reported completion.
    pub fn seal(&mut self) {
        self.close();
        self.sealed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(phase: &str) -> SpanStart {
        SpanStart::new(format!("graphql.{phase}"), phase, "graphql", SpanContext::root())
    }

    #[test]
    fn test_new_span_is_running() {
        let span = RecordedSpan::new(SpanId::new(), start("parse"));

        assert_eq!(span.status, SpanStatus::Running);
        assert_eq!(span.name, "graphql.parse");
        assert_eq!(span.phase_key, "parse");
        assert!(span.resource.is_none());
        assert!(span.is_open());
        assert!(!span.sealed);
    }

    #[test]
    fn test_close_span() {
        let mut span = RecordedSpan::new(SpanId::new(), start("lex"));
        span.close();

        assert_eq!(span.status, SpanStatus::Completed);
        assert!(span.ended_at.is_some());
        assert!(span.duration_ms.is_some());
        assert!(span.error.is_none());
    }

    #[test]
    fn test_fail_then_close() {
        let mut span = RecordedSpan::new(SpanId::new(), start("validate"));
        span.fail("syntax error");
        span.close();

        assert_eq!(span.status, SpanStatus::Failed);
        assert_eq!(span.error.as_deref(), Some("syntax error"));
    }

    #[test]
    fn test_seal_closes_open_span() {
        let mut span = RecordedSpan::new(SpanId::new(), start("resolve"));
        span.seal();

        assert!(span.sealed);
        assert_eq!(span.status, SpanStatus::Completed);
    }

    #[test]
    fn test_json_omits_unset_resource() {
        let mut span = RecordedSpan::new(SpanId::new(), start("execute_query"));
        span.set_tag("source", "{ int }");
        span.seal();

        let json = serde_json::to_value(&span).unwrap();
        assert!(json.get("resource").is_none());
        assert_eq!(json["tags"]["source"], "{ int }");

        let back: RecordedSpan = serde_json::from_value(json).unwrap();
        assert_eq!(back.span_id, span.span_id);
        assert!(back.resource.is_none());
    }
}
