//! Span recorder backed by the `tracing` ecosystem.
//!
//! Each recorder span becomes a `tracing` span named `graphql.phase` with the
//! display name in `otel.name`, so OpenTelemetry layers pick it up unchanged.
//! `tracing` spans only carry fields declared up front, so tags are emitted
//! as events inside the span instead.
//!
//! The tracer enters the span returned by `tracing_span` for as long as the
//! phase runs, so busy time and events emitted by the wrapped work land on
//! the phase span. The span itself stays open until `finish`, because the
//! resource of a batch span is only known once the batch completes.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::field::{display, Empty};
use tracing::{debug, trace, warn, Span};

use crate::recorder::{SpanRecorder, SpanStart};
use crate::span::SpanId;

/// Tracing target for every span and event this recorder emits.
pub const TARGET: &str = "graphql_trace";

/// Recorder that forwards to `tracing`.
///
/// Spans stay alive in the recorder until `finish`, which drops them and
/// lets subscribers observe the close.
#[derive(Debug, Default)]
pub struct TracingRecorder {
    spans: Mutex<HashMap<SpanId, Span>>,
}

impl TracingRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SpanId, Span>> {
        self.spans.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_span(&self, id: SpanId, op: &'static str, f: impl FnOnce(&Span)) {
        match self.lock().get(&id) {
            Some(span) => f(span),
            None => warn!(target: TARGET, span_id = %id, op, "no live tracing span"),
        }
    }

    /// Number of spans started but not yet finished.
    pub fn live_spans(&self) -> usize {
        self.lock().len()
    }
}

impl SpanRecorder for TracingRecorder {
    fn start_span(&self, start: SpanStart) -> SpanId {
        let id = SpanId::new();
        let mut spans = self.lock();

        let parent = start
            .context
            .parent_span_id
            .and_then(|p| spans.get(&p))
            .and_then(Span::id)
            .or_else(|| Span::current().id());

        let span = tracing::info_span!(
            target: TARGET,
            parent: parent,
            "graphql.phase",
            otel.name = %start.name,
            phase = %start.phase_key,
            service = %start.service,
            batch_id = Empty,
            resource = Empty,
            error = Empty,
        );
        if let Some(batch) = start.context.batch_id {
            span.record("batch_id", display(batch));
        }

        spans.insert(id, span);
        id
    }

    fn set_tag(&self, span: SpanId, key: &str, value: &str) {
        self.with_span(span, "set_tag", |s| {
            s.in_scope(|| debug!(target: TARGET, tag_key = key, tag_value = value, "span tag"))
        });
    }

    fn set_resource(&self, span: SpanId, resource: &str) {
        self.with_span(span, "set_resource", |s| {
            s.record("resource", resource);
        });
    }

    fn mark_failed(&self, span: SpanId, error: &str) {
        self.with_span(span, "mark_failed", |s| {
            s.record("error", error);
        });
    }

    fn close(&self, span: SpanId) {
        self.with_span(span, "close", |s| {
            s.in_scope(|| trace!(target: TARGET, "phase returned"))
        });
    }

    fn finish(&self, span: SpanId) {
        if self.lock().remove(&span).is_none() {
            warn!(target: TARGET, span_id = %span, "finish on unknown span");
        }
    }

    fn tracing_span(&self, span: SpanId) -> Option<Span> {
        self.lock().get(&span).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{BatchId, SpanContext};

    fn init_logging() {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .try_init();
    }

    #[test]
    fn test_spans_live_until_finish() {
        init_logging();
        let recorder = TracingRecorder::new();
        let batch = BatchId::new();
        let root = recorder.start_span(SpanStart::new(
            "graphql.execute_multiplex",
            "execute_multiplex",
            "graphql",
            SpanContext::in_batch(batch, None),
        ));
        let child = recorder.start_span(SpanStart::new(
            "graphql.execute_query",
            "execute_query",
            "graphql",
            SpanContext::in_batch(batch, Some(root)),
        ));
        recorder.set_tag(child, "source", "{ int }");
        recorder.close(child);
        recorder.close(root);
        assert_eq!(recorder.live_spans(), 2);

        recorder.set_resource(root, "Ab");
        recorder.finish(child);
        recorder.finish(root);
        assert_eq!(recorder.live_spans(), 0);
    }

    #[test]
    fn test_tag_events_and_entered_span() {
        init_logging();
        let recorder = TracingRecorder::new();
        let id = recorder.start_span(SpanStart::new(
            "graphql.resolve",
            "resolve",
            "graphql",
            SpanContext::root(),
        ));
        recorder.set_tag(id, "custom:resolve", "arguments,ast_node,field,object,query");

        let span = recorder.tracing_span(id).unwrap();
        span.in_scope(|| assert_eq!(Span::current().id(), span.id()));

        recorder.finish(id);
        assert!(recorder.tracing_span(id).is_none());
    }

    #[test]
    fn test_unknown_span_is_ignored() {
        init_logging();
        let recorder = TracingRecorder::new();
        recorder.set_tag(SpanId::new(), "k", "v");
        recorder.finish(SpanId::new());
        assert_eq!(recorder.live_spans(), 0);
    }
}
