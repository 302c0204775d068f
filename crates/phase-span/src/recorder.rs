//! The outbound contract between the phase tracer and a tracing backend.

use serde::{Deserialize, Serialize};

use crate::context::SpanContext;
use crate::span::SpanId;

/// Everything a backend needs to open a span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanStart {
    /// Display name, e.g. `graphql.execute_query`.
    pub name: String,
    /// Pipeline phase key, e.g. `execute_query`.
    pub phase_key: String,
    pub service: String,
    pub context: SpanContext,
}

impl SpanStart {
    pub fn new(
        name: impl Into<String>,
        phase_key: impl Into<String>,
        service: impl Into<String>,
        context: SpanContext,
    ) -> Self {
        Self {
            name: name.into(),
            phase_key: phase_key.into(),
            service: service.into(),
            context,
        }
    }
}

/// A tracing backend.
///
/// Spans are addressed by the [`SpanId`] returned from `start_span`.
/// Implementations must be thread-safe: concurrent batches share one
/// recorder.
///
/// # Lifecycle
///
/// `close` marks the end of the phase. `finish` seals the span; a backend
/// must ignore any write to a sealed span. Between the two, the tracer may
/// still assign a resource once the whole batch is known.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait SpanRecorder: Send + Sync {
    /// Open a span and return its handle.
    fn start_span(&self, start: SpanStart) -> SpanId;

    fn set_tag(&self, span: SpanId, key: &str, value: &str);

    /// Assign the backend-level resource name.
    ///
    /// Backends that do not distinguish resource from name may rename the span.
    fn set_resource(&self, span: SpanId, resource: &str);

    /// Flag the span as failed with the error's display text.
    fn mark_failed(&self, span: SpanId, error: &str);

    /// The phase covered by the span has returned.
    fn close(&self, span: SpanId);

    /// Seal the span. No further writes are accepted.
    fn finish(&self, span: SpanId);

    /// The `tracing` span backing `span`, if the backend has one.
    ///
    /// The tracer enters it while the phase runs so that events emitted by
    /// the wrapped work are attributed to the phase.
    fn tracing_span(&self, _span: SpanId) -> Option<tracing::Span> {
        None
    }
}
