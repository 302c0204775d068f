//! In-memory span recorder.
//!
//! Keeps every span it is asked to open, in start order, and enforces that
//! sealed spans are immutable. Used by the test suites and handy for dumping
//! a trace as JSON while debugging an engine integration.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::warn;

use crate::recorder::{SpanRecorder, SpanStart};
use crate::span::{RecordedSpan, SpanId};

#[derive(Debug, Default)]
struct Store {
    spans: Vec<RecordedSpan>,
    rejected_writes: usize,
}

/// Recorder that stores spans in memory.
#[derive(Debug, Default)]
pub struct InMemoryRecorder {
    store: Mutex<Store>,
}

impl InMemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `write` to an unsealed span. Writes to sealed or unknown spans
    /// are dropped and counted.
    fn write(&self, id: SpanId, op: &'static str, write: impl FnOnce(&mut RecordedSpan)) {
        let mut guard = self.lock();
        let store = &mut *guard;
        match store.spans.iter_mut().find(|s| s.span_id == id) {
            Some(span) if !span.sealed => write(span),
            Some(_) => {
                warn!(span_id = %id, op, "write to sealed span rejected");
                store.rejected_writes += 1;
            }
            None => {
                warn!(span_id = %id, op, "write to unknown span rejected");
                store.rejected_writes += 1;
            }
        }
    }

    /// Snapshot of all spans in start order.
    pub fn spans(&self) -> Vec<RecordedSpan> {
        self.lock().spans.clone()
    }

    pub fn span(&self, id: SpanId) -> Option<RecordedSpan> {
        self.lock().spans.iter().find(|s| s.span_id == id).cloned()
    }

    /// All spans opened for `phase_key`, in start order.
    pub fn spans_for_phase(&self, phase_key: &str) -> Vec<RecordedSpan> {
        self.lock()
            .spans
            .iter()
            .filter(|s| s.phase_key == phase_key)
            .cloned()
            .collect()
    }

    /// Direct children of `parent`, in start order.
    pub fn children(&self, parent: SpanId) -> Vec<RecordedSpan> {
        self.lock()
            .spans
            .iter()
            .filter(|s| s.parent_span_id == Some(parent))
            .cloned()
            .collect()
    }

    /// Number of writes dropped because their span was sealed or unknown.
    pub fn rejected_writes(&self) -> usize {
        self.lock().rejected_writes
    }

    pub fn clear(&self) {
        let mut store = self.lock();
        store.spans.clear();
        store.rejected_writes = 0;
    }

    /// Serialize every recorded span as a JSON array.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.lock().spans)
    }
}

impl SpanRecorder for InMemoryRecorder {
    fn start_span(&self, start: SpanStart) -> SpanId {
        let id = SpanId::new();
        self.lock().spans.push(RecordedSpan::new(id, start));
        id
    }

    fn set_tag(&self, span: SpanId, key: &str, value: &str) {
        self.write(span, "set_tag", |s| s.set_tag(key, value));
    }

    fn set_resource(&self, span: SpanId, resource: &str) {
        self.write(span, "set_resource", |s| s.resource = Some(resource.to_string()));
    }

    fn mark_failed(&self, span: SpanId, error: &str) {
        self.write(span, "mark_failed", |s| s.fail(error));
    }

    fn close(&self, span: SpanId) {
        self.write(span, "close", RecordedSpan::close);
    }

    fn finish(&self, span: SpanId) {
        self.write(span, "finish", RecordedSpan::seal);
    }
}
