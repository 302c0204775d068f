//! Per-batch span registry.
//!
//! Every span opened inside a multiplex is registered under its batch id and
//! drained exactly once when the batch finishes. Batches never share an
//! entry, so concurrent requests cannot see each other's spans.
//!
//! A span that is still running when its batch drains, such as a lazy value
//! resolved on another task, is left to seal itself when it closes.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use phase_span::{BatchId, SpanId};

/// A span handed back by `drain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSpan {
    pub span: SpanId,
    /// Whether the span's phase had returned when the batch drained.
    pub closed: bool,
}

#[derive(Debug, Default)]
pub struct SpanRegistry {
    batches: Mutex<HashMap<BatchId, Vec<BatchSpan>>>,
}

impl SpanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<BatchId, Vec<BatchSpan>>> {
        self.batches.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn open_batch(&self, batch: BatchId) {
        self.lock().entry(batch).or_default();
    }

    /// Register `span` under `batch`. Returns false if the batch is unknown
    /// or already drained.
    pub fn register(&self, batch: BatchId, span: SpanId) -> bool {
        match self.lock().get_mut(&batch) {
            Some(spans) => {
                spans.push(BatchSpan {
                    span,
                    closed: false,
                });
                true
            }
            None => false,
        }
    }

    /// Record that `span` has closed. Returns true if the batch is still
    /// pending and will seal the span itself; false if the caller must.
    pub fn close(&self, batch: BatchId, span: SpanId) -> bool {
        let mut batches = self.lock();
        match batches
            .get_mut(&batch)
            .and_then(|spans| spans.iter_mut().find(|s| s.span == span))
        {
            Some(entry) => {
                entry.closed = true;
                true
            }
            None => false,
        }
    }

    /// Remove the batch and return its spans in open order.
    pub fn drain(&self, batch: BatchId) -> Option<Vec<BatchSpan>> {
        self.lock().remove(&batch)
    }

    /// Number of batches opened but not yet drained.
    pub fn pending_batches(&self) -> usize {
        self.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(spans: Vec<BatchSpan>) -> Vec<SpanId> {
        spans.into_iter().map(|s| s.span).collect()
    }

    #[test]
    fn test_register_and_drain_once() {
        let registry = SpanRegistry::new();
        let batch = BatchId::new();
        registry.open_batch(batch);

        let a = SpanId::new();
        let b = SpanId::new();
        assert!(registry.register(batch, a));
        assert!(registry.register(batch, b));
        assert_eq!(registry.pending_batches(), 1);

        assert_eq!(registry.drain(batch).map(ids), Some(vec![a, b]));
        assert_eq!(registry.drain(batch), None);
        assert_eq!(registry.pending_batches(), 0);
    }

    #[test]
    fn test_register_after_drain_fails() {
        let registry = SpanRegistry::new();
        let batch = BatchId::new();
        registry.open_batch(batch);
        registry.drain(batch);

        assert!(!registry.register(batch, SpanId::new()));
    }

    #[test]
    fn test_close_tracks_running_spans() {
        let registry = SpanRegistry::new();
        let batch = BatchId::new();
        registry.open_batch(batch);

        let done = SpanId::new();
        let running = SpanId::new();
        registry.register(batch, done);
        registry.register(batch, running);
        assert!(registry.close(batch, done));

        let drained = registry.drain(batch).unwrap();
        assert_eq!(
            drained,
            vec![
                BatchSpan { span: done, closed: true },
                BatchSpan { span: running, closed: false },
            ]
        );
        // Closing after the drain leaves sealing to the caller.
        assert!(!registry.close(batch, running));
    }

    #[test]
    fn test_batches_are_isolated() {
        let registry = SpanRegistry::new();
        let first = BatchId::new();
        let second = BatchId::new();
        registry.open_batch(first);
        registry.open_batch(second);

        let span = SpanId::new();
        registry.register(second, span);

        assert_eq!(registry.drain(first).map(ids), Some(vec![]));
        assert_eq!(registry.drain(second).map(ids), Some(vec![span]));
    }
}
