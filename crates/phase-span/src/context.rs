//! Identifiers linking a span back to the batch and parent it was opened in.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::span::SpanId;

/// Identifier of one multiplex execution.
///
/// Every span opened while a batch is running carries the batch id, so
/// concurrent batches never have to be told apart by call order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(Uuid);

impl BatchId {
    /// Allocate a fresh batch id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Where a new span sits in the trace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanContext {
    /// Batch the span belongs to, if it was opened inside a multiplex.
    pub batch_id: Option<BatchId>,
    /// Innermost span open at the time this span was started.
    pub parent_span_id: Option<SpanId>,
}

impl SpanContext {
    /// Context for a span opened outside any batch.
    pub fn root() -> Self {
        Self::default()
    }

    /// Context for a span opened inside `batch_id`.
    pub fn in_batch(batch_id: BatchId, parent_span_id: Option<SpanId>) -> Self {
        Self {
            batch_id: Some(batch_id),
            parent_span_id,
        }
    }
}
