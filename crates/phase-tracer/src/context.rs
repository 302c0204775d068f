//! Per-batch trace context.
//!
//! A `TraceContext` belongs to exactly one `execute_multiplex` call. It names
//! the batch and the span that phases traced through it nest under. Tracing
//! a phase hands the wrapped work a child context whose parent is the new
//! span, so nesting follows the data flow of the engine rather than the
//! order in which concurrent phases happen to open.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use phase_span::{BatchId, SpanId};

use crate::error::PhaseError;
use crate::operation::{Multiplex, Operation};
use crate::phase::PhaseData;
use crate::tracer::Tracer;

#[derive(Debug)]
struct BatchState {
    id: BatchId,
    tracer: Tracer,
    multiplex: Multiplex,
}

/// Trace state of one running multiplex, positioned at one span.
///
/// Cloning is cheap and yields a handle to the same batch and parent, which
/// is how a lazy continuation carries its batch onto another task.
#[derive(Clone)]
pub struct TraceContext {
    batch: Arc<BatchState>,
    parent: Option<SpanId>,
}

impl std::fmt::Debug for TraceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceContext")
            .field("batch_id", &self.batch.id)
            .field("operations", &self.batch.multiplex.len())
            .field("parent", &self.parent)
            .finish()
    }
}

impl TraceContext {
    pub(crate) fn begin(tracer: Tracer, multiplex: &Multiplex) -> Self {
        let id = BatchId::new();
        tracer.registry().open_batch(id);
        Self {
            batch: Arc::new(BatchState {
                id,
                tracer,
                multiplex: multiplex.clone(),
            }),
            parent: None,
        }
    }

    pub fn id(&self) -> BatchId {
        self.batch.id
    }

    pub fn multiplex(&self) -> &Multiplex {
        &self.batch.multiplex
    }

    pub fn operations(&self) -> &[Operation] {
        self.batch.multiplex.operations()
    }

    pub(crate) fn tracer(&self) -> &Tracer {
        &self.batch.tracer
    }

    /// Span that phases traced through this context nest under.
    pub fn parent_span(&self) -> Option<SpanId> {
        self.parent
    }

    /// Context for the work of `span`. With tracing disabled no span is
    /// opened and the parent stays where it was.
    pub(crate) fn nested(&self, span: Option<SpanId>) -> Self {
        Self {
            batch: Arc::clone(&self.batch),
            parent: span.or(self.parent),
        }
    }

    /// Trace a phase of this batch. `work` receives the context its own
    /// nested phases are traced through.
    pub fn trace<T, E, F>(&self, data: PhaseData<'_>, work: F) -> Result<T, PhaseError<E>>
    where
        F: FnOnce(&TraceContext) -> Result<T, PhaseError<E>>,
        E: Display,
    {
        self.tracer()
            .run(Some(self), &data, |span| work(&self.nested(span)))
    }

    /// Async form of `trace`. Concurrent siblings may be awaited together;
    /// each nests its own phases under its own span.
    pub async fn trace_async<T, E, F, Fut>(
        &self,
        data: PhaseData<'_>,
        work: F,
    ) -> Result<T, PhaseError<E>>
    where
        F: FnOnce(TraceContext) -> Fut,
        Fut: Future<Output = Result<T, PhaseError<E>>>,
        E: Display,
    {
        self.tracer()
            .run_async(Some(self), &data, |span| work(self.nested(span)))
            .await
    }

    /// Trace the resolution of a lazy value.
    ///
    /// The parent is fixed now; the span itself opens when the returned
    /// future is first polled, on whichever task that happens. The returned
    /// future does not borrow `self`.
    pub fn trace_lazy<'a, T, E, F, Fut>(
        &self,
        data: PhaseData<'a>,
        lazy: F,
    ) -> impl Future<Output = Result<T, PhaseError<E>>> + 'a
    where
        F: FnOnce(TraceContext) -> Fut + 'a,
        Fut: Future<Output = Result<T, PhaseError<E>>> + 'a,
        E: Display + 'a,
        T: 'a,
    {
        let cx = self.clone();
        async move {
            cx.tracer()
                .run_async(Some(&cx), &data, |span| lazy(cx.nested(span)))
                .await
        }
    }
}
