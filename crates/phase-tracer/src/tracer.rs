//! Phase tracer
//!
//! Wraps each lifecycle phase the execution engine runs in a span:
//!
//! 1. open the span (nested under the parent named by its trace context)
//! 2. run the caller's tag policy
//! 3. write the structural tags
//! 4. run the wrapped work inside the span, unless tagging failed
//! 5. mark the span failed on error, close it, and hand back the result
//!
//! Spans opened inside a multiplex stay unsealed until the batch finishes.
//! At that point the resource name is resolved once for the whole batch and
//! written to every one of its spans before they are sealed.
//!
//! Open spans and batches are held by drop guards. Work that panics, or an
//! async batch whose future is dropped mid-flight, still closes its spans
//! as failed and drains its batch.

use std::fmt::{self, Display};
use std::future::Future;
use std::sync::Arc;

use phase_span::{BatchId, SpanContext, SpanId, SpanRecorder, SpanStart};
use tracing::{debug, trace, warn, Instrument, Span};

use crate::config::TracerConfig;
use crate::context::TraceContext;
use crate::error::{ConfigError, PhaseError, TagResult};
use crate::operation::Multiplex;
use crate::phase::{Phase, PhaseData};
use crate::policy::{structural_tags, CallbackPolicy, PolicyChain, SpanTags, TagPolicy};
use crate::registry::SpanRegistry;
use crate::resolver::resolve_for_multiplex;

/// A phase span between open and close.
///
/// Dropped without `complete`, the phase was cancelled or unwound and the
/// span is closed as failed.
struct SpanGuard<'t> {
    tracer: &'t Tracer,
    id: SpanId,
    phase: Phase,
    /// Batch the span is registered with, if any.
    batch: Option<BatchId>,
    outcome: Option<Option<String>>,
}

impl SpanGuard<'_> {
    fn complete(mut self, failure: Option<String>) {
        self.outcome = Some(failure);
    }
}

impl Drop for SpanGuard<'_> {
    fn drop(&mut self) {
        let failure = match self.outcome.take() {
            Some(failure) => failure,
            None => {
                let reason = if std::thread::panicking() {
                    "phase panicked"
                } else {
                    "phase cancelled"
                };
                warn!(span_id = %self.id, phase = %self.phase, reason, "phase did not return");
                Some(reason.to_string())
            }
        };
        self.tracer.exit(self.id, self.batch, failure);
    }
}

/// A running multiplex. Dropping it finishes the batch; a batch that never
/// recorded an outcome counts as failed.
struct BatchGuard<'t> {
    tracer: &'t Tracer,
    cx: TraceContext,
    completed: Option<bool>,
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        let completed = self.completed.unwrap_or_else(|| {
            warn!(batch_id = %self.cx.id(), "multiplex did not return");
            false
        });
        self.tracer.finish_batch(&self.cx, completed);
    }
}

struct TracerInner {
    config: TracerConfig,
    recorder: Arc<dyn SpanRecorder>,
    policy: PolicyChain,
    registry: SpanRegistry,
}

/// Instruments execution phases. Cheap to clone; clones share the recorder
/// and the batch registry.
#[derive(Clone)]
pub struct Tracer {
    inner: Arc<TracerInner>,
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer")
            .field("config", &self.inner.config)
            .field("policy", &self.inner.policy)
            .field("pending_batches", &self.inner.registry.pending_batches())
            .finish()
    }
}

impl Tracer {
    /// Tracer with default configuration and no tag policy.
    pub fn new(recorder: Arc<dyn SpanRecorder>) -> Self {
        Self::from_parts(TracerConfig::default(), recorder, PolicyChain::new())
    }

    pub fn builder() -> TracerBuilder {
        TracerBuilder::new()
    }

    fn from_parts(config: TracerConfig, recorder: Arc<dyn SpanRecorder>, policy: PolicyChain) -> Self {
        Self {
            inner: Arc::new(TracerInner {
                config,
                recorder,
                policy,
                registry: SpanRegistry::new(),
            }),
        }
    }

    pub fn config(&self) -> &TracerConfig {
        &self.inner.config
    }

    pub fn recorder(&self) -> &Arc<dyn SpanRecorder> {
        &self.inner.recorder
    }

    pub(crate) fn registry(&self) -> &SpanRegistry {
        &self.inner.registry
    }

    /// Batches started but not yet finished.
    pub fn pending_batches(&self) -> usize {
        self.inner.registry.pending_batches()
    }

    /// Resource name this tracer assigns to the spans of `multiplex`.
    pub fn resource_name(&self, multiplex: &Multiplex) -> Option<String> {
        resolve_for_multiplex(
            multiplex,
            self.inner.config.fallback_transaction_name.as_deref(),
        )
    }

    /// Trace a phase that runs outside any batch, such as lexing or parsing
    /// a document before it is multiplexed.
    ///
    /// An `ExecuteMultiplex` bundle starts a batch; its nested phases are
    /// only attributed to it when traced through `execute_multiplex`.
    pub fn trace<T, E, F>(&self, data: PhaseData<'_>, work: F) -> Result<T, PhaseError<E>>
    where
        F: FnOnce() -> Result<T, PhaseError<E>>,
        E: Display,
    {
        if let PhaseData::ExecuteMultiplex { multiplex } = data {
            return self.execute_multiplex(multiplex, |_| work());
        }
        self.run(None, &data, |_| work())
    }

    fn begin_batch(&self, multiplex: &Multiplex) -> BatchGuard<'_> {
        BatchGuard {
            tracer: self,
            cx: TraceContext::begin(self.clone(), multiplex),
            completed: None,
        }
    }

    /// Trace a whole multiplex.
    ///
    /// `work` receives the batch's `TraceContext` and traces nested phases
    /// through it.
    pub fn execute_multiplex<T, E, F>(&self, multiplex: &Multiplex, work: F) -> Result<T, PhaseError<E>>
    where
        F: FnOnce(&TraceContext) -> Result<T, PhaseError<E>>,
        E: Display,
    {
        let mut batch = self.begin_batch(multiplex);
        let data = PhaseData::ExecuteMultiplex { multiplex };
        let result = self.run(Some(&batch.cx), &data, |span| work(&batch.cx.nested(span)));
        batch.completed = Some(result.is_ok());
        result
    }

    /// Async form of `execute_multiplex`, for engines that resolve lazy
    /// values by awaiting them.
    pub async fn execute_multiplex_async<T, E, F, Fut>(
        &self,
        multiplex: &Multiplex,
        work: F,
    ) -> Result<T, PhaseError<E>>
    where
        F: FnOnce(TraceContext) -> Fut,
        Fut: Future<Output = Result<T, PhaseError<E>>>,
        E: Display,
    {
        let mut batch = self.begin_batch(multiplex);
        let data = PhaseData::ExecuteMultiplex { multiplex };
        let result = self
            .run_async(Some(&batch.cx), &data, |span| work(batch.cx.nested(span)))
            .await;
        batch.completed = Some(result.is_ok());
        result
    }

    /// Run `work` inside a span for `data`. `work` is handed the new span,
    /// or `None` when tracing is disabled.
    pub(crate) fn run<T, E, F>(
        &self,
        cx: Option<&TraceContext>,
        data: &PhaseData<'_>,
        work: F,
    ) -> Result<T, PhaseError<E>>
    where
        F: FnOnce(Option<SpanId>) -> Result<T, PhaseError<E>>,
        E: Display,
    {
        if !self.inner.config.enabled {
            return work(None);
        }

        let (span, tagging) = self.enter(cx, data);
        let result = match tagging {
            Ok(()) => self.phase_span(span.id).in_scope(|| work(Some(span.id))),
            Err(source) => Err(PhaseError::Tagging {
                phase: span.phase,
                source,
            }),
        };
        span.complete(failure_message(&result));
        result
    }

    pub(crate) async fn run_async<T, E, F, Fut>(
        &self,
        cx: Option<&TraceContext>,
        data: &PhaseData<'_>,
        work: F,
    ) -> Result<T, PhaseError<E>>
    where
        F: FnOnce(Option<SpanId>) -> Fut,
        Fut: Future<Output = Result<T, PhaseError<E>>>,
        E: Display,
    {
        if !self.inner.config.enabled {
            return work(None).await;
        }

        let (span, tagging) = self.enter(cx, data);
        let result = match tagging {
            Ok(()) => {
                let phase_span = self.phase_span(span.id);
                let future = phase_span.in_scope(|| work(Some(span.id)));
                future.instrument(phase_span).await
            }
            Err(source) => Err(PhaseError::Tagging {
                phase: span.phase,
                source,
            }),
        };
        span.complete(failure_message(&result));
        result
    }

    /// The `tracing` span the wrapped work runs in.
    fn phase_span(&self, id: SpanId) -> Span {
        self.inner.recorder.tracing_span(id).unwrap_or_else(Span::none)
    }

    fn enter(&self, cx: Option<&TraceContext>, data: &PhaseData<'_>) -> (SpanGuard<'_>, TagResult<()>) {
        let inner = &*self.inner;
        let phase = data.phase();

        let context = cx.map_or_else(SpanContext::root, |cx| {
            SpanContext::in_batch(cx.id(), cx.parent_span())
        });
        let id = inner.recorder.start_span(SpanStart::new(
            phase.span_name(&inner.config.span_prefix),
            phase.key(),
            inner.config.service_name.as_str(),
            context,
        ));

        let batch = cx.and_then(|cx| {
            if inner.registry.register(cx.id(), id) {
                Some(cx.id())
            } else {
                warn!(batch_id = %cx.id(), %phase, "span opened after its batch finished");
                None
            }
        });
        let span = SpanGuard {
            tracer: self,
            id,
            phase,
            batch,
            outcome: None,
        };
        trace!(span_id = %id, %phase, "opened phase span");

        let mut tags = SpanTags::new(inner.recorder.as_ref(), id, phase);
        let tagging = match inner.policy.prepare_span(data, &mut tags) {
            Err(err) if inner.config.fail_open_tag_callback => {
                warn!(%phase, error = %err, "tag policy failed, continuing");
                Ok(())
            }
            other => other,
        };

        for (key, value) in structural_tags(data) {
            inner.recorder.set_tag(id, key, &value);
        }

        (span, tagging)
    }

    fn exit(&self, id: SpanId, batch: Option<BatchId>, failure: Option<String>) {
        let recorder = &self.inner.recorder;
        if let Some(error) = failure {
            recorder.mark_failed(id, &error);
        }
        recorder.close(id);

        let sealed_by_batch = batch.is_some_and(|batch| self.inner.registry.close(batch, id));
        if !sealed_by_batch {
            recorder.finish(id);
        }
    }

    /// Assign the resource name to every span of the batch and seal the
    /// ones that have closed. Spans still running seal themselves on close.
    ///
    /// The resource is only written when the batch completed and a name
    /// could be resolved; otherwise the backend default stays in place.
    fn finish_batch(&self, cx: &TraceContext, completed: bool) {
        let recorder = &self.inner.recorder;
        let spans = self.inner.registry.drain(cx.id()).unwrap_or_default();
        let resource = if completed {
            self.resource_name(cx.multiplex())
        } else {
            None
        };

        if let Some(resource) = &resource {
            for span in &spans {
                recorder.set_resource(span.span, resource);
            }
        }
        let mut running = 0;
        for span in &spans {
            if span.closed {
                recorder.finish(span.span);
            } else {
                running += 1;
            }
        }

        debug!(
            batch_id = %cx.id(),
            spans = spans.len(),
            running,
            resource = ?resource,
            completed,
            "finished batch"
        );
    }
}

fn failure_message<T, E: Display>(result: &Result<T, PhaseError<E>>) -> Option<String> {
    result.as_ref().err().map(ToString::to_string)
}

/// Builder for `Tracer`
#[derive(Default)]
pub struct TracerBuilder {
    config: TracerConfig,
    recorder: Option<Arc<dyn SpanRecorder>>,
    policy: PolicyChain,
}

impl fmt::Debug for TracerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracerBuilder")
            .field("config", &self.config)
            .field("has_recorder", &self.recorder.is_some())
            .field("policy", &self.policy)
            .finish()
    }
}

impl TracerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: TracerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn recorder(mut self, recorder: Arc<dyn SpanRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Add a tag policy. Policies run in the order they are added.
    pub fn policy<P: TagPolicy + 'static>(mut self, policy: P) -> Self {
        self.policy.add_policy(policy);
        self
    }

    /// Register the `custom_tag_callback`.
    pub fn tag_callback<F>(self, callback: F) -> Self
    where
        F: Fn(Phase, &PhaseData<'_>, &mut SpanTags<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.policy(CallbackPolicy::new(callback))
    }

    pub fn build(self) -> Result<Tracer, ConfigError> {
        self.config.validate()?;
        let recorder = self.recorder.ok_or(ConfigError::MissingRecorder)?;
        Ok(Tracer::from_parts(self.config, recorder, self.policy))
    }
}
