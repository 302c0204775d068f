//! Span recorder backends for GraphQL phase instrumentation.
//!
//! This crate provides the outbound side of the phase tracer: the
//! [`SpanRecorder`] trait every tracing backend implements, and the span
//! model shared by the bundled backends.
//!
//! # Span Lifecycle
//!
//! ```text
//! start_span ──> set_tag* ──> close ──> set_resource? ──> finish
//!                (open)       (timing     (batch            (sealed,
//!                              stamped)    finalization)     immutable)
//! ```
//!
//! # Backends
//!
//! 1. `InMemoryRecorder` keeps every span for inspection and serialization.
//! 2. `TracingRecorder` forwards spans to the `tracing` ecosystem.
//! 3. `MockSpanRecorder` (feature `mock`) for call-order assertions in tests.

pub mod context;
pub mod memory;
pub mod recorder;
pub mod span;
pub mod tracing_recorder;

pub use context::{BatchId, SpanContext};
pub use memory::InMemoryRecorder;
#[cfg(any(test, feature = "mock"))]
pub use recorder::MockSpanRecorder;
pub use recorder::{SpanRecorder, SpanStart};
pub use span::{RecordedSpan, SpanId, SpanStatus};
pub use tracing_recorder::TracingRecorder;
