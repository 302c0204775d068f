//! Span instrumentation for the phases of a GraphQL execution pipeline.
//!
//! The execution engine calls the tracer around each lifecycle phase; the
//! tracer opens a span per phase through a pluggable [`SpanRecorder`],
//! tags it, and once a multiplex completes, names every span of the batch
//! after the operations it ran.
//!
//! # Span Hierarchy
//!
//! ```text
//! lex, parse                     (outside the batch)
//! execute_multiplex              (one per batch, resource = "Query1, Query2")
//!   └─ analyze_multiplex
//!   └─ validate, analyze_query, execute_query   (per operation)
//!        └─ authorized, resolve, execute_lazy   (per field)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use phase_span::InMemoryRecorder;
//! use phase_tracer::{Multiplex, Operation, PhaseData, Tracer, TracerConfig};
//!
//! let tracer = Tracer::builder()
//!     .config(TracerConfig::from_env())
//!     .recorder(Arc::new(InMemoryRecorder::new()))
//!     .tag_callback(|phase, data, span| {
//!         span.set_tag(&format!("custom:{phase}"), data.keys().join(","));
//!         Ok(())
//!     })
//!     .build()?;
//!
//! let op = Operation::query("query Ab { int }").with_name("Ab");
//! let multiplex = Multiplex::single(op.clone());
//! tracer.execute_multiplex(&multiplex, |cx| {
//!     cx.trace(PhaseData::ExecuteQuery { query: &op }, |cx| engine.run(cx, &op))
//! })?;
//! ```
//!
//! [`SpanRecorder`]: phase_span::SpanRecorder

pub mod config;
pub mod context;
pub mod error;
pub mod operation;
pub mod phase;
pub mod policy;
pub mod registry;
pub mod resolver;
pub mod tracer;

pub use config::{TracerConfig, TracerConfigBuilder};
pub use context::TraceContext;
pub use error::{ConfigError, EmptyMultiplex, PhaseError, TagError, TagResult};
pub use operation::{Arguments, FieldRef, Multiplex, Operation, OperationType};
pub use phase::{Phase, PhaseData};
pub use policy::{CallbackPolicy, NoopPolicy, PolicyChain, SpanTags, TagPolicy};
pub use resolver::{resolve_for_multiplex, resolve_resource_name};
pub use tracer::{Tracer, TracerBuilder};
