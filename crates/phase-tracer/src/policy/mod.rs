//! Span tag policies
//!
//! Every span gets two layers of tags:
//!
//! - **Caller tags** from a `TagPolicy` (a custom policy, the configured tag
//!   callback, or a `PolicyChain` of both), written first.
//! - **Structural tags** (`source`, `operation.type`), written last so no
//!   policy can replace them.

pub mod callback;
pub mod chain;
pub mod structural;
pub mod traits;

pub use callback::{CallbackPolicy, TagCallback};
pub use chain::PolicyChain;
pub use structural::{multiplex_source, structural_tags, OPERATION_TYPE_TAG, SOURCE_TAG};
pub use traits::{NoopPolicy, SpanTags, TagPolicy};
