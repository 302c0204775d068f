//! Closure-backed tag policy for the `custom_tag_callback` option.

use std::fmt;
use std::sync::Arc;

use super::traits::{SpanTags, TagPolicy};
use crate::error::{TagError, TagResult};
use crate::phase::{Phase, PhaseData};

/// Signature of a caller-supplied tag callback.
pub type TagCallback =
    dyn Fn(Phase, &PhaseData<'_>, &mut SpanTags<'_>) -> anyhow::Result<()> + Send + Sync;

/// Runs a closure for every phase.
#[derive(Clone)]
pub struct CallbackPolicy {
    callback: Arc<TagCallback>,
}

impl CallbackPolicy {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(Phase, &PhaseData<'_>, &mut SpanTags<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }
}

impl fmt::Debug for CallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackPolicy").finish_non_exhaustive()
    }
}

impl TagPolicy for CallbackPolicy {
    fn name(&self) -> &str {
        "custom_tag_callback"
    }

    fn prepare_span(&self, data: &PhaseData<'_>, span: &mut SpanTags<'_>) -> TagResult<()> {
        (self.callback)(data.phase(), data, span).map_err(|e| TagError::new(self.name(), e))
    }
}
