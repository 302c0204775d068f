//! Core traits for span tag policies
//!
//! A `TagPolicy` adds caller-defined tags to the span of each phase. The
//! tracer owns the span lifecycle; a policy only ever sees a `SpanTags`
//! view, which can add tags but cannot remove them or touch the resource.

use std::fmt;

use phase_span::{SpanId, SpanRecorder};

use crate::error::TagResult;
use crate::phase::{Phase, PhaseData};

/// Write access to the tags of the span currently being prepared.
pub struct SpanTags<'a> {
    recorder: &'a dyn SpanRecorder,
    span: SpanId,
    phase: Phase,
}

impl<'a> SpanTags<'a> {
    pub fn new(recorder: &'a dyn SpanRecorder, span: SpanId, phase: Phase) -> Self {
        Self {
            recorder,
            span,
            phase,
        }
    }

    pub fn set_tag(&mut self, key: &str, value: impl AsRef<str>) {
        self.recorder.set_tag(self.span, key, value.as_ref());
    }

    pub fn span_id(&self) -> SpanId {
        self.span
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

impl fmt::Debug for SpanTags<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpanTags")
            .field("span", &self.span)
            .field("phase", &self.phase)
            .finish()
    }
}

/// Caller-defined tagging, run for every phase before the structural tags.
///
/// # Error Handling
///
/// A returned error fails the phase with `PhaseError::Tagging` unless the
/// tracer is configured to fail open.
pub trait TagPolicy: Send + Sync + fmt::Debug {
    /// Name used in error messages and logs
    fn name(&self) -> &str;

    /// Add tags to the span of the phase described by `data`.
    fn prepare_span(&self, data: &PhaseData<'_>, span: &mut SpanTags<'_>) -> TagResult<()>;
}

/// Policy that adds nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPolicy;

impl TagPolicy for NoopPolicy {
    fn name(&self) -> &str {
        "noop"
    }

    fn prepare_span(&self, _data: &PhaseData<'_>, _span: &mut SpanTags<'_>) -> TagResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phase_span::{InMemoryRecorder, SpanContext, SpanStart};

    #[test]
    fn test_span_tags_write_through() {
        let recorder = InMemoryRecorder::new();
        let id = recorder.start_span(SpanStart::new(
            "graphql.lex",
            "lex",
            "graphql",
            SpanContext::root(),
        ));

        let mut tags = SpanTags::new(&recorder, id, Phase::Lex);
        tags.set_tag("custom:lex", "query_string");
        tags.set_tag("owned", String::from("value"));

        let span = recorder.span(id).unwrap();
        assert_eq!(span.tag("custom:lex"), Some("query_string"));
        assert_eq!(span.tag("owned"), Some("value"));
        assert_eq!(tags.span_id(), id);
        assert_eq!(tags.phase(), Phase::Lex);
    }

    #[test]
    fn test_noop_policy() {
        let recorder = InMemoryRecorder::new();
        let id = recorder.start_span(SpanStart::new(
            "graphql.parse",
            "parse",
            "graphql",
            SpanContext::root(),
        ));
        let mut tags = SpanTags::new(&recorder, id, Phase::Parse);

        NoopPolicy
            .prepare_span(&PhaseData::Parse { query_string: "{ a }" }, &mut tags)
            .unwrap();
        assert!(recorder.span(id).unwrap().tags.is_empty());
    }
}
