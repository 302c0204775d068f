//! Fixed tags every span of a phase carries.
//!
//! These are applied after the caller's policy, so a policy writing the
//! same key is overwritten. `source` always precedes `operation.type`.

use crate::operation::Multiplex;
use crate::phase::PhaseData;

pub const SOURCE_TAG: &str = "source";
pub const OPERATION_TYPE_TAG: &str = "operation.type";

/// Structural tags for `data`, in write order.
pub fn structural_tags(data: &PhaseData<'_>) -> Vec<(&'static str, String)> {
    match *data {
        PhaseData::Lex { query_string } | PhaseData::Parse { query_string } => {
            vec![(SOURCE_TAG, query_string.to_string())]
        }
        PhaseData::Validate { query, .. } => vec![(SOURCE_TAG, query.source_text.clone())],
        PhaseData::ExecuteQuery { query } => vec![
            (SOURCE_TAG, query.source_text.clone()),
            (OPERATION_TYPE_TAG, query.operation_type.to_string()),
        ],
        PhaseData::ExecuteMultiplex { multiplex } => {
            vec![(SOURCE_TAG, multiplex_source(multiplex))]
        }
        PhaseData::AnalyzeMultiplex { .. }
        | PhaseData::AnalyzeQuery { .. }
        | PhaseData::ExecuteLazy { .. }
        | PhaseData::Authorized { .. }
        | PhaseData::Resolve { .. } => Vec::new(),
    }
}

/// `Multiplex[<source>, <source>, ...]`
pub fn multiplex_source(multiplex: &Multiplex) -> String {
    let sources: Vec<&str> = multiplex
        .operations()
        .iter()
        .map(|op| op.source_text.as_str())
        .collect();
    format!("Multiplex[{}]", sources.join(", "))
}
