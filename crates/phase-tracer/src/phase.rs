//! Pipeline phases and the data each one hands to the tracer.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::operation::{Arguments, FieldRef, Multiplex, Operation};

/// A lifecycle phase of the execution engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Lex,
    Parse,
    Validate,
    AnalyzeMultiplex,
    AnalyzeQuery,
    ExecuteMultiplex,
    ExecuteQuery,
    ExecuteLazy,
    Authorized,
    Resolve,
}

impl Phase {
    pub const ALL: [Phase; 10] = [
        Phase::Lex,
        Phase::Parse,
        Phase::Validate,
        Phase::AnalyzeMultiplex,
        Phase::AnalyzeQuery,
        Phase::ExecuteMultiplex,
        Phase::ExecuteQuery,
        Phase::ExecuteLazy,
        Phase::Authorized,
        Phase::Resolve,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Phase::Lex => "lex",
            Phase::Parse => "parse",
            Phase::Validate => "validate",
            Phase::AnalyzeMultiplex => "analyze_multiplex",
            Phase::AnalyzeQuery => "analyze_query",
            Phase::ExecuteMultiplex => "execute_multiplex",
            Phase::ExecuteQuery => "execute_query",
            Phase::ExecuteLazy => "execute_lazy",
            Phase::Authorized => "authorized",
            Phase::Resolve => "resolve",
        }
    }

    /// Span name for this phase under `prefix`, e.g. `graphql.parse`.
    pub fn span_name(&self, prefix: &str) -> String {
        format!("{}.{}", prefix, self.key())
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Data bundle the engine supplies for one phase invocation.
///
/// Each variant is the only shape its phase accepts.
#[derive(Debug, Clone, Copy)]
pub enum PhaseData<'a> {
    Lex {
        query_string: &'a str,
    },
    Parse {
        query_string: &'a str,
    },
    Validate {
        query: &'a Operation,
        validate: bool,
    },
    AnalyzeMultiplex {
        multiplex: &'a Multiplex,
    },
    AnalyzeQuery {
        query: &'a Operation,
    },
    ExecuteMultiplex {
        multiplex: &'a Multiplex,
    },
    ExecuteQuery {
        query: &'a Operation,
    },
    ExecuteLazy {
        query: &'a Operation,
        field: &'a FieldRef,
    },
    Authorized {
        query: &'a Operation,
        type_name: &'a str,
        object: &'a Value,
    },
    Resolve {
        query: &'a Operation,
        field: &'a FieldRef,
        object: &'a Value,
        arguments: &'a Arguments,
        ast_node: &'a str,
    },
}

impl<'a> PhaseData<'a> {
    pub fn phase(&self) -> Phase {
        match self {
            PhaseData::Lex { .. } => Phase::Lex,
            PhaseData::Parse { .. } => Phase::Parse,
            PhaseData::Validate { .. } => Phase::Validate,
            PhaseData::AnalyzeMultiplex { .. } => Phase::AnalyzeMultiplex,
            PhaseData::AnalyzeQuery { .. } => Phase::AnalyzeQuery,
            PhaseData::ExecuteMultiplex { .. } => Phase::ExecuteMultiplex,
            PhaseData::ExecuteQuery { .. } => Phase::ExecuteQuery,
            PhaseData::ExecuteLazy { .. } => Phase::ExecuteLazy,
            PhaseData::Authorized { .. } => Phase::Authorized,
            PhaseData::Resolve { .. } => Phase::Resolve,
        }
    }

    /// Names of the values in this bundle, sorted.
    pub fn keys(&self) -> &'static [&'static str] {
        match self {
            PhaseData::Lex { .. } | PhaseData::Parse { .. } => &["query_string"],
            PhaseData::Validate { .. } => &["query", "validate"],
            PhaseData::AnalyzeMultiplex { .. } | PhaseData::ExecuteMultiplex { .. } => {
                &["multiplex"]
            }
            PhaseData::AnalyzeQuery { .. } | PhaseData::ExecuteQuery { .. } => &["query"],
            PhaseData::ExecuteLazy { .. } => &["field", "query"],
            PhaseData::Authorized { .. } => &["object", "query", "type"],
            PhaseData::Resolve { .. } => &["arguments", "ast_node", "field", "object", "query"],
        }
    }

    /// The single operation this phase works on, when there is one.
    pub fn query(&self) -> Option<&'a Operation> {
        match *self {
            PhaseData::Validate { query, .. }
            | PhaseData::AnalyzeQuery { query }
            | PhaseData::ExecuteQuery { query }
            | PhaseData::ExecuteLazy { query, .. }
            | PhaseData::Authorized { query, .. }
            | PhaseData::Resolve { query, .. } => Some(query),
            _ => None,
        }
    }

    pub fn multiplex(&self) -> Option<&'a Multiplex> {
        match *self {
            PhaseData::AnalyzeMultiplex { multiplex } | PhaseData::ExecuteMultiplex { multiplex } => {
                Some(multiplex)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_unique() {
        let mut keys: Vec<_> = Phase::ALL.iter().map(Phase::key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), Phase::ALL.len());
    }

    #[test]
    fn test_span_name() {
        assert_eq!(Phase::ExecuteQuery.span_name("graphql"), "graphql.execute_query");
    }

    #[test]
    fn test_data_maps_to_phase() {
        let op = Operation::query("{ int }");
        let multiplex = Multiplex::single(op.clone());
        let field = FieldRef::new("Query", "int");
        let object = Value::Null;
        let arguments = Arguments::new();

        let cases = [
            (PhaseData::Lex { query_string: "{ int }" }, Phase::Lex),
            (PhaseData::Parse { query_string: "{ int }" }, Phase::Parse),
            (PhaseData::Validate { query: &op, validate: true }, Phase::Validate),
            (PhaseData::AnalyzeMultiplex { multiplex: &multiplex }, Phase::AnalyzeMultiplex),
            (PhaseData::AnalyzeQuery { query: &op }, Phase::AnalyzeQuery),
            (PhaseData::ExecuteMultiplex { multiplex: &multiplex }, Phase::ExecuteMultiplex),
            (PhaseData::ExecuteQuery { query: &op }, Phase::ExecuteQuery),
            (PhaseData::ExecuteLazy { query: &op, field: &field }, Phase::ExecuteLazy),
            (
                PhaseData::Authorized { query: &op, type_name: "Query", object: &object },
                Phase::Authorized,
            ),
            (
                PhaseData::Resolve {
                    query: &op,
                    field: &field,
                    object: &object,
                    arguments: &arguments,
                    ast_node: "int",
                },
                Phase::Resolve,
            ),
        ];

        for (data, phase) in cases {
            assert_eq!(data.phase(), phase);
        }
    }

    #[test]
    fn test_query_accessor() {
        let op = Operation::query("{ int }");
        assert_eq!(PhaseData::ExecuteQuery { query: &op }.query(), Some(&op));
        assert!(PhaseData::Lex { query_string: "{ int }" }.query().is_none());
    }
}
