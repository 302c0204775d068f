//! Operations and batches as handed over by the execution engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EmptyMultiplex;

/// GraphQL operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Query => "query",
            OperationType::Mutation => "mutation",
            OperationType::Subscription => "subscription",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "query" => Ok(OperationType::Query),
            "mutation" => Ok(OperationType::Mutation),
            "subscription" => Ok(OperationType::Subscription),
            other => Err(format!("unknown operation type: {other}")),
        }
    }
}

/// One named or anonymous operation selected from a parsed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub name: Option<String>,
    pub source_text: String,
    pub operation_type: OperationType,
}

impl Operation {
    pub fn new(source_text: impl Into<String>, operation_type: OperationType) -> Self {
        Self {
            name: None,
            source_text: source_text.into(),
            operation_type,
        }
    }

    /// An anonymous query.
    pub fn query(source_text: impl Into<String>) -> Self {
        Self::new(source_text, OperationType::Query)
    }

    pub fn mutation(source_text: impl Into<String>) -> Self {
        Self::new(source_text, OperationType::Mutation)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The operation name, treating an empty name as anonymous.
    pub fn selected_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }
}

/// Operations submitted together for execution.
///
/// Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Multiplex {
    operations: Vec<Operation>,
    fallback_transaction_name: Option<String>,
}

impl Multiplex {
    pub fn new(operations: Vec<Operation>) -> Result<Self, EmptyMultiplex> {
        if operations.is_empty() {
            return Err(EmptyMultiplex);
        }
        Ok(Self {
            operations,
            fallback_transaction_name: None,
        })
    }

    pub fn single(operation: Operation) -> Self {
        Self {
            operations: vec![operation],
            fallback_transaction_name: None,
        }
    }

    /// Per-request fallback resource name, used when every operation is anonymous.
    pub fn with_fallback_transaction_name(mut self, name: impl Into<String>) -> Self {
        self.fallback_transaction_name = Some(name.into());
        self
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn fallback_transaction_name(&self) -> Option<&str> {
        self.fallback_transaction_name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// A field on an owner type, e.g. `Query.int`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldRef {
    pub owner: String,
    pub name: String,
}

impl FieldRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn path(&self) -> String {
        format!("{}.{}", self.owner, self.name)
    }
}

/// Field arguments after coercion.
pub type Arguments = serde_json::Map<String, serde_json::Value>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_type_round_trips_through_str() {
        for ty in [
            OperationType::Query,
            OperationType::Mutation,
            OperationType::Subscription,
        ] {
            assert_eq!(ty.as_str().parse::<OperationType>().unwrap(), ty);
        }
        assert!("fragment".parse::<OperationType>().is_err());
    }

    #[test]
    fn test_empty_name_is_anonymous() {
        assert_eq!(Operation::query("{ a }").with_name("").selected_name(), None);
        assert_eq!(
            Operation::query("query A { a }").with_name("A").selected_name(),
            Some("A")
        );
    }

    #[test]
    fn test_empty_multiplex_rejected() {
        assert_eq!(Multiplex::new(Vec::new()), Err(EmptyMultiplex));
    }

    #[test]
    fn test_multiplex_keeps_order_and_fallback() {
        let multiplex = Multiplex::new(vec![
            Operation::query("query Q1 { a }").with_name("Q1"),
            Operation::query("{ b }"),
        ])
        .unwrap()
        .with_fallback_transaction_name("Fallback");

        assert_eq!(multiplex.len(), 2);
        assert_eq!(multiplex.operations()[0].selected_name(), Some("Q1"));
        assert_eq!(multiplex.fallback_transaction_name(), Some("Fallback"));
    }

    #[test]
    fn test_field_path() {
        assert_eq!(FieldRef::new("Query", "int").path(), "Query.int");
    }
}
