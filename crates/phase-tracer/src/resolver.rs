//! Resource name resolution for a multiplex.
//!
//! The resource name summarises which operations a batch ran:
//!
//! 1. Names of the named operations, in batch order, joined with `", "`.
//!    Anonymous operations are skipped and duplicates are kept verbatim.
//! 2. Otherwise the fallback transaction name, if non-empty.
//! 3. Otherwise `None`: the backend's default resource stays untouched.

use crate::operation::{Multiplex, Operation};

pub const NAME_SEPARATOR: &str = ", ";

/// Resolve the resource name for `operations`.
pub fn resolve_resource_name<'a, I>(operations: I, fallback: Option<&str>) -> Option<String>
where
    I: IntoIterator<Item = &'a Operation>,
{
    let names: Vec<&str> = operations
        .into_iter()
        .filter_map(Operation::selected_name)
        .collect();

    if !names.is_empty() {
        return Some(names.join(NAME_SEPARATOR));
    }

    fallback.filter(|f| !f.is_empty()).map(str::to_string)
}

/// Resolve the resource name for a whole batch.
///
/// The batch's own fallback wins over `default_fallback`.
pub fn resolve_for_multiplex(multiplex: &Multiplex, default_fallback: Option<&str>) -> Option<String> {
    let fallback = multiplex
        .fallback_transaction_name()
        .filter(|f| !f.is_empty())
        .or(default_fallback);
    resolve_resource_name(multiplex.operations(), fallback)
}
