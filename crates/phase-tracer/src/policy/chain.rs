//! Policy Chain
//!
//! Combines several tag policies into one. Policies run in the order they
//! were added; the first failure stops the chain.
//!
//! # Example
//!
//! ```rust,ignore
//! use phase_tracer::policy::{CallbackPolicy, PolicyChain};
//!
//! let chain = PolicyChain::new()
//!     .with_policy(TenantTags::default())
//!     .with_policy(CallbackPolicy::new(|_phase, _data, span| {
//!         span.set_tag("team", "checkout");
//!         Ok(())
//!     }));
//! ```

use std::sync::Arc;

use super::traits::{SpanTags, TagPolicy};
use crate::error::TagResult;
use crate::phase::PhaseData;

/// A chain of tag policies
#[derive(Default, Clone)]
pub struct PolicyChain {
    policies: Vec<Arc<dyn TagPolicy>>,
}

impl std::fmt::Debug for PolicyChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyChain")
            .field("policies", &self.policies.iter().map(|p| p.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl PolicyChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a policy to the chain (builder pattern)
    pub fn with_policy<P: TagPolicy + 'static>(mut self, policy: P) -> Self {
        self.policies.push(Arc::new(policy));
        self
    }

    /// Add a policy to the chain
    pub fn add_policy<P: TagPolicy + 'static>(&mut self, policy: P) {
        self.policies.push(Arc::new(policy));
    }

    /// Add an already shared policy
    pub fn add_shared(&mut self, policy: Arc<dyn TagPolicy>) {
        self.policies.push(policy);
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    pub fn policy_names(&self) -> Vec<&str> {
        self.policies.iter().map(|p| p.name()).collect()
    }
}

impl TagPolicy for PolicyChain {
    fn name(&self) -> &str {
        "chain"
    }

    fn prepare_span(&self, data: &PhaseData<'_>, span: &mut SpanTags<'_>) -> TagResult<()> {
        for policy in &self.policies {
            policy.prepare_span(data, span)?;
        }
        Ok(())
    }
}
