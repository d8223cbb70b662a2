use crate::domain::model::MutationPolicy;
use crate::utils::error::{CollectionError, Result};
use std::cell::Cell;

pub const DEFAULT_MAX_DISPATCH_DEPTH: usize = 32;

/// Reentrancy sentinel owned by one collection.
///
/// The depth is raised by a [`DispatchScope`] while that collection's
/// listeners are on the call stack. Strict guards reject structural changes
/// at any depth above zero; permissive guards only enforce the depth limit.
#[derive(Debug)]
pub struct MutationGuard {
    owner: String,
    policy: MutationPolicy,
    max_depth: usize,
    depth: Cell<usize>,
}

impl MutationGuard {
    pub fn new(owner: impl Into<String>, policy: MutationPolicy, max_depth: usize) -> Self {
        Self {
            owner: owner.into(),
            policy,
            max_depth,
            depth: Cell::new(0),
        }
    }

    pub fn strict(owner: impl Into<String>) -> Self {
        Self::new(owner, MutationPolicy::Strict, DEFAULT_MAX_DISPATCH_DEPTH)
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn policy(&self) -> MutationPolicy {
        self.policy
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    pub fn is_dispatching(&self) -> bool {
        self.depth.get() > 0
    }

    pub fn is_mutation_allowed(&self) -> bool {
        match self.policy {
            MutationPolicy::Strict => !self.is_dispatching(),
            MutationPolicy::Permissive => true,
        }
    }

    pub fn assert_mutation_allowed(&self, operation: &'static str) -> Result<()> {
        if self.is_mutation_allowed() {
            return Ok(());
        }
        tracing::debug!(
            container = %self.owner,
            operation,
            depth = self.depth.get(),
            "mutation rejected during listener dispatch"
        );
        Err(CollectionError::ConcurrentMutation {
            container: self.owner.clone(),
            operation,
        })
    }

    /// Runs `action` once the policy has cleared `operation`. Every
    /// structural change of a collection goes through here.
    pub fn with_mutations_allowed<R>(
        &self,
        operation: &'static str,
        action: impl FnOnce() -> Result<R>,
    ) -> Result<R> {
        self.assert_mutation_allowed(operation)?;
        action()
    }

    /// Marks the owner as dispatching until the returned scope drops.
    pub fn enter_dispatch(&self) -> Result<DispatchScope<'_>> {
        let depth = self.depth.get();
        if depth >= self.max_depth {
            return Err(CollectionError::DispatchDepthExceeded {
                container: self.owner.clone(),
                limit: self.max_depth,
            });
        }
        self.depth.set(depth + 1);
        Ok(DispatchScope { depth: &self.depth })
    }
}

pub struct DispatchScope<'a> {
    depth: &'a Cell<usize>,
}

impl Drop for DispatchScope<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}
