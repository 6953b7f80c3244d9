#![forbid(unsafe_code)]

//! Declarative event listeners.
//!
//! Components declare the [`Listen`] keys they currently care about through
//! `Model::listeners()`. After every update the runtime reconciles the
//! declared set against the attached set:
//!
//! 1. Keys that are newly declared are attached.
//! 2. Keys that are no longer declared are detached.
//! 3. Unchanged keys stay attached.
//!
//! An event whose key is not attached is dropped before it reaches the
//! model. This is how a removed notification stops receiving clicks on its
//! close button without any explicit unregister call.

use std::collections::BTreeSet;

use pagekit_core::{Listen, PageEvent};

/// Outcome of one reconcile pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListenerDiff {
    pub attached: Vec<Listen>,
    pub detached: Vec<Listen>,
}

impl ListenerDiff {
    /// Whether the pass changed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attached.is_empty() && self.detached.is_empty()
    }
}

/// Currently attached listener keys.
#[derive(Debug, Clone, Default)]
pub struct ListenerSet {
    active: BTreeSet<Listen>,
}

impl ListenerSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring the attached set in line with `declared`.
    pub fn reconcile(&mut self, declared: Vec<Listen>) -> ListenerDiff {
        let declared: BTreeSet<Listen> = declared.into_iter().collect();
        let detached: Vec<Listen> = self.active.difference(&declared).cloned().collect();
        let attached: Vec<Listen> = declared.difference(&self.active).cloned().collect();

        for key in &detached {
            tracing::debug!(target_key = ?key.target, kind = ?key.kind, "detaching listener");
        }
        for key in &attached {
            tracing::debug!(target_key = ?key.target, kind = ?key.kind, "attaching listener");
        }
        tracing::trace!(
            active_before = self.active.len(),
            active_after = declared.len(),
            "listener reconcile complete"
        );

        self.active = declared;
        ListenerDiff { attached, detached }
    }

    /// Whether `event` has an attached listener. `Tick` always passes.
    #[must_use]
    pub fn accepts(&self, event: &PageEvent) -> bool {
        event
            .listen_key()
            .is_none_or(|key| self.active.contains(&key))
    }

    #[must_use]
    pub fn contains(&self, key: &Listen) -> bool {
        self.active.contains(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Attached keys in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = &Listen> {
        self.active.iter()
    }
}
