//! # Hook Signals
//!
//! A signal holds the callbacks a pool invokes synchronously when a
//! component is constructed or destroyed.

use std::fmt;
use std::rc::Rc;

use crate::entity::EntityId;

/// Callback invoked with the id of the entity whose component changed.
pub type Hook = Rc<dyn Fn(EntityId)>;

/// Identifies a connected hook so it can be disconnected later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HookId(u64);

/// Ordered list of connected hooks.
#[derive(Default)]
pub struct Signal {
    hooks: Vec<(HookId, Hook)>,
    next: u64,
}

impl Signal {
    /// Creates a signal with no hooks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Connects a hook. Hooks fire in connection order.
    pub fn connect(&mut self, hook: Hook) -> HookId {
        let id = HookId(self.next);
        self.next += 1;
        self.hooks.push((id, hook));
        id
    }

    /// Disconnects a hook.
    ///
    /// # Returns
    ///
    /// `true` if the hook was connected.
    pub fn disconnect(&mut self, id: HookId) -> bool {
        let before = self.hooks.len();
        self.hooks.retain(|(hook_id, _)| *hook_id != id);
        self.hooks.len() != before
    }

    /// Number of connected hooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Whether no hook is connected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Clones the current hook list.
    ///
    /// Callers invoke the snapshot after releasing their borrow of the
    /// owning pool.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Hook> {
        self.hooks.iter().map(|(_, hook)| Rc::clone(hook)).collect()
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("hooks", &self.hooks.len())
            .finish()
    }
}
