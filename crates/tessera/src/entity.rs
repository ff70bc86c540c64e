//! # Entities
//!
//! An [`Entity`] is a weak, copyable reference to a row owned by an
//! [`EntityManager`]. It carries the manager's id and the storage id
//! (index + generation); validity is asked of the manager on every call,
//! never cached.

use std::sync::atomic::{AtomicU64, Ordering};

use tessera_storage::{Component, EntityId};

use crate::handle::ComponentHandle;
use crate::manager::EntityManager;

/// Identifies one [`EntityManager`] for the lifetime of the process.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ManagerId(u64);

impl ManagerId {
    /// Belongs to no manager.
    pub const NONE: Self = Self(0);

    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Weak reference to an entity of one manager.
///
/// Equality, hashing and ordering use (manager, id). Ordering is ascending
/// by manager, then index, then generation.
///
/// The value methods take the owning manager explicitly, e.g.
/// `entity.assign(&mut entities, Position::default())`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    manager: ManagerId,
    id: EntityId,
}

impl Entity {
    /// Default-constructed entity. Never valid.
    pub const INVALID: Self = Self {
        manager: ManagerId::NONE,
        id: EntityId::NULL,
    };

    pub(crate) const fn new(manager: ManagerId, id: EntityId) -> Self {
        Self { manager, id }
    }

    /// Storage id (index + generation).
    #[inline]
    #[must_use]
    pub const fn id(self) -> EntityId {
        self.id
    }

    /// Id of the manager this entity was created by.
    #[inline]
    #[must_use]
    pub const fn manager(self) -> ManagerId {
        self.manager
    }

    /// Whether the entity still exists in `entities`.
    #[must_use]
    pub fn valid(self, entities: &EntityManager) -> bool {
        entities.valid(self)
    }

    /// Attaches a component. See [`EntityManager::assign`].
    pub fn assign<C: Component>(self, entities: &mut EntityManager, component: C) -> ComponentHandle<C> {
        entities.assign(self, component)
    }

    /// Removes a component. See [`EntityManager::remove`].
    pub fn remove<C: Component>(self, entities: &mut EntityManager) -> bool {
        entities.remove::<C>(self)
    }

    /// Whether the entity holds a `C`.
    #[must_use]
    pub fn has_component<C: Component>(self, entities: &EntityManager) -> bool {
        entities.has_component::<C>(self)
    }

    /// Handle to this entity's `C`, without checking that it exists.
    #[must_use]
    pub fn component<C: Component>(self) -> ComponentHandle<C> {
        ComponentHandle::new(self)
    }

    /// Destroys the entity and its components.
    ///
    /// Copies of this entity and handles into it become invalid; they are
    /// not notified.
    pub fn destroy(self, entities: &mut EntityManager) -> bool {
        entities.destroy(self)
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::INVALID
    }
}
