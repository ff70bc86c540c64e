//! # Component Handles
//!
//! A [`ComponentHandle`] names one component slot of one entity. It owns
//! nothing; the data stays in the manager and every access re-checks that
//! the entity is alive and still holds the component.

use std::any::type_name;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use tessera_storage::Component;

use crate::entity::Entity;
use crate::error::EcsResult;
use crate::manager::EntityManager;

/// Weak typed reference to an entity's `C`.
///
/// Two handles are equal when they point at the same entity of the same
/// manager, whether or not the component currently exists.
pub struct ComponentHandle<C: Component> {
    entity: Entity,
    _marker: PhantomData<fn() -> C>,
}

impl<C: Component> ComponentHandle<C> {
    pub(crate) const fn new(entity: Entity) -> Self {
        Self {
            entity,
            _marker: PhantomData,
        }
    }

    /// The entity is alive and holds a `C`.
    #[must_use]
    pub fn valid(&self, entities: &EntityManager) -> bool {
        entities.has_component::<C>(self.entity)
    }

    /// Borrows the component.
    ///
    /// # Errors
    ///
    /// [`crate::EcsError::InvalidEntity`] if the entity is gone,
    /// [`crate::EcsError::InvalidComponent`] if the component is absent.
    pub fn get<'a>(&self, entities: &'a EntityManager) -> EcsResult<&'a C> {
        entities.get::<C>(self.entity)
    }

    /// Borrows the component mutably.
    ///
    /// # Errors
    ///
    /// Same as [`ComponentHandle::get`].
    pub fn get_mut<'a>(&self, entities: &'a mut EntityManager) -> EcsResult<&'a mut C> {
        entities.get_mut::<C>(self.entity)
    }

    /// Removes the component from its entity.
    pub fn remove(&self, entities: &mut EntityManager) -> bool {
        entities.remove::<C>(self.entity)
    }

    /// The owning entity.
    #[must_use]
    pub const fn entity(&self) -> Entity {
        self.entity
    }
}

impl<C: Component> Default for ComponentHandle<C> {
    fn default() -> Self {
        Self::new(Entity::INVALID)
    }
}

// Manual impls: no bounds on `C`.
impl<C: Component> Clone for ComponentHandle<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: Component> Copy for ComponentHandle<C> {}

impl<C: Component> PartialEq for ComponentHandle<C> {
    fn eq(&self, other: &Self) -> bool {
        self.entity == other.entity
    }
}

impl<C: Component> Eq for ComponentHandle<C> {}

impl<C: Component> Hash for ComponentHandle<C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entity.hash(state);
    }
}

impl<C: Component> fmt::Debug for ComponentHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentHandle")
            .field("component", &type_name::<C>())
            .field("entity", &self.entity)
            .finish()
    }
}
