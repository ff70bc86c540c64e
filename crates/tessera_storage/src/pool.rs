//! # Component Pools
//!
//! One pool per component type. A pool pairs the packed values with the
//! construct/destroy signals for that type.

use std::any::{Any, TypeId};

use crate::entity::EntityId;
use crate::signal::Signal;
use crate::sparse_set::SparseSet;

/// Marker trait for ECS components.
///
/// Any `'static` type can be attached to an entity.
pub trait Component: 'static {}

impl<T: 'static> Component for T {}

/// Storage for a single component type.
#[derive(Debug)]
pub struct Pool<C: Component> {
    /// Packed component values.
    pub(crate) set: SparseSet<C>,
    /// Fired after a component is constructed.
    pub(crate) on_construct: Signal,
    /// Fired before a component is destroyed.
    pub(crate) on_destroy: Signal,
}

impl<C: Component> Pool<C> {
    /// Creates a pool with room for `capacity` components.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            set: SparseSet::with_capacity(capacity),
            on_construct: Signal::new(),
            on_destroy: Signal::new(),
        }
    }

    /// The packed values.
    #[must_use]
    pub fn set(&self) -> &SparseSet<C> {
        &self.set
    }
}

/// Type-erased interface the registry uses to walk all pools.
pub(crate) trait ErasedPool: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn component_type(&self) -> TypeId;
    fn contains(&self, id: EntityId) -> bool;
    fn erase(&mut self, id: EntityId) -> bool;
    fn ids(&self) -> &[EntityId];
    fn on_destroy(&self) -> &Signal;
}

impl<C: Component> ErasedPool for Pool<C> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn component_type(&self) -> TypeId {
        TypeId::of::<C>()
    }

    fn contains(&self, id: EntityId) -> bool {
        self.set.contains(id)
    }

    fn erase(&mut self, id: EntityId) -> bool {
        self.set.remove(id).is_some()
    }

    fn ids(&self) -> &[EntityId] {
        self.set.ids()
    }

    fn on_destroy(&self) -> &Signal {
        &self.on_destroy
    }
}
