//! # Registry
//!
//! The central container for all entities and components.
//!
//! ## Responsibilities
//!
//! - Allocate entity ids, recycling freed indices with a bumped generation
//! - Own one [`Pool`] per component type, created on first use
//! - Keep every persistent group in sync with structural changes
//! - Fire construct/destroy hooks synchronously, before the mutating call returns

use std::any::TypeId;
use std::collections::HashMap;

use crate::entity::EntityId;
use crate::group::{normalize, Group, GroupId};
use crate::pool::{Component, ErasedPool, Pool};
use crate::signal::{Hook, HookId};

/// One entity slot.
#[derive(Clone, Copy, Debug, Default)]
struct Slot {
    /// Generation of the current (or last) occupant.
    generation: u32,
    /// Whether this slot is currently alive.
    alive: bool,
}

/// Entity allocator plus per-type component pools.
///
/// # Example
///
/// ```rust
/// use tessera_storage::Registry;
///
/// let mut registry = Registry::new();
/// let id = registry.create();
/// registry.emplace(id, 42_u32);
/// assert_eq!(registry.get::<u32>(id), Some(&42));
///
/// registry.destroy(id);
/// assert!(!registry.is_valid(id));
/// ```
pub struct Registry {
    /// All entity slots.
    slots: Vec<Slot>,
    /// Free list of entity indices for reuse.
    free_indices: Vec<u32>,
    /// Number of currently alive entities.
    alive_count: usize,
    /// Pools in registration order.
    pools: Vec<Box<dyn ErasedPool>>,
    /// Component type -> position in `pools`.
    pool_index: HashMap<TypeId, usize>,
    /// Persistent groups.
    groups: Vec<Group>,
    /// Initial capacity for newly created pools.
    component_capacity: usize,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    /// Creates a registry with pre-reserved room.
    ///
    /// # Arguments
    ///
    /// * `entities` - Entity slots to reserve
    /// * `components` - Initial capacity of every pool created later
    #[must_use]
    pub fn with_capacity(entities: usize, components: usize) -> Self {
        Self {
            slots: Vec::with_capacity(entities),
            free_indices: Vec::with_capacity(entities),
            alive_count: 0,
            pools: Vec::new(),
            pool_index: HashMap::new(),
            groups: Vec::new(),
            component_capacity: components,
        }
    }

    /// Returns the number of currently alive entities.
    #[inline]
    #[must_use]
    pub const fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// Allocates a new entity.
    ///
    /// A freed index is reused first; its generation is bumped so older ids
    /// for the same index stay invalid.
    ///
    /// # Returns
    ///
    /// The new entity's ID, or `EntityId::NULL` if the index space is exhausted.
    pub fn create(&mut self) -> EntityId {
        let index = if let Some(index) = self.free_indices.pop() {
            index
        } else {
            let Some(index) = u32::try_from(self.slots.len())
                .ok()
                .filter(|index| *index != u32::MAX)
            else {
                return EntityId::NULL;
            };
            self.slots.push(Slot::default());
            index
        };

        let slot = &mut self.slots[index as usize];
        slot.generation = slot.generation.wrapping_add(1);
        slot.alive = true;
        self.alive_count += 1;

        EntityId::new(index, slot.generation)
    }

    /// Checks if an entity is alive.
    ///
    /// The generation is compared on every call.
    #[inline]
    #[must_use]
    pub fn is_valid(&self, id: EntityId) -> bool {
        if id.is_null() {
            return false;
        }
        self.slots
            .get(id.index() as usize)
            .is_some_and(|slot| slot.alive && slot.generation == id.generation())
    }

    /// Destroys an entity and every component attached to it.
    ///
    /// Destroy hooks fire for each component, in pool registration order,
    /// while the component is still present.
    ///
    /// # Returns
    ///
    /// `true` if the entity was destroyed, `false` if the id was stale.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        if !self.is_valid(id) {
            return false;
        }

        for index in 0..self.pools.len() {
            if self.pools[index].contains(id) {
                let hooks = self.pools[index].on_destroy().snapshot();
                Self::fire(&hooks, id);
                let type_id = self.pools[index].component_type();
                self.leave_groups(type_id, id);
                self.pools[index].erase(id);
            }
        }

        let slot = &mut self.slots[id.index() as usize];
        slot.alive = false;
        self.alive_count -= 1;
        self.free_indices.push(id.index());
        true
    }

    /// Attaches a component to an entity.
    ///
    /// If the entity already holds a `C` the value is replaced in place and
    /// no hook fires. Otherwise groups involving `C` are updated and the
    /// construct hooks fire before this call returns.
    ///
    /// # Returns
    ///
    /// `true` if a new component was constructed.
    pub fn emplace<C: Component>(&mut self, id: EntityId, component: C) -> bool {
        if !self.is_valid(id) {
            return false;
        }

        let hooks = {
            let Some(pool) = self.pool_or_insert::<C>() else {
                return false;
            };
            if pool.set.insert(id, component).is_some() {
                return false;
            }
            pool.on_construct.snapshot()
        };

        self.join_groups(TypeId::of::<C>(), id);
        Self::fire(&hooks, id);
        true
    }

    /// Removes a component from an entity.
    ///
    /// Destroy hooks fire while the component is still present.
    ///
    /// # Returns
    ///
    /// `true` if a component was removed.
    pub fn erase<C: Component>(&mut self, id: EntityId) -> bool {
        let Some(pool) = self.pool::<C>() else {
            return false;
        };
        if !pool.set.contains(id) {
            return false;
        }

        let hooks = pool.on_destroy.snapshot();
        Self::fire(&hooks, id);

        self.leave_groups(TypeId::of::<C>(), id);
        self.pool_mut::<C>()
            .and_then(|pool| pool.set.remove(id))
            .is_some()
    }

    /// Checks whether an entity holds a `C`.
    #[inline]
    #[must_use]
    pub fn has<C: Component>(&self, id: EntityId) -> bool {
        self.pool::<C>().is_some_and(|pool| pool.set.contains(id))
    }

    /// Gets a component.
    #[inline]
    #[must_use]
    pub fn get<C: Component>(&self, id: EntityId) -> Option<&C> {
        self.pool::<C>()?.set.get(id)
    }

    /// Gets a component mutably.
    #[inline]
    pub fn get_mut<C: Component>(&mut self, id: EntityId) -> Option<&mut C> {
        self.pool_mut::<C>()?.set.get_mut(id)
    }

    /// Every entity currently holding a `C`, in pool order.
    ///
    /// The order is not insertion order and changes on removal.
    #[must_use]
    pub fn ids<C: Component>(&self) -> &[EntityId] {
        self.pool::<C>().map_or(&[], |pool| pool.set.ids())
    }

    /// Returns the pool for `C`, if one was created.
    #[must_use]
    pub fn pool<C: Component>(&self) -> Option<&Pool<C>> {
        let index = *self.pool_index.get(&TypeId::of::<C>())?;
        self.pools[index].as_any().downcast_ref::<Pool<C>>()
    }

    fn pool_mut<C: Component>(&mut self) -> Option<&mut Pool<C>> {
        let index = *self.pool_index.get(&TypeId::of::<C>())?;
        self.pools[index].as_any_mut().downcast_mut::<Pool<C>>()
    }

    fn pool_or_insert<C: Component>(&mut self) -> Option<&mut Pool<C>> {
        let capacity = self.component_capacity;
        let pools = &mut self.pools;
        let index = *self.pool_index.entry(TypeId::of::<C>()).or_insert_with(|| {
            pools.push(Box::new(Pool::<C>::with_capacity(capacity)));
            pools.len() - 1
        });
        self.pools[index].as_any_mut().downcast_mut::<Pool<C>>()
    }

    /// Connects a hook fired after each construction of a `C`.
    pub fn on_construct<C: Component>(&mut self, hook: Hook) -> Option<HookId> {
        self.pool_or_insert::<C>()
            .map(|pool| pool.on_construct.connect(hook))
    }

    /// Connects a hook fired before each destruction of a `C`.
    pub fn on_destroy<C: Component>(&mut self, hook: Hook) -> Option<HookId> {
        self.pool_or_insert::<C>()
            .map(|pool| pool.on_destroy.connect(hook))
    }

    /// Disconnects a construct hook.
    pub fn disconnect_construct<C: Component>(&mut self, hook: HookId) -> bool {
        self.pool_mut::<C>()
            .is_some_and(|pool| pool.on_construct.disconnect(hook))
    }

    /// Disconnects a destroy hook.
    pub fn disconnect_destroy<C: Component>(&mut self, hook: HookId) -> bool {
        self.pool_mut::<C>()
            .is_some_and(|pool| pool.on_destroy.disconnect(hook))
    }

    /// Registers (or finds) the persistent group over `types`.
    ///
    /// A new group is filled from the smallest involved pool; afterwards it
    /// is maintained on every insert and removal of an involved type.
    pub fn group(&mut self, types: &[TypeId]) -> GroupId {
        let types = normalize(types);
        if let Some(index) = self.groups.iter().position(|group| group.types == types) {
            return GroupId(index);
        }

        let mut group = Group::new(types);
        let smallest = group
            .types
            .iter()
            .map(|type_id| self.ids_of(*type_id))
            .min_by_key(|ids| ids.len())
            .unwrap_or(&[]);
        for &id in smallest {
            if self.holds_all(&group.types, id) {
                group.members.insert(id, ());
            }
        }

        self.groups.push(group);
        GroupId(self.groups.len() - 1)
    }

    /// Entities currently in a group.
    #[must_use]
    pub fn group_ids(&self, group: GroupId) -> &[EntityId] {
        self.groups
            .get(group.0)
            .map_or(&[], |group| group.members.ids())
    }

    /// Ids holding the component with the given [`TypeId`], in pool order.
    ///
    /// Empty if no pool exists for that type.
    #[must_use]
    pub fn ids_of(&self, type_id: TypeId) -> &[EntityId] {
        self.pool_index
            .get(&type_id)
            .map_or(&[], |index| self.pools[*index].ids())
    }

    fn holds_all(&self, types: &[TypeId], id: EntityId) -> bool {
        types.iter().all(|type_id| {
            self.pool_index
                .get(type_id)
                .is_some_and(|index| self.pools[*index].contains(id))
        })
    }

    fn join_groups(&mut self, type_id: TypeId, id: EntityId) {
        for index in 0..self.groups.len() {
            if self.groups[index].involves(type_id) && self.holds_all(&self.groups[index].types, id) {
                self.groups[index].members.insert(id, ());
            }
        }
    }

    fn leave_groups(&mut self, type_id: TypeId, id: EntityId) {
        for group in &mut self.groups {
            if group.involves(type_id) {
                group.members.remove(id);
            }
        }
    }

    fn fire(hooks: &[Hook], id: EntityId) {
        for hook in hooks {
            hook(id);
        }
    }
}
