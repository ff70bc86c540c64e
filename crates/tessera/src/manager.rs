//! # Entity Manager
//!
//! Owns the storage of one world and is the only way to reach it.
//!
//! ## Responsibilities
//!
//! - Hand out [`Entity`] values bound to this manager
//! - Check validity on every access (manager id + index + generation)
//! - Build views over component sets
//! - Bridge storage hooks to [`ComponentAdded`]/[`ComponentRemoved`] events
//!
//! [`ComponentAdded`]: crate::ComponentAdded
//! [`ComponentRemoved`]: crate::ComponentRemoved

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tessera_storage::{Component, EntityId, Hook, HookId, Registry};

use crate::config::EcsConfig;
use crate::entity::{Entity, ManagerId};
use crate::error::{EcsError, EcsResult};
use crate::events::{EventManager, HookKind, Receiver, StructuralEvent};
use crate::handle::ComponentHandle;
use crate::view::{ComponentSet, EntityView, HandleView, View};

/// Entity factory, component access and query entry point.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
/// use tessera::{EntityManager, EventManager};
///
/// struct Health(u32);
///
/// let mut entities = EntityManager::new(Rc::new(EventManager::new()));
/// let hero = entities.create();
/// let health = hero.assign(&mut entities, Health(10));
///
/// health.get_mut(&mut entities).unwrap().0 -= 3;
/// assert_eq!(health.get(&entities).unwrap().0, 7);
///
/// hero.destroy(&mut entities);
/// assert!(!health.valid(&entities));
/// ```
pub struct EntityManager {
    id: ManagerId,
    registry: Registry,
    events: Rc<EventManager>,
    /// Storage hooks currently emitting structural events.
    structural: HashMap<(TypeId, HookKind), HookId>,
}

impl EntityManager {
    /// Creates an empty manager publishing structural events on `events`.
    #[must_use]
    pub fn new(events: Rc<EventManager>) -> Self {
        Self::with_registry(events, Registry::new())
    }

    /// Creates an empty manager sized from `config`.
    #[must_use]
    pub fn with_config(events: Rc<EventManager>, config: &EcsConfig) -> Self {
        Self::with_registry(
            events,
            Registry::with_capacity(config.entity_capacity, config.component_capacity),
        )
    }

    fn with_registry(events: Rc<EventManager>, registry: Registry) -> Self {
        let id = ManagerId::next();
        tracing::debug!(manager = ?id, "entity manager created");
        Self {
            id,
            registry,
            events,
            structural: HashMap::new(),
        }
    }

    /// This manager's id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ManagerId {
        self.id
    }

    /// The bus structural events are published on.
    #[inline]
    #[must_use]
    pub fn events(&self) -> &Rc<EventManager> {
        &self.events
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.registry.alive_count()
    }

    pub(crate) const fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Allocates a new entity.
    ///
    /// Returns [`Entity::INVALID`] if the id space is exhausted.
    pub fn create(&mut self) -> Entity {
        let id = self.registry.create();
        if id.is_null() {
            tracing::warn!(manager = ?self.id, "entity id space exhausted");
            return Entity::INVALID;
        }
        Entity::new(self.id, id)
    }

    /// Rebuilds the [`Entity`] for a storage id of this manager.
    ///
    /// The result is not checked; a stale id gives an invalid entity.
    #[must_use]
    pub const fn get_entity(&self, id: EntityId) -> Entity {
        Entity::new(self.id, id)
    }

    /// Whether `entity` belongs to this manager and is still alive.
    #[inline]
    #[must_use]
    pub fn valid(&self, entity: Entity) -> bool {
        entity.manager() == self.id && self.registry.is_valid(entity.id())
    }

    /// Destroys `entity` and every component attached to it.
    ///
    /// [`ComponentRemoved`](crate::ComponentRemoved) listeners run once per
    /// component before this returns.
    ///
    /// # Returns
    ///
    /// `false` if the entity was already invalid.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        self.valid(entity) && self.registry.destroy(entity.id())
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Attaches `component` to `entity`.
    ///
    /// An existing `C` is replaced in place without an event. A new one
    /// makes [`ComponentAdded`](crate::ComponentAdded) listeners run before
    /// this returns. Does nothing if the entity is invalid; the returned
    /// handle then reports invalid too.
    pub fn assign<C: Component>(&mut self, entity: Entity, component: C) -> ComponentHandle<C> {
        if self.valid(entity) {
            self.registry.emplace(entity.id(), component);
        }
        ComponentHandle::new(entity)
    }

    /// Removes the `C` of `entity`.
    ///
    /// # Returns
    ///
    /// `true` if a component was removed.
    pub fn remove<C: Component>(&mut self, entity: Entity) -> bool {
        self.valid(entity) && self.registry.erase::<C>(entity.id())
    }

    /// Whether `entity` is valid and holds a `C`.
    #[inline]
    #[must_use]
    pub fn has_component<C: Component>(&self, entity: Entity) -> bool {
        self.valid(entity) && self.registry.has::<C>(entity.id())
    }

    /// Handle to the `C` of `entity`, without checking that it exists.
    #[must_use]
    pub fn component<C: Component>(&self, entity: Entity) -> ComponentHandle<C> {
        entity.component::<C>()
    }

    /// Borrows the `C` of `entity`.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`] if the entity is not alive in this manager,
    /// [`EcsError::InvalidComponent`] if it holds no `C`.
    pub fn get<C: Component>(&self, entity: Entity) -> EcsResult<&C> {
        if !self.valid(entity) {
            return Err(EcsError::InvalidEntity(entity.id()));
        }
        self.registry
            .get::<C>(entity.id())
            .ok_or_else(|| missing::<C>(entity))
    }

    /// Borrows the `C` of `entity` mutably.
    ///
    /// # Errors
    ///
    /// Same as [`EntityManager::get`].
    pub fn get_mut<C: Component>(&mut self, entity: Entity) -> EcsResult<&mut C> {
        if !self.valid(entity) {
            return Err(EcsError::InvalidEntity(entity.id()));
        }
        self.registry
            .get_mut::<C>(entity.id())
            .ok_or_else(|| missing::<C>(entity))
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Resolves a view over `Q`.
    ///
    /// For two or more types this registers the backing group once; later
    /// calls find it again.
    pub fn view<Q: ComponentSet>(&mut self) -> View<Q> {
        View::new(self)
    }

    /// Every entity currently holding all of `Q`.
    pub fn entities_with_components<Q: ComponentSet>(&mut self) -> EntityView<'_> {
        let view = self.view::<Q>();
        view.iter(self)
    }

    /// Every entity currently holding all of `Q`, with one handle per type.
    pub fn entities_with_handles<Q: ComponentSet>(&mut self) -> HandleView<'_, Q> {
        let view = self.view::<Q>();
        view.iter_handles(self)
    }

    /// Walks the matches of `Q`, lending the manager to `f` at each step.
    ///
    /// The cursor reads storage afresh on every step. Structural changes to
    /// the types of `Q` made by `f` may cause entities to be skipped or
    /// visited twice; defer them if that matters.
    pub fn each<Q, F>(&mut self, mut f: F)
    where
        Q: ComponentSet,
        F: FnMut(&mut Self, Entity, Q::Handles),
    {
        let view = self.view::<Q>();
        let mut position = 0;
        while let Some(id) = view.id_at(self, position) {
            let entity = Entity::new(self.id, id);
            f(self, entity, Q::handles(entity));
            position += 1;
        }
    }

    // =========================================================================
    // Structural events
    // =========================================================================

    /// Subscribes `receiver` to a structural event of this manager.
    ///
    /// The first listener of `E` installs the storage hook; from then on
    /// every matching construct/destroy emits `E` synchronously.
    ///
    /// # Returns
    ///
    /// `false` if the receiver was already subscribed.
    pub fn subscribe<E, R>(&mut self, receiver: &Rc<R>) -> bool
    where
        E: StructuralEvent,
        R: Receiver<E>,
    {
        let added = self.events.subscribe::<E, R>(receiver);
        self.connect_hook::<E>();
        added
    }

    /// Unsubscribes `receiver` from a structural event.
    ///
    /// The storage hook is removed with the last listener.
    ///
    /// # Returns
    ///
    /// `true` if the receiver was subscribed.
    pub fn unsubscribe<E, R>(&mut self, receiver: &Rc<R>) -> bool
    where
        E: StructuralEvent,
        R: Receiver<E>,
    {
        let removed = self.events.unsubscribe::<E, R>(receiver);
        if self.events.listener_count::<E>() == 0 {
            self.disconnect_hook::<E>();
        }
        removed
    }

    /// Whether the storage hook for `E` is installed.
    #[must_use]
    pub fn is_hooked<E: StructuralEvent>(&self) -> bool {
        self.structural.contains_key(&hook_key::<E>())
    }

    fn connect_hook<E: StructuralEvent>(&mut self) {
        let key = hook_key::<E>();
        if self.structural.contains_key(&key) {
            return;
        }

        let events = Rc::clone(&self.events);
        let manager = self.id;
        let hook: Hook = Rc::new(move |id: EntityId| {
            let entity = Entity::new(manager, id);
            tracing::trace!(event = type_name::<E>(), ?entity, "structural event");
            events.emit(&E::new(entity, ComponentHandle::new(entity)));
        });

        let connected = match E::KIND {
            HookKind::Construct => self.registry.on_construct::<E::Component>(hook),
            HookKind::Destroy => self.registry.on_destroy::<E::Component>(hook),
        };
        if let Some(hook_id) = connected {
            self.structural.insert(key, hook_id);
        }
    }

    fn disconnect_hook<E: StructuralEvent>(&mut self) {
        let Some(hook_id) = self.structural.remove(&hook_key::<E>()) else {
            return;
        };
        match E::KIND {
            HookKind::Construct => self.registry.disconnect_construct::<E::Component>(hook_id),
            HookKind::Destroy => self.registry.disconnect_destroy::<E::Component>(hook_id),
        };
    }
}

fn hook_key<E: StructuralEvent>() -> (TypeId, HookKind) {
    (TypeId::of::<E::Component>(), E::KIND)
}

fn missing<C: Component>(entity: Entity) -> EcsError {
    EcsError::InvalidComponent {
        entity: entity.id(),
        component: type_name::<C>(),
    }
}

impl fmt::Debug for EntityManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityManager")
            .field("id", &self.id)
            .field("size", &self.size())
            .field("structural_hooks", &self.structural.len())
            .finish_non_exhaustive()
    }
}
