//! # Views
//!
//! Queries over every entity holding a fixed set of component types.
//!
//! A set is written as a tuple, `(Position,)` or `(Position, Velocity)`.
//! One type iterates the component's pool directly. Two or more types are
//! backed by a persistent group in the storage: the group is registered the
//! first time the view is built and from then on kept up to date on every
//! insert and removal, so iterating costs the match count, not the size of
//! the largest pool.
//!
//! Views are live cursors over storage, not snapshots. Holders are visited
//! in storage order, which is neither stable nor insertion order.

use std::any::TypeId;
use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::slice;

use tessera_storage::{Component, EntityId, GroupId};

use crate::entity::{Entity, ManagerId};
use crate::handle::ComponentHandle;
use crate::manager::EntityManager;

/// A tuple of component types a view matches on.
pub trait ComponentSet: 'static {
    /// One [`ComponentHandle`] per member, in tuple order.
    type Handles: Copy;

    /// Type ids of the members, in tuple order.
    fn type_ids() -> Vec<TypeId>;

    /// Builds the handles of `entity` for every member.
    fn handles(entity: Entity) -> Self::Handles;
}

macro_rules! component_set {
    ($($name:ident),+) => {
        impl<$($name: Component),+> ComponentSet for ($($name,)+) {
            type Handles = ($(ComponentHandle<$name>,)+);

            fn type_ids() -> Vec<TypeId> {
                vec![$(TypeId::of::<$name>()),+]
            }

            fn handles(entity: Entity) -> Self::Handles {
                ($(ComponentHandle::<$name>::new(entity),)+)
            }
        }
    };
}

component_set!(A);
component_set!(A, B);
component_set!(A, B, C);
component_set!(A, B, C, D);
component_set!(A, B, C, D, E);
component_set!(A, B, C, D, E, F);

/// Where a view reads its ids from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Source {
    Pool(TypeId),
    Group(GroupId),
}

/// A resolved query for `Q` on one manager.
///
/// Holds no borrow, so it can be kept in a system and iterated every frame.
pub struct View<Q: ComponentSet> {
    manager: ManagerId,
    source: Source,
    _marker: PhantomData<fn() -> Q>,
}

impl<Q: ComponentSet> View<Q> {
    /// Resolves `Q` against `entities`, registering the group if needed.
    pub(crate) fn new(entities: &mut EntityManager) -> Self {
        let types = Q::type_ids();
        let source = match types.as_slice() {
            [single] => Source::Pool(*single),
            _ => Source::Group(entities.registry_mut().group(&types)),
        };
        Self {
            manager: entities.id(),
            source,
            _marker: PhantomData,
        }
    }

    /// Current matches, as entities.
    ///
    /// Yields nothing if `entities` is not the manager this view was built on.
    #[must_use]
    pub fn iter<'a>(&self, entities: &'a EntityManager) -> EntityView<'a> {
        let ids: &'a [EntityId] = if entities.id() == self.manager {
            self.ids(entities)
        } else {
            &[]
        };
        EntityView {
            manager: self.manager,
            ids: ids.iter(),
        }
    }

    /// Current matches, with one handle per member of `Q`.
    #[must_use]
    pub fn iter_handles<'a>(&self, entities: &'a EntityManager) -> HandleView<'a, Q> {
        HandleView {
            entities: self.iter(entities),
            _marker: PhantomData,
        }
    }

    /// Number of current matches.
    #[must_use]
    pub fn len(&self, entities: &EntityManager) -> usize {
        self.iter(entities).len()
    }

    /// Whether nothing matches right now.
    #[must_use]
    pub fn is_empty(&self, entities: &EntityManager) -> bool {
        self.len(entities) == 0
    }

    /// The id at `position`, read from live storage.
    pub(crate) fn id_at(&self, entities: &EntityManager, position: usize) -> Option<EntityId> {
        self.ids(entities).get(position).copied()
    }

    fn ids<'a>(&self, entities: &'a EntityManager) -> &'a [EntityId] {
        let registry = entities.registry();
        match self.source {
            Source::Pool(type_id) => registry.ids_of(type_id),
            Source::Group(group) => registry.group_ids(group),
        }
    }
}

impl<Q: ComponentSet> Clone for View<Q> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Q: ComponentSet> Copy for View<Q> {}

impl<Q: ComponentSet> fmt::Debug for View<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("manager", &self.manager)
            .field("source", &self.source)
            .finish()
    }
}

/// Iterator over the entities matching a view.
#[derive(Clone, Debug)]
pub struct EntityView<'a> {
    manager: ManagerId,
    ids: slice::Iter<'a, EntityId>,
}

impl Iterator for EntityView<'_> {
    type Item = Entity;

    #[inline]
    fn next(&mut self) -> Option<Entity> {
        self.ids.next().map(|id| Entity::new(self.manager, *id))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ids.size_hint()
    }
}

impl ExactSizeIterator for EntityView<'_> {}
impl FusedIterator for EntityView<'_> {}

/// Iterator over the entities matching a view, unpacked into handles.
///
/// Each step builds one handle per member of `Q` for the visited entity.
pub struct HandleView<'a, Q: ComponentSet> {
    entities: EntityView<'a>,
    _marker: PhantomData<fn() -> Q>,
}

impl<Q: ComponentSet> Iterator for HandleView<'_, Q> {
    type Item = (Entity, Q::Handles);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.entities.next().map(|entity| (entity, Q::handles(entity)))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entities.size_hint()
    }
}

impl<Q: ComponentSet> ExactSizeIterator for HandleView<'_, Q> {}
impl<Q: ComponentSet> FusedIterator for HandleView<'_, Q> {}

impl<Q: ComponentSet> fmt::Debug for HandleView<'_, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleView")
            .field("remaining", &self.entities.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::rc::Rc;

    use crate::events::EventManager;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Position(f32);
    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Velocity(f32);

    fn manager() -> EntityManager {
        EntityManager::new(Rc::new(EventManager::new()))
    }

    #[test]
    fn test_type_ids_keep_tuple_order() {
        assert_eq!(
            <(Position, Velocity)>::type_ids(),
            vec![TypeId::of::<Position>(), TypeId::of::<Velocity>()]
        );
    }

    #[test]
    fn test_view_is_live() {
        let mut entities = manager();
        let view = entities.view::<(Position, Velocity)>();
        assert!(view.is_empty(&entities));

        let e = entities.create();
        e.assign(&mut entities, Position(1.0));
        assert!(view.is_empty(&entities));
        e.assign(&mut entities, Velocity(2.0));
        assert_eq!(view.iter(&entities).collect::<Vec<_>>(), vec![e]);

        e.remove::<Position>(&mut entities);
        assert!(view.is_empty(&entities));
    }

    #[test]
    fn test_handles_point_at_visited_entity() {
        let mut entities = manager();
        let a = entities.create();
        let b = entities.create();
        a.assign(&mut entities, Position(1.0));
        b.assign(&mut entities, Position(2.0));

        let seen: HashSet<Entity> = entities
            .entities_with_handles::<(Position,)>()
            .map(|(entity, (position,))| {
                assert_eq!(position.entity(), entity);
                entity
            })
            .collect();
        assert_eq!(seen, HashSet::from([a, b]));
    }

    #[test]
    fn test_view_of_other_manager_is_empty() {
        let mut first = manager();
        let mut second = manager();
        let e = second.create();
        e.assign(&mut second, Position(0.0));

        let view = first.view::<(Position,)>();
        assert_eq!(view.len(&second), 0);
    }
}
