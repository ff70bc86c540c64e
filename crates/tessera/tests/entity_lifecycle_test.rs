//! Integration tests for entity and handle validity.

use std::collections::HashSet;

use tessera::{EcsError, Ecs, Entity};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Position(f32, f32);
#[derive(Debug, Clone, Copy, PartialEq)]
struct Velocity(f32, f32);
#[derive(Debug, Clone, Copy, PartialEq)]
struct Frozen;

#[test]
fn test_destroy_invalidates_entity_and_handles() {
    let mut ecs = Ecs::new();
    let e = ecs.entities.create();
    let position = e.assign(&mut ecs.entities, Position(1.0, 2.0));
    let velocity = e.assign(&mut ecs.entities, Velocity(0.0, 0.0));
    let copy = e;

    assert!(position.valid(&ecs.entities));
    assert!(e.destroy(&mut ecs.entities));

    assert!(!e.valid(&ecs.entities));
    assert!(!copy.valid(&ecs.entities));
    assert!(!position.valid(&ecs.entities));
    assert!(!velocity.valid(&ecs.entities));
    assert_eq!(position.get(&ecs.entities), Err(EcsError::InvalidEntity(e.id())));
}

#[test]
fn test_recycled_slot_does_not_revive_old_entity() {
    let mut ecs = Ecs::new();
    let old = ecs.entities.create();
    let handle = old.assign(&mut ecs.entities, Position(0.0, 0.0));
    old.destroy(&mut ecs.entities);

    let new = ecs.entities.create();
    new.assign(&mut ecs.entities, Position(5.0, 5.0));

    assert_eq!(new.id().index(), old.id().index());
    assert_ne!(new, old);
    assert!(!old.valid(&ecs.entities));
    assert!(!handle.valid(&ecs.entities));
}

#[test]
fn test_has_component_tracks_assign_and_remove() {
    let mut ecs = Ecs::new();
    let e = ecs.entities.create();
    assert!(!e.has_component::<Position>(&ecs.entities));

    e.assign(&mut ecs.entities, Position(0.0, 0.0));
    assert!(e.has_component::<Position>(&ecs.entities));

    assert!(e.remove::<Position>(&mut ecs.entities));
    assert!(!e.has_component::<Position>(&ecs.entities));
    assert!(!e.remove::<Position>(&mut ecs.entities));

    e.assign(&mut ecs.entities, Position(0.0, 0.0));
    e.destroy(&mut ecs.entities);
    assert!(!e.has_component::<Position>(&ecs.entities));
}

#[test]
fn test_handle_reports_missing_component() {
    let mut ecs = Ecs::new();
    let e = ecs.entities.create();
    let handle = e.component::<Frozen>();

    assert!(!handle.valid(&ecs.entities));
    assert!(matches!(
        handle.get(&ecs.entities),
        Err(EcsError::InvalidComponent { entity, .. }) if entity == e.id()
    ));

    e.assign(&mut ecs.entities, Frozen);
    assert!(handle.valid(&ecs.entities));
    assert!(handle.remove(&mut ecs.entities));
    assert!(!handle.valid(&ecs.entities));
}

#[test]
fn test_handle_equality_ignores_validity() {
    let mut ecs = Ecs::new();
    let e = ecs.entities.create();
    let assigned = e.assign(&mut ecs.entities, Position(0.0, 0.0));
    let looked_up = ecs.entities.component::<Position>(e);
    assert_eq!(assigned, looked_up);

    e.destroy(&mut ecs.entities);
    assert_eq!(assigned, looked_up);
    assert_eq!(assigned.entity(), e);
}

#[test]
fn test_default_entity_never_valid() {
    let mut ecs = Ecs::new();
    ecs.entities.create();
    let e = Entity::default();

    assert!(!e.valid(&ecs.entities));
    let handle = e.assign(&mut ecs.entities, Position(0.0, 0.0));
    assert!(!handle.valid(&ecs.entities));
    assert!(!e.has_component::<Position>(&ecs.entities));
}

#[test]
fn test_single_view_yields_exactly_holders() {
    let mut ecs = Ecs::new();
    let mut holders = HashSet::new();
    for i in 0..50 {
        let e = ecs.entities.create();
        if i % 3 == 0 {
            e.assign(&mut ecs.entities, Velocity(0.0, 0.0));
            holders.insert(e);
        }
    }

    let seen: Vec<Entity> = ecs.entities.entities_with_components::<(Velocity,)>().collect();
    assert_eq!(seen.len(), holders.len());
    assert_eq!(seen.into_iter().collect::<HashSet<_>>(), holders);
}

#[test]
fn test_persistent_view_tracks_intersection() {
    let mut ecs = Ecs::new();
    let both = ecs.entities.create();
    let only_position = ecs.entities.create();
    both.assign(&mut ecs.entities, Position(0.0, 0.0));
    both.assign(&mut ecs.entities, Velocity(1.0, 0.0));
    only_position.assign(&mut ecs.entities, Position(0.0, 0.0));

    let matched: Vec<Entity> = ecs
        .entities
        .entities_with_components::<(Position, Velocity)>()
        .collect();
    assert_eq!(matched, vec![both]);

    only_position.assign(&mut ecs.entities, Velocity(2.0, 0.0));
    let matched: HashSet<Entity> = ecs
        .entities
        .entities_with_components::<(Position, Velocity)>()
        .collect();
    assert_eq!(matched, HashSet::from([both, only_position]));

    both.destroy(&mut ecs.entities);
    let matched: Vec<Entity> = ecs
        .entities
        .entities_with_components::<(Position, Velocity)>()
        .collect();
    assert_eq!(matched, vec![only_position]);
}

#[test]
fn test_unpacked_handles_dereference() {
    let mut ecs = Ecs::new();
    for x in [1.0, 2.0, 3.0] {
        let e = ecs.entities.create();
        e.assign(&mut ecs.entities, Position(x, 0.0));
        e.assign(&mut ecs.entities, Velocity(x, 0.0));
    }

    let rows: Vec<_> = ecs
        .entities
        .entities_with_handles::<(Position, Velocity)>()
        .collect();
    assert_eq!(rows.len(), 3);
    for (entity, (position, velocity)) in rows {
        assert_eq!(position.entity(), entity);
        assert_eq!(
            position.get(&ecs.entities).unwrap().0,
            velocity.get(&ecs.entities).unwrap().0
        );
    }
}
