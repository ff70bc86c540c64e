//! # ECS Facade
//!
//! Bundles the three managers of one world so applications can own a single
//! value and still borrow each part independently.

use std::rc::Rc;

use crate::config::EcsConfig;
use crate::error::EcsResult;
use crate::events::EventManager;
use crate::manager::EntityManager;
use crate::system::{System, SystemManager, TimeDelta};

/// Event bus, entities and systems of one world.
///
/// # Example
///
/// ```rust
/// use tessera::{Ecs, EntityManager, EventManager, System, TimeDelta};
///
/// struct Position(f64);
/// struct Velocity(f64);
///
/// struct Movement;
///
/// impl System for Movement {
///     fn update(&mut self, entities: &mut EntityManager, _: &EventManager, dt: TimeDelta) {
///         entities.each::<(Position, Velocity), _>(|entities, _, (position, velocity)| {
///             let speed = velocity.get(entities).map_or(0.0, |v| v.0);
///             if let Ok(position) = position.get_mut(entities) {
///                 position.0 += speed * dt;
///             }
///         });
///     }
/// }
///
/// let mut ecs = Ecs::new();
/// ecs.systems.add(Movement).unwrap();
/// ecs.configure().unwrap();
///
/// let ball = ecs.entities.create();
/// ball.assign(&mut ecs.entities, Position(0.0));
/// ball.assign(&mut ecs.entities, Velocity(2.0));
///
/// ecs.update_all(0.5).unwrap();
/// assert_eq!(ecs.entities.get::<Position>(ball).unwrap().0, 1.0);
/// ```
#[derive(Debug)]
pub struct Ecs {
    /// Shared event bus; the entity manager publishes on the same one.
    pub events: Rc<EventManager>,
    /// Entities and components.
    pub entities: EntityManager,
    /// Registered systems.
    pub systems: SystemManager,
}

impl Ecs {
    /// Creates an empty world with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&EcsConfig::default())
    }

    /// Creates an empty world sized and instrumented from `config`.
    #[must_use]
    pub fn with_config(config: &EcsConfig) -> Self {
        let events = Rc::new(EventManager::new());
        Self {
            entities: EntityManager::with_config(Rc::clone(&events), config),
            systems: SystemManager::with_config(config),
            events,
        }
    }

    /// Configures every registered system. See [`SystemManager::configure`].
    ///
    /// # Errors
    ///
    /// As [`SystemManager::configure`].
    pub fn configure(&mut self) -> EcsResult<()> {
        self.systems.configure(&mut self.entities, &self.events)
    }

    /// Updates the system of type `S`. See [`SystemManager::update`].
    ///
    /// # Errors
    ///
    /// As [`SystemManager::update`].
    pub fn update<S: System>(&mut self, dt: TimeDelta) -> EcsResult<()> {
        self.systems.update::<S>(&mut self.entities, &self.events, dt)
    }

    /// Updates every system. See [`SystemManager::update_all`].
    ///
    /// # Errors
    ///
    /// As [`SystemManager::update_all`].
    pub fn update_all(&mut self, dt: TimeDelta) -> EcsResult<()> {
        self.systems.update_all(&mut self.entities, &self.events, dt)
    }
}

impl Default for Ecs {
    fn default() -> Self {
        Self::new()
    }
}
