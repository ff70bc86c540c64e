//! # Systems
//!
//! A [`System`] is one unit of per-frame logic. The [`SystemManager`] keeps
//! them keyed by [family id](crate::family) and drives the lifecycle:
//!
//! ```text
//! add(A) ─ add(B) ─ add(C) ─► configure() ─► update_all(dt) ─► update_all(dt) ─► ...
//!        Unconfigured                      Configured
//! ```
//!
//! Everything runs sequentially on the calling thread, in registration order.

use std::any::{type_name, Any};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::config::EcsConfig;
use crate::error::{EcsError, EcsResult};
use crate::events::EventManager;
use crate::family::{family_of, Family};
use crate::manager::EntityManager;

/// Time step passed to [`System::update`], in seconds.
pub type TimeDelta = f64;

/// One unit of per-frame logic.
pub trait System: 'static {
    /// Called once by [`SystemManager::configure`], before any update.
    ///
    /// Defaults to [`System::configure_events`].
    fn configure(&mut self, entities: &mut EntityManager, events: &EventManager) {
        let _ = entities;
        self.configure_events(events);
    }

    /// Configuration hook for systems that only subscribe to events.
    fn configure_events(&mut self, events: &EventManager) {
        let _ = events;
    }

    /// Runs one step.
    fn update(&mut self, entities: &mut EntityManager, events: &EventManager, dt: TimeDelta);
}

/// Shared reference to a registered system.
pub type SystemRef<S> = Rc<RefCell<S>>;

/// One registration.
struct Entry {
    family: Family,
    name: &'static str,
    system: Rc<RefCell<dyn System>>,
    /// Same allocation as `system`, kept for typed lookup.
    typed: Rc<dyn Any>,
}

impl Entry {
    fn borrow_mut(&self) -> EcsResult<std::cell::RefMut<'_, dyn System>> {
        self.system
            .try_borrow_mut()
            .map_err(|_| EcsError::SystemBorrowed(self.name))
    }
}

/// Registry and driver of systems.
///
/// Systems are shared: the manager and every caller holding a
/// [`SystemRef`] keep a system alive together.
#[derive(Default)]
pub struct SystemManager {
    /// Registration order.
    entries: Vec<Entry>,
    /// Family -> position in `entries`.
    index: HashMap<Family, usize>,
    configured: bool,
    /// Updates slower than this are logged.
    slow_update: Option<Duration>,
}

impl SystemManager {
    /// Creates an empty, unconfigured manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty manager using the diagnostics settings of `config`.
    #[must_use]
    pub fn with_config(config: &EcsConfig) -> Self {
        Self {
            slow_update: (config.slow_system_warn_us > 0)
                .then_some(Duration::from_micros(config.slow_system_warn_us)),
            ..Self::default()
        }
    }

    /// Registers `system` and returns the shared reference to it.
    ///
    /// # Errors
    ///
    /// [`EcsError::DuplicateSystem`] if a system of type `S` is already
    /// registered; the existing one is kept.
    pub fn add<S: System>(&mut self, system: S) -> EcsResult<SystemRef<S>> {
        self.add_shared(Rc::new(RefCell::new(system)))
    }

    /// Registers a system that is already shared.
    ///
    /// # Errors
    ///
    /// Same as [`SystemManager::add`].
    pub fn add_shared<S: System>(&mut self, system: SystemRef<S>) -> EcsResult<SystemRef<S>> {
        let family = family_of::<S>();
        let name = type_name::<S>();
        if self.index.contains_key(&family) {
            return Err(EcsError::DuplicateSystem(name));
        }
        if self.configured {
            tracing::warn!(system = name, "system added after configure; it will not be configured");
        }

        let dynamic: Rc<RefCell<dyn System>> = system.clone();
        let typed: Rc<dyn Any> = system.clone();
        self.index.insert(family, self.entries.len());
        self.entries.push(Entry {
            family,
            name,
            system: dynamic,
            typed,
        });

        tracing::debug!(system = name, family, "system registered");
        Ok(system)
    }

    /// Looks up the registered system of type `S`.
    ///
    /// # Errors
    ///
    /// [`EcsError::SystemNotFound`] if no `S` is registered.
    pub fn system<S: System>(&self) -> EcsResult<SystemRef<S>> {
        self.entry::<S>()?
            .typed
            .clone()
            .downcast::<RefCell<S>>()
            .map_err(|_| EcsError::SystemNotFound(type_name::<S>()))
    }

    /// Whether a system of type `S` is registered.
    #[must_use]
    pub fn contains<S: System>(&self) -> bool {
        self.index.contains_key(&family_of::<S>())
    }

    /// Number of registered systems.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no system is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether [`SystemManager::configure`] has run.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.configured
    }

    /// Configures every registered system, in registration order.
    ///
    /// # Errors
    ///
    /// [`EcsError::AlreadyConfigured`] on a second call;
    /// [`EcsError::SystemBorrowed`] if a system is borrowed elsewhere. Every
    /// system is borrowed before the first one is configured, so on this
    /// error no system has been configured and a later call starts over.
    pub fn configure(&mut self, entities: &mut EntityManager, events: &EventManager) -> EcsResult<()> {
        if self.configured {
            return Err(EcsError::AlreadyConfigured);
        }

        let mut systems = self
            .entries
            .iter()
            .map(Entry::borrow_mut)
            .collect::<EcsResult<Vec<_>>>()?;
        for (entry, system) in self.entries.iter().zip(systems.iter_mut()) {
            system.configure(entities, events);
            tracing::debug!(system = entry.name, family = entry.family, "system configured");
        }
        drop(systems);

        self.configured = true;
        Ok(())
    }

    /// Updates the system of type `S`.
    ///
    /// # Errors
    ///
    /// [`EcsError::NotConfigured`] before [`SystemManager::configure`],
    /// [`EcsError::SystemNotFound`] if no `S` is registered,
    /// [`EcsError::SystemBorrowed`] if the system is borrowed elsewhere.
    pub fn update<S: System>(
        &self,
        entities: &mut EntityManager,
        events: &EventManager,
        dt: TimeDelta,
    ) -> EcsResult<()> {
        if !self.configured {
            return Err(EcsError::NotConfigured);
        }
        self.run(self.entry::<S>()?, entities, events, dt)
    }

    /// Updates every system once, in registration order.
    ///
    /// Stops at the first system that cannot be borrowed.
    ///
    /// # Errors
    ///
    /// [`EcsError::NotConfigured`] before [`SystemManager::configure`],
    /// [`EcsError::SystemBorrowed`] if a system is borrowed elsewhere.
    pub fn update_all(
        &self,
        entities: &mut EntityManager,
        events: &EventManager,
        dt: TimeDelta,
    ) -> EcsResult<()> {
        if !self.configured {
            return Err(EcsError::NotConfigured);
        }
        for entry in &self.entries {
            self.run(entry, entities, events, dt)?;
        }
        Ok(())
    }

    fn entry<S: System>(&self) -> EcsResult<&Entry> {
        self.index
            .get(&family_of::<S>())
            .map(|position| &self.entries[*position])
            .ok_or(EcsError::SystemNotFound(type_name::<S>()))
    }

    fn run(
        &self,
        entry: &Entry,
        entities: &mut EntityManager,
        events: &EventManager,
        dt: TimeDelta,
    ) -> EcsResult<()> {
        let mut system = entry.borrow_mut()?;
        let Some(budget) = self.slow_update else {
            system.update(entities, events, dt);
            return Ok(());
        };

        let start = Instant::now();
        system.update(entities, events, dt);
        let elapsed = start.elapsed();
        if elapsed > budget {
            tracing::warn!(
                system = entry.name,
                elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
                budget_us = u64::try_from(budget.as_micros()).unwrap_or(u64::MAX),
                "slow system update"
            );
        }
        Ok(())
    }
}

impl fmt::Debug for SystemManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemManager")
            .field("systems", &self.entries.iter().map(|e| e.name).collect::<Vec<_>>())
            .field("configured", &self.configured)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Log = Rc<RefCell<Vec<(&'static str, TimeDelta)>>>;

    struct Recorder {
        name: &'static str,
        log: Log,
        configured: u32,
    }

    impl System for Recorder {
        fn configure_events(&mut self, _events: &EventManager) {
            self.configured += 1;
        }

        fn update(&mut self, _entities: &mut EntityManager, _events: &EventManager, dt: TimeDelta) {
            self.log.borrow_mut().push((self.name, dt));
        }
    }

    // Distinct types so each gets its own family.
    struct A(Recorder);
    struct B(Recorder);
    struct C(Recorder);

    macro_rules! forward {
        ($($system:ident),+) => {$(
            impl System for $system {
                fn configure(&mut self, entities: &mut EntityManager, events: &EventManager) {
                    self.0.configure(entities, events);
                }

                fn update(&mut self, entities: &mut EntityManager, events: &EventManager, dt: TimeDelta) {
                    self.0.update(entities, events, dt);
                }
            }
        )+};
    }

    forward!(A, B, C);

    fn recorder(name: &'static str, log: &Log) -> Recorder {
        Recorder {
            name,
            log: Rc::clone(log),
            configured: 0,
        }
    }

    fn world() -> (EntityManager, Rc<EventManager>) {
        let events = Rc::new(EventManager::new());
        (EntityManager::new(Rc::clone(&events)), events)
    }

    #[test]
    fn test_update_all_runs_in_registration_order() {
        let (mut entities, events) = world();
        let log = Log::default();
        let mut systems = SystemManager::new();
        systems.add(A(recorder("a", &log))).unwrap();
        systems.add(B(recorder("b", &log))).unwrap();
        systems.add(C(recorder("c", &log))).unwrap();

        systems.configure(&mut entities, &events).unwrap();
        systems.update_all(&mut entities, &events, 1.0).unwrap();

        assert_eq!(*log.borrow(), vec![("a", 1.0), ("b", 1.0), ("c", 1.0)]);
    }

    #[test]
    fn test_update_before_configure_fails() {
        let (mut entities, events) = world();
        let log = Log::default();
        let mut systems = SystemManager::new();
        systems.add(A(recorder("a", &log))).unwrap();

        assert_eq!(
            systems.update_all(&mut entities, &events, 1.0),
            Err(EcsError::NotConfigured)
        );
        assert_eq!(
            systems.update::<A>(&mut entities, &events, 1.0),
            Err(EcsError::NotConfigured)
        );
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_configure_runs_once() {
        let (mut entities, events) = world();
        let log = Log::default();
        let mut systems = SystemManager::new();
        let a = systems.add(A(recorder("a", &log))).unwrap();

        systems.configure(&mut entities, &events).unwrap();
        assert_eq!(
            systems.configure(&mut entities, &events),
            Err(EcsError::AlreadyConfigured)
        );
        assert_eq!(a.borrow().0.configured, 1);
        assert!(systems.is_configured());
    }

    #[test]
    fn test_duplicate_system_is_rejected() {
        let log = Log::default();
        let mut systems = SystemManager::new();
        let first = systems.add(A(recorder("first", &log))).unwrap();
        let second = systems.add(A(recorder("second", &log)));

        assert!(matches!(second, Err(EcsError::DuplicateSystem(_))));
        assert_eq!(systems.len(), 1);
        assert!(Rc::ptr_eq(&first, &systems.system::<A>().unwrap()));
        assert_eq!(systems.system::<A>().unwrap().borrow().0.name, "first");
    }

    #[test]
    fn test_missing_system() {
        let (mut entities, events) = world();
        let mut systems = SystemManager::new();
        systems.configure(&mut entities, &events).unwrap();

        assert!(matches!(systems.system::<B>(), Err(EcsError::SystemNotFound(_))));
        assert!(matches!(
            systems.update::<B>(&mut entities, &events, 0.5),
            Err(EcsError::SystemNotFound(_))
        ));
    }

    #[test]
    fn test_update_single_system() {
        let (mut entities, events) = world();
        let log = Log::default();
        let mut systems = SystemManager::new();
        systems.add(A(recorder("a", &log))).unwrap();
        systems.add(B(recorder("b", &log))).unwrap();
        systems.configure(&mut entities, &events).unwrap();

        systems.update::<B>(&mut entities, &events, 0.25).unwrap();
        assert_eq!(*log.borrow(), vec![("b", 0.25)]);
    }

    #[test]
    fn test_borrowed_system_is_reported() {
        let (mut entities, events) = world();
        let log = Log::default();
        let mut systems = SystemManager::new();
        let a = systems.add(A(recorder("a", &log))).unwrap();
        systems.configure(&mut entities, &events).unwrap();

        let _guard = a.borrow_mut();
        assert!(matches!(
            systems.update_all(&mut entities, &events, 1.0),
            Err(EcsError::SystemBorrowed(_))
        ));
    }

    #[test]
    fn test_configure_retry_after_borrow_failure_configures_once() {
        let (mut entities, events) = world();
        let log = Log::default();
        let mut systems = SystemManager::new();
        let a = systems.add(A(recorder("a", &log))).unwrap();
        let b = systems.add(B(recorder("b", &log))).unwrap();

        let guard = b.borrow_mut();
        assert!(matches!(
            systems.configure(&mut entities, &events),
            Err(EcsError::SystemBorrowed(_))
        ));
        assert!(!systems.is_configured());
        assert_eq!(a.borrow().0.configured, 0);
        drop(guard);

        systems.configure(&mut entities, &events).unwrap();
        assert_eq!(a.borrow().0.configured, 1);
        assert_eq!(b.borrow().0.configured, 1);
    }

    #[test]
    fn test_systems_outlive_manager() {
        let log = Log::default();
        let mut systems = SystemManager::new();
        let a = systems.add(A(recorder("a", &log))).unwrap();
        drop(systems);
        assert_eq!(Rc::strong_count(&a), 1);
    }
}
