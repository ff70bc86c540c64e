//! # Tessera
//!
//! Entity-component-system access layer over [`tessera_storage`]:
//! - [`Entity`] and [`ComponentHandle`]: copyable weak references, checked
//!   against the store on every access
//! - Views over one or many component types, optionally unpacked into handles
//! - [`EventManager`]: typed publish/subscribe with a deferred queue, plus
//!   [`ComponentAdded`]/[`ComponentRemoved`] emitted from inside storage mutations
//! - [`SystemManager`]: configure-once, update-in-registration-order scheduler
//!
//! ## Threading
//!
//! Everything is single-threaded. Managers share the bus through `Rc` and
//! are neither `Send` nor `Sync`.
//!
//! ## Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use tessera::{ComponentAdded, Ecs};
//!
//! struct Name(&'static str);
//!
//! let mut ecs = Ecs::new();
//! let spawned = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&spawned);
//! let listener = Rc::new(move |_: &ComponentAdded<Name>| counter.set(counter.get() + 1));
//! ecs.entities.subscribe::<ComponentAdded<Name>, _>(&listener);
//!
//! let player = ecs.entities.create();
//! player.assign(&mut ecs.entities, Name("player"));
//! assert_eq!(spawned.get(), 1);
//!
//! let named: Vec<_> = ecs.entities.entities_with_components::<(Name,)>().collect();
//! assert_eq!(named, vec![player]);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod entity;
pub mod error;
pub mod events;
pub mod family;
pub mod handle;
pub mod manager;
pub mod system;
pub mod view;

pub use config::EcsConfig;
pub use ecs::Ecs;
pub use entity::{Entity, ManagerId};
pub use error::{EcsError, EcsResult};
pub use events::{
    ComponentAdded, ComponentRemoved, Event, EventManager, HookKind, Receiver, StructuralEvent,
};
pub use family::{family_count, family_of, Family};
pub use handle::ComponentHandle;
pub use manager::EntityManager;
pub use system::{System, SystemManager, SystemRef, TimeDelta};
pub use view::{ComponentSet, EntityView, HandleView, View};

pub use tessera_storage::{Component, EntityId};
