//! # Tessera Storage
//!
//! Sparse-set component storage for the tessera ECS:
//! - Generational entity ids, validated on every access
//! - One packed pool per component type with O(1) insert/remove/lookup
//! - Construct/destroy hooks fired synchronously inside the mutating call
//! - Persistent groups that keep multi-component intersections up to date
//!
//! ## Example
//!
//! ```rust
//! use std::any::TypeId;
//! use tessera_storage::Registry;
//!
//! struct Position(f32);
//! struct Velocity(f32);
//!
//! let mut registry = Registry::new();
//! let group = registry.group(&[TypeId::of::<Position>(), TypeId::of::<Velocity>()]);
//!
//! let id = registry.create();
//! registry.emplace(id, Position(0.0));
//! registry.emplace(id, Velocity(1.0));
//! assert_eq!(registry.group_ids(group), &[id]);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

mod entity;
mod group;
mod pool;
mod registry;
mod signal;
mod sparse_set;

pub use entity::EntityId;
pub use group::GroupId;
pub use pool::{Component, Pool};
pub use registry::Registry;
pub use signal::{Hook, HookId, Signal};
pub use sparse_set::SparseSet;
