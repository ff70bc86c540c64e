//! # Error Types
//!
//! All errors surfaced by the access layer.

use tessera_storage::EntityId;
use thiserror::Error;

/// Errors that can occur in entity, handle and scheduler operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// Operation on a destroyed or never-valid entity.
    #[error("invalid entity: {0:?}")]
    InvalidEntity(EntityId),

    /// Dereference of a handle whose component is absent.
    #[error("entity {entity:?} has no component {component}")]
    InvalidComponent {
        /// The entity the handle points at.
        entity: EntityId,
        /// Component type name.
        component: &'static str,
    },

    /// A system of the same family is already registered.
    #[error("system already registered: {0}")]
    DuplicateSystem(&'static str),

    /// No system of the requested family is registered.
    #[error("system not found: {0}")]
    SystemNotFound(&'static str),

    /// `update` or `update_all` was called before `configure`.
    #[error("system manager not configured")]
    NotConfigured,

    /// `configure` was called a second time.
    #[error("system manager already configured")]
    AlreadyConfigured,

    /// The system is already borrowed, e.g. by a reentrant update.
    #[error("system already borrowed: {0}")]
    SystemBorrowed(&'static str),

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for access-layer operations.
pub type EcsResult<T> = Result<T, EcsError>;
