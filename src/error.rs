//! Error types for rolemask

use thiserror::Error;

/// The main error type for rolemask operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A wire-format mask could not be parsed
    #[error("invalid mask '{input}': {reason}")]
    InvalidMask { input: String, reason: &'static str },

    /// The permission table is inconsistent
    #[error("invalid registry: {0}")]
    Registry(#[from] RegistryError),

    /// A configuration source could not be loaded
    #[cfg(feature = "server")]
    #[error("configuration error: {0}")]
    Config(String),
}

/// Problems detected while building a [`Registry`](crate::Registry)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("permission name cannot be empty")]
    EmptyName,

    #[error("permission '{0}' is declared twice")]
    DuplicateName(String),

    #[error("bit {bit} of '{name}' is already used by '{existing}'")]
    DuplicateBit {
        name: String,
        bit: u32,
        existing: String,
    },

    #[error("bit {bit} of '{name}' exceeds the {max}-permission ceiling")]
    BitOutOfRange { name: String, bit: u32, max: u32 },

    #[error("'{permission}' depends on unknown permission '{dependency}'")]
    UnknownDependency {
        permission: String,
        dependency: String,
    },

    #[error("'{0}' cannot depend on itself")]
    SelfDependency(String),

    #[error("'{0}' is part of a dependency cycle")]
    DependencyCycle(String),

    #[error("wildcard permission '{0}' is not registered")]
    UnknownWildcard(String),
}

/// Denials produced by the caller-side authorization guards in [`policy`](crate::policy)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("missing permission {permission}")]
    Unauthorized { permission: String },

    #[error("{0}")]
    Forbidden(&'static str),
}

/// Result type alias for rolemask operations
pub type Result<T> = std::result::Result<T, Error>;
