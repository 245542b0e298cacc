//! rolemask - Role/permission bitmask engine
//!
//! Permissions are single bits of a 128-bit [`Mask`]. A subject's effective
//! permissions are its own mask OR the masks of its roles. One registered
//! permission may act as a wildcard that passes every check, and static
//! dependencies between permissions guard removals.
//!
//! ```
//! use rolemask::{Engine, Mask, Subject, constants::*};
//!
//! let engine = Engine::standard();
//! let users = engine.get_permission(MANAGE_USERS).unwrap();
//! let extended = engine.get_permission(MANAGE_USERS_EXTENDED).unwrap();
//!
//! let subject = Subject::new(users.mask() | extended.mask());
//! assert!(engine.has_permission(&subject, extended));
//!
//! // MANAGE_USERS_EXTENDED depends on MANAGE_USERS: removal is refused
//! assert_eq!(engine.remove_permission(&subject, users), subject.permissions);
//!
//! let wire = subject.permissions.to_string();
//! assert_eq!(wire.parse::<Mask>().unwrap(), subject.permissions);
//! ```

pub mod constants;
pub mod engine;
pub mod error;
pub mod mask;
pub mod policy;
pub mod registry;
pub mod subject;

#[cfg(feature = "server")]
pub mod config;
#[cfg(feature = "server")]
pub mod server;

pub use constants::standard_registry;
pub use engine::Engine;
pub use error::{Error, PolicyError, RegistryError, Result};
pub use mask::{Mask, MAX_PERMISSIONS};
pub use policy::{authorize_permission_update, require, Principal};
pub use registry::{Permission, PermissionDef, Registry, RegistryBuilder, RegistryDefinition};
pub use subject::{HasPermissionMask, Role, Subject};
