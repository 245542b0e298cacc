//! Mask-bearing subjects.
//!
//! The engine never depends on concrete user or role records. Anything that
//! can report its own mask (and optionally the masks of attached roles)
//! implements [`HasPermissionMask`].

use serde::{Deserialize, Serialize};

use crate::mask::Mask;

/// Capability interface for anything carrying permissions
pub trait HasPermissionMask {
    /// The subject's own, directly assigned mask
    fn own_mask(&self) -> Mask;

    /// Masks contributed by attached roles
    fn role_masks(&self) -> Vec<Mask> {
        Vec::new()
    }

    /// Own mask OR every role mask
    fn effective_mask(&self) -> Mask {
        self.role_masks()
            .into_iter()
            .fold(self.own_mask(), |acc, m| acc | m)
    }
}

impl HasPermissionMask for Mask {
    fn own_mask(&self) -> Mask {
        *self
    }
}

impl<T: HasPermissionMask + ?Sized> HasPermissionMask for &T {
    fn own_mask(&self) -> Mask {
        (**self).own_mask()
    }

    fn role_masks(&self) -> Vec<Mask> {
        (**self).role_masks()
    }

    fn effective_mask(&self) -> Mask {
        (**self).effective_mask()
    }
}

/// A role attached to a subject
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub permissions: Mask,
}

impl Role {
    pub fn new(permissions: Mask) -> Self {
        Self { permissions }
    }
}

impl HasPermissionMask for Role {
    fn own_mask(&self) -> Mask {
        self.permissions
    }
}

/// Plain user record as exchanged with the user-management layer.
///
/// Wire shape: `{ "permissions": "<decimal>", "roles": [{ "permissions": "<decimal>" }] }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub permissions: Mask,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl Subject {
    pub fn new(permissions: Mask) -> Self {
        Self {
            permissions,
            roles: Vec::new(),
        }
    }

    pub fn with_role(mut self, permissions: Mask) -> Self {
        self.roles.push(Role::new(permissions));
        self
    }

    /// Same roles, replaced own mask
    pub fn with_permissions(&self, permissions: Mask) -> Self {
        Self {
            permissions,
            roles: self.roles.clone(),
        }
    }

    /// Own mask only, detached from every role
    pub fn without_roles(&self) -> Self {
        Self::new(self.permissions)
    }
}

impl HasPermissionMask for Subject {
    fn own_mask(&self) -> Mask {
        self.permissions
    }

    fn role_masks(&self) -> Vec<Mask> {
        self.roles.iter().map(|r| r.permissions).collect()
    }

    fn effective_mask(&self) -> Mask {
        self.roles
            .iter()
            .fold(self.permissions, |acc, r| acc | r.permissions)
    }
}
