//! Mask algebra over subjects.
//!
//! Every operation is a pure function of its inputs plus the immutable
//! registry. Mutating operations return a new own-mask; persisting it is the
//! caller's job, and role masks are never touched.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::constants::standard_registry;
use crate::mask::Mask;
use crate::registry::{Permission, Registry};
use crate::subject::HasPermissionMask;

/// Stateless permission service bound to one registry
#[derive(Debug, Clone)]
pub struct Engine {
    registry: Arc<Registry>,
}

impl Engine {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn from_shared(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Engine over [`standard_registry`]
    pub fn standard() -> Self {
        Self::new(standard_registry())
    }

    #[inline]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    // Registry passthroughs

    #[inline]
    pub fn get_permission(&self, name: &str) -> Option<&Permission> {
        self.registry.get_permission(name)
    }

    pub fn get_all_permissions(&self) -> Vec<&str> {
        self.registry.get_all_permissions()
    }

    pub fn permission_dependants(&self, permission: &Permission) -> &[String] {
        self.registry.permission_dependants(permission)
    }

    // Combination

    /// Effective mask of a subject: own mask OR every role mask
    pub fn get_permissions<S: HasPermissionMask + ?Sized>(&self, subject: &S) -> Mask {
        let mask = subject.effective_mask();
        trace!(%mask, "resolved effective mask");
        mask
    }

    /// Mask of a list of permission names. Unknown names are skipped.
    pub fn get_permissions_from_names<I, N>(&self, names: I) -> Mask
    where
        I: IntoIterator<Item = N>,
        N: AsRef<str>,
    {
        names.into_iter().fold(Mask::EMPTY, |acc, name| {
            let name = name.as_ref();
            match self.registry.get_permission(name) {
                Some(p) => acc | p.mask(),
                None => {
                    debug!(name, "skipping unknown permission name");
                    acc
                }
            }
        })
    }

    // Checks

    #[inline]
    fn grants_everything(&self, effective: Mask) -> bool {
        self.registry
            .wildcard()
            .is_some_and(|w| effective.intersects(w.mask()))
    }

    /// True if the subject holds `permission`, or holds the wildcard
    pub fn has_permission<S: HasPermissionMask + ?Sized>(
        &self,
        subject: &S,
        permission: &Permission,
    ) -> bool {
        let effective = self.get_permissions(subject);
        self.grants_everything(effective) || effective.intersects(permission.mask())
    }

    /// Check several permissions at once.
    ///
    /// With `match_any` one held permission suffices; otherwise all must be
    /// held. The wildcard short-circuits both modes.
    pub fn has_permissions<S: HasPermissionMask + ?Sized>(
        &self,
        subject: &S,
        permissions: &[&Permission],
        match_any: bool,
    ) -> bool {
        let effective = self.get_permissions(subject);
        if self.grants_everything(effective) {
            return true;
        }
        if match_any {
            permissions.iter().any(|p| effective.intersects(p.mask()))
        } else {
            permissions.iter().all(|p| effective.intersects(p.mask()))
        }
    }

    // Mutation

    /// Own mask with `permission` set
    pub fn add_permission<S: HasPermissionMask + ?Sized>(
        &self,
        subject: &S,
        permission: &Permission,
    ) -> Mask {
        subject.own_mask() | permission.mask()
    }

    /// Held dependants of `permission` that prevent its removal
    pub fn blocking_dependants<S: HasPermissionMask + ?Sized>(
        &self,
        subject: &S,
        permission: &Permission,
    ) -> Vec<&str> {
        self.registry
            .permission_dependants(permission)
            .iter()
            .filter_map(|name| self.registry.get_permission(name))
            .filter(|dependant| self.has_permission(subject, dependant))
            .map(|dependant| dependant.name())
            .collect()
    }

    /// Own mask with `permission` cleared.
    ///
    /// Refused (own mask returned unchanged) while any permission depending
    /// on it is held through the own mask, a role, or the wildcard. Bits that
    /// only come from roles stay effective either way.
    pub fn remove_permission<S: HasPermissionMask + ?Sized>(
        &self,
        subject: &S,
        permission: &Permission,
    ) -> Mask {
        let own = subject.own_mask();
        let blocked_by = self.blocking_dependants(subject, permission);
        if !blocked_by.is_empty() {
            debug!(
                permission = permission.name(),
                ?blocked_by,
                "removal refused: dependants still held"
            );
            return own;
        }
        own.difference(permission.mask())
    }

    // Presentation

    /// Names of the registered permissions set in the bearer's own mask, in
    /// registry order. Unregistered bits are ignored.
    pub fn get_permission_list<S: HasPermissionMask + ?Sized>(&self, bearer: &S) -> Vec<&str> {
        let mask = bearer.own_mask();
        self.registry
            .iter()
            .filter(|p| mask.intersects(p.mask()))
            .map(|p| p.name())
            .collect()
    }

    /// Bits in `mask` that no registered permission claims
    pub fn unknown_bits(&self, mask: Mask) -> Mask {
        mask.difference(self.registry.all_bits())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::standard()
    }
}

impl From<Registry> for Engine {
    fn from(registry: Registry) -> Self {
        Self::new(registry)
    }
}
