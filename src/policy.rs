//! Caller-side authorization guards.
//!
//! The engine will set or clear any bit it is asked to. These guards hold the
//! rules the admin surface layers on top: who may edit permissions at all,
//! and the protection of the wildcard permission.

use tracing::debug;

use crate::constants::MANAGE_USER_ROLES;
use crate::engine::Engine;
use crate::error::PolicyError;
use crate::mask::Mask;
use crate::subject::HasPermissionMask;

/// An identified subject taking part in a guarded operation
#[derive(Debug)]
pub struct Principal<'a, S: HasPermissionMask + ?Sized> {
    pub id: &'a str,
    pub subject: &'a S,
}

// Manual impls: a derive would demand `S: Copy`
impl<S: HasPermissionMask + ?Sized> Clone for Principal<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: HasPermissionMask + ?Sized> Copy for Principal<'_, S> {}

impl<'a, S: HasPermissionMask + ?Sized> Principal<'a, S> {
    pub fn new(id: &'a str, subject: &'a S) -> Self {
        Self { id, subject }
    }
}

/// Fail unless `subject` holds the permission named `permission`.
///
/// Names missing from the registry are treated as not held.
pub fn require<S: HasPermissionMask + ?Sized>(
    engine: &Engine,
    subject: &S,
    permission: &str,
) -> Result<(), PolicyError> {
    let held = engine
        .get_permission(permission)
        .is_some_and(|p| engine.has_permission(subject, p));
    if held {
        Ok(())
    } else {
        debug!(permission, "permission check failed");
        Err(PolicyError::Unauthorized {
            permission: permission.to_string(),
        })
    }
}

fn holds_wildcard<S: HasPermissionMask + ?Sized>(engine: &Engine, subject: &S) -> bool {
    engine
        .registry()
        .wildcard()
        .is_some_and(|w| engine.has_permission(subject, w))
}

/// Decide whether `actor` may replace `target`'s own mask with `proposed`.
///
/// The actor needs MANAGE_USER_ROLES. A wildcard holder can only be edited
/// by themselves, and nobody can add or drop the wildcard bit of an own mask
/// through this path.
pub fn authorize_permission_update<A, T>(
    engine: &Engine,
    actor: Principal<'_, A>,
    target: Principal<'_, T>,
    proposed: Mask,
) -> Result<(), PolicyError>
where
    A: HasPermissionMask + ?Sized,
    T: HasPermissionMask + ?Sized,
{
    require(engine, actor.subject, MANAGE_USER_ROLES)?;

    let target_is_admin = holds_wildcard(engine, target.subject);
    if target_is_admin && target.id != actor.id {
        return Err(PolicyError::Forbidden(
            "cannot change the permissions of an administrator",
        ));
    }

    // Only the own mask is being replaced; a role-granted wildcard is untouched
    if holds_wildcard(engine, &proposed) != holds_wildcard(engine, &target.subject.own_mask()) {
        return Err(PolicyError::Forbidden(
            "cannot change the ADMINISTRATOR permission",
        ));
    }

    Ok(())
}
