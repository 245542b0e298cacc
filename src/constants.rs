//! Permission names, bits and the application's standard registry

use crate::registry::{Registry, RegistryBuilder};

// Permission names
pub const ADMINISTRATOR: &str = "ADMINISTRATOR";
pub const MANAGE_USERS: &str = "MANAGE_USERS";
pub const MANAGE_USERS_EXTENDED: &str = "MANAGE_USERS_EXTENDED";
pub const MANAGE_USER_ROLES: &str = "MANAGE_USER_ROLES";
pub const HIDE_FOLLOWINGS: &str = "HIDE_FOLLOWINGS";
pub const HIDE_POSTS: &str = "HIDE_POSTS";
pub const HIDE_VERIFICATION: &str = "HIDE_VERIFICATION";

// Bit indices are persisted in user records: append only, never reassign
pub const ADMINISTRATOR_BIT: u32 = 0;
pub const MANAGE_USERS_BIT: u32 = 1;
pub const MANAGE_USERS_EXTENDED_BIT: u32 = 2;
pub const MANAGE_USER_ROLES_BIT: u32 = 3;
pub const HIDE_FOLLOWINGS_BIT: u32 = 4;
pub const HIDE_POSTS_BIT: u32 = 5;
pub const HIDE_VERIFICATION_BIT: u32 = 6;

/// Declarations of the standard registry, before validation
pub fn standard_builder() -> RegistryBuilder {
    RegistryBuilder::new()
        .permission(ADMINISTRATOR, ADMINISTRATOR_BIT)
        .permission(MANAGE_USERS, MANAGE_USERS_BIT)
        .permission_with_deps(MANAGE_USERS_EXTENDED, MANAGE_USERS_EXTENDED_BIT, &[MANAGE_USERS])
        .permission_with_deps(MANAGE_USER_ROLES, MANAGE_USER_ROLES_BIT, &[MANAGE_USERS])
        .permission(HIDE_FOLLOWINGS, HIDE_FOLLOWINGS_BIT)
        .permission(HIDE_POSTS, HIDE_POSTS_BIT)
        .permission(HIDE_VERIFICATION, HIDE_VERIFICATION_BIT)
        .wildcard(ADMINISTRATOR)
}

/// The permission table used by the application
pub fn standard_registry() -> Registry {
    // Static declarations; tests/registry.rs::standard_registry_bits_are_stable builds them
    match standard_builder().build() {
        Ok(registry) => registry,
        Err(e) => unreachable!("standard registry is invalid: {e}"),
    }
}
