//! Permission registry: the closed set of named permissions, their bits and
//! the static dependency table.
//!
//! A [`Registry`] is built once through [`RegistryBuilder`] (or from a
//! deserialized [`RegistryDefinition`]) and is immutable afterwards. The
//! reverse dependency index is computed eagerly at build time.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};
use crate::mask::{Mask, MAX_PERMISSIONS};

/// A named capability occupying one bit of a [`Mask`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    name: String,
    bit: u32,
    depends_on: Vec<String>,
}

impl Permission {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn bit(&self) -> u32 {
        self.bit
    }

    /// The single-bit mask of this permission
    #[inline]
    pub fn mask(&self) -> Mask {
        Mask::from_bits(1 << self.bit)
    }

    /// Permissions this one requires
    #[inline]
    pub fn depends_on(&self) -> &[String] {
        &self.depends_on
    }
}

/// Declarative form of one registry entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDef {
    pub name: String,
    pub bit: u32,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

/// Declarative form of a whole registry, loadable from JSON
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryDefinition {
    #[serde(default)]
    pub wildcard: Option<String>,
    pub permissions: Vec<PermissionDef>,
}

impl RegistryDefinition {
    pub fn build(self) -> Result<Registry> {
        let mut builder = RegistryBuilder::new();
        builder.defs = self.permissions;
        builder.wildcard = self.wildcard;
        builder.build()
    }
}

/// Collects permission declarations and validates them into a [`Registry`]
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    defs: Vec<PermissionDef>,
    wildcard: Option<String>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a permission with no prerequisites
    pub fn permission(self, name: &str, bit: u32) -> Self {
        self.permission_with_deps(name, bit, &[])
    }

    /// Declare a permission that requires `depends_on` to stay meaningful
    pub fn permission_with_deps(mut self, name: &str, bit: u32, depends_on: &[&str]) -> Self {
        self.defs.push(PermissionDef {
            name: name.to_string(),
            bit,
            depends_on: depends_on.iter().map(|d| d.to_string()).collect(),
        });
        self
    }

    /// Mark the permission whose presence grants every check
    pub fn wildcard(mut self, name: &str) -> Self {
        self.wildcard = Some(name.to_string());
        self
    }

    pub fn build(self) -> Result<Registry> {
        let mut permissions: Vec<Permission> = Vec::with_capacity(self.defs.len());
        let mut by_name = HashMap::with_capacity(self.defs.len());
        let mut by_bit: HashMap<u32, usize> = HashMap::with_capacity(self.defs.len());

        for def in self.defs {
            if def.name.is_empty() {
                return Err(RegistryError::EmptyName.into());
            }
            if def.bit >= MAX_PERMISSIONS {
                return Err(RegistryError::BitOutOfRange {
                    name: def.name,
                    bit: def.bit,
                    max: MAX_PERMISSIONS,
                }
                .into());
            }
            if by_name.contains_key(&def.name) {
                return Err(RegistryError::DuplicateName(def.name).into());
            }
            if let Some(&idx) = by_bit.get(&def.bit) {
                return Err(RegistryError::DuplicateBit {
                    name: def.name,
                    bit: def.bit,
                    existing: permissions[idx].name.clone(),
                }
                .into());
            }

            let mut depends_on: Vec<String> = Vec::with_capacity(def.depends_on.len());
            for dep in def.depends_on {
                if dep == def.name {
                    return Err(RegistryError::SelfDependency(def.name).into());
                }
                if !depends_on.contains(&dep) {
                    depends_on.push(dep);
                }
            }

            let idx = permissions.len();
            by_name.insert(def.name.clone(), idx);
            by_bit.insert(def.bit, idx);
            permissions.push(Permission {
                name: def.name,
                bit: def.bit,
                depends_on,
            });
        }

        // Dependencies may point forward, so resolve once everything is declared
        let mut dependants: Vec<Vec<String>> = vec![Vec::new(); permissions.len()];
        let mut edges: Vec<Vec<usize>> = vec![Vec::new(); permissions.len()];
        for (idx, p) in permissions.iter().enumerate() {
            for dep in &p.depends_on {
                let &target = by_name.get(dep).ok_or_else(|| RegistryError::UnknownDependency {
                    permission: p.name.clone(),
                    dependency: dep.clone(),
                })?;
                dependants[target].push(p.name.clone());
                edges[idx].push(target);
            }
        }

        // A cycle would make every permission on it unremovable
        if let Some(idx) = find_cycle(&edges) {
            return Err(RegistryError::DependencyCycle(permissions[idx].name.clone()).into());
        }

        let wildcard = match self.wildcard {
            Some(name) => Some(
                *by_name
                    .get(&name)
                    .ok_or(RegistryError::UnknownWildcard(name))?,
            ),
            None => None,
        };

        tracing::debug!(permissions = permissions.len(), "permission registry built");

        Ok(Registry {
            permissions,
            by_name,
            by_bit,
            dependants,
            wildcard,
        })
    }
}

/// Index of a permission on a dependency cycle, if any (iterative DFS)
fn find_cycle(edges: &[Vec<usize>]) -> Option<usize> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        New,
        Open,
        Done,
    }

    let mut marks = vec![Mark::New; edges.len()];
    for root in 0..edges.len() {
        if marks[root] != Mark::New {
            continue;
        }
        marks[root] = Mark::Open;
        let mut stack = vec![(root, 0usize)];
        while let Some(top) = stack.last_mut() {
            let (node, next) = *top;
            match edges[node].get(next) {
                Some(&dep) => {
                    top.1 += 1;
                    match marks[dep] {
                        Mark::Open => return Some(dep),
                        Mark::New => {
                            marks[dep] = Mark::Open;
                            stack.push((dep, 0));
                        }
                        Mark::Done => {}
                    }
                }
                None => {
                    marks[node] = Mark::Done;
                    stack.pop();
                }
            }
        }
    }
    None
}

/// Immutable permission table shared by every engine call
#[derive(Debug, Clone)]
pub struct Registry {
    /// Declaration order
    permissions: Vec<Permission>,
    by_name: HashMap<String, usize>,
    by_bit: HashMap<u32, usize>,
    /// Parallel to `permissions`: who depends on each entry
    dependants: Vec<Vec<String>>,
    wildcard: Option<usize>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Case-sensitive exact lookup
    #[inline]
    pub fn get_permission(&self, name: &str) -> Option<&Permission> {
        self.by_name.get(name).map(|&i| &self.permissions[i])
    }

    #[inline]
    pub fn permission_by_bit(&self, bit: u32) -> Option<&Permission> {
        self.by_bit.get(&bit).map(|&i| &self.permissions[i])
    }

    /// All permission names in declaration order
    pub fn get_all_permissions(&self) -> Vec<&str> {
        self.permissions.iter().map(|p| p.name.as_str()).collect()
    }

    /// All permissions in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.iter()
    }

    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    /// Every other permission that lists `permission` as a prerequisite.
    ///
    /// Returns an empty slice for permissions that nothing depends on, and
    /// for permissions that do not belong to this registry.
    pub fn permission_dependants(&self, permission: &Permission) -> &[String] {
        self.by_name
            .get(permission.name())
            .map(|&i| self.dependants[i].as_slice())
            .unwrap_or(&[])
    }

    /// Prerequisites of `permission`
    pub fn dependencies(&self, permission: &Permission) -> &[String] {
        self.get_permission(permission.name())
            .map(|p| p.depends_on())
            .unwrap_or(&[])
    }

    /// The permission that grants every check, if one is configured
    pub fn wildcard(&self) -> Option<&Permission> {
        self.wildcard.map(|i| &self.permissions[i])
    }

    /// Union of every registered bit
    pub fn all_bits(&self) -> Mask {
        self.permissions
            .iter()
            .fold(Mask::EMPTY, |acc, p| acc | p.mask())
    }

    /// Export back to the declarative form
    pub fn definition(&self) -> RegistryDefinition {
        RegistryDefinition {
            wildcard: self.wildcard().map(|p| p.name.clone()),
            permissions: self
                .permissions
                .iter()
                .map(|p| PermissionDef {
                    name: p.name.clone(),
                    bit: p.bit,
                    depends_on: p.depends_on.clone(),
                })
                .collect(),
        }
    }
}
