//! Role-based access control
//!
//! Capability sets: each role maps to the set of principals holding it.
//! The store is held by the registry state by composition; there is no
//! inheritance or mixin layering.

use crate::types::{Principal, Role};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Role membership store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleStore {
    members: HashMap<Role, HashSet<Principal>>,
}

impl RoleStore {
    /// Create empty role store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a principal to a role. Returns true if membership changed.
    pub fn grant(&mut self, role: Role, principal: Principal) -> bool {
        self.members.entry(role).or_default().insert(principal)
    }

    /// Remove a principal from a role. Returns true if membership changed.
    pub fn revoke(&mut self, role: Role, principal: &Principal) -> bool {
        self.members
            .get_mut(&role)
            .map(|set| set.remove(principal))
            .unwrap_or(false)
    }

    /// Check if a principal holds a role
    pub fn has_role(&self, role: Role, principal: &Principal) -> bool {
        self.members
            .get(&role)
            .map(|set| set.contains(principal))
            .unwrap_or(false)
    }

    /// All principals holding a role
    pub fn members(&self, role: Role) -> impl Iterator<Item = &Principal> {
        self.members
            .get(&role)
            .map(|set| set.iter())
            .into_iter()
            .flatten()
    }
}
