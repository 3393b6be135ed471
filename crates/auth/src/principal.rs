use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use orderdesk_core::Actor;

use crate::{Permission, Role};

/// Caller identity plus the permissions it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub actor: Actor,
    pub permissions: BTreeSet<Permission>,
    pub active: bool,
}

impl Principal {
    pub fn new(actor: Actor, permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            actor,
            permissions: permissions.into_iter().collect(),
            active: true,
        }
    }

    /// Effective permissions are the union of every active role.
    pub fn with_roles<'a>(actor: Actor, roles: impl IntoIterator<Item = &'a Role>) -> Self {
        let permissions = roles
            .into_iter()
            .filter(|r| r.is_active())
            .flat_map(|r| r.permissions().cloned())
            .collect::<BTreeSet<_>>();
        Self::new(actor, permissions)
    }

    /// Full access; for seeding, migrations and tests.
    pub fn system() -> Self {
        Self::new(Actor::system(), Permission::ALL)
    }

    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn has(&self, permission: &Permission) -> bool {
        self.active && self.permissions.contains(permission)
    }
}
