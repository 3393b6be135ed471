use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::Permission;

/// Named set of permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    name: String,
    permissions: BTreeSet<Permission>,
    active: bool,
}

impl Role {
    pub fn new(name: impl Into<String>, permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            name: name.into(),
            permissions: permissions.into_iter().collect(),
            active: true,
        }
    }

    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn permissions(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.iter()
    }

    pub fn grants(&self, permission: &Permission) -> bool {
        self.active && self.permissions.contains(permission)
    }

    pub fn administrator() -> Self {
        Self::new("Administrator", Permission::ALL)
    }

    pub fn sales() -> Self {
        Self::new(
            "Sales",
            [Permission::INV_VIEW, Permission::ORD_VIEW, Permission::ORD_MANAGE],
        )
    }

    pub fn warehouse() -> Self {
        Self::new(
            "Warehouse",
            [
                Permission::INV_VIEW,
                Permission::INV_MANAGE,
                Permission::INV_MOVEMENTS,
                Permission::ORD_VIEW,
            ],
        )
    }

    pub fn dispatch() -> Self {
        Self::new(
            "Dispatch",
            [Permission::INV_VIEW, Permission::ORD_VIEW, Permission::ORD_STATUS],
        )
    }

    /// Roles seeded on a fresh install.
    pub fn built_in() -> Vec<Role> {
        vec![Self::administrator(), Self::sales(), Self::warehouse(), Self::dispatch()]
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}
