use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission code (e.g. `"INV.MANAGE"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const USR_VIEW: Permission = Permission::from_static("USR.VIEW");
    pub const USR_MANAGE: Permission = Permission::from_static("USR.MANAGE");
    pub const USR_AUDIT: Permission = Permission::from_static("USR.AUDIT");

    pub const INV_VIEW: Permission = Permission::from_static("INV.VIEW");
    pub const INV_MANAGE: Permission = Permission::from_static("INV.MANAGE");
    pub const INV_MOVEMENTS: Permission = Permission::from_static("INV.MOVEMENTS");

    pub const ORD_VIEW: Permission = Permission::from_static("ORD.VIEW");
    pub const ORD_MANAGE: Permission = Permission::from_static("ORD.MANAGE");
    pub const ORD_STATUS: Permission = Permission::from_static("ORD.STATUS");

    /// Every permission the system knows about.
    pub const ALL: [Permission; 9] = [
        Self::USR_VIEW,
        Self::USR_MANAGE,
        Self::USR_AUDIT,
        Self::INV_VIEW,
        Self::INV_MANAGE,
        Self::INV_MOVEMENTS,
        Self::ORD_VIEW,
        Self::ORD_MANAGE,
        Self::ORD_STATUS,
    ];

    pub const fn from_static(code: &'static str) -> Self {
        Self(Cow::Borrowed(code))
    }

    pub fn new(code: impl Into<Cow<'static, str>>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this code is part of [`Permission::ALL`].
    pub fn is_known(&self) -> bool {
        Self::ALL.iter().any(|p| p == self)
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_codes_are_distinct() {
        let all = Permission::ALL;
        let mut codes: Vec<&str> = all.iter().map(Permission::as_str).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), Permission::ALL.len());
    }

    #[test]
    fn serializes_as_plain_code() {
        let json = serde_json::to_string(&Permission::ORD_STATUS).unwrap();
        assert_eq!(json, "\"ORD.STATUS\"");
        let back: Permission = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Permission::ORD_STATUS);
        assert!(back.is_known());
        assert!(!Permission::new("ORD.EXPORT").is_known());
    }
}
