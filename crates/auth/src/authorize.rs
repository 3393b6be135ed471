use thiserror::Error;

use crate::{Permission, Principal};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: principal is inactive")]
    Inactive,

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Check that `principal` may exercise `required`.
///
/// - No IO
/// - No panics
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    if !principal.active {
        return Err(AuthzError::Inactive);
    }

    if principal.permissions.contains(required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}
