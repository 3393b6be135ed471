use thiserror::Error;

use orderdesk_auth::AuthzError;
use orderdesk_core::DomainError;

use crate::store::StoreError;

/// Failure of a ledger, lifecycle, catalog or back-office operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Forbidden(#[from] AuthzError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<StoreError> for ServiceError {
    /// A store-level `NotFound` (update/delete of a missing row) is the same
    /// condition as the domain `NotFound`; every other store error passes
    /// through unchanged.
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ServiceError::Domain(DomainError::NotFound(what)),
            other => ServiceError::Store(other),
        }
    }
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::Domain(e) if e.is_not_found())
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, ServiceError::Domain(e) if e.is_invalid_argument())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ServiceError::Domain(DomainError::Conflict(_)))
    }

    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, ServiceError::Domain(DomainError::InvalidTransition { .. }))
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, ServiceError::Forbidden(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_not_found_becomes_domain_not_found() {
        let err = ServiceError::from(StoreError::NotFound("order 1".to_string()));
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), DomainError::not_found("order 1").to_string());
    }

    #[test]
    fn other_store_errors_pass_through() {
        let err = ServiceError::from(StoreError::Backend("connection reset".to_string()));
        assert_eq!(err, ServiceError::Store(StoreError::Backend("connection reset".to_string())));
    }
}
