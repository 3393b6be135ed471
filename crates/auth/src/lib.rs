//! `orderdesk-auth`: permission catalog and role-based authorization.
//!
//! Pure policy checks only. Identity comes from the caller; no login, sessions
//! or password handling live here.

pub mod authorize;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, authorize};
pub use permissions::Permission;
pub use principal::Principal;
pub use roles::Role;
