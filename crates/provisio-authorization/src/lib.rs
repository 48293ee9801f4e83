//! Authorization for resource operations.
//!
//! An [`AuthorizationGate`] runs once before any pipeline work. It reads the
//! subject and tenant from the [`provisio_core::ResourceContext`] and asks a
//! [`PermissionOracle`] whether `(subject, tenant, resource, action)` is
//! allowed.
//!
//! [`StaticPolicyOracle`] is an in-process oracle over RBAC-with-domains
//! policy text.

pub mod error;
pub mod gate;
pub mod oracle;
pub mod policy;

pub use error::{AuthorizationError, OracleError, PolicyParseError};
pub use gate::AuthorizationGate;
pub use oracle::PermissionOracle;
pub use policy::StaticPolicyOracle;
