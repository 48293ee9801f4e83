//! Shared fixtures for resource integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Once};

use provisio_authorization::{AuthorizationGate, StaticPolicyOracle};
use provisio_core::ResourceContext;

static INIT: Once = Once::new();

/// Initialize logging for tests (once).
pub fn init_test_logging() {
    INIT.call_once(|| {
        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::fmt()
                .with_test_writer()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .try_init()
                .ok();
        }
    });
}

pub const TENANT: &str = "looplex";
pub const ADMIN: &str = "bob.rivest@email.com";
pub const AUDITOR: &str = "alice.audit@email.com";

/// Admins may do anything in the tenant; auditors may only read.
pub const POLICY: &str = "
# roles
p, admin, looplex, *, *
p, auditor, looplex, *, list
p, auditor, looplex, *, get_by_id

g, bob.rivest@email.com, admin, looplex
g, alice.audit@email.com, auditor, looplex
";

pub fn gate() -> AuthorizationGate {
    let oracle: StaticPolicyOracle = POLICY.parse().unwrap();
    AuthorizationGate::new(Arc::new(oracle))
}

pub fn context() -> ResourceContext {
    context_for(ADMIN)
}

pub fn context_for(email: &str) -> ResourceContext {
    ResourceContext::new()
        .with_tenant(TENANT)
        .with_user_email(email)
}
