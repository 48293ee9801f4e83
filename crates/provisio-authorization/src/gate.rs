//! The authorization gate evaluated before a resource operation starts.

use std::sync::Arc;

use provisio_core::ResourceContext;

use crate::error::{AuthorizationError, Result};
use crate::oracle::PermissionOracle;

/// Checks a context's subject against a [`PermissionOracle`].
#[derive(Clone)]
pub struct AuthorizationGate {
    oracle: Arc<dyn PermissionOracle>,
}

impl AuthorizationGate {
    pub fn new(oracle: Arc<dyn PermissionOracle>) -> Self {
        Self { oracle }
    }

    /// Asks the oracle for a decision.
    ///
    /// Inputs are checked in order tenant, email, resource, action; the
    /// first empty one is reported.
    pub async fn check_access(
        &self,
        tenant: &str,
        user_email: &str,
        resource: &str,
        action: &str,
    ) -> Result<bool> {
        if tenant.trim().is_empty() {
            return Err(AuthorizationError::tenant_required());
        }
        if user_email.trim().is_empty() {
            return Err(AuthorizationError::user_email_required());
        }
        if resource.trim().is_empty() {
            return Err(AuthorizationError::resource_required());
        }
        if action.trim().is_empty() {
            return Err(AuthorizationError::action_required());
        }

        match self
            .oracle
            .enforce(user_email, tenant, resource, action)
            .await
        {
            Ok(allowed) => {
                tracing::debug!(
                    target: "authorization",
                    subject = %user_email,
                    tenant = %tenant,
                    resource = %resource,
                    action = %action,
                    allowed,
                    "Authorization decision"
                );
                Ok(allowed)
            }
            Err(e) => {
                tracing::error!(
                    target: "authorization",
                    error = %e,
                    subject = %user_email,
                    tenant = %tenant,
                    resource = %resource,
                    action = %action,
                    "Permission oracle failed"
                );
                Err(e.into())
            }
        }
    }

    /// Authorizes the context's subject for `action` on `resource`.
    ///
    /// `User.Email` is read before `Tenant`, so a context missing both
    /// reports the email.
    pub async fn enforce(
        &self,
        cx: &ResourceContext,
        resource: &str,
        action: &str,
    ) -> Result<()> {
        if cx.is_cancelled() {
            return Err(AuthorizationError::Cancelled);
        }

        let user_email = cx.state.required_user_email()?;
        let tenant = cx.state.required_tenant()?;

        if self
            .check_access(tenant, user_email, resource, action)
            .await?
        {
            Ok(())
        } else {
            tracing::warn!(
                target: "authorization",
                subject = %user_email,
                tenant = %tenant,
                resource = %resource,
                action = %action,
                "Access denied"
            );
            Err(AuthorizationError::AccessDenied)
        }
    }
}

impl std::fmt::Debug for AuthorizationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationGate").finish_non_exhaustive()
    }
}
