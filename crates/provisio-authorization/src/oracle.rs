use async_trait::async_trait;

use crate::error::OracleError;

/// Answers "may `subject` perform `action` on `resource` in `tenant`?".
#[async_trait]
pub trait PermissionOracle: Send + Sync {
    async fn enforce(
        &self,
        subject: &str,
        tenant: &str,
        resource: &str,
        action: &str,
    ) -> Result<bool, OracleError>;
}
