//! Lookup of a secret-bearing resource by client id and secret.
//!
//! Unlike `get_by_id`, a miss is not an error: the role stays unbound and
//! the Result stays empty, so callers can treat it as "no such credential"
//! without learning which half of the pair was wrong.

use async_trait::async_trait;
use provisio_core::ResourceContext;
use provisio_lifecycle::{CrudAction, CrudService, LifecycleError, OperationPhases, Resource};

/// A resource that can be matched against presented credentials.
pub trait SecretBearing: Resource {
    /// Comparable form of the presented credentials.
    type Credential: Send + Sync + 'static;

    /// Derives the comparable form; malformed input is `InvalidInput`.
    fn credential(client_id: &str, client_secret: &str)
        -> Result<Self::Credential, LifecycleError>;

    fn matches(&self, credential: &Self::Credential) -> bool;
}

#[async_trait]
pub trait SecretLookup {
    /// Binds and returns the entity matching `ClientId`/`ClientSecret` in
    /// State, or leaves the context untouched when nothing matches.
    async fn get_by_id_and_secret_or_default(
        &self,
        cx: &mut ResourceContext,
    ) -> Result<(), LifecycleError>;
}

#[async_trait]
impl<R: SecretBearing> SecretLookup for CrudService<R> {
    async fn get_by_id_and_secret_or_default(
        &self,
        cx: &mut ResourceContext,
    ) -> Result<(), LifecycleError> {
        self.execute(
            CrudAction::GetByIdAndSecret,
            &LookupPhases { service: self },
            cx,
        )
        .await
    }
}

struct LookupPhases<'s, R: SecretBearing> {
    service: &'s CrudService<R>,
}

#[async_trait]
impl<'s, R: SecretBearing> OperationPhases for LookupPhases<'s, R> {
    async fn handle_input(&self, cx: &mut ResourceContext) -> Result<(), LifecycleError> {
        let credential = R::credential(
            cx.state.required_client_id()?,
            cx.state.required_client_secret()?,
        )?;

        let found = self
            .service
            .store()
            .find_first(&|entity: &R| entity.matches(&credential))
            .await?;

        match found {
            Some(entity) => {
                tracing::debug!(
                    target: "lifecycle",
                    resource = R::ROLE,
                    id = %entity.id(),
                    "Credential matched"
                );
                cx.state.insert(R::ROLE, entity);
            }
            None => {
                tracing::debug!(target: "lifecycle", resource = R::ROLE, "No credential matched");
            }
        }
        Ok(())
    }

    async fn define_roles(&self, cx: &mut ResourceContext) -> Result<(), LifecycleError> {
        if let Some(entity) = cx.state.remove::<R>(R::ROLE) {
            cx.roles.bind(R::ROLE, entity);
        }
        Ok(())
    }

    async fn default_action(&self, cx: &mut ResourceContext) -> Result<(), LifecycleError> {
        let value = match cx.roles.get::<R>(R::ROLE) {
            Some(entity) => serde_json::to_value(entity)?,
            None => return Ok(()),
        };
        cx.set_result(value);
        Ok(())
    }
}
