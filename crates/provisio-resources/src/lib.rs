//! Resource definitions served by the lifecycle engine.
//!
//! # Resources
//!
//! | type | role | oracle resource |
//! |---|---|---|
//! | [`User`] | `User` | `users` |
//! | [`Group`] | `Group` | `groups` |
//! | [`ClientCredential`] | `ClientCredential` | `api-keys` |
//! | [`Client`] | `Client` | `clients` |
//!
//! API keys and OAuth clients additionally support
//! [`SecretLookup::get_by_id_and_secret_or_default`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use provisio_authorization::{AuthorizationGate, StaticPolicyOracle};
//! use provisio_core::ResourceContext;
//! use provisio_lifecycle::InMemoryStore;
//! use provisio_resources::{user_service, User};
//! use serde_json::json;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let oracle: StaticPolicyOracle = "p, admin@acme.test, acme, users, *".parse()?;
//! let users = user_service(
//!     Arc::new(InMemoryStore::<User>::new()),
//!     AuthorizationGate::new(Arc::new(oracle)),
//! );
//!
//! let mut cx = ResourceContext::new()
//!     .with_tenant("acme")
//!     .with_user_email("admin@acme.test")
//!     .with_resource(json!({"userName": "alice"}));
//! users.create(&mut cx).await?;
//! # Ok(())
//! # }
//! ```

pub mod api_key;
pub mod client;
pub mod group;
pub mod secret_lookup;
pub mod secrets;
pub mod user;

use std::sync::Arc;

use provisio_authorization::AuthorizationGate;
use provisio_lifecycle::{CrudService, ResourceStore, SerdeValidator};

pub use api_key::ClientCredential;
pub use client::{Client, ClientSecret};
pub use group::Group;
pub use secret_lookup::{SecretBearing, SecretLookup};
pub use user::User;

pub type UserService = CrudService<User>;
pub type GroupService = CrudService<Group>;
pub type ApiKeyService = CrudService<ClientCredential>;
pub type ClientService = CrudService<Client>;

pub fn user_service(store: Arc<dyn ResourceStore<User>>, gate: AuthorizationGate) -> UserService {
    CrudService::new(store, Arc::new(SerdeValidator::new()), gate)
}

pub fn group_service(
    store: Arc<dyn ResourceStore<Group>>,
    gate: AuthorizationGate,
) -> GroupService {
    CrudService::new(store, Arc::new(SerdeValidator::new()), gate)
}

pub fn api_key_service(
    store: Arc<dyn ResourceStore<ClientCredential>>,
    gate: AuthorizationGate,
) -> ApiKeyService {
    CrudService::new(store, Arc::new(SerdeValidator::new()), gate)
}

pub fn client_service(
    store: Arc<dyn ResourceStore<Client>>,
    gate: AuthorizationGate,
) -> ClientService {
    CrudService::new(store, Arc::new(SerdeValidator::new()), gate)
}
