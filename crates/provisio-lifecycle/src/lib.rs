//! Resource lifecycle engine.
//!
//! Every resource operation runs through the same eight phases (see
//! [`Phase`]), driven by the [`Orchestrator`]. A [`CrudService`] supplies the
//! phase logic for List, GetById, Create, Patch and Delete over any
//! [`Resource`], using:
//!
//! - an [`AuthorizationGate`](provisio_authorization::AuthorizationGate)
//!   checked before any phase runs,
//! - a [`ResourceStore`] for persistence,
//! - a [`SchemaValidator`] for Create bodies,
//! - the [`patch`] engine for partial updates,
//! - [`Extension`] hooks registered per phase.

pub mod config;
pub mod error;
pub mod extension;
pub mod id_gen;
pub mod orchestrator;
pub mod patch;
pub mod phase;
pub mod resource;
pub mod service;
pub mod storage;
pub mod validation;

pub use config::{ConfigError, LifecycleConfig};
pub use error::{LifecycleError, Result, StorageError};
pub use extension::{Extension, ExtensionRegistry, HookTiming};
pub use id_gen::{IdGenerator, UuidGenerator};
pub use orchestrator::Orchestrator;
pub use patch::{ChangeSet, FieldRegistry, Operation, OperationKind, PatchEngine, PatchPlan};
pub use phase::{CrudAction, OperationPhases, Phase};
pub use resource::Resource;
pub use service::CrudService;
pub use storage::{InMemoryStore, ResourceStore};
pub use validation::{SchemaValidator, SerdeValidator};
