//! Shared fixtures for lifecycle integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use provisio_authorization::{AuthorizationGate, OracleError, PermissionOracle};
use provisio_core::{ResourceContext, ResourceId};
use provisio_lifecycle::{
    CrudService, Extension, ExtensionRegistry, FieldRegistry, InMemoryStore, LifecycleError,
    Phase, Resource, SerdeValidator,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

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

/// Minimal resource used to exercise the generic service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(default)]
    pub id: ResourceId,
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Resource for Note {
    const ROLE: &'static str = "Note";
    const RESOURCE_TYPE: &'static str = "notes";

    fn id(&self) -> ResourceId {
        self.id
    }

    fn set_id(&mut self, id: ResourceId) {
        self.id = id;
    }

    fn field_registry() -> FieldRegistry<Self> {
        FieldRegistry::new()
            .read_only("Id")
            .scalar("Title", |n: &mut Note| &mut n.title)
            .scalar("Body", |n: &mut Note| &mut n.body)
            .list("Tags", |n: &mut Note| &mut n.tags)
    }
}

pub fn note(title: &str) -> Note {
    Note {
        id: ResourceId::new(),
        title: title.to_string(),
        ..Default::default()
    }
}

/// Oracle that allows everything.
pub struct AllowAll;

#[async_trait]
impl PermissionOracle for AllowAll {
    async fn enforce(&self, _: &str, _: &str, _: &str, _: &str) -> Result<bool, OracleError> {
        Ok(true)
    }
}

/// Oracle that denies everything.
pub struct DenyAll;

#[async_trait]
impl PermissionOracle for DenyAll {
    async fn enforce(&self, _: &str, _: &str, _: &str, _: &str) -> Result<bool, OracleError> {
        Ok(false)
    }
}

pub fn allow_all() -> AuthorizationGate {
    AuthorizationGate::new(Arc::new(AllowAll))
}

pub fn note_service(store: Arc<InMemoryStore<Note>>) -> CrudService<Note> {
    CrudService::new(store, Arc::new(SerdeValidator::new()), allow_all())
}

pub fn context() -> ResourceContext {
    ResourceContext::new()
        .with_tenant("looplex")
        .with_user_email("bob.rivest@email.com")
}

/// Shared, ordered log of phase and hook executions.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|e| *e == entry).count()
    }
}

/// Extension that records every execution and can fail on a chosen phase.
pub struct Recorder {
    pub name: &'static str,
    pub journal: Journal,
    pub fail_on: Option<Phase>,
}

impl Recorder {
    pub fn new(name: &'static str, journal: Journal) -> Self {
        Self {
            name,
            journal,
            fail_on: None,
        }
    }

    pub fn failing_on(mut self, phase: Phase) -> Self {
        self.fail_on = Some(phase);
        self
    }
}

#[async_trait]
impl Extension for Recorder {
    fn name(&self) -> &str {
        self.name
    }

    async fn execute(&self, phase: Phase, _cx: &mut ResourceContext) -> Result<(), LifecycleError> {
        self.journal.push(format!("{}:{}", self.name, phase));
        if self.fail_on == Some(phase) {
            return Err(LifecycleError::Internal(format!("{} failed", self.name)));
        }
        Ok(())
    }
}

/// Registers `recorder` after every phase.
pub fn record_everywhere(recorder: Recorder) -> Arc<ExtensionRegistry> {
    let recorder = Arc::new(recorder);
    let mut registry = ExtensionRegistry::new();
    for phase in Phase::ALL {
        registry.register(phase, recorder.clone());
    }
    Arc::new(registry)
}
