//! Generic CRUD service over a [`Resource`] type.
//!
//! Every public operation authorizes the caller, then runs a phase strategy
//! through the [`Orchestrator`]. The strategies share state through the
//! context:
//!
//! | operation | HandleInput | ValidateInput | DefineRoles | DefaultAction |
//! |---|---|---|---|---|
//! | list | resolve pagination | | | page + total |
//! | get_by_id | parse id | load entity | bind entity | write entity |
//! | create | validate body | reject messages | bind draft | assign id, insert |
//! | patch | load, bind plan | empty + read-only checks | bind entity + plan | apply, check, save |
//! | delete | parse id | load entity | bind entity | remove |

use std::sync::Arc;

use async_trait::async_trait;
use provisio_authorization::AuthorizationGate;
use provisio_core::{keys, ParseIdError, ResourceContext, ResourceId};
use serde_json::{json, Map, Value};

use crate::config::LifecycleConfig;
use crate::error::{LifecycleError, Result};
use crate::extension::ExtensionRegistry;
use crate::id_gen::{IdGenerator, UuidGenerator};
use crate::orchestrator::Orchestrator;
use crate::patch::{PatchEngine, PatchPlan};
use crate::phase::{CrudAction, OperationPhases};
use crate::resource::Resource;
use crate::storage::ResourceStore;
use crate::validation::SchemaValidator;

const PATCH_PLAN: &str = "PatchPlan";
const DRAFT: &str = "Draft";
const VALIDATION_MESSAGES: &str = "ValidationMessages";

/// Phase strategies for every operation on `R`.
pub struct CrudService<R: Resource> {
    store: Arc<dyn ResourceStore<R>>,
    validator: Arc<dyn SchemaValidator<R>>,
    ids: Arc<dyn IdGenerator>,
    gate: AuthorizationGate,
    orchestrator: Orchestrator,
    patch: PatchEngine<R>,
    config: LifecycleConfig,
}

impl<R: Resource> CrudService<R> {
    pub fn new(
        store: Arc<dyn ResourceStore<R>>,
        validator: Arc<dyn SchemaValidator<R>>,
        gate: AuthorizationGate,
    ) -> Self {
        Self {
            store,
            validator,
            ids: Arc::new(UuidGenerator),
            gate,
            orchestrator: Orchestrator::default(),
            patch: PatchEngine::new(R::field_registry()),
            config: LifecycleConfig::default(),
        }
    }

    #[must_use]
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    #[must_use]
    pub fn with_extensions(mut self, extensions: Arc<ExtensionRegistry>) -> Self {
        self.orchestrator = Orchestrator::new(extensions);
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: LifecycleConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(&self) -> &Arc<dyn ResourceStore<R>> {
        &self.store
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    pub fn patch_engine(&self) -> &PatchEngine<R> {
        &self.patch
    }

    /// Authorizes the caller for `action`, then runs `phases`.
    ///
    /// On any error the context's Result is cleared.
    pub async fn execute(
        &self,
        action: CrudAction,
        phases: &dyn OperationPhases,
        cx: &mut ResourceContext,
    ) -> Result<()> {
        if let Err(e) = self.authorize(cx, action).await {
            cx.clear_result();
            return Err(e);
        }
        self.orchestrator
            .run(R::RESOURCE_TYPE, action, phases, cx)
            .await
    }

    pub async fn authorize(&self, cx: &ResourceContext, action: CrudAction) -> Result<()> {
        self.gate
            .enforce(cx, R::RESOURCE_TYPE, action.as_str())
            .await
            .map_err(LifecycleError::from)
    }

    pub async fn list(&self, cx: &mut ResourceContext) -> Result<()> {
        self.execute(CrudAction::List, &ListPhases { service: self }, cx)
            .await
    }

    pub async fn get_by_id(&self, cx: &mut ResourceContext) -> Result<()> {
        self.execute(CrudAction::GetById, &GetByIdPhases { service: self }, cx)
            .await
    }

    pub async fn create(&self, cx: &mut ResourceContext) -> Result<()> {
        self.execute(CrudAction::Create, &CreatePhases { service: self }, cx)
            .await
    }

    /// Full replacement is not supported; use [`CrudService::patch`].
    pub async fn update(&self, cx: &mut ResourceContext) -> Result<()> {
        let outcome = match self.authorize(cx, CrudAction::Update).await {
            Ok(()) => Err(LifecycleError::NotImplemented {
                operation: CrudAction::Update.as_str(),
            }),
            Err(e) => Err(e),
        };
        cx.clear_result();
        outcome
    }

    pub async fn patch(&self, cx: &mut ResourceContext) -> Result<()> {
        self.execute(CrudAction::Patch, &PatchPhases { service: self }, cx)
            .await
    }

    pub async fn delete(&self, cx: &mut ResourceContext) -> Result<()> {
        self.execute(CrudAction::Delete, &DeletePhases { service: self }, cx)
            .await
    }

    /// Parses the `Id` input and stashes it for later phases.
    pub fn stash_id(cx: &mut ResourceContext) -> Result<ResourceId> {
        let id: ResourceId = cx
            .state
            .required_id()?
            .parse()
            .map_err(|e: ParseIdError| LifecycleError::InvalidInput(e.to_string()))?;
        cx.state.insert(keys::RESOURCE_ID, id);
        Ok(id)
    }

    fn stashed_id(cx: &ResourceContext) -> Result<ResourceId> {
        Ok(*cx.state.get_required::<ResourceId>(keys::RESOURCE_ID)?)
    }

    /// Loads an entity, failing with `EntityNotFound`.
    pub async fn load(&self, id: &ResourceId) -> Result<R> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| LifecycleError::EntityNotFound {
                resource: R::ROLE,
                id: id.to_string(),
            })
    }

    /// Moves the entity a previous phase left in State into Roles.
    fn bind_loaded(cx: &mut ResourceContext) -> Result<()> {
        let entity = cx
            .state
            .remove::<R>(R::ROLE)
            .ok_or_else(|| provisio_core::MissingValueError::new(R::ROLE))?;
        cx.roles.bind(R::ROLE, entity);
        Ok(())
    }

    /// Draws identifiers until one is not in use.
    async fn unique_id(&self) -> Result<ResourceId> {
        for _ in 0..self.config.id_generation_attempts {
            let id = self.ids.generate();
            if !self.store.contains(&id).await? {
                return Ok(id);
            }
            tracing::debug!(target: "lifecycle", id = %id, "Generated id already in use");
        }
        Err(LifecycleError::Internal(format!(
            "no unique identifier after {} attempts",
            self.config.id_generation_attempts
        )))
    }

    fn resolve_pagination(&self, cx: &mut ResourceContext) -> Result<(u32, u32)> {
        let page = cx.state.pagination.page.unwrap_or(1);
        let per_page = cx
            .state
            .pagination
            .per_page
            .unwrap_or(self.config.default_page_size);

        if page < 1 {
            return Err(LifecycleError::InvalidInput(
                "page must be at least 1".to_string(),
            ));
        }
        if per_page < 1 || per_page > self.config.max_page_size {
            return Err(LifecycleError::InvalidInput(format!(
                "perPage must be between 1 and {}",
                self.config.max_page_size
            )));
        }

        cx.state.pagination.page = Some(page);
        cx.state.pagination.per_page = Some(per_page);
        Ok((page, per_page))
    }
}

impl<R: Resource> std::fmt::Debug for CrudService<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrudService")
            .field("resource", &R::ROLE)
            .field("orchestrator", &self.orchestrator)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

struct ListPhases<'s, R: Resource> {
    service: &'s CrudService<R>,
}

#[async_trait]
impl<'s, R: Resource> OperationPhases for ListPhases<'s, R> {
    async fn handle_input(&self, cx: &mut ResourceContext) -> Result<()> {
        self.service.resolve_pagination(cx).map(|_| ())
    }

    async fn default_action(&self, cx: &mut ResourceContext) -> Result<()> {
        let (page, per_page) = cx.state.required_pagination()?;
        let offset = (page as usize - 1) * per_page as usize;
        let (records, total) = self
            .service
            .store
            .list(offset, per_page as usize)
            .await?;

        cx.state.pagination.total_count = Some(total);
        cx.set_result(json!({
            "records": serde_json::to_value(records)?,
            "page": page,
            "perPage": per_page,
            "totalCount": total,
        }));
        Ok(())
    }
}

struct GetByIdPhases<'s, R: Resource> {
    service: &'s CrudService<R>,
}

#[async_trait]
impl<'s, R: Resource> OperationPhases for GetByIdPhases<'s, R> {
    async fn handle_input(&self, cx: &mut ResourceContext) -> Result<()> {
        CrudService::<R>::stash_id(cx).map(|_| ())
    }

    async fn validate_input(&self, cx: &mut ResourceContext) -> Result<()> {
        let id = CrudService::<R>::stashed_id(cx)?;
        let entity = self.service.load(&id).await?;
        cx.state.insert(R::ROLE, entity);
        Ok(())
    }

    async fn define_roles(&self, cx: &mut ResourceContext) -> Result<()> {
        CrudService::<R>::bind_loaded(cx)
    }

    async fn default_action(&self, cx: &mut ResourceContext) -> Result<()> {
        let value = serde_json::to_value(cx.roles.get_required::<R>(R::ROLE)?)?;
        cx.set_result(value);
        Ok(())
    }
}

struct CreatePhases<'s, R: Resource> {
    service: &'s CrudService<R>,
}

#[async_trait]
impl<'s, R: Resource> OperationPhases for CreatePhases<'s, R> {
    async fn handle_input(&self, cx: &mut ResourceContext) -> Result<()> {
        let raw = cx.state.required_resource()?.clone();
        let (draft, messages) = self.service.validator.validate(&raw).await;
        if let Some(draft) = draft {
            cx.state.insert(DRAFT, draft);
        }
        cx.state.insert(VALIDATION_MESSAGES, messages);
        Ok(())
    }

    async fn validate_input(&self, cx: &mut ResourceContext) -> Result<()> {
        let messages = cx
            .state
            .remove::<Vec<String>>(VALIDATION_MESSAGES)
            .unwrap_or_default();
        if !messages.is_empty() {
            return Err(LifecycleError::EntityInvalid(messages));
        }
        cx.state.get_required::<R>(DRAFT)?;
        Ok(())
    }

    async fn define_roles(&self, cx: &mut ResourceContext) -> Result<()> {
        let draft = cx
            .state
            .remove::<R>(DRAFT)
            .ok_or_else(|| provisio_core::MissingValueError::new(DRAFT))?;
        cx.roles.bind(R::ROLE, draft);
        Ok(())
    }

    async fn default_action(&self, cx: &mut ResourceContext) -> Result<()> {
        let service = self.service;
        let id = service.unique_id().await?;

        let entity = cx.roles.get_required_mut::<R>(R::ROLE)?;
        entity.set_id(id);
        let issued = entity.on_create(&service.config);
        let stored = entity.clone();

        service.store.insert(stored).await?;
        tracing::info!(target: "lifecycle", resource = R::ROLE, id = %id, "Created");

        let mut result = Map::new();
        result.insert("id".to_string(), json!(id));
        if let Some(Value::Object(extra)) = issued {
            result.extend(extra);
        }
        cx.set_result(Value::Object(result));
        Ok(())
    }
}

struct PatchPhases<'s, R: Resource> {
    service: &'s CrudService<R>,
}

#[async_trait]
impl<'s, R: Resource> OperationPhases for PatchPhases<'s, R> {
    async fn handle_input(&self, cx: &mut ResourceContext) -> Result<()> {
        let id = CrudService::<R>::stash_id(cx)?;
        let entity = self.service.load(&id).await?;
        let plan = self.service.patch.bind(cx.state.required_operations()?)?;
        cx.state.insert(R::ROLE, entity);
        cx.state.insert(PATCH_PLAN, plan);
        Ok(())
    }

    async fn validate_input(&self, cx: &mut ResourceContext) -> Result<()> {
        let plan = cx.state.get_required::<PatchPlan<R>>(PATCH_PLAN)?;
        plan.ensure_not_empty()?;
        plan.ensure_writable()
    }

    async fn define_roles(&self, cx: &mut ResourceContext) -> Result<()> {
        CrudService::<R>::bind_loaded(cx)?;
        let plan = cx
            .state
            .remove::<PatchPlan<R>>(PATCH_PLAN)
            .ok_or_else(|| provisio_core::MissingValueError::new(PATCH_PLAN))?;
        cx.roles.bind(keys::OPERATIONS, plan);
        Ok(())
    }

    async fn default_action(&self, cx: &mut ResourceContext) -> Result<()> {
        let plan = cx
            .roles
            .remove::<PatchPlan<R>>(keys::OPERATIONS)
            .ok_or_else(|| provisio_core::MissingValueError::new(keys::OPERATIONS))?;

        let (outcome, working_copy) = {
            let entity = cx.roles.get_required_mut::<R>(R::ROLE)?;
            let outcome = plan.apply(entity);
            (outcome, entity.clone())
        };
        cx.roles.bind(keys::OPERATIONS, plan);
        let changes = outcome?;

        let id = working_copy.id();
        if !changes.is_empty() {
            let messages = self.service.validator.check(&working_copy).await;
            if !messages.is_empty() {
                tracing::debug!(
                    target: "lifecycle",
                    resource = R::ROLE,
                    id = %id,
                    messages = ?messages,
                    "Patched entity failed validation"
                );
                return Err(LifecycleError::EntityInvalid(messages));
            }
        }
        if !changes.is_empty() && !self.service.store.update(working_copy).await? {
            return Err(LifecycleError::EntityNotFound {
                resource: R::ROLE,
                id: id.to_string(),
            });
        }
        tracing::info!(
            target: "lifecycle",
            resource = R::ROLE,
            id = %id,
            changed = ?changes.fields(),
            "Patched"
        );

        cx.set_result(json!({ "id": id, "changed": changes }));
        cx.state.insert(keys::CHANGE_SET, changes);
        Ok(())
    }
}

struct DeletePhases<'s, R: Resource> {
    service: &'s CrudService<R>,
}

#[async_trait]
impl<'s, R: Resource> OperationPhases for DeletePhases<'s, R> {
    async fn handle_input(&self, cx: &mut ResourceContext) -> Result<()> {
        CrudService::<R>::stash_id(cx).map(|_| ())
    }

    async fn validate_input(&self, cx: &mut ResourceContext) -> Result<()> {
        let id = CrudService::<R>::stashed_id(cx)?;
        let entity = self.service.load(&id).await?;
        cx.state.insert(R::ROLE, entity);
        Ok(())
    }

    async fn define_roles(&self, cx: &mut ResourceContext) -> Result<()> {
        CrudService::<R>::bind_loaded(cx)
    }

    async fn default_action(&self, cx: &mut ResourceContext) -> Result<()> {
        let id = CrudService::<R>::stashed_id(cx)?;
        if self.service.store.remove(&id).await?.is_none() {
            return Err(LifecycleError::EntityNotFound {
                resource: R::ROLE,
                id: id.to_string(),
            });
        }
        tracing::info!(target: "lifecycle", resource = R::ROLE, id = %id, "Deleted");
        Ok(())
    }
}
