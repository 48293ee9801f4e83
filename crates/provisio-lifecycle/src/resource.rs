use provisio_core::ResourceId;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::LifecycleConfig;
use crate::patch::FieldRegistry;

/// A resource type managed by a [`CrudService`](crate::service::CrudService).
pub trait Resource: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Role name the entity is bound under while an operation runs.
    const ROLE: &'static str;

    /// Resource name handed to the permission oracle.
    const RESOURCE_TYPE: &'static str;

    fn id(&self) -> ResourceId;

    fn set_id(&mut self, id: ResourceId);

    /// Declares the fields a patch may name.
    fn field_registry() -> FieldRegistry<Self>;

    /// Called once on a new entity before it is stored.
    ///
    /// Anything returned is merged into the Create result and never stored
    /// or shown again.
    fn on_create(&mut self, _config: &LifecycleConfig) -> Option<Value> {
        None
    }
}
