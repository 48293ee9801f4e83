//! Group resource.

use provisio_core::ResourceId;
use provisio_lifecycle::{FieldRegistry, Resource};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(default)]
    pub id: ResourceId,

    #[validate(length(min = 1, max = 255, message = "displayName is required"))]
    pub display_name: String,

    /// Ids of member users or groups.
    #[serde(default)]
    pub members: Vec<ResourceId>,

    #[serde(default)]
    pub external_id: Option<String>,
}

impl Resource for Group {
    const ROLE: &'static str = "Group";
    const RESOURCE_TYPE: &'static str = "groups";

    fn id(&self) -> ResourceId {
        self.id
    }

    fn set_id(&mut self, id: ResourceId) {
        self.id = id;
    }

    fn field_registry() -> FieldRegistry<Self> {
        FieldRegistry::new()
            .read_only("Id")
            .scalar("DisplayName", |g: &mut Group| &mut g.display_name)
            .list("Members", |g: &mut Group| &mut g.members)
            .scalar("ExternalId", |g: &mut Group| &mut g.external_id)
    }
}
