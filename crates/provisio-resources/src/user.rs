//! User resource.

use chrono::{DateTime, Utc};
use provisio_core::ResourceId;
use provisio_lifecycle::{FieldRegistry, LifecycleConfig, Resource};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidateEmail, ValidationError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: ResourceId,

    #[validate(length(min = 1, max = 255, message = "userName is required"))]
    pub user_name: String,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub given_name: Option<String>,

    #[serde(default)]
    pub family_name: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_emails"))]
    pub emails: Vec<String>,

    #[serde(default = "default_active")]
    pub active: bool,

    #[serde(default)]
    pub external_id: Option<String>,

    /// Set by the service on create.
    #[serde(default, skip_deserializing)]
    pub created: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

fn validate_emails(emails: &[String]) -> Result<(), ValidationError> {
    if emails.iter().all(|email| email.validate_email()) {
        return Ok(());
    }
    let mut err = ValidationError::new("email");
    err.message = Some("every entry must be a valid email address".into());
    Err(err)
}

impl Resource for User {
    const ROLE: &'static str = "User";
    const RESOURCE_TYPE: &'static str = "users";

    fn id(&self) -> ResourceId {
        self.id
    }

    fn set_id(&mut self, id: ResourceId) {
        self.id = id;
    }

    fn field_registry() -> FieldRegistry<Self> {
        FieldRegistry::new()
            .read_only("Id")
            .read_only("Created")
            .scalar("UserName", |u: &mut User| &mut u.user_name)
            .scalar("DisplayName", |u: &mut User| &mut u.display_name)
            .scalar("GivenName", |u: &mut User| &mut u.given_name)
            .scalar("FamilyName", |u: &mut User| &mut u.family_name)
            .list("Emails", |u: &mut User| &mut u.emails)
            .scalar("Active", |u: &mut User| &mut u.active)
            .scalar("ExternalId", |u: &mut User| &mut u.external_id)
    }

    fn on_create(&mut self, _config: &LifecycleConfig) -> Option<Value> {
        self.created = Some(Utc::now());
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_defaults() {
        let user: User = serde_json::from_value(json!({"userName": "bob"})).unwrap();
        assert_eq!(user.user_name, "bob");
        assert!(user.active);
        assert!(user.emails.is_empty());
        assert!(user.created.is_none());
    }

    #[test]
    fn test_created_is_not_client_settable() {
        let user: User = serde_json::from_value(json!({
            "userName": "bob",
            "created": "2020-01-01T00:00:00Z"
        }))
        .unwrap();
        assert!(user.created.is_none());
    }

    #[test]
    fn test_validation() {
        let mut user = User {
            user_name: "bob".to_string(),
            emails: vec!["bob@example.com".to_string()],
            ..Default::default()
        };
        assert!(user.validate().is_ok());

        user.emails.push("not-an-email".to_string());
        let errors = user.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("emails"));

        user.emails.clear();
        user.user_name.clear();
        let errors = user.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("user_name"));
    }

    #[test]
    fn test_registry_resolves_case_insensitively() {
        let registry = User::field_registry();
        assert!(registry.resolve("displayName").is_some());
        assert!(registry.resolve("/emails").is_some());
        assert!(registry.resolve("password").is_none());
    }
}
