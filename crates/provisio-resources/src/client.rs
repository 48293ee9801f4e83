//! OAuth client resource.

use chrono::{DateTime, Utc};
use provisio_core::{ParseIdError, ResourceId};
use provisio_lifecycle::{FieldRegistry, LifecycleConfig, LifecycleError, Resource};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::{Validate, ValidationError};

use crate::secret_lookup::SecretBearing;
use crate::secrets::{encode_secret, generate_secret, hash_secret};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(default)]
    pub id: ResourceId,

    #[validate(length(min = 1, max = 255, message = "displayName is required"))]
    pub display_name: String,

    #[serde(default)]
    #[validate(custom(function = "validate_redirect_uris"))]
    pub redirect_uris: Vec<String>,

    #[serde(default)]
    pub grant_types: Vec<String>,

    #[serde(default = "default_active")]
    pub active: bool,

    #[serde(default)]
    pub not_before: Option<DateTime<Utc>>,

    #[serde(default)]
    pub expiration_time: Option<DateTime<Utc>>,

    /// Hex SHA-256 of the issued secret.
    #[serde(skip)]
    pub secret_hash: String,
}

fn default_active() -> bool {
    true
}

fn validate_redirect_uris(uris: &[String]) -> Result<(), ValidationError> {
    let valid = uris
        .iter()
        .all(|uri| uri.starts_with("https://") || uri.starts_with("http://"));
    if valid {
        return Ok(());
    }
    let mut err = ValidationError::new("redirect_uri");
    err.message = Some("redirect URIs must use http or https".into());
    Err(err)
}

impl Resource for Client {
    const ROLE: &'static str = "Client";
    const RESOURCE_TYPE: &'static str = "clients";

    fn id(&self) -> ResourceId {
        self.id
    }

    fn set_id(&mut self, id: ResourceId) {
        self.id = id;
    }

    fn field_registry() -> FieldRegistry<Self> {
        FieldRegistry::new()
            .read_only("Id")
            .read_only("Secret")
            .scalar("DisplayName", |c: &mut Client| &mut c.display_name)
            .list("RedirectUris", |c: &mut Client| &mut c.redirect_uris)
            .list("GrantTypes", |c: &mut Client| &mut c.grant_types)
            .scalar("Active", |c: &mut Client| &mut c.active)
            .scalar("NotBefore", |c: &mut Client| &mut c.not_before)
            .scalar("ExpirationTime", |c: &mut Client| &mut c.expiration_time)
    }

    fn on_create(&mut self, config: &LifecycleConfig) -> Option<Value> {
        let secret = encode_secret(&generate_secret(config.client_secret_byte_length));
        self.secret_hash = hash_secret(&secret);
        Some(json!({ "client_secret": secret }))
    }
}

/// Client id and secret hash presented to a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSecret {
    pub id: ResourceId,
    pub secret_hash: String,
}

impl SecretBearing for Client {
    type Credential = ClientSecret;

    fn credential(client_id: &str, client_secret: &str) -> Result<ClientSecret, LifecycleError> {
        let id: ResourceId = client_id
            .parse()
            .map_err(|e: ParseIdError| LifecycleError::InvalidInput(e.to_string()))?;
        Ok(ClientSecret {
            id,
            secret_hash: hash_secret(client_secret.trim()),
        })
    }

    fn matches(&self, credential: &ClientSecret) -> bool {
        self.id == credential.id
            && !self.secret_hash.is_empty()
            && self.secret_hash == credential.secret_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_create_issues_secret() {
        let mut client = Client {
            id: ResourceId::new(),
            display_name: "portal".to_string(),
            ..Default::default()
        };
        let issued = client.on_create(&LifecycleConfig::default()).unwrap();
        let secret = issued["client_secret"].as_str().unwrap();

        assert_eq!(client.secret_hash, hash_secret(secret));
        assert!(serde_json::to_value(&client).unwrap().get("secretHash").is_none());

        let credential = Client::credential(&client.id.to_string(), secret).unwrap();
        assert!(client.matches(&credential));
        let wrong = Client::credential(&client.id.to_string(), "guess").unwrap();
        assert!(!client.matches(&wrong));
    }

    #[test]
    fn test_redirect_uri_validation() {
        let mut client = Client {
            display_name: "portal".to_string(),
            redirect_uris: vec!["https://app.example.com/cb".to_string()],
            ..Default::default()
        };
        assert!(client.validate().is_ok());

        client.redirect_uris.push("javascript:alert(1)".to_string());
        assert!(client.validate().is_err());
    }
}
