//! API-key (client credential) resource.
//!
//! A credential is identified to callers by its [`ClientId`] and proven by a
//! random secret. Only a digest of the pair is kept.

use chrono::{DateTime, Utc};
use provisio_core::{ClientId, ParseIdError, ResourceId};
use provisio_lifecycle::{FieldRegistry, LifecycleConfig, LifecycleError, Resource};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::{Validate, ValidationError};

use crate::secret_lookup::SecretBearing;
use crate::secrets::{decode_secret, digest_credentials, encode_secret, generate_secret};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_window"))]
pub struct ClientCredential {
    #[serde(default)]
    pub id: ResourceId,

    #[validate(length(min = 1, max = 255, message = "clientName is required"))]
    pub client_name: String,

    /// Issued on create.
    #[serde(default, skip_deserializing)]
    pub client_id: Option<ClientId>,

    #[serde(skip)]
    pub digest: String,

    #[serde(default)]
    pub not_before: Option<DateTime<Utc>>,

    #[serde(default)]
    pub expiration_time: Option<DateTime<Utc>>,
}

fn validate_window(credential: &ClientCredential) -> Result<(), ValidationError> {
    match (credential.not_before, credential.expiration_time) {
        (Some(from), Some(until)) if until <= from => {
            let mut err = ValidationError::new("window");
            err.message = Some("expirationTime must be after notBefore".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

impl Resource for ClientCredential {
    const ROLE: &'static str = "ClientCredential";
    const RESOURCE_TYPE: &'static str = "api-keys";

    fn id(&self) -> ResourceId {
        self.id
    }

    fn set_id(&mut self, id: ResourceId) {
        self.id = id;
    }

    fn field_registry() -> FieldRegistry<Self> {
        FieldRegistry::new()
            .read_only("Id")
            .read_only("ClientId")
            .read_only("Digest")
            .scalar("ClientName", |c: &mut ClientCredential| &mut c.client_name)
            .scalar("NotBefore", |c: &mut ClientCredential| &mut c.not_before)
            .scalar("ExpirationTime", |c: &mut ClientCredential| {
                &mut c.expiration_time
            })
    }

    fn on_create(&mut self, config: &LifecycleConfig) -> Option<Value> {
        let client_id = ClientId::new();
        let secret = generate_secret(config.client_secret_byte_length);
        self.digest = digest_credentials(&client_id, &secret);
        self.client_id = Some(client_id);

        Some(json!({
            "client_id": client_id,
            "client_secret": encode_secret(&secret),
        }))
    }
}

impl SecretBearing for ClientCredential {
    type Credential = String;

    fn credential(client_id: &str, client_secret: &str) -> Result<String, LifecycleError> {
        let client_id: ClientId = client_id
            .parse()
            .map_err(|e: ParseIdError| LifecycleError::InvalidInput(e.to_string()))?;
        let secret = decode_secret(client_secret).map_err(|_| {
            LifecycleError::InvalidInput("client secret is not valid base64".to_string())
        })?;
        Ok(digest_credentials(&client_id, &secret))
    }

    fn matches(&self, digest: &String) -> bool {
        !self.digest.is_empty() && self.digest == *digest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn issued() -> (ClientCredential, String, String) {
        let mut credential = ClientCredential {
            client_name: "ci".to_string(),
            ..Default::default()
        };
        let result = credential.on_create(&LifecycleConfig::default()).unwrap();
        let client_id = result["client_id"].as_str().unwrap().to_string();
        let secret = result["client_secret"].as_str().unwrap().to_string();
        (credential, client_id, secret)
    }

    #[test]
    fn test_on_create_issues_credentials() {
        let (credential, client_id, secret) = issued();

        assert_eq!(credential.client_id.unwrap().to_string(), client_id);
        assert_eq!(decode_secret(&secret).unwrap().len(), 72);
        assert_eq!(credential.digest.len(), 64);
    }

    #[test]
    fn test_digest_is_not_serialized() {
        let (credential, _, _) = issued();
        let value = serde_json::to_value(&credential).unwrap();
        assert!(value.get("digest").is_none());
        assert!(value.get("clientId").is_some());
    }

    #[test]
    fn test_credential_matches() {
        let (credential, client_id, secret) = issued();

        let good = ClientCredential::credential(&client_id, &secret).unwrap();
        assert!(credential.matches(&good));

        let other = ClientCredential::credential(&ClientId::new().to_string(), &secret).unwrap();
        assert!(!credential.matches(&other));

        assert!(ClientCredential::credential("nope", &secret).is_err());
        assert!(ClientCredential::credential(&client_id, "%%%").is_err());
    }

    #[test]
    fn test_validity_window() {
        let now = Utc::now();
        let credential = ClientCredential {
            client_name: "ci".to_string(),
            not_before: Some(now - Duration::hours(1)),
            expiration_time: Some(now + Duration::hours(1)),
            ..Default::default()
        };
        assert!(credential.validate().is_ok());

        let inverted = ClientCredential {
            not_before: credential.expiration_time,
            expiration_time: credential.not_before,
            ..credential
        };
        assert!(inverted.validate().is_err());
    }
}
