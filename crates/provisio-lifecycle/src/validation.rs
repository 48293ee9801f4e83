//! Schema validation of raw resource bodies.

use std::marker::PhantomData;

use async_trait::async_trait;
use serde_json::Value;
use validator::Validate;

use crate::resource::Resource;

/// Turns a raw JSON body into a draft entity.
#[async_trait]
pub trait SchemaValidator<R>: Send + Sync {
    /// Returns the draft (when it could be built) and every validation
    /// message. An empty message list means the draft is valid.
    async fn validate(&self, raw: &Value) -> (Option<R>, Vec<String>);

    /// Re-checks an existing entity, e.g. after a patch. Same message
    /// format as [`SchemaValidator::validate`].
    async fn check(&self, entity: &R) -> Vec<String>;
}

/// Deserializes with serde, then applies the type's `validator` rules.
///
/// Messages read `"<field>: <message>"` and are sorted.
pub struct SerdeValidator<R> {
    _resource: PhantomData<fn() -> R>,
}

impl<R> SerdeValidator<R> {
    pub fn new() -> Self {
        Self {
            _resource: PhantomData,
        }
    }
}

impl<R> Default for SerdeValidator<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> std::fmt::Debug for SerdeValidator<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerdeValidator").finish()
    }
}

/// Flattens `validator` errors into sorted `"<field>: <message>"` strings.
fn messages_of(entity: &impl Validate) -> Vec<String> {
    let Err(errors) = entity.validate() else {
        return Vec::new();
    };
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(std::string::ToString::to_string)
                    .unwrap_or_else(|| e.code.to_string());
                format!("{field}: {message}")
            })
        })
        .collect();
    messages.sort();
    messages
}

#[async_trait]
impl<R> SchemaValidator<R> for SerdeValidator<R>
where
    R: Resource + Validate,
{
    async fn validate(&self, raw: &Value) -> (Option<R>, Vec<String>) {
        let draft: R = match serde_json::from_value(raw.clone()) {
            Ok(draft) => draft,
            Err(e) => return (None, vec![e.to_string()]),
        };
        let messages = messages_of(&draft);
        (Some(draft), messages)
    }

    async fn check(&self, entity: &R) -> Vec<String> {
        messages_of(entity)
    }
}
