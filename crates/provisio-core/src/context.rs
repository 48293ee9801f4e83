//! Per-call resource context.
//!
//! A [`ResourceContext`] is created by the caller for one operation and
//! discarded afterwards. It carries:
//!
//! - [`State`]: the inputs (tenant, subject, raw identifiers and bodies) plus
//!   an extension bag for values added by phases or hooks,
//! - [`Roles`]: domain objects bound under stable role names while the
//!   pipeline runs,
//! - the single `Result` slot the operation writes its output to,
//! - the `skip_default_action` flag and a cancellation token.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// Well-known state keys.
///
/// These are the literal names reported by [`MissingValueError`].
pub mod keys {
    pub const TENANT: &str = "Tenant";
    pub const USER_EMAIL: &str = "User.Email";
    pub const ID: &str = "Id";
    pub const RESOURCE: &str = "Resource";
    pub const OPERATIONS: &str = "Operations";
    pub const PAGINATION_PAGE: &str = "Pagination.Page";
    pub const PAGINATION_PER_PAGE: &str = "Pagination.PerPage";
    pub const PAGINATION_TOTAL_COUNT: &str = "Pagination.TotalCount";
    pub const CLIENT_ID: &str = "ClientId";
    pub const CLIENT_SECRET: &str = "ClientSecret";
    /// Extension-bag key under which a patch stores its change set.
    pub const CHANGE_SET: &str = "ChangeSet";
    /// Extension-bag key under which phases stash a parsed resource id.
    pub const RESOURCE_ID: &str = "ResourceId";
}

/// A required context value was absent or had the wrong type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("The path '{key}' does not exist or has a null value")]
pub struct MissingValueError {
    pub key: String,
}

impl MissingValueError {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// Requested page of a List operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pagination {
    /// 1-based page number; `None` means the configured default (page 1).
    pub page: Option<u32>,
    /// Page size; `None` means the configured default size.
    pub per_page: Option<u32>,
    /// Total number of records, written by List.
    pub total_count: Option<usize>,
}

type AnyValue = Box<dyn Any + Send + Sync>;

/// Input values and the extension bag.
#[derive(Default)]
pub struct State {
    pub tenant: Option<String>,
    pub user_email: Option<String>,
    pub id: Option<String>,
    pub resource: Option<Value>,
    pub operations: Option<Value>,
    pub pagination: Pagination,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    extensions: HashMap<String, AnyValue>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required_tenant(&self) -> Result<&str, MissingValueError> {
        self.tenant
            .as_deref()
            .ok_or_else(|| MissingValueError::new(keys::TENANT))
    }

    pub fn required_user_email(&self) -> Result<&str, MissingValueError> {
        self.user_email
            .as_deref()
            .ok_or_else(|| MissingValueError::new(keys::USER_EMAIL))
    }

    pub fn required_id(&self) -> Result<&str, MissingValueError> {
        self.id
            .as_deref()
            .ok_or_else(|| MissingValueError::new(keys::ID))
    }

    pub fn required_resource(&self) -> Result<&Value, MissingValueError> {
        self.resource
            .as_ref()
            .ok_or_else(|| MissingValueError::new(keys::RESOURCE))
    }

    pub fn required_operations(&self) -> Result<&Value, MissingValueError> {
        self.operations
            .as_ref()
            .ok_or_else(|| MissingValueError::new(keys::OPERATIONS))
    }

    /// Returns the pagination request; both page and size must be present.
    pub fn required_pagination(&self) -> Result<(u32, u32), MissingValueError> {
        let page = self
            .pagination
            .page
            .ok_or_else(|| MissingValueError::new(keys::PAGINATION_PAGE))?;
        let per_page = self
            .pagination
            .per_page
            .ok_or_else(|| MissingValueError::new(keys::PAGINATION_PER_PAGE))?;
        Ok((page, per_page))
    }

    pub fn required_client_id(&self) -> Result<&str, MissingValueError> {
        self.client_id
            .as_deref()
            .ok_or_else(|| MissingValueError::new(keys::CLIENT_ID))
    }

    pub fn required_client_secret(&self) -> Result<&str, MissingValueError> {
        self.client_secret
            .as_deref()
            .ok_or_else(|| MissingValueError::new(keys::CLIENT_SECRET))
    }

    /// Stores a value in the extension bag, replacing any previous value.
    pub fn insert<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.extensions.insert(key.into(), Box::new(value));
    }

    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.extensions.get(key).and_then(|v| v.downcast_ref())
    }

    pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.extensions.get_mut(key).and_then(|v| v.downcast_mut())
    }

    /// Like [`State::get`], but a missing value or a value of another type
    /// is an error naming `key`.
    pub fn get_required<T: Any>(&self, key: &str) -> Result<&T, MissingValueError> {
        self.get(key).ok_or_else(|| MissingValueError::new(key))
    }

    pub fn remove<T: Any>(&mut self, key: &str) -> Option<T> {
        let value = self.extensions.remove(key)?;
        match value.downcast::<T>() {
            Ok(v) => Some(*v),
            Err(other) => {
                self.extensions.insert(key.to_string(), other);
                None
            }
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.extensions.contains_key(key)
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ext: Vec<&String> = self.extensions.keys().collect();
        ext.sort();
        f.debug_struct("State")
            .field("tenant", &self.tenant)
            .field("user_email", &self.user_email)
            .field("id", &self.id)
            .field("pagination", &self.pagination)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "***"))
            .field("extensions", &ext)
            .finish_non_exhaustive()
    }
}

/// Role name to bound domain object.
#[derive(Default)]
pub struct Roles {
    bound: HashMap<String, AnyValue>,
}

impl Roles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `value` under `name`, replacing any earlier binding.
    pub fn bind<T: Any + Send + Sync>(&mut self, name: impl Into<String>, value: T) {
        self.bound.insert(name.into(), Box::new(value));
    }

    pub fn get<T: Any>(&self, name: &str) -> Option<&T> {
        self.bound.get(name).and_then(|v| v.downcast_ref())
    }

    pub fn get_mut<T: Any>(&mut self, name: &str) -> Option<&mut T> {
        self.bound.get_mut(name).and_then(|v| v.downcast_mut())
    }

    pub fn get_required<T: Any>(&self, name: &str) -> Result<&T, MissingValueError> {
        self.get(name).ok_or_else(|| MissingValueError::new(name))
    }

    pub fn get_required_mut<T: Any>(&mut self, name: &str) -> Result<&mut T, MissingValueError> {
        self.get_mut(name).ok_or_else(|| MissingValueError::new(name))
    }

    pub fn remove<T: Any>(&mut self, name: &str) -> Option<T> {
        let value = self.bound.remove(name)?;
        match value.downcast::<T>() {
            Ok(v) => Some(*v),
            Err(other) => {
                self.bound.insert(name.to_string(), other);
                None
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bound.contains_key(name)
    }

    /// Bound role names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.bound.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for Roles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Roles").field("bound", &self.names()).finish()
    }
}

/// Everything one resource operation reads and writes.
#[derive(Debug, Default)]
pub struct ResourceContext {
    pub state: State,
    pub roles: Roles,
    /// When set, the core logic of the DefaultAction phase is skipped.
    pub skip_default_action: bool,
    result: Option<Value>,
    cancellation: CancellationToken,
}

impl ResourceContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.state.tenant = Some(tenant.into());
        self
    }

    pub fn with_user_email(mut self, email: impl Into<String>) -> Self {
        self.state.user_email = Some(email.into());
        self
    }

    pub fn with_id(mut self, id: impl ToString) -> Self {
        self.state.id = Some(id.to_string());
        self
    }

    pub fn with_resource(mut self, resource: Value) -> Self {
        self.state.resource = Some(resource);
        self
    }

    pub fn with_operations(mut self, operations: Value) -> Self {
        self.state.operations = Some(operations);
        self
    }

    pub fn with_pagination(mut self, page: u32, per_page: u32) -> Self {
        self.state.pagination.page = Some(page);
        self.state.pagination.per_page = Some(per_page);
        self
    }

    pub fn with_client_credentials(
        mut self,
        client_id: impl ToString,
        client_secret: impl Into<String>,
    ) -> Self {
        self.state.client_id = Some(client_id.to_string());
        self.state.client_secret = Some(client_secret.into());
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn set_result(&mut self, value: Value) {
        self.result = Some(value);
    }

    pub fn take_result(&mut self) -> Option<Value> {
        self.result.take()
    }

    pub fn clear_result(&mut self) {
        self.result = None;
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
