//! provisio Core Library
//!
//! Shared types for the resource-lifecycle engine.
//!
//! # Modules
//!
//! - [`ids`] - Strongly typed identifiers (ResourceId, ClientId)
//! - [`context`] - The per-call [`ResourceContext`] with its state and role bags
//!
//! # Example
//!
//! ```
//! use provisio_core::{keys, ResourceContext, ResourceId};
//!
//! let mut cx = ResourceContext::new()
//!     .with_tenant("acme")
//!     .with_user_email("admin@acme.test");
//!
//! cx.state.insert(keys::RESOURCE_ID, ResourceId::new());
//! assert!(cx.state.get_required::<ResourceId>(keys::RESOURCE_ID).is_ok());
//! ```

pub mod context;
pub mod ids;

pub use context::{keys, MissingValueError, Pagination, ResourceContext, Roles, State};
pub use ids::{ClientId, ParseIdError, ResourceId};
