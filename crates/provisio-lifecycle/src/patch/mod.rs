//! Partial-update engine.
//!
//! A patch document is parsed into [`Operation`]s, each bound to a field of
//! the target's [`FieldRegistry`]. The resulting [`PatchPlan`] is checked
//! (non-empty, no read-only targets) before anything is applied, then
//! applied in order, yielding a [`ChangeSet`].

mod engine;
mod operation;
mod registry;

pub use engine::{ChangeSet, OperationNode, PatchEngine, PatchPlan};
pub use operation::{parse_operations, Operation, OperationKind, PATCH_OP_SCHEMA};
pub use registry::{FieldDescriptor, FieldKind, FieldRegistry};
