use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::operation::{parse_operations, Operation};
use super::registry::{FieldDescriptor, FieldRegistry};
use crate::error::{LifecycleError, Result};

/// Canonical names of the fields a patch actually changed, in first-change
/// order and without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChangeSet {
    fields: Vec<String>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, field: &str) {
        if !self.contains(field) {
            self.fields.push(field.to_string());
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// An [`Operation`] bound to the field it targets.
pub struct OperationNode<T> {
    operation: Operation,
    registry: Arc<FieldRegistry<T>>,
    index: usize,
}

impl<T: 'static> OperationNode<T> {
    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    fn descriptor(&self) -> Result<&FieldDescriptor<T>> {
        self.registry.field(self.index).ok_or_else(|| {
            LifecycleError::Internal(format!("field index {} out of range", self.index))
        })
    }

    /// Canonical name of the target field.
    pub fn field_name(&self) -> Result<&'static str> {
        Ok(self.descriptor()?.name())
    }

    pub fn is_read_only(&self) -> Result<bool> {
        Ok(self.descriptor()?.is_read_only())
    }

    /// Applies the operation to `target`, returning whether the field changed.
    pub fn apply(&self, target: &mut T) -> Result<bool> {
        let descriptor = self.descriptor()?;
        if descriptor.is_read_only() {
            return Err(LifecycleError::ReadOnlyField {
                field: descriptor.name().to_string(),
            });
        }
        descriptor
            .write(target, self.operation.op, self.operation.value.clone())
            .map_err(|source| LifecycleError::OperationApply {
                operation: self.operation.clone(),
                source,
            })
    }
}

impl<T> std::fmt::Debug for OperationNode<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationNode")
            .field("operation", &self.operation)
            .field("index", &self.index)
            .finish()
    }
}

/// An ordered list of bound operations for one target.
#[derive(Debug)]
pub struct PatchPlan<T> {
    nodes: Vec<OperationNode<T>>,
}

impl<T: 'static> PatchPlan<T> {
    pub fn nodes(&self) -> &[OperationNode<T>] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ensure_not_empty(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(LifecycleError::EmptyPatch);
        }
        Ok(())
    }

    /// Fails on the first operation that targets a read-only field.
    pub fn ensure_writable(&self) -> Result<()> {
        for node in &self.nodes {
            if node.is_read_only()? {
                return Err(LifecycleError::ReadOnlyField {
                    field: node.field_name()?.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Applies every operation in order.
    ///
    /// Stops at the first failure; operations before it stay applied to
    /// `target`.
    pub fn apply(&self, target: &mut T) -> Result<ChangeSet> {
        let mut changes = ChangeSet::new();
        for node in &self.nodes {
            if node.apply(target)? {
                changes.record(node.field_name()?);
            }
        }
        Ok(changes)
    }
}

/// Binds patch documents against a resource's field registry.
pub struct PatchEngine<T> {
    registry: Arc<FieldRegistry<T>>,
}

impl<T> Clone for PatchEngine<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<T: 'static> PatchEngine<T> {
    pub fn new(registry: FieldRegistry<T>) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &FieldRegistry<T> {
        &self.registry
    }

    /// Parses `document` and resolves every path.
    ///
    /// Nothing is applied; an unknown path fails the whole document.
    pub fn bind(&self, document: &Value) -> Result<PatchPlan<T>> {
        let operations = parse_operations(document)?;
        let mut nodes = Vec::with_capacity(operations.len());
        for operation in operations {
            let index = self.registry.resolve(&operation.path).ok_or_else(|| {
                LifecycleError::InvalidPatch(format!("unknown path '{}'", operation.path))
            })?;
            nodes.push(OperationNode {
                operation,
                registry: Arc::clone(&self.registry),
                index,
            });
        }
        Ok(PatchPlan { nodes })
    }

    /// Binds, checks and applies `document` to `target` in one step.
    pub fn patch(&self, target: &mut T, document: &Value) -> Result<ChangeSet> {
        let plan = self.bind(document)?;
        plan.ensure_not_empty()?;
        plan.ensure_writable()?;
        plan.apply(target)
    }
}

impl<T> std::fmt::Debug for PatchEngine<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatchEngine")
            .field("fields", &self.registry.len())
            .finish()
    }
}
