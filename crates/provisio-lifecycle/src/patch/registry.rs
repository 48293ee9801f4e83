//! Explicit field registries for patchable resources.
//!
//! A resource declares every patchable field once, with an accessor and
//! whether it is read-only. Paths in patch documents resolve against these
//! declarations case-insensitively.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::operation::OperationKind;

type Writer<T> =
    Box<dyn Fn(&mut T, OperationKind, Value) -> Result<bool, serde_json::Error> + Send + Sync>;

/// Shape of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar,
    List,
}

/// One declared field of `T`.
pub struct FieldDescriptor<T> {
    name: &'static str,
    kind: FieldKind,
    writer: Option<Writer<T>>,
}

impl<T> FieldDescriptor<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn is_read_only(&self) -> bool {
        self.writer.is_none()
    }

    /// Applies `op` with `value` to the field of `target`.
    ///
    /// Returns whether the field's value changed. Read-only fields are never
    /// written and report no change.
    pub fn write(
        &self,
        target: &mut T,
        op: OperationKind,
        value: Value,
    ) -> Result<bool, serde_json::Error> {
        match &self.writer {
            Some(writer) => writer(target, op, value),
            None => Ok(false),
        }
    }
}

impl<T> std::fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("read_only", &self.is_read_only())
            .finish()
    }
}

/// The declared fields of a resource type.
pub struct FieldRegistry<T> {
    fields: Vec<FieldDescriptor<T>>,
}

impl<T: 'static> Default for FieldRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> FieldRegistry<T> {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Declares a single-valued field.
    ///
    /// `add` and `replace` set the value; `remove` resets it to `V::default()`.
    pub fn scalar<V, F>(mut self, name: &'static str, field: F) -> Self
    where
        V: Serialize + DeserializeOwned + PartialEq + Default + 'static,
        F: for<'a> Fn(&'a mut T) -> &'a mut V + Send + Sync + 'static,
    {
        let writer = move |target: &mut T,
                            op: OperationKind,
                            value: Value|
              -> Result<bool, serde_json::Error> {
            let next = match op {
                OperationKind::Remove => V::default(),
                OperationKind::Add | OperationKind::Replace => serde_json::from_value(value)?,
            };
            let slot = field(target);
            if *slot == next {
                return Ok(false);
            }
            *slot = next;
            Ok(true)
        };
        self.fields.push(FieldDescriptor {
            name,
            kind: FieldKind::Scalar,
            writer: Some(Box::new(writer)),
        });
        self
    }

    /// Declares a multi-valued field.
    ///
    /// `replace` swaps the whole list; `add` appends items not already
    /// present; `remove` without a value clears the list and with a value
    /// removes the matching items. Values may be one item or an array.
    pub fn list<E, F>(mut self, name: &'static str, field: F) -> Self
    where
        E: Serialize + DeserializeOwned + PartialEq + 'static,
        F: for<'a> Fn(&'a mut T) -> &'a mut Vec<E> + Send + Sync + 'static,
    {
        let writer = move |target: &mut T,
                            op: OperationKind,
                            value: Value|
              -> Result<bool, serde_json::Error> {
            let list = field(target);
            match op {
                OperationKind::Replace => {
                    let next: Vec<E> = items_of(value)?;
                    if *list == next {
                        return Ok(false);
                    }
                    *list = next;
                    Ok(true)
                }
                OperationKind::Add => {
                    let before = list.len();
                    for item in items_of::<E>(value)? {
                        if !list.contains(&item) {
                            list.push(item);
                        }
                    }
                    Ok(list.len() != before)
                }
                OperationKind::Remove => {
                    let before = list.len();
                    if value.is_null() {
                        list.clear();
                    } else {
                        let doomed: Vec<E> = items_of(value)?;
                        list.retain(|item| !doomed.contains(item));
                    }
                    Ok(list.len() != before)
                }
            }
        };
        self.fields.push(FieldDescriptor {
            name,
            kind: FieldKind::List,
            writer: Some(Box::new(writer)),
        });
        self
    }

    /// Declares a field that patches may name but never change.
    pub fn read_only(mut self, name: &'static str) -> Self {
        self.fields.push(FieldDescriptor {
            name,
            kind: FieldKind::Scalar,
            writer: None,
        });
        self
    }
}

impl<T> FieldRegistry<T> {
    /// Finds the field named by `path`, ignoring case and a leading `/`.
    pub fn resolve(&self, path: &str) -> Option<usize> {
        let wanted = path.trim().trim_start_matches('/');
        self.fields
            .iter()
            .position(|f| f.name.eq_ignore_ascii_case(wanted))
    }

    pub fn field(&self, index: usize) -> Option<&FieldDescriptor<T>> {
        self.fields.get(index)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn items_of<E: DeserializeOwned>(value: Value) -> Result<Vec<E>, serde_json::Error> {
    match value {
        Value::Array(_) => serde_json::from_value(value),
        single => Ok(vec![serde_json::from_value(single)?]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default)]
    struct Widget {
        label: String,
        size: Option<u32>,
        tags: Vec<String>,
    }

    fn registry() -> FieldRegistry<Widget> {
        FieldRegistry::new()
            .read_only("Id")
            .scalar("Label", |w: &mut Widget| &mut w.label)
            .scalar("Size", |w: &mut Widget| &mut w.size)
            .list("Tags", |w: &mut Widget| &mut w.tags)
    }

    fn write(
        reg: &FieldRegistry<Widget>,
        w: &mut Widget,
        path: &str,
        op: OperationKind,
        v: Value,
    ) -> bool {
        let index = reg.resolve(path).unwrap();
        reg.field(index).unwrap().write(w, op, v).unwrap()
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let reg = registry();
        assert_eq!(reg.resolve("label"), Some(1));
        assert_eq!(reg.resolve("/TAGS"), Some(3));
        assert_eq!(reg.resolve("colour"), None);
        assert_eq!(reg.names().collect::<Vec<_>>(), vec!["Id", "Label", "Size", "Tags"]);
        assert!(reg.field(0).unwrap().is_read_only());
        assert_eq!(reg.field(3).unwrap().kind(), FieldKind::List);
    }

    #[test]
    fn test_scalar_reports_change() {
        let reg = registry();
        let mut w = Widget::default();
        assert!(write(&reg, &mut w, "Label", OperationKind::Replace, json!("X")));
        assert!(!write(&reg, &mut w, "Label", OperationKind::Replace, json!("X")));
        assert!(write(&reg, &mut w, "Size", OperationKind::Add, json!(3)));
        assert_eq!(w.size, Some(3));
        assert!(write(&reg, &mut w, "Size", OperationKind::Remove, Value::Null));
        assert_eq!(w.size, None);
    }

    #[test]
    fn test_scalar_coercion_failure_leaves_field() {
        let reg = registry();
        let mut w = Widget::default();
        let index = reg.resolve("Size").unwrap();
        let result = reg
            .field(index)
            .unwrap()
            .write(&mut w, OperationKind::Replace, json!("big"));
        assert!(result.is_err());
        assert_eq!(w.size, None);
    }

    #[test]
    fn test_list_operations() {
        let reg = registry();
        let mut w = Widget::default();
        assert!(write(&reg, &mut w, "Tags", OperationKind::Add, json!("a")));
        assert!(write(&reg, &mut w, "Tags", OperationKind::Add, json!(["a", "b"])));
        assert!(!write(&reg, &mut w, "Tags", OperationKind::Add, json!("b")));
        assert_eq!(w.tags, vec!["a", "b"]);

        assert!(write(&reg, &mut w, "Tags", OperationKind::Remove, json!("a")));
        assert_eq!(w.tags, vec!["b"]);

        assert!(write(&reg, &mut w, "Tags", OperationKind::Replace, json!(["c", "d"])));
        assert!(write(&reg, &mut w, "Tags", OperationKind::Remove, Value::Null));
        assert!(w.tags.is_empty());
    }

    #[test]
    fn test_read_only_field_is_never_written() {
        let reg = registry();
        let mut w = Widget::default();
        assert!(!write(&reg, &mut w, "id", OperationKind::Replace, json!("x")));
    }
}
