//! Diff computation between desired and last-known attributes

use std::collections::BTreeMap;
use std::fmt;

use crate::schema::{AttributeDescriptor, ResourceSchema};
use crate::types::{ResourceSpec, Value};

const REDACTED: &str = "(sensitive value)";

/// One attribute that differs between desired and last-known state
#[derive(Clone, PartialEq)]
pub struct FieldChange {
    /// Local attribute name
    pub attribute: String,
    /// Remote field name
    pub remote_name: String,
    /// Last-known value, `None` if the remote never reported one
    pub before: Option<Value>,
    /// Desired value
    pub after: Value,
    pub sensitive: bool,
    /// The change requires replacing the resource
    pub force_new: bool,
}

impl FieldChange {
    fn render(&self, value: Option<&Value>) -> String {
        match value {
            _ if self.sensitive => REDACTED.to_string(),
            Some(v) => v.to_string(),
            None => "(none)".to_string(),
        }
    }
}

impl fmt::Debug for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldChange")
            .field("attribute", &self.attribute)
            .field("remote_name", &self.remote_name)
            .field("before", &self.render(self.before.as_ref()))
            .field("after", &self.render(Some(&self.after)))
            .field("force_new", &self.force_new)
            .finish()
    }
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {}",
            self.attribute,
            self.render(self.before.as_ref()),
            self.render(Some(&self.after))
        )?;
        if self.force_new {
            write!(f, " (forces replacement)")?;
        }
        Ok(())
    }
}

/// Result of comparing desired against last-known attributes
#[derive(Clone, Default, PartialEq)]
pub struct SpecDiff {
    /// Fields for a partial update, keyed by remote name.
    /// Always empty when `force_replace` is set.
    pub changed: BTreeMap<String, serde_json::Value>,
    /// A force-replace attribute differs
    pub force_replace: bool,
    /// Local names of the force-replace attributes that differ
    pub replace_fields: Vec<String>,
    /// Every differing attribute, mutable or not
    pub changes: Vec<FieldChange>,
}

impl SpecDiff {
    /// No changes at all
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    fn is_sensitive_remote(&self, remote_name: &str) -> bool {
        self.changes
            .iter()
            .any(|c| c.sensitive && c.remote_name == remote_name)
    }
}

impl fmt::Debug for SpecDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let changed: BTreeMap<&str, String> = self
            .changed
            .iter()
            .map(|(k, v)| {
                let shown = if self.is_sensitive_remote(k) {
                    REDACTED.to_string()
                } else {
                    v.to_string()
                };
                (k.as_str(), shown)
            })
            .collect();
        f.debug_struct("SpecDiff")
            .field("changed", &changed)
            .field("force_replace", &self.force_replace)
            .field("replace_fields", &self.replace_fields)
            .field("changes", &self.changes)
            .finish()
    }
}

impl fmt::Display for SpecDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "no changes");
        }
        for (i, change) in self.changes.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{change}")?;
        }
        Ok(())
    }
}

/// Desired value after normalization, `None` when the attribute is unmanaged
fn normalized_desired(attr: &AttributeDescriptor, desired: &ResourceSpec) -> Option<Value> {
    if let Some(value) = desired.get(&attr.name) {
        return Some(value.clone());
    }
    if attr.sensitive {
        return None;
    }
    attr.default
        .clone()
        .or_else(|| attr.attr_type.empty_value())
}

fn normalized_known(attr: &AttributeDescriptor, last_known: &ResourceSpec) -> Option<Value> {
    last_known
        .get(&attr.name)
        .cloned()
        .or_else(|| attr.attr_type.empty_value())
}

/// Compute the minimal update between desired and last-known attributes
///
/// Only settable attributes are compared. Missing optional attributes take
/// their default; missing lists and maps compare as empty; missing scalars
/// without a default are left unmanaged. Sensitive attributes are compared
/// only when declared.
pub fn diff(schema: &ResourceSchema, desired: &ResourceSpec, last_known: &ResourceSpec) -> SpecDiff {
    let mut result = SpecDiff::default();

    for attr in schema.settable() {
        let Some(after) = normalized_desired(attr, desired) else {
            continue;
        };
        let before = normalized_known(attr, last_known);
        if before.as_ref() == Some(&after) {
            continue;
        }

        if attr.force_new {
            result.force_replace = true;
            result.replace_fields.push(attr.name.clone());
        } else {
            result
                .changed
                .insert(attr.remote_name.clone(), after.to_json());
        }
        result.changes.push(FieldChange {
            attribute: attr.name.clone(),
            remote_name: attr.remote_name.clone(),
            before,
            after,
            sensitive: attr.sensitive,
            force_new: attr.force_new,
        });
    }

    if result.force_replace {
        result.changed.clear();
    }
    result
}
