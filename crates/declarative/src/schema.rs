//! Attribute schema for resource kinds
//!
//! A [`ResourceSchema`] describes one resource kind: where it lives on the
//! control plane, which attributes it has, and how its status field is read.
//! Every reconciler operation is driven by this table instead of per-kind code.

use crate::error::{Error, Result};
use crate::translate::snake_to_camel;
use crate::types::{AttrType, ResourceSpec, Status, Value};

/// How an attribute is supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Must be declared by the caller
    Required,
    /// May be declared; falls back to the default if one exists
    Optional,
    /// Assigned by the control plane, read-only to the caller
    Computed,
}

/// Validation rule for a declared value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Inclusive integer range
    IntRange { min: i64, max: i64 },
    /// String must be one of the listed values
    OneOf(Vec<&'static str>),
    /// String or list must not be empty
    NonEmpty,
}

impl Rule {
    /// Check a value, returning a description of the violation
    pub fn check(&self, value: &Value) -> std::result::Result<(), String> {
        match (self, value) {
            (Rule::IntRange { min, max }, Value::Int(n)) => {
                if n < min || n > max {
                    return Err(format!("must be between {min} and {max}, got {n}"));
                }
            }
            (Rule::OneOf(allowed), Value::String(s)) => {
                if !allowed.contains(&s.as_str()) {
                    return Err(format!("must be one of {}, got {s:?}", allowed.join(", ")));
                }
            }
            (Rule::NonEmpty, Value::String(s)) if s.trim().is_empty() => {
                return Err("must not be empty".to_string());
            }
            (Rule::NonEmpty, Value::List(items)) if items.is_empty() => {
                return Err("must not be empty".to_string());
            }
            _ => {}
        }
        Ok(())
    }
}

/// Description of a single attribute
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDescriptor {
    /// Local (snake_case) name
    pub name: String,
    /// Remote (camelCase) field name
    pub remote_name: String,
    pub attr_type: AttrType,
    pub presence: Presence,
    pub default: Option<Value>,
    pub rule: Option<Rule>,
    /// Never logged or rendered by value
    pub sensitive: bool,
    /// A change requires destroy-and-recreate
    pub force_new: bool,
    pub description: String,
}

impl AttributeDescriptor {
    fn new(name: &str, attr_type: AttrType, presence: Presence) -> Self {
        Self {
            name: name.to_string(),
            remote_name: snake_to_camel(name),
            attr_type,
            presence,
            default: None,
            rule: None,
            sensitive: false,
            force_new: false,
            description: String::new(),
        }
    }

    pub fn required(name: &str, attr_type: AttrType) -> Self {
        Self::new(name, attr_type, Presence::Required)
    }

    pub fn optional(name: &str, attr_type: AttrType) -> Self {
        Self::new(name, attr_type, Presence::Optional)
    }

    pub fn computed(name: &str, attr_type: AttrType) -> Self {
        Self::new(name, attr_type, Presence::Computed)
    }

    /// Override the derived remote field name
    pub fn remote(mut self, remote_name: &str) -> Self {
        self.remote_name = remote_name.to_string();
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rule = Some(rule);
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn is_computed(&self) -> bool {
        self.presence == Presence::Computed
    }

    pub fn is_required(&self) -> bool {
        self.presence == Presence::Required
    }

    /// Settable and changeable without replacement
    pub fn is_mutable(&self) -> bool {
        !self.is_computed() && !self.force_new
    }
}

/// How the status field of a remote payload is classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRules {
    /// Remote field holding the status
    pub field: String,
    pub ready: Vec<String>,
    pub failed: Vec<String>,
    pub deleting: Vec<String>,
}

impl Default for StatusRules {
    fn default() -> Self {
        Self {
            field: "status".to_string(),
            ready: vec!["READY".to_string()],
            failed: vec!["ERROR".to_string(), "FAILED".to_string()],
            deleting: vec!["DELETING".to_string()],
        }
    }
}

impl StatusRules {
    /// Classify a raw status string (case-insensitive)
    pub fn classify(&self, raw: Option<&str>) -> Status {
        let Some(raw) = raw else {
            return Status::Unknown;
        };
        let matches = |values: &[String]| values.iter().any(|v| v.eq_ignore_ascii_case(raw));
        if matches(&self.ready) {
            Status::Ready
        } else if matches(&self.failed) {
            Status::Failed
        } else if matches(&self.deleting) {
            Status::Deleting
        } else {
            Status::Pending
        }
    }
}

/// Schema of one resource kind
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSchema {
    /// Kind identifier, e.g. "nomad_cluster"
    pub kind: String,
    pub description: String,
    /// Collection path on the control plane, e.g. "/cloud/project/nomad/cluster"
    pub collection: String,
    pub attributes: Vec<AttributeDescriptor>,
    pub status: StatusRules,
}

impl ResourceSchema {
    pub fn new(kind: &str, collection: &str) -> Self {
        Self {
            kind: kind.to_string(),
            description: String::new(),
            collection: collection.trim_end_matches('/').to_string(),
            attributes: Vec::new(),
            status: StatusRules::default(),
        }
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn attribute(mut self, attribute: AttributeDescriptor) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn status_rules(mut self, rules: StatusRules) -> Self {
        self.status = rules;
        self
    }

    /// Look up an attribute by local name
    pub fn get(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Attributes the caller may declare
    pub fn settable(&self) -> impl Iterator<Item = &AttributeDescriptor> {
        self.attributes.iter().filter(|a| !a.is_computed())
    }

    /// Attributes assigned by the control plane
    pub fn computed(&self) -> impl Iterator<Item = &AttributeDescriptor> {
        self.attributes.iter().filter(|a| a.is_computed())
    }

    /// Path of a single resource in the collection
    pub fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.collection, id)
    }

    /// Validate a declared spec against this schema
    ///
    /// Checks that required attributes are present, that no unknown or
    /// computed attributes are declared, and that each value has the right
    /// type and satisfies its rule.
    pub fn validate(&self, spec: &ResourceSpec) -> Result<()> {
        for (name, value) in spec.iter() {
            let Some(attr) = self.get(name) else {
                return Err(Error::schema(&self.kind, name, "is not a known attribute"));
            };
            if attr.is_computed() {
                return Err(Error::schema(
                    &self.kind,
                    name,
                    "is computed by the control plane and cannot be set",
                ));
            }
            if value.attr_type() != attr.attr_type {
                return Err(Error::schema(
                    &self.kind,
                    name,
                    format!("expects {}, got {}", attr.attr_type, value.attr_type()),
                ));
            }
            if let Some(rule) = &attr.rule
                && let Err(problem) = rule.check(value)
            {
                return Err(Error::schema(&self.kind, name, problem));
            }
        }

        if let Some(missing) = self
            .settable()
            .find(|a| a.is_required() && !spec.contains(&a.name))
        {
            return Err(Error::schema(&self.kind, &missing.name, "is required"));
        }

        Ok(())
    }

    /// Fill in defaults for optional attributes the spec leaves out
    pub fn with_defaults(&self, spec: &ResourceSpec) -> ResourceSpec {
        let mut filled = spec.clone();
        for attr in self.settable() {
            if !filled.contains(&attr.name)
                && let Some(default) = &attr.default
            {
                filled.insert(attr.name.clone(), default.clone());
            }
        }
        filled
    }

    /// Render a value for display, hiding sensitive attributes
    pub fn display_value(&self, name: &str, value: &Value) -> String {
        match self.get(name) {
            Some(attr) if attr.sensitive => "(sensitive value)".to_string(),
            _ => value.to_string(),
        }
    }
}
