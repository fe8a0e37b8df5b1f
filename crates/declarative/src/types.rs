//! Core types for declarative resource management

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Semantic type of a resource attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrType {
    String,
    Int,
    Bool,
    StringList,
    StringMap,
}

impl AttrType {
    /// Whether values of this type are collections (list or map)
    pub fn is_collection(self) -> bool {
        matches!(self, Self::StringList | Self::StringMap)
    }

    /// The empty value for collection types
    pub fn empty_value(self) -> Option<Value> {
        match self {
            Self::StringList => Some(Value::List(Vec::new())),
            Self::StringMap => Some(Value::Map(BTreeMap::new())),
            _ => None,
        }
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::StringList => "list(string)",
            Self::StringMap => "map(string)",
        };
        f.write_str(name)
    }
}

/// A typed attribute value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    String(String),
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

impl Value {
    /// The semantic type of this value
    pub fn attr_type(&self) -> AttrType {
        match self {
            Self::Bool(_) => AttrType::Bool,
            Self::Int(_) => AttrType::Int,
            Self::String(_) => AttrType::String,
            Self::List(_) => AttrType::StringList,
            Self::Map(_) => AttrType::StringMap,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Encode as a wire JSON value
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(n) => serde_json::Value::from(*n),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::List(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(|s| serde_json::Value::String(s.clone()))
                    .collect(),
            ),
            Self::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                    .collect(),
            ),
        }
    }

    /// Decode a wire JSON value as the given type
    ///
    /// Returns `None` for `null` or when the JSON shape does not match `ty`.
    /// Whole-number floats are accepted for integers.
    pub fn from_json(ty: AttrType, json: &serde_json::Value) -> Option<Self> {
        match ty {
            AttrType::String => json.as_str().map(|s| Self::String(s.to_string())),
            AttrType::Int => json.as_i64().map(Self::Int).or_else(|| {
                json.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                    .map(|f| Self::Int(f as i64))
            }),
            AttrType::Bool => json.as_bool().map(Self::Bool),
            AttrType::StringList => json.as_array().and_then(|items| {
                items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
                    .map(Self::List)
            }),
            AttrType::StringMap => json.as_object().and_then(|entries| {
                entries
                    .iter()
                    .map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect::<Option<BTreeMap<_, _>>>()
                    .map(Self::Map)
            }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::List(items) => {
                let inner: Vec<String> = items.iter().map(|s| format!("{s:?}")).collect();
                write!(f, "[{}]", inner.join(", "))
            }
            Self::Map(entries) => {
                let inner: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{k} = {v:?}"))
                    .collect();
                write!(f, "{{{}}}", inner.join(", "))
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

impl From<BTreeMap<String, String>> for Value {
    fn from(entries: BTreeMap<String, String>) -> Self {
        Self::Map(entries)
    }
}

/// Flat string-to-string tags attached to every resource kind
pub type TagSet = BTreeMap<String, String>;

/// Ordered mapping of attribute name to typed value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceSpec {
    values: BTreeMap<String, Value>,
}

impl ResourceSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(name.into(), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for ResourceSpec {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Provisioning status reported by the control plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Pending,
    Ready,
    Failed,
    Deleting,
    Unknown,
}

impl Status {
    /// Whether polling stops at this status
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "PENDING",
            Self::Ready => "READY",
            Self::Failed => "FAILED",
            Self::Deleting => "DELETING",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// Last-observed remote representation of a resource
#[derive(Clone, PartialEq)]
pub struct RemoteResourceState {
    /// Remote ID assigned at create time
    pub id: String,
    /// Classified status
    pub status: Status,
    /// Status string exactly as reported
    pub raw_status: Option<String>,
    /// Translated attributes (settable and computed)
    pub attributes: ResourceSpec,
    /// Full remote payload
    pub payload: serde_json::Map<String, serde_json::Value>,
}

impl RemoteResourceState {
    pub fn new(id: impl Into<String>, status: Status, attributes: ResourceSpec) -> Self {
        Self {
            id: id.into(),
            status,
            raw_status: None,
            attributes,
            payload: serde_json::Map::new(),
        }
    }
}

// Attribute values may be sensitive; only names are printed.
impl fmt::Debug for RemoteResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteResourceState")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("raw_status", &self.raw_status)
            .field("attributes", &self.attributes.names().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Result of applying one planned change
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyResult {
    /// No changes needed
    NoChange,
    /// Resource was created
    Created(RemoteResourceState),
    /// Resource was updated in place
    Modified(RemoteResourceState),
    /// Resource was destroyed and created again
    Replaced(RemoteResourceState),
    /// Resource was removed
    Removed,
    /// Apply failed; `id` is set when a remote resource exists anyway
    Failed { error: String, id: Option<String> },
    /// Apply was skipped
    Skipped { reason: String },
}

impl ApplyResult {
    /// Check if the result represents success (no failure)
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// Check if the result represents a change
    pub fn is_change(&self) -> bool {
        matches!(
            self,
            Self::Created(_) | Self::Modified(_) | Self::Replaced(_) | Self::Removed
        )
    }

    /// The resulting remote state, if the resource exists after apply
    pub fn state(&self) -> Option<&RemoteResourceState> {
        match self {
            Self::Created(s) | Self::Modified(s) | Self::Replaced(s) => Some(s),
            _ => None,
        }
    }
}

/// Summary of execution results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteSummary {
    pub created: usize,
    pub modified: usize,
    pub replaced: usize,
    pub removed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub no_change: usize,
}

impl ExecuteSummary {
    /// Total number of actual changes made
    pub fn total_changes(&self) -> usize {
        self.created + self.modified + self.replaced + self.removed
    }

    /// Check if execution was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Total number of resources processed
    pub fn total(&self) -> usize {
        self.total_changes() + self.skipped + self.failed + self.no_change
    }

    /// Add a result to the summary
    pub fn add_result(&mut self, result: &ApplyResult) {
        match result {
            ApplyResult::NoChange => self.no_change += 1,
            ApplyResult::Created(_) => self.created += 1,
            ApplyResult::Modified(_) => self.modified += 1,
            ApplyResult::Replaced(_) => self.replaced += 1,
            ApplyResult::Removed => self.removed += 1,
            ApplyResult::Failed { .. } => self.failed += 1,
            ApplyResult::Skipped { .. } => self.skipped += 1,
        }
    }
}

/// Options for execution
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Don't make changes, just report what would happen
    pub dry_run: bool,
    /// Number of resources applied concurrently
    pub jobs: usize,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            jobs: 4,
        }
    }
}
