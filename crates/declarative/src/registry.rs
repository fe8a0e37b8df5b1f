//! Resource kind registry
//!
//! Maps kind identifiers to their schema. One generic [`Reconciler`] serves
//! every registered kind.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::reconciler::Reconciler;
use crate::schema::ResourceSchema;

/// Registry of resource kinds, built once at startup
#[derive(Debug, Clone, Default)]
pub struct Registry {
    schemas: BTreeMap<String, ResourceSchema>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema; a kind may only be registered once
    pub fn register(&mut self, schema: ResourceSchema) -> Result<()> {
        if self.schemas.contains_key(&schema.kind) {
            return Err(Error::DuplicateKind(schema.kind));
        }
        log::trace!("Registered resource kind {}", schema.kind);
        self.schemas.insert(schema.kind.clone(), schema);
        Ok(())
    }

    pub fn schema(&self, kind: &str) -> Result<&ResourceSchema> {
        self.schemas
            .get(kind)
            .ok_or_else(|| Error::UnknownKind(kind.to_string()))
    }

    pub fn reconciler(&self, kind: &str) -> Result<Reconciler<'_>> {
        self.schema(kind).map(Reconciler::new)
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.schemas.contains_key(kind)
    }

    /// Registered kinds in lexicographic order
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn schemas(&self) -> impl Iterator<Item = &ResourceSchema> {
        self.schemas.values()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
