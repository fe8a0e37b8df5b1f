//! Desired-state manifest
//!
//! A TOML file with one table per resource, addressed as `[<kind>.<name>]`:
//!
//! ```toml
//! [nomad_cluster.jobs]
//! region = "GRA"
//! server_count = 3
//! client_count = 5
//! tags = { env = "prod" }
//! ```
//!
//! Values are typed using the kind's schema. `name` defaults to the table name.

use anyhow::{Context, Result, bail};
use declarative::{Address, AttrType, Declared, Registry, ResourceSchema, ResourceSpec, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Default manifest file name, relative to the working directory
pub const DEFAULT_MANIFEST: &str = "hashistack.toml";

#[derive(Debug, Default)]
pub struct Manifest {
    pub resources: Vec<Declared>,
}

impl Manifest {
    /// Read and convert a manifest file
    pub fn load(path: &Path, registry: &Registry) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        let manifest = Self::parse(&content, registry)
            .with_context(|| format!("Invalid manifest: {}", path.display()))?;
        log::debug!(
            "Loaded {} resources from {}",
            manifest.resources.len(),
            path.display()
        );
        Ok(manifest)
    }

    pub fn parse(content: &str, registry: &Registry) -> Result<Self> {
        let table: toml::Table = toml::from_str(content).context("Failed to parse TOML")?;
        let mut resources = Vec::new();

        for (kind, entries) in &table {
            let schema = registry.schema(kind)?;
            let Some(entries) = entries.as_table() else {
                bail!("`{kind}` must be a table of named resources");
            };
            for (name, attributes) in entries {
                let Some(attributes) = attributes.as_table() else {
                    bail!("`{kind}.{name}` must be a table of attributes");
                };
                let spec = convert(schema, name, attributes)
                    .with_context(|| format!("In `{kind}.{name}`"))?;
                resources.push(Declared {
                    address: Address::new(kind.as_str(), name.as_str()),
                    spec,
                });
            }
        }

        Ok(Self { resources })
    }

    /// Find a declared resource by address
    pub fn get(&self, address: &Address) -> Option<&Declared> {
        self.resources.iter().find(|d| &d.address == address)
    }
}

fn convert(schema: &ResourceSchema, name: &str, attributes: &toml::Table) -> Result<ResourceSpec> {
    let mut spec = ResourceSpec::new();
    for (key, raw) in attributes {
        let Some(attr) = schema.get(key) else {
            bail!("unknown attribute `{key}` for {}", schema.kind);
        };
        let value = to_value(attr.attr_type, raw)
            .with_context(|| format!("`{key}` expects {}", attr.attr_type))?;
        spec.insert(key.clone(), value);
    }
    if schema.get("name").is_some() && !spec.contains("name") {
        spec.insert("name", Value::String(name.to_string()));
    }
    Ok(spec)
}

fn to_value(attr_type: AttrType, raw: &toml::Value) -> Result<Value> {
    let value = match (attr_type, raw) {
        (AttrType::String, toml::Value::String(s)) => Value::String(s.clone()),
        (AttrType::Int, toml::Value::Integer(n)) => Value::Int(*n),
        (AttrType::Bool, toml::Value::Boolean(b)) => Value::Bool(*b),
        (AttrType::StringList, toml::Value::Array(items)) => Value::List(
            items
                .iter()
                .map(|item| match item {
                    toml::Value::String(s) => Ok(s.clone()),
                    other => bail!("list items must be strings, got {}", other.type_str()),
                })
                .collect::<Result<_>>()?,
        ),
        (AttrType::StringMap, toml::Value::Table(entries)) => Value::Map(
            entries
                .iter()
                .map(|(k, v)| match v {
                    toml::Value::String(s) => Ok((k.clone(), s.clone())),
                    other => bail!("`{k}` must be a string, got {}", other.type_str()),
                })
                .collect::<Result<BTreeMap<_, _>>>()?,
        ),
        (_, other) => bail!("got {}", other.type_str()),
    };
    Ok(value)
}
