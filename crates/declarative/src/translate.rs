//! Translation between local attribute specs and remote JSON payloads

use serde_json::{Map, Value as Json};

use crate::error::Result;
use crate::schema::ResourceSchema;
use crate::types::{ResourceSpec, Value};

/// Convert a snake_case name to camelCase (`server_count` -> `serverCount`)
pub fn snake_to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Convert a camelCase name to snake_case (`serverCount` -> `server_count`)
pub fn camel_to_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_uppercase() {
            if !out.is_empty() {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Build the Create payload for a declared spec
///
/// Validates the spec first. Only settable attributes are emitted, under
/// their remote names; absent optional attributes take their default or are
/// omitted when they have none.
pub fn to_remote_payload(schema: &ResourceSchema, spec: &ResourceSpec) -> Result<Map<String, Json>> {
    schema.validate(spec)?;

    let mut payload = Map::new();
    for attr in schema.settable() {
        let value = spec.get(&attr.name).or(attr.default.as_ref());
        if let Some(value) = value {
            payload.insert(attr.remote_name.clone(), value.to_json());
        }
    }
    Ok(payload)
}

/// Translate a remote payload into a spec of settable and computed attributes
///
/// Unknown remote fields are ignored. Missing or `null` fields fall back to
/// the attribute default. Fields of the wrong JSON type are skipped.
pub fn from_remote_payload(schema: &ResourceSchema, payload: &Map<String, Json>) -> ResourceSpec {
    let mut spec = ResourceSpec::new();
    for attr in &schema.attributes {
        let decoded = match payload.get(&attr.remote_name) {
            None | Some(Json::Null) => None,
            Some(json) => {
                let value = Value::from_json(attr.attr_type, json);
                if value.is_none() {
                    log::warn!(
                        "{}: remote field `{}` is not a {}, ignoring",
                        schema.kind,
                        attr.remote_name,
                        attr.attr_type
                    );
                }
                value
            }
        };
        if let Some(value) = decoded.or_else(|| attr.default.clone()) {
            spec.insert(attr.name.clone(), value);
        }
    }
    spec
}
