//! Built-in resource kinds
//!
//! Each kind is a [`ResourceSchema`] describing one managed HashiCorp product
//! on the control plane. The generic [`declarative::Reconciler`] does the rest.
//!
//! Attributes the remote update endpoint does not accept are marked
//! force-new, so changing them plans a replacement instead of an update.

pub mod boundary;
pub mod consul;
pub mod nomad;
pub mod packer;
pub mod vault;
pub mod waypoint;

use declarative::{AttrType, AttributeDescriptor, Registry, ResourceSchema, Rule};

/// Build the registry of every built-in kind
pub fn registry() -> declarative::Result<Registry> {
    let mut registry = Registry::new();
    for schema in [
        nomad::schema(),
        vault::schema(),
        consul::schema(),
        boundary::schema(),
        waypoint::schema(),
        packer::schema(),
    ] {
        registry.register(schema)?;
    }
    log::debug!("Registered {} resource kinds", registry.len());
    Ok(registry)
}

/// Start a schema with the attributes every kind shares
fn base(kind: &str, collection: &str, product: &str) -> ResourceSchema {
    ResourceSchema::new(kind, collection)
        .attribute(
            AttributeDescriptor::required("name", AttrType::String)
                .rule(Rule::NonEmpty)
                .force_new()
                .describe(&format!("Name of the {product} resource")),
        )
        .attribute(
            AttributeDescriptor::required("region", AttrType::String)
                .rule(Rule::NonEmpty)
                .force_new()
                .describe("Region to deploy into"),
        )
}

fn tags() -> AttributeDescriptor {
    AttributeDescriptor::optional("tags", AttrType::StringMap).describe("Tags to apply")
}

fn status() -> AttributeDescriptor {
    AttributeDescriptor::computed("status", AttrType::String).describe("Provisioning status")
}

/// Instance flavors accepted by the compute fleet
const INSTANCE_TYPES: &[&str] = &[
    "s1-2", "s1-4", "s1-8", "c2-7", "c2-15", "c2-30", "c2-60", "c2-120", "r2-15", "r2-30", "r2-60",
    "r2-120", "t1-45", "t1-90", "t1-180",
];

const DEFAULT_INSTANCE_TYPE: &str = "s1-4";

fn instance_type() -> AttributeDescriptor {
    AttributeDescriptor::optional("instance_type", AttrType::String)
        .default_value(DEFAULT_INSTANCE_TYPE)
        .rule(Rule::OneOf(INSTANCE_TYPES.to_vec()))
        .force_new()
        .describe("Instance type for cluster nodes")
}

/// Optional boolean feature flag that can only be set at creation
fn feature(name: &str, default: bool, description: &str) -> AttributeDescriptor {
    AttributeDescriptor::optional(name, AttrType::Bool)
        .default_value(default)
        .force_new()
        .describe(description)
}
