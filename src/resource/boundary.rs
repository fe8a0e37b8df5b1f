//! Boundary cluster

use declarative::{AttrType, AttributeDescriptor, ResourceSchema, Rule};

use super::{base, feature, instance_type, status, tags};

pub const KIND: &str = "boundary_cluster";

pub fn schema() -> ResourceSchema {
    base(KIND, "/cloud/project/boundary/cluster", "Boundary cluster")
        .describe("Managed Boundary cluster")
        .attribute(
            AttributeDescriptor::required("controller_count", AttrType::Int)
                .rule(Rule::IntRange { min: 1, max: 5 })
                .describe("Number of controllers"),
        )
        .attribute(
            AttributeDescriptor::required("worker_count", AttrType::Int)
                .rule(Rule::IntRange { min: 1, max: 20 })
                .describe("Number of workers"),
        )
        .attribute(instance_type())
        .attribute(
            AttributeDescriptor::optional("database_type", AttrType::String)
                .default_value("postgresql")
                .rule(Rule::OneOf(vec!["postgresql", "mysql"]))
                .force_new()
                .describe("Controller database"),
        )
        .attribute(feature("vault_integration", true, "Vault credential brokering"))
        .attribute(feature("ldap_auth", false, "LDAP authentication"))
        .attribute(feature("oidc_auth", false, "OIDC authentication"))
        .attribute(feature("session_recording", true, "Session recording"))
        .attribute(feature("multi_hop_sessions", false, "Multi-hop sessions"))
        .attribute(feature("web3_targets", false, "Web3 targets"))
        .attribute(tags())
        .attribute(
            AttributeDescriptor::computed("controller_endpoints", AttrType::StringList)
                .describe("Controller endpoints"),
        )
        .attribute(AttributeDescriptor::computed("ui_url", AttrType::String))
        .attribute(
            AttributeDescriptor::computed("auth_method_id", AttrType::String)
                .describe("Default auth method ID"),
        )
        .attribute(status())
}
