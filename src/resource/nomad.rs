//! Nomad cluster

use declarative::{AttrType, AttributeDescriptor, ResourceSchema, Rule};

use super::{base, feature, instance_type, status, tags};

pub const KIND: &str = "nomad_cluster";

pub fn schema() -> ResourceSchema {
    base(KIND, "/cloud/project/nomad/cluster", "Nomad cluster")
        .describe("Managed Nomad cluster")
        .attribute(
            AttributeDescriptor::required("server_count", AttrType::Int)
                .rule(Rule::IntRange { min: 1, max: 5 })
                .describe("Number of Nomad server nodes"),
        )
        .attribute(
            AttributeDescriptor::required("client_count", AttrType::Int)
                .rule(Rule::IntRange { min: 0, max: 100 })
                .describe("Number of Nomad client nodes"),
        )
        .attribute(instance_type())
        .attribute(
            AttributeDescriptor::optional("datacenter", AttrType::String)
                .default_value("dc1")
                .force_new()
                .describe("Nomad datacenter name"),
        )
        .attribute(feature("vault_integration", true, "Vault integration for secrets"))
        .attribute(feature("consul_integration", true, "Consul integration for service discovery"))
        .attribute(feature("acl_enabled", true, "Nomad ACL system"))
        .attribute(feature("tls_enabled", true, "TLS encryption"))
        .attribute(feature("web3_enabled", false, "Web3 blockchain integration"))
        .attribute(feature("kata_containers", false, "Kata containers for isolated workloads"))
        .attribute(feature("gpu_support", false, "GPU support for ML workloads"))
        .attribute(tags())
        .attribute(
            AttributeDescriptor::computed("server_endpoints", AttrType::StringList)
                .describe("Nomad server endpoints"),
        )
        .attribute(AttributeDescriptor::computed("ui_url", AttrType::String).describe("Nomad UI URL"))
        .attribute(status())
        .attribute(
            AttributeDescriptor::computed("created_at", AttrType::String)
                .describe("Creation timestamp"),
        )
}
