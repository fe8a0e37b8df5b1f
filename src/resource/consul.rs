//! Consul cluster

use declarative::{AttrType, AttributeDescriptor, ResourceSchema, Rule};

use super::{base, feature, instance_type, status, tags};

pub const KIND: &str = "consul_cluster";

pub fn schema() -> ResourceSchema {
    base(KIND, "/cloud/project/consul/cluster", "Consul cluster")
        .describe("Managed Consul cluster")
        .attribute(
            AttributeDescriptor::required("server_count", AttrType::Int)
                .rule(Rule::IntRange { min: 1, max: 7 })
                .describe("Number of Consul servers"),
        )
        .attribute(
            AttributeDescriptor::optional("client_count", AttrType::Int)
                .default_value(3)
                .rule(Rule::IntRange { min: 0, max: 100 })
                .describe("Number of Consul clients"),
        )
        .attribute(instance_type())
        .attribute(
            AttributeDescriptor::optional("datacenter", AttrType::String)
                .default_value("dc1")
                .force_new()
                .describe("Consul datacenter name"),
        )
        .attribute(feature("connect_enabled", true, "Consul Connect service mesh"))
        .attribute(feature("acl_enabled", true, "Consul ACL system"))
        .attribute(feature("encryption_enabled", true, "Gossip encryption"))
        .attribute(feature("tls_enabled", true, "TLS encryption"))
        .attribute(feature("ui_enabled", true, "Consul UI"))
        .attribute(feature("monitoring_enabled", true, "Monitoring"))
        .attribute(feature("backup_enabled", true, "Automated snapshots"))
        .attribute(feature("web3_services", false, "Web3 service discovery"))
        .attribute(tags())
        .attribute(
            AttributeDescriptor::computed("server_endpoints", AttrType::StringList)
                .describe("Consul server endpoints"),
        )
        .attribute(AttributeDescriptor::computed("ui_url", AttrType::String).describe("Consul UI URL"))
        .attribute(
            AttributeDescriptor::computed("gossip_key", AttrType::String)
                .sensitive()
                .describe("Gossip encryption key"),
        )
        .attribute(
            AttributeDescriptor::computed("master_token", AttrType::String)
                .sensitive()
                .describe("ACL bootstrap token"),
        )
        .attribute(status())
}
