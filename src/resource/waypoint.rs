//! Waypoint runner

use declarative::{AttrType, AttributeDescriptor, ResourceSchema, Rule};

use super::{base, feature, instance_type, status, tags};

pub const KIND: &str = "waypoint_runner";

pub fn schema() -> ResourceSchema {
    base(KIND, "/cloud/project/waypoint/runner", "Waypoint runner")
        .describe("Managed Waypoint runner")
        .attribute(instance_type())
        .attribute(
            AttributeDescriptor::optional("runner_type", AttrType::String)
                .default_value("static")
                .rule(Rule::OneOf(vec!["static", "on-demand", "kubernetes"]))
                .force_new()
                .describe("Runner type"),
        )
        .attribute(
            AttributeDescriptor::optional("capacity", AttrType::Int)
                .default_value(10)
                .rule(Rule::IntRange { min: 1, max: 100 })
                .describe("Concurrent job capacity"),
        )
        .attribute(feature("docker_enabled", true, "Docker builds"))
        .attribute(feature("kubernetes_enabled", false, "Kubernetes deployments"))
        .attribute(feature("nomad_enabled", false, "Nomad deployments"))
        .attribute(feature("web3_deployments", false, "Web3 deployments"))
        .attribute(tags())
        .attribute(AttributeDescriptor::computed("runner_id", AttrType::String))
        .attribute(
            AttributeDescriptor::computed("token", AttrType::String)
                .sensitive()
                .describe("Runner token"),
        )
        .attribute(AttributeDescriptor::computed("endpoint", AttrType::String))
        .attribute(status())
}
