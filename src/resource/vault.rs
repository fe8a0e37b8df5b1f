//! Vault cluster

use declarative::{AttrType, AttributeDescriptor, ResourceSchema, Rule};

use super::{base, feature, instance_type, status, tags};

pub const KIND: &str = "vault_cluster";

pub fn schema() -> ResourceSchema {
    base(KIND, "/cloud/project/vault/cluster", "Vault cluster")
        .describe("Managed Vault cluster")
        .attribute(
            AttributeDescriptor::required("node_count", AttrType::Int)
                .rule(Rule::IntRange { min: 1, max: 7 })
                .describe("Number of Vault nodes"),
        )
        .attribute(instance_type())
        .attribute(
            AttributeDescriptor::optional("storage_type", AttrType::String)
                .default_value("consul")
                .rule(Rule::OneOf(vec!["consul", "raft", "etcd", "dynamodb"]))
                .force_new()
                .describe("Storage backend"),
        )
        .attribute(feature("auto_unseal", true, "Auto-unseal with the managed KMS"))
        .attribute(feature("audit_enabled", true, "Audit logging"))
        .attribute(feature("performance_replication", false, "Performance replication"))
        .attribute(feature("disaster_recovery", false, "Disaster recovery replication"))
        .attribute(feature("web3_secrets", false, "Web3 secrets engine"))
        .attribute(feature("kubernetes_auth", true, "Kubernetes authentication"))
        .attribute(tags())
        .attribute(
            AttributeDescriptor::computed("cluster_url", AttrType::String)
                .describe("Vault cluster URL"),
        )
        .attribute(AttributeDescriptor::computed("ui_url", AttrType::String).describe("Vault UI URL"))
        .attribute(
            AttributeDescriptor::computed("root_token", AttrType::String)
                .sensitive()
                .describe("Initial root token"),
        )
        .attribute(
            AttributeDescriptor::computed("unseal_keys", AttrType::StringList)
                .sensitive()
                .describe("Unseal keys"),
        )
        .attribute(status())
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{Method, MockClient, ReconcileContext, Reconciler, ResourceSpec, TagSet};
    use serde_json::json;

    fn spec() -> ResourceSpec {
        ResourceSpec::new()
            .with("name", "secrets")
            .with("region", "GRA")
            .with("node_count", 3)
    }

    #[test]
    fn test_secrets_are_sensitive() {
        let schema = schema();
        assert!(schema.get("root_token").unwrap().sensitive);
        assert!(schema.get("unseal_keys").unwrap().sensitive);
        assert_eq!(
            schema.display_value("root_token", &"s.abcdef".into()),
            "(sensitive value)"
        );
    }

    #[test]
    fn test_storage_type_rule() {
        let schema = schema();
        assert!(schema.validate(&spec().with("storage_type", "raft")).is_ok());
        assert!(schema.validate(&spec().with("storage_type", "s3")).is_err());
    }

    #[test]
    fn test_read_keeps_secrets_out_of_debug() {
        let schema = schema();
        let client = MockClient::new();
        client.on(
            Method::Get,
            "/cloud/project/vault/cluster/v-1",
            json!({
                "id": "v-1",
                "name": "secrets",
                "region": "GRA",
                "nodeCount": 3,
                "rootToken": "s.topsecret",
                "unsealKeys": ["k1", "k2"],
                "status": "READY"
            }),
        );

        let state = Reconciler::new(&schema)
            .read(&ReconcileContext::new(&client), "v-1")
            .unwrap()
            .unwrap();

        assert_eq!(state.attributes.get_str("root_token"), Some("s.topsecret"));
        assert!(!format!("{state:?}").contains("s.topsecret"));
    }

    #[test]
    fn test_node_count_and_tags_update_in_place() {
        let schema = schema();
        let tags: TagSet = [("env".to_string(), "prod".to_string())].into_iter().collect();
        let desired = spec().with("node_count", 5).with("tags", tags);

        let diff = Reconciler::new(&schema).plan_update(&desired, &spec());

        assert!(!diff.force_replace);
        assert_eq!(diff.changed["nodeCount"], json!(5));
        assert_eq!(diff.changed["tags"], json!({"env": "prod"}));
    }
}
