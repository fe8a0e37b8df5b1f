//! Packer template
//!
//! Unlike the cluster kinds, most template attributes can be edited in place.

use declarative::{AttrType, AttributeDescriptor, ResourceSchema, Rule};

use super::{base, feature, instance_type, status, tags};

pub const KIND: &str = "packer_template";

pub fn schema() -> ResourceSchema {
    base(KIND, "/cloud/project/packer/template", "Packer template")
        .describe("Managed Packer image template")
        .attribute(
            AttributeDescriptor::required("source_image", AttrType::String)
                .rule(Rule::NonEmpty)
                .describe("Base image to build from"),
        )
        .attribute(instance_type())
        .attribute(
            AttributeDescriptor::required("builders", AttrType::StringList)
                .rule(Rule::NonEmpty)
                .describe("Builder definitions"),
        )
        .attribute(AttributeDescriptor::optional("provisioners", AttrType::StringList))
        .attribute(AttributeDescriptor::optional(
            "post_processors",
            AttrType::StringList,
        ))
        .attribute(
            AttributeDescriptor::optional("variables", AttrType::StringMap)
                .describe("Template variables"),
        )
        .attribute(
            AttributeDescriptor::optional("auto_build", AttrType::Bool)
                .default_value(false)
                .describe("Rebuild automatically when the template changes"),
        )
        .attribute(
            AttributeDescriptor::optional("build_timeout", AttrType::Int)
                .default_value(3600)
                .rule(Rule::IntRange {
                    min: 300,
                    max: 7200,
                })
                .describe("Build timeout in seconds"),
        )
        .attribute(feature("web3_tools", false, "Web3 tooling in images"))
        .attribute(feature("kata_support", false, "Kata containers support"))
        .attribute(tags())
        .attribute(AttributeDescriptor::computed("template_id", AttrType::String))
        .attribute(AttributeDescriptor::computed("last_build_id", AttrType::String))
        .attribute(AttributeDescriptor::computed("image_id", AttrType::String))
        .attribute(status())
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::ResourceSpec;
    use serde_json::json;

    fn spec() -> ResourceSpec {
        ResourceSpec::new()
            .with("name", "base-image")
            .with("region", "GRA")
            .with("source_image", "ubuntu-22.04")
            .with("builders", vec!["openstack".to_string()])
    }

    #[test]
    fn test_builders_must_not_be_empty() {
        let schema = schema();
        let err = schema
            .validate(&spec().with("builders", Vec::<String>::new()))
            .unwrap_err();
        assert!(err.to_string().contains("builders"));
    }

    #[test]
    fn test_template_edits_are_in_place() {
        let schema = schema();
        let desired = spec()
            .with("source_image", "ubuntu-24.04")
            .with("provisioners", vec!["shell".to_string()])
            .with("build_timeout", 600);

        let diff = declarative::diff(&schema, &desired, &spec());

        assert!(!diff.force_replace);
        assert_eq!(diff.changed["sourceImage"], json!("ubuntu-24.04"));
        assert_eq!(diff.changed["provisioners"], json!(["shell"]));
        assert_eq!(diff.changed["buildTimeout"], json!(600));
        assert_eq!(diff.changed.len(), 3);
    }

    #[test]
    fn test_build_timeout_bounds() {
        let schema = schema();
        assert!(schema.validate(&spec().with("build_timeout", 299)).is_err());
        assert!(schema.validate(&spec().with("build_timeout", 7200)).is_ok());
    }
}
