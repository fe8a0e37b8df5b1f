//! `hashistack kinds` - describe the supported resource kinds

use anyhow::Result;
use colored::Colorize;
use declarative::{AttributeDescriptor, Presence, Registry, ResourceSchema, Rule};

use crate::ui;

pub fn run(registry: &Registry, kind: Option<&str>) -> Result<()> {
    match kind {
        Some(kind) => describe(registry.schema(kind)?),
        None => {
            ui::header("Resource kinds");
            for schema in registry.schemas() {
                println!("  {:<20} {}", schema.kind.bold(), schema.description.dimmed());
            }
            println!();
            ui::dim("Run 'hashistack kinds <kind>' for its attributes");
        }
    }
    Ok(())
}

fn describe(schema: &ResourceSchema) {
    ui::header(&schema.kind);
    if !schema.description.is_empty() {
        println!("  {}", schema.description);
    }
    ui::kv("collection", &schema.collection);

    ui::section("Attributes");
    for attr in &schema.attributes {
        let presence = presence_label(attr.presence);
        let presence = match attr.presence {
            Presence::Required => presence.yellow(),
            Presence::Optional => presence.normal(),
            Presence::Computed => presence.dimmed(),
        };
        println!(
            "  {:<22} {:<14} {:<9} {}",
            attr.name,
            attr.attr_type.to_string(),
            presence,
            notes(attr).dimmed()
        );
    }
}

fn presence_label(presence: Presence) -> &'static str {
    match presence {
        Presence::Required => "required",
        Presence::Optional => "optional",
        Presence::Computed => "computed",
    }
}

fn rule_label(rule: &Rule) -> String {
    match rule {
        Rule::IntRange { min, max } => format!("{min}..={max}"),
        Rule::OneOf(values) => format!("one of {}", values.join("|")),
        Rule::NonEmpty => "non-empty".to_string(),
    }
}

/// Default, rule and flags of an attribute
fn notes(attr: &AttributeDescriptor) -> String {
    let mut notes = Vec::new();
    if let Some(default) = &attr.default {
        notes.push(format!("default {default}"));
    }
    if let Some(rule) = &attr.rule {
        notes.push(rule_label(rule));
    }
    if attr.force_new {
        notes.push("forces replacement".to_string());
    }
    if attr.sensitive {
        notes.push("sensitive".to_string());
    }
    notes.join(", ")
}
