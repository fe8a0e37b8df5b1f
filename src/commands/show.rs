//! `hashistack show` - display one tracked resource

use anyhow::{Result, bail};
use colored::Colorize;
use declarative::{ResourceSchema, ResourceSpec};

use super::{Session, parse_address};
use crate::progress;
use crate::state::ResourceRecord;
use crate::ui;

pub fn run(session: &Session, address: &str, refresh: bool) -> Result<()> {
    let address = parse_address(&session.registry, address)?;
    let mut state = session.load_state()?;
    let Some(record) = state.get(&address).cloned() else {
        bail!("{address} is not tracked (use `hashistack import` to adopt it)");
    };
    let schema = session.registry.schema(&address.kind)?;

    let record = if refresh {
        let pb = progress::spinner(&format!("Reading {address}..."), session.quiet);
        let observed = session
            .registry
            .reconciler(&address.kind)?
            .read(&session.context(), &record.id);
        pb.finish_and_clear();

        match observed? {
            Some(remote) => {
                state.record(&address, &remote);
                session.save_state(&state)?;
                state.get(&address).cloned().unwrap_or(record)
            }
            None => {
                state.forget(&address);
                session.save_state(&state)?;
                ui::warn(&format!(
                    "{address} ({}) no longer exists remotely, removed from state",
                    record.id
                ));
                return Ok(());
            }
        }
    } else {
        record
    };

    display(&address.to_string(), schema, &record);
    Ok(())
}

fn display(address: &str, schema: &ResourceSchema, record: &ResourceRecord) {
    ui::header(address);
    ui::kv("id", &record.id);
    ui::kv("status", record.status.as_deref().unwrap_or("unknown"));
    ui::kv("updated", &record.updated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string());

    let lines = attribute_lines(schema, &record.attributes);
    if lines.is_empty() {
        ui::dim("No attributes recorded; the next apply replaces this resource");
        return;
    }
    ui::section("Attributes");
    for (name, value) in lines {
        println!("  {:<24} {}", name, value.dimmed());
    }
}

/// Attributes in schema order, sensitive values hidden
fn attribute_lines(schema: &ResourceSchema, attributes: &ResourceSpec) -> Vec<(String, String)> {
    schema
        .attributes
        .iter()
        .filter_map(|attr| {
            let value = attributes.get(&attr.name)?;
            Some((attr.name.clone(), schema.display_value(&attr.name, value)))
        })
        .collect()
}
