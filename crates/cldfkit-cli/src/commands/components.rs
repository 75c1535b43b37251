//! Components command - browse the component catalog.

use std::path::Path;

use colored::Colorize;

pub fn run(
    handle: Option<String>,
    json_output: bool,
    components: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = super::load_catalog(components)?;

    let Some(handle) = handle else {
        if json_output {
            let listing: serde_json::Map<String, serde_json::Value> = catalog
                .components()
                .map(|(handle, id)| (handle.to_string(), serde_json::Value::from(id)))
                .collect();
            println!("{}", serde_json::to_string_pretty(&listing)?);
            return Ok(());
        }
        println!("{} ({})", "Components".cyan().bold(), catalog.len());
        for (handle, id) in catalog.components() {
            let columns = catalog.dictionary(handle).map_or(0, |d| d.len());
            println!("  {:<16} {:<20} {} columns", handle.white(), id, columns);
        }
        return Ok(());
    };

    let definition = catalog
        .definition(&handle)
        .or_else(|| catalog.definition_by_id(&handle))
        .ok_or_else(|| format!("Unknown component: {}", handle))?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(definition)?);
        return Ok(());
    }

    println!(
        "{} {}",
        definition.component_id().unwrap_or(&handle).cyan().bold(),
        definition.url.dimmed()
    );
    for column in definition.columns() {
        let marker = if column.required { "*".red() } else { " ".normal() };
        let property = column.semantic_handle().unwrap_or("-");
        let separator = column
            .separator
            .as_deref()
            .map(|s| format!(" (list, separator {:?})", s))
            .unwrap_or_default();
        println!(
            "  {}{:<20} {}{}",
            marker,
            column.name.white(),
            property.dimmed(),
            separator
        );
    }
    Ok(())
}
