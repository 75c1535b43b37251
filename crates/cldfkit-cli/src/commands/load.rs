//! Load command - validate a dataset and show what it holds.

use std::path::PathBuf;

use cldfkit::sources::parse_bibtex;
use cldfkit::{Dataset, load_dataset};
use colored::Colorize;

pub fn run(
    metadata: PathBuf,
    table: Option<String>,
    json_output: bool,
    _verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !metadata.exists() {
        return Err(format!("Metadata file not found: {}", metadata.display()).into());
    }

    let contents = load_dataset(&metadata)?;

    // Resolve a handle or component id to the table url.
    let selected = match &table {
        Some(reference) => {
            let dataset = Dataset::from_metadata(&metadata)?;
            let url = dataset
                .table_url(reference)
                .ok_or_else(|| format!("Table '{}' not found in dataset", reference))?
                .to_string();
            Some(url)
        }
        None => None,
    };

    if json_output {
        let output = match &selected {
            Some(url) => {
                let mut table = serde_json::Map::new();
                table.insert(url.clone(), serde_json::to_value(&contents.tables[url.as_str()])?);
                serde_json::Value::Object(table)
            }
            None => serde_json::json!({
                "module": contents.module.name(),
                "identifier": contents.identifier,
                "metadata": contents.metadata,
                "tables": contents.tables,
                "sources": contents.sources,
            }),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if let Some(url) = &selected {
        println!("{} {}", "Table".cyan().bold(), url.white());
        for row in &contents.tables[url.as_str()] {
            println!("  {}", serde_json::to_string(row)?);
        }
        return Ok(());
    }

    println!(
        "{} {} ({})",
        "Dataset".cyan().bold(),
        metadata.display().to_string().white(),
        contents.module.name()
    );
    if let Some(title) = &contents.metadata.title {
        println!("  Title:      {}", title);
    }
    if let Some(identifier) = &contents.identifier {
        println!("  Identifier: {}", identifier);
    }
    println!();
    println!("{}", "Tables:".yellow().bold());
    for (url, rows) in &contents.tables {
        println!("  {:<24} {} row(s)", url, rows.len().to_string().white());
    }
    match &contents.sources {
        Some(text) => println!(
            "\n{} {} entries",
            "Sources:".yellow().bold(),
            parse_bibtex(text)?.len()
        ),
        None => println!("\n{} none", "Sources:".yellow().bold()),
    }
    println!("\n{}", "Dataset is valid.".green());

    Ok(())
}
