//! Build command - reconcile a build request into a dataset.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cldfkit::{BuildRequest, DatasetBuilder, Module, Severity, Sources, UndefinedColumnPolicy};
use colored::Colorize;

/// Options of the build command.
pub struct BuildArgs {
    pub request: PathBuf,
    pub dir: Option<PathBuf>,
    pub module: Option<String>,
    pub no_validate: bool,
    pub register_undefined: bool,
    pub json: bool,
}

pub fn run(
    args: BuildArgs,
    components: Option<&Path>,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = fs::read_to_string(&args.request)
        .map_err(|e| format!("Cannot read build request {}: {}", args.request.display(), e))?;
    let mut request: BuildRequest = serde_json::from_str(&text)?;

    // Relative bibliography paths are relative to the request file.
    if let Some(Sources::Path(path)) = &mut request.sources {
        if path.is_relative() {
            if let Some(base) = args.request.parent() {
                *path = base.join(&*path);
            }
        }
    }
    if let Some(dir) = args.dir {
        request.spec.dir = dir;
    }
    if let Some(module) = args.module {
        let module: Module = module.parse()?;
        request = request.with_module(module);
    }
    if args.no_validate {
        request = request.without_validation();
    }
    if args.register_undefined {
        request = request.with_undefined_columns(UndefinedColumnPolicy::Register);
    }

    let catalog = super::load_catalog(components)?;
    let builder = DatasetBuilder::with_catalog(Arc::new(catalog));

    if verbose && !args.json {
        println!(
            "{} {} table(s) into {}",
            "Building".cyan().bold(),
            request.tables.len(),
            request.spec.dir.display()
        );
    }

    let outcome = builder.build(request)?;

    if args.json {
        let output = serde_json::json!({
            "metadata": outcome.metadata_path,
            "summary": outcome.summary,
            "diagnostics": outcome.diagnostics.entries(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Wrote".green().bold(),
        outcome.metadata_path.display().to_string().white()
    );
    println!();
    println!("{}", "Summary:".yellow().bold());
    println!("  Tables:   {}", outcome.summary.tables.to_string().white());
    println!("  Rows:     {}", outcome.summary.rows.to_string().white());
    println!("  Sources:  {}", outcome.summary.sources.to_string().white());
    println!(
        "  Validated: {}",
        if outcome.summary.validated {
            "yes".green()
        } else {
            "skipped".yellow()
        }
    );

    if !outcome.diagnostics.is_empty() {
        println!();
        println!("{}", "Diagnostics:".yellow().bold());
        for diagnostic in outcome.diagnostics.entries() {
            let label = match diagnostic.severity {
                Severity::Error => diagnostic.severity.label().red().bold(),
                Severity::Warning => diagnostic.severity.label().yellow(),
                Severity::Info => diagnostic.severity.label().blue(),
            };
            if diagnostic.severity == Severity::Info && !verbose {
                continue;
            }
            println!(
                "  [{}] {}: {}",
                label,
                diagnostic.kind.label().dimmed(),
                diagnostic.message
            );
        }
    }

    Ok(())
}
