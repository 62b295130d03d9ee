//! attrchain CLI - validation-chain type resolution
//!
//! Checks member descriptions (JSON) against the signature catalog and
//! prints diagnostics.

use anyhow::{bail, Context, Result};
use attrchain::catalog::signature::short_name;
use attrchain::prelude::*;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "attrchain")]
#[command(about = "Type-check validation attribute chains", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true, help = "Configuration file (TOML)")]
    config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = Format::Text, help = "Output format")]
    format: Format,

    #[arg(long, global = true, help = "Maximum number of stages to reorder automatically")]
    max_stages: Option<usize>,

    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "Increase log verbosity")]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Check member descriptions for incompatible chains")]
    Check {
        #[arg(required = true, help = "Input files or glob patterns")]
        inputs: Vec<String>,
    },

    #[command(about = "List attribute types in the catalog")]
    Catalog {
        #[arg(help = "Only list names containing this text")]
        filter: Option<String>,
    },

    #[command(about = "Show the signatures of one attribute type")]
    Explain {
        #[arg(help = "Attribute name")]
        attribute: String,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Returns whether the run was clean.
fn run(cli: &Cli) -> Result<bool> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(max) = cli.max_stages {
        config.resolver = config.resolver.with_max_permutable_stages(max);
        config.resolver.validate()?;
    }

    let catalog = match CatalogBuilder::new()
        .with_builtins(config.include_builtins)
        .declare_all(config.attributes.clone())
        .build()
    {
        Ok(catalog) => catalog,
        Err(errors) => {
            report_diagnostics(cli.format, &DiagnosticEmitter::emit_catalog_errors(&errors))?;
            return Ok(false);
        }
    };
    log::info!("Loaded {} attribute types", catalog.len());

    match &cli.command {
        Commands::Check { inputs } => check(cli.format, &catalog, config.resolver, inputs),
        Commands::Catalog { filter } => {
            list_catalog(cli.format, &catalog, filter.as_deref())?;
            Ok(true)
        }
        Commands::Explain { attribute } => {
            explain(cli.format, &catalog, attribute)?;
            Ok(true)
        }
    }
}

fn check(format: Format, catalog: &SignatureCatalog, options: ResolverOptions, inputs: &[String]) -> Result<bool> {
    let mut members = Vec::new();
    for path in expand_inputs(inputs)? {
        let input = SerializedInput::load(&path).with_context(|| format!("reading {}", path.display()))?;
        let loaded = input
            .into_members(catalog)
            .with_context(|| format!("in {}", path.display()))?;
        log::info!("{}: {} member(s)", path.display(), loaded.len());
        members.extend(loaded);
    }

    let report = ChainAnalyzer::new(catalog, options).analyze_members(&members);

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        Format::Text => {
            for line in report.detailed_diagnostics() {
                println!("{}", line);
            }
            if !report.diagnostics.is_empty() {
                println!();
            }
            println!("{} ({} ms)", report.summary(), report.duration_ms);
        }
    }
    Ok(!report.has_errors())
}

fn expand_inputs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for pattern in patterns {
        let before = paths.len();
        for entry in glob::glob(pattern).with_context(|| format!("invalid pattern '{}'", pattern))? {
            paths.push(entry?);
        }
        if paths.len() == before {
            bail!("no input matches '{}'", pattern);
        }
    }
    Ok(paths)
}

fn report_diagnostics(format: Format, diagnostics: &[Diagnostic]) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(diagnostics)?),
        Format::Text => {
            for diagnostic in diagnostics {
                println!("{}", diagnostic);
            }
        }
    }
    Ok(())
}

fn list_catalog(format: Format, catalog: &SignatureCatalog, filter: Option<&str>) -> Result<()> {
    let entries: Vec<&AttributeEntry> = match filter {
        Some(query) => catalog.search(query),
        None => catalog.entries().collect(),
    };

    if format == Format::Json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("Attribute types ({} total):", entries.len());
    println!();
    for entry in entries {
        let guard = if entry.guard { " (guard)" } else { "" };
        println!("  • {}{} [{}]", entry.name, guard, entry.input_names().join(", "));
    }
    Ok(())
}

fn explain(format: Format, catalog: &SignatureCatalog, attribute: &str) -> Result<()> {
    let Some(entry) = catalog.lookup(attribute) else {
        bail!("attribute not found: {} (use 'catalog' to list attribute types)", attribute);
    };

    if format == Format::Json {
        println!("{}", serde_json::to_string_pretty(entry)?);
        return Ok(());
    }

    println!("Attribute: {}", short_name(&entry.name));
    println!("Full name: {}", entry.name);
    if entry.guard {
        println!("Null guard: accepts any type and strips nullability");
    }
    println!();
    println!("Signatures:");
    for signature in &entry.signatures {
        let kind = if signature.is_transform() { "transforms" } else { "validates" };
        println!("  • {} {}", kind, signature);
    }
    Ok(())
}
