//! Command-line interface for xkbsym
//! This binary compiles a symbols file against a keycodes description and prints the
//! resulting keys.
//!
//! Usage:
//!   xkbsym `<symbols>` --keycodes `<description>` [--map `<name>`]
//!          [--include-root `<dir>`]... [--verbosity `<n>`] [--format json|yaml]
//!          [--config `<file>`]
//!
//! Diagnostics go to stderr through `tracing`; `RUST_LOG` overrides the configured
//! filter.

use anyhow::{Context as _, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use xkbsym::xkb::config::OutputFormat;
use xkbsym::xkb::include::{choose_map, read_source_file};
use xkbsym::{
    compile_symbols, ConfigLoader, Context, DirectoryLoader, Keymap, KeymapDescription,
    KeymapSummary, MergeMode,
};

fn cli() -> Command {
    Command::new("xkbsym")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compile the symbols section of an XKB keymap")
        .arg(
            Arg::new("path")
                .help("Statement file (YAML or JSON) holding the symbols maps")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .index(1),
        )
        .arg(
            Arg::new("keycodes")
                .long("keycodes")
                .short('k')
                .help("Keymap description with keycodes, aliases, types and virtual modifiers")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("map")
                .long("map")
                .short('m')
                .help("Map to compile when the file holds several"),
        )
        .arg(
            Arg::new("include-root")
                .long("include-root")
                .short('I')
                .help("Directory containing a symbols/ subdirectory to resolve includes from")
                .action(ArgAction::Append)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("verbosity")
                .long("verbosity")
                .short('v')
                .help("Diagnostic verbosity (0-10)")
                .value_parser(value_parser!(i64)),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("Output format")
                .value_parser(["json", "yaml"]),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Configuration file layered over the built-in defaults")
                .value_parser(value_parser!(PathBuf)),
        )
}

fn main() {
    let matches = cli().get_matches();
    if let Err(err) = run(&matches) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = matches.get_one::<PathBuf>("config") {
        loader = loader.with_file(path);
    }
    if let Some(verbosity) = matches.get_one::<i64>("verbosity") {
        loader = loader.set_override("log.verbosity", *verbosity)?;
    }
    if let Some(format) = matches.get_one::<String>("format") {
        loader = loader.set_override("output.format", format.as_str())?;
    }
    let config = loader.build().context("failed to load configuration")?;

    init_tracing(&config.log.filter);

    let mut ctx = Context::from_config(&config);

    let keycodes = matches
        .get_one::<PathBuf>("keycodes")
        .context("missing --keycodes")?;
    let description = read_description(keycodes)?;
    let mut keymap = Keymap::build(&mut ctx, &description);

    let path = matches
        .get_one::<PathBuf>("path")
        .context("missing symbols file")?;
    let maps = read_source_file(path)?;
    let map = matches.get_one::<String>("map").map(String::as_str);
    let file = choose_map(&mut ctx, &path.display().to_string(), &maps, map)?;

    let mut roots = config.include.roots.clone();
    roots.extend(
        matches
            .get_many::<PathBuf>("include-root")
            .into_iter()
            .flatten()
            .cloned(),
    );
    if roots.is_empty() {
        // <root>/symbols/<file>: default to the root the input file lives in.
        if let Some(root) = path.parent().and_then(Path::parent) {
            roots.push(root.to_path_buf());
        }
    }
    let mut includes = DirectoryLoader::new(roots);

    let report = compile_symbols(
        &mut ctx,
        &mut keymap,
        &file,
        MergeMode::Override,
        &mut includes,
    )
    .with_context(|| format!("failed to compile {}", path.display()))?;

    let errors = ctx.diagnostics().iter().filter(|d| d.is_error()).count();
    tracing::debug!(
        diagnostics = ctx.diagnostics().len(),
        errors,
        keys_skipped = report.keys_skipped,
        modmaps_skipped = report.modmaps_skipped,
        "compiled"
    );

    let summary = KeymapSummary::new(&ctx, &keymap, report);
    let output = match config.output.format {
        OutputFormat::Json => serde_json::to_string_pretty(&summary)?,
        OutputFormat::Yaml => serde_yaml::to_string(&summary)?,
    };
    println!("{}", output);
    Ok(())
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_description(path: &Path) -> Result<KeymapDescription> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let description = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse {}", path.display()))?
    } else {
        serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse {}", path.display()))?
    };
    Ok(description)
}
