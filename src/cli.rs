use crate::config::GeneratorConfig;
use crate::pipeline::load_rust_project;
use crate::serializer::{serialize, write_to_file, OutputFormat};
use crate::source::{SourceModel, SourceTree};
use crate::store::SpecificationStore;
use anyhow::Result;
use clap::Parser;
use log::{debug, info};
use std::path::PathBuf;

/// Synthesize an OpenAPI document from annotated controller sources
#[derive(Parser, Debug)]
#[command(name = "openapi-synth")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the project directory
    #[arg(value_name = "PROJECT_PATH")]
    pub project_path: PathBuf,

    /// Generator configuration file (YAML or JSON)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_path: Option<PathBuf>,

    /// Source manifest to read instead of scanning Rust files
    #[arg(short = 'm', long = "manifest", value_name = "FILE")]
    pub manifest_path: Option<PathBuf>,

    /// Output format; defaults to the output file's extension, else yaml
    #[arg(short = 'f', long = "format", value_enum)]
    pub output_format: Option<OutputFormat>,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Overrides info.title
    #[arg(long = "title")]
    pub title: Option<String>,

    /// Overrides info.version
    #[arg(long = "api-version")]
    pub api_version: Option<String>,

    /// Overrides global_prefix
    #[arg(long = "prefix")]
    pub prefix: Option<String>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl CliArgs {
    pub fn format(&self) -> OutputFormat {
        self.output_format.unwrap_or_else(|| {
            self.output_path
                .as_deref()
                .map(OutputFormat::from_path)
                .unwrap_or(OutputFormat::Yaml)
        })
    }
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.project_path.exists() {
        anyhow::bail!(
            "Project path does not exist: {}",
            args.project_path.display()
        );
    }

    if !args.project_path.is_dir() {
        anyhow::bail!(
            "Project path is not a directory: {}",
            args.project_path.display()
        );
    }

    info!("Project path: {}", args.project_path.display());
    info!("Output format: {:?}", args.format());
    match &args.output_path {
        Some(output) => info!("Output file: {}", output.display()),
        None => info!("Output: stdout"),
    }

    Ok(args)
}

/// Configuration file (or defaults) with command-line overrides applied
pub fn resolve_config(args: &CliArgs) -> Result<GeneratorConfig> {
    let mut config = match &args.config_path {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };

    if let Some(title) = &args.title {
        config.info.title = title.clone();
    }
    if let Some(version) = &args.api_version {
        config.info.version = version.clone();
    }
    if let Some(prefix) = &args.prefix {
        config.global_prefix = prefix.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting OpenAPI document generation...");
    let config = resolve_config(&args)?;

    let model: SourceTree = match &args.manifest_path {
        Some(manifest) => {
            info!("Reading source manifest: {}", manifest.display());
            SourceTree::from_manifest(manifest)?
        }
        None => {
            info!("Scanning project directory...");
            load_rust_project(&args.project_path, &config.classifier())?
        }
    };

    if model.units().is_empty() {
        anyhow::bail!("No source units found in {}", args.project_path.display());
    }

    let store = SpecificationStore::new();
    let snapshot = store.scan(&model, &config);
    let content = serialize(&snapshot.document, args.format())?;

    match &args.output_path {
        Some(output_path) => {
            write_to_file(&content, output_path)?;
            info!("Wrote OpenAPI document to {}", output_path.display());
        }
        None => println!("{}", content),
    }

    info!("Summary:");
    info!("  - Source units: {}", model.units().len());
    info!("  - Paths: {}", snapshot.document.paths.len());
    info!("  - Tags: {}", snapshot.document.tags.len());

    Ok(())
}
