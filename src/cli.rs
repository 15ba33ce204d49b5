use crate::config::GeneratorConfig;
use crate::corpus::CorpusBuilder;
use crate::detector::ResourceDetector;
use crate::error::Error;
use crate::openapi_builder::synthesize;
use crate::serializer::{serialize, write_to_file, OutputFormat};
use crate::validator::DocumentValidator;
use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use std::path::PathBuf;

/// OpenAPI generator for Express route files - builds an OpenAPI 3.0 document from route registrations and their doc comments
#[derive(Parser, Debug)]
#[command(name = "openapi-from-routes")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Output file path (default: docs/openapi.yaml)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Output format (yaml or json); inferred from the output extension if not specified
    #[arg(short = 'f', long = "format", value_enum)]
    pub output_format: Option<OutputFormat>,

    /// Configuration file (YAML or JSON)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_path: Option<PathBuf>,

    /// Directory the route file list is resolved against
    #[arg(short = 'r', long = "root", value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Leave request body examples out of the document
    #[arg(long = "no-examples")]
    pub no_examples: bool,

    /// Fail when synthesis reports structural issues such as duplicate routes
    #[arg(long = "strict")]
    pub strict: bool,

    /// Validate an existing document without regenerating it
    #[arg(long = "validate-only")]
    pub validate_only: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.validate_only && !args.root.is_dir() {
        anyhow::bail!("Root path is not a directory: {}", args.root.display());
    }

    info!("Root: {}", args.root.display());
    if let Some(ref config) = args.config_path {
        info!("Config: {}", config.display());
    } else {
        info!("Config: built-in defaults");
    }

    Ok(args)
}

/// Load the configuration and apply command line overrides
pub fn load_config(args: &CliArgs) -> Result<GeneratorConfig> {
    let mut config = match &args.config_path {
        Some(path) => GeneratorConfig::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => GeneratorConfig::default(),
    };

    if args.no_examples {
        config.include_examples = false;
    }
    if let Some(output) = &args.output_path {
        config.output = output.clone();
    }

    Ok(config)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    let config = load_config(&args)?;
    let output_path = config.output.clone();
    let validator = DocumentValidator::new(&config);

    if args.validate_only {
        info!("Validating {}...", output_path.display());
        let format = args
            .output_format
            .unwrap_or_else(|| OutputFormat::from_path(&output_path));
        let report = validator.validate_file_as(&output_path, format)?;
        report.log_summary();
        report.into_result()?;
        info!("文档验证完成");
        return Ok(());
    }

    info!("Starting OpenAPI document generation...");

    // Step 1: Read route files into a corpus
    info!("Reading {} route files...", config.route_files.len());
    let detector = ResourceDetector::new(&config);
    let corpus = CorpusBuilder::from_config(&args.root, &config).build(&config.route_files, &detector);

    info!("Extracted {} total routes", corpus.routes.len());
    if corpus.routes.is_empty() {
        warn!("No routes found");
    }

    // Step 2: Build OpenAPI document
    info!("Building OpenAPI document...");
    let (document, report) = synthesize(&corpus.routes, &config);
    for (tag, operations) in &report.tag_groups {
        debug!("Tag {}: {} operations", tag, operations.len());
    }

    // Step 3: Serialize to requested format
    let format = args
        .output_format
        .unwrap_or_else(|| OutputFormat::from_path(&output_path));
    info!("Serializing to {:?} format...", format);
    let content = serialize(&document, format)?;

    // Step 4: Write output
    info!("Writing output to: {}", output_path.display());
    write_to_file(&content, &output_path)?;

    // Step 5: Read back and validate
    info!("Validating written document...");
    let mut validation = validator.validate_file_as(&output_path, format)?;
    validator.check_round_trip(&mut validation, &document);
    validation.log_summary();
    validation.into_result()?;

    info!("Generation complete!");
    info!("Summary:");
    info!("  - Files read: {}", corpus.files_read.len());
    info!("  - Routes found: {}", report.route_count);
    info!("  - Operations: {}", report.operation_count);
    info!("  - Tags: {}", report.tag_groups.len());
    info!("  - Structural issues: {}", report.issues.len());

    if args.strict && !report.issues.is_empty() {
        return Err(Error::StructuralIssues(report.issues.len()).into());
    }

    Ok(())
}
