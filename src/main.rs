//! OpenAPI generator for Express route files.
//!
//! Reads the configured route files, synthesizes an OpenAPI 3.0 document, writes it
//! and validates the written file.
//!
//! # Usage
//!
//! ```bash
//! openapi-from-routes [OPTIONS]
//! ```
//!
//! # Examples
//!
//! Generate `docs/openapi.yaml` from the default route files:
//! ```bash
//! openapi-from-routes
//! ```
//!
//! Generate JSON from a project elsewhere with a custom configuration:
//! ```bash
//! openapi-from-routes -r ../blog-server -c openapi-config.yaml -o docs/openapi.json
//! ```
//!
//! Check an existing document:
//! ```bash
//! openapi-from-routes --validate-only -o docs/openapi.yaml
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use openapi_from_routes::cli;

fn main() -> Result<()> {
    // Parse first so the verbose flag can pick the log level
    let args_for_verbose = cli::CliArgs::parse();

    let log_level = if args_for_verbose.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("OpenAPI generator starting...");

    let args = cli::parse_args_from_parsed(args_for_verbose)?;

    cli::run(args)?;

    Ok(())
}
