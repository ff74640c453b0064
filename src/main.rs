//! openapi-synth - command-line tool synthesizing OpenAPI documents from
//! annotated controller sources.
//!
//! # Usage
//!
//! ```bash
//! openapi-synth [OPTIONS] <PROJECT_PATH>
//! ```
//!
//! Generate YAML documentation:
//! ```bash
//! openapi-synth ./my-service -o openapi.yaml
//! ```
//!
//! Use a configuration file and a source manifest produced by another front-end:
//! ```bash
//! openapi-synth ./my-service -c openapi-synth.yaml -m units.json -f json
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use openapi_synth::cli;

fn main() -> Result<()> {
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("openapi-synth starting...");

    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;

    info!("OpenAPI document generation completed successfully");

    Ok(())
}
