//! openapi-synth - synthesizes OpenAPI documents from annotated source trees.
//!
//! The library reads controllers, routes and data-transfer types through a
//! [`source::SourceModel`], resolves types into portable descriptors and
//! assembles an OpenAPI 3.0 document. No code is executed; everything is
//! static analysis.
//!
//! # Architecture
//!
//! 1. [`scanner`] and [`parser`] - find and parse Rust sources
//! 2. [`source`] - the source model; [`source::rust`] builds one from `syn` trees
//! 3. [`classifier`] - maps annotation names to roles
//! 4. [`type_resolver`], [`validator`] and [`examples`] - type descriptors,
//!    property constraints and example values
//! 5. [`extractor`] - controller and route descriptors
//! 6. [`category`] - category inference and overrides
//! 7. [`schema_generator`] and [`openapi_builder`] - the OpenAPI document
//! 8. [`store`] - the published snapshot of the latest scan
//! 9. [`serializer`] - YAML or JSON output
//!
//! # Example Usage
//!
//! ```no_run
//! use openapi_synth::{
//!     config::GeneratorConfig,
//!     pipeline::{generate_document, load_rust_project},
//!     serializer::serialize_yaml,
//! };
//! use std::path::Path;
//!
//! let config = GeneratorConfig::default();
//! let model = load_rust_project(Path::new("./my-service"), &config.classifier()).unwrap();
//! let document = generate_document(&model, &config);
//! println!("{}", serialize_yaml(&document).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod category;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod examples;
pub mod extractor;
pub mod openapi_builder;
pub mod parser;
pub mod pipeline;
pub mod scanner;
pub mod schema_generator;
pub mod serializer;
pub mod source;
pub mod store;
pub mod type_resolver;
pub mod validator;
