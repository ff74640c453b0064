//! Serialization of generated documents to YAML or JSON.

use crate::error;
use crate::openapi_builder::OpenApiDocument;
use anyhow::{Context, Result};
use clap::ValueEnum;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Format implied by a file extension; anything but `.json` is YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => OutputFormat::Json,
            _ => OutputFormat::Yaml,
        }
    }
}

/// Serializes an OpenAPI document to YAML format.
///
/// # Errors
///
/// Returns [`Error::SerializationError`](crate::error::Error::SerializationError)
/// if `serde_yaml` rejects the document.
///
/// # Example
///
/// ```no_run
/// use openapi_synth::config::GeneratorConfig;
/// use openapi_synth::openapi_builder::generate;
/// use openapi_synth::serializer::serialize_yaml;
/// use openapi_synth::type_resolver::TypeArena;
///
/// let doc = generate(&[], &TypeArena::default(), &GeneratorConfig::default());
/// println!("{}", serialize_yaml(&doc).unwrap());
/// ```
pub fn serialize_yaml(doc: &OpenApiDocument) -> error::Result<String> {
    debug!("Serializing OpenAPI document to YAML");
    Ok(serde_yaml::to_string(doc)?)
}

/// Serializes an OpenAPI document to pretty-printed JSON.
///
/// # Errors
///
/// Returns [`Error::SerializationError`](crate::error::Error::SerializationError)
/// if `serde_json` rejects the document.
pub fn serialize_json(doc: &OpenApiDocument) -> error::Result<String> {
    debug!("Serializing OpenAPI document to JSON");
    Ok(serde_json::to_string_pretty(doc)?)
}

/// Serializes in the requested format.
pub fn serialize(doc: &OpenApiDocument, format: OutputFormat) -> error::Result<String> {
    match format {
        OutputFormat::Yaml => serialize_yaml(doc),
        OutputFormat::Json => serialize_json(doc),
    }
}

/// Writes string content to a file, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
