//! Generator configuration.
//!
//! Every field has a default, so an empty file (or no file at all) is a valid
//! configuration. Files are read as JSON when the extension is `.json` and as
//! YAML otherwise.
//!
//! ```yaml
//! info:
//!   title: Shop API
//!   version: 2.1.0
//! versioning:
//!   enabled: true
//!   prefix: /api
//!   fallback: /legacy
//! category_mapping:
//!   Admin - Auth: Authentication
//! annotations:
//!   resource: controller
//! ```

use crate::category::{PathHeuristic, DEFAULT_ARTIFACT_DIRS};
use crate::classifier::{AnnotationClassifier, AnnotationRole};
use crate::error::{Error, Result};
use crate::type_resolver::DEFAULT_WRAPPERS;
use anyhow::Context;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub info: InfoConfig,
    /// Source-root prefix stripped before category inference
    pub source_root: Option<String>,
    /// Prefix of every path when versioning does not apply
    pub global_prefix: String,
    pub versioning: VersioningConfig,
    /// Explicit servers; when present no servers are inferred
    pub servers: Vec<ServerConfig>,
    /// Server used when no other server rule applies
    pub base_url: Option<String>,
    /// Inferred category -> replacement, tried in order
    pub category_mapping: IndexMap<String, String>,
    /// Emit the bearer security scheme
    pub include_security: bool,
    /// Extra or overriding annotation roles
    pub annotations: IndexMap<String, AnnotationRole>,
    /// Generic types unwrapped to their first argument
    pub wrapper_types: Vec<String>,
    /// Directory names ignored by category inference
    pub artifact_dirs: Vec<String>,
    /// Attach name-based example values to properties
    pub examples: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InfoConfig {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VersioningConfig {
    pub enabled: bool,
    /// Placed before the detected version, e.g. `/api`
    pub prefix: String,
    /// Used instead of the version for controllers without one
    pub fallback: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            info: InfoConfig::default(),
            source_root: None,
            global_prefix: String::new(),
            versioning: VersioningConfig::default(),
            servers: Vec::new(),
            base_url: None,
            category_mapping: IndexMap::new(),
            include_security: true,
            annotations: IndexMap::new(),
            wrapper_types: DEFAULT_WRAPPERS.iter().map(|w| w.to_string()).collect(),
            artifact_dirs: DEFAULT_ARTIFACT_DIRS.iter().map(|d| d.to_string()).collect(),
            examples: true,
        }
    }
}

impl Default for InfoConfig {
    fn default() -> Self {
        Self {
            title: "Generated API".to_string(),
            version: "1.0.0".to_string(),
            description: Some("API documentation generated from source".to_string()),
        }
    }
}

impl GeneratorConfig {
    /// Loads and validates a configuration file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        debug!("Loading configuration: {}", path.display());
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: GeneratorConfig = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .with_context(|| format!("Invalid JSON config: {}", path.display()))?,
            _ if content.trim().is_empty() => GeneratorConfig::default(),
            _ => serde_yaml::from_str(&content)
                .with_context(|| format!("Invalid YAML config: {}", path.display()))?,
        };

        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.info.title.trim().is_empty() {
            return Err(Error::ConfigError("info.title must not be empty".to_string()));
        }
        if let Some(server) = self.servers.iter().find(|s| s.url.trim().is_empty()) {
            return Err(Error::ConfigError(format!(
                "server {:?} has an empty url",
                server.description.as_deref().unwrap_or("")
            )));
        }
        Ok(())
    }

    /// Default vocabulary with the configured overrides applied
    pub fn classifier(&self) -> AnnotationClassifier {
        AnnotationClassifier::default().with_overrides(&self.annotations)
    }

    pub fn path_heuristic(&self) -> PathHeuristic {
        PathHeuristic::new(self.source_root.clone(), self.artifact_dirs.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::default();
        assert!(config.include_security);
        assert!(!config.versioning.enabled);
        assert!(config.examples);
        assert_eq!(config.wrapper_types.len(), DEFAULT_WRAPPERS.len());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_yaml_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("openapi.yaml");
        fs::write(
            &path,
            r#"
info:
  title: Shop API
versioning:
  enabled: true
  prefix: /api
  fallback: /legacy
category_mapping:
  Admin - Auth: Authentication
  Admin: Administration
annotations:
  resource: controller
  fetch: get
include_security: false
"#,
        )
        .unwrap();

        let config = GeneratorConfig::load(&path).unwrap();
        assert_eq!(config.info.title, "Shop API");
        assert_eq!(config.info.version, "1.0.0");
        assert_eq!(config.versioning.fallback.as_deref(), Some("/legacy"));
        assert!(!config.include_security);

        let keys: Vec<&String> = config.category_mapping.keys().collect();
        assert_eq!(keys, vec!["Admin - Auth", "Admin"]);

        let classifier = config.classifier();
        assert_eq!(classifier.classify("Resource"), Some(AnnotationRole::Controller));
        assert_eq!(classifier.classify("fetch"), Some(AnnotationRole::Get));
        assert_eq!(classifier.classify("Get"), Some(AnnotationRole::Get));
    }

    #[test]
    fn test_load_json_and_empty_files() {
        let dir = TempDir::new().unwrap();
        let json = dir.path().join("config.json");
        fs::write(&json, r#"{ "global_prefix": "/api", "servers": [{ "url": "https://x.dev" }] }"#)
            .unwrap();
        let config = GeneratorConfig::load(&json).unwrap();
        assert_eq!(config.global_prefix, "/api");
        assert_eq!(config.servers[0].url, "https://x.dev");

        let empty = dir.path().join("empty.yaml");
        fs::write(&empty, "").unwrap();
        assert!(GeneratorConfig::load(&empty).unwrap().include_security);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.yaml");
        fs::write(&path, "servers:\n  - url: ''\n    description: broken\n").unwrap();

        let err = GeneratorConfig::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("empty url"));
    }
}
