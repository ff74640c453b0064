//! Controller and route extraction.
//!
//! Walks the classes of a [`SourceModel`](crate::source::SourceModel), picks
//! the ones the [`AnnotationClassifier`](crate::classifier::AnnotationClassifier)
//! recognizes as controllers, and turns each into a [`ControllerDescriptor`]
//! with one [`RouteDescriptor`] per verb-annotated method.
//!
//! # Example
//!
//! ```no_run
//! use openapi_synth::classifier::AnnotationClassifier;
//! use openapi_synth::extractor::ControllerExtractor;
//! use openapi_synth::source::SourceTree;
//! use openapi_synth::type_resolver::TypeResolver;
//! use std::path::Path;
//!
//! let tree = SourceTree::from_manifest(Path::new("units.yaml")).unwrap();
//! let extractor = ControllerExtractor::new(AnnotationClassifier::default());
//! let extraction = extractor.extract(TypeResolver::new(&tree));
//! println!("Found {} controllers", extraction.controllers.len());
//! ```

pub mod controller;
pub mod route;

pub use controller::{ControllerExtractor, Extraction};
pub use route::RouteExtractor;

use crate::type_resolver::TypeDescriptor;
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// A controller and everything discovered about it.
#[derive(Debug, Clone)]
pub struct ControllerDescriptor {
    /// Class name of the controller
    pub name: String,
    /// Base path from the controller annotation, possibly empty
    pub base_path: String,
    /// Location of the declaring source unit
    pub source_path: PathBuf,
    /// Inferred or mapped category, may be empty
    pub category: String,
    /// API version inferred from the source location, e.g. `v1`
    pub version: Option<String>,
    pub docs: Option<String>,
    pub routes: Vec<RouteDescriptor>,
    /// Class-level guard arguments, verbatim
    pub guards: Vec<String>,
}

/// One HTTP operation of a controller.
#[derive(Debug, Clone)]
pub struct RouteDescriptor {
    /// Name of the handling method
    pub name: String,
    pub method: HttpMethod,
    /// Sub-path below the controller base path; may contain `:name` placeholders
    pub path: String,
    /// First line of the method documentation
    pub docs: Option<String>,
    pub parameters: Vec<ParameterDescriptor>,
    pub request_body: Option<TypeDescriptor>,
    pub response: Option<TypeDescriptor>,
    /// Method-level guard arguments, verbatim
    pub guards: Vec<String>,
    /// Route bypasses authentication
    pub is_public: bool,
}

/// A route parameter bound from the path, query string or headers.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    pub name: String,
    pub location: ParameterLocation,
    pub ty: TypeDescriptor,
    /// Always true for path parameters
    pub required: bool,
}

/// HTTP methods an operation can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Head,
}

impl HttpMethod {
    /// Lowercase name, as used for path item keys
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
        }
    }

    /// Create, replace or partial update
    pub fn is_mutating(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

/// The location where a parameter value is extracted from in an HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterLocation {
    /// Path parameter embedded in the URL (e.g., `/users/:id`)
    Path,
    /// Query string parameter (e.g., `?page=1&limit=10`)
    Query,
    /// HTTP header parameter
    Header,
}

impl ParameterLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
        }
    }
}

/// Joins path segments with exactly one `/` between the non-empty ones.
///
/// Leading and trailing separators of every segment are dropped first, so
/// `["admin/", "/profile"]` and `["admin", "profile"]` both give
/// `/admin/profile`. An empty result is the root path.
pub fn combine_paths(segments: &[&str]) -> String {
    let parts: Vec<&str> = segments
        .iter()
        .map(|segment| segment.trim().trim_matches('/'))
        .filter(|segment| !segment.is_empty())
        .collect();

    format!("/{}", parts.join("/"))
}

/// Finds the first `/vN/` segment of a source location.
pub fn infer_version(path: &Path) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"/(v\d+)/").expect("valid regex"));

    let normalized = format!("/{}", path.to_string_lossy().replace('\\', "/"));
    re.captures(&normalized).map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_paths_normalizes_separators() {
        assert_eq!(combine_paths(&["admin/", "/profile"]), "/admin/profile");
        assert_eq!(combine_paths(&["admin", "profile"]), "/admin/profile");
        assert_eq!(combine_paths(&["/api/", "", "users", ":id"]), "/api/users/:id");
        assert_eq!(combine_paths(&["", "/"]), "/");
        assert_eq!(combine_paths(&[]), "/");
    }

    #[test]
    fn test_infer_version_from_location() {
        assert_eq!(
            infer_version(Path::new("src/api/v1/admin/admin_controller.rs")),
            Some("v1".to_string())
        );
        assert_eq!(
            infer_version(Path::new("v2/users/v3/controller.rs")),
            Some("v2".to_string())
        );
        assert_eq!(infer_version(Path::new("src/v1beta/users.rs")), None);
        assert_eq!(infer_version(Path::new("src/users/v1.rs")), None);
    }

    #[test]
    fn test_http_method_names() {
        assert_eq!(HttpMethod::Patch.as_str(), "patch");
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
        assert!(HttpMethod::Put.is_mutating());
        assert!(!HttpMethod::Get.is_mutating());
    }
}
