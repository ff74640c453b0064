//! Maps annotation names to the semantic roles the extractors understand.
//!
//! The extractors never compare annotation names directly; they ask the
//! [`AnnotationClassifier`] which role a name plays. That keeps the pipeline
//! independent of any one framework's decorator or attribute vocabulary.

use crate::extractor::{HttpMethod, ParameterLocation};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Semantic role of an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationRole {
    /// Marks a class as a controller; first argument is the base path
    Controller,
    /// Marks a logical module that owns controllers
    Module,
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Head,
    /// Parameter bound from a path placeholder
    PathParam,
    /// Parameter bound from the query string
    QueryParam,
    /// Parameter bound from a request header
    HeaderParam,
    /// Parameter bound from the request body
    Body,
    /// Access-control guard; arguments are kept verbatim
    Guard,
    /// Route bypasses authentication
    Public,
}

impl AnnotationRole {
    /// HTTP verb carried by this role, if any
    pub fn http_method(self) -> Option<HttpMethod> {
        match self {
            AnnotationRole::Get => Some(HttpMethod::Get),
            AnnotationRole::Post => Some(HttpMethod::Post),
            AnnotationRole::Put => Some(HttpMethod::Put),
            AnnotationRole::Patch => Some(HttpMethod::Patch),
            AnnotationRole::Delete => Some(HttpMethod::Delete),
            AnnotationRole::Options => Some(HttpMethod::Options),
            AnnotationRole::Head => Some(HttpMethod::Head),
            _ => None,
        }
    }

    /// Parameter location carried by this role, if any
    pub fn parameter_location(self) -> Option<ParameterLocation> {
        match self {
            AnnotationRole::PathParam => Some(ParameterLocation::Path),
            AnnotationRole::QueryParam => Some(ParameterLocation::Query),
            AnnotationRole::HeaderParam => Some(ParameterLocation::Header),
            _ => None,
        }
    }
}

/// Normalizes an annotation name for comparison: lowercase, no `_` or `-`.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Lookup table from annotation name to role.
#[derive(Debug, Clone)]
pub struct AnnotationClassifier {
    roles: IndexMap<String, AnnotationRole>,
}

const DEFAULT_VOCABULARY: &[(&str, AnnotationRole)] = &[
    ("controller", AnnotationRole::Controller),
    ("module", AnnotationRole::Module),
    ("get", AnnotationRole::Get),
    ("post", AnnotationRole::Post),
    ("put", AnnotationRole::Put),
    ("patch", AnnotationRole::Patch),
    ("delete", AnnotationRole::Delete),
    ("options", AnnotationRole::Options),
    ("head", AnnotationRole::Head),
    ("param", AnnotationRole::PathParam),
    ("path", AnnotationRole::PathParam),
    ("query", AnnotationRole::QueryParam),
    ("header", AnnotationRole::HeaderParam),
    ("headers", AnnotationRole::HeaderParam),
    ("body", AnnotationRole::Body),
    ("use_guards", AnnotationRole::Guard),
    ("guard", AnnotationRole::Guard),
    ("roles", AnnotationRole::Guard),
    ("public", AnnotationRole::Public),
    ("skip_auth", AnnotationRole::Public),
    ("allow_anonymous", AnnotationRole::Public),
];

impl AnnotationClassifier {
    /// Creates a classifier with no known annotations
    pub fn empty() -> Self {
        Self {
            roles: IndexMap::new(),
        }
    }

    /// Registers (or overrides) the role of an annotation name
    pub fn with_role(mut self, name: &str, role: AnnotationRole) -> Self {
        self.roles.insert(normalize_name(name), role);
        self
    }

    /// Applies a batch of overrides, typically from configuration
    pub fn with_overrides(mut self, overrides: &IndexMap<String, AnnotationRole>) -> Self {
        for (name, role) in overrides {
            self.roles.insert(normalize_name(name), *role);
        }
        self
    }

    /// Role of the given annotation name, if it is known
    pub fn classify(&self, name: &str) -> Option<AnnotationRole> {
        self.roles.get(&normalize_name(name)).copied()
    }

    /// Whether the annotation `name` plays `role`.
    ///
    /// Names are compared after normalization, so `UseGuards`, `use_guards`
    /// and `use-guards` are the same annotation.
    pub fn is(&self, name: &str, role: AnnotationRole) -> bool {
        self.classify(name) == Some(role)
    }
}

impl Default for AnnotationClassifier {
    fn default() -> Self {
        DEFAULT_VOCABULARY
            .iter()
            .fold(Self::empty(), |classifier, (name, role)| {
                classifier.with_role(name, *role)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization_matches_across_conventions() {
        let classifier = AnnotationClassifier::default();
        assert_eq!(classifier.classify("UseGuards"), Some(AnnotationRole::Guard));
        assert_eq!(classifier.classify("use_guards"), Some(AnnotationRole::Guard));
        assert_eq!(classifier.classify("Get"), Some(AnnotationRole::Get));
        assert_eq!(classifier.classify("Injectable"), None);
    }

    #[test]
    fn test_overrides_replace_default_roles() {
        let mut overrides = IndexMap::new();
        overrides.insert("Route".to_string(), AnnotationRole::Controller);
        overrides.insert("Roles".to_string(), AnnotationRole::Public);

        let classifier = AnnotationClassifier::default().with_overrides(&overrides);

        assert!(classifier.is("route", AnnotationRole::Controller));
        assert!(classifier.is("roles", AnnotationRole::Public));
        assert!(classifier.is("controller", AnnotationRole::Controller));
    }

    #[test]
    fn test_role_projections() {
        assert_eq!(AnnotationRole::Patch.http_method(), Some(HttpMethod::Patch));
        assert_eq!(AnnotationRole::Body.http_method(), None);
        assert_eq!(
            AnnotationRole::HeaderParam.parameter_location(),
            Some(ParameterLocation::Header)
        );
        assert_eq!(AnnotationRole::Body.parameter_location(), None);
    }
}
