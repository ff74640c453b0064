//! End-to-end wiring: source model in, document out.

use crate::category::apply_category_mapping;
use crate::classifier::AnnotationClassifier;
use crate::config::GeneratorConfig;
use crate::examples::{ExamplePolicy, NameHeuristicExamples, NoExamples};
use crate::extractor::ControllerExtractor;
use crate::openapi_builder::{generate, OpenApiDocument};
use crate::parser::AstParser;
use crate::scanner::FileScanner;
use crate::source::rust::RustSourceLoader;
use crate::source::{SourceModel, SourceTree};
use crate::type_resolver::TypeResolver;
use anyhow::Result;
use log::{info, warn};
use std::path::Path;

/// Runs extraction, category mapping and assembly over a source model.
pub fn generate_document(model: &dyn SourceModel, config: &GeneratorConfig) -> OpenApiDocument {
    let examples: Box<dyn ExamplePolicy> = if config.examples {
        Box::new(NameHeuristicExamples)
    } else {
        Box::new(NoExamples)
    };
    let resolver = TypeResolver::new(model)
        .with_wrappers(config.wrapper_types.clone())
        .with_examples(examples);

    let extractor =
        ControllerExtractor::new(config.classifier()).with_heuristic(config.path_heuristic());
    let mut extraction = extractor.extract(resolver);

    apply_category_mapping(&mut extraction.controllers, &config.category_mapping);

    generate(&extraction.controllers, &extraction.arena, config)
}

/// Scans and parses a Rust project into a source model.
///
/// Unit paths are made relative to `root`. Files that do not parse are skipped.
pub fn load_rust_project(root: &Path, classifier: &AnnotationClassifier) -> Result<SourceTree> {
    let scan = FileScanner::new(root.to_path_buf()).scan()?;
    info!("Found {} Rust files", scan.source_files.len());

    let mut parsed = AstParser::parse_all(&scan.source_files);
    let skipped = scan.source_files.len() - parsed.len();
    if skipped > 0 {
        warn!("Skipped {} files that could not be parsed", skipped);
    }

    for file in &mut parsed {
        if let Ok(relative) = file.path.strip_prefix(root) {
            file.path = relative.to_path_buf();
        }
    }

    let tree = RustSourceLoader::load(&parsed, classifier);
    info!("Loaded {} source units", tree.units.len());
    Ok(tree)
}
