use crate::category::{module_category, PathHeuristic};
use crate::classifier::{AnnotationClassifier, AnnotationRole};
use crate::error::{Error, Result};
use crate::extractor::route::{guard_arguments, literal_path, RouteExtractor};
use crate::extractor::{infer_version, ControllerDescriptor};
use crate::source::{ClassDecl, SourceModel, SourceUnit};
use crate::type_resolver::{TypeArena, TypeResolver};
use log::{debug, info, warn};

/// Controller extractor - finds controller classes and builds their descriptors
pub struct ControllerExtractor {
    classifier: AnnotationClassifier,
    heuristic: PathHeuristic,
}

/// Controllers of one scan, with the named types their routes refer to
#[derive(Debug, Default)]
pub struct Extraction {
    pub controllers: Vec<ControllerDescriptor>,
    pub arena: TypeArena,
}

impl ControllerExtractor {
    pub fn new(classifier: AnnotationClassifier) -> Self {
        Self {
            classifier,
            heuristic: PathHeuristic::default(),
        }
    }

    /// Replaces the category path heuristic
    pub fn with_heuristic(mut self, heuristic: PathHeuristic) -> Self {
        self.heuristic = heuristic;
        self
    }

    pub fn classifier(&self) -> &AnnotationClassifier {
        &self.classifier
    }

    /// Extract every controller of the resolver's source model.
    ///
    /// A class that fails extraction is dropped with a warning; the scan goes on.
    pub fn extract(&self, mut resolver: TypeResolver<'_>) -> Extraction {
        let model = resolver.model();
        let mut controllers = Vec::new();

        for unit in model.units() {
            for class in &unit.classes {
                if !self.is_controller(class) {
                    continue;
                }

                match self.extract_controller(model, unit, class, &mut resolver) {
                    Ok(controller) => {
                        debug!(
                            "Controller {} at {:?}: {} routes, category {:?}, version {:?}",
                            controller.name,
                            controller.base_path,
                            controller.routes.len(),
                            controller.category,
                            controller.version
                        );
                        controllers.push(controller);
                    }
                    Err(e) => warn!("Skipping {}: {}", class.name, e),
                }
            }
        }

        info!("Extracted {} controllers", controllers.len());

        Extraction {
            controllers,
            arena: resolver.into_arena(),
        }
    }

    fn is_controller(&self, class: &ClassDecl) -> bool {
        class
            .annotations
            .iter()
            .any(|a| self.classifier.is(&a.name, AnnotationRole::Controller))
    }

    fn extract_controller(
        &self,
        model: &dyn SourceModel,
        unit: &SourceUnit,
        class: &ClassDecl,
        resolver: &mut TypeResolver<'_>,
    ) -> Result<ControllerDescriptor> {
        let annotation = class
            .annotations
            .iter()
            .find(|a| self.classifier.is(&a.name, AnnotationRole::Controller))
            .ok_or_else(|| Error::ExtractionError {
                class: class.name.clone(),
                message: "missing controller annotation".to_string(),
            })?;

        let base_path = literal_path(annotation).map_err(|expr| Error::ExtractionError {
            class: class.name.clone(),
            message: format!("non-literal base path argument: {}", expr),
        })?;

        let category = match model.owning_module(&class.name) {
            Some(module) => module_category(&module.name),
            None => self.heuristic.infer(&unit.path),
        };

        let routes = RouteExtractor::new(&self.classifier).extract_routes(class, resolver)?;

        Ok(ControllerDescriptor {
            name: class.name.clone(),
            base_path,
            source_path: unit.path.clone(),
            category,
            version: infer_version(&unit.path),
            docs: class.docs.clone(),
            routes,
            guards: guard_arguments(&self.classifier, &class.annotations),
        })
    }
}
