use crate::classifier::{AnnotationClassifier, AnnotationRole};
use crate::error::{Error, Result};
use crate::extractor::{HttpMethod, ParameterDescriptor, ParameterLocation, RouteDescriptor};
use crate::source::{Annotation, AnnotationArg, ClassDecl, MethodDecl, ParamDecl};
use crate::type_resolver::TypeResolver;
use log::debug;

/// Route extractor - turns the verb-annotated methods of a controller into routes
pub struct RouteExtractor<'c> {
    classifier: &'c AnnotationClassifier,
}

impl<'c> RouteExtractor<'c> {
    pub fn new(classifier: &'c AnnotationClassifier) -> Self {
        Self { classifier }
    }

    /// Extract one route per method carrying an HTTP verb annotation, in
    /// declaration order. Methods without one are not routes.
    pub fn extract_routes(
        &self,
        class: &ClassDecl,
        resolver: &mut TypeResolver<'_>,
    ) -> Result<Vec<RouteDescriptor>> {
        let class_public = self.has_role(&class.annotations, AnnotationRole::Public);
        let mut routes = Vec::new();

        for method in &class.methods {
            let Some((annotation, verb)) = self.verb_annotation(method) else {
                debug!("{}::{} is not a route", class.name, method.name);
                continue;
            };

            let path = literal_path(annotation).map_err(|expr| Error::ExtractionError {
                class: class.name.clone(),
                message: format!(
                    "route {} has a non-literal path argument: {}",
                    method.name, expr
                ),
            })?;

            let mut route = self.extract_route(method, verb, path, resolver);
            route.is_public |= class_public;

            debug!("Found route: {} {} -> {}::{}", route.method, route.path, class.name, route.name);
            routes.push(route);
        }

        Ok(routes)
    }

    fn extract_route(
        &self,
        method: &MethodDecl,
        verb: HttpMethod,
        path: String,
        resolver: &mut TypeResolver<'_>,
    ) -> RouteDescriptor {
        let parameters = method
            .params
            .iter()
            .filter_map(|param| self.parameter(param, resolver))
            .collect();

        let request_body = method
            .params
            .iter()
            .find(|param| self.has_role(&param.annotations, AnnotationRole::Body))
            .and_then(|param| resolver.resolve_body(&param.ty));

        let response = method
            .return_type
            .as_ref()
            .and_then(|ty| resolver.resolve_body(ty));

        RouteDescriptor {
            name: method.name.clone(),
            method: verb,
            path,
            docs: method.docs.as_deref().and_then(first_line),
            parameters,
            request_body,
            response,
            guards: guard_arguments(self.classifier, &method.annotations),
            is_public: self.has_role(&method.annotations, AnnotationRole::Public),
        }
    }

    fn parameter(
        &self,
        param: &ParamDecl,
        resolver: &TypeResolver<'_>,
    ) -> Option<ParameterDescriptor> {
        let (annotation, location) = param.annotations.iter().find_map(|annotation| {
            let location = self.classifier.classify(&annotation.name)?.parameter_location()?;
            Some((annotation, location))
        })?;

        let name = match annotation.first_arg() {
            Some(AnnotationArg::Str(name)) if !name.is_empty() => name.clone(),
            _ => param.name.clone(),
        };

        Some(ParameterDescriptor {
            name,
            location,
            ty: resolver.parameter_descriptor(&param.ty),
            required: location == ParameterLocation::Path || !param.optional,
        })
    }

    fn verb_annotation<'m>(&self, method: &'m MethodDecl) -> Option<(&'m Annotation, HttpMethod)> {
        method.annotations.iter().find_map(|annotation| {
            let verb = self.classifier.classify(&annotation.name)?.http_method()?;
            Some((annotation, verb))
        })
    }

    fn has_role(&self, annotations: &[Annotation], role: AnnotationRole) -> bool {
        annotations
            .iter()
            .any(|annotation| self.classifier.is(&annotation.name, role))
    }
}

/// Path argument of a controller or verb annotation.
///
/// No argument is the empty path. Anything other than a string literal is
/// returned as the error, verbatim.
pub(crate) fn literal_path(annotation: &Annotation) -> std::result::Result<String, String> {
    match annotation.first_arg() {
        None => Ok(String::new()),
        Some(AnnotationArg::Str(path)) => Ok(path.clone()),
        Some(AnnotationArg::Expr { expr }) => Err(expr.clone()),
    }
}

/// Verbatim arguments of every guard annotation; a bare guard contributes its
/// own name.
pub(crate) fn guard_arguments(
    classifier: &AnnotationClassifier,
    annotations: &[Annotation],
) -> Vec<String> {
    annotations
        .iter()
        .filter(|annotation| classifier.is(&annotation.name, AnnotationRole::Guard))
        .flat_map(|annotation| {
            if annotation.args.is_empty() {
                vec![annotation.name.clone()]
            } else {
                annotation.args.iter().map(|arg| arg.text().to_string()).collect()
            }
        })
        .collect()
}

fn first_line(docs: &str) -> Option<String> {
    docs.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}
