use crate::category::get_categories;
use crate::config::{GeneratorConfig, ServerConfig};
use crate::extractor::{combine_paths, ControllerDescriptor, HttpMethod, RouteDescriptor};
use crate::schema_generator::{Schema, SchemaGenerator};
use crate::type_resolver::TypeArena;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// OpenAPI version of generated documents
pub const OPENAPI_VERSION: &str = "3.0.3";

/// Name of the bearer security scheme
pub const BEARER_SCHEME: &str = "bearerAuth";

/// OpenAPI document builder
pub struct OpenApiBuilder<'a> {
    config: &'a GeneratorConfig,
    schema_gen: SchemaGenerator<'a>,
    /// Paths collection (URL path -> PathItem)
    paths: BTreeMap<String, PathItem>,
}

/// OpenAPI Info object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI Server object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI Tag object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI PathItem object - represents all operations for a single path
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
}

impl PathItem {
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
        }
    }

    fn slot(&mut self, method: HttpMethod) -> &mut Option<Operation> {
        match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Patch => &mut self.patch,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Options => &mut self.options,
            HttpMethod::Head => &mut self.head,
        }
    }
}

/// OpenAPI Operation object - represents a single API operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub summary: String,
    #[serde(rename = "operationId")]
    pub operation_id: String,
    /// Parameters (path, query, header)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    pub responses: BTreeMap<String, Response>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<BTreeMap<String, Vec<String>>>>,
    /// Access-control guards, verbatim
    #[serde(rename = "x-guards", default, skip_serializing_if = "Vec::is_empty")]
    pub guards: Vec<String>,
}

/// OpenAPI Parameter object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// Parameter location (path, query, header)
    #[serde(rename = "in")]
    pub location: String,
    pub required: bool,
    pub schema: Schema,
}

/// OpenAPI RequestBody object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestBody {
    pub required: bool,
    pub content: BTreeMap<String, MediaType>,
}

/// OpenAPI MediaType object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaType {
    pub schema: Schema,
}

/// OpenAPI Response object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<BTreeMap<String, MediaType>>,
}

/// OpenAPI SecurityScheme object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityScheme {
    #[serde(rename = "type")]
    pub scheme_type: String,
    pub scheme: String,
    #[serde(rename = "bearerFormat", skip_serializing_if = "Option::is_none")]
    pub bearer_format: Option<String>,
}

/// OpenAPI Components object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Components {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schemas: Option<BTreeMap<String, Schema>>,
    #[serde(rename = "securitySchemes", skip_serializing_if = "Option::is_none")]
    pub security_schemes: Option<BTreeMap<String, SecurityScheme>>,
}

/// Complete OpenAPI document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenApiDocument {
    pub openapi: String,
    pub info: Info,
    pub servers: Vec<Server>,
    pub tags: Vec<Tag>,
    pub paths: BTreeMap<String, PathItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
}

/// Assembles the document for a set of controllers.
///
/// # Arguments
///
/// * `controllers` - Extracted controllers, after category mapping
/// * `arena` - Named types the controllers' descriptors refer to
/// * `config` - Info block, prefixes, versioning, servers and security options
///
/// # Returns
///
/// A complete OpenAPI 3.0.3 document. Paths and components are ordered by
/// name, so equal input produces equal output.
pub fn generate(
    controllers: &[ControllerDescriptor],
    arena: &TypeArena,
    config: &GeneratorConfig,
) -> OpenApiDocument {
    let mut builder = OpenApiBuilder::new(config, arena);
    for controller in controllers {
        builder.add_controller(controller);
    }
    builder.build(controllers)
}

impl<'a> OpenApiBuilder<'a> {
    /// Creates an empty builder.
    ///
    /// # Arguments
    ///
    /// * `config` - Generator configuration the document follows
    /// * `arena` - Named types that `$ref`s are generated from
    pub fn new(config: &'a GeneratorConfig, arena: &'a TypeArena) -> Self {
        debug!("Initializing OpenApiBuilder");
        Self {
            config,
            schema_gen: SchemaGenerator::new(arena),
            paths: BTreeMap::new(),
        }
    }

    /// Add every route of a controller
    pub fn add_controller(&mut self, controller: &ControllerDescriptor) {
        for route in &controller.routes {
            self.add_route(controller, route);
        }
    }

    /// Add a route to the OpenAPI document.
    ///
    /// The path template comes from [`route_path`]. The operation gets:
    /// - Path, query and header parameters in declaration order
    /// - A request body for POST, PUT and PATCH when a body type resolved
    /// - The 200, 400, 401 and 500 responses
    /// - Bearer security unless security is disabled or the route is public
    /// - Controller guards followed by route guards as `x-guards`
    ///
    /// A second route with the same path and verb replaces the first, with a
    /// warning.
    pub fn add_route(&mut self, controller: &ControllerDescriptor, route: &RouteDescriptor) {
        let openapi_path = route_path(controller, route, self.config);
        debug!("Adding route: {} {}", route.method, openapi_path);

        let parameters = route
            .parameters
            .iter()
            .map(|p| Parameter {
                name: p.name.clone(),
                location: p.location.as_str().to_string(),
                required: p.required,
                schema: self.schema_gen.generate_schema(&p.ty),
            })
            .collect();

        let request_body = match &route.request_body {
            Some(body) if route.method.is_mutating() => Some(RequestBody {
                required: true,
                content: json_content(self.schema_gen.generate_schema(body)),
            }),
            _ => None,
        };

        let success = Response {
            description: "Successful response".to_string(),
            content: route
                .response
                .as_ref()
                .map(|ty| json_content(self.schema_gen.generate_schema(ty))),
        };

        let mut responses = BTreeMap::new();
        responses.insert("200".to_string(), success);
        for (status, description) in [
            ("400", "Bad request"),
            ("401", "Unauthorized"),
            ("500", "Internal server error"),
        ] {
            responses.insert(
                status.to_string(),
                Response {
                    description: description.to_string(),
                    content: None,
                },
            );
        }

        let security = if self.config.include_security && !route.is_public {
            Some(vec![BTreeMap::from([(BEARER_SCHEME.to_string(), Vec::new())])])
        } else {
            None
        };

        let mut guards = controller.guards.clone();
        guards.extend(route.guards.iter().cloned());

        let operation = Operation {
            tags: if controller.category.is_empty() {
                Vec::new()
            } else {
                vec![controller.category.clone()]
            },
            summary: route
                .docs
                .clone()
                .unwrap_or_else(|| format!("{} {}", route.method, openapi_path)),
            operation_id: format!("{}_{}", controller.name, route.name),
            parameters,
            request_body,
            responses,
            security,
            guards,
        };

        let slot = self.paths.entry(openapi_path.clone()).or_default().slot(route.method);
        if slot.is_some() {
            warn!("Duplicate operation {} {}; keeping the last one", route.method, openapi_path);
        }
        *slot = Some(operation);
    }

    /// Build the final OpenAPI document.
    ///
    /// # Arguments
    ///
    /// * `controllers` - The controllers whose categories become tags and
    ///   whose versions become servers
    pub fn build(self, controllers: &[ControllerDescriptor]) -> OpenApiDocument {
        debug!("Building final OpenAPI document");

        let schemas = self.schema_gen.into_schemas();
        let security_schemes = self.config.include_security.then(|| {
            BTreeMap::from([(
                BEARER_SCHEME.to_string(),
                SecurityScheme {
                    scheme_type: "http".to_string(),
                    scheme: "bearer".to_string(),
                    bearer_format: Some("JWT".to_string()),
                },
            )])
        });

        let components = if schemas.is_empty() && security_schemes.is_none() {
            None
        } else {
            Some(Components {
                schemas: if schemas.is_empty() { None } else { Some(schemas) },
                security_schemes,
            })
        };

        let document = OpenApiDocument {
            openapi: OPENAPI_VERSION.to_string(),
            info: Info {
                title: self.config.info.title.clone(),
                version: self.config.info.version.clone(),
                description: self.config.info.description.clone(),
            },
            servers: servers(controllers, self.config),
            tags: tags(controllers),
            paths: self.paths,
            components,
        };

        info!(
            "Built document: {} paths, {} tags, {} servers",
            document.paths.len(),
            document.tags.len(),
            document.servers.len()
        );
        document
    }
}

fn json_content(schema: Schema) -> BTreeMap<String, MediaType> {
    BTreeMap::from([("application/json".to_string(), MediaType { schema })])
}

/// Full path template of a route under the configured versioning policy.
///
/// With versioning enabled, a controller with a detected version is placed
/// under `{prefix}/{version}` and one without under the fallback, if any.
/// Every other case uses the global prefix. Placeholders are converted last.
pub fn route_path(
    controller: &ControllerDescriptor,
    route: &RouteDescriptor,
    config: &GeneratorConfig,
) -> String {
    let versioning = &config.versioning;
    let fallback = versioning.fallback.as_deref().filter(|f| !f.trim().is_empty());

    let combined = match (&controller.version, fallback) {
        (Some(version), _) if versioning.enabled => combine_paths(&[
            versioning.prefix.as_str(),
            version.as_str(),
            controller.base_path.as_str(),
            route.path.as_str(),
        ]),
        (None, Some(fallback)) if versioning.enabled => {
            combine_paths(&[fallback, controller.base_path.as_str(), route.path.as_str()])
        }
        _ => combine_paths(&[
            config.global_prefix.as_str(),
            controller.base_path.as_str(),
            route.path.as_str(),
        ]),
    };

    convert_path_format(&combined)
}

/// Convert `:param` placeholders to OpenAPI `{param}` form
pub fn convert_path_format(path: &str) -> String {
    path.split('/')
        .map(|part| match part.strip_prefix(':') {
            Some(name) if !name.is_empty() => format!("{{{}}}", name),
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// One tag per distinct category, sorted by name
fn tags(controllers: &[ControllerDescriptor]) -> Vec<Tag> {
    get_categories(controllers)
        .into_iter()
        .map(|category| {
            let description = controllers
                .iter()
                .filter(|c| c.category == category)
                .find_map(|c| c.docs.as_deref().and_then(|d| d.lines().next()))
                .map(|line| line.trim().to_string())
                .filter(|line| !line.is_empty())
                .unwrap_or_else(|| format!("{} related endpoints", category));
            Tag {
                name: category,
                description: Some(description),
            }
        })
        .collect()
}

/// Server list: explicit servers win, then versioning, then the global prefix,
/// then the base URL or the relative root
fn servers(controllers: &[ControllerDescriptor], config: &GeneratorConfig) -> Vec<Server> {
    if !config.servers.is_empty() {
        return config.servers.iter().map(server_from_config).collect();
    }

    let versioning = &config.versioning;
    let mut servers = Vec::new();

    if versioning.enabled {
        let versions: BTreeSet<&str> = controllers
            .iter()
            .filter_map(|c| c.version.as_deref())
            .collect();

        if !versions.is_empty() {
            servers.extend(versions.into_iter().map(|version| Server {
                url: combine_paths(&[versioning.prefix.as_str(), version]),
                description: Some(format!("API {}", version.to_uppercase())),
            }));
        } else if let Some(fallback) = versioning.fallback.as_deref().filter(|f| !f.trim().is_empty())
        {
            servers.push(Server {
                url: combine_paths(&[fallback]),
                description: Some("API (unversioned)".to_string()),
            });
        }
    } else if !config.global_prefix.trim_matches('/').is_empty() {
        servers.push(Server {
            url: combine_paths(&[config.global_prefix.as_str()]),
            description: Some("API".to_string()),
        });
    }

    if servers.is_empty() {
        servers.push(match &config.base_url {
            Some(base_url) => Server {
                url: base_url.clone(),
                description: Some("Configured base URL".to_string()),
            },
            None => Server {
                url: "/".to_string(),
                description: Some("Relative to the host".to_string()),
            },
        });
    }

    servers
}

fn server_from_config(server: &ServerConfig) -> Server {
    Server {
        url: server.url.clone(),
        description: server.description.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VersioningConfig;
    use crate::extractor::{ParameterDescriptor, ParameterLocation};
    use crate::type_resolver::{PrimitiveKind, TypeDescriptor};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn route(method: HttpMethod, path: &str) -> RouteDescriptor {
        RouteDescriptor {
            name: "handler".to_string(),
            method,
            path: path.to_string(),
            docs: None,
            parameters: vec![],
            request_body: None,
            response: None,
            guards: vec![],
            is_public: false,
        }
    }

    fn controller(base_path: &str, version: Option<&str>, routes: Vec<RouteDescriptor>) -> ControllerDescriptor {
        ControllerDescriptor {
            name: "TestController".to_string(),
            base_path: base_path.to_string(),
            source_path: PathBuf::from("src/test.rs"),
            category: "Test".to_string(),
            version: version.map(str::to_string),
            docs: None,
            routes,
            guards: vec![],
        }
    }

    fn versioned(prefix: &str, fallback: Option<&str>) -> GeneratorConfig {
        GeneratorConfig {
            versioning: VersioningConfig {
                enabled: true,
                prefix: prefix.to_string(),
                fallback: fallback.map(str::to_string),
            },
            ..Default::default()
        }
    }

    fn user_object() -> TypeDescriptor {
        TypeDescriptor::Object {
            name: Some("User".to_string()),
            properties: vec![],
        }
    }

    #[test]
    fn test_convert_path_format() {
        assert_eq!(
            convert_path_format("/users/:userId/resource/:resourceId"),
            "/users/{userId}/resource/{resourceId}"
        );
        assert_eq!(convert_path_format("/users/{id}"), "/users/{id}");
        assert_eq!(convert_path_format("/"), "/");
    }

    #[test]
    fn test_versioning_precedence() {
        let r = route(HttpMethod::Get, "profile");
        let config = versioned("/api", Some("/legacy"));

        let with_version = controller("admin", Some("v1"), vec![]);
        assert_eq!(route_path(&with_version, &r, &config), "/api/v1/admin/profile");

        let without_version = controller("admin", None, vec![]);
        assert_eq!(route_path(&without_version, &r, &config), "/legacy/admin/profile");

        let mut plain = GeneratorConfig {
            global_prefix: "/api".to_string(),
            ..Default::default()
        };
        assert_eq!(route_path(&with_version, &r, &plain), "/api/admin/profile");
        plain.global_prefix = String::new();
        assert_eq!(route_path(&with_version, &r, &plain), "/admin/profile");

        let no_fallback = versioned("/api", None);
        assert_eq!(route_path(&without_version, &r, &no_fallback), "/admin/profile");
    }

    #[test]
    fn test_operation_shape() {
        let mut get = route(HttpMethod::Get, ":id");
        get.response = Some(user_object());
        get.request_body = Some(user_object());
        get.parameters = vec![ParameterDescriptor {
            name: "id".to_string(),
            location: ParameterLocation::Path,
            ty: TypeDescriptor::Primitive {
                kind: PrimitiveKind::Integer,
                format: Some("int32".to_string()),
            },
            required: true,
        }];
        let mut post = route(HttpMethod::Post, "");
        post.name = "create".to_string();
        post.request_body = Some(user_object());
        post.guards = vec!["AdminGuard".to_string()];

        let mut users = controller("users", None, vec![get, post]);
        users.guards = vec!["JwtGuard".to_string()];
        let config = GeneratorConfig::default();
        let document = generate(&[users], &TypeArena::default(), &config);

        let item = &document.paths["/users/{id}"];
        let get = item.operation(HttpMethod::Get).unwrap();
        assert_eq!(get.summary, "GET /users/{id}");
        assert_eq!(get.operation_id, "TestController_handler");
        assert_eq!(get.tags, vec!["Test".to_string()]);
        assert!(get.request_body.is_none());
        let keys: Vec<&String> = get.responses.keys().collect();
        assert_eq!(keys, vec!["200", "400", "401", "500"]);
        assert!(get.responses["200"].content.is_some());
        assert!(get.responses["400"].content.is_none());
        assert_eq!(get.parameters[0].location, "path");

        let post = document.paths["/users"].operation(HttpMethod::Post).unwrap();
        assert!(post.request_body.is_some());
        assert!(post.responses["200"].content.is_none());
        assert_eq!(post.guards, vec!["JwtGuard".to_string(), "AdminGuard".to_string()]);

        let schemas = document.components.unwrap().schemas.unwrap();
        assert!(schemas.contains_key("User"));
    }

    #[test]
    fn test_security_defaults_and_public_routes() {
        let mut public = route(HttpMethod::Get, "health");
        public.is_public = true;
        let private = route(HttpMethod::Get, "me");
        let controllers = vec![controller("", None, vec![public, private])];

        let document = generate(&controllers, &TypeArena::default(), &GeneratorConfig::default());
        let schemes = document.components.as_ref().unwrap().security_schemes.as_ref().unwrap();
        assert_eq!(schemes[BEARER_SCHEME].scheme, "bearer");
        assert!(document.paths["/health"].get.as_ref().unwrap().security.is_none());
        assert!(document.paths["/me"].get.as_ref().unwrap().security.is_some());

        let config = GeneratorConfig {
            include_security: false,
            ..Default::default()
        };
        let document = generate(&controllers, &TypeArena::default(), &config);
        assert!(document.components.is_none());
        assert!(document.paths["/me"].get.as_ref().unwrap().security.is_none());
    }

    #[test]
    fn test_server_rules() {
        let v1 = controller("a", Some("v1"), vec![]);
        let v2 = controller("b", Some("v2"), vec![]);
        let none = controller("c", None, vec![]);

        let servers_for = |controllers: &[ControllerDescriptor], config: &GeneratorConfig| {
            servers(controllers, config)
                .into_iter()
                .map(|s| s.url)
                .collect::<Vec<_>>()
        };

        let config = versioned("/api", Some("/legacy"));
        assert_eq!(
            servers_for(&[v2.clone(), v1.clone(), v1.clone()], &config),
            vec!["/api/v1", "/api/v2"]
        );
        assert_eq!(servers_for(&[none.clone()], &config), vec!["/legacy"]);
        assert_eq!(servers_for(&[none.clone()], &versioned("/api", None)), vec!["/"]);

        let prefixed = GeneratorConfig {
            global_prefix: "api/".to_string(),
            ..Default::default()
        };
        assert_eq!(servers_for(&[v1.clone()], &prefixed), vec!["/api"]);

        let based = GeneratorConfig {
            base_url: Some("https://example.com".to_string()),
            ..Default::default()
        };
        assert_eq!(servers_for(&[none.clone()], &based), vec!["https://example.com"]);

        let explicit = GeneratorConfig {
            servers: vec![ServerConfig {
                url: "https://prod.example.com".to_string(),
                description: None,
            }],
            ..versioned("/api", Some("/legacy"))
        };
        assert_eq!(servers_for(&[v1], &explicit), vec!["https://prod.example.com"]);
    }

    #[test]
    fn test_tags_sorted_with_descriptions() {
        let mut a = controller("a", None, vec![]);
        a.category = "Users".to_string();
        let mut b = controller("b", None, vec![]);
        b.category = "Admin".to_string();
        b.docs = Some("Administration\nMore text".to_string());
        let mut c = controller("c", None, vec![]);
        c.category = "Users".to_string();
        let mut d = controller("d", None, vec![]);
        d.category = String::new();

        let tags = tags(&[a, b, c, d]);
        assert_eq!(
            tags,
            vec![
                Tag {
                    name: "Admin".to_string(),
                    description: Some("Administration".to_string()),
                },
                Tag {
                    name: "Users".to_string(),
                    description: Some("Users related endpoints".to_string()),
                },
            ]
        );
    }
}
