use crate::type_resolver::{PropertyDescriptor, TypeArena, TypeDescriptor};
use crate::validator::ConstraintSet;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Schema generator - converts type descriptors to OpenAPI schemas
pub struct SchemaGenerator<'a> {
    /// Named types, used to emit the components references point to
    arena: &'a TypeArena,
    /// Generated component schemas, keyed by component name
    schemas: BTreeMap<String, Schema>,
    /// Components whose schema is being generated
    in_progress: HashSet<String>,
    /// Component name assigned to each type identity
    names: HashMap<String, String>,
    /// Identity owning each assigned component name
    owners: HashMap<String, String>,
}

/// OpenAPI Schema definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Reference to a component schema
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// The type of the schema (string, integer, object, array, etc.)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Properties for object types, in declaration order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, Schema>>,
    /// Required property names for object types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    /// Items schema for array types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(rename = "minLength", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(rename = "minItems", skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(rename = "maxItems", skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    /// Negated schema, used for excluded values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

impl Schema {
    /// Schema of the given type, with nothing else set
    pub fn of_type(schema_type: &str) -> Self {
        Schema {
            schema_type: Some(schema_type.to_string()),
            ..Default::default()
        }
    }

    pub fn reference(component: &str) -> Self {
        Schema {
            reference: Some(format!("#/components/schemas/{}", component)),
            ..Default::default()
        }
    }
}

impl<'a> SchemaGenerator<'a> {
    /// Create a new SchemaGenerator over the named types of a scan
    pub fn new(arena: &'a TypeArena) -> Self {
        debug!("Initializing SchemaGenerator over {} named types", arena.len());
        Self {
            arena,
            schemas: BTreeMap::new(),
            in_progress: HashSet::new(),
            names: HashMap::new(),
            owners: HashMap::new(),
        }
    }

    /// Generate a schema for a type descriptor.
    ///
    /// Named objects and named enums become components and are returned as
    /// `$ref`s; everything else is inlined.
    pub fn generate_schema(&mut self, ty: &TypeDescriptor) -> Schema {
        match ty {
            TypeDescriptor::Primitive { kind, format } => Schema {
                format: format.clone(),
                ..Schema::of_type(kind.as_str())
            },
            TypeDescriptor::Array(element) => Schema {
                items: Some(Box::new(self.generate_schema(element))),
                ..Schema::of_type("array")
            },
            TypeDescriptor::Enum { name: None, values } => enum_schema(values),
            TypeDescriptor::Enum {
                name: Some(identity),
                values,
            } => self.ensure_component(identity, |_| enum_schema(values)),
            TypeDescriptor::Object { name: None, properties } => self.object_schema(properties),
            TypeDescriptor::Object {
                name: Some(identity),
                properties,
            } => {
                self.ensure_component(identity, |generator| generator.object_schema(properties))
            }
            TypeDescriptor::Reference(identity) => self.reference_schema(identity),
        }
    }

    /// Component schemas generated so far, ordered by name
    pub fn get_schemas(&self) -> &BTreeMap<String, Schema> {
        &self.schemas
    }

    pub fn into_schemas(self) -> BTreeMap<String, Schema> {
        self.schemas
    }

    /// Emits the component for `identity` unless it exists or is being
    /// generated, and returns a reference to it
    fn ensure_component(
        &mut self,
        identity: &str,
        build: impl FnOnce(&mut Self) -> Schema,
    ) -> Schema {
        let component = self.component_for(identity);

        if !self.schemas.contains_key(&component) && !self.in_progress.contains(&component) {
            debug!("Generating component schema: {}", component);
            self.in_progress.insert(component.clone());
            let schema = build(self);
            self.in_progress.remove(&component);
            self.schemas.insert(component.clone(), schema);
        }

        Schema::reference(&component)
    }

    fn reference_schema(&mut self, identity: &str) -> Schema {
        let arena = self.arena;
        match arena.get(identity) {
            Some(TypeDescriptor::Object {
                name: Some(name),
                properties,
            }) if name == identity => {
                self.ensure_component(identity, |generator| generator.object_schema(properties))
            }
            Some(TypeDescriptor::Enum {
                name: Some(name),
                values,
            }) if name == identity => self.ensure_component(identity, |_| enum_schema(values)),
            // A named union stands for the member it narrowed to
            Some(descriptor @ TypeDescriptor::Object { name: Some(_), .. })
            | Some(descriptor @ TypeDescriptor::Enum { name: Some(_), .. }) => {
                self.generate_schema(descriptor)
            }
            Some(descriptor) => {
                self.ensure_component(identity, |generator| generator.generate_schema(descriptor))
            }
            None => {
                warn!("Reference to {} has no named type; emitting a free-form object", identity);
                self.ensure_component(identity, |_| Schema::of_type("object"))
            }
        }
    }

    /// Component name for `identity`, unique within this generator.
    ///
    /// Identities that sanitize to a name another identity already owns get a
    /// numeric suffix, in first-come order.
    fn component_for(&mut self, identity: &str) -> String {
        if let Some(component) = self.names.get(identity) {
            return component.clone();
        }

        let base = component_name(identity);
        let mut component = base.clone();
        let mut suffix = 2;
        while self.owners.contains_key(&component) {
            component = format!("{}_{}", base, suffix);
            suffix += 1;
        }

        if component != base {
            warn!("Component name {} is taken; using {} for {}", base, component, identity);
        }
        self.owners.insert(component.clone(), identity.to_string());
        self.names.insert(identity.to_string(), component.clone());
        component
    }

    fn object_schema(&mut self, properties: &[PropertyDescriptor]) -> Schema {
        let mut members = IndexMap::with_capacity(properties.len());
        let mut required = Vec::new();

        for property in properties {
            let mut schema = self.generate_schema(&property.ty);

            if schema.reference.is_none() {
                apply_constraints(&mut schema, &property.constraints);
                schema.description = property.docs.clone();
                schema.example = property.example.clone();
            } else if !property.constraints.is_empty() {
                debug!("Constraints on referenced property {} are not emitted", property.name);
            }

            if property.required {
                required.push(property.name.clone());
            }
            members.insert(property.name.clone(), schema);
        }

        Schema {
            properties: Some(members),
            required: if required.is_empty() { None } else { Some(required) },
            ..Schema::of_type("object")
        }
    }
}

fn enum_schema(values: &[String]) -> Schema {
    Schema {
        enum_values: Some(values.to_vec()),
        ..Schema::of_type("string")
    }
}

/// Maps a constraint set onto schema keywords
pub fn apply_constraints(schema: &mut Schema, constraints: &ConstraintSet) {
    if let Some(type_override) = &constraints.type_override {
        schema.schema_type = Some(type_override.clone());
    }
    if let Some(format) = &constraints.format {
        schema.format = Some(format.clone());
    }
    if constraints.min_length.is_some() {
        schema.min_length = constraints.min_length;
    }
    if constraints.max_length.is_some() {
        schema.max_length = constraints.max_length;
    }
    if let Some(pattern) = &constraints.pattern {
        schema.pattern = Some(pattern.clone());
    }
    if constraints.minimum.is_some() {
        schema.minimum = constraints.minimum;
    }
    if constraints.maximum.is_some() {
        schema.maximum = constraints.maximum;
    }
    if constraints.min_items.is_some() {
        schema.min_items = constraints.min_items;
    }
    if constraints.max_items.is_some() {
        schema.max_items = constraints.max_items;
    }
    if let Some(values) = &constraints.enum_values {
        schema.enum_values = Some(values.clone());
    }
    if let Some(values) = &constraints.not_in {
        schema.not = Some(Box::new(Schema {
            enum_values: Some(values.clone()),
            ..Default::default()
        }));
    }
}

/// Component name for a type identity: `Page<User>` becomes `Page_User` and
/// `Page<User[]>` becomes `Page_User_Array`
pub fn component_name(identity: &str) -> String {
    let identity = identity.replace("[]", "_Array");
    let mut name = String::with_capacity(identity.len());
    for c in identity.chars() {
        if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
            name.push(c);
        } else if !name.is_empty() && !name.ends_with('_') {
            name.push('_');
        }
    }
    name.trim_end_matches('_').to_string()
}
