use crate::examples::{ExamplePolicy, NameHeuristicExamples};
use crate::source::{PropertyDecl, SourceModel, TypeExpr, TypeShape};
use crate::validator::{extract_constraints, is_required, ConstraintSet};
use indexmap::IndexMap;
use log::{debug, warn};
use serde_json::Value;
use std::collections::HashSet;

/// Wrapper types unwrapped to their first type argument by default
pub const DEFAULT_WRAPPERS: &[&str] = &[
    "Promise",
    "Future",
    "BoxFuture",
    "Observable",
    "Json",
    "Result",
    "Box",
    "Arc",
    "Rc",
    "Cow",
];

/// Type resolver - turns declared type references into portable type descriptors
pub struct TypeResolver<'a> {
    /// Source model used to look up declarations
    model: &'a dyn SourceModel,
    /// Completed named types, keyed by identity
    arena: TypeArena,
    /// Named types currently being resolved, to detect circular references
    resolving_stack: HashSet<String>,
    /// Generic parameter bindings of the declarations being resolved
    scopes: Vec<Vec<(String, TypeExpr)>>,
    wrappers: Vec<String>,
    examples: Box<dyn ExamplePolicy>,
}

/// Portable description of a resolved type
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Primitive {
        kind: PrimitiveKind,
        format: Option<String>,
    },
    Array(Box<TypeDescriptor>),
    Enum {
        name: Option<String>,
        values: Vec<String>,
    },
    /// An object; named objects carry their arena identity
    Object {
        name: Option<String>,
        properties: Vec<PropertyDescriptor>,
    },
    /// A named type referenced from inside its own expansion
    Reference(String),
}

/// Property of an object descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    pub name: String,
    pub ty: TypeDescriptor,
    pub required: bool,
    pub docs: Option<String>,
    pub constraints: ConstraintSet,
    pub example: Option<Value>,
}

/// Primitive kinds supported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    String,
    Integer,
    Number,
    Boolean,
}

impl PrimitiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Integer => "integer",
            PrimitiveKind::Number => "number",
            PrimitiveKind::Boolean => "boolean",
        }
    }
}

impl TypeDescriptor {
    /// An object with no known members
    pub fn free_object() -> Self {
        TypeDescriptor::Object {
            name: None,
            properties: Vec::new(),
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeDescriptor::Primitive { .. })
    }
}

/// Named type descriptors, keyed by identity (e.g. `User`, `Page<User>`).
#[derive(Debug, Clone, Default)]
pub struct TypeArena {
    entries: IndexMap<String, TypeDescriptor>,
}

impl TypeArena {
    /// The completed descriptor for `identity`, if it has been resolved.
    ///
    /// A declared enumeration with payloads is stored under its own name but
    /// holds the descriptor of the member it narrowed to.
    pub fn get(&self, identity: &str) -> Option<&TypeDescriptor> {
        self.entries.get(identity)
    }

    /// Records the descriptor for `identity`, replacing any earlier one
    pub fn insert(&mut self, identity: String, descriptor: TypeDescriptor) {
        self.entries.insert(identity, descriptor);
    }

    /// Number of named types recorded
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in the order they were first recorded
    pub fn iter(&self) -> impl Iterator<Item = (&String, &TypeDescriptor)> {
        self.entries.iter()
    }
}

impl<'a> TypeResolver<'a> {
    /// Create a new TypeResolver over a source model
    pub fn new(model: &'a dyn SourceModel) -> Self {
        Self {
            model,
            arena: TypeArena::default(),
            resolving_stack: HashSet::new(),
            scopes: Vec::new(),
            wrappers: DEFAULT_WRAPPERS.iter().map(|w| w.to_string()).collect(),
            examples: Box::new(NameHeuristicExamples),
        }
    }

    /// Replaces the list of wrapper types
    pub fn with_wrappers(mut self, wrappers: Vec<String>) -> Self {
        self.wrappers = wrappers;
        self
    }

    /// Replaces the example policy
    pub fn with_examples(mut self, examples: Box<dyn ExamplePolicy>) -> Self {
        self.examples = examples;
        self
    }

    pub fn model(&self) -> &'a dyn SourceModel {
        self.model
    }

    /// Named types resolved so far
    pub fn arena(&self) -> &TypeArena {
        &self.arena
    }

    pub fn into_arena(self) -> TypeArena {
        self.arena
    }

    /// Resolve a type reference; `None` means the type is absent or unresolvable
    pub fn resolve(&mut self, ty: &TypeExpr) -> Option<TypeDescriptor> {
        let ty = self.substitute(ty);
        debug!("Resolving type: {}", ty);

        match self.model.resolve_type(&ty) {
            TypeShape::Void | TypeShape::Null => None,
            TypeShape::Primitive(name) => primitive_descriptor(&name),
            TypeShape::Array(element) => {
                let element = self
                    .resolve(&element)
                    .unwrap_or_else(TypeDescriptor::free_object);
                Some(TypeDescriptor::Array(Box::new(element)))
            }
            TypeShape::Enum { name, values } => {
                let descriptor = TypeDescriptor::Enum {
                    name: name.clone(),
                    values,
                };
                if let Some(name) = name {
                    self.arena.insert(name, descriptor.clone());
                }
                Some(descriptor)
            }
            TypeShape::Union {
                name: Some(name),
                members,
            } => self.resolve_named_union(name, &members),
            TypeShape::Union {
                name: None,
                members,
            } => self.narrow_union(&members, None),
            TypeShape::Generic { name, args } => {
                if self.is_wrapper(&name) {
                    // Wrappers unwrap to their first argument; none means void
                    let inner = args.first()?;
                    self.resolve(inner)
                } else {
                    debug!("Generic type {} is not declared; leaving it undocumented", ty);
                    None
                }
            }
            TypeShape::Object {
                name: Some(_),
                bindings,
                properties,
            } => self.resolve_named_object(ty.to_string(), bindings, &properties),
            TypeShape::Object {
                name: None,
                properties,
                ..
            } => {
                if properties.is_empty() {
                    debug!("Inline type {} has no discoverable members", ty);
                    return None;
                }
                let properties = self.resolve_properties(&properties);
                Some(TypeDescriptor::Object {
                    name: None,
                    properties,
                })
            }
            TypeShape::Unknown(text) => {
                if !self.is_wrapper(&text) {
                    debug!("Could not resolve type: {}", text);
                }
                None
            }
        }
    }

    /// Resolve a request or response body type; bare primitives are not bodies
    pub fn resolve_body(&mut self, ty: &TypeExpr) -> Option<TypeDescriptor> {
        self.resolve(ty).filter(|descriptor| !descriptor.is_primitive())
    }

    /// Shallow descriptor for a route parameter: primitive, array or enum only.
    ///
    /// Anything else, including a type met again while describing itself,
    /// falls back to a plain string.
    pub fn parameter_descriptor(&self, ty: &TypeExpr) -> TypeDescriptor {
        self.shallow_descriptor(ty, &mut HashSet::new())
    }

    fn shallow_descriptor(&self, ty: &TypeExpr, seen: &mut HashSet<String>) -> TypeDescriptor {
        let fallback = || TypeDescriptor::Primitive {
            kind: PrimitiveKind::String,
            format: None,
        };

        if !seen.insert(ty.to_string()) {
            debug!("Parameter type {} refers to itself", ty);
            return fallback();
        }

        match self.model.resolve_type(ty) {
            TypeShape::Primitive(name) => primitive_descriptor(&name).unwrap_or_else(fallback),
            TypeShape::Array(element) => {
                TypeDescriptor::Array(Box::new(self.shallow_descriptor(&element, seen)))
            }
            TypeShape::Enum { name, values } => TypeDescriptor::Enum { name, values },
            TypeShape::Union { members, .. } => members
                .iter()
                .find(|m| !matches!(self.model.resolve_type(m), TypeShape::Null | TypeShape::Void))
                .map(|m| self.shallow_descriptor(m, seen))
                .unwrap_or_else(fallback),
            _ => fallback(),
        }
    }

    fn is_wrapper(&self, name: &str) -> bool {
        self.wrappers.iter().any(|w| w == name)
    }

    fn resolve_named_object(
        &mut self,
        identity: String,
        bindings: Vec<(String, TypeExpr)>,
        properties: &[PropertyDecl],
    ) -> Option<TypeDescriptor> {
        if let Some(done) = self.arena.get(&identity) {
            debug!("Type {} found in arena", identity);
            return Some(done.clone());
        }

        // Check for circular reference
        if self.resolving_stack.contains(&identity) {
            warn!("Circular reference detected for type: {}", identity);
            return Some(TypeDescriptor::Reference(identity));
        }

        self.resolving_stack.insert(identity.clone());
        let bound = bindings
            .into_iter()
            .map(|(param, arg)| (param, self.substitute(&arg)))
            .collect();
        self.scopes.push(bound);

        let properties = self.resolve_properties(properties);

        self.scopes.pop();
        self.resolving_stack.remove(&identity);

        let descriptor = TypeDescriptor::Object {
            name: Some(identity.clone()),
            properties,
        };
        self.arena.insert(identity, descriptor.clone());
        Some(descriptor)
    }

    /// Resolves a declared enumeration whose variants carry payload types.
    ///
    /// The enumeration takes part in the cycle guard like a named object. A
    /// variant that leads back to the enumeration itself never wins.
    fn resolve_named_union(
        &mut self,
        identity: String,
        members: &[TypeExpr],
    ) -> Option<TypeDescriptor> {
        if let Some(done) = self.arena.get(&identity) {
            return Some(done.clone());
        }

        if self.resolving_stack.contains(&identity) {
            warn!("Circular reference detected for type: {}", identity);
            return Some(TypeDescriptor::Reference(identity));
        }

        self.resolving_stack.insert(identity.clone());
        let narrowed = self.narrow_union(members, Some(&identity));
        self.resolving_stack.remove(&identity);

        match &narrowed {
            Some(TypeDescriptor::Reference(_)) | None => {}
            Some(descriptor) => self.arena.insert(identity, descriptor.clone()),
        }
        narrowed
    }

    fn resolve_properties(&mut self, properties: &[PropertyDecl]) -> Vec<PropertyDescriptor> {
        let mut resolved = Vec::with_capacity(properties.len());

        for decl in properties {
            let constraints = extract_constraints(&decl.annotations);
            let ty = self
                .resolve(&decl.ty)
                .unwrap_or_else(TypeDescriptor::free_object);
            let example = self.examples.example_for(&decl.name, &ty);

            resolved.push(PropertyDescriptor {
                name: decl.name.clone(),
                required: is_required(decl, &constraints),
                docs: decl.docs.clone(),
                ty,
                constraints,
                example,
            });
        }

        debug!("Resolved {} properties", resolved.len());
        resolved
    }

    /// Picks one member of a union.
    ///
    /// Null and void members are skipped. A single remaining member is used
    /// as is; otherwise the first member that resolves to a non-empty or named
    /// object, a reference or a named enum wins and the rest are dropped.
    /// References back to `owner` are never picked.
    fn narrow_union(
        &mut self,
        members: &[TypeExpr],
        owner: Option<&str>,
    ) -> Option<TypeDescriptor> {
        let candidates: Vec<TypeExpr> = members
            .iter()
            .map(|m| self.substitute(m))
            .filter(|m| !matches!(self.model.resolve_type(m), TypeShape::Null | TypeShape::Void))
            .collect();
        let is_owner = |identity: &str| owner == Some(identity);

        if let [single] = candidates.as_slice() {
            return self
                .resolve(single)
                .filter(|d| !matches!(d, TypeDescriptor::Reference(r) if is_owner(r.as_str())));
        }

        for member in &candidates {
            match self.resolve(member) {
                Some(TypeDescriptor::Reference(identity)) if is_owner(identity.as_str()) => continue,
                Some(descriptor @ TypeDescriptor::Object { name: Some(_), .. })
                | Some(descriptor @ TypeDescriptor::Reference(_))
                | Some(descriptor @ TypeDescriptor::Enum { name: Some(_), .. }) => {
                    return Some(descriptor)
                }
                Some(TypeDescriptor::Object { name: None, properties }) if !properties.is_empty() => {
                    return Some(TypeDescriptor::Object {
                        name: None,
                        properties,
                    })
                }
                _ => continue,
            }
        }

        debug!("No member of union resolved; leaving it undocumented");
        None
    }

    /// Replaces bound generic parameters with their arguments
    fn substitute(&self, ty: &TypeExpr) -> TypeExpr {
        let Some(scope) = self.scopes.last() else {
            return ty.clone();
        };
        if scope.is_empty() {
            return ty.clone();
        }

        match ty {
            TypeExpr::Named { name, args } if args.is_empty() => scope
                .iter()
                .find(|(param, _)| param == name)
                .map(|(_, arg)| arg.clone())
                .unwrap_or_else(|| ty.clone()),
            TypeExpr::Named { name, args } => TypeExpr::Named {
                name: name.clone(),
                args: args.iter().map(|a| self.substitute(a)).collect(),
            },
            TypeExpr::Array(inner) => TypeExpr::Array(Box::new(self.substitute(inner))),
            TypeExpr::Union(members) => {
                TypeExpr::Union(members.iter().map(|m| self.substitute(m)).collect())
            }
            TypeExpr::Tuple(items) => {
                TypeExpr::Tuple(items.iter().map(|i| self.substitute(i)).collect())
            }
            TypeExpr::Inline(_) | TypeExpr::Unknown(_) => ty.clone(),
        }
    }
}

fn primitive_descriptor(name: &str) -> Option<TypeDescriptor> {
    parse_primitive_type(name).map(|(kind, format)| TypeDescriptor::Primitive {
        kind,
        format: format.map(str::to_string),
    })
}

/// Parse a primitive type name into its kind and format hint
pub fn parse_primitive_type(type_name: &str) -> Option<(PrimitiveKind, Option<&'static str>)> {
    let primitive = match type_name {
        "String" | "string" | "str" | "char" => (PrimitiveKind::String, None),
        "i8" | "i16" | "i32" | "u8" | "u16" | "u32" => (PrimitiveKind::Integer, Some("int32")),
        "i64" | "i128" | "u64" | "u128" | "isize" | "usize" => {
            (PrimitiveKind::Integer, Some("int64"))
        }
        "integer" => (PrimitiveKind::Integer, None),
        "f32" => (PrimitiveKind::Number, Some("float")),
        "f64" => (PrimitiveKind::Number, Some("double")),
        "number" => (PrimitiveKind::Number, None),
        "bool" | "boolean" => (PrimitiveKind::Boolean, None),
        "Date" | "DateTime" | "NaiveDateTime" | "SystemTime" | "OffsetDateTime" => {
            (PrimitiveKind::String, Some("date-time"))
        }
        "NaiveDate" => (PrimitiveKind::String, Some("date")),
        "Uuid" => (PrimitiveKind::String, Some("uuid")),
        _ => return None,
    };
    Some(primitive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::AnnotationClassifier;
    use crate::examples::NoExamples;
    use crate::parser::ParsedFile;
    use crate::source::rust::RustSourceLoader;
    use crate::source::{SourceTree, SourceUnit};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    /// Helper function to build a source model from Rust code
    fn create_model_from_code(code: &str) -> SourceTree {
        let parsed = ParsedFile {
            path: PathBuf::from("src/dto.rs"),
            syntax_tree: syn::parse_file(code).unwrap(),
        };
        RustSourceLoader::load(&[parsed], &AnnotationClassifier::default())
    }

    fn object_properties(descriptor: &TypeDescriptor) -> &[PropertyDescriptor] {
        match descriptor {
            TypeDescriptor::Object { properties, .. } => properties,
            other => panic!("Expected object descriptor, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_primitive_types() {
        let model = create_model_from_code("");
        let mut resolver = TypeResolver::new(&model);

        let primitives = vec![
            ("String", PrimitiveKind::String, None),
            ("i32", PrimitiveKind::Integer, Some("int32")),
            ("u64", PrimitiveKind::Integer, Some("int64")),
            ("f32", PrimitiveKind::Number, Some("float")),
            ("bool", PrimitiveKind::Boolean, None),
            ("DateTime", PrimitiveKind::String, Some("date-time")),
        ];

        for (type_name, kind, format) in primitives {
            let resolved = resolver.resolve(&TypeExpr::named(type_name));
            assert_eq!(
                resolved,
                Some(TypeDescriptor::Primitive {
                    kind,
                    format: format.map(str::to_string),
                }),
                "primitive {}",
                type_name
            );
        }
    }

    #[test]
    fn test_resolve_simple_struct() {
        let code = r#"
            pub struct User {
                /// Unique identifier
                pub id: u32,
                pub name: String,
                pub nickname: Option<String>,
                #[serde(default)]
                pub active: bool,
            }
        "#;

        let model = create_model_from_code(code);
        let mut resolver = TypeResolver::new(&model).with_examples(Box::new(NoExamples));
        let resolved = resolver.resolve(&TypeExpr::named("User")).unwrap();

        let properties = object_properties(&resolved);
        let summary: Vec<(&str, bool)> = properties
            .iter()
            .map(|p| (p.name.as_str(), p.required))
            .collect();
        assert_eq!(
            summary,
            vec![("id", true), ("name", true), ("nickname", false), ("active", false)]
        );
        assert_eq!(properties[0].docs.as_deref(), Some("Unique identifier"));
        assert!(resolver.arena().get("User").is_some());
    }

    #[test]
    fn test_wrappers_unwrap_to_inner_type() {
        let code = r#"
            pub struct User { pub id: u32 }
        "#;
        let model = create_model_from_code(code);
        let mut resolver = TypeResolver::new(&model);

        let wrapped = TypeExpr::generic(
            "Result",
            vec![
                TypeExpr::generic("Json", vec![TypeExpr::named("User")]),
                TypeExpr::named("ApiError"),
            ],
        );
        let resolved = resolver.resolve(&wrapped).unwrap();
        assert!(matches!(resolved, TypeDescriptor::Object { name: Some(ref n), .. } if n == "User"));

        assert_eq!(resolver.resolve(&TypeExpr::named("Promise")), None);
    }

    #[test]
    fn test_body_resolution_skips_primitives_and_void() {
        let model = create_model_from_code("");
        let mut resolver = TypeResolver::new(&model);

        assert_eq!(resolver.resolve_body(&TypeExpr::named("String")), None);
        assert_eq!(
            resolver.resolve_body(&TypeExpr::generic("Promise", vec![TypeExpr::named("void")])),
            None
        );
        assert!(resolver
            .resolve_body(&TypeExpr::array(TypeExpr::named("String")))
            .is_some());
    }

    #[test]
    fn test_resolve_enum() {
        let code = r#"
            pub enum Status {
                Active,
                Inactive,
                Pending,
            }
        "#;

        let model = create_model_from_code(code);
        let mut resolver = TypeResolver::new(&model);
        let resolved = resolver.resolve(&TypeExpr::named("Status"));

        assert_eq!(
            resolved,
            Some(TypeDescriptor::Enum {
                name: Some("Status".to_string()),
                values: vec![
                    "Active".to_string(),
                    "Inactive".to_string(),
                    "Pending".to_string()
                ],
            })
        );
    }

    #[test]
    fn test_circular_reference_detection() {
        let code = r#"
            pub struct Node {
                pub value: i32,
                pub next: Option<Box<Node>>,
                pub children: Vec<Node>,
            }
        "#;

        let model = create_model_from_code(code);
        let mut resolver = TypeResolver::new(&model);

        // This should not cause infinite recursion
        let resolved = resolver.resolve(&TypeExpr::named("Node")).unwrap();
        let properties = object_properties(&resolved);

        assert_eq!(properties[1].ty, TypeDescriptor::Reference("Node".to_string()));
        assert_eq!(
            properties[2].ty,
            TypeDescriptor::Array(Box::new(TypeDescriptor::Reference("Node".to_string())))
        );
    }

    #[test]
    fn test_mutual_recursion_terminates() {
        let code = r#"
            pub struct Author { pub posts: Vec<Post> }
            pub struct Post { pub author: Author }
        "#;

        let model = create_model_from_code(code);
        let mut resolver = TypeResolver::new(&model);
        resolver.resolve(&TypeExpr::named("Author")).unwrap();

        let post = resolver.arena().get("Post").unwrap();
        assert_eq!(
            object_properties(post)[0].ty,
            TypeDescriptor::Reference("Author".to_string())
        );
    }

    #[test]
    fn test_recursive_enum_terminates() {
        let code = r#"
            pub struct Lit { pub v: i32 }
            pub enum Expr { Not(Box<Expr>), Lit(Lit) }
        "#;

        let model = create_model_from_code(code);
        let mut resolver = TypeResolver::new(&model);

        let resolved = resolver.resolve(&TypeExpr::named("Expr")).unwrap();
        assert!(matches!(&resolved, TypeDescriptor::Object { name: Some(n), .. } if n == "Lit"));
        assert_eq!(resolver.arena().get("Expr"), Some(&resolved));
    }

    #[test]
    fn test_recursion_through_enum_payload_becomes_reference() {
        let code = r#"
            pub struct Binary { pub left: Box<Expr>, pub right: Box<Expr> }
            pub struct Lit { pub v: i32 }
            pub enum Expr { Binary(Binary), Lit(Lit) }
            pub enum Only { Again(Box<Only>) }
        "#;

        let model = create_model_from_code(code);
        let mut resolver = TypeResolver::new(&model);

        let resolved = resolver.resolve(&TypeExpr::named("Expr")).unwrap();
        let properties = object_properties(&resolved);
        assert_eq!(properties[0].ty, TypeDescriptor::Reference("Expr".to_string()));
        assert_eq!(properties[1].ty, TypeDescriptor::Reference("Expr".to_string()));

        assert_eq!(resolver.resolve(&TypeExpr::named("Only")), None);
        assert!(resolver.arena().get("Only").is_none());
    }

    #[test]
    fn test_recursive_parameter_type_terminates() {
        let code = r#"
            pub enum Tree { Branches(Vec<Tree>) }
        "#;
        let model = create_model_from_code(code);
        let resolver = TypeResolver::new(&model);

        assert_eq!(
            resolver.parameter_descriptor(&TypeExpr::named("Tree")),
            TypeDescriptor::Array(Box::new(TypeDescriptor::Primitive {
                kind: PrimitiveKind::String,
                format: None,
            }))
        );
    }

    #[test]
    fn test_generic_declaration_substitution() {
        let code = r#"
            pub struct Page<T> {
                pub items: Vec<T>,
                pub total: u64,
            }
            pub struct User { pub id: u32 }
        "#;

        let model = create_model_from_code(code);
        let mut resolver = TypeResolver::new(&model);
        let page = TypeExpr::generic("Page", vec![TypeExpr::named("User")]);
        let resolved = resolver.resolve(&page).unwrap();

        match &resolved {
            TypeDescriptor::Object { name, properties } => {
                assert_eq!(name.as_deref(), Some("Page<User>"));
                match &properties[0].ty {
                    TypeDescriptor::Array(inner) => assert!(matches!(
                        inner.as_ref(),
                        TypeDescriptor::Object { name: Some(n), .. } if n == "User"
                    )),
                    other => panic!("Expected array, got {:?}", other),
                }
            }
            other => panic!("Expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_union_picks_first_resolvable_member() {
        let code = r#"
            pub struct Cat { pub meows: bool }
            pub struct Dog { pub barks: bool }
            pub enum Pet { Cat(Cat), Dog(Dog) }
        "#;

        let model = create_model_from_code(code);
        let mut resolver = TypeResolver::new(&model);

        let resolved = resolver.resolve(&TypeExpr::named("Pet")).unwrap();
        assert!(matches!(resolved, TypeDescriptor::Object { name: Some(ref n), .. } if n == "Cat"));

        let union = TypeExpr::Union(vec![
            TypeExpr::named("null"),
            TypeExpr::named("string"),
            TypeExpr::named("Dog"),
        ]);
        let resolved = resolver.resolve(&union).unwrap();
        assert!(matches!(resolved, TypeDescriptor::Object { name: Some(ref n), .. } if n == "Dog"));

        let unresolvable = TypeExpr::Union(vec![
            TypeExpr::named("string"),
            TypeExpr::named("number"),
        ]);
        assert_eq!(resolver.resolve(&unresolvable), None);
    }

    #[test]
    fn test_inline_object_shapes() {
        let model = SourceTree::new(vec![SourceUnit::default()]);
        let mut resolver = TypeResolver::new(&model);

        let inline = TypeExpr::Inline(vec![PropertyDecl {
            name: "token".to_string(),
            ty: TypeExpr::named("string"),
            optional: false,
            has_default: false,
            docs: None,
            annotations: vec![],
        }]);
        let resolved = resolver.resolve(&inline).unwrap();
        assert_eq!(object_properties(&resolved)[0].name, "token");
        assert!(resolver.arena().is_empty());

        assert_eq!(resolver.resolve(&TypeExpr::Inline(vec![])), None);
    }

    #[test]
    fn test_unresolvable_property_degrades_to_free_object() {
        let code = r#"
            pub struct Envelope {
                pub payload: Mystery,
                pub meta: HashMap<String, String>,
            }
        "#;

        let model = create_model_from_code(code);
        let mut resolver = TypeResolver::new(&model);
        let resolved = resolver.resolve(&TypeExpr::named("Envelope")).unwrap();

        let properties = object_properties(&resolved);
        assert_eq!(properties[0].ty, TypeDescriptor::free_object());
        assert_eq!(properties[1].ty, TypeDescriptor::free_object());
        assert_eq!(resolver.resolve(&TypeExpr::named("Mystery")), None);
    }

    #[test]
    fn test_parameter_descriptor_is_shallow() {
        let code = r#"
            pub enum Sort { Asc, Desc }
            pub struct Filter { pub q: String }
        "#;
        let model = create_model_from_code(code);
        let resolver = TypeResolver::new(&model);

        assert_eq!(
            resolver.parameter_descriptor(&TypeExpr::generic("Option", vec![TypeExpr::named("u32")])),
            TypeDescriptor::Primitive {
                kind: PrimitiveKind::Integer,
                format: Some("int32".to_string()),
            }
        );
        assert!(matches!(
            resolver.parameter_descriptor(&TypeExpr::named("Sort")),
            TypeDescriptor::Enum { .. }
        ));
        assert_eq!(
            resolver.parameter_descriptor(&TypeExpr::named("Filter")),
            TypeDescriptor::Primitive {
                kind: PrimitiveKind::String,
                format: None,
            }
        );
    }
}
