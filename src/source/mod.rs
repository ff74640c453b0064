//! The source model: declarations the pipeline reads, and the capability to
//! resolve a declared type reference to its structural shape.
//!
//! The pipeline only talks to the [`SourceModel`] trait. Two providers ship
//! with the crate: [`SourceTree`], an in-memory model that can be loaded from a
//! JSON or YAML manifest produced by any front-end, and
//! [`rust::RustSourceLoader`], which builds a [`SourceTree`] from Rust sources.

pub mod rust;

use crate::type_resolver::parse_primitive_type;
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// One file's worth of declarations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceUnit {
    /// Location of the file, relative or absolute
    pub path: PathBuf,
    #[serde(default)]
    pub classes: Vec<ClassDecl>,
    #[serde(default)]
    pub enums: Vec<EnumDecl>,
    #[serde(default)]
    pub modules: Vec<ModuleDecl>,
}

/// A decorator/attribute attached to a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub name: String,
    #[serde(default)]
    pub args: Vec<AnnotationArg>,
}

/// One argument of an annotation.
///
/// String literals keep their unquoted value; anything else is kept as the
/// verbatim expression text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationArg {
    Str(String),
    Expr { expr: String },
}

impl AnnotationArg {
    pub fn text(&self) -> &str {
        match self {
            AnnotationArg::Str(value) => value,
            AnnotationArg::Expr { expr } => expr,
        }
    }
}

impl Annotation {
    pub fn new(name: impl Into<String>, args: Vec<AnnotationArg>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    pub fn first_arg(&self) -> Option<&AnnotationArg> {
        self.args.first()
    }
}

/// A class-like declaration: controller, module, or data-transfer object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    #[serde(default)]
    pub docs: Option<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    /// Names of generic type parameters, in declaration order
    #[serde(default)]
    pub type_params: Vec<String>,
    #[serde(default)]
    pub properties: Vec<PropertyDecl>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    #[serde(default)]
    pub optional: bool,
    /// The declaration carries a default initializer
    #[serde(default)]
    pub has_default: bool,
    #[serde(default)]
    pub docs: Option<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    #[serde(default)]
    pub docs: Option<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    /// Declared return type; `None` means no return value
    #[serde(default)]
    pub return_type: Option<TypeExpr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

/// An enumeration: literal values, or a union of member types.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnumDecl {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
    /// Non-empty when the enumeration carries a payload type per variant
    #[serde(default)]
    pub members: Vec<TypeExpr>,
}

/// A logical module declaring the controllers it owns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleDecl {
    pub name: String,
    #[serde(default)]
    pub controllers: Vec<String>,
}

/// A type reference as written at a declaration site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeExpr {
    Named {
        name: String,
        #[serde(default)]
        args: Vec<TypeExpr>,
    },
    Array(Box<TypeExpr>),
    Tuple(Vec<TypeExpr>),
    Union(Vec<TypeExpr>),
    /// Anonymous object shape with its members
    Inline(Vec<PropertyDecl>),
    Unknown(String),
}

impl TypeExpr {
    pub fn named(name: impl Into<String>) -> Self {
        TypeExpr::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeExpr>) -> Self {
        TypeExpr::Named {
            name: name.into(),
            args,
        }
    }

    pub fn array(element: TypeExpr) -> Self {
        TypeExpr::Array(Box::new(element))
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, items: &[TypeExpr], sep: &str) -> fmt::Result {
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    f.write_str(sep)?;
                }
                write!(f, "{}", item)?;
            }
            Ok(())
        }

        match self {
            TypeExpr::Named { name, args } if args.is_empty() => f.write_str(name),
            TypeExpr::Named { name, args } => {
                write!(f, "{}<", name)?;
                join(f, args, ", ")?;
                f.write_str(">")
            }
            TypeExpr::Array(inner) => write!(f, "{}[]", inner),
            TypeExpr::Tuple(items) => {
                f.write_str("(")?;
                join(f, items, ", ")?;
                f.write_str(")")
            }
            TypeExpr::Union(members) => join(f, members, " | "),
            TypeExpr::Inline(props) => write!(f, "{{{} members}}", props.len()),
            TypeExpr::Unknown(text) => f.write_str(text),
        }
    }
}

/// Structural description of a resolved type reference.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeShape {
    Void,
    Null,
    /// Primitive, by the name it was written with
    Primitive(String),
    Array(TypeExpr),
    Enum {
        name: Option<String>,
        values: Vec<String>,
    },
    /// Alternatives; a declared enumeration with payloads carries its name
    Union {
        name: Option<String>,
        members: Vec<TypeExpr>,
    },
    /// A generic whose head is not a declaration the model knows
    Generic { name: String, args: Vec<TypeExpr> },
    /// A declared or inline object; `bindings` maps type parameters to arguments
    Object {
        name: Option<String>,
        bindings: Vec<(String, TypeExpr)>,
        properties: Vec<PropertyDecl>,
    },
    Unknown(String),
}

/// Read access to a loaded source tree.
pub trait SourceModel {
    /// All loaded source units
    fn units(&self) -> &[SourceUnit];

    fn find_class(&self, name: &str) -> Option<&ClassDecl> {
        self.units()
            .iter()
            .flat_map(|unit| unit.classes.iter())
            .find(|class| class.name == name)
    }

    fn find_enum(&self, name: &str) -> Option<&EnumDecl> {
        self.units()
            .iter()
            .flat_map(|unit| unit.enums.iter())
            .find(|decl| decl.name == name)
    }

    /// The module declaring ownership of the named class, if any
    fn owning_module(&self, class_name: &str) -> Option<&ModuleDecl> {
        self.units()
            .iter()
            .flat_map(|unit| unit.modules.iter())
            .find(|module| module.controllers.iter().any(|c| c == class_name))
    }

    /// Resolves a type reference to its structural shape
    fn resolve_type(&self, ty: &TypeExpr) -> TypeShape {
        match ty {
            TypeExpr::Named { name, args } => self.resolve_named(name, args),
            TypeExpr::Array(inner) => TypeShape::Array((**inner).clone()),
            TypeExpr::Tuple(items) if items.is_empty() => TypeShape::Void,
            TypeExpr::Tuple(_) => TypeShape::Unknown(ty.to_string()),
            TypeExpr::Union(members) => TypeShape::Union {
                name: None,
                members: members.clone(),
            },
            TypeExpr::Inline(properties) => TypeShape::Object {
                name: None,
                bindings: Vec::new(),
                properties: properties.clone(),
            },
            TypeExpr::Unknown(text) => TypeShape::Unknown(text.clone()),
        }
    }

    fn resolve_named(&self, name: &str, args: &[TypeExpr]) -> TypeShape {
        if let Some(shape) = builtin_shape(name, args) {
            return shape;
        }

        if let Some(class) = self.find_class(name) {
            let bindings = class
                .type_params
                .iter()
                .cloned()
                .zip(args.iter().cloned())
                .collect();
            return TypeShape::Object {
                name: Some(class.name.clone()),
                bindings,
                properties: class.properties.clone(),
            };
        }

        if let Some(decl) = self.find_enum(name) {
            if !decl.members.is_empty() {
                return TypeShape::Union {
                    name: Some(decl.name.clone()),
                    members: decl.members.clone(),
                };
            }
            return TypeShape::Enum {
                name: Some(decl.name.clone()),
                values: decl.values.clone(),
            };
        }

        if !args.is_empty() {
            return TypeShape::Generic {
                name: name.to_string(),
                args: args.to_vec(),
            };
        }

        debug!("Type {} is not declared in the source model", name);
        TypeShape::Unknown(name.to_string())
    }
}

/// Shapes of names every host language agrees on.
fn builtin_shape(name: &str, args: &[TypeExpr]) -> Option<TypeShape> {
    match name {
        "void" | "undefined" | "never" | "()" => return Some(TypeShape::Void),
        "null" => return Some(TypeShape::Null),
        _ => {}
    }

    if parse_primitive_type(name).is_some() {
        return Some(TypeShape::Primitive(name.to_string()));
    }

    match (name, args.first()) {
        ("Option", Some(inner)) => Some(TypeShape::Union {
            name: None,
            members: vec![inner.clone(), TypeExpr::named("null")],
        }),
        ("Vec" | "VecDeque" | "HashSet" | "BTreeSet" | "IndexSet" | "Array" | "ReadonlyArray"
        | "Set", Some(inner)) => Some(TypeShape::Array(inner.clone())),
        ("HashMap" | "BTreeMap" | "IndexMap" | "Record" | "Map" | "Value" | "object" | "any"
        | "unknown", _) => Some(TypeShape::Object {
            name: None,
            bindings: Vec::new(),
            properties: Vec::new(),
        }),
        _ => None,
    }
}

/// In-memory source model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceTree {
    #[serde(default)]
    pub units: Vec<SourceUnit>,
}

impl SourceTree {
    pub fn new(units: Vec<SourceUnit>) -> Self {
        Self { units }
    }

    /// Loads a source manifest, as YAML or JSON depending on the extension.
    pub fn from_manifest(path: &Path) -> Result<Self> {
        debug!("Loading source manifest: {}", path.display());
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read source manifest: {}", path.display()))?;

        let tree: SourceTree = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .with_context(|| format!("Invalid JSON manifest: {}", path.display()))?,
            _ => serde_yaml::from_str(&content)
                .with_context(|| format!("Invalid YAML manifest: {}", path.display()))?,
        };

        debug!("Manifest holds {} source units", tree.units.len());
        Ok(tree)
    }
}

impl SourceModel for SourceTree {
    fn units(&self) -> &[SourceUnit] {
        &self.units
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tree() -> SourceTree {
        SourceTree::new(vec![SourceUnit {
            path: PathBuf::from("src/users/user.dto.ts"),
            classes: vec![ClassDecl {
                name: "Page".to_string(),
                type_params: vec!["T".to_string()],
                properties: vec![PropertyDecl {
                    name: "items".to_string(),
                    ty: TypeExpr::array(TypeExpr::named("T")),
                    optional: false,
                    has_default: false,
                    docs: None,
                    annotations: vec![],
                }],
                ..Default::default()
            }],
            enums: vec![
                EnumDecl {
                    name: "Status".to_string(),
                    values: vec!["active".to_string(), "banned".to_string()],
                    members: vec![],
                },
                EnumDecl {
                    name: "Payload".to_string(),
                    values: vec![],
                    members: vec![TypeExpr::named("A"), TypeExpr::named("B")],
                },
            ],
            modules: vec![ModuleDecl {
                name: "UsersModule".to_string(),
                controllers: vec!["UsersController".to_string()],
            }],
        }])
    }

    #[test]
    fn test_resolve_builtins() {
        let tree = tree();
        assert_eq!(
            tree.resolve_type(&TypeExpr::named("string")),
            TypeShape::Primitive("string".to_string())
        );
        assert_eq!(tree.resolve_type(&TypeExpr::named("void")), TypeShape::Void);
        assert_eq!(tree.resolve_type(&TypeExpr::Tuple(vec![])), TypeShape::Void);
        assert_eq!(
            tree.resolve_type(&TypeExpr::generic("Vec", vec![TypeExpr::named("u8")])),
            TypeShape::Array(TypeExpr::named("u8"))
        );
        assert_eq!(
            tree.resolve_type(&TypeExpr::generic("Option", vec![TypeExpr::named("i32")])),
            TypeShape::Union {
                name: None,
                members: vec![TypeExpr::named("i32"), TypeExpr::named("null")],
            }
        );
    }

    #[test]
    fn test_resolve_generic_declaration_binds_arguments() {
        let tree = tree();
        let shape = tree.resolve_type(&TypeExpr::generic("Page", vec![TypeExpr::named("User")]));

        match shape {
            TypeShape::Object {
                name,
                bindings,
                properties,
            } => {
                assert_eq!(name.as_deref(), Some("Page"));
                assert_eq!(bindings, vec![("T".to_string(), TypeExpr::named("User"))]);
                assert_eq!(properties.len(), 1);
            }
            other => panic!("Expected object shape, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_enums_and_unions() {
        let tree = tree();
        assert_eq!(
            tree.resolve_type(&TypeExpr::named("Status")),
            TypeShape::Enum {
                name: Some("Status".to_string()),
                values: vec!["active".to_string(), "banned".to_string()],
            }
        );
        assert_eq!(
            tree.resolve_type(&TypeExpr::named("Payload")),
            TypeShape::Union {
                name: Some("Payload".to_string()),
                members: vec![TypeExpr::named("A"), TypeExpr::named("B")],
            }
        );
    }

    #[test]
    fn test_unknown_and_wrapper_heads() {
        let tree = tree();
        assert_eq!(
            tree.resolve_type(&TypeExpr::named("Mystery")),
            TypeShape::Unknown("Mystery".to_string())
        );
        assert_eq!(
            tree.resolve_type(&TypeExpr::generic("Promise", vec![TypeExpr::named("User")])),
            TypeShape::Generic {
                name: "Promise".to_string(),
                args: vec![TypeExpr::named("User")],
            }
        );
    }

    #[test]
    fn test_owning_module_lookup() {
        let tree = tree();
        assert_eq!(
            tree.owning_module("UsersController").map(|m| m.name.as_str()),
            Some("UsersModule")
        );
        assert!(tree.owning_module("OtherController").is_none());
    }

    #[test]
    fn test_manifest_loads_from_json() {
        let json = r#"{
  "units": [{
    "path": "src/admin/admin.controller.ts",
    "classes": [{
      "name": "AdminController",
      "annotations": [
        { "name": "Controller", "args": ["admin"] },
        { "name": "UseGuards", "args": [{ "expr": "AuthGuard" }] }
      ],
      "methods": [{
        "name": "profile",
        "annotations": [{ "name": "Get", "args": ["profile"] }],
        "return_type": { "named": { "name": "Promise", "args": [{ "named": { "name": "ProfileDto" } }] } }
      }]
    }]
  }]
}"#;
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(&path, json).unwrap();

        let tree = SourceTree::from_manifest(&path).unwrap();
        let class = tree.find_class("AdminController").unwrap();

        assert_eq!(class.annotations[0].args, vec![AnnotationArg::Str("admin".to_string())]);
        assert_eq!(class.annotations[1].args[0].text(), "AuthGuard");
        assert_eq!(
            class.methods[0].return_type.as_ref().map(|t| t.to_string()),
            Some("Promise<ProfileDto>".to_string())
        );
    }
}
