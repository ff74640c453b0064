//! Builds a [`SourceTree`] from Rust sources.
//!
//! Structs become classes and their fields properties. Inherent `impl` blocks
//! contribute methods, and their attributes are merged into the class
//! annotations, so a controller can be written as
//!
//! ```ignore
//! #[controller("users")]
//! pub struct UsersController;
//!
//! #[use_guards(AuthGuard)]
//! impl UsersController {
//!     #[get(":id")]
//!     pub async fn find(&self, #[param("id")] id: u32) -> Json<UserDto> { todo!() }
//! }
//! ```
//!
//! `serde` attributes are honoured for renames, skipped fields and defaults.

use crate::classifier::{AnnotationClassifier, AnnotationRole};
use crate::parser::ParsedFile;
use crate::source::{
    Annotation, AnnotationArg, ClassDecl, EnumDecl, MethodDecl, ModuleDecl, ParamDecl,
    PropertyDecl, SourceTree, SourceUnit, TypeExpr,
};
use heck::{
    ToKebabCase, ToLowerCamelCase, ToShoutyKebabCase, ToShoutySnakeCase, ToSnakeCase,
    ToUpperCamelCase,
};
use log::{debug, warn};
use quote::ToTokens;
use regex::Regex;
use std::sync::OnceLock;
use syn::punctuated::Punctuated;
use syn::visit::{self, Visit};
use syn::{Attribute, Expr, Fields, FnArg, Lit, Meta, Pat, Token, Type};

/// Attributes that are compiler or derive plumbing, never annotations
const PLUMBING_ATTRS: &[&str] = &[
    "doc", "derive", "serde", "allow", "warn", "deny", "cfg", "cfg_attr", "inline", "must_use",
    "non_exhaustive", "repr",
];

/// Loader turning parsed Rust files into a source model.
pub struct RustSourceLoader;

impl RustSourceLoader {
    /// Builds a source tree, one unit per parsed file.
    ///
    /// `impl` blocks may live in a different file than their struct; methods
    /// are attached to the struct wherever it is declared. An `impl` for a type
    /// with no struct declaration produces a class of its own.
    pub fn load(parsed_files: &[ParsedFile], classifier: &AnnotationClassifier) -> SourceTree {
        let mut units = Vec::with_capacity(parsed_files.len());
        let mut pending_impls = Vec::new();

        for (unit_idx, parsed) in parsed_files.iter().enumerate() {
            let mut visitor = UnitVisitor::new(classifier);
            visitor.visit_file(&parsed.syntax_tree);

            debug!(
                "{}: {} classes, {} enums, {} modules, {} impl blocks",
                parsed.path.display(),
                visitor.classes.len(),
                visitor.enums.len(),
                visitor.modules.len(),
                visitor.impls.len()
            );

            pending_impls.extend(visitor.impls.into_iter().map(|block| (unit_idx, block)));
            units.push(SourceUnit {
                path: parsed.path.clone(),
                classes: visitor.classes,
                enums: visitor.enums,
                modules: visitor.modules,
            });
        }

        for (unit_idx, block) in pending_impls {
            merge_impl(&mut units, unit_idx, block);
        }

        SourceTree::new(units)
    }
}

/// Methods and attributes of one inherent `impl` block
struct ImplBlock {
    self_ty: String,
    annotations: Vec<Annotation>,
    methods: Vec<MethodDecl>,
}

fn merge_impl(units: &mut [SourceUnit], unit_idx: usize, block: ImplBlock) {
    let existing = declaring_unit(units, unit_idx, &block.self_ty).and_then(|owner| {
        units[owner]
            .classes
            .iter_mut()
            .find(|class| class.name == block.self_ty)
    });

    match existing {
        Some(class) => {
            class.annotations.extend(block.annotations);
            class.methods.extend(block.methods);
        }
        None => {
            debug!("impl {} has no struct declaration; adding a class", block.self_ty);
            if let Some(unit) = units.get_mut(unit_idx) {
                unit.classes.push(ClassDecl {
                    name: block.self_ty,
                    annotations: block.annotations,
                    methods: block.methods,
                    ..Default::default()
                });
            }
        }
    }
}

/// Unit declaring the struct an `impl` block belongs to: the block's own unit,
/// then a unit in the same directory, then any unit.
fn declaring_unit(units: &[SourceUnit], unit_idx: usize, name: &str) -> Option<usize> {
    let declares = |unit: &SourceUnit| unit.classes.iter().any(|class| class.name == name);
    let own = units.get(unit_idx)?;
    if declares(own) {
        return Some(unit_idx);
    }

    let dir = own.path.parent();
    units
        .iter()
        .position(|unit| unit.path.parent() == dir && declares(unit))
        .or_else(|| units.iter().position(|unit| declares(unit)))
}

struct UnitVisitor<'c> {
    classifier: &'c AnnotationClassifier,
    classes: Vec<ClassDecl>,
    enums: Vec<EnumDecl>,
    modules: Vec<ModuleDecl>,
    impls: Vec<ImplBlock>,
}

impl<'c> UnitVisitor<'c> {
    fn new(classifier: &'c AnnotationClassifier) -> Self {
        Self {
            classifier,
            classes: Vec::new(),
            enums: Vec::new(),
            modules: Vec::new(),
            impls: Vec::new(),
        }
    }

    /// Reads the ownership list of a struct carrying the module annotation
    fn module_decl(&self, name: &str, attrs: &[Attribute]) -> Option<ModuleDecl> {
        let attr = attrs.iter().find(|attr| {
            attr_name(attr)
                .map(|n| self.classifier.is(&n, AnnotationRole::Module))
                .unwrap_or(false)
        })?;

        let tokens = match &attr.meta {
            Meta::List(list) => list.tokens.to_string(),
            _ => String::new(),
        };
        let controllers = controllers_regex()
            .captures(&tokens)
            .map(|caps| {
                caps[1]
                    .split(',')
                    .filter_map(|item| item.split("::").last())
                    .map(|item| item.trim().to_string())
                    .filter(|item| !item.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Some(ModuleDecl {
            name: name.to_string(),
            controllers,
        })
    }
}

impl<'ast, 'c> Visit<'ast> for UnitVisitor<'c> {
    fn visit_item_struct(&mut self, item: &'ast syn::ItemStruct) {
        let name = item.ident.to_string();
        let container = SerdeAttrs::from_attrs(&item.attrs);

        let properties = match &item.fields {
            Fields::Named(named) => named
                .named
                .iter()
                .filter_map(|field| {
                    let ident = field.ident.as_ref()?.to_string();
                    property_decl(&ident, field, container.rename_all.as_deref())
                })
                .collect(),
            _ => Vec::new(),
        };

        if let Some(module) = self.module_decl(&name, &item.attrs) {
            debug!("Module {} owns {:?}", module.name, module.controllers);
            self.modules.push(module);
        }

        self.classes.push(ClassDecl {
            name,
            docs: doc_text(&item.attrs),
            annotations: annotations(&item.attrs),
            type_params: item
                .generics
                .type_params()
                .map(|param| param.ident.to_string())
                .collect(),
            properties,
            methods: Vec::new(),
        });

        visit::visit_item_struct(self, item);
    }

    fn visit_item_enum(&mut self, item: &'ast syn::ItemEnum) {
        let container = SerdeAttrs::from_attrs(&item.attrs);
        let mut values = Vec::new();
        let mut members = Vec::new();

        for variant in &item.variants {
            let serde = SerdeAttrs::from_attrs(&variant.attrs);
            if serde.skip {
                continue;
            }
            match &variant.fields {
                Fields::Unit => {
                    let value = serde.rename.unwrap_or_else(|| {
                        apply_rename_all(&variant.ident.to_string(), container.rename_all.as_deref())
                    });
                    values.push(value);
                }
                Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => {
                    members.push(type_expr(&unnamed.unnamed[0].ty));
                }
                _ => debug!(
                    "Skipping variant {}::{} with structured payload",
                    item.ident, variant.ident
                ),
            }
        }

        self.enums.push(EnumDecl {
            name: item.ident.to_string(),
            values,
            members,
        });

        visit::visit_item_enum(self, item);
    }

    fn visit_item_impl(&mut self, item: &'ast syn::ItemImpl) {
        if item.trait_.is_some() {
            return;
        }
        let Some(self_ty) = type_name(&item.self_ty) else {
            return;
        };

        let methods = item
            .items
            .iter()
            .filter_map(|impl_item| match impl_item {
                syn::ImplItem::Fn(method) => Some(method_decl(method)),
                _ => None,
            })
            .collect();

        self.impls.push(ImplBlock {
            self_ty,
            annotations: annotations(&item.attrs),
            methods,
        });
    }
}

fn property_decl(ident: &str, field: &syn::Field, rename_all: Option<&str>) -> Option<PropertyDecl> {
    let serde = SerdeAttrs::from_attrs(&field.attrs);
    if serde.skip {
        debug!("Skipping serde-skipped field {}", ident);
        return None;
    }

    let name = serde
        .rename
        .unwrap_or_else(|| apply_rename_all(ident, rename_all));

    Some(PropertyDecl {
        name,
        ty: type_expr(&field.ty),
        optional: is_option(&field.ty),
        has_default: serde.default,
        docs: doc_text(&field.attrs),
        annotations: annotations(&field.attrs),
    })
}

fn method_decl(method: &syn::ImplItemFn) -> MethodDecl {
    let params = method
        .sig
        .inputs
        .iter()
        .enumerate()
        .filter_map(|(idx, input)| match input {
            FnArg::Receiver(_) => None,
            FnArg::Typed(pat_type) => Some(ParamDecl {
                name: pattern_name(&pat_type.pat).unwrap_or_else(|| format!("arg{}", idx)),
                ty: type_expr(&pat_type.ty),
                optional: is_option(&pat_type.ty),
                annotations: annotations(&pat_type.attrs),
            }),
        })
        .collect();

    let return_type = match &method.sig.output {
        syn::ReturnType::Default => None,
        syn::ReturnType::Type(_, ty) => Some(type_expr(ty)),
    };

    MethodDecl {
        name: method.sig.ident.to_string(),
        docs: doc_text(&method.attrs),
        annotations: annotations(&method.attrs),
        params,
        return_type,
    }
}

/// Binding name of a parameter pattern; extractor patterns such as
/// `Path(id)` yield the inner binding.
fn pattern_name(pat: &Pat) -> Option<String> {
    match pat {
        Pat::Ident(ident) => Some(ident.ident.to_string()),
        Pat::TupleStruct(tuple) => tuple.elems.iter().find_map(pattern_name),
        Pat::Struct(st) => st.fields.iter().find_map(|f| pattern_name(&f.pat)),
        Pat::Reference(reference) => pattern_name(&reference.pat),
        Pat::Type(typed) => pattern_name(&typed.pat),
        _ => None,
    }
}

/// Last path segment of an attribute's name
fn attr_name(attr: &Attribute) -> Option<String> {
    attr.path().segments.last().map(|seg| seg.ident.to_string())
}

fn annotations(attrs: &[Attribute]) -> Vec<Annotation> {
    attrs
        .iter()
        .filter_map(|attr| {
            let name = attr_name(attr)?;
            if PLUMBING_ATTRS.contains(&name.as_str()) {
                return None;
            }
            Some(Annotation::new(name, annotation_args(attr)))
        })
        .collect()
}

fn annotation_args(attr: &Attribute) -> Vec<AnnotationArg> {
    match &attr.meta {
        Meta::Path(_) => Vec::new(),
        Meta::NameValue(name_value) => vec![expr_arg(&name_value.value)],
        Meta::List(list) => {
            match attr.parse_args_with(Punctuated::<Expr, Token![,]>::parse_terminated) {
                Ok(exprs) => exprs.iter().map(expr_arg).collect(),
                Err(e) => {
                    let raw = list.tokens.to_string();
                    debug!("Keeping raw arguments of #[{}]: {}", list.path.to_token_stream(), e);
                    if raw.trim().is_empty() {
                        Vec::new()
                    } else {
                        vec![AnnotationArg::Expr { expr: raw }]
                    }
                }
            }
        }
    }
}

fn expr_arg(expr: &Expr) -> AnnotationArg {
    match expr {
        Expr::Lit(lit) => match &lit.lit {
            Lit::Str(s) => AnnotationArg::Str(s.value()),
            other => AnnotationArg::Expr {
                expr: other.to_token_stream().to_string(),
            },
        },
        Expr::Unary(unary) if matches!(unary.op, syn::UnOp::Neg(_)) => AnnotationArg::Expr {
            expr: format!("-{}", expr_text(&unary.expr)),
        },
        other => AnnotationArg::Expr {
            expr: expr_text(other),
        },
    }
}

fn expr_text(expr: &Expr) -> String {
    expr.to_token_stream().to_string().replace(" :: ", "::")
}

/// Joined `///` lines, or `None` when there are none
fn doc_text(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(syn::ExprLit {
                    lit: Lit::Str(s), ..
                }) => Some(s.value().trim().to_string()),
                _ => None,
            },
            _ => None,
        })
        .collect();

    let text = lines.join("\n").trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Converts a `syn` type into the source model's type expression
pub(crate) fn type_expr(ty: &Type) -> TypeExpr {
    match ty {
        Type::Path(type_path) => path_expr(&type_path.path),
        Type::Reference(reference) => type_expr(&reference.elem),
        Type::Slice(slice) => TypeExpr::array(type_expr(&slice.elem)),
        Type::Array(array) => TypeExpr::array(type_expr(&array.elem)),
        Type::Tuple(tuple) => TypeExpr::Tuple(tuple.elems.iter().map(type_expr).collect()),
        Type::Paren(paren) => type_expr(&paren.elem),
        Type::Group(group) => type_expr(&group.elem),
        Type::ImplTrait(impl_trait) => bound_expr(&impl_trait.bounds)
            .unwrap_or_else(|| TypeExpr::Unknown(ty.to_token_stream().to_string())),
        Type::TraitObject(object) => bound_expr(&object.bounds)
            .unwrap_or_else(|| TypeExpr::Unknown(ty.to_token_stream().to_string())),
        other => TypeExpr::Unknown(other.to_token_stream().to_string()),
    }
}

/// First trait bound, e.g. `impl Future<Output = T>` becomes `Future<T>`
fn bound_expr(bounds: &Punctuated<syn::TypeParamBound, Token![+]>) -> Option<TypeExpr> {
    bounds.iter().find_map(|bound| match bound {
        syn::TypeParamBound::Trait(trait_bound) => Some(path_expr(&trait_bound.path)),
        _ => None,
    })
}

fn path_expr(path: &syn::Path) -> TypeExpr {
    let Some(segment) = path.segments.last() else {
        return TypeExpr::Unknown(path.to_token_stream().to_string());
    };

    let args = match &segment.arguments {
        syn::PathArguments::AngleBracketed(angle) => angle
            .args
            .iter()
            .filter_map(|arg| match arg {
                syn::GenericArgument::Type(inner) => Some(type_expr(inner)),
                syn::GenericArgument::AssocType(assoc) => Some(type_expr(&assoc.ty)),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    TypeExpr::generic(segment.ident.to_string(), args)
}

fn type_name(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map(|seg| seg.ident.to_string()),
        _ => None,
    }
}

fn is_option(ty: &Type) -> bool {
    matches!(type_name(ty).as_deref(), Some("Option"))
}

/// The `serde` attributes the model cares about
#[derive(Debug, Default)]
struct SerdeAttrs {
    rename: Option<String>,
    rename_all: Option<String>,
    skip: bool,
    default: bool,
}

impl SerdeAttrs {
    fn from_attrs(attrs: &[Attribute]) -> Self {
        let mut serde = SerdeAttrs::default();

        for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
            let Ok(list) = attr.meta.require_list() else {
                continue;
            };
            let tokens = list.tokens.to_string();
            let re = serde_regexes();

            if let Some(caps) = re.rename.captures(&tokens) {
                serde.rename = Some(caps[1].to_string());
            }
            if let Some(caps) = re.rename_all.captures(&tokens) {
                serde.rename_all = Some(caps[1].to_string());
            }
            if re.skip.is_match(&tokens) {
                serde.skip = true;
            }
            if re.default.is_match(&tokens) {
                serde.default = true;
            }
        }

        serde
    }
}

struct SerdeRegexes {
    rename: Regex,
    rename_all: Regex,
    skip: Regex,
    default: Regex,
}

fn serde_regexes() -> &'static SerdeRegexes {
    static RE: OnceLock<SerdeRegexes> = OnceLock::new();
    RE.get_or_init(|| SerdeRegexes {
        rename: Regex::new(r#"(?:^|,)\s*rename\s*=\s*"([^"]*)""#).expect("valid regex"),
        rename_all: Regex::new(r#"rename_all\s*=\s*"([^"]*)""#).expect("valid regex"),
        skip: Regex::new(r"(?:^|,)\s*skip(?:_serializing)?\s*(?:,|$)").expect("valid regex"),
        default: Regex::new(r"(?:^|,)\s*default\s*(?:[,=]|$)").expect("valid regex"),
    })
}

fn controllers_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"controllers\s*(?:=\s*\[|\()([^\])]*)").expect("valid regex")
    })
}

fn apply_rename_all(name: &str, rule: Option<&str>) -> String {
    match rule {
        Some("lowercase") => name.to_lowercase(),
        Some("UPPERCASE") => name.to_uppercase(),
        Some("camelCase") => name.to_lower_camel_case(),
        Some("PascalCase") => name.to_upper_camel_case(),
        Some("snake_case") => name.to_snake_case(),
        Some("SCREAMING_SNAKE_CASE") => name.to_shouty_snake_case(),
        Some("kebab-case") => name.to_kebab_case(),
        Some("SCREAMING-KEBAB-CASE") => name.to_shouty_kebab_case(),
        Some(other) => {
            warn!("Unknown serde rename_all rule: {}", other);
            name.to_string()
        }
        None => name.to_string(),
    }
}
