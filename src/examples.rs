//! Example values for schema properties.
//!
//! Example generation is a policy, separate from type resolution, so it can be
//! swapped or switched off without touching the resolver.

use crate::type_resolver::{PrimitiveKind, TypeDescriptor};
use serde_json::{json, Value};

/// Chooses an example value for a property.
pub trait ExamplePolicy {
    fn example_for(&self, property: &str, ty: &TypeDescriptor) -> Option<Value>;
}

/// Never produces examples.
pub struct NoExamples;

impl ExamplePolicy for NoExamples {
    fn example_for(&self, _property: &str, _ty: &TypeDescriptor) -> Option<Value> {
        None
    }
}

/// Guesses examples from property names (`email`, `phone`, `url`, ...) and
/// primitive formats.
pub struct NameHeuristicExamples;

impl ExamplePolicy for NameHeuristicExamples {
    fn example_for(&self, property: &str, ty: &TypeDescriptor) -> Option<Value> {
        let (kind, format) = match ty {
            TypeDescriptor::Primitive { kind, format } => (*kind, format.as_deref()),
            _ => return None,
        };
        let name = property.to_lowercase();

        match kind {
            PrimitiveKind::String => {
                let value = match format {
                    Some("date-time") => "2024-01-01T00:00:00Z",
                    Some("date") => "2024-01-01",
                    Some("uuid") => "3fa85f64-5717-4562-b3fc-2c963f66afa6",
                    _ if name.contains("email") => "user@example.com",
                    _ if name.contains("phone") => "+1-555-0100",
                    _ if name.contains("url") || name.contains("website") => "https://example.com",
                    _ if name == "firstname" || name == "first_name" => "John",
                    _ if name == "lastname" || name == "last_name" => "Doe",
                    _ if name == "username" || name == "user_name" => "johndoe",
                    _ if name.ends_with("name") => "John Doe",
                    _ => return None,
                };
                Some(json!(value))
            }
            PrimitiveKind::Integer
                if name == "id" || name.ends_with("_id") || property.ends_with("Id") =>
            {
                Some(json!(1))
            }
            _ => None,
        }
    }
}
