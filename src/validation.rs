use serde::Serialize;
use serde_json::Value;

use crate::models::Platform;

/// One rejected field, in the shape clients receive under `errors`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub kind: String,
    pub value: Value,
    pub message: String,
}

impl FieldError {
    pub fn required(field: &str, value: Option<&str>) -> Self {
        Self {
            field: field.to_string(),
            kind: "required".to_string(),
            value: value.map_or(Value::Null, |v| Value::String(v.to_string())),
            message: format!("Path `{}` is required.", field),
        }
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// Check the constraints on a platform document.
///
/// Only `name` is required, and only once the platform is active. A missing
/// description leaves the linked category with an empty one.
pub fn validate_platform(platform: &Platform) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    if platform.active && is_blank(platform.name.as_deref()) {
        errors.push(FieldError::required("name", platform.name.as_deref()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        errors.sort_by(|a, b| a.field.cmp(&b.field));
        Err(errors)
    }
}
