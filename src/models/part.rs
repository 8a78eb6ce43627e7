use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::platform::{replace_by_id, Field, FieldInput};

/// Reusable field template, addressable on its own so several platforms can
/// reference it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartDefinition {
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
    pub created_platform_id: Uuid,
    /// Stays false until the owning platform activates it.
    #[serde(default)]
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartDefinitionInput {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub fields: Option<Vec<FieldInput>>,
    pub active: Option<bool>,
}

impl PartDefinition {
    pub fn new(created_platform_id: Uuid, input: PartDefinitionInput) -> Self {
        let now = Utc::now();
        let mut part = Self {
            id: Uuid::new_v4(),
            name: None,
            description: None,
            kind: None,
            fields: Vec::new(),
            created_platform_id,
            active: false,
            created_at: now,
            updated_at: now,
        };
        part.apply(input);
        part
    }

    pub fn apply(&mut self, input: PartDefinitionInput) {
        if let Some(name) = input.name {
            self.name = Some(name);
        }
        if let Some(description) = input.description {
            self.description = Some(description);
        }
        if let Some(kind) = input.kind {
            self.kind = Some(kind);
        }
        if let Some(fields) = input.fields {
            self.fields = replace_by_id(fields);
        }
        if let Some(active) = input.active {
            self.active = active;
        }
        self.updated_at = Utc::now();
    }
}
