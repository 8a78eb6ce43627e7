use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::category::Category;
use super::part::PartDefinition;

/// Selectable value of a [`Field`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub label: Option<String>,
}

/// Labeled input descriptor embedded in platforms and parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub label: Option<String>,
    #[serde(default)]
    pub options: Vec<FieldOption>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldOptionInput {
    #[serde(default, alias = "_id")]
    pub id: Option<Uuid>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldInput {
    #[serde(default, alias = "_id")]
    pub id: Option<Uuid>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub label: Option<String>,
    #[serde(default)]
    pub options: Vec<FieldOptionInput>,
}

impl From<FieldOptionInput> for FieldOption {
    fn from(input: FieldOptionInput) -> Self {
        Self {
            id: input.id.unwrap_or_else(Uuid::new_v4),
            kind: input.kind,
            label: input.label,
        }
    }
}

impl From<FieldInput> for Field {
    fn from(input: FieldInput) -> Self {
        Self {
            id: input.id.unwrap_or_else(Uuid::new_v4),
            kind: input.kind,
            label: input.label,
            options: replace_by_id(input.options),
        }
    }
}

/// Turn a client-sent array into the stored array.
///
/// Entries carrying an id keep it, entries without one get a fresh id, and
/// anything stored but not sent is dropped because the result replaces it.
pub fn replace_by_id<I, T>(incoming: Vec<I>) -> Vec<T>
where
    I: Into<T>,
{
    incoming.into_iter().map(Into::into).collect()
}

/// Part value stored inline on a platform rather than as a shared definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedPart {
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmbeddedPartInput {
    #[serde(default, alias = "_id")]
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldInput>,
}

impl From<EmbeddedPartInput> for EmbeddedPart {
    fn from(input: EmbeddedPartInput) -> Self {
        Self {
            id: input.id.unwrap_or_else(Uuid::new_v4),
            name: input.name,
            description: input.description,
            kind: input.kind,
            fields: replace_by_id(input.fields),
        }
    }
}

/// One entry of a platform's `parts` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PartSlot {
    /// Shared [`PartDefinition`] referenced by id.
    Reference(Uuid),
    Embedded(EmbeddedPart),
}

impl PartSlot {
    pub fn id(&self) -> Uuid {
        match self {
            PartSlot::Reference(id) => *id,
            PartSlot::Embedded(part) => part.id,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PartSlotInput {
    Reference(Uuid),
    Embedded(EmbeddedPartInput),
}

/// Rebuild a `parts` array from a client payload.
///
/// An object whose id matches a stored reference stays a reference, so a client
/// can send back the expanded definitions it received without turning them into
/// inline copies.
pub fn replace_part_slots(existing: &[PartSlot], incoming: Vec<PartSlotInput>) -> Vec<PartSlot> {
    incoming
        .into_iter()
        .map(|slot| match slot {
            PartSlotInput::Reference(id) => PartSlot::Reference(id),
            PartSlotInput::Embedded(part) => match part.id {
                Some(id) if existing.contains(&PartSlot::Reference(id)) => PartSlot::Reference(id),
                _ => PartSlot::Embedded(part.into()),
            },
        })
        .collect()
}

/// Named subset of a platform's parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartGroup {
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub parts: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartGroupInput {
    #[serde(default, alias = "_id")]
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub parts: Vec<Uuid>,
}

impl From<PartGroupInput> for PartGroup {
    fn from(input: PartGroupInput) -> Self {
        Self {
            id: input.id.unwrap_or_else(Uuid::new_v4),
            name: input.name,
            description: input.description,
            parts: input.parts,
        }
    }
}

/// Reference to the category a platform nests under.
///
/// Clients send either the bare id or an object carrying it (typically the
/// expanded category they were given). Both normalize to the same id.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ParentCategoryRef {
    Id(Uuid),
    Embedded {
        #[serde(alias = "_id")]
        id: Uuid,
    },
}

impl ParentCategoryRef {
    pub fn id(&self) -> Uuid {
        match self {
            ParentCategoryRef::Id(id) | ParentCategoryRef::Embedded { id } => *id,
        }
    }
}

/// Which sub-resources the platform's UI shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisplayFlags {
    pub show_company: bool,
    pub show_brands: bool,
    pub show_people: bool,
    pub show_tags: bool,
    pub show_photos: bool,
    pub show_transactions: bool,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayFlagsInput {
    pub show_company: Option<bool>,
    pub show_brands: Option<bool>,
    pub show_people: Option<bool>,
    pub show_tags: Option<bool>,
    pub show_photos: Option<bool>,
    pub show_transactions: Option<bool>,
}

impl DisplayFlags {
    fn apply(&mut self, input: DisplayFlagsInput) {
        let targets = [
            (&mut self.show_company, input.show_company),
            (&mut self.show_brands, input.show_brands),
            (&mut self.show_people, input.show_people),
            (&mut self.show_tags, input.show_tags),
            (&mut self.show_photos, input.show_photos),
            (&mut self.show_transactions, input.show_transactions),
        ];
        for (flag, value) in targets {
            if let Some(value) = value {
                *flag = value;
            }
        }
    }
}

/// Stored platform document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Platform {
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(flatten)]
    pub display: DisplayFlags,
    #[serde(default)]
    pub allow_additional_parts: bool,
    /// This platform's own category, set on first activation.
    pub category: Option<Uuid>,
    pub parent_category: Option<Uuid>,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub parts: Vec<PartSlot>,
    #[serde(default)]
    pub part_groups: Vec<PartGroup>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create and update payload. Absent keys leave the stored value untouched;
/// arrays that are present replace the stored array.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
    #[serde(flatten)]
    pub display: DisplayFlagsInput,
    pub allow_additional_parts: Option<bool>,
    #[serde(alias = "_parentCategory")]
    pub parent_category: Option<ParentCategoryRef>,
    pub fields: Option<Vec<FieldInput>>,
    pub parts: Option<Vec<PartSlotInput>>,
    pub part_groups: Option<Vec<PartGroupInput>>,
}

impl Platform {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: None,
            description: None,
            active: false,
            display: DisplayFlags::default(),
            allow_additional_parts: false,
            category: None,
            parent_category: None,
            fields: Vec::new(),
            parts: Vec::new(),
            part_groups: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn from_input(input: PlatformInput) -> Self {
        let mut platform = Self::new();
        platform.apply(input);
        platform
    }

    /// Merge a payload into this document.
    pub fn apply(&mut self, input: PlatformInput) {
        if let Some(name) = input.name {
            self.name = Some(name);
        }
        if let Some(description) = input.description {
            self.description = Some(description);
        }
        if let Some(active) = input.active {
            self.active = active;
        }
        self.display.apply(input.display);
        if let Some(allow) = input.allow_additional_parts {
            self.allow_additional_parts = allow;
        }
        if let Some(parent) = input.parent_category {
            self.parent_category = Some(parent.id());
        }
        if let Some(fields) = input.fields {
            self.fields = replace_by_id(fields);
        }
        if let Some(parts) = input.parts {
            self.parts = replace_part_slots(&self.parts, parts);
        }
        if let Some(groups) = input.part_groups {
            self.part_groups = replace_by_id(groups);
        }
        self.updated_at = Utc::now();
    }

    pub fn part_references(&self) -> Vec<Uuid> {
        self.parts
            .iter()
            .filter_map(|slot| match slot {
                PartSlot::Reference(id) => Some(*id),
                PartSlot::Embedded(_) => None,
            })
            .collect()
    }

    /// Remove every occurrence of a part, including group memberships.
    /// Returns whether anything was removed.
    pub fn detach_part(&mut self, part_id: Uuid) -> bool {
        let before = self.parts.len();
        self.parts.retain(|slot| slot.id() != part_id);
        let mut removed = self.parts.len() != before;

        for group in &mut self.part_groups {
            let before = group.parts.len();
            group.parts.retain(|id| *id != part_id);
            removed |= group.parts.len() != before;
        }
        removed
    }

    pub fn group_mut(&mut self, group_id: Uuid) -> Option<&mut PartGroup> {
        self.part_groups.iter_mut().find(|group| group.id == group_id)
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::new()
    }
}

/// Part entry as returned to clients, with references expanded.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PartView {
    Definition(PartDefinition),
    Embedded(EmbeddedPart),
}

/// Platform as returned to clients: category links and part references are
/// replaced by the documents they point at.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformView {
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: bool,
    #[serde(flatten)]
    pub display: DisplayFlags,
    pub allow_additional_parts: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_category: Option<Category>,
    pub fields: Vec<Field>,
    pub parts: Vec<PartView>,
    pub part_groups: Vec<PartGroup>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
