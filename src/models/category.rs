use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

/// Separator written before every ancestor id in the string form of a path.
const PATH_SEPARATOR: char = ',';

/// Ancestor ids of a category, ordered from the root down to the immediate parent.
///
/// The string form prefixes every id with a comma, so a root is `""`, a child of
/// `A` is `",A"` and a grandchild is `",A,B"`. Every descendant of a node shares
/// the prefix returned by [`MaterializedPath::child_of`], which is what subtree
/// lookups match on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializedPath(Vec<Uuid>);

#[derive(Debug, Error, PartialEq)]
pub enum PathError {
    #[error("materialized path must start with ',': {0}")]
    MissingSeparator(String),

    #[error("invalid ancestor id in materialized path: {0}")]
    InvalidId(String),
}

impl MaterializedPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Path of a node created directly under `parent`.
    pub fn child_of(parent: &Category) -> Self {
        let mut ancestors = parent.path.0.clone();
        ancestors.push(parent.id);
        Self(ancestors)
    }

    pub fn depth(&self) -> i32 {
        self.0.len() as i32
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.0.contains(&id)
    }

    /// True when `self` lies at or below `prefix`.
    pub fn starts_with(&self, prefix: &MaterializedPath) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for MaterializedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for id in &self.0 {
            write!(f, "{PATH_SEPARATOR}{id}")?;
        }
        Ok(())
    }
}

impl FromStr for MaterializedPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }
        let rest = s
            .strip_prefix(PATH_SEPARATOR)
            .ok_or_else(|| PathError::MissingSeparator(s.to_string()))?;

        rest.split(PATH_SEPARATOR)
            .map(|part| Uuid::parse_str(part).map_err(|_| PathError::InvalidId(part.to_string())))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl Serialize for MaterializedPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MaterializedPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// A node in the category forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub parent_id: Option<Uuid>,
    pub path: MaterializedPath,
    pub depth: i32,
    /// Platform whose activation created this node.
    pub platform_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Build a node under `parent` (or as a root), deriving path and depth from it.
    pub fn new(new: NewCategory, parent: Option<&Category>) -> Self {
        let path = parent.map(MaterializedPath::child_of).unwrap_or_default();
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            name: new.name,
            description: new.description,
            parent_id: parent.map(|p| p.id),
            depth: path.depth(),
            path,
            platform_id: new.platform_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Data required to insert a new [`Category`]. Path and depth are never supplied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
    pub parent_id: Option<Uuid>,
    pub platform_id: Option<Uuid>,
}

/// A category with its descendants nested under `children`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Total number of nodes in this subtree, including itself.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeNode::size).sum::<usize>()
    }
}

/// Nest a flat list of categories into a forest.
///
/// Input order is preserved among siblings. A node whose parent is not part of
/// the input becomes a root of the returned forest, which lets the same routine
/// assemble both the full tree and a single subtree.
pub fn build_forest(categories: Vec<Category>) -> Vec<TreeNode> {
    let known: HashSet<Uuid> = categories.iter().map(|c| c.id).collect();
    let mut roots = Vec::new();
    let mut children: HashMap<Uuid, Vec<Category>> = HashMap::new();

    for category in categories {
        match category.parent_id.filter(|parent| known.contains(parent)) {
            Some(parent) => children.entry(parent).or_default().push(category),
            None => roots.push(category),
        }
    }

    roots
        .into_iter()
        .map(|root| attach_children(root, &mut children))
        .collect()
}

fn attach_children(category: Category, children: &mut HashMap<Uuid, Vec<Category>>) -> TreeNode {
    let direct = children.remove(&category.id).unwrap_or_default();
    TreeNode {
        children: direct
            .into_iter()
            .map(|child| attach_children(child, children))
            .collect(),
        category,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str, parent: Option<&Category>) -> Category {
        Category::new(
            NewCategory {
                name: name.to_string(),
                ..Default::default()
            },
            parent,
        )
    }

    #[test]
    fn root_has_empty_path_and_zero_depth() {
        let root = named("balls", None);
        assert!(root.parent_id.is_none());
        assert_eq!(root.path.to_string(), "");
        assert_eq!(root.depth, 0);
    }

    #[test]
    fn child_path_appends_parent_id() {
        let root = named("balls", None);
        let child = named("child", Some(&root));
        let grandchild = named("grandchild", Some(&child));

        assert_eq!(child.parent_id, Some(root.id));
        assert_eq!(child.path.to_string(), format!(",{}", root.id));
        assert_eq!(child.depth, 1);

        assert_eq!(grandchild.path.to_string(), format!(",{},{}", root.id, child.id));
        assert_eq!(grandchild.depth, child.depth + 1);
        assert!(grandchild.path.contains(root.id));
        assert!(!root.path.contains(grandchild.id));
    }

    #[test]
    fn path_parses_its_own_string_form() {
        let root = named("a", None);
        let child = named("b", Some(&root));
        let path = MaterializedPath::child_of(&child);

        let parsed: MaterializedPath = path.to_string().parse().unwrap();
        assert_eq!(parsed, path);
        assert_eq!(parsed.0, vec![root.id, child.id]);
        assert!(parsed.starts_with(&child.path));
    }

    #[test]
    fn path_rejects_malformed_strings() {
        let id = Uuid::new_v4();
        assert!(matches!(
            id.to_string().parse::<MaterializedPath>(),
            Err(PathError::MissingSeparator(_))
        ));
        assert!(matches!(
            ",not-a-uuid".parse::<MaterializedPath>(),
            Err(PathError::InvalidId(_))
        ));
    }

    #[test]
    fn category_serializes_path_as_string() {
        let root = named("balls", None);
        let child = named("child", Some(&root));
        let value = serde_json::to_value(&child).unwrap();

        assert_eq!(value["path"], format!(",{}", root.id));
        assert_eq!(value["parentId"], root.id.to_string());
        assert_eq!(value["depth"], 1);
    }

    #[test]
    fn forest_of_nothing_is_empty() {
        assert!(build_forest(Vec::new()).is_empty());
        let json = serde_json::to_value(build_forest(Vec::new())).unwrap();
        assert!(json.is_array());
    }

    #[test]
    fn forest_nests_children_in_insertion_order() {
        let a = named("a", None);
        let b = named("b", None);
        let a1 = named("a1", Some(&a));
        let a2 = named("a2", Some(&a));
        let a1x = named("a1x", Some(&a1));

        let forest = build_forest(vec![a.clone(), a1.clone(), b.clone(), a2.clone(), a1x.clone()]);

        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].category.id, a.id);
        assert_eq!(forest[1].category.id, b.id);
        assert!(forest[1].children.is_empty());

        let names: Vec<_> = forest[0].children.iter().map(|n| n.category.name.as_str()).collect();
        assert_eq!(names, ["a1", "a2"]);
        assert_eq!(forest[0].children[0].children[0].category.id, a1x.id);
        assert_eq!(forest[0].size(), 4);
    }

    #[test]
    fn leaf_serializes_with_empty_children_array() {
        let forest = build_forest(vec![named("leaf", None)]);
        let json = serde_json::to_value(&forest).unwrap();
        assert_eq!(json[0]["name"], "leaf");
        assert_eq!(json[0]["children"], serde_json::json!([]));
    }

    #[test]
    fn orphaned_nodes_become_roots_of_a_subtree() {
        let a = named("a", None);
        let a1 = named("a1", Some(&a));
        let a1x = named("a1x", Some(&a1));

        let subtree = build_forest(vec![a1.clone(), a1x.clone()]);
        assert_eq!(subtree.len(), 1);
        assert_eq!(subtree[0].category.id, a1.id);
        assert_eq!(subtree[0].children[0].category.id, a1x.id);
    }
}
