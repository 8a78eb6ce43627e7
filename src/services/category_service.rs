use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use super::ServiceError;
use crate::database::{Store, UnitOfWork};
use crate::models::{build_forest, Category, NewCategory, TreeNode};

/// Category hierarchy operations scoped to one unit of work.
///
/// Paths and depths are derived here from the parent at insert time and never
/// rewritten afterwards.
pub struct CategoryTree<'u> {
    uow: &'u mut dyn UnitOfWork,
}

impl<'u> CategoryTree<'u> {
    pub fn new(uow: &'u mut dyn UnitOfWork) -> Self {
        Self { uow }
    }

    /// Insert a node under `new.parent_id`, or as a root when there is none.
    pub async fn insert(&mut self, new: NewCategory) -> Result<Category, ServiceError> {
        let parent = match new.parent_id {
            Some(parent_id) => Some(
                self.uow
                    .find_category(parent_id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("category", parent_id))?,
            ),
            None => None,
        };

        let category = Category::new(new, parent.as_ref());
        self.uow.insert_category(&category).await?;

        info!(
            category_id = %category.id,
            depth = category.depth,
            "Created category '{}'",
            category.name
        );
        Ok(category)
    }

    /// Patch name and description; structure is left alone.
    pub async fn update(
        &mut self,
        id: Uuid,
        name: String,
        description: String,
    ) -> Result<Category, ServiceError> {
        let mut category = self.get(id).await?;
        category.name = name;
        category.description = description;
        category.updated_at = Utc::now();

        self.uow.update_category(&category).await?;
        Ok(category)
    }

    pub async fn get(&mut self, id: Uuid) -> Result<Category, ServiceError> {
        self.uow
            .find_category(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("category", id))
    }

    pub async fn full_tree(&mut self) -> Result<Vec<TreeNode>, ServiceError> {
        let categories = self.uow.list_categories().await?;
        Ok(build_forest(categories))
    }

    pub async fn subtree(&mut self, id: Uuid) -> Result<TreeNode, ServiceError> {
        let root = self.get(id).await?;
        let nodes = self.uow.list_subtree(&root).await?;

        // The root's parent is outside the set, so it is the only top-level node.
        let node = build_forest(nodes)
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::not_found("category", id))?;
        debug!(category_id = %id, nodes = node.size(), "Loaded subtree");
        Ok(node)
    }

    pub async fn delete(&mut self, id: Uuid) -> Result<bool, ServiceError> {
        let deleted = self.uow.delete_category(id).await?;
        if deleted {
            info!(category_id = %id, "Deleted category");
        }
        Ok(deleted)
    }
}

/// Read-only category access over the shared store.
#[derive(Clone)]
pub struct CategoryService {
    store: Arc<dyn Store>,
}

impl CategoryService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn get(&self, id: Uuid) -> Result<Category, ServiceError> {
        let mut uow = self.store.begin().await?;
        let category = CategoryTree::new(uow.as_mut()).get(id).await?;
        Ok(category)
    }

    pub async fn full_tree(&self) -> Result<Vec<TreeNode>, ServiceError> {
        let mut uow = self.store.begin().await?;
        let forest = CategoryTree::new(uow.as_mut()).full_tree().await?;
        Ok(forest)
    }

    pub async fn subtree(&self, id: Uuid) -> Result<TreeNode, ServiceError> {
        let mut uow = self.store.begin().await?;
        let subtree = CategoryTree::new(uow.as_mut()).subtree(id).await?;
        Ok(subtree)
    }
}
