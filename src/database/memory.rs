use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::manager::DatabaseError;
use super::store::{Store, UnitOfWork};
use crate::models::{Category, MaterializedPath, PartDefinition, Platform};

#[derive(Debug, Clone, Default)]
struct Collections {
    categories: Vec<Category>,
    platforms: Vec<Platform>,
    parts: Vec<PartDefinition>,
}

/// Process-local store used by tests and `--memory` mode.
///
/// A unit of work holds the whole store lock from `begin` until it is
/// committed or dropped, so transactions are fully serialized.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, DatabaseError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryUnitOfWork { guard, staged }))
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Works on a copy of the collections and swaps it in on commit.
struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<Collections>,
    staged: Collections,
}

fn replace<T>(items: &mut [T], matches: impl Fn(&T) -> bool, value: &T, what: &str) -> Result<(), DatabaseError>
where
    T: Clone,
{
    let slot = items
        .iter_mut()
        .find(|item| matches(item))
        .ok_or_else(|| DatabaseError::NotFound(format!("{} not found", what)))?;
    *slot = value.clone();
    Ok(())
}

fn remove<T>(items: &mut Vec<T>, matches: impl Fn(&T) -> bool) -> bool {
    let before = items.len();
    items.retain(|item| !matches(item));
    items.len() != before
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn find_category(&mut self, id: Uuid) -> Result<Option<Category>, DatabaseError> {
        Ok(self.staged.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn list_categories(&mut self) -> Result<Vec<Category>, DatabaseError> {
        Ok(self.staged.categories.clone())
    }

    async fn list_subtree(&mut self, root: &Category) -> Result<Vec<Category>, DatabaseError> {
        let prefix = MaterializedPath::child_of(root);
        Ok(self
            .staged
            .categories
            .iter()
            .filter(|c| c.id == root.id || c.path.starts_with(&prefix))
            .cloned()
            .collect())
    }

    async fn insert_category(&mut self, category: &Category) -> Result<(), DatabaseError> {
        let categories = &mut self.staged.categories;
        if categories.iter().any(|c| c.id == category.id) {
            return Err(DatabaseError::Conflict(format!("category {} already exists", category.id)));
        }
        if let Some(owner) = category.platform_id {
            if categories.iter().any(|c| c.platform_id == Some(owner)) {
                return Err(DatabaseError::Conflict(
                    "duplicate value violates unique constraint: uq_categories_platform_id".to_string(),
                ));
            }
        }
        categories.push(category.clone());
        Ok(())
    }

    async fn update_category(&mut self, category: &Category) -> Result<(), DatabaseError> {
        replace(&mut self.staged.categories, |c| c.id == category.id, category, "category")
    }

    async fn delete_category(&mut self, id: Uuid) -> Result<bool, DatabaseError> {
        if self.staged.categories.iter().any(|c| c.path.contains(id)) {
            return Err(DatabaseError::Conflict(format!(
                "category {} still has child categories",
                id
            )));
        }
        Ok(remove(&mut self.staged.categories, |c| c.id == id))
    }

    async fn find_platform(&mut self, id: Uuid) -> Result<Option<Platform>, DatabaseError> {
        Ok(self.staged.platforms.iter().find(|p| p.id == id).cloned())
    }

    async fn lock_platform(&mut self, id: Uuid) -> Result<Option<Platform>, DatabaseError> {
        // The store lock is already held for the whole unit of work.
        self.find_platform(id).await
    }

    async fn list_platforms(&mut self) -> Result<Vec<Platform>, DatabaseError> {
        Ok(self.staged.platforms.clone())
    }

    async fn insert_platform(&mut self, platform: &Platform) -> Result<(), DatabaseError> {
        if self.staged.platforms.iter().any(|p| p.id == platform.id) {
            return Err(DatabaseError::Conflict(format!("platform {} already exists", platform.id)));
        }
        self.staged.platforms.push(platform.clone());
        Ok(())
    }

    async fn update_platform(&mut self, platform: &Platform) -> Result<(), DatabaseError> {
        replace(&mut self.staged.platforms, |p| p.id == platform.id, platform, "platform")
    }

    async fn delete_platform(&mut self, id: Uuid) -> Result<bool, DatabaseError> {
        Ok(remove(&mut self.staged.platforms, |p| p.id == id))
    }

    async fn find_part(&mut self, id: Uuid) -> Result<Option<PartDefinition>, DatabaseError> {
        Ok(self.staged.parts.iter().find(|p| p.id == id).cloned())
    }

    async fn find_parts(&mut self, ids: &[Uuid]) -> Result<Vec<PartDefinition>, DatabaseError> {
        Ok(self
            .staged
            .parts
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn insert_part(&mut self, part: &PartDefinition) -> Result<(), DatabaseError> {
        if self.staged.parts.iter().any(|p| p.id == part.id) {
            return Err(DatabaseError::Conflict(format!("part definition {} already exists", part.id)));
        }
        self.staged.parts.push(part.clone());
        Ok(())
    }

    async fn update_part(&mut self, part: &PartDefinition) -> Result<(), DatabaseError> {
        replace(&mut self.staged.parts, |p| p.id == part.id, part, "part definition")
    }

    async fn delete_part(&mut self, id: Uuid) -> Result<bool, DatabaseError> {
        Ok(remove(&mut self.staged.parts, |p| p.id == id))
    }

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError> {
        let MemoryUnitOfWork { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewCategory;

    fn category(name: &str, owner: Option<Uuid>, parent: Option<&Category>) -> Category {
        Category::new(
            NewCategory {
                name: name.to_string(),
                platform_id: owner,
                ..Default::default()
            },
            parent,
        )
    }

    #[tokio::test]
    async fn dropped_unit_of_work_rolls_back() {
        let store = MemoryStore::new();

        let mut uow = store.begin().await.unwrap();
        uow.insert_platform(&Platform::new()).await.unwrap();
        drop(uow);

        let mut uow = store.begin().await.unwrap();
        assert!(uow.list_platforms().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn committed_writes_are_visible_to_the_next_unit() {
        let store = MemoryStore::new();
        let platform = Platform::new();

        let mut uow = store.begin().await.unwrap();
        uow.insert_platform(&platform).await.unwrap();
        uow.commit().await.unwrap();

        let mut uow = store.begin().await.unwrap();
        assert_eq!(uow.find_platform(platform.id).await.unwrap(), Some(platform));
    }

    #[tokio::test]
    async fn second_category_for_same_owner_conflicts() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let mut uow = store.begin().await.unwrap();

        uow.insert_category(&category("first", Some(owner), None)).await.unwrap();
        let err = uow
            .insert_category(&category("second", Some(owner), None))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));
    }

    #[tokio::test]
    async fn subtree_follows_path_prefix() {
        let store = MemoryStore::new();
        let root = category("root", None, None);
        let child = category("child", None, Some(&root));
        let grandchild = category("grandchild", None, Some(&child));
        let other = category("other", None, None);

        let mut uow = store.begin().await.unwrap();
        for c in [&root, &child, &grandchild, &other] {
            uow.insert_category(c).await.unwrap();
        }

        let ids: Vec<_> = uow.list_subtree(&child).await.unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![child.id, grandchild.id]);

        let err = uow.delete_category(root.id).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));
        assert!(uow.delete_category(grandchild.id).await.unwrap());
    }
}
