use async_trait::async_trait;
use uuid::Uuid;

use super::manager::DatabaseError;
use crate::models::{Category, PartDefinition, Platform};

/// Handle to the document store. Cheap to share behind an `Arc`.
#[async_trait]
pub trait Store: Send + Sync {
    /// Open a unit of work. Writes made through it become visible only on
    /// [`UnitOfWork::commit`]; dropping it discards them.
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, DatabaseError>;

    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), DatabaseError>;

    fn backend_name(&self) -> &'static str;
}

/// All collection operations, scoped to one atomic transaction.
#[async_trait]
pub trait UnitOfWork: Send {
    // Categories

    async fn find_category(&mut self, id: Uuid) -> Result<Option<Category>, DatabaseError>;

    /// Every category in insertion order.
    async fn list_categories(&mut self) -> Result<Vec<Category>, DatabaseError>;

    /// `root` followed by all of its descendants, in insertion order.
    async fn list_subtree(&mut self, root: &Category) -> Result<Vec<Category>, DatabaseError>;

    /// Fails with `Conflict` when the owning platform already has a category.
    async fn insert_category(&mut self, category: &Category) -> Result<(), DatabaseError>;

    async fn update_category(&mut self, category: &Category) -> Result<(), DatabaseError>;

    /// Fails with `Conflict` while other categories still hang below it.
    async fn delete_category(&mut self, id: Uuid) -> Result<bool, DatabaseError>;

    // Platforms

    async fn find_platform(&mut self, id: Uuid) -> Result<Option<Platform>, DatabaseError>;

    /// Like [`UnitOfWork::find_platform`] but holds the document until commit so
    /// concurrent writers to the same platform run one after the other.
    async fn lock_platform(&mut self, id: Uuid) -> Result<Option<Platform>, DatabaseError>;

    async fn list_platforms(&mut self) -> Result<Vec<Platform>, DatabaseError>;

    async fn insert_platform(&mut self, platform: &Platform) -> Result<(), DatabaseError>;

    async fn update_platform(&mut self, platform: &Platform) -> Result<(), DatabaseError>;

    async fn delete_platform(&mut self, id: Uuid) -> Result<bool, DatabaseError>;

    // Part definitions

    async fn find_part(&mut self, id: Uuid) -> Result<Option<PartDefinition>, DatabaseError>;

    /// Definitions for the given ids; unknown ids are skipped.
    async fn find_parts(&mut self, ids: &[Uuid]) -> Result<Vec<PartDefinition>, DatabaseError>;

    async fn insert_part(&mut self, part: &PartDefinition) -> Result<(), DatabaseError>;

    async fn update_part(&mut self, part: &PartDefinition) -> Result<(), DatabaseError>;

    async fn delete_part(&mut self, id: Uuid) -> Result<bool, DatabaseError>;

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError>;
}
