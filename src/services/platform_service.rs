use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use super::category_service::CategoryTree;
use super::ServiceError;
use crate::database::{Store, UnitOfWork};
use crate::models::{
    Category, NewCategory, PartSlot, PartView, Platform, PlatformInput, PlatformView,
};
use crate::validation::validate_platform;

/// What [`PlatformSync::synchronize`] did to the platform's category.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    Created(Category),
    Updated(Category),
    Unchanged,
}

/// Keeps a platform's category in step with the platform document.
///
/// An active platform without a category gets one, nested under its declared
/// parent category. A platform that already has one pushes its name and
/// description down to it. Deactivating never removes the category.
pub struct PlatformSync<'u> {
    tree: CategoryTree<'u>,
}

impl<'u> PlatformSync<'u> {
    pub fn new(uow: &'u mut dyn UnitOfWork) -> Self {
        Self {
            tree: CategoryTree::new(uow),
        }
    }

    /// Run after the platform document is written. On `Created` the platform's
    /// `category` link is set and the caller must write the document again.
    pub async fn synchronize(&mut self, platform: &mut Platform) -> Result<SyncOutcome, ServiceError> {
        let name = platform.name.clone().unwrap_or_default();
        let description = platform.description.clone().unwrap_or_default();

        if platform.active && platform.category.is_none() {
            let category = self
                .tree
                .insert(NewCategory {
                    name,
                    description,
                    parent_id: platform.parent_category,
                    platform_id: Some(platform.id),
                })
                .await?;
            debug!(platform_id = %platform.id, category_id = %category.id, "Linked new category");
            platform.category = Some(category.id);
            return Ok(SyncOutcome::Created(category));
        }

        if let Some(category_id) = platform.category {
            let category = self.tree.update(category_id, name, description).await?;
            debug!(platform_id = %platform.id, category_id = %category.id, "Refreshed linked category");
            return Ok(SyncOutcome::Updated(category));
        }

        debug!(platform_id = %platform.id, "Inactive platform, no category");
        Ok(SyncOutcome::Unchanged)
    }
}

/// Write a platform and bring its category in line, inside one unit of work.
async fn write_synchronized(
    uow: &mut dyn UnitOfWork,
    platform: &mut Platform,
    exists: bool,
) -> Result<SyncOutcome, ServiceError> {
    if exists {
        uow.update_platform(platform).await?;
    } else {
        uow.insert_platform(platform).await?;
    }

    let outcome = PlatformSync::new(&mut *uow).synchronize(platform).await?;
    if matches!(outcome, SyncOutcome::Created(_)) {
        uow.update_platform(platform).await?;
    }
    Ok(outcome)
}

/// Replace category links and part references with the documents they name.
pub(crate) async fn expand(
    uow: &mut dyn UnitOfWork,
    platform: Platform,
) -> Result<PlatformView, ServiceError> {
    let category = match platform.category {
        Some(id) => uow.find_category(id).await?,
        None => None,
    };
    let parent_category = match platform.parent_category {
        Some(id) => uow.find_category(id).await?,
        None => None,
    };

    let mut definitions: HashMap<Uuid, _> = uow
        .find_parts(&platform.part_references())
        .await?
        .into_iter()
        .map(|part| (part.id, part))
        .collect();

    // References whose definition is gone are dropped from the view.
    let parts = platform
        .parts
        .into_iter()
        .filter_map(|slot| match slot {
            PartSlot::Reference(id) => definitions.remove(&id).map(PartView::Definition),
            PartSlot::Embedded(part) => Some(PartView::Embedded(part)),
        })
        .collect();

    Ok(PlatformView {
        id: platform.id,
        name: platform.name,
        description: platform.description,
        active: platform.active,
        display: platform.display,
        allow_additional_parts: platform.allow_additional_parts,
        category,
        parent_category,
        fields: platform.fields,
        parts,
        part_groups: platform.part_groups,
        created_at: platform.created_at,
        updated_at: platform.updated_at,
    })
}

#[derive(Clone)]
pub struct PlatformService {
    store: Arc<dyn Store>,
}

impl PlatformService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, input: PlatformInput) -> Result<PlatformView, ServiceError> {
        let mut platform = Platform::from_input(input);
        validate_platform(&platform)?;

        let mut uow = self.store.begin().await?;
        let outcome = write_synchronized(uow.as_mut(), &mut platform, false).await?;
        let view = expand(uow.as_mut(), platform).await?;
        uow.commit().await?;

        info!(platform_id = %view.id, active = view.active, ?outcome, "Created platform");
        Ok(view)
    }

    /// Merge `input` into the stored document. The platform stays locked until
    /// commit so concurrent activations see each other's category.
    pub async fn update(&self, id: Uuid, input: PlatformInput) -> Result<PlatformView, ServiceError> {
        let mut uow = self.store.begin().await?;
        let mut platform = uow
            .lock_platform(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("platform", id))?;

        platform.apply(input);
        validate_platform(&platform)?;

        let outcome = write_synchronized(uow.as_mut(), &mut platform, true).await?;
        let view = expand(uow.as_mut(), platform).await?;
        uow.commit().await?;

        info!(platform_id = %id, active = view.active, ?outcome, "Updated platform");
        Ok(view)
    }

    pub async fn get(&self, id: Uuid) -> Result<PlatformView, ServiceError> {
        let mut uow = self.store.begin().await?;
        let platform = uow
            .find_platform(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("platform", id))?;
        let view = expand(uow.as_mut(), platform).await?;
        Ok(view)
    }

    pub async fn list(&self) -> Result<Vec<PlatformView>, ServiceError> {
        let mut uow = self.store.begin().await?;
        let platforms = uow.list_platforms().await?;

        let mut views = Vec::with_capacity(platforms.len());
        for platform in platforms {
            views.push(expand(uow.as_mut(), platform).await?);
        }
        Ok(views)
    }

    /// Delete a platform and its category. Part definitions are left alone.
    ///
    /// Fails with a conflict, writing nothing, while other platforms' categories
    /// are nested under this one's.
    pub async fn delete(&self, id: Uuid) -> Result<Platform, ServiceError> {
        let mut uow = self.store.begin().await?;
        let platform = uow
            .lock_platform(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("platform", id))?;

        uow.delete_platform(id).await?;
        if let Some(category_id) = platform.category {
            CategoryTree::new(uow.as_mut()).delete(category_id).await?;
        }
        uow.commit().await?;

        info!(platform_id = %id, "Deleted platform");
        Ok(platform)
    }

    /// Delete every platform and every category they own. Returns how many
    /// platforms were removed.
    pub async fn delete_all(&self) -> Result<usize, ServiceError> {
        let mut uow = self.store.begin().await?;
        let platforms = uow.list_platforms().await?;

        let owned: Vec<Uuid> = platforms.iter().filter_map(|p| p.category).collect();
        let mut categories: Vec<Category> = uow
            .list_categories()
            .await?
            .into_iter()
            .filter(|c| owned.contains(&c.id))
            .collect();
        // Children go before their parents.
        categories.sort_by(|a, b| b.depth.cmp(&a.depth));

        for platform in &platforms {
            uow.delete_platform(platform.id).await?;
        }
        {
            let mut tree = CategoryTree::new(uow.as_mut());
            for category in &categories {
                tree.delete(category.id).await?;
            }
        }
        uow.commit().await?;

        info!(count = platforms.len(), "Deleted all platforms");
        Ok(platforms.len())
    }
}
