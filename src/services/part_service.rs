use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::ServiceError;
use crate::database::{Store, UnitOfWork};
use crate::models::{PartDefinition, PartDefinitionInput, PartGroup, PartGroupInput, PartSlot, Platform};

/// Result of detaching a part from a platform.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedPart {
    pub id: Uuid,
    /// The platform referenced or embedded the part.
    pub detached: bool,
    /// The definition was inactive and has been deleted.
    pub deleted: bool,
}

/// Part definitions and part groups hanging off a platform.
#[derive(Clone)]
pub struct PartService {
    store: Arc<dyn Store>,
}

async fn locked_platform(uow: &mut dyn UnitOfWork, id: Uuid) -> Result<Platform, ServiceError> {
    uow.lock_platform(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("platform", id))
}

impl PartService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Create an inactive definition owned by the platform and append a
    /// reference to it.
    pub async fn add_part(
        &self,
        platform_id: Uuid,
        input: PartDefinitionInput,
    ) -> Result<PartDefinition, ServiceError> {
        let mut uow = self.store.begin().await?;
        let mut platform = locked_platform(uow.as_mut(), platform_id).await?;

        let part = PartDefinition::new(platform_id, input);
        uow.insert_part(&part).await?;

        platform.parts.push(PartSlot::Reference(part.id));
        platform.updated_at = Utc::now();
        uow.update_platform(&platform).await?;
        uow.commit().await?;

        info!(platform_id = %platform_id, part_id = %part.id, "Added part definition");
        Ok(part)
    }

    pub async fn update_part(
        &self,
        part_id: Uuid,
        input: PartDefinitionInput,
    ) -> Result<PartDefinition, ServiceError> {
        let mut uow = self.store.begin().await?;
        let mut part = uow
            .find_part(part_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("part", part_id))?;

        part.apply(input);
        uow.update_part(&part).await?;
        uow.commit().await?;
        Ok(part)
    }

    /// Detach a part from the platform's slots and groups. An inactive
    /// definition this platform created is deleted along with it; any other
    /// definition may be referenced elsewhere and is kept.
    pub async fn remove_part(&self, platform_id: Uuid, part_id: Uuid) -> Result<RemovedPart, ServiceError> {
        let mut uow = self.store.begin().await?;
        let mut platform = locked_platform(uow.as_mut(), platform_id).await?;

        if !platform.detach_part(part_id) {
            return Err(ServiceError::not_found("part", part_id));
        }
        platform.updated_at = Utc::now();
        uow.update_platform(&platform).await?;

        let deleted = match uow.find_part(part_id).await? {
            Some(part) if !part.active && part.created_platform_id == platform_id => {
                uow.delete_part(part.id).await?
            }
            _ => false,
        };
        uow.commit().await?;

        info!(platform_id = %platform_id, part_id = %part_id, deleted, "Removed part");
        Ok(RemovedPart {
            id: part_id,
            detached: true,
            deleted,
        })
    }

    pub async fn add_group(&self, platform_id: Uuid, input: PartGroupInput) -> Result<PartGroup, ServiceError> {
        let mut uow = self.store.begin().await?;
        let mut platform = locked_platform(uow.as_mut(), platform_id).await?;

        let group = PartGroup::from(input);
        if platform.part_groups.iter().any(|g| g.id == group.id) {
            return Err(ServiceError::Conflict(format!(
                "part group {} already exists on platform {}",
                group.id, platform_id
            )));
        }

        platform.part_groups.push(group.clone());
        platform.updated_at = Utc::now();
        uow.update_platform(&platform).await?;
        uow.commit().await?;
        Ok(group)
    }

    /// Replace a group's name, description and members. Its id never changes.
    pub async fn update_group(
        &self,
        platform_id: Uuid,
        group_id: Uuid,
        input: PartGroupInput,
    ) -> Result<PartGroup, ServiceError> {
        let mut uow = self.store.begin().await?;
        let mut platform = locked_platform(uow.as_mut(), platform_id).await?;

        let group = platform
            .group_mut(group_id)
            .ok_or_else(|| ServiceError::not_found("part group", group_id))?;
        group.name = input.name;
        group.description = input.description;
        group.parts = input.parts;
        let group = group.clone();

        platform.updated_at = Utc::now();
        uow.update_platform(&platform).await?;
        uow.commit().await?;
        Ok(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PartView;
    use crate::testing::{input, part_input, TestContext};
    use serde_json::json;

    #[tokio::test]
    async fn added_part_is_inactive_and_expands_on_platform() {
        let ctx = TestContext::new();
        let platform = ctx.platforms.create(input(json!({ "name": "balls" }))).await.unwrap();

        let part = ctx
            .parts
            .add_part(platform.id, part_input(json!({ "name": "my part", "description": "stuff" })))
            .await
            .unwrap();
        assert!(!part.active);
        assert_eq!(part.created_platform_id, platform.id);

        let view = ctx.platforms.get(platform.id).await.unwrap();
        assert_eq!(view.parts.len(), 1);
        assert!(matches!(&view.parts[0], PartView::Definition(d) if d.id == part.id));
    }

    #[tokio::test]
    async fn add_part_to_missing_platform_is_not_found() {
        let ctx = TestContext::new();
        let err = ctx
            .parts
            .add_part(Uuid::new_v4(), part_input(json!({ "name": "x" })))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { entity: "platform", .. }));
    }

    #[tokio::test]
    async fn update_part_merges_fields() {
        let ctx = TestContext::new();
        let platform = ctx.platforms.create(input(json!({}))).await.unwrap();
        let part = ctx
            .parts
            .add_part(platform.id, part_input(json!({ "name": "before", "type": "ammo" })))
            .await
            .unwrap();

        let updated = ctx
            .parts
            .update_part(part.id, part_input(json!({ "name": "after" })))
            .await
            .unwrap();
        assert_eq!(updated.name.as_deref(), Some("after"));
        assert_eq!(updated.kind.as_deref(), Some("ammo"));
    }

    #[tokio::test]
    async fn removing_inactive_part_deletes_definition() {
        let ctx = TestContext::new();
        let platform = ctx.platforms.create(input(json!({}))).await.unwrap();
        let part = ctx.parts.add_part(platform.id, part_input(json!({}))).await.unwrap();

        let removed = ctx.parts.remove_part(platform.id, part.id).await.unwrap();
        assert!(removed.detached);
        assert!(removed.deleted);

        let mut uow = ctx.store.begin().await.unwrap();
        assert!(uow.find_part(part.id).await.unwrap().is_none());
        assert!(uow.find_platform(platform.id).await.unwrap().unwrap().parts.is_empty());
    }

    #[tokio::test]
    async fn removing_active_part_keeps_definition() {
        let ctx = TestContext::new();
        let platform = ctx.platforms.create(input(json!({}))).await.unwrap();
        let part = ctx.parts.add_part(platform.id, part_input(json!({}))).await.unwrap();
        ctx.parts
            .update_part(part.id, part_input(json!({ "active": true })))
            .await
            .unwrap();

        let removed = ctx.parts.remove_part(platform.id, part.id).await.unwrap();
        assert!(removed.detached);
        assert!(!removed.deleted);

        let mut uow = ctx.store.begin().await.unwrap();
        assert!(uow.find_part(part.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn removing_unknown_part_is_not_found() {
        let ctx = TestContext::new();
        let platform = ctx.platforms.create(input(json!({}))).await.unwrap();
        let err = ctx.parts.remove_part(platform.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { entity: "part", .. }));
    }

    #[tokio::test]
    async fn removing_through_another_platform_leaves_part_alone() {
        let ctx = TestContext::new();
        let owner = ctx.platforms.create(input(json!({ "name": "owner" }))).await.unwrap();
        let other = ctx.platforms.create(input(json!({ "name": "other" }))).await.unwrap();
        let part = ctx.parts.add_part(owner.id, part_input(json!({}))).await.unwrap();

        let err = ctx.parts.remove_part(other.id, part.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { entity: "part", .. }));

        let mut uow = ctx.store.begin().await.unwrap();
        assert!(uow.find_part(part.id).await.unwrap().is_some());
        let stored = uow.find_platform(owner.id).await.unwrap().unwrap();
        assert_eq!(stored.parts, vec![PartSlot::Reference(part.id)]);
    }

    #[tokio::test]
    async fn removing_borrowed_inactive_part_keeps_definition() {
        let ctx = TestContext::new();
        let owner = ctx.platforms.create(input(json!({}))).await.unwrap();
        let part = ctx.parts.add_part(owner.id, part_input(json!({}))).await.unwrap();
        let borrower = ctx
            .platforms
            .create(input(json!({ "parts": [part.id] })))
            .await
            .unwrap();

        let removed = ctx.parts.remove_part(borrower.id, part.id).await.unwrap();
        assert!(removed.detached);
        assert!(!removed.deleted);

        let view = ctx.platforms.get(owner.id).await.unwrap();
        assert_eq!(view.parts.len(), 1);
    }

    #[tokio::test]
    async fn removing_embedded_part_detaches_it() {
        let ctx = TestContext::new();
        let platform = ctx
            .platforms
            .create(input(json!({ "parts": [{ "name": "inline" }] })))
            .await
            .unwrap();
        let embedded = match &platform.parts[0] {
            PartView::Embedded(part) => part.id,
            other => panic!("expected embedded part, got {:?}", other),
        };

        let removed = ctx.parts.remove_part(platform.id, embedded).await.unwrap();
        assert!(removed.detached);
        assert!(!removed.deleted);
    }

    #[tokio::test]
    async fn groups_are_added_and_replaced() {
        let ctx = TestContext::new();
        let platform = ctx.platforms.create(input(json!({}))).await.unwrap();
        let part = ctx.parts.add_part(platform.id, part_input(json!({}))).await.unwrap();

        let group = ctx
            .parts
            .add_group(
                platform.id,
                serde_json::from_value(json!({ "name": "Lower", "description": "Lower receiver" })).unwrap(),
            )
            .await
            .unwrap();
        assert!(group.parts.is_empty());

        let updated = ctx
            .parts
            .update_group(
                platform.id,
                group.id,
                serde_json::from_value(json!({ "name": "Upper", "parts": [part.id] })).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(updated.id, group.id);
        assert_eq!(updated.name.as_deref(), Some("Upper"));
        assert_eq!(updated.description, None);
        assert_eq!(updated.parts, vec![part.id]);

        let view = ctx.platforms.get(platform.id).await.unwrap();
        assert_eq!(view.part_groups, vec![updated]);

        ctx.parts.remove_part(platform.id, part.id).await.unwrap();
        let view = ctx.platforms.get(platform.id).await.unwrap();
        assert!(view.part_groups[0].parts.is_empty());
    }

    #[tokio::test]
    async fn updating_unknown_group_is_not_found() {
        let ctx = TestContext::new();
        let platform = ctx.platforms.create(input(json!({}))).await.unwrap();
        let err = ctx
            .parts
            .update_group(platform.id, Uuid::new_v4(), PartGroupInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { entity: "part group", .. }));
    }
}
