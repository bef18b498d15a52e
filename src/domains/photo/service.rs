use crate::domains::core::repository::FindById;
use crate::domains::photo::repository::PhotoRepository;
use crate::domains::photo::types::{NewPhoto, Photo, UpdatePhoto};
use crate::domains::timeline::linkage::YearLinkageResolver;
use crate::domains::timeline::types::{LinkableEntity, LinkageOutcome, SaveOutcome};
use crate::errors::ServiceResult;
use crate::types::EntityKind;
use crate::validation::Validate;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

#[async_trait]
pub trait PhotoService: Send + Sync {
    async fn create_photo(&self, new_photo: NewPhoto) -> ServiceResult<SaveOutcome<Photo>>;

    async fn get_photo(&self, id: Uuid) -> ServiceResult<Photo>;

    async fn update_photo(&self, id: Uuid, update_data: UpdatePhoto) -> ServiceResult<SaveOutcome<Photo>>;

    async fn delete_photo(&self, id: Uuid) -> ServiceResult<LinkageOutcome>;

    /// A year's gallery
    async fn list_photos_for_year(&self, rotary_year_id: Uuid) -> ServiceResult<Vec<Photo>>;
}

pub struct PhotoServiceImpl {
    repo: Arc<dyn PhotoRepository>,
    resolver: Arc<YearLinkageResolver>,
}

impl PhotoServiceImpl {
    pub fn new(repo: Arc<dyn PhotoRepository>, resolver: Arc<YearLinkageResolver>) -> Self {
        Self { repo, resolver }
    }

    async fn link(&self, mut photo: Photo, previous: Option<&Photo>) -> SaveOutcome<Photo> {
        let linkage = self
            .resolver
            .on_entity_saved(&photo, previous.map(|p| p as &dyn LinkableEntity))
            .await;
        for warning in &linkage.warnings {
            log::warn!("Photo {}: {}", photo.id, warning);
        }
        photo.rotary_year_id = linkage.rotary_year_id;
        SaveOutcome { entity: photo, linkage }
    }
}

#[async_trait]
impl PhotoService for PhotoServiceImpl {
    async fn create_photo(&self, new_photo: NewPhoto) -> ServiceResult<SaveOutcome<Photo>> {
        new_photo.validate()?;

        let photo = self.repo.create(&new_photo).await?;
        Ok(self.link(photo, None).await)
    }

    async fn get_photo(&self, id: Uuid) -> ServiceResult<Photo> {
        Ok(self.repo.find_by_id(id).await?)
    }

    async fn update_photo(&self, id: Uuid, update_data: UpdatePhoto) -> ServiceResult<SaveOutcome<Photo>> {
        update_data.validate()?;

        let before = self.repo.find_by_id(id).await?;
        let photo = self.repo.update(id, &update_data).await?;
        Ok(self.link(photo, Some(&before)).await)
    }

    async fn delete_photo(&self, id: Uuid) -> ServiceResult<LinkageOutcome> {
        let photo = self.repo.find_by_id(id).await?;
        self.repo.delete(id).await?;

        Ok(self
            .resolver
            .on_entity_deleted(EntityKind::Photo, photo.rotary_year_id)
            .await)
    }

    async fn list_photos_for_year(&self, rotary_year_id: Uuid) -> ServiceResult<Vec<Photo>> {
        Ok(self.repo.find_by_rotary_year(rotary_year_id).await?)
    }
}
