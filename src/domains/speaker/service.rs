use crate::domains::core::repository::FindById;
use crate::domains::speaker::repository::SpeakerRepository;
use crate::domains::speaker::types::{NewSpeaker, Speaker, UpdateSpeaker};
use crate::domains::timeline::linkage::YearLinkageResolver;
use crate::domains::timeline::types::{LinkableEntity, LinkageOutcome, SaveOutcome};
use crate::errors::ServiceResult;
use crate::types::EntityKind;
use crate::validation::Validate;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Trait defining speaker pipeline operations
#[async_trait]
pub trait SpeakerService: Send + Sync {
    async fn create_speaker(&self, new_speaker: NewSpeaker) -> ServiceResult<SaveOutcome<Speaker>>;

    async fn get_speaker(&self, id: Uuid) -> ServiceResult<Speaker>;

    async fn update_speaker(&self, id: Uuid, update_data: UpdateSpeaker) -> ServiceResult<SaveOutcome<Speaker>>;

    async fn delete_speaker(&self, id: Uuid) -> ServiceResult<LinkageOutcome>;

    async fn list_speakers_for_year(&self, rotary_year_id: Uuid) -> ServiceResult<Vec<Speaker>>;
}

pub struct SpeakerServiceImpl {
    repo: Arc<dyn SpeakerRepository>,
    resolver: Arc<YearLinkageResolver>,
}

impl SpeakerServiceImpl {
    pub fn new(repo: Arc<dyn SpeakerRepository>, resolver: Arc<YearLinkageResolver>) -> Self {
        Self { repo, resolver }
    }

    async fn link(&self, mut speaker: Speaker, previous: Option<&Speaker>) -> SaveOutcome<Speaker> {
        let linkage = self
            .resolver
            .on_entity_saved(&speaker, previous.map(|p| p as &dyn LinkableEntity))
            .await;
        for warning in &linkage.warnings {
            log::warn!("Speaker {}: {}", speaker.id, warning);
        }
        speaker.rotary_year_id = linkage.rotary_year_id;
        SaveOutcome { entity: speaker, linkage }
    }
}

#[async_trait]
impl SpeakerService for SpeakerServiceImpl {
    async fn create_speaker(&self, new_speaker: NewSpeaker) -> ServiceResult<SaveOutcome<Speaker>> {
        new_speaker.validate()?;

        let speaker = self.repo.create(&new_speaker).await?;
        Ok(self.link(speaker, None).await)
    }

    async fn get_speaker(&self, id: Uuid) -> ServiceResult<Speaker> {
        Ok(self.repo.find_by_id(id).await?)
    }

    async fn update_speaker(&self, id: Uuid, update_data: UpdateSpeaker) -> ServiceResult<SaveOutcome<Speaker>> {
        update_data.validate()?;

        let before = self.repo.find_by_id(id).await?;
        let speaker = self.repo.update(id, &update_data).await?;
        if before.status != speaker.status {
            log::debug!(
                "Speaker {} moved from {} to {}",
                id,
                before.status.as_str(),
                speaker.status.as_str()
            );
        }
        Ok(self.link(speaker, Some(&before)).await)
    }

    async fn delete_speaker(&self, id: Uuid) -> ServiceResult<LinkageOutcome> {
        let speaker = self.repo.find_by_id(id).await?;
        self.repo.delete(id).await?;

        Ok(self
            .resolver
            .on_entity_deleted(EntityKind::Speaker, speaker.rotary_year_id)
            .await)
    }

    async fn list_speakers_for_year(&self, rotary_year_id: Uuid) -> ServiceResult<Vec<Speaker>> {
        Ok(self.repo.find_by_rotary_year(rotary_year_id).await?)
    }
}
