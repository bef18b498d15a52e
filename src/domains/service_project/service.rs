use crate::domains::core::repository::FindById;
use crate::domains::service_project::repository::ServiceProjectRepository;
use crate::domains::service_project::types::{
    validate_date_order, NewServiceProject, ServiceProject, UpdateServiceProject,
};
use crate::domains::timeline::linkage::YearLinkageResolver;
use crate::domains::timeline::types::{LinkableEntity, LinkageOutcome, SaveOutcome};
use crate::errors::ServiceResult;
use crate::types::EntityKind;
use crate::validation::Validate;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Trait defining service project operations. Every write is followed by
/// rotary year linkage.
#[async_trait]
pub trait ServiceProjectService: Send + Sync {
    async fn create_project(&self, new_project: NewServiceProject) -> ServiceResult<SaveOutcome<ServiceProject>>;

    async fn get_project(&self, id: Uuid) -> ServiceResult<ServiceProject>;

    async fn update_project(
        &self,
        id: Uuid,
        update_data: UpdateServiceProject,
    ) -> ServiceResult<SaveOutcome<ServiceProject>>;

    async fn delete_project(&self, id: Uuid) -> ServiceResult<LinkageOutcome>;

    async fn list_projects_for_year(&self, rotary_year_id: Uuid) -> ServiceResult<Vec<ServiceProject>>;
}

/// Implementation of the service project service
pub struct ServiceProjectServiceImpl {
    repo: Arc<dyn ServiceProjectRepository>,
    resolver: Arc<YearLinkageResolver>,
}

impl ServiceProjectServiceImpl {
    pub fn new(repo: Arc<dyn ServiceProjectRepository>, resolver: Arc<YearLinkageResolver>) -> Self {
        Self { repo, resolver }
    }

    async fn link(
        &self,
        mut project: ServiceProject,
        previous: Option<&ServiceProject>,
    ) -> SaveOutcome<ServiceProject> {
        let linkage = self
            .resolver
            .on_entity_saved(&project, previous.map(|p| p as &dyn LinkableEntity))
            .await;
        for warning in &linkage.warnings {
            log::warn!("Service project {}: {}", project.id, warning);
        }
        project.rotary_year_id = linkage.rotary_year_id;
        SaveOutcome { entity: project, linkage }
    }
}

#[async_trait]
impl ServiceProjectService for ServiceProjectServiceImpl {
    async fn create_project(&self, new_project: NewServiceProject) -> ServiceResult<SaveOutcome<ServiceProject>> {
        new_project.validate()?;

        let project = self.repo.create(&new_project).await?;
        log::debug!("Created service project {} ({})", project.id, project.status.as_str());
        Ok(self.link(project, None).await)
    }

    async fn get_project(&self, id: Uuid) -> ServiceResult<ServiceProject> {
        Ok(self.repo.find_by_id(id).await?)
    }

    async fn update_project(
        &self,
        id: Uuid,
        update_data: UpdateServiceProject,
    ) -> ServiceResult<SaveOutcome<ServiceProject>> {
        update_data.validate()?;

        let before = self.repo.find_by_id(id).await?;
        validate_date_order(
            update_data.start_date.unwrap_or(before.start_date),
            update_data.completion_date.unwrap_or(before.completion_date),
        )?;

        let project = self.repo.update(id, &update_data).await?;
        Ok(self.link(project, Some(&before)).await)
    }

    async fn delete_project(&self, id: Uuid) -> ServiceResult<LinkageOutcome> {
        let project = self.repo.find_by_id(id).await?;
        self.repo.delete(id).await?;
        log::debug!("Deleted service project {}", id);

        Ok(self
            .resolver
            .on_entity_deleted(EntityKind::ServiceProject, project.rotary_year_id)
            .await)
    }

    async fn list_projects_for_year(&self, rotary_year_id: Uuid) -> ServiceResult<Vec<ServiceProject>> {
        Ok(self.repo.find_by_rotary_year(rotary_year_id).await?)
    }
}
