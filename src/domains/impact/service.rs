//! Read-only impact rollups for the dashboard, computed straight from entity
//! rows rather than from the cached per-year stats.
//!
//! Entity-store failures and totals too large to represent degrade to zeros.
//! A malformed fiscal-year filter is still an error.

use crate::domains::impact::types::{AreaImpact, DashboardData, ImpactFilters, LifetimeImpact, YearImpact};
use crate::domains::service_project::repository::ServiceProjectRepository;
use crate::domains::service_project::types::ServiceProject;
use crate::domains::speaker::repository::SpeakerRepository;
use crate::domains::speaker::types::Speaker;
use crate::errors::{DomainResult, ServiceResult};
use crate::types::DateRange;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait ImpactService: Send + Sync {
    async fn lifetime_impact(&self, filters: &ImpactFilters) -> ServiceResult<LifetimeImpact>;

    async fn impact_by_area_of_focus(&self, filters: &ImpactFilters) -> ServiceResult<Vec<AreaImpact>>;

    async fn impact_over_time(&self, filters: &ImpactFilters) -> ServiceResult<Vec<YearImpact>>;

    /// All three rollups from a single read of the store
    async fn dashboard(&self, filters: &ImpactFilters) -> ServiceResult<DashboardData>;
}

pub struct ImpactServiceImpl {
    projects: Arc<dyn ServiceProjectRepository>,
    speakers: Arc<dyn SpeakerRepository>,
}

impl ImpactServiceImpl {
    pub fn new(projects: Arc<dyn ServiceProjectRepository>, speakers: Arc<dyn SpeakerRepository>) -> Self {
        Self { projects, speakers }
    }

    async fn fetch_projects(&self, filters: &ImpactFilters, range: Option<DateRange>) -> DomainResult<Vec<ServiceProject>> {
        self.projects.find_filtered(&filters.project_query(range)).await
    }

    async fn fetch_all(
        &self,
        filters: &ImpactFilters,
        range: Option<DateRange>,
    ) -> DomainResult<(Vec<ServiceProject>, Vec<Speaker>)> {
        futures::try_join!(self.fetch_projects(filters, range), self.speakers.find_spoken(range))
    }
}

fn degraded<T: Default>(query: &str, result: DomainResult<T>) -> (T, bool) {
    match result {
        Ok(value) => (value, false),
        Err(e) => {
            log::error!("Impact query {} failed, reporting zeros: {}", query, e);
            (T::default(), true)
        }
    }
}

#[async_trait]
impl ImpactService for ImpactServiceImpl {
    async fn lifetime_impact(&self, filters: &ImpactFilters) -> ServiceResult<LifetimeImpact> {
        let range = filters.date_range()?;
        let result = self
            .fetch_all(filters, range)
            .await
            .and_then(|(projects, speakers)| LifetimeImpact::from_entities(&projects, &speakers));
        Ok(degraded("lifetime_impact", result).0)
    }

    async fn impact_by_area_of_focus(&self, filters: &ImpactFilters) -> ServiceResult<Vec<AreaImpact>> {
        let range = filters.date_range()?;
        let result = self
            .fetch_projects(filters, range)
            .await
            .and_then(|projects| AreaImpact::rank(&projects));
        Ok(degraded("impact_by_area_of_focus", result).0)
    }

    async fn impact_over_time(&self, filters: &ImpactFilters) -> ServiceResult<Vec<YearImpact>> {
        let range = filters.date_range()?;
        let result = self
            .fetch_all(filters, range)
            .await
            .and_then(|(projects, speakers)| YearImpact::timeline(&projects, &speakers));
        Ok(degraded("impact_over_time", result).0)
    }

    async fn dashboard(&self, filters: &ImpactFilters) -> ServiceResult<DashboardData> {
        let range = filters.date_range()?;
        let result = self.fetch_all(filters, range).await.and_then(|(projects, speakers)| {
            Ok(DashboardData {
                lifetime: LifetimeImpact::from_entities(&projects, &speakers)?,
                by_area: AreaImpact::rank(&projects)?,
                over_time: YearImpact::timeline(&projects, &speakers)?,
                degraded: false,
            })
        });

        let (mut dashboard, failed) = degraded("dashboard", result);
        dashboard.degraded = failed;
        Ok(dashboard)
    }
}
