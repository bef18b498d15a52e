use crate::domains::core::repository::FindById;
use crate::domains::rotary_year::calendar::{current_fiscal_year, FiscalYear};
use crate::domains::rotary_year::repository::RotaryYearRepository;
use crate::domains::rotary_year::types::{NewRotaryYear, RotaryYear, UpdateRotaryYear};
use crate::domains::timeline::linkage::YearLinkageResolver;
use crate::domains::timeline::types::BackfillOutcome;
use crate::errors::{DomainError, ServiceResult};
use crate::validation::Validate;
use async_trait::async_trait;
use chrono::FixedOffset;
use std::sync::Arc;
use uuid::Uuid;

/// Trait defining rotary year service operations
#[async_trait]
pub trait RotaryYearService: Send + Sync {
    async fn create_year(&self, new_year: NewRotaryYear) -> ServiceResult<RotaryYear>;

    async fn get_year(&self, id: Uuid) -> ServiceResult<RotaryYear>;

    /// Fails with `InvalidFiscalYear` for a malformed label and
    /// `YearNotProvisioned` when no row exists for it
    async fn get_year_by_label(&self, label: &str) -> ServiceResult<RotaryYear>;

    /// The club's current fiscal year, in club-local time
    fn current_fiscal_year(&self) -> FiscalYear;

    /// The provisioned row for the current fiscal year, if any
    async fn current_year(&self) -> ServiceResult<Option<RotaryYear>>;

    /// All provisioned years, most recent first
    async fn list_years(&self) -> ServiceResult<Vec<RotaryYear>>;

    async fn update_year(&self, id: Uuid, update_data: UpdateRotaryYear) -> ServiceResult<RotaryYear>;

    /// Link any eligible entities the year is missing, then recompute its stats
    async fn recalculate_year(&self, id: Uuid) -> ServiceResult<BackfillOutcome>;
}

/// Implementation of the rotary year service
pub struct RotaryYearServiceImpl {
    repo: Arc<dyn RotaryYearRepository>,
    resolver: Arc<YearLinkageResolver>,
    club_offset: FixedOffset,
}

impl RotaryYearServiceImpl {
    pub fn new(
        repo: Arc<dyn RotaryYearRepository>,
        resolver: Arc<YearLinkageResolver>,
        club_offset: FixedOffset,
    ) -> Self {
        Self { repo, resolver, club_offset }
    }
}

#[async_trait]
impl RotaryYearService for RotaryYearServiceImpl {
    async fn create_year(&self, new_year: NewRotaryYear) -> ServiceResult<RotaryYear> {
        new_year.validate()?;

        let year = self.repo.create(&new_year).await?;
        log::info!("Provisioned rotary year {}", year.label);
        Ok(year)
    }

    async fn get_year(&self, id: Uuid) -> ServiceResult<RotaryYear> {
        Ok(self.repo.find_by_id(id).await?)
    }

    async fn get_year_by_label(&self, label: &str) -> ServiceResult<RotaryYear> {
        let fiscal_year = FiscalYear::parse(label)?;
        let year = self
            .repo
            .find_by_label(&fiscal_year.label())
            .await?
            .ok_or_else(|| DomainError::YearNotProvisioned(fiscal_year.label()))?;
        Ok(year)
    }

    fn current_fiscal_year(&self) -> FiscalYear {
        current_fiscal_year(self.club_offset)
    }

    async fn current_year(&self) -> ServiceResult<Option<RotaryYear>> {
        let label = self.current_fiscal_year().label();
        Ok(self.repo.find_by_label(&label).await?)
    }

    async fn list_years(&self) -> ServiceResult<Vec<RotaryYear>> {
        Ok(self.repo.find_all().await?)
    }

    async fn update_year(&self, id: Uuid, update_data: UpdateRotaryYear) -> ServiceResult<RotaryYear> {
        update_data.validate()?;

        let year = self.repo.update(id, &update_data).await?;
        if update_data.touches_stats() {
            log::debug!("Hand-entered stats updated for rotary year {}", year.label);
        }
        Ok(year)
    }

    async fn recalculate_year(&self, id: Uuid) -> ServiceResult<BackfillOutcome> {
        let outcome = self.resolver.backfill_year(id).await?;
        for warning in &outcome.warnings {
            log::warn!("Recalculate {}: {}", outcome.label, warning);
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::photo::repository::SqlitePhotoRepository;
    use crate::domains::rotary_year::repository::SqliteRotaryYearRepository;
    use crate::domains::service_project::repository::{ServiceProjectRepository, SqliteServiceProjectRepository};
    use crate::domains::service_project::types::{NewServiceProject, ProjectStatus};
    use crate::domains::settings::RetryPolicy;
    use crate::domains::speaker::repository::SqliteSpeakerRepository;
    use crate::domains::timeline::stats::StatsRecomputationEngine;
    use crate::errors::{ServiceError, ValidationError};
    use crate::test_support::memory_pool;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use sqlx::SqlitePool;

    fn service(pool: &SqlitePool) -> RotaryYearServiceImpl {
        let years = Arc::new(SqliteRotaryYearRepository::new(pool.clone()));
        let projects = Arc::new(SqliteServiceProjectRepository::new(pool.clone()));
        let speakers = Arc::new(SqliteSpeakerRepository::new(pool.clone()));
        let engine = Arc::new(StatsRecomputationEngine::new(
            years.clone(),
            projects.clone(),
            speakers.clone(),
            RetryPolicy::none(),
        ));
        let resolver = Arc::new(
            YearLinkageResolver::new(years.clone(), engine)
                .register(projects)
                .register(speakers)
                .register(Arc::new(SqlitePhotoRepository::new(pool.clone()))),
        );
        let offset = FixedOffset::east_opt(8 * 3600).unwrap();
        RotaryYearServiceImpl::new(years, resolver, offset)
    }

    #[tokio::test]
    async fn test_create_rejects_bad_labels() {
        let pool = memory_pool().await;
        let service = service(&pool);

        for label in ["2025-2027", "25-26", ""] {
            let err = service
                .create_year(NewRotaryYear { label: label.to_string(), ..Default::default() })
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::Domain(DomainError::Validation(_))), "{}", label);
        }

        service
            .create_year(NewRotaryYear { label: "2025-2026".to_string(), ..Default::default() })
            .await
            .unwrap();
        let duplicate = service
            .create_year(NewRotaryYear { label: "2025-2026".to_string(), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(
            duplicate,
            ServiceError::Domain(DomainError::Validation(ValidationError::Unique { .. }))
        ));
    }

    #[tokio::test]
    async fn test_get_by_label() {
        let pool = memory_pool().await;
        let service = service(&pool);
        let created = service
            .create_year(NewRotaryYear {
                label: "2024-2025".to_string(),
                club_president: Some("Tan Sri Wong".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let found = service.get_year_by_label("2024-2025").await.unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.start_date, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());

        let missing = service.get_year_by_label("2019-2020").await.unwrap_err();
        assert!(matches!(missing, ServiceError::Domain(DomainError::YearNotProvisioned(l)) if l == "2019-2020"));

        let malformed = service.get_year_by_label("2019/2020").await.unwrap_err();
        assert!(matches!(malformed, ServiceError::Domain(DomainError::InvalidFiscalYear(_))));
    }

    #[tokio::test]
    async fn test_current_year_uses_club_offset() {
        let pool = memory_pool().await;
        let service = service(&pool);
        assert!(service.current_year().await.unwrap().is_none());

        let label = service.current_fiscal_year().label();
        service
            .create_year(NewRotaryYear { label: label.clone(), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(service.current_year().await.unwrap().unwrap().label, label);
    }

    #[tokio::test]
    async fn test_update_keeps_computed_stats() {
        let pool = memory_pool().await;
        let service = service(&pool);
        let year = service
            .create_year(NewRotaryYear { label: "2025-2026".to_string(), ..Default::default() })
            .await
            .unwrap();

        let projects = SqliteServiceProjectRepository::new(pool.clone());
        projects
            .create(&NewServiceProject {
                name: "Flood relief".to_string(),
                status: ProjectStatus::Completed,
                completion_date: NaiveDate::from_ymd_opt(2025, 12, 30),
                beneficiary_count: Some(300),
                project_value_rm: Some(dec!(12000.50)),
                ..Default::default()
            })
            .await
            .unwrap();

        let outcome = service.recalculate_year(year.id).await.unwrap();
        assert_eq!(outcome.linked.len(), 1);

        let updated = service
            .update_year(
                year.id,
                UpdateRotaryYear {
                    club_theme: Some("Magic of Rotary".to_string()),
                    volunteer_hours: Some(dec!(410.5)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.club_theme.as_deref(), Some("Magic of Rotary"));
        assert_eq!(updated.stats.volunteer_hours(), Some(dec!(410.5)));
        assert_eq!(updated.stats.beneficiaries(), Some(300));
        assert_eq!(updated.stats.project_value_rm(), Some(dec!(12000.5)));

        let invalid = service
            .update_year(year.id, UpdateRotaryYear { meetings: Some(-1), ..Default::default() })
            .await;
        assert!(invalid.is_err());
    }

    #[tokio::test]
    async fn test_list_years_most_recent_first() {
        let pool = memory_pool().await;
        let service = service(&pool);
        for label in ["2023-2024", "2025-2026", "2024-2025"] {
            service
                .create_year(NewRotaryYear { label: label.to_string(), ..Default::default() })
                .await
                .unwrap();
        }
        let labels: Vec<String> = service.list_years().await.unwrap().into_iter().map(|y| y.label).collect();
        assert_eq!(labels, vec!["2025-2026", "2024-2025", "2023-2024"]);
    }
}
