//! Keeps each entity's `rotary_year_id` in step with its status and date, and
//! triggers stats recomputation for every year whose link set changed.
//!
//! Nothing here fails an entity save. Lookup, persistence and recomputation
//! problems are logged and handed back as [`LinkageWarning`]s.

use crate::domains::core::repository::{FindById, YearLinkRepository};
use crate::domains::rotary_year::calendar::fiscal_year_of;
use crate::domains::rotary_year::repository::RotaryYearRepository;
use crate::domains::timeline::stats::StatsRecomputationEngine;
use crate::domains::timeline::types::{
    BackfillOutcome, LinkableEntity, LinkageAction, LinkageOutcome, LinkageWarning, LinkedEntity,
};
use crate::errors::{DomainError, DomainResult};
use crate::types::EntityKind;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

pub struct YearLinkageResolver {
    years: Arc<dyn RotaryYearRepository>,
    stats: Arc<StatsRecomputationEngine>,
    links: HashMap<EntityKind, Arc<dyn YearLinkRepository>>,
}

impl YearLinkageResolver {
    pub fn new(years: Arc<dyn RotaryYearRepository>, stats: Arc<StatsRecomputationEngine>) -> Self {
        Self {
            years,
            stats,
            links: HashMap::new(),
        }
    }

    /// Register the store that persists links for one entity kind
    pub fn register(mut self, repo: Arc<dyn YearLinkRepository>) -> Self {
        self.links.insert(repo.entity_kind(), repo);
        self
    }

    fn link_repo(&self, kind: EntityKind) -> DomainResult<&Arc<dyn YearLinkRepository>> {
        self.links
            .get(&kind)
            .ok_or_else(|| DomainError::Internal(format!("No link store registered for {}", kind)))
    }

    /// React to an entity having been written.
    ///
    /// `previous` is the state before the write, when the caller has it. Its
    /// link is used when the saved state does not carry one, and the stored
    /// link when neither does.
    pub async fn on_entity_saved(
        &self,
        entity: &dyn LinkableEntity,
        previous: Option<&dyn LinkableEntity>,
    ) -> LinkageOutcome {
        let kind = entity.entity_kind();
        let id = entity.entity_id();
        let reported = entity
            .rotary_year_id()
            .or_else(|| previous.and_then(|p| p.rotary_year_id()));
        let current = match reported {
            Some(year_id) => Some(year_id),
            None => match self.stored_link(kind, id).await {
                Ok(stored) => stored,
                Err(e) => {
                    log::error!("Stored rotary year lookup for {} {} failed: {}", kind, id, e);
                    let mut outcome = LinkageOutcome::new(LinkageAction::Skipped, None);
                    outcome.warnings.push(LinkageWarning::LinkFailed {
                        entity_id: id,
                        message: e.to_string(),
                    });
                    return outcome;
                }
            },
        };

        let date = match entity.link_date() {
            Some(date) if entity.is_terminal() => date,
            _ => {
                return match current {
                    Some(old_year) => self.unlink(kind, id, old_year).await,
                    None => LinkageOutcome::no_op(None),
                };
            }
        };

        let label = fiscal_year_of(date).label();
        let year = match self.years.find_by_label(&label).await {
            Ok(year) => year,
            Err(e) => {
                log::error!("Rotary year lookup for {} {} failed: {}", kind, id, e);
                let mut outcome = LinkageOutcome::new(LinkageAction::Skipped, current);
                outcome.warnings.push(LinkageWarning::LinkFailed {
                    entity_id: id,
                    message: e.to_string(),
                });
                return outcome;
            }
        };

        let Some(year) = year else {
            log::warn!("{} {} falls in {}, which has not been provisioned", kind, id, label);
            let warning = LinkageWarning::YearNotProvisioned { label };
            let mut outcome = match current {
                Some(old_year) => self.unlink(kind, id, old_year).await,
                None => LinkageOutcome::new(LinkageAction::Skipped, None),
            };
            outcome.warnings.insert(0, warning);
            return outcome;
        };

        if current == Some(year.id) {
            let mut outcome = LinkageOutcome::new(LinkageAction::Unchanged, current);
            self.recompute(kind, year.id, &mut outcome).await;
            return outcome;
        }

        if let Err(e) = self.persist_link(kind, id, Some(year.id)).await {
            log::error!("Failed to link {} {} to {}: {}", kind, id, label, e);
            let mut outcome = LinkageOutcome::new(LinkageAction::Skipped, current);
            outcome.warnings.push(LinkageWarning::LinkFailed {
                entity_id: id,
                message: e.to_string(),
            });
            return outcome;
        }

        let action = if current.is_some() {
            LinkageAction::Relinked
        } else {
            LinkageAction::Linked
        };
        log::info!("{} {} linked to rotary year {}", kind, id, label);

        let mut outcome = LinkageOutcome::new(action, Some(year.id));
        self.recompute(kind, year.id, &mut outcome).await;
        if let Some(old_year) = current {
            self.recompute(kind, old_year, &mut outcome).await;
        }
        outcome
    }

    /// React to an entity having been removed while linked to `rotary_year_id`
    pub async fn on_entity_deleted(&self, kind: EntityKind, rotary_year_id: Option<Uuid>) -> LinkageOutcome {
        match rotary_year_id {
            Some(year_id) => {
                let mut outcome = LinkageOutcome::new(LinkageAction::Unlinked, None);
                self.recompute(kind, year_id, &mut outcome).await;
                outcome
            }
            None => LinkageOutcome::no_op(None),
        }
    }

    /// Link every eligible, unlinked entity dated inside the year, then
    /// recompute it. An unknown year is an error; everything after that is
    /// reported as warnings.
    pub async fn backfill_year(&self, rotary_year_id: Uuid) -> DomainResult<BackfillOutcome> {
        let year = self.years.find_by_id(rotary_year_id).await?;
        let bounds = year.bounds();

        let mut outcome = BackfillOutcome {
            rotary_year_id,
            label: year.label.clone(),
            linked: Vec::new(),
            stats: None,
            warnings: Vec::new(),
        };

        let mut kinds: Vec<&EntityKind> = self.links.keys().collect();
        kinds.sort();

        for kind in kinds {
            let repo = &self.links[kind];
            let candidates = match repo.find_unlinked_eligible(&bounds).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    log::error!("Backfill scan of {} for {} failed: {}", kind, year.label, e);
                    outcome.warnings.push(LinkageWarning::ScanFailed {
                        entity_type: *kind,
                        message: e.to_string(),
                    });
                    continue;
                }
            };
            for id in candidates {
                match repo.set_rotary_year(id, Some(rotary_year_id)).await {
                    Ok(()) => outcome.linked.push(LinkedEntity { entity_type: *kind, id }),
                    Err(e) => {
                        log::error!("Backfill of {} {} into {} failed: {}", kind, id, year.label, e);
                        outcome.warnings.push(LinkageWarning::LinkFailed {
                            entity_id: id,
                            message: e.to_string(),
                        });
                    }
                }
            }
        }

        match self.stats.recompute_stats(rotary_year_id).await {
            Ok(stats) => outcome.stats = Some(stats),
            Err(e) => outcome.warnings.push(LinkageWarning::RecomputeFailed {
                rotary_year_id,
                message: e.to_string(),
            }),
        }

        log::info!(
            "Backfilled rotary year {}: {} entities linked, {} warnings",
            year.label,
            outcome.linked.len(),
            outcome.warnings.len()
        );
        Ok(outcome)
    }

    async fn stored_link(&self, kind: EntityKind, id: Uuid) -> DomainResult<Option<Uuid>> {
        self.link_repo(kind)?.find_rotary_year(id).await
    }

    async fn persist_link(&self, kind: EntityKind, id: Uuid, rotary_year_id: Option<Uuid>) -> DomainResult<()> {
        self.link_repo(kind)?.set_rotary_year(id, rotary_year_id).await
    }

    async fn unlink(&self, kind: EntityKind, id: Uuid, old_year: Uuid) -> LinkageOutcome {
        if let Err(e) = self.persist_link(kind, id, None).await {
            log::error!("Failed to clear rotary year of {} {}: {}", kind, id, e);
            let mut outcome = LinkageOutcome::new(LinkageAction::Skipped, Some(old_year));
            outcome.warnings.push(LinkageWarning::LinkFailed {
                entity_id: id,
                message: e.to_string(),
            });
            return outcome;
        }

        log::info!("{} {} unlinked from rotary year {}", kind, id, old_year);
        let mut outcome = LinkageOutcome::new(LinkageAction::Unlinked, None);
        self.recompute(kind, old_year, &mut outcome).await;
        outcome
    }

    async fn recompute(&self, kind: EntityKind, rotary_year_id: Uuid, outcome: &mut LinkageOutcome) {
        if !kind.contributes_to_stats() {
            return;
        }
        match self.stats.recompute_stats(rotary_year_id).await {
            Ok(_) => outcome.recomputed.push(rotary_year_id),
            Err(e) => outcome.warnings.push(LinkageWarning::RecomputeFailed {
                rotary_year_id,
                message: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::photo::repository::{PhotoRepository, SqlitePhotoRepository};
    use crate::domains::photo::types::NewPhoto;
    use crate::domains::rotary_year::repository::SqliteRotaryYearRepository;
    use crate::domains::rotary_year::types::{RotaryYear, UpdateRotaryYear};
    use crate::domains::service_project::repository::{ServiceProjectRepository, SqliteServiceProjectRepository};
    use crate::domains::service_project::types::{NewServiceProject, ProjectStatus, ServiceProject, UpdateServiceProject};
    use crate::domains::settings::RetryPolicy;
    use crate::domains::speaker::repository::{SpeakerRepository, SqliteSpeakerRepository};
    use crate::domains::speaker::types::{NewSpeaker, SpeakerStatus, UpdateSpeaker};
    use crate::domains::timeline::types::EntitySnapshot;
    use crate::errors::DbError;
    use crate::test_support::{memory_pool, provision_year};
    use crate::types::DateRange;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use sqlx::SqlitePool;

    struct Fixture {
        pool: SqlitePool,
        years: Arc<SqliteRotaryYearRepository>,
        projects: Arc<SqliteServiceProjectRepository>,
        speakers: Arc<SqliteSpeakerRepository>,
        photos: Arc<SqlitePhotoRepository>,
        resolver: YearLinkageResolver,
    }

    async fn fixture() -> Fixture {
        let pool = memory_pool().await;
        let years = Arc::new(SqliteRotaryYearRepository::new(pool.clone()));
        let projects = Arc::new(SqliteServiceProjectRepository::new(pool.clone()));
        let speakers = Arc::new(SqliteSpeakerRepository::new(pool.clone()));
        let photos = Arc::new(SqlitePhotoRepository::new(pool.clone()));
        let engine = Arc::new(StatsRecomputationEngine::new(
            years.clone(),
            projects.clone(),
            speakers.clone(),
            RetryPolicy::none(),
        ));
        let resolver = YearLinkageResolver::new(years.clone(), engine)
            .register(projects.clone())
            .register(speakers.clone())
            .register(photos.clone());
        Fixture { pool, years, projects, speakers, photos, resolver }
    }

    async fn year_stats(f: &Fixture, year: &RotaryYear) -> crate::domains::rotary_year::types::YearStats {
        f.years.find_by_id(year.id).await.unwrap().stats
    }

    /// Write the update, then run the resolver the way the services do
    async fn save_project(f: &Fixture, id: Uuid, update: UpdateServiceProject) -> (ServiceProject, LinkageOutcome) {
        let before = f.projects.find_by_id(id).await.unwrap();
        let saved = f.projects.update(id, &update).await.unwrap();
        let outcome = f.resolver.on_entity_saved(&saved, Some(&before as &dyn LinkableEntity)).await;
        (f.projects.find_by_id(id).await.unwrap(), outcome)
    }

    #[tokio::test]
    async fn test_execution_to_completed_links_and_counts() {
        let f = fixture().await;
        let year = provision_year(&f.pool, "2025-2026").await;
        let project = f
            .projects
            .create(&NewServiceProject {
                name: "Clean Water Kampung Baru".to_string(),
                status: ProjectStatus::Execution,
                beneficiary_count: Some(120),
                project_value_rm: Some(dec!(5000)),
                ..Default::default()
            })
            .await
            .unwrap();

        let (saved, outcome) = save_project(
            &f,
            project.id,
            UpdateServiceProject {
                status: Some(ProjectStatus::Completed),
                completion_date: Some(NaiveDate::from_ymd_opt(2025, 8, 15)),
                ..Default::default()
            },
        )
        .await;

        assert_eq!(outcome.action, LinkageAction::Linked);
        assert_eq!(outcome.rotary_year_id, Some(year.id));
        assert_eq!(outcome.recomputed, vec![year.id]);
        assert!(!outcome.has_warnings());
        assert_eq!(saved.rotary_year_id, Some(year.id));

        let stats = year_stats(&f, &year).await;
        assert_eq!(stats.projects(), Some(1));
        assert_eq!(stats.beneficiaries(), Some(120));
        assert_eq!(stats.project_value_rm(), Some(dec!(5000)));
    }

    #[tokio::test]
    async fn test_unprovisioned_year_is_a_warning() {
        let f = fixture().await;
        let project = f
            .projects
            .create(&NewServiceProject {
                name: "Mobile library".to_string(),
                status: ProjectStatus::Completed,
                completion_date: NaiveDate::from_ymd_opt(2031, 2, 1),
                ..Default::default()
            })
            .await
            .unwrap();

        let outcome = f.resolver.on_entity_saved(&project, None).await;
        assert_eq!(outcome.action, LinkageAction::Skipped);
        assert_eq!(outcome.rotary_year_id, None);
        assert_eq!(
            outcome.warnings,
            vec![LinkageWarning::YearNotProvisioned { label: "2030-2031".to_string() }]
        );
        assert_eq!(f.projects.find_by_id(project.id).await.unwrap().rotary_year_id, None);
    }

    #[tokio::test]
    async fn test_regression_clears_link_and_shrinks_stats() {
        let f = fixture().await;
        let year = provision_year(&f.pool, "2025-2026").await;
        let project = f
            .projects
            .create(&NewServiceProject {
                name: "Blood drive".to_string(),
                status: ProjectStatus::Completed,
                completion_date: NaiveDate::from_ymd_opt(2025, 11, 3),
                beneficiary_count: Some(80),
                ..Default::default()
            })
            .await
            .unwrap();
        f.resolver.on_entity_saved(&project, None).await;
        assert_eq!(year_stats(&f, &year).await.projects(), Some(1));

        let (saved, outcome) = save_project(
            &f,
            project.id,
            UpdateServiceProject { status: Some(ProjectStatus::Execution), ..Default::default() },
        )
        .await;

        assert_eq!(outcome.action, LinkageAction::Unlinked);
        assert_eq!(outcome.recomputed, vec![year.id]);
        assert_eq!(saved.rotary_year_id, None);
        let stats = year_stats(&f, &year).await;
        assert_eq!(stats.projects(), Some(0));
        assert_eq!(stats.beneficiaries(), Some(0));
    }

    #[tokio::test]
    async fn test_moved_date_relinks_and_recomputes_both_years() {
        let f = fixture().await;
        let old_year = provision_year(&f.pool, "2024-2025").await;
        let new_year = provision_year(&f.pool, "2025-2026").await;
        let project = f
            .projects
            .create(&NewServiceProject {
                name: "School shoes".to_string(),
                status: ProjectStatus::Completed,
                completion_date: NaiveDate::from_ymd_opt(2025, 6, 30),
                beneficiary_count: Some(40),
                ..Default::default()
            })
            .await
            .unwrap();
        f.resolver.on_entity_saved(&project, None).await;
        assert_eq!(year_stats(&f, &old_year).await.beneficiaries(), Some(40));

        let (saved, outcome) = save_project(
            &f,
            project.id,
            UpdateServiceProject {
                completion_date: Some(NaiveDate::from_ymd_opt(2025, 7, 1)),
                ..Default::default()
            },
        )
        .await;

        assert_eq!(outcome.action, LinkageAction::Relinked);
        assert_eq!(outcome.recomputed, vec![new_year.id, old_year.id]);
        assert_eq!(saved.rotary_year_id, Some(new_year.id));
        assert_eq!(year_stats(&f, &old_year).await.beneficiaries(), Some(0));
        assert_eq!(year_stats(&f, &new_year).await.beneficiaries(), Some(40));
    }

    #[tokio::test]
    async fn test_same_year_save_recomputes() {
        let f = fixture().await;
        let year = provision_year(&f.pool, "2025-2026").await;
        let project = f
            .projects
            .create(&NewServiceProject {
                name: "Food bank".to_string(),
                status: ProjectStatus::Completed,
                completion_date: NaiveDate::from_ymd_opt(2025, 12, 24),
                beneficiary_count: Some(10),
                ..Default::default()
            })
            .await
            .unwrap();
        f.resolver.on_entity_saved(&project, None).await;

        let (_, outcome) = save_project(
            &f,
            project.id,
            UpdateServiceProject { beneficiary_count: Some(Some(25)), ..Default::default() },
        )
        .await;
        assert_eq!(outcome.action, LinkageAction::Unchanged);
        assert_eq!(year_stats(&f, &year).await.beneficiaries(), Some(25));
    }

    #[tokio::test]
    async fn test_not_eligible_and_unlinked_is_a_no_op() {
        let f = fixture().await;
        provision_year(&f.pool, "2025-2026").await;
        let speaker = f
            .speakers
            .create(&NewSpeaker {
                name: "Puan Aisyah".to_string(),
                status: SpeakerStatus::Scheduled,
                scheduled_date: NaiveDate::from_ymd_opt(2025, 9, 9),
                ..Default::default()
            })
            .await
            .unwrap();

        let outcome = f.resolver.on_entity_saved(&speaker, None).await;
        assert_eq!(outcome, LinkageOutcome::no_op(None));
    }

    #[tokio::test]
    async fn test_speaker_counts_once_spoken() {
        let f = fixture().await;
        let year = provision_year(&f.pool, "2025-2026").await;
        let speaker = f
            .speakers
            .create(&NewSpeaker {
                name: "Puan Aisyah".to_string(),
                status: SpeakerStatus::Scheduled,
                scheduled_date: NaiveDate::from_ymd_opt(2025, 9, 9),
                ..Default::default()
            })
            .await
            .unwrap();
        let spoken = f
            .speakers
            .update(speaker.id, &UpdateSpeaker { status: Some(SpeakerStatus::Spoken), ..Default::default() })
            .await
            .unwrap();

        let outcome = f.resolver.on_entity_saved(&spoken, Some(&speaker as &dyn LinkableEntity)).await;
        assert_eq!(outcome.action, LinkageAction::Linked);
        assert_eq!(year_stats(&f, &year).await.speakers(), Some(1));
    }

    #[tokio::test]
    async fn test_photo_links_without_recompute() {
        let f = fixture().await;
        let year = provision_year(&f.pool, "2025-2026").await;
        let photo = f
            .photos
            .create(&NewPhoto {
                title: "Installation night".to_string(),
                event_date: NaiveDate::from_ymd_opt(2025, 7, 5),
                ..Default::default()
            })
            .await
            .unwrap();

        let outcome = f.resolver.on_entity_saved(&photo, None).await;
        assert_eq!(outcome.action, LinkageAction::Linked);
        assert!(outcome.recomputed.is_empty());
        assert_eq!(f.photos.find_by_id(photo.id).await.unwrap().rotary_year_id, Some(year.id));
    }

    #[tokio::test]
    async fn test_snapshot_from_host() {
        let f = fixture().await;
        let year = provision_year(&f.pool, "2025-2026").await;
        let project = f
            .projects
            .create(&NewServiceProject {
                name: "Tree planting".to_string(),
                status: ProjectStatus::Completed,
                completion_date: NaiveDate::from_ymd_opt(2026, 3, 21),
                ..Default::default()
            })
            .await
            .unwrap();

        let snapshot = EntitySnapshot::from(&project);
        let outcome = f.resolver.on_entity_saved(&snapshot, None).await;
        assert_eq!(outcome.action, LinkageAction::Linked);
        assert_eq!(f.projects.find_by_id(project.id).await.unwrap().rotary_year_id, Some(year.id));
    }

    #[tokio::test]
    async fn test_delete_recomputes_old_year() {
        let f = fixture().await;
        let year = provision_year(&f.pool, "2025-2026").await;
        let project = f
            .projects
            .create(&NewServiceProject {
                name: "Eye camp".to_string(),
                status: ProjectStatus::Completed,
                completion_date: NaiveDate::from_ymd_opt(2025, 10, 10),
                ..Default::default()
            })
            .await
            .unwrap();
        f.resolver.on_entity_saved(&project, None).await;
        f.projects.delete(project.id).await.unwrap();

        let outcome = f.resolver.on_entity_deleted(EntityKind::ServiceProject, Some(year.id)).await;
        assert_eq!(outcome.recomputed, vec![year.id]);
        assert_eq!(year_stats(&f, &year).await.projects(), Some(0));
    }

    #[tokio::test]
    async fn test_backfill_links_existing_entities() {
        let f = fixture().await;
        for (name, date) in [("Library", (2025, 7, 1)), ("Clinic", (2026, 6, 30)), ("Late", (2026, 7, 1))] {
            f.projects
                .create(&NewServiceProject {
                    name: name.to_string(),
                    status: ProjectStatus::Completed,
                    completion_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2),
                    beneficiary_count: Some(5),
                    ..Default::default()
                })
                .await
                .unwrap();
        }
        f.photos
            .create(&NewPhoto {
                title: "Handover".to_string(),
                event_date: NaiveDate::from_ymd_opt(2025, 8, 1),
                ..Default::default()
            })
            .await
            .unwrap();
        let year = provision_year(&f.pool, "2025-2026").await;
        f.years
            .update(year.id, &UpdateRotaryYear { meetings: Some(40), ..Default::default() })
            .await
            .unwrap();

        let outcome = f.resolver.backfill_year(year.id).await.unwrap();
        assert_eq!(outcome.label, "2025-2026");
        assert_eq!(outcome.linked.len(), 3);
        assert_eq!(outcome.linked[0].entity_type, EntityKind::ServiceProject);
        assert_eq!(outcome.linked[2].entity_type, EntityKind::Photo);
        assert!(outcome.warnings.is_empty());

        let stats = outcome.stats.unwrap();
        assert_eq!(stats.projects(), Some(2));
        assert_eq!(stats.beneficiaries(), Some(10));
        assert_eq!(stats.meetings(), Some(40));

        let again = f.resolver.backfill_year(year.id).await.unwrap();
        assert!(again.linked.is_empty());
    }

    #[tokio::test]
    async fn test_host_snapshot_without_link_uses_stored_link() {
        let f = fixture().await;
        let old_year = provision_year(&f.pool, "2024-2025").await;
        let new_year = provision_year(&f.pool, "2025-2026").await;
        let project = f
            .projects
            .create(&NewServiceProject {
                name: "Dialysis fund".to_string(),
                status: ProjectStatus::Completed,
                completion_date: NaiveDate::from_ymd_opt(2025, 3, 1),
                beneficiary_count: Some(12),
                ..Default::default()
            })
            .await
            .unwrap();
        f.resolver.on_entity_saved(&project, None).await;
        assert_eq!(year_stats(&f, &old_year).await.projects(), Some(1));

        // Moved into the next year, reported without its current link
        let moved = EntitySnapshot {
            date: NaiveDate::from_ymd_opt(2025, 9, 1),
            rotary_year_id: None,
            ..EntitySnapshot::from(&project)
        };
        let outcome = f.resolver.on_entity_saved(&moved, None).await;
        assert_eq!(outcome.action, LinkageAction::Relinked);
        assert_eq!(outcome.recomputed, vec![new_year.id, old_year.id]);
        assert_eq!(year_stats(&f, &old_year).await.projects(), Some(0));
        assert_eq!(year_stats(&f, &new_year).await.projects(), Some(1));

        // Back to execution, again without a link
        let reopened = EntitySnapshot {
            status: Some("Execution".to_string()),
            rotary_year_id: None,
            ..moved
        };
        let outcome = f.resolver.on_entity_saved(&reopened, None).await;
        assert_eq!(outcome.action, LinkageAction::Unlinked);
        assert_eq!(outcome.recomputed, vec![new_year.id]);
        assert_eq!(f.projects.find_by_id(project.id).await.unwrap().rotary_year_id, None);
        assert_eq!(year_stats(&f, &new_year).await.projects(), Some(0));
    }

    /// Photo link store whose reads always fail
    struct BrokenPhotoLinks;

    #[async_trait::async_trait]
    impl YearLinkRepository for BrokenPhotoLinks {
        fn entity_kind(&self) -> EntityKind {
            EntityKind::Photo
        }
        async fn set_rotary_year(&self, _id: Uuid, _rotary_year_id: Option<Uuid>) -> DomainResult<()> {
            Ok(())
        }
        async fn find_rotary_year(&self, _id: Uuid) -> DomainResult<Option<Uuid>> {
            Err(DomainError::Database(DbError::Other("disk I/O error".to_string())))
        }
        async fn find_unlinked_eligible(&self, _range: &DateRange) -> DomainResult<Vec<Uuid>> {
            Err(DomainError::Database(DbError::Other("disk I/O error".to_string())))
        }
    }

    #[tokio::test]
    async fn test_backfill_scan_failure_still_recomputes() {
        let f = fixture().await;
        let engine = Arc::new(StatsRecomputationEngine::new(
            f.years.clone(),
            f.projects.clone(),
            f.speakers.clone(),
            RetryPolicy::none(),
        ));
        let resolver = YearLinkageResolver::new(f.years.clone(), engine)
            .register(f.projects.clone())
            .register(f.speakers.clone())
            .register(Arc::new(BrokenPhotoLinks));

        let project = f
            .projects
            .create(&NewServiceProject {
                name: "Flood relief".to_string(),
                status: ProjectStatus::Completed,
                completion_date: NaiveDate::from_ymd_opt(2026, 1, 5),
                beneficiary_count: Some(300),
                ..Default::default()
            })
            .await
            .unwrap();
        let year = provision_year(&f.pool, "2025-2026").await;

        let outcome = resolver.backfill_year(year.id).await.unwrap();
        assert_eq!(outcome.linked, vec![LinkedEntity { entity_type: EntityKind::ServiceProject, id: project.id }]);
        assert!(matches!(
            outcome.warnings.as_slice(),
            [LinkageWarning::ScanFailed { entity_type: EntityKind::Photo, .. }]
        ));
        let stats = outcome.stats.unwrap();
        assert_eq!(stats.projects(), Some(1));
        assert_eq!(stats.beneficiaries(), Some(300));
        assert_eq!(year_stats(&f, &year).await.projects(), Some(1));
    }

    #[tokio::test]
    async fn test_unreadable_stored_link_is_a_warning() {
        let f = fixture().await;
        let engine = Arc::new(StatsRecomputationEngine::new(
            f.years.clone(),
            f.projects.clone(),
            f.speakers.clone(),
            RetryPolicy::none(),
        ));
        let resolver = YearLinkageResolver::new(f.years.clone(), engine).register(Arc::new(BrokenPhotoLinks));
        let snapshot = EntitySnapshot {
            entity_type: EntityKind::Photo,
            id: Uuid::new_v4(),
            status: None,
            date: NaiveDate::from_ymd_opt(2025, 7, 5),
            rotary_year_id: None,
        };

        let outcome = resolver.on_entity_saved(&snapshot, None).await;
        assert_eq!(outcome.action, LinkageAction::Skipped);
        assert!(matches!(outcome.warnings.as_slice(), [LinkageWarning::LinkFailed { .. }]));
    }

    #[tokio::test]
    async fn test_backfill_unknown_year() {
        let f = fixture().await;
        let err = f.resolver.backfill_year(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DomainError::EntityNotFound(_, _)));
    }
}
