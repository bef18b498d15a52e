//! Rebuilds a rotary year's cached stats from the entities linked to it.
//!
//! Always a full rescan of the year's links: the four aggregated keys are
//! overwritten and every other key in the stats object is preserved.

use crate::domains::rotary_year::repository::RotaryYearRepository;
use crate::domains::rotary_year::types::YearStats;
use crate::domains::service_project::repository::ServiceProjectRepository;
use crate::domains::settings::RetryPolicy;
use crate::domains::speaker::repository::SpeakerRepository;
use crate::domains::timeline::types::YearAggregate;
use crate::errors::DomainResult;
use std::sync::Arc;
use uuid::Uuid;

pub struct StatsRecomputationEngine {
    years: Arc<dyn RotaryYearRepository>,
    projects: Arc<dyn ServiceProjectRepository>,
    speakers: Arc<dyn SpeakerRepository>,
    retry: RetryPolicy,
}

impl StatsRecomputationEngine {
    pub fn new(
        years: Arc<dyn RotaryYearRepository>,
        projects: Arc<dyn ServiceProjectRepository>,
        speakers: Arc<dyn SpeakerRepository>,
        retry: RetryPolicy,
    ) -> Self {
        Self { years, projects, speakers, retry }
    }

    /// Recompute and store the stats of one year, returning what was written.
    ///
    /// Transient store failures are retried up to the configured number of
    /// attempts; anything else (including an unknown year) fails at once.
    pub async fn recompute_stats(&self, rotary_year_id: Uuid) -> DomainResult<YearStats> {
        let mut attempt = 1;
        loop {
            match self.recompute_once(rotary_year_id).await {
                Ok(stats) => return Ok(stats),
                Err(e) if e.is_transient() && attempt < self.retry.attempts => {
                    log::warn!(
                        "Stats recompute for {} failed ({}), retrying ({}/{})",
                        rotary_year_id, e, attempt, self.retry.attempts
                    );
                    tokio::time::sleep(self.retry.delay_after(attempt)).await;
                    attempt += 1;
                }
                Err(e) => {
                    log::error!("Stats recompute for {} failed: {}", rotary_year_id, e);
                    return Err(e);
                }
            }
        }
    }

    async fn recompute_once(&self, rotary_year_id: Uuid) -> DomainResult<YearStats> {
        let year = self.years.find_by_id(rotary_year_id).await?;

        let (projects, speakers) = futures::try_join!(
            self.projects.find_by_rotary_year(rotary_year_id),
            self.speakers.find_spoken_by_rotary_year(rotary_year_id),
        )?;

        let aggregate = YearAggregate::from_entities(&projects, &speakers)?;
        let mut stats = year.stats.clone();
        aggregate.merge_into(&mut stats);

        self.years.update_stats(rotary_year_id, &stats).await?;

        log::debug!(
            "Recomputed stats for {}: {} projects, {} speakers, {} beneficiaries, RM {}",
            year.label, aggregate.projects, aggregate.speakers, aggregate.beneficiaries, aggregate.project_value_rm
        );
        Ok(stats)
    }
}
