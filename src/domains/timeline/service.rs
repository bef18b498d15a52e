use crate::domains::rotary_year::types::YearStats;
use crate::domains::timeline::linkage::YearLinkageResolver;
use crate::domains::timeline::stats::StatsRecomputationEngine;
use crate::domains::timeline::types::{EntitySavedEvent, LinkableEntity, LinkageOutcome};
use crate::errors::ServiceResult;
use crate::types::EntityKind;
use crate::validation::Validate;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Timeline hooks for hosts that write entity rows themselves
#[async_trait]
pub trait TimelineService: Send + Sync {
    /// Run linkage for an entity the host has just saved
    async fn on_entity_saved(&self, event: EntitySavedEvent) -> ServiceResult<LinkageOutcome>;

    async fn on_entity_deleted(&self, kind: EntityKind, rotary_year_id: Option<Uuid>) -> ServiceResult<LinkageOutcome>;

    async fn recompute_stats(&self, rotary_year_id: Uuid) -> ServiceResult<YearStats>;
}

pub struct TimelineServiceImpl {
    resolver: Arc<YearLinkageResolver>,
    stats: Arc<StatsRecomputationEngine>,
}

impl TimelineServiceImpl {
    pub fn new(resolver: Arc<YearLinkageResolver>, stats: Arc<StatsRecomputationEngine>) -> Self {
        Self { resolver, stats }
    }
}

#[async_trait]
impl TimelineService for TimelineServiceImpl {
    async fn on_entity_saved(&self, event: EntitySavedEvent) -> ServiceResult<LinkageOutcome> {
        event.validate()?;

        let previous = event.previous.as_ref().map(|p| p as &dyn LinkableEntity);
        let outcome = self.resolver.on_entity_saved(&event.entity, previous).await;
        for warning in &outcome.warnings {
            log::warn!("{} {}: {}", event.entity.entity_type, event.entity.id, warning);
        }
        Ok(outcome)
    }

    async fn on_entity_deleted(&self, kind: EntityKind, rotary_year_id: Option<Uuid>) -> ServiceResult<LinkageOutcome> {
        Ok(self.resolver.on_entity_deleted(kind, rotary_year_id).await)
    }

    async fn recompute_stats(&self, rotary_year_id: Uuid) -> ServiceResult<YearStats> {
        Ok(self.stats.recompute_stats(rotary_year_id).await?)
    }
}
