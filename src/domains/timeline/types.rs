use crate::domains::rotary_year::types::{
    YearStats, STAT_BENEFICIARIES, STAT_PROJECTS, STAT_PROJECT_VALUE_RM, STAT_SPEAKERS,
};
use crate::domains::service_project::types::{ProjectStatus, ServiceProject};
use crate::domains::speaker::types::{Speaker, SpeakerStatus};
use crate::domains::photo::types::Photo;
use crate::errors::{DomainResult, ValidationError};
use crate::types::{add_amount, add_count, EntityKind};
use crate::validation::Validate;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A record that can be linked to the rotary year its date falls in
pub trait LinkableEntity: Send + Sync {
    fn entity_kind(&self) -> EntityKind;

    fn entity_id(&self) -> Uuid;

    /// Whether the entity has reached its "done" state
    fn is_terminal(&self) -> bool;

    /// The date that decides which rotary year the entity belongs to
    fn link_date(&self) -> Option<NaiveDate>;

    fn rotary_year_id(&self) -> Option<Uuid>;

    fn is_eligible(&self) -> bool {
        self.is_terminal() && self.link_date().is_some()
    }
}

/// Minimal view of an entity, as reported by a host that saved the row itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub entity_type: EntityKind,
    pub id: Uuid,
    /// Workflow status in its stored spelling. Ignored for photos.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub rotary_year_id: Option<Uuid>,
}

impl LinkableEntity for EntitySnapshot {
    fn entity_kind(&self) -> EntityKind {
        self.entity_type
    }

    fn entity_id(&self) -> Uuid {
        self.id
    }

    fn is_terminal(&self) -> bool {
        match self.entity_type {
            EntityKind::ServiceProject => self
                .status
                .as_deref()
                .and_then(ProjectStatus::from_str)
                .map(|s| s.is_terminal())
                .unwrap_or(false),
            EntityKind::Speaker => self
                .status
                .as_deref()
                .and_then(SpeakerStatus::from_str)
                .map(|s| s.is_terminal())
                .unwrap_or(false),
            EntityKind::Photo => true,
        }
    }

    fn link_date(&self) -> Option<NaiveDate> {
        self.date
    }

    fn rotary_year_id(&self) -> Option<Uuid> {
        self.rotary_year_id
    }
}

impl From<&ServiceProject> for EntitySnapshot {
    fn from(project: &ServiceProject) -> Self {
        Self {
            entity_type: EntityKind::ServiceProject,
            id: project.id,
            status: Some(project.status.as_str().to_string()),
            date: project.completion_date,
            rotary_year_id: project.rotary_year_id,
        }
    }
}

impl From<&Speaker> for EntitySnapshot {
    fn from(speaker: &Speaker) -> Self {
        Self {
            entity_type: EntityKind::Speaker,
            id: speaker.id,
            status: Some(speaker.status.as_str().to_string()),
            date: speaker.scheduled_date,
            rotary_year_id: speaker.rotary_year_id,
        }
    }
}

impl From<&Photo> for EntitySnapshot {
    fn from(photo: &Photo) -> Self {
        Self {
            entity_type: EntityKind::Photo,
            id: photo.id,
            status: None,
            date: photo.event_date,
            rotary_year_id: photo.rotary_year_id,
        }
    }
}

/// What the resolver did with the entity's link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkageAction {
    /// Newly linked to a year
    Linked,
    /// Moved from one year to another
    Relinked,
    /// Link cleared
    Unlinked,
    /// Still linked to the same year
    Unchanged,
    /// Eligible, but the link could not be made
    Skipped,
    /// Not eligible and not linked
    NoOp,
}

/// Non-fatal problems met while linking or recomputing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkageWarning {
    YearNotProvisioned { label: String },
    LinkFailed { entity_id: Uuid, message: String },
    RecomputeFailed { rotary_year_id: Uuid, message: String },
    /// A backfill could not list candidates of one kind
    ScanFailed { entity_type: EntityKind, message: String },
}

impl fmt::Display for LinkageWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkageWarning::YearNotProvisioned { label } => {
                write!(f, "Rotary year {} has not been provisioned", label)
            }
            LinkageWarning::LinkFailed { entity_id, message } => {
                write!(f, "Failed to link {}: {}", entity_id, message)
            }
            LinkageWarning::RecomputeFailed { rotary_year_id, message } => {
                write!(f, "Failed to recompute stats for {}: {}", rotary_year_id, message)
            }
            LinkageWarning::ScanFailed { entity_type, message } => {
                write!(f, "Failed to scan unlinked {} records: {}", entity_type, message)
            }
        }
    }
}

/// Result of reacting to one entity save or delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkageOutcome {
    pub action: LinkageAction,
    /// The entity's link after the resolver ran
    pub rotary_year_id: Option<Uuid>,
    /// Years whose stats were successfully recomputed, in order
    pub recomputed: Vec<Uuid>,
    pub warnings: Vec<LinkageWarning>,
}

impl LinkageOutcome {
    pub fn new(action: LinkageAction, rotary_year_id: Option<Uuid>) -> Self {
        Self {
            action,
            rotary_year_id,
            recomputed: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn no_op(rotary_year_id: Option<Uuid>) -> Self {
        Self::new(LinkageAction::NoOp, rotary_year_id)
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Result of a manual "recalculate" on a year
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackfillOutcome {
    pub rotary_year_id: Uuid,
    pub label: String,
    /// Entities linked by this run
    pub linked: Vec<LinkedEntity>,
    /// Stats after recomputation, absent when it failed
    pub stats: Option<YearStats>,
    pub warnings: Vec<LinkageWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedEntity {
    pub entity_type: EntityKind,
    pub id: Uuid,
}

/// An entity save reported through the host boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySavedEvent {
    pub entity: EntitySnapshot,
    #[serde(default)]
    pub previous: Option<EntitySnapshot>,
}

impl Validate for EntitySavedEvent {
    fn validate(&self) -> DomainResult<()> {
        self.entity.validate()?;
        if let Some(previous) = &self.previous {
            previous.validate()?;
            if previous.id != self.entity.id || previous.entity_type != self.entity.entity_type {
                return Err(ValidationError::invalid_value(
                    "previous",
                    "must describe the same entity as the saved state",
                )
                .into());
            }
        }
        Ok(())
    }
}

impl Validate for EntitySnapshot {
    fn validate(&self) -> DomainResult<()> {
        let Some(status) = self.status.as_deref() else {
            return Ok(());
        };
        let known = match self.entity_type {
            EntityKind::ServiceProject => ProjectStatus::from_str(status).is_some(),
            EntityKind::Speaker => SpeakerStatus::from_str(status).is_some(),
            EntityKind::Photo => true,
        };
        if known {
            Ok(())
        } else {
            Err(ValidationError::invalid_value(
                "status",
                &format!("unknown {} status '{}'", self.entity_type, status),
            )
            .into())
        }
    }
}

/// A saved entity together with what the resolver did about it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveOutcome<T> {
    pub entity: T,
    pub linkage: LinkageOutcome,
}

/// The four stats a recompute derives from linked entities
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearAggregate {
    pub projects: i64,
    pub speakers: i64,
    pub beneficiaries: i64,
    pub project_value_rm: Decimal,
}

impl YearAggregate {
    /// Every linked project counts; only speakers who have spoken count
    /// Fails rather than wrapping when a total leaves its numeric range
    pub fn from_entities(projects: &[ServiceProject], speakers: &[Speaker]) -> DomainResult<Self> {
        let mut aggregate = Self::default();
        for project in projects {
            aggregate.projects += 1;
            aggregate.beneficiaries = add_count(
                aggregate.beneficiaries,
                project.beneficiaries(),
                STAT_BENEFICIARIES,
            )?;
            aggregate.project_value_rm = add_amount(
                aggregate.project_value_rm,
                project.value_rm(),
                STAT_PROJECT_VALUE_RM,
            )?;
        }
        aggregate.speakers = speakers
            .iter()
            .filter(|s| s.status.is_terminal())
            .count() as i64;
        Ok(aggregate)
    }

    /// Overwrite this aggregate's keys; all other keys are left alone
    pub fn merge_into(&self, stats: &mut YearStats) {
        stats.set_count(STAT_BENEFICIARIES, self.beneficiaries);
        stats.set_decimal(STAT_PROJECT_VALUE_RM, self.project_value_rm);
        stats.set_count(STAT_PROJECTS, self.projects);
        stats.set_count(STAT_SPEAKERS, self.speakers);
    }
}
