use crate::domains::timeline::types::LinkableEntity;
use crate::errors::{DomainError, DomainResult};
use crate::types::{double_option, parse_opt_date, parse_opt_uuid, parse_timestamp, parse_uuid, EntityKind};
use crate::validation::{Validate, ValidationBuilder};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Speaker pipeline. `spoken` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpeakerStatus {
    #[default]
    Ideas,
    Approached,
    Agreed,
    Scheduled,
    Spoken,
    Dropped,
}

impl SpeakerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeakerStatus::Ideas => "ideas",
            SpeakerStatus::Approached => "approached",
            SpeakerStatus::Agreed => "agreed",
            SpeakerStatus::Scheduled => "scheduled",
            SpeakerStatus::Spoken => "spoken",
            SpeakerStatus::Dropped => "dropped",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ideas" => Some(SpeakerStatus::Ideas),
            "approached" => Some(SpeakerStatus::Approached),
            "agreed" => Some(SpeakerStatus::Agreed),
            "scheduled" => Some(SpeakerStatus::Scheduled),
            "spoken" => Some(SpeakerStatus::Spoken),
            "dropped" => Some(SpeakerStatus::Dropped),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self == SpeakerStatus::Spoken
    }
}

/// Speaker entity - a guest speaker at a club meeting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Speaker {
    pub id: Uuid,
    pub name: String,
    pub topic: Option<String>,
    pub organization: Option<String>,
    pub status: SpeakerStatus,
    pub scheduled_date: Option<NaiveDate>,
    pub rotary_year_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LinkableEntity for Speaker {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::Speaker
    }

    fn entity_id(&self) -> Uuid {
        self.id
    }

    fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn link_date(&self) -> Option<NaiveDate> {
        self.scheduled_date
    }

    fn rotary_year_id(&self) -> Option<Uuid> {
        self.rotary_year_id
    }
}

/// NewSpeaker DTO - used when adding a speaker to the pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSpeaker {
    pub name: String,
    pub topic: Option<String>,
    pub organization: Option<String>,
    #[serde(default)]
    pub status: SpeakerStatus,
    pub scheduled_date: Option<NaiveDate>,
}

impl Validate for NewSpeaker {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("name", Some(self.name.clone()))
            .required()
            .min_length(2)
            .max_length(120)
            .validate()?;

        if let Some(topic) = &self.topic {
            ValidationBuilder::new("topic", Some(topic.clone()))
                .max_length(300)
                .validate()?;
        }

        Ok(())
    }
}

/// UpdateSpeaker DTO - `Some(None)` clears a nullable field
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSpeaker {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub topic: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub organization: Option<Option<String>>,
    pub status: Option<SpeakerStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub scheduled_date: Option<Option<NaiveDate>>,
}

impl Validate for UpdateSpeaker {
    fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            ValidationBuilder::new("name", Some(name.clone()))
                .required()
                .min_length(2)
                .max_length(120)
                .validate()?;
        }
        if let Some(Some(topic)) = &self.topic {
            ValidationBuilder::new("topic", Some(topic.clone()))
                .max_length(300)
                .validate()?;
        }
        Ok(())
    }
}

/// SpeakerRow - SQLite row representation for mapping from database
#[derive(Debug, Clone, FromRow)]
pub struct SpeakerRow {
    pub id: String,
    pub name: String,
    pub topic: Option<String>,
    pub organization: Option<String>,
    pub status: String,
    pub scheduled_date: Option<String>,
    pub rotary_year_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl SpeakerRow {
    /// Convert database row to domain entity
    pub fn into_entity(self) -> DomainResult<Speaker> {
        let status = SpeakerStatus::from_str(&self.status)
            .ok_or_else(|| DomainError::Internal(format!("Invalid speaker status: {}", self.status)))?;

        Ok(Speaker {
            id: parse_uuid(&self.id)?,
            name: self.name,
            topic: self.topic,
            organization: self.organization,
            status,
            scheduled_date: parse_opt_date(&self.scheduled_date)?,
            rotary_year_id: parse_opt_uuid(&self.rotary_year_id)?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}
