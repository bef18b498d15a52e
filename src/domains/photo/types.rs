use crate::domains::timeline::types::LinkableEntity;
use crate::errors::DomainResult;
use crate::types::{double_option, parse_opt_date, parse_opt_uuid, parse_timestamp, parse_uuid, EntityKind};
use crate::validation::{Validate, ValidationBuilder};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Photo entity - gallery metadata. The image itself lives in file storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Photo {
    pub id: Uuid,
    pub title: String,
    pub caption: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub rotary_year_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Photos have no workflow; any dated photo belongs to its year's gallery
impl LinkableEntity for Photo {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::Photo
    }

    fn entity_id(&self) -> Uuid {
        self.id
    }

    fn is_terminal(&self) -> bool {
        true
    }

    fn link_date(&self) -> Option<NaiveDate> {
        self.event_date
    }

    fn rotary_year_id(&self) -> Option<Uuid> {
        self.rotary_year_id
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPhoto {
    pub title: String,
    pub caption: Option<String>,
    pub event_date: Option<NaiveDate>,
}

impl Validate for NewPhoto {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("title", Some(self.title.clone()))
            .required()
            .max_length(200)
            .validate()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePhoto {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub caption: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub event_date: Option<Option<NaiveDate>>,
}

impl Validate for UpdatePhoto {
    fn validate(&self) -> DomainResult<()> {
        if let Some(title) = &self.title {
            ValidationBuilder::new("title", Some(title.clone()))
                .required()
                .max_length(200)
                .validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct PhotoRow {
    pub id: String,
    pub title: String,
    pub caption: Option<String>,
    pub event_date: Option<String>,
    pub rotary_year_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl PhotoRow {
    pub fn into_entity(self) -> DomainResult<Photo> {
        Ok(Photo {
            id: parse_uuid(&self.id)?,
            title: self.title,
            caption: self.caption,
            event_date: parse_opt_date(&self.event_date)?,
            rotary_year_id: parse_opt_uuid(&self.rotary_year_id)?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}
