use crate::domains::rotary_year::calendar::FiscalYear;
use crate::errors::{DomainError, DomainResult, ValidationError};
use crate::types::{parse_date, parse_timestamp, parse_uuid, DateRange};
use crate::validation::{Validate, ValidationBuilder};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

// Stats keys maintained by the recomputation engine
pub const STAT_PROJECTS: &str = "projects";
pub const STAT_SPEAKERS: &str = "speakers";
pub const STAT_BENEFICIARIES: &str = "beneficiaries";
pub const STAT_PROJECT_VALUE_RM: &str = "project_value_rm";

// Stats keys entered by hand through `UpdateRotaryYear`
pub const STAT_MEETINGS: &str = "meetings";
pub const STAT_VOLUNTEER_HOURS: &str = "volunteer_hours";

/// Cached per-year statistics.
///
/// Stored as a JSON object. Keys other than the ones this crate writes are
/// carried through untouched, so tools that annotate the object are never
/// clobbered by a recompute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct YearStats(Map<String, Value>);

impl YearStats {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Parse the stored column. `null` and the empty string read as `{}`;
    /// anything else that is not an object is rejected.
    pub fn from_json_str(raw: &str) -> DomainResult<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::new());
        }
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| DomainError::Internal(format!("Invalid stats JSON: {}", e)))?;
        match value {
            Value::Null => Ok(Self::new()),
            Value::Object(map) => Ok(Self(map)),
            other => Err(DomainError::Internal(format!(
                "Stats must be a JSON object, got: {}",
                other
            ))),
        }
    }

    pub fn to_json_string(&self) -> DomainResult<String> {
        serde_json::to_string(&self.0)
            .map_err(|e| DomainError::Internal(format!("Failed to serialize stats: {}", e)))
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Integer stat. Accepts integral JSON numbers and numeric strings.
    pub fn get_count(&self, key: &str) -> Option<i64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Decimal stat. Accepts JSON numbers and numeric strings.
    pub fn get_decimal(&self, key: &str) -> Option<Decimal> {
        match self.0.get(key)? {
            Value::Number(n) => {
                let text = n.to_string();
                Decimal::from_str(&text)
                    .or_else(|_| Decimal::from_scientific(&text))
                    .ok()
            }
            Value::String(s) => Decimal::from_str(s.trim()).ok(),
            _ => None,
        }
    }

    pub fn set_count(&mut self, key: &str, value: i64) {
        self.0.insert(key.to_string(), Value::Number(Number::from(value)));
    }

    /// Money and hours are written as JSON numbers so other consumers of the
    /// object can read them without parsing strings.
    pub fn set_decimal(&mut self, key: &str, value: Decimal) {
        let text = value.normalize().to_string();
        let json = Number::from_str(&text)
            .map(Value::Number)
            .unwrap_or(Value::String(text));
        self.0.insert(key.to_string(), json);
    }

    pub fn projects(&self) -> Option<i64> {
        self.get_count(STAT_PROJECTS)
    }

    pub fn speakers(&self) -> Option<i64> {
        self.get_count(STAT_SPEAKERS)
    }

    pub fn beneficiaries(&self) -> Option<i64> {
        self.get_count(STAT_BENEFICIARIES)
    }

    pub fn project_value_rm(&self) -> Option<Decimal> {
        self.get_decimal(STAT_PROJECT_VALUE_RM)
    }

    pub fn meetings(&self) -> Option<i64> {
        self.get_count(STAT_MEETINGS)
    }

    pub fn volunteer_hours(&self) -> Option<Decimal> {
        self.get_decimal(STAT_VOLUNTEER_HOURS)
    }
}

/// RotaryYear entity - one club fiscal year and its cached statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotaryYear {
    pub id: Uuid,
    pub label: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub club_president: Option<String>,
    pub club_theme: Option<String>,
    pub district_governor: Option<String>,
    pub district_theme: Option<String>,
    pub ri_president: Option<String>,
    pub ri_theme: Option<String>,
    pub stats: YearStats,
    pub member_count_at_year_end: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RotaryYear {
    pub fn fiscal_year(&self) -> DomainResult<FiscalYear> {
        FiscalYear::parse(&self.label)
    }

    pub fn bounds(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }
}

/// NewRotaryYear DTO - provisions a year. Bounds are derived from the label.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewRotaryYear {
    pub label: String,
    pub club_president: Option<String>,
    pub club_theme: Option<String>,
    pub district_governor: Option<String>,
    pub district_theme: Option<String>,
    pub ri_president: Option<String>,
    pub ri_theme: Option<String>,
    pub member_count_at_year_end: Option<i64>,
}

impl Validate for NewRotaryYear {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("label", Some(self.label.clone()))
            .required()
            .fiscal_year_label()
            .validate()?;

        if FiscalYear::parse(&self.label).is_err() {
            return Err(DomainError::Validation(ValidationError::invalid_value(
                "label",
                "second year must follow the first",
            )));
        }

        ValidationBuilder::new("member_count_at_year_end", self.member_count_at_year_end)
            .min(0)
            .validate()?;

        Ok(())
    }
}

/// UpdateRotaryYear DTO - leadership metadata and the hand-entered stats
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRotaryYear {
    pub club_president: Option<String>,
    pub club_theme: Option<String>,
    pub district_governor: Option<String>,
    pub district_theme: Option<String>,
    pub ri_president: Option<String>,
    pub ri_theme: Option<String>,
    pub member_count_at_year_end: Option<i64>,
    pub meetings: Option<i64>,
    pub volunteer_hours: Option<Decimal>,
}

impl UpdateRotaryYear {
    pub fn touches_stats(&self) -> bool {
        self.meetings.is_some() || self.volunteer_hours.is_some()
    }
}

impl Validate for UpdateRotaryYear {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("member_count_at_year_end", self.member_count_at_year_end)
            .min(0)
            .validate()?;
        ValidationBuilder::new("meetings", self.meetings)
            .min(0)
            .validate()?;
        ValidationBuilder::new("volunteer_hours", self.volunteer_hours)
            .min(Decimal::ZERO)
            .validate()?;
        Ok(())
    }
}

/// RotaryYearRow - SQLite row representation for mapping from database
#[derive(Debug, Clone, FromRow)]
pub struct RotaryYearRow {
    pub id: String,
    pub label: String,
    pub start_date: String,
    pub end_date: String,
    pub club_president: Option<String>,
    pub club_theme: Option<String>,
    pub district_governor: Option<String>,
    pub district_theme: Option<String>,
    pub ri_president: Option<String>,
    pub ri_theme: Option<String>,
    pub stats: String,
    pub member_count_at_year_end: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

impl RotaryYearRow {
    /// Convert database row to domain entity
    pub fn into_entity(self) -> DomainResult<RotaryYear> {
        let fiscal_year = FiscalYear::parse(&self.label)?;
        let start_date = parse_date(&self.start_date)?;
        let end_date = parse_date(&self.end_date)?;
        if fiscal_year.start_date() != start_date || fiscal_year.end_date() != end_date {
            return Err(DomainError::Internal(format!(
                "Rotary year {} has bounds {}..{} that do not match its label",
                self.label, self.start_date, self.end_date
            )));
        }

        Ok(RotaryYear {
            id: parse_uuid(&self.id)?,
            label: self.label,
            start_date,
            end_date,
            club_president: self.club_president,
            club_theme: self.club_theme,
            district_governor: self.district_governor,
            district_theme: self.district_theme,
            ri_president: self.ri_president,
            ri_theme: self.ri_theme,
            stats: YearStats::from_json_str(&self.stats)?,
            member_count_at_year_end: self.member_count_at_year_end,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}
