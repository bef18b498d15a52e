use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

use crate::errors::{DomainError, DomainResult};

/// Calendar dates are stored as ISO `YYYY-MM-DD` text
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// The kinds of record that can be linked to a rotary year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    ServiceProject,
    Speaker,
    Photo,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::ServiceProject => "service_project",
            EntityKind::Speaker => "speaker",
            EntityKind::Photo => "photo",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "service_project" => Some(EntityKind::ServiceProject),
            "speaker" => Some(EntityKind::Speaker),
            "photo" => Some(EntityKind::Photo),
            _ => None,
        }
    }

    /// Whether linked entities of this kind feed the cached year stats
    pub fn contributes_to_stats(&self) -> bool {
        matches!(self, EntityKind::ServiceProject | EntityKind::Speaker)
    }

    /// Backing table in the entity store
    pub fn table_name(&self) -> &'static str {
        match self {
            EntityKind::ServiceProject => "service_projects",
            EntityKind::Speaker => "speakers",
            EntityKind::Photo => "photos",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive calendar date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn start_str(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) in update payloads. Use with `#[serde(default)]`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// --- Row parsing helpers shared by the `*Row::into_entity` conversions ---

pub(crate) fn parse_uuid(value: &str) -> DomainResult<Uuid> {
    Uuid::parse_str(value).map_err(|_| DomainError::InvalidUuid(value.to_string()))
}

pub(crate) fn parse_opt_uuid(value: &Option<String>) -> DomainResult<Option<Uuid>> {
    value.as_deref().map(parse_uuid).transpose()
}

pub(crate) fn parse_date(value: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| DomainError::Internal(format!("Invalid date format: {}", value)))
}

pub(crate) fn parse_opt_date(value: &Option<String>) -> DomainResult<Option<NaiveDate>> {
    value.as_deref().map(parse_date).transpose()
}

pub(crate) fn parse_timestamp(value: &str) -> DomainResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DomainError::Internal(format!("Invalid date format: {}", value)))
}

pub(crate) fn parse_opt_decimal(value: &Option<String>, field: &str) -> DomainResult<Option<Decimal>> {
    value
        .as_deref()
        .map(|raw| {
            Decimal::from_str(raw)
                .map_err(|_| DomainError::Internal(format!("Invalid decimal in {}: {}", field, raw)))
        })
        .transpose()
}

pub(crate) fn format_opt_date(value: Option<NaiveDate>) -> Option<String> {
    value.map(|d| d.format(DATE_FORMAT).to_string())
}

// --- Checked accumulation for stats and impact totals ---

pub(crate) fn add_count(total: i64, value: i64, field: &str) -> DomainResult<i64> {
    total
        .checked_add(value)
        .ok_or_else(|| DomainError::Internal(format!("{} total overflowed", field)))
}

pub(crate) fn add_amount(total: Decimal, value: Decimal, field: &str) -> DomainResult<Decimal> {
    total
        .checked_add(value)
        .ok_or_else(|| DomainError::Internal(format!("{} total overflowed", field)))
}
