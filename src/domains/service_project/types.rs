use crate::domains::timeline::types::LinkableEntity;
use crate::errors::{DomainError, DomainResult, ValidationError};
use crate::types::{
    double_option, parse_opt_date, parse_opt_decimal, parse_opt_uuid, parse_timestamp, parse_uuid,
    DateRange, EntityKind,
};
use crate::validation::{Validate, ValidationBuilder};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Project workflow. `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProjectStatus {
    #[default]
    Idea,
    Planning,
    Approved,
    Execution,
    Completed,
    Dropped,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Idea => "Idea",
            ProjectStatus::Planning => "Planning",
            ProjectStatus::Approved => "Approved",
            ProjectStatus::Execution => "Execution",
            ProjectStatus::Completed => "Completed",
            ProjectStatus::Dropped => "Dropped",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Idea" => Some(ProjectStatus::Idea),
            "Planning" => Some(ProjectStatus::Planning),
            "Approved" => Some(ProjectStatus::Approved),
            "Execution" => Some(ProjectStatus::Execution),
            "Completed" => Some(ProjectStatus::Completed),
            "Dropped" => Some(ProjectStatus::Dropped),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self == ProjectStatus::Completed
    }

    /// Under way but not finished
    pub fn is_active(&self) -> bool {
        matches!(self, ProjectStatus::Planning | ProjectStatus::Approved | ProjectStatus::Execution)
    }
}

/// The seven Rotary areas of focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaOfFocus {
    Peacebuilding,
    DiseasePrevention,
    WaterSanitation,
    MaternalChildHealth,
    BasicEducation,
    CommunityEconomicDevelopment,
    Environment,
}

impl AreaOfFocus {
    pub const ALL: [AreaOfFocus; 7] = [
        AreaOfFocus::Peacebuilding,
        AreaOfFocus::DiseasePrevention,
        AreaOfFocus::WaterSanitation,
        AreaOfFocus::MaternalChildHealth,
        AreaOfFocus::BasicEducation,
        AreaOfFocus::CommunityEconomicDevelopment,
        AreaOfFocus::Environment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AreaOfFocus::Peacebuilding => "peacebuilding",
            AreaOfFocus::DiseasePrevention => "disease_prevention",
            AreaOfFocus::WaterSanitation => "water_sanitation",
            AreaOfFocus::MaternalChildHealth => "maternal_child_health",
            AreaOfFocus::BasicEducation => "basic_education",
            AreaOfFocus::CommunityEconomicDevelopment => "community_economic_development",
            AreaOfFocus::Environment => "environment",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|area| area.as_str() == s)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AreaOfFocus::Peacebuilding => "Peacebuilding & Conflict Prevention",
            AreaOfFocus::DiseasePrevention => "Disease Prevention & Treatment",
            AreaOfFocus::WaterSanitation => "Water, Sanitation & Hygiene",
            AreaOfFocus::MaternalChildHealth => "Maternal & Child Health",
            AreaOfFocus::BasicEducation => "Basic Education & Literacy",
            AreaOfFocus::CommunityEconomicDevelopment => "Community Economic Development",
            AreaOfFocus::Environment => "Environment",
        }
    }
}

/// ServiceProject entity - a club service project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceProject {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub area_of_focus: Option<AreaOfFocus>,
    pub start_date: Option<NaiveDate>,
    pub completion_date: Option<NaiveDate>,
    pub beneficiary_count: Option<i64>,
    pub project_value_rm: Option<Decimal>,
    pub rotary_year_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ServiceProject {
    /// Date used to place the project in time for reporting: completion if
    /// known, otherwise start
    pub fn reference_date(&self) -> Option<NaiveDate> {
        self.completion_date.or(self.start_date)
    }

    pub fn reference_date_in(&self, range: &DateRange) -> bool {
        self.reference_date().map(|d| range.contains(d)).unwrap_or(false)
    }

    /// Reported beneficiaries, zero when unknown
    pub fn beneficiaries(&self) -> i64 {
        self.beneficiary_count.unwrap_or(0)
    }

    /// Project value in RM, zero when unknown
    pub fn value_rm(&self) -> Decimal {
        self.project_value_rm.unwrap_or(Decimal::ZERO)
    }
}

impl LinkableEntity for ServiceProject {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::ServiceProject
    }

    fn entity_id(&self) -> Uuid {
        self.id
    }

    fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn link_date(&self) -> Option<NaiveDate> {
        self.completion_date
    }

    fn rotary_year_id(&self) -> Option<Uuid> {
        self.rotary_year_id
    }
}

/// NewServiceProject DTO - used when creating a new project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewServiceProject {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    pub area_of_focus: Option<AreaOfFocus>,
    pub start_date: Option<NaiveDate>,
    pub completion_date: Option<NaiveDate>,
    pub beneficiary_count: Option<i64>,
    pub project_value_rm: Option<Decimal>,
}

impl Validate for NewServiceProject {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("name", Some(self.name.clone()))
            .required()
            .min_length(2)
            .max_length(200)
            .validate()?;

        validate_figures(self.beneficiary_count, self.project_value_rm)?;

        ValidationBuilder::new("completion_date", self.completion_date)
            .not_before(self.start_date, "start_date")
            .validate()?;

        Ok(())
    }
}

/// UpdateServiceProject DTO - `Some(None)` clears a nullable field
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateServiceProject {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub status: Option<ProjectStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub area_of_focus: Option<Option<AreaOfFocus>>,
    #[serde(default, deserialize_with = "double_option")]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub completion_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub beneficiary_count: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub project_value_rm: Option<Option<Decimal>>,
}

impl Validate for UpdateServiceProject {
    fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            ValidationBuilder::new("name", Some(name.clone()))
                .required()
                .min_length(2)
                .max_length(200)
                .validate()?;
        }

        validate_figures(self.beneficiary_count.flatten(), self.project_value_rm.flatten())?;

        // Date order is checked against the stored row in the service
        Ok(())
    }
}

/// Upper bound on a single project's reported beneficiaries
pub const MAX_BENEFICIARY_COUNT: i64 = 1_000_000_000;

/// Upper bound on a single project's value, in whole RM
pub const MAX_PROJECT_VALUE_RM: i64 = 1_000_000_000_000;

fn validate_figures(beneficiary_count: Option<i64>, project_value_rm: Option<Decimal>) -> DomainResult<()> {
    ValidationBuilder::new("beneficiary_count", beneficiary_count)
        .range(0, MAX_BENEFICIARY_COUNT)
        .validate()?;
    ValidationBuilder::new("project_value_rm", project_value_rm)
        .range(Decimal::ZERO, Decimal::from(MAX_PROJECT_VALUE_RM))
        .validate()?;
    Ok(())
}

/// Reject an update whose resulting dates would be out of order
pub(crate) fn validate_date_order(start: Option<NaiveDate>, completion: Option<NaiveDate>) -> DomainResult<()> {
    if let (Some(start), Some(completion)) = (start, completion) {
        if completion < start {
            return Err(DomainError::Validation(ValidationError::invalid_value(
                "completion_date",
                "cannot be before start_date",
            )));
        }
    }
    Ok(())
}

/// Project filter for the read side. Every field is optional.
#[derive(Debug, Clone, Default)]
pub struct ProjectQuery {
    /// Reference date (completion, else start) inside this range
    pub date_range: Option<DateRange>,
    pub area_of_focus: Option<AreaOfFocus>,
    pub status: Option<ProjectStatus>,
}

/// ServiceProjectRow - SQLite row representation for mapping from database
#[derive(Debug, Clone, FromRow)]
pub struct ServiceProjectRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub area_of_focus: Option<String>,
    pub start_date: Option<String>,
    pub completion_date: Option<String>,
    pub beneficiary_count: Option<i64>,
    pub project_value_rm: Option<String>,
    pub rotary_year_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ServiceProjectRow {
    /// Convert database row to domain entity
    pub fn into_entity(self) -> DomainResult<ServiceProject> {
        let status = ProjectStatus::from_str(&self.status)
            .ok_or_else(|| DomainError::Internal(format!("Invalid project status: {}", self.status)))?;
        let area_of_focus = self
            .area_of_focus
            .as_deref()
            .map(|raw| {
                AreaOfFocus::from_str(raw)
                    .ok_or_else(|| DomainError::Internal(format!("Invalid area of focus: {}", raw)))
            })
            .transpose()?;
        if let Some(count) = self.beneficiary_count {
            if !(0..=MAX_BENEFICIARY_COUNT).contains(&count) {
                return Err(DomainError::Internal(format!("beneficiary_count out of range: {}", count)));
            }
        }
        let project_value_rm = parse_opt_decimal(&self.project_value_rm, "project_value_rm")?;
        if let Some(value) = project_value_rm {
            if (value.is_sign_negative() && !value.is_zero()) || value > Decimal::from(MAX_PROJECT_VALUE_RM) {
                return Err(DomainError::Internal(format!("project_value_rm out of range: {}", value)));
            }
        }

        Ok(ServiceProject {
            id: parse_uuid(&self.id)?,
            name: self.name,
            description: self.description,
            status,
            area_of_focus,
            start_date: parse_opt_date(&self.start_date)?,
            completion_date: parse_opt_date(&self.completion_date)?,
            beneficiary_count: self.beneficiary_count,
            project_value_rm,
            rotary_year_id: parse_opt_uuid(&self.rotary_year_id)?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row() -> ServiceProjectRow {
        ServiceProjectRow {
            id: Uuid::new_v4().to_string(),
            name: "Water filters for Kampung Baru".to_string(),
            description: None,
            status: "Completed".to_string(),
            area_of_focus: Some("water_sanitation".to_string()),
            start_date: Some("2025-05-01".to_string()),
            completion_date: Some("2025-08-15".to_string()),
            beneficiary_count: Some(120),
            project_value_rm: Some("5000.00".to_string()),
            rotary_year_id: None,
            created_at: Utc::now().to_rfc3339(),
            updated_at: Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn test_row_into_entity() {
        let project = row().into_entity().unwrap();
        assert_eq!(project.status, ProjectStatus::Completed);
        assert_eq!(project.area_of_focus, Some(AreaOfFocus::WaterSanitation));
        assert_eq!(project.project_value_rm, Some(dec!(5000)));
        assert!(project.is_eligible());
        assert_eq!(project.link_date(), NaiveDate::from_ymd_opt(2025, 8, 15));
    }

    #[test]
    fn test_malformed_rows_are_rejected() {
        let mut bad_status = row();
        bad_status.status = "Finished".to_string();
        assert!(bad_status.into_entity().is_err());

        let mut bad_area = row();
        bad_area.area_of_focus = Some("space".to_string());
        assert!(bad_area.into_entity().is_err());

        let mut negative = row();
        negative.project_value_rm = Some("-1".to_string());
        assert!(negative.into_entity().is_err());

        let mut oversized = row();
        oversized.project_value_rm = Some(Decimal::MAX.to_string());
        assert!(oversized.into_entity().is_err());

        let mut crowded = row();
        crowded.beneficiary_count = Some(i64::MAX);
        assert!(crowded.into_entity().is_err());

        let mut bad_date = row();
        bad_date.completion_date = Some("15/08/2025".to_string());
        assert!(bad_date.into_entity().is_err());
    }

    #[test]
    fn test_eligibility_needs_status_and_date() {
        let mut project = row().into_entity().unwrap();
        project.completion_date = None;
        assert!(project.is_terminal());
        assert!(!project.is_eligible());

        project.completion_date = NaiveDate::from_ymd_opt(2025, 8, 15);
        project.status = ProjectStatus::Execution;
        assert!(!project.is_eligible());
        assert!(project.status.is_active());
    }

    #[test]
    fn test_reference_date_falls_back_to_start() {
        let mut project = row().into_entity().unwrap();
        project.completion_date = None;
        assert_eq!(project.reference_date(), NaiveDate::from_ymd_opt(2025, 5, 1));
        project.start_date = None;
        assert_eq!(project.reference_date(), None);
    }

    #[test]
    fn test_new_project_validation() {
        let ok = NewServiceProject {
            name: "Blood drive".to_string(),
            beneficiary_count: Some(0),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let negative = NewServiceProject {
            name: "Blood drive".to_string(),
            beneficiary_count: Some(-4),
            ..Default::default()
        };
        assert!(negative.validate().is_err());

        let huge_count = NewServiceProject {
            name: "Blood drive".to_string(),
            beneficiary_count: Some(i64::MAX),
            ..Default::default()
        };
        assert!(huge_count.validate().is_err());

        let huge_value = NewServiceProject {
            name: "Blood drive".to_string(),
            project_value_rm: Some(Decimal::MAX),
            ..Default::default()
        };
        assert!(huge_value.validate().is_err());

        let at_limit = NewServiceProject {
            name: "Blood drive".to_string(),
            beneficiary_count: Some(MAX_BENEFICIARY_COUNT),
            project_value_rm: Some(Decimal::from(MAX_PROJECT_VALUE_RM)),
            ..Default::default()
        };
        assert!(at_limit.validate().is_ok());

        let huge_update = UpdateServiceProject {
            beneficiary_count: Some(Some(MAX_BENEFICIARY_COUNT + 1)),
            ..Default::default()
        };
        assert!(huge_update.validate().is_err());

        let backwards = NewServiceProject {
            name: "Blood drive".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 9, 1),
            completion_date: NaiveDate::from_ymd_opt(2025, 8, 1),
            ..Default::default()
        };
        assert!(backwards.validate().is_err());
    }

    #[test]
    fn test_area_names_round_trip() {
        for area in AreaOfFocus::ALL {
            assert_eq!(AreaOfFocus::from_str(area.as_str()), Some(area));
            assert_eq!(serde_json::to_string(&area).unwrap(), format!("\"{}\"", area.as_str()));
        }
    }
}
