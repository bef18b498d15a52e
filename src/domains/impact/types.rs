use crate::domains::rotary_year::calendar::{fiscal_year_of, FiscalYear};
use crate::domains::service_project::types::{AreaOfFocus, ProjectQuery, ProjectStatus, ServiceProject};
use crate::domains::speaker::types::Speaker;
use crate::errors::DomainResult;
use crate::types::{add_amount, add_count, DateRange};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Dashboard filters. Area and status narrow projects only; the fiscal year
/// applies to both projects and speakers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactFilters {
    #[serde(default)]
    pub fiscal_year: Option<String>,
    #[serde(default)]
    pub area_of_focus: Option<AreaOfFocus>,
    #[serde(default)]
    pub status: Option<ProjectStatus>,
}

impl ImpactFilters {
    /// Bounds of the fiscal-year filter. A malformed label is an error.
    pub fn date_range(&self) -> DomainResult<Option<DateRange>> {
        self.fiscal_year
            .as_deref()
            .map(|label| FiscalYear::parse(label).map(|fy| fy.bounds()))
            .transpose()
    }

    pub fn project_query(&self, date_range: Option<DateRange>) -> ProjectQuery {
        ProjectQuery {
            date_range,
            area_of_focus: self.area_of_focus,
            status: self.status,
        }
    }
}

/// Club-wide totals for the filtered entities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifetimeImpact {
    pub people_served: i64,
    pub project_value: Decimal,
    pub projects_completed: i64,
    pub speakers_hosted: i64,
    pub active_projects: i64,
    pub total_projects: i64,
}

impl LifetimeImpact {
    pub fn from_entities(projects: &[ServiceProject], speakers: &[Speaker]) -> DomainResult<Self> {
        let mut impact = Self::default();
        for project in projects {
            impact.total_projects += 1;
            impact.people_served = add_count(impact.people_served, project.beneficiaries(), "people_served")?;
            impact.project_value = add_amount(impact.project_value, project.value_rm(), "project_value")?;
            if project.status.is_terminal() {
                impact.projects_completed += 1;
            }
            if project.status.is_active() {
                impact.active_projects += 1;
            }
        }
        impact.speakers_hosted = speakers.iter().filter(|s| s.status.is_terminal()).count() as i64;
        Ok(impact)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaImpact {
    pub area: AreaOfFocus,
    pub area_name: String,
    pub people_served: i64,
    pub project_value: Decimal,
    pub project_count: i64,
}

impl AreaImpact {
    fn empty(area: AreaOfFocus) -> Self {
        Self {
            area,
            area_name: area.display_name().to_string(),
            people_served: 0,
            project_value: Decimal::ZERO,
            project_count: 0,
        }
    }

    /// One entry per area that has projects, highest value first.
    /// Projects without an area are left out.
    pub fn rank(projects: &[ServiceProject]) -> DomainResult<Vec<Self>> {
        let mut by_area: HashMap<AreaOfFocus, AreaImpact> = HashMap::new();
        for project in projects {
            let Some(area) = project.area_of_focus else {
                continue;
            };
            let entry = by_area.entry(area).or_insert_with(|| AreaImpact::empty(area));
            entry.project_count += 1;
            entry.people_served = add_count(entry.people_served, project.beneficiaries(), "people_served")?;
            entry.project_value = add_amount(entry.project_value, project.value_rm(), "project_value")?;
        }

        let mut ranked: Vec<AreaImpact> = by_area.into_values().collect();
        ranked.sort_by(|a, b| b.project_value.cmp(&a.project_value).then(a.area.cmp(&b.area)));
        Ok(ranked)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearImpact {
    pub fiscal_year_label: String,
    pub people_served: i64,
    pub project_value: Decimal,
    pub project_count: i64,
    pub speakers_count: i64,
}

impl YearImpact {
    fn empty(fiscal_year: FiscalYear) -> Self {
        Self {
            fiscal_year_label: fiscal_year.label(),
            people_served: 0,
            project_value: Decimal::ZERO,
            project_count: 0,
            speakers_count: 0,
        }
    }

    /// Bucket projects by the fiscal year of their reference date and spoken
    /// speakers by their scheduled date, most recent year first. Undated
    /// entities have no bucket.
    pub fn timeline(projects: &[ServiceProject], speakers: &[Speaker]) -> DomainResult<Vec<Self>> {
        let mut by_year: BTreeMap<FiscalYear, YearImpact> = BTreeMap::new();

        for project in projects {
            let Some(date) = project.reference_date() else {
                continue;
            };
            let fy = fiscal_year_of(date);
            let entry = by_year.entry(fy).or_insert_with(|| YearImpact::empty(fy));
            entry.project_count += 1;
            entry.people_served = add_count(entry.people_served, project.beneficiaries(), "people_served")?;
            entry.project_value = add_amount(entry.project_value, project.value_rm(), "project_value")?;
        }

        for speaker in speakers.iter().filter(|s| s.status.is_terminal()) {
            let Some(date) = speaker.scheduled_date else {
                continue;
            };
            let fy = fiscal_year_of(date);
            by_year.entry(fy).or_insert_with(|| YearImpact::empty(fy)).speakers_count += 1;
        }

        Ok(by_year.into_values().rev().collect())
    }
}

/// Everything the impact dashboard shows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardData {
    pub lifetime: LifetimeImpact,
    pub by_area: Vec<AreaImpact>,
    pub over_time: Vec<YearImpact>,
    /// True when the figures are zeros because the entity store failed,
    /// rather than because there is nothing to count
    pub degraded: bool,
}
