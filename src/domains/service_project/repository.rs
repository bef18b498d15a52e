use crate::domains::core::repository::{FindById, YearLinkRepository};
use crate::domains::service_project::types::{
    NewServiceProject, ProjectQuery, ServiceProject, ServiceProjectRow, UpdateServiceProject,
};
use crate::errors::{DbError, DomainError, DomainResult};
use crate::types::{format_opt_date, parse_opt_uuid, DateRange, EntityKind};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{query, query_as, query_scalar, Arguments, Sqlite, SqlitePool, Transaction, sqlite::SqliteArguments};
use uuid::Uuid;

/// Trait defining service project repository operations
#[async_trait]
pub trait ServiceProjectRepository: FindById<ServiceProject> + Send + Sync {
    async fn create(&self, new_project: &NewServiceProject) -> DomainResult<ServiceProject>;

    async fn update(&self, id: Uuid, update_data: &UpdateServiceProject) -> DomainResult<ServiceProject>;

    async fn delete(&self, id: Uuid) -> DomainResult<()>;

    /// Every project linked to the year, whatever its status
    async fn find_by_rotary_year(&self, rotary_year_id: Uuid) -> DomainResult<Vec<ServiceProject>>;

    async fn find_filtered(&self, filter: &ProjectQuery) -> DomainResult<Vec<ServiceProject>>;
}

/// SQLite implementation for ServiceProjectRepository
#[derive(Debug, Clone)]
pub struct SqliteServiceProjectRepository {
    pool: SqlitePool,
}

impl SqliteServiceProjectRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn entity_name() -> &'static str {
        "service_projects"
    }

    fn map_row_to_entity(row: ServiceProjectRow) -> DomainResult<ServiceProject> {
        row.into_entity()
            .map_err(|e| DomainError::Internal(format!("Failed to map row to entity: {}", e)))
    }

    async fn find_by_id_with_tx<'t>(
        &self,
        id: Uuid,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<ServiceProject> {
        let row = query_as::<_, ServiceProjectRow>("SELECT * FROM service_projects WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&mut **tx)
            .await
            .map_err(DbError::from)?
            .ok_or_else(|| DomainError::EntityNotFound("ServiceProject".to_string(), id))?;

        Self::map_row_to_entity(row)
    }

    async fn create_with_tx<'t>(
        &self,
        new_project: &NewServiceProject,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<ServiceProject> {
        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();

        query(
            r#"
            INSERT INTO service_projects (
                id, name, description, status, area_of_focus,
                start_date, completion_date,
                beneficiary_count, project_value_rm,
                rotary_year_id, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&new_project.name)
        .bind(&new_project.description)
        .bind(new_project.status.as_str())
        .bind(new_project.area_of_focus.map(|a| a.as_str()))
        .bind(format_opt_date(new_project.start_date))
        .bind(format_opt_date(new_project.completion_date))
        .bind(new_project.beneficiary_count)
        .bind(new_project.project_value_rm.map(|v| v.to_string()))
        .bind(&now)
        .bind(&now)
        .execute(&mut **tx)
        .await
        .map_err(DbError::from)?;

        self.find_by_id_with_tx(id, tx).await
    }

    async fn update_with_tx<'t>(
        &self,
        id: Uuid,
        update_data: &UpdateServiceProject,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<ServiceProject> {
        let existing = self.find_by_id_with_tx(id, tx).await?;
        let now = Utc::now().to_rfc3339();

        let mut set_clauses = Vec::new();
        let mut args = SqliteArguments::default();

        macro_rules! add_update {($field:ident, $value:expr) => {
            if let Some(val) = $value {
                set_clauses.push(format!("{} = ?", stringify!($field)));
                let _ = args.add(val);
            }
        };}

        add_update!(name, update_data.name.clone());
        add_update!(description, update_data.description.clone());
        add_update!(status, update_data.status.map(|s| s.as_str()));
        add_update!(area_of_focus, update_data.area_of_focus.map(|a| a.map(|a| a.as_str())));
        add_update!(start_date, update_data.start_date.map(format_opt_date));
        add_update!(completion_date, update_data.completion_date.map(format_opt_date));
        add_update!(beneficiary_count, update_data.beneficiary_count);
        add_update!(project_value_rm, update_data.project_value_rm.map(|v| v.map(|v| v.to_string())));

        if set_clauses.is_empty() {
            return Ok(existing);
        }

        set_clauses.push("updated_at = ?".to_string());
        let _ = args.add(now);

        let query_str = format!(
            "UPDATE {} SET {} WHERE id = ?",
            Self::entity_name(),
            set_clauses.join(", ")
        );
        let _ = args.add(id.to_string());

        let result = sqlx::query_with(&query_str, args)
            .execute(&mut **tx)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::EntityNotFound("ServiceProject".to_string(), id));
        }

        self.find_by_id_with_tx(id, tx).await
    }
}

#[async_trait]
impl FindById<ServiceProject> for SqliteServiceProjectRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<ServiceProject> {
        let row = query_as::<_, ServiceProjectRow>("SELECT * FROM service_projects WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?
            .ok_or_else(|| DomainError::EntityNotFound("ServiceProject".to_string(), id))?;

        Self::map_row_to_entity(row)
    }
}

#[async_trait]
impl ServiceProjectRepository for SqliteServiceProjectRepository {
    async fn create(&self, new_project: &NewServiceProject) -> DomainResult<ServiceProject> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.create_with_tx(new_project, &mut tx).await;
        match result {
            Ok(project) => { tx.commit().await.map_err(DbError::from)?; Ok(project) },
            Err(e) => { let _ = tx.rollback().await; Err(e) }
        }
    }

    async fn update(&self, id: Uuid, update_data: &UpdateServiceProject) -> DomainResult<ServiceProject> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.update_with_tx(id, update_data, &mut tx).await;
        match result {
            Ok(project) => { tx.commit().await.map_err(DbError::from)?; Ok(project) },
            Err(e) => { let _ = tx.rollback().await; Err(e) }
        }
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        let result = query("DELETE FROM service_projects WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            Err(DomainError::EntityNotFound("ServiceProject".to_string(), id))
        } else {
            Ok(())
        }
    }

    async fn find_by_rotary_year(&self, rotary_year_id: Uuid) -> DomainResult<Vec<ServiceProject>> {
        let rows = query_as::<_, ServiceProjectRow>(
            "SELECT * FROM service_projects WHERE rotary_year_id = ? ORDER BY completion_date ASC, name ASC",
        )
        .bind(rotary_year_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        rows.into_iter()
            .map(Self::map_row_to_entity)
            .collect::<DomainResult<Vec<ServiceProject>>>()
    }

    async fn find_filtered(&self, filter: &ProjectQuery) -> DomainResult<Vec<ServiceProject>> {
        let mut conditions = Vec::new();
        let mut args = SqliteArguments::default();

        if let Some(range) = &filter.date_range {
            conditions.push("COALESCE(completion_date, start_date) BETWEEN ? AND ?".to_string());
            let _ = args.add(range.start_str());
            let _ = args.add(range.end_str());
        }
        if let Some(area) = filter.area_of_focus {
            conditions.push("area_of_focus = ?".to_string());
            let _ = args.add(area.as_str());
        }
        if let Some(status) = filter.status {
            conditions.push("status = ?".to_string());
            let _ = args.add(status.as_str());
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        let query_str = format!(
            "SELECT * FROM {}{} ORDER BY name ASC",
            Self::entity_name(),
            where_clause
        );

        let rows = sqlx::query_as_with::<_, ServiceProjectRow, _>(&query_str, args)
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;

        rows.into_iter()
            .map(Self::map_row_to_entity)
            .collect::<DomainResult<Vec<ServiceProject>>>()
    }
}

#[async_trait]
impl YearLinkRepository for SqliteServiceProjectRepository {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::ServiceProject
    }

    async fn set_rotary_year(&self, id: Uuid, rotary_year_id: Option<Uuid>) -> DomainResult<()> {
        let now = Utc::now().to_rfc3339();
        let result = query("UPDATE service_projects SET rotary_year_id = ?, updated_at = ? WHERE id = ?")
            .bind(rotary_year_id.map(|y| y.to_string()))
            .bind(now)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            Err(DomainError::EntityNotFound("ServiceProject".to_string(), id))
        } else {
            Ok(())
        }
    }

    async fn find_rotary_year(&self, id: Uuid) -> DomainResult<Option<Uuid>> {
        let link: Option<Option<String>> = query_scalar("SELECT rotary_year_id FROM service_projects WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?;

        parse_opt_uuid(&link.flatten())
    }

    async fn find_unlinked_eligible(&self, range: &DateRange) -> DomainResult<Vec<Uuid>> {
        let ids: Vec<String> = query_scalar(
            r#"
            SELECT id FROM service_projects
            WHERE status = 'Completed'
              AND rotary_year_id IS NULL
              AND completion_date BETWEEN ? AND ?
            ORDER BY completion_date ASC
            "#,
        )
        .bind(range.start_str())
        .bind(range.end_str())
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        ids.iter()
            .map(|id| Uuid::parse_str(id).map_err(|_| DomainError::InvalidUuid(id.clone())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::service_project::types::{AreaOfFocus, ProjectStatus};
    use crate::test_support::{memory_pool, provision_year};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn completed(name: &str, completion: (i32, u32, u32), area: AreaOfFocus) -> NewServiceProject {
        NewServiceProject {
            name: name.to_string(),
            status: ProjectStatus::Completed,
            area_of_focus: Some(area),
            completion_date: NaiveDate::from_ymd_opt(completion.0, completion.1, completion.2),
            beneficiary_count: Some(10),
            project_value_rm: Some(dec!(250.50)),
            ..Default::default()
        }
    }

    fn fy_2025() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 6, 30).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_create_and_update_round_trip() {
        let repo = SqliteServiceProjectRepository::new(memory_pool().await);
        let project = repo
            .create(&completed("Food bank", (2025, 8, 15), AreaOfFocus::CommunityEconomicDevelopment))
            .await
            .unwrap();
        assert_eq!(project.project_value_rm, Some(dec!(250.50)));
        assert_eq!(project.rotary_year_id, None);

        let updated = repo
            .update(
                project.id,
                &UpdateServiceProject {
                    status: Some(ProjectStatus::Execution),
                    completion_date: Some(None),
                    area_of_focus: Some(None),
                    beneficiary_count: Some(Some(75)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, ProjectStatus::Execution);
        assert_eq!(updated.completion_date, None);
        assert_eq!(updated.area_of_focus, None);
        assert_eq!(updated.beneficiary_count, Some(75));
        assert_eq!(updated.name, "Food bank");
    }

    #[tokio::test]
    async fn test_filtered_by_reference_date_area_and_status() {
        let repo = SqliteServiceProjectRepository::new(memory_pool().await);
        repo.create(&completed("A", (2025, 7, 1), AreaOfFocus::Environment)).await.unwrap();
        repo.create(&completed("B", (2026, 6, 30), AreaOfFocus::BasicEducation)).await.unwrap();
        repo.create(&completed("C", (2026, 7, 1), AreaOfFocus::Environment)).await.unwrap();
        repo.create(&NewServiceProject {
            name: "D".to_string(),
            status: ProjectStatus::Planning,
            start_date: NaiveDate::from_ymd_opt(2025, 9, 1),
            ..Default::default()
        })
        .await
        .unwrap();

        let in_year = repo
            .find_filtered(&ProjectQuery { date_range: Some(fy_2025()), ..Default::default() })
            .await
            .unwrap();
        let names: Vec<&str> = in_year.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "D"]);

        let env_completed = repo
            .find_filtered(&ProjectQuery {
                area_of_focus: Some(AreaOfFocus::Environment),
                status: Some(ProjectStatus::Completed),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(env_completed.len(), 2);

        assert_eq!(repo.find_filtered(&ProjectQuery::default()).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_link_and_unlinked_eligible() {
        let pool = memory_pool().await;
        let repo = SqliteServiceProjectRepository::new(pool.clone());
        let year_id = provision_year(&pool, "2025-2026").await.id;

        let a = repo.create(&completed("A", (2025, 8, 1), AreaOfFocus::Environment)).await.unwrap();
        let b = repo.create(&completed("B", (2025, 9, 1), AreaOfFocus::Environment)).await.unwrap();
        repo.create(&completed("Other year", (2024, 9, 1), AreaOfFocus::Environment)).await.unwrap();

        repo.set_rotary_year(a.id, Some(year_id)).await.unwrap();
        assert_eq!(repo.find_unlinked_eligible(&fy_2025()).await.unwrap(), vec![b.id]);
        assert_eq!(repo.find_by_rotary_year(year_id).await.unwrap().len(), 1);
        assert_eq!(repo.find_rotary_year(a.id).await.unwrap(), Some(year_id));

        repo.set_rotary_year(a.id, None).await.unwrap();
        assert!(repo.find_by_rotary_year(year_id).await.unwrap().is_empty());
        assert_eq!(repo.find_rotary_year(a.id).await.unwrap(), None);
        assert_eq!(repo.find_rotary_year(Uuid::new_v4()).await.unwrap(), None);

        let missing = repo.set_rotary_year(Uuid::new_v4(), None).await.unwrap_err();
        assert!(matches!(missing, DomainError::EntityNotFound(_, _)));
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = SqliteServiceProjectRepository::new(memory_pool().await);
        let project = repo.create(&completed("Gone", (2025, 8, 1), AreaOfFocus::Environment)).await.unwrap();
        repo.delete(project.id).await.unwrap();
        assert!(matches!(repo.find_by_id(project.id).await, Err(DomainError::EntityNotFound(_, _))));
        assert!(repo.delete(project.id).await.is_err());
    }
}
