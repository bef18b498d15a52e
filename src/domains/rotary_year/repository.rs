use crate::domains::core::repository::FindById;
use crate::domains::rotary_year::calendar::FiscalYear;
use crate::domains::rotary_year::types::{
    NewRotaryYear, RotaryYear, RotaryYearRow, UpdateRotaryYear, YearStats, STAT_MEETINGS,
    STAT_VOLUNTEER_HOURS,
};
use crate::errors::{DbError, DomainError, DomainResult, ValidationError};
use crate::types::DATE_FORMAT;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{query, query_as, Arguments, Sqlite, SqlitePool, Transaction, sqlite::SqliteArguments};
use uuid::Uuid;

/// Trait defining rotary year repository operations
#[async_trait]
pub trait RotaryYearRepository: FindById<RotaryYear> + Send + Sync {
    async fn create(&self, new_year: &NewRotaryYear) -> DomainResult<RotaryYear>;

    async fn update(&self, id: Uuid, update_data: &UpdateRotaryYear) -> DomainResult<RotaryYear>;

    async fn find_by_label(&self, label: &str) -> DomainResult<Option<RotaryYear>>;

    /// All provisioned years, most recent first
    async fn find_all(&self) -> DomainResult<Vec<RotaryYear>>;

    /// Replace the stored stats object. Callers merge before writing.
    async fn update_stats(&self, id: Uuid, stats: &YearStats) -> DomainResult<()>;
}

/// SQLite implementation for RotaryYearRepository
#[derive(Debug, Clone)]
pub struct SqliteRotaryYearRepository {
    pool: SqlitePool,
}

impl SqliteRotaryYearRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn entity_name() -> &'static str {
        "rotary_years"
    }

    fn map_row_to_entity(row: RotaryYearRow) -> DomainResult<RotaryYear> {
        row.into_entity()
            .map_err(|e| DomainError::Internal(format!("Failed to map row to entity: {}", e)))
    }

    async fn find_by_id_with_tx<'t>(
        &self,
        id: Uuid,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<RotaryYear> {
        let row = query_as::<_, RotaryYearRow>("SELECT * FROM rotary_years WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&mut **tx)
            .await
            .map_err(DbError::from)?
            .ok_or_else(|| DomainError::EntityNotFound("RotaryYear".to_string(), id))?;

        Self::map_row_to_entity(row)
    }

    async fn create_with_tx<'t>(
        &self,
        new_year: &NewRotaryYear,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<RotaryYear> {
        let fiscal_year = FiscalYear::parse(&new_year.label)?;
        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();

        let result = query(
            r#"
            INSERT INTO rotary_years (
                id, label, start_date, end_date,
                club_president, club_theme,
                district_governor, district_theme,
                ri_president, ri_theme,
                stats, member_count_at_year_end,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, '{}', ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(fiscal_year.label())
        .bind(fiscal_year.start_date().format(DATE_FORMAT).to_string())
        .bind(fiscal_year.end_date().format(DATE_FORMAT).to_string())
        .bind(&new_year.club_president)
        .bind(&new_year.club_theme)
        .bind(&new_year.district_governor)
        .bind(&new_year.district_theme)
        .bind(&new_year.ri_president)
        .bind(&new_year.ri_theme)
        .bind(new_year.member_count_at_year_end)
        .bind(&now)
        .bind(&now)
        .execute(&mut **tx)
        .await;

        if let Err(err) = result {
            if let sqlx::Error::Database(db_err) = &err {
                if db_err.is_unique_violation() {
                    return Err(ValidationError::unique("label").into());
                }
            }
            return Err(DbError::from(err).into());
        }

        self.find_by_id_with_tx(id, tx).await
    }

    async fn update_with_tx<'t>(
        &self,
        id: Uuid,
        update_data: &UpdateRotaryYear,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<RotaryYear> {
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

        add_update!(club_president, &update_data.club_president);
        add_update!(club_theme, &update_data.club_theme);
        add_update!(district_governor, &update_data.district_governor);
        add_update!(district_theme, &update_data.district_theme);
        add_update!(ri_president, &update_data.ri_president);
        add_update!(ri_theme, &update_data.ri_theme);
        add_update!(member_count_at_year_end, update_data.member_count_at_year_end);

        if update_data.touches_stats() {
            let mut stats = existing.stats.clone();
            if let Some(meetings) = update_data.meetings {
                stats.set_count(STAT_MEETINGS, meetings);
            }
            if let Some(hours) = update_data.volunteer_hours {
                stats.set_decimal(STAT_VOLUNTEER_HOURS, hours);
            }
            set_clauses.push("stats = ?".to_string());
            let _ = args.add(stats.to_json_string()?);
        }

        if set_clauses.is_empty() {
            return Ok(existing);
        }

        set_clauses.push("updated_at = ?".to_string());
        let _ = args.add(&now);

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
            return Err(DomainError::EntityNotFound("RotaryYear".to_string(), id));
        }

        self.find_by_id_with_tx(id, tx).await
    }
}

#[async_trait]
impl FindById<RotaryYear> for SqliteRotaryYearRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<RotaryYear> {
        let row = query_as::<_, RotaryYearRow>("SELECT * FROM rotary_years WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?
            .ok_or_else(|| DomainError::EntityNotFound("RotaryYear".to_string(), id))?;

        Self::map_row_to_entity(row)
    }
}

#[async_trait]
impl RotaryYearRepository for SqliteRotaryYearRepository {
    async fn create(&self, new_year: &NewRotaryYear) -> DomainResult<RotaryYear> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.create_with_tx(new_year, &mut tx).await;
        match result {
            Ok(year) => { tx.commit().await.map_err(DbError::from)?; Ok(year) },
            Err(e) => { let _ = tx.rollback().await; Err(e) }
        }
    }

    async fn update(&self, id: Uuid, update_data: &UpdateRotaryYear) -> DomainResult<RotaryYear> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.update_with_tx(id, update_data, &mut tx).await;
        match result {
            Ok(year) => { tx.commit().await.map_err(DbError::from)?; Ok(year) },
            Err(e) => { let _ = tx.rollback().await; Err(e) }
        }
    }

    async fn find_by_label(&self, label: &str) -> DomainResult<Option<RotaryYear>> {
        let row = query_as::<_, RotaryYearRow>("SELECT * FROM rotary_years WHERE label = ?")
            .bind(label)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?;

        row.map(Self::map_row_to_entity).transpose()
    }

    async fn find_all(&self) -> DomainResult<Vec<RotaryYear>> {
        let rows = query_as::<_, RotaryYearRow>(
            "SELECT * FROM rotary_years ORDER BY start_date DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        rows.into_iter()
            .map(Self::map_row_to_entity)
            .collect::<DomainResult<Vec<RotaryYear>>>()
    }

    async fn update_stats(&self, id: Uuid, stats: &YearStats) -> DomainResult<()> {
        let now = Utc::now().to_rfc3339();
        let result = query("UPDATE rotary_years SET stats = ?, updated_at = ? WHERE id = ?")
            .bind(stats.to_json_string()?)
            .bind(now)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            Err(DomainError::EntityNotFound("RotaryYear".to_string(), id))
        } else {
            Ok(())
        }
    }
}
