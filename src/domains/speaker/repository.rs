use crate::domains::core::repository::{FindById, YearLinkRepository};
use crate::domains::speaker::types::{NewSpeaker, Speaker, SpeakerRow, SpeakerStatus, UpdateSpeaker};
use crate::errors::{DbError, DomainError, DomainResult};
use crate::types::{format_opt_date, parse_opt_uuid, DateRange, EntityKind};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{query, query_as, query_scalar, Arguments, Sqlite, SqlitePool, Transaction, sqlite::SqliteArguments};
use uuid::Uuid;

/// Trait defining speaker repository operations
#[async_trait]
pub trait SpeakerRepository: FindById<Speaker> + Send + Sync {
    async fn create(&self, new_speaker: &NewSpeaker) -> DomainResult<Speaker>;

    async fn update(&self, id: Uuid, update_data: &UpdateSpeaker) -> DomainResult<Speaker>;

    async fn delete(&self, id: Uuid) -> DomainResult<()>;

    async fn find_by_rotary_year(&self, rotary_year_id: Uuid) -> DomainResult<Vec<Speaker>>;

    /// Linked speakers who have spoken
    async fn find_spoken_by_rotary_year(&self, rotary_year_id: Uuid) -> DomainResult<Vec<Speaker>>;

    /// Speakers who have spoken, optionally limited to a scheduled-date range
    async fn find_spoken(&self, range: Option<DateRange>) -> DomainResult<Vec<Speaker>>;
}

/// SQLite implementation for SpeakerRepository
#[derive(Debug, Clone)]
pub struct SqliteSpeakerRepository {
    pool: SqlitePool,
}

impl SqliteSpeakerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn entity_name() -> &'static str {
        "speakers"
    }

    fn map_row_to_entity(row: SpeakerRow) -> DomainResult<Speaker> {
        row.into_entity()
            .map_err(|e| DomainError::Internal(format!("Failed to map row to entity: {}", e)))
    }

    fn map_rows(rows: Vec<SpeakerRow>) -> DomainResult<Vec<Speaker>> {
        rows.into_iter()
            .map(Self::map_row_to_entity)
            .collect::<DomainResult<Vec<Speaker>>>()
    }

    async fn find_by_id_with_tx<'t>(
        &self,
        id: Uuid,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<Speaker> {
        let row = query_as::<_, SpeakerRow>("SELECT * FROM speakers WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&mut **tx)
            .await
            .map_err(DbError::from)?
            .ok_or_else(|| DomainError::EntityNotFound("Speaker".to_string(), id))?;

        Self::map_row_to_entity(row)
    }

    async fn update_with_tx<'t>(
        &self,
        id: Uuid,
        update_data: &UpdateSpeaker,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<Speaker> {
        let existing = self.find_by_id_with_tx(id, tx).await?;

        let mut set_clauses = Vec::new();
        let mut args = SqliteArguments::default();

        macro_rules! add_update {($field:ident, $value:expr) => {
            if let Some(val) = $value {
                set_clauses.push(format!("{} = ?", stringify!($field)));
                let _ = args.add(val);
            }
        };}

        add_update!(name, update_data.name.clone());
        add_update!(topic, update_data.topic.clone());
        add_update!(organization, update_data.organization.clone());
        add_update!(status, update_data.status.map(|s| s.as_str()));
        add_update!(scheduled_date, update_data.scheduled_date.map(format_opt_date));

        if set_clauses.is_empty() {
            return Ok(existing);
        }

        set_clauses.push("updated_at = ?".to_string());
        let _ = args.add(Utc::now().to_rfc3339());

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
            return Err(DomainError::EntityNotFound("Speaker".to_string(), id));
        }

        self.find_by_id_with_tx(id, tx).await
    }
}

#[async_trait]
impl FindById<Speaker> for SqliteSpeakerRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Speaker> {
        let row = query_as::<_, SpeakerRow>("SELECT * FROM speakers WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?
            .ok_or_else(|| DomainError::EntityNotFound("Speaker".to_string(), id))?;

        Self::map_row_to_entity(row)
    }
}

#[async_trait]
impl SpeakerRepository for SqliteSpeakerRepository {
    async fn create(&self, new_speaker: &NewSpeaker) -> DomainResult<Speaker> {
        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();

        query(
            r#"
            INSERT INTO speakers (
                id, name, topic, organization, status, scheduled_date,
                rotary_year_id, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, NULL, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&new_speaker.name)
        .bind(&new_speaker.topic)
        .bind(&new_speaker.organization)
        .bind(new_speaker.status.as_str())
        .bind(format_opt_date(new_speaker.scheduled_date))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        self.find_by_id(id).await
    }

    async fn update(&self, id: Uuid, update_data: &UpdateSpeaker) -> DomainResult<Speaker> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.update_with_tx(id, update_data, &mut tx).await;
        match result {
            Ok(speaker) => { tx.commit().await.map_err(DbError::from)?; Ok(speaker) },
            Err(e) => { let _ = tx.rollback().await; Err(e) }
        }
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        let result = query("DELETE FROM speakers WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            Err(DomainError::EntityNotFound("Speaker".to_string(), id))
        } else {
            Ok(())
        }
    }

    async fn find_by_rotary_year(&self, rotary_year_id: Uuid) -> DomainResult<Vec<Speaker>> {
        let rows = query_as::<_, SpeakerRow>(
            "SELECT * FROM speakers WHERE rotary_year_id = ? ORDER BY scheduled_date ASC, name ASC",
        )
        .bind(rotary_year_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        Self::map_rows(rows)
    }

    async fn find_spoken_by_rotary_year(&self, rotary_year_id: Uuid) -> DomainResult<Vec<Speaker>> {
        let rows = query_as::<_, SpeakerRow>(
            "SELECT * FROM speakers WHERE rotary_year_id = ? AND status = ? ORDER BY scheduled_date ASC, name ASC",
        )
        .bind(rotary_year_id.to_string())
        .bind(SpeakerStatus::Spoken.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        Self::map_rows(rows)
    }

    async fn find_spoken(&self, range: Option<DateRange>) -> DomainResult<Vec<Speaker>> {
        let rows = match range {
            Some(range) => {
                query_as::<_, SpeakerRow>(
                    "SELECT * FROM speakers WHERE status = ? AND scheduled_date BETWEEN ? AND ? ORDER BY scheduled_date ASC",
                )
                .bind(SpeakerStatus::Spoken.as_str())
                .bind(range.start_str())
                .bind(range.end_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                query_as::<_, SpeakerRow>(
                    "SELECT * FROM speakers WHERE status = ? ORDER BY scheduled_date ASC",
                )
                .bind(SpeakerStatus::Spoken.as_str())
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(DbError::from)?;

        Self::map_rows(rows)
    }
}

#[async_trait]
impl YearLinkRepository for SqliteSpeakerRepository {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::Speaker
    }

    async fn set_rotary_year(&self, id: Uuid, rotary_year_id: Option<Uuid>) -> DomainResult<()> {
        let result = query("UPDATE speakers SET rotary_year_id = ?, updated_at = ? WHERE id = ?")
            .bind(rotary_year_id.map(|y| y.to_string()))
            .bind(Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            Err(DomainError::EntityNotFound("Speaker".to_string(), id))
        } else {
            Ok(())
        }
    }

    async fn find_rotary_year(&self, id: Uuid) -> DomainResult<Option<Uuid>> {
        let link: Option<Option<String>> = query_scalar("SELECT rotary_year_id FROM speakers WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?;

        parse_opt_uuid(&link.flatten())
    }

    async fn find_unlinked_eligible(&self, range: &DateRange) -> DomainResult<Vec<Uuid>> {
        let ids: Vec<String> = query_scalar(
            r#"
            SELECT id FROM speakers
            WHERE status = 'spoken'
              AND rotary_year_id IS NULL
              AND scheduled_date BETWEEN ? AND ?
            ORDER BY scheduled_date ASC
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
