use crate::domains::core::repository::{FindById, YearLinkRepository};
use crate::domains::photo::types::{NewPhoto, Photo, PhotoRow, UpdatePhoto};
use crate::errors::{DbError, DomainError, DomainResult};
use crate::types::{format_opt_date, parse_opt_uuid, DateRange, EntityKind};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{query, query_as, query_scalar, Arguments, SqlitePool, sqlite::SqliteArguments};
use uuid::Uuid;

/// Trait defining photo repository operations
#[async_trait]
pub trait PhotoRepository: FindById<Photo> + Send + Sync {
    async fn create(&self, new_photo: &NewPhoto) -> DomainResult<Photo>;

    async fn update(&self, id: Uuid, update_data: &UpdatePhoto) -> DomainResult<Photo>;

    async fn delete(&self, id: Uuid) -> DomainResult<()>;

    /// A year's gallery, oldest first
    async fn find_by_rotary_year(&self, rotary_year_id: Uuid) -> DomainResult<Vec<Photo>>;
}

/// SQLite implementation for PhotoRepository
#[derive(Debug, Clone)]
pub struct SqlitePhotoRepository {
    pool: SqlitePool,
}

impl SqlitePhotoRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_row_to_entity(row: PhotoRow) -> DomainResult<Photo> {
        row.into_entity()
            .map_err(|e| DomainError::Internal(format!("Failed to map row to entity: {}", e)))
    }
}

#[async_trait]
impl FindById<Photo> for SqlitePhotoRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Photo> {
        let row = query_as::<_, PhotoRow>("SELECT * FROM photos WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?
            .ok_or_else(|| DomainError::EntityNotFound("Photo".to_string(), id))?;

        Self::map_row_to_entity(row)
    }
}

#[async_trait]
impl PhotoRepository for SqlitePhotoRepository {
    async fn create(&self, new_photo: &NewPhoto) -> DomainResult<Photo> {
        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();

        query(
            "INSERT INTO photos (id, title, caption, event_date, rotary_year_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, NULL, ?, ?)",
        )
        .bind(id.to_string())
        .bind(&new_photo.title)
        .bind(&new_photo.caption)
        .bind(format_opt_date(new_photo.event_date))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        self.find_by_id(id).await
    }

    async fn update(&self, id: Uuid, update_data: &UpdatePhoto) -> DomainResult<Photo> {
        let mut set_clauses = Vec::new();
        let mut args = SqliteArguments::default();

        if let Some(title) = &update_data.title {
            set_clauses.push("title = ?");
            let _ = args.add(title.clone());
        }
        if let Some(caption) = &update_data.caption {
            set_clauses.push("caption = ?");
            let _ = args.add(caption.clone());
        }
        if let Some(event_date) = update_data.event_date {
            set_clauses.push("event_date = ?");
            let _ = args.add(format_opt_date(event_date));
        }

        if set_clauses.is_empty() {
            return self.find_by_id(id).await;
        }

        set_clauses.push("updated_at = ?");
        let _ = args.add(Utc::now().to_rfc3339());
        let _ = args.add(id.to_string());

        let query_str = format!("UPDATE photos SET {} WHERE id = ?", set_clauses.join(", "));
        let result = sqlx::query_with(&query_str, args)
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::EntityNotFound("Photo".to_string(), id));
        }

        self.find_by_id(id).await
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        let result = query("DELETE FROM photos WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            Err(DomainError::EntityNotFound("Photo".to_string(), id))
        } else {
            Ok(())
        }
    }

    async fn find_by_rotary_year(&self, rotary_year_id: Uuid) -> DomainResult<Vec<Photo>> {
        let rows = query_as::<_, PhotoRow>(
            "SELECT * FROM photos WHERE rotary_year_id = ? ORDER BY event_date ASC, title ASC",
        )
        .bind(rotary_year_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        rows.into_iter()
            .map(Self::map_row_to_entity)
            .collect::<DomainResult<Vec<Photo>>>()
    }
}

#[async_trait]
impl YearLinkRepository for SqlitePhotoRepository {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::Photo
    }

    async fn set_rotary_year(&self, id: Uuid, rotary_year_id: Option<Uuid>) -> DomainResult<()> {
        let result = query("UPDATE photos SET rotary_year_id = ?, updated_at = ? WHERE id = ?")
            .bind(rotary_year_id.map(|y| y.to_string()))
            .bind(Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            Err(DomainError::EntityNotFound("Photo".to_string(), id))
        } else {
            Ok(())
        }
    }

    async fn find_rotary_year(&self, id: Uuid) -> DomainResult<Option<Uuid>> {
        let link: Option<Option<String>> = query_scalar("SELECT rotary_year_id FROM photos WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?;

        parse_opt_uuid(&link.flatten())
    }

    async fn find_unlinked_eligible(&self, range: &DateRange) -> DomainResult<Vec<Uuid>> {
        let ids: Vec<String> = query_scalar(
            "SELECT id FROM photos WHERE rotary_year_id IS NULL AND event_date BETWEEN ? AND ? ORDER BY event_date ASC",
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
    use crate::test_support::{memory_pool, provision_year};
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_gallery_for_year() {
        let pool = memory_pool().await;
        let repo = SqlitePhotoRepository::new(pool.clone());
        let year = provision_year(&pool, "2024-2025").await;

        let later = repo
            .create(&NewPhoto {
                title: "Charter night".to_string(),
                event_date: NaiveDate::from_ymd_opt(2025, 5, 3),
                ..Default::default()
            })
            .await
            .unwrap();
        let earlier = repo
            .create(&NewPhoto {
                title: "Installation".to_string(),
                event_date: NaiveDate::from_ymd_opt(2024, 7, 20),
                ..Default::default()
            })
            .await
            .unwrap();

        let unlinked = repo.find_unlinked_eligible(&year.bounds()).await.unwrap();
        assert_eq!(unlinked.len(), 2);
        for id in unlinked {
            repo.set_rotary_year(id, Some(year.id)).await.unwrap();
        }

        let gallery: Vec<Uuid> = repo.find_by_rotary_year(year.id).await.unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(gallery, vec![earlier.id, later.id]);
    }

    #[tokio::test]
    async fn test_update_caption_and_date() {
        let repo = SqlitePhotoRepository::new(memory_pool().await);
        let photo = repo
            .create(&NewPhoto {
                title: "Beach cleanup".to_string(),
                caption: Some("Volunteers at Port Dickson".to_string()),
                event_date: NaiveDate::from_ymd_opt(2025, 9, 14),
            })
            .await
            .unwrap();

        let updated = repo
            .update(
                photo.id,
                &UpdatePhoto {
                    caption: Some(None),
                    event_date: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.caption, None);
        assert_eq!(updated.event_date, None);
        assert_eq!(updated.title, "Beach cleanup");
    }
}
