use crate::errors::DomainResult;
use crate::types::{DateRange, EntityKind};
use async_trait::async_trait;
use uuid::Uuid;

/// Trait for finding entities by ID
#[async_trait]
pub trait FindById<T> {
    /// Find an entity by ID
    async fn find_by_id(&self, id: Uuid) -> DomainResult<T>;
}

/// Persistence of the `rotary_year_id` foreign key, implemented by every
/// repository whose entity can be linked to a rotary year.
#[async_trait]
pub trait YearLinkRepository: Send + Sync {
    fn entity_kind(&self) -> EntityKind;

    /// Set or clear the link. Only the foreign key (and `updated_at`) changes.
    async fn set_rotary_year(&self, id: Uuid, rotary_year_id: Option<Uuid>) -> DomainResult<()>;

    /// The stored link, or `None` when unlinked or unknown
    async fn find_rotary_year(&self, id: Uuid) -> DomainResult<Option<Uuid>>;

    /// Entities that are terminal, have a link date inside `range`, and are not
    /// yet linked to any year
    async fn find_unlinked_eligible(&self, range: &DateRange) -> DomainResult<Vec<Uuid>>;
}
