use crate::domains::impact::service::{ImpactService, ImpactServiceImpl};
use crate::domains::photo::repository::SqlitePhotoRepository;
use crate::domains::photo::service::{PhotoService, PhotoServiceImpl};
use crate::domains::rotary_year::repository::SqliteRotaryYearRepository;
use crate::domains::rotary_year::service::{RotaryYearService, RotaryYearServiceImpl};
use crate::domains::service_project::repository::SqliteServiceProjectRepository;
use crate::domains::service_project::service::{ServiceProjectService, ServiceProjectServiceImpl};
use crate::domains::settings::TimelineSettings;
use crate::domains::speaker::repository::SqliteSpeakerRepository;
use crate::domains::speaker::service::{SpeakerService, SpeakerServiceImpl};
use crate::domains::timeline::linkage::YearLinkageResolver;
use crate::domains::timeline::service::{TimelineService, TimelineServiceImpl};
use crate::domains::timeline::stats::StatsRecomputationEngine;
use crate::ffi::error::{FFIError, FFIResult};
use lazy_static::lazy_static;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

// Global state definitions
lazy_static! {
    static ref INIT_MUTEX: tokio::sync::Mutex<()> = tokio::sync::Mutex::new(());
    static ref INITIALIZED: AtomicBool = AtomicBool::new(false);

    static ref DB_POOL: Mutex<Option<SqlitePool>> = Mutex::new(None);
    static ref SETTINGS: Mutex<Option<TimelineSettings>> = Mutex::new(None);

    static ref ROTARY_YEAR_SERVICE: Mutex<Option<Arc<dyn RotaryYearService>>> = Mutex::new(None);
    static ref SERVICE_PROJECT_SERVICE: Mutex<Option<Arc<dyn ServiceProjectService>>> = Mutex::new(None);
    static ref SPEAKER_SERVICE: Mutex<Option<Arc<dyn SpeakerService>>> = Mutex::new(None);
    static ref PHOTO_SERVICE: Mutex<Option<Arc<dyn PhotoService>>> = Mutex::new(None);
    static ref TIMELINE_SERVICE: Mutex<Option<Arc<dyn TimelineService>>> = Mutex::new(None);
    static ref IMPACT_SERVICE: Mutex<Option<Arc<dyn ImpactService>>> = Mutex::new(None);
}

fn read_global<T: Clone>(slot: &Mutex<Option<T>>, name: &str) -> FFIResult<T> {
    slot.lock()
        .map_err(|_| FFIError::internal(format!("{} lock poisoned", name)))?
        .clone()
        .ok_or_else(|| FFIError::internal(format!("{} not initialized", name)))
}

fn store_global<T>(slot: &Mutex<Option<T>>, name: &str, value: T) -> FFIResult<()> {
    *slot
        .lock()
        .map_err(|_| FFIError::internal(format!("{} lock poisoned", name)))? = Some(value);
    Ok(())
}

// --- Getter Functions ---

pub fn get_db_pool() -> FFIResult<SqlitePool> {
    read_global(&DB_POOL, "Database pool")
}
pub fn get_settings() -> FFIResult<TimelineSettings> {
    read_global(&SETTINGS, "Timeline settings")
}
pub fn get_rotary_year_service() -> FFIResult<Arc<dyn RotaryYearService>> {
    read_global(&ROTARY_YEAR_SERVICE, "Rotary year service")
}
pub fn get_service_project_service() -> FFIResult<Arc<dyn ServiceProjectService>> {
    read_global(&SERVICE_PROJECT_SERVICE, "Service project service")
}
pub fn get_speaker_service() -> FFIResult<Arc<dyn SpeakerService>> {
    read_global(&SPEAKER_SERVICE, "Speaker service")
}
pub fn get_photo_service() -> FFIResult<Arc<dyn PhotoService>> {
    read_global(&PHOTO_SERVICE, "Photo service")
}
pub fn get_timeline_service() -> FFIResult<Arc<dyn TimelineService>> {
    read_global(&TIMELINE_SERVICE, "Timeline service")
}
pub fn get_impact_service() -> FFIResult<Arc<dyn ImpactService>> {
    read_global(&IMPACT_SERVICE, "Impact service")
}

pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::Acquire)
}

/// Initialize global state. Repeated calls after a successful one are no-ops.
pub async fn initialize(db_url: &str) -> FFIResult<()> {
    // Acquire the async mutex to ensure single initialization
    let _guard = INIT_MUTEX.lock().await;

    if INITIALIZED.load(Ordering::Acquire) {
        return Ok(());
    }

    let result = initialize_internal(db_url).await;

    // Mark as initialized only if successful
    if result.is_ok() {
        INITIALIZED.store(true, Ordering::Release);
    }

    result
}

async fn initialize_internal(db_url: &str) -> FFIResult<()> {
    // Initialize logging first
    if std::env::var("RUST_LOG").is_err() {
        #[cfg(debug_assertions)]
        std::env::set_var("RUST_LOG", "debug");
        #[cfg(not(debug_assertions))]
        std::env::set_var("RUST_LOG", "info");
    }

    // Initialize env_logger if not already initialized
    let _ = env_logger::try_init();

    log::info!("Starting internal initialization");
    log::debug!("Database URL: {}", db_url);

    let settings = TimelineSettings::from_env()?;
    log::debug!(
        "Timeline settings: UTC{:+} min, {} recompute attempt(s), {} ms backoff",
        settings.utc_offset_minutes,
        settings.recompute_attempts,
        settings.recompute_backoff_ms
    );

    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .map_err(|e| {
            log::error!("Database connection failed: {}", e);
            FFIError::internal(format!("Database connection failed: {}", e))
        })?;
    log::info!("Database connection established");

    // Schema must be current before any repository touches it
    crate::db_migration::run_migrations(&pool).await?;

    let year_repo = Arc::new(SqliteRotaryYearRepository::new(pool.clone()));
    let project_repo = Arc::new(SqliteServiceProjectRepository::new(pool.clone()));
    let speaker_repo = Arc::new(SqliteSpeakerRepository::new(pool.clone()));
    let photo_repo = Arc::new(SqlitePhotoRepository::new(pool.clone()));

    let stats_engine = Arc::new(StatsRecomputationEngine::new(
        year_repo.clone(),
        project_repo.clone(),
        speaker_repo.clone(),
        settings.retry_policy(),
    ));
    let resolver = Arc::new(
        YearLinkageResolver::new(year_repo.clone(), stats_engine.clone())
            .register(project_repo.clone())
            .register(speaker_repo.clone())
            .register(photo_repo.clone()),
    );

    let rotary_year_service: Arc<dyn RotaryYearService> = Arc::new(RotaryYearServiceImpl::new(
        year_repo,
        resolver.clone(),
        settings.club_offset(),
    ));
    let service_project_service: Arc<dyn ServiceProjectService> =
        Arc::new(ServiceProjectServiceImpl::new(project_repo.clone(), resolver.clone()));
    let speaker_service: Arc<dyn SpeakerService> =
        Arc::new(SpeakerServiceImpl::new(speaker_repo.clone(), resolver.clone()));
    let photo_service: Arc<dyn PhotoService> = Arc::new(PhotoServiceImpl::new(photo_repo, resolver.clone()));
    let timeline_service: Arc<dyn TimelineService> = Arc::new(TimelineServiceImpl::new(resolver, stats_engine));
    let impact_service: Arc<dyn ImpactService> = Arc::new(ImpactServiceImpl::new(project_repo, speaker_repo));

    store_global(&DB_POOL, "Database pool", pool)?;
    store_global(&SETTINGS, "Timeline settings", settings)?;
    store_global(&ROTARY_YEAR_SERVICE, "Rotary year service", rotary_year_service)?;
    store_global(&SERVICE_PROJECT_SERVICE, "Service project service", service_project_service)?;
    store_global(&SPEAKER_SERVICE, "Speaker service", speaker_service)?;
    store_global(&PHOTO_SERVICE, "Photo service", photo_service)?;
    store_global(&TIMELINE_SERVICE, "Timeline service", timeline_service)?;
    store_global(&IMPACT_SERVICE, "Impact service", impact_service)?;

    log::info!("Initialization complete");
    Ok(())
}
