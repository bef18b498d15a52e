// Public modules
pub mod domains;
pub mod errors;
pub mod ffi;
pub mod globals;
pub mod types;
pub mod validation;

// Private modules
mod db_migration;

#[cfg(test)]
mod test_support;

// Entry point for initialization
/// Initialize the library against the given SQLite database URL.
/// This function must be called before any other function in the library.
pub async fn initialize(db_url: &str) -> ffi::FFIResult<()> {
    globals::initialize(db_url).await
}

/// Get a reference to the SQLite connection pool
/// This is primarily for internal use
pub fn get_db_pool() -> ffi::FFIResult<sqlx::SqlitePool> {
    globals::get_db_pool()
}
