pub mod calendar;
pub mod types;
pub mod repository;
pub mod service;

pub use calendar::{fiscal_year_of, FiscalYear};
pub use types::{NewRotaryYear, RotaryYear, RotaryYearRow, UpdateRotaryYear, YearStats};
pub use repository::{RotaryYearRepository, SqliteRotaryYearRepository};
pub use service::{RotaryYearService, RotaryYearServiceImpl};
