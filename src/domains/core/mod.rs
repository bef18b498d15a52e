pub mod repository;

pub use repository::{FindById, YearLinkRepository}; // Export core traits
