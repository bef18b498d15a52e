pub mod types;
pub mod service;

pub use types::{AreaImpact, DashboardData, ImpactFilters, LifetimeImpact, YearImpact};
pub use service::{ImpactService, ImpactServiceImpl};
