pub mod types;
pub mod stats;
pub mod linkage;
pub mod service;

pub use types::{
    BackfillOutcome, EntitySavedEvent, EntitySnapshot, LinkableEntity, LinkageAction,
    LinkageOutcome, LinkageWarning, LinkedEntity, SaveOutcome, YearAggregate,
};
pub use stats::StatsRecomputationEngine;
pub use linkage::YearLinkageResolver;
pub use service::{TimelineService, TimelineServiceImpl};
