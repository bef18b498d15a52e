pub mod types;

pub use types::{RetryPolicy, TimelineSettings};
