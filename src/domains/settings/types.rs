use crate::errors::{ServiceError, ServiceResult};
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

pub const ENV_UTC_OFFSET_MINUTES: &str = "CLUB_UTC_OFFSET_MINUTES";
pub const ENV_RECOMPUTE_ATTEMPTS: &str = "CLUB_RECOMPUTE_ATTEMPTS";
pub const ENV_RECOMPUTE_BACKOFF_MS: &str = "CLUB_RECOMPUTE_BACKOFF_MS";

/// Malaysia time, UTC+08:00
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 480;
pub const DEFAULT_RECOMPUTE_ATTEMPTS: u32 = 2;
pub const DEFAULT_RECOMPUTE_BACKOFF_MS: u64 = 200;

const MAX_RECOMPUTE_ATTEMPTS: u32 = 5;

/// Bounded retry for stats recomputation. The delay before attempt `n + 1`
/// is `backoff * n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self { attempts: attempts.max(1), backoff }
    }

    /// One attempt, no waiting
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_RECOMPUTE_ATTEMPTS,
            Duration::from_millis(DEFAULT_RECOMPUTE_BACKOFF_MS),
        )
    }
}

/// Club-level tunables for the timeline core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineSettings {
    /// Offset used to decide what "today" is for the club
    pub utc_offset_minutes: i32,
    pub recompute_attempts: u32,
    pub recompute_backoff_ms: u64,
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
            recompute_attempts: DEFAULT_RECOMPUTE_ATTEMPTS,
            recompute_backoff_ms: DEFAULT_RECOMPUTE_BACKOFF_MS,
        }
    }
}

impl TimelineSettings {
    /// Read settings from the process environment, loading a `.env` file first
    /// if one is present
    pub fn from_env() -> ServiceResult<Self> {
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup. Missing keys take their defaults;
    /// present but unusable values are a configuration error.
    pub fn from_lookup<F>(lookup: F) -> ServiceResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let settings = Self {
            utc_offset_minutes: parse_setting(&lookup, ENV_UTC_OFFSET_MINUTES, defaults.utc_offset_minutes)?,
            recompute_attempts: parse_setting(&lookup, ENV_RECOMPUTE_ATTEMPTS, defaults.recompute_attempts)?,
            recompute_backoff_ms: parse_setting(&lookup, ENV_RECOMPUTE_BACKOFF_MS, defaults.recompute_backoff_ms)?,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> ServiceResult<()> {
        if FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60)).is_none() {
            return Err(ServiceError::Configuration(format!(
                "{} must be within a day of UTC, got {}",
                ENV_UTC_OFFSET_MINUTES, self.utc_offset_minutes
            )));
        }
        if !(1..=MAX_RECOMPUTE_ATTEMPTS).contains(&self.recompute_attempts) {
            return Err(ServiceError::Configuration(format!(
                "{} must be between 1 and {}, got {}",
                ENV_RECOMPUTE_ATTEMPTS, MAX_RECOMPUTE_ATTEMPTS, self.recompute_attempts
            )));
        }
        Ok(())
    }

    pub fn club_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.recompute_attempts,
            Duration::from_millis(self.recompute_backoff_ms),
        )
    }
}

fn parse_setting<F, T>(lookup: &F, key: &str, default: T) -> ServiceResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|_| {
            ServiceError::Configuration(format!("Invalid value for {}: {}", key, raw))
        }),
    }
}
