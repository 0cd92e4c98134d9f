//! Expiry arithmetic and the clock it runs on.
//!
//! All timestamps are milliseconds since the Unix epoch. Months and years are
//! fixed 30 and 365 day spans, not calendar arithmetic.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Stored expiry meaning "never expires".
pub const NO_EXPIRY: i64 = -1;

/// Unit of an expiry duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeUnit {
    #[default]
    #[serde(rename = "ms")]
    Ms,
    #[serde(rename = "s")]
    S,
    #[serde(rename = "min")]
    Min,
    #[serde(rename = "h")]
    H,
    #[serde(rename = "d")]
    D,
    #[serde(rename = "w")]
    W,
    /// 30 days.
    #[serde(rename = "m")]
    M,
    /// 365 days.
    #[serde(rename = "y")]
    Y,
}

impl TimeUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ms => "ms",
            Self::S => "s",
            Self::Min => "min",
            Self::H => "h",
            Self::D => "d",
            Self::W => "w",
            Self::M => "m",
            Self::Y => "y",
        }
    }

    /// Milliseconds in one unit.
    pub const fn multiplier(self) -> i64 {
        match self {
            Self::Ms => 1,
            Self::S => 1_000,
            Self::Min => 60_000,
            Self::H => 3_600_000,
            Self::D => 86_400_000,
            Self::W => 604_800_000,
            Self::M => 2_592_000_000,
            Self::Y => 31_536_000_000,
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeUnit {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ms" => Ok(Self::Ms),
            "s" => Ok(Self::S),
            "min" => Ok(Self::Min),
            "h" => Ok(Self::H),
            "d" => Ok(Self::D),
            "w" => Ok(Self::W),
            "m" => Ok(Self::M),
            "y" => Ok(Self::Y),
            _ => Err(StoreError::UnknownTimeUnit(s.to_string())),
        }
    }
}

/// Absolute expiry for a duration starting at `now`. `None` for durations <= 0,
/// which mean the entry never expires.
pub fn resolve_absolute_expiry(duration: i64, unit: TimeUnit, now: i64) -> Option<i64> {
    if duration <= 0 {
        return None;
    }
    Some(now.saturating_add(duration.saturating_mul(unit.multiplier())))
}

/// An expiry <= 0 never expires; otherwise the entry is dead from `expiry` on.
pub fn is_expired(expiry: i64, now: i64) -> bool {
    expiry > 0 && now >= expiry
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start_ms)),
        }
    }

    pub fn set(&self, ms: i64) {
        self.now.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: i64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
