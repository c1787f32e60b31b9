//! Policy types for pipeline execution control.
//!
//! - [`RetryPolicy`]: how a tile fetch handles transient failures
//! - [`TileErrorPolicy`]: how a run reacts when one tile cannot be produced
//!
//! # Example
//!
//! ```
//! use terrain_mosaic::executor::{RetryPolicy, TileErrorPolicy};
//!
//! // Three attempts with exponential backoff
//! let retry = RetryPolicy::exponential(3);
//! assert_eq!(retry.max_attempts(), 3);
//!
//! // Keep going when a tile fails, report it in the run result
//! let policy = TileErrorPolicy::Skip;
//! assert!(!policy.aborts());
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

// =============================================================================
// Retry Policy Constants
// =============================================================================

/// Default initial delay for exponential backoff (100ms).
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 100;

/// Default maximum delay for exponential backoff (30 seconds).
pub const DEFAULT_MAX_DELAY_SECS: u64 = 30;

/// Default multiplier for exponential backoff.
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Default number of fetch attempts per tile (initial attempt included).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// How a fetch handles transient failures.
///
/// Every variant is bounded: a tile is attempted at most
/// [`RetryPolicy::max_attempts`] times before its error is surfaced.
#[derive(Clone, Debug, PartialEq)]
pub enum RetryPolicy {
    /// No retries - fail immediately on error.
    None,

    /// Fixed number of attempts with constant delay between them.
    Fixed {
        /// Maximum number of attempts (including the initial attempt).
        max_attempts: u32,
        /// Delay between retry attempts.
        delay: Duration,
    },

    /// Exponential backoff.
    ///
    /// The delay is multiplied after each failed attempt, up to a maximum.
    ExponentialBackoff {
        /// Maximum number of attempts (including the initial attempt).
        max_attempts: u32,
        /// Initial delay after the first failure.
        initial_delay: Duration,
        /// Maximum delay cap (delay won't exceed this).
        max_delay: Duration,
        /// Multiplier applied to delay after each failure (typically 2.0).
        multiplier: f64,
    },
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(DEFAULT_MAX_ATTEMPTS)
    }
}

impl RetryPolicy {
    /// Creates an exponential backoff policy with the default timings.
    ///
    /// Uses:
    /// - Initial delay: 100ms ([`DEFAULT_INITIAL_DELAY_MS`])
    /// - Max delay: 30 seconds ([`DEFAULT_MAX_DELAY_SECS`])
    /// - Multiplier: 2.0 ([`DEFAULT_BACKOFF_MULTIPLIER`])
    ///
    /// # Arguments
    ///
    /// * `max_attempts` - Maximum number of attempts (including initial)
    pub fn exponential(max_attempts: u32) -> Self {
        Self::ExponentialBackoff {
            max_attempts,
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            max_delay: Duration::from_secs(DEFAULT_MAX_DELAY_SECS),
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }

    /// Creates a fixed retry policy.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self::Fixed {
            max_attempts,
            delay,
        }
    }

    /// Replaces the initial delay of an exponential policy.
    ///
    /// Other variants are returned unchanged.
    pub fn with_initial_delay(self, delay: Duration) -> Self {
        match self {
            Self::ExponentialBackoff {
                max_attempts,
                max_delay,
                multiplier,
                ..
            } => Self::ExponentialBackoff {
                max_attempts,
                initial_delay: delay,
                max_delay,
                multiplier,
            },
            other => other,
        }
    }

    /// Calculates the delay before retrying after failed attempt `attempt`.
    ///
    /// # Arguments
    ///
    /// * `attempt` - The attempt that just failed (1-based)
    ///
    /// # Returns
    ///
    /// The delay to wait before the retry, or `None` if no more retries are allowed.
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        match self {
            Self::None => None,
            Self::Fixed {
                max_attempts,
                delay,
            } => (attempt < *max_attempts).then_some(*delay),
            Self::ExponentialBackoff {
                max_attempts,
                initial_delay,
                max_delay,
                multiplier,
            } => {
                if attempt >= *max_attempts {
                    return None;
                }
                // initial_delay * multiplier^(attempt-1), capped
                let factor = multiplier.powi(attempt.saturating_sub(1) as i32);
                let delay_ms = initial_delay.as_millis() as f64 * factor;
                let capped = delay_ms.min(max_delay.as_millis() as f64) as u64;
                Some(Duration::from_millis(capped).min(*max_delay))
            }
        }
    }

    /// Returns the maximum number of attempts for this policy.
    pub fn max_attempts(&self) -> u32 {
        match self {
            Self::None => 1,
            Self::Fixed { max_attempts, .. } => (*max_attempts).max(1),
            Self::ExponentialBackoff { max_attempts, .. } => (*max_attempts).max(1),
        }
    }
}

/// What a run does when a single tile cannot be fetched, decoded or
/// converted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TileErrorPolicy {
    /// Record the tile as failed, merge the remaining tiles and report the
    /// skipped ones in the run result.
    #[default]
    Skip,

    /// Stop scheduling tiles at the first failure; the run fails without
    /// producing output.
    Abort,
}

impl TileErrorPolicy {
    /// Returns true if a tile failure ends the run.
    pub fn aborts(&self) -> bool {
        matches!(self, Self::Abort)
    }
}

impl fmt::Display for TileErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip => write!(f, "skip"),
            Self::Abort => write!(f, "abort"),
        }
    }
}

impl FromStr for TileErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "abort" => Ok(Self::Abort),
            other => Err(format!("unknown tile error policy '{}'", other)),
        }
    }
}
