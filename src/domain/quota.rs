use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use super::clock::{Clock, SystemClock};

pub const QUOTA_COOLDOWN_HOURS: i64 = 24;

/// Tracks whether the paid image search quota has been exhausted.
///
/// The flag expires lazily: once the cooldown has elapsed since it was set,
/// the next read clears it. Setting it again while set just moves the
/// timestamp forward.
pub struct QuotaState {
    exceeded_at: Mutex<Option<DateTime<Utc>>>,
    clock: Arc<dyn Clock>,
    cooldown: Duration,
}

impl QuotaState {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_cooldown(clock, Duration::hours(QUOTA_COOLDOWN_HOURS))
    }

    pub fn with_cooldown(clock: Arc<dyn Clock>, cooldown: Duration) -> Self {
        Self {
            exceeded_at: Mutex::new(None),
            clock,
            cooldown,
        }
    }

    pub fn is_exceeded(&self) -> bool {
        let mut exceeded_at = self
            .exceeded_at
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        match *exceeded_at {
            Some(at) if self.clock.now().signed_duration_since(at) > self.cooldown => {
                *exceeded_at = None;
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    pub fn mark_exceeded(&self) {
        let now = self.clock.now();
        self.mark_exceeded_at(now);
    }

    /// Record a quota hit at a specific instant, e.g. one restored from elsewhere.
    pub fn mark_exceeded_at(&self, at: DateTime<Utc>) {
        *self
            .exceeded_at
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(at);
    }

    pub fn exceeded_at(&self) -> Option<DateTime<Utc>> {
        *self
            .exceeded_at
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn reset(&self) {
        *self
            .exceeded_at
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
    }
}

impl Default for QuotaState {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl std::fmt::Debug for QuotaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaState")
            .field("exceeded_at", &self.exceeded_at())
            .field("cooldown", &self.cooldown)
            .finish_non_exhaustive()
    }
}
