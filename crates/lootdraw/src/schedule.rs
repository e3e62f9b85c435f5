//! # Daily Free Draw Schedule
//!
//! Eligibility is a pure function of `(now, last_claimed, schedule)`; nothing
//! polls in the background.
//!
//! ```text
//!        day D                          day D+1
//!  ------|----------[reset]-------------|----------[reset]------
//!                      ^ boundary for any `now` up to the next reset
//! ```

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DrawError, DrawResult};

/// Minutes in a day, the bound for the UTC offset.
const DAY_MINUTES: i32 = 24 * 60;

/// When the daily free draw resets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetSchedule {
    /// Hour of day (0-23) of the reset, in the offset's local time.
    pub reset_hour: u32,
    /// Offset from UTC in minutes of the clock the reset hour is read on.
    pub utc_offset_minutes: i32,
}

impl ResetSchedule {
    /// Reset at `reset_hour` UTC.
    #[must_use]
    pub const fn utc(reset_hour: u32) -> Self {
        Self {
            reset_hour,
            utc_offset_minutes: 0,
        }
    }

    /// Validates the schedule.
    ///
    /// # Errors
    ///
    /// Returns [`DrawError::InvalidConfig`] if the hour is not in `0..24` or
    /// the offset is a day or more.
    pub fn validate(&self) -> DrawResult<()> {
        if self.reset_hour >= 24 {
            return Err(DrawError::InvalidConfig(format!(
                "reset_hour must be in 0..24, got {}",
                self.reset_hour
            )));
        }
        if self.utc_offset_minutes.abs() >= DAY_MINUTES {
            return Err(DrawError::InvalidConfig(format!(
                "utc_offset_minutes must be within one day, got {}",
                self.utc_offset_minutes
            )));
        }
        Ok(())
    }

    fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60)).unwrap_or_else(|| Utc.fix())
    }

    fn reset_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.reset_hour, 0, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl Default for ResetSchedule {
    fn default() -> Self {
        Self::utc(5)
    }
}

/// Most recent reset at or before `now`.
#[must_use]
pub fn reset_boundary(now: DateTime<Utc>, schedule: &ResetSchedule) -> DateTime<Utc> {
    let offset = schedule.offset();
    let local = now.with_timezone(&offset);
    let reset_time = schedule.reset_time();

    let mut date = local.date_naive();
    if local.time() < reset_time {
        date -= Duration::days(1);
    }

    offset
        .from_local_datetime(&date.and_time(reset_time))
        .single()
        .map_or(now, |boundary| boundary.with_timezone(&Utc))
}

/// Whether a free draw may be claimed at `now`.
#[must_use]
pub fn can_claim(
    last_claimed: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    schedule: &ResetSchedule,
) -> bool {
    last_claimed.map_or(true, |last| last < reset_boundary(now, schedule))
}

/// Next reset strictly after `now`.
#[must_use]
pub fn next_reset(now: DateTime<Utc>, schedule: &ResetSchedule) -> DateTime<Utc> {
    reset_boundary(now, schedule) + Duration::days(1)
}
