//! Calendar day as seen by the store.
//!
//! Voucher windows are calendar dates with no zone attached. They are
//! compared against the store's day (Vietnam, UTC+7) so the result does not
//! depend on the zone of the machine running the client.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

/// Store's UTC offset in hours.
pub const STORE_UTC_OFFSET_HOURS: i32 = 7;

/// Resolves "today" in a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreClock {
    offset: FixedOffset,
}

impl Default for StoreClock {
    fn default() -> Self {
        Self::from_offset_hours(STORE_UTC_OFFSET_HOURS).unwrap_or(Self { offset: Utc.fix() })
    }
}

impl StoreClock {
    /// Clock for a whole-hour offset; `None` if out of range (beyond ±23h).
    pub fn from_offset_hours(hours: i32) -> Option<Self> {
        FixedOffset::east_opt(hours.checked_mul(3600)?).map(|offset| Self { offset })
    }

    /// The configured offset.
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// The store's current calendar day.
    pub fn today(&self) -> NaiveDate {
        self.day_at(Utc::now())
    }

    /// The store's calendar day at `instant`.
    pub fn day_at(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }
}
