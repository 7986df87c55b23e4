use chrono::{Duration, NaiveDate, NaiveTime};

use crate::models::NewSlot;

/// Lazy sequence of slot candidates covering `[start, end)` in fixed
/// steps. Pure and restartable; nothing is persisted and no ids are
/// assigned here.
///
/// Overhang policy: the final slot keeps its full duration even when it
/// extends past `end` (a 09:00-10:30 range with 60-minute slots yields
/// 09:00-10:00 and 10:00-11:00). Aligned with how the admin flow has
/// always generated slots; tested explicitly.
#[derive(Debug, Clone)]
pub struct SlotSequence {
    date: NaiveDate,
    current: NaiveTime,
    end: NaiveTime,
    step: Duration,
    done: bool,
}

impl SlotSequence {
    /// A non-positive interval, or one too large for a `Duration`,
    /// yields an empty sequence; callers reject such intervals with
    /// their own validation error before anything is persisted.
    pub fn new(date: NaiveDate, start: NaiveTime, end: NaiveTime, interval_minutes: i64) -> Self {
        let step = if interval_minutes > 0 {
            Duration::try_minutes(interval_minutes)
        } else {
            None
        };

        Self {
            date,
            current: start,
            end,
            done: start >= end || step.is_none(),
            step: step.unwrap_or_else(Duration::zero),
        }
    }
}

impl Iterator for SlotSequence {
    type Item = NewSlot;

    fn next(&mut self) -> Option<NewSlot> {
        if self.done || self.current >= self.end {
            return None;
        }

        // overflowing_add keeps the sequence finite when the last slot
        // would roll past midnight.
        let (slot_end, wrapped) = self.current.overflowing_add_signed(self.step);

        let slot = NewSlot {
            available_date: self.date,
            start_time: self.current,
            end_time: slot_end,
            is_booked: false,
        };

        self.current = slot_end;
        if wrapped != 0 {
            self.done = true;
        }

        Some(slot)
    }
}

/// Eagerly collected slot candidates for `[start, end)`.
pub fn generate_slots(
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    interval_minutes: i64,
) -> Vec<NewSlot> {
    SlotSequence::new(date, start, end, interval_minutes).collect()
}
