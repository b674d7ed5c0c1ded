use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::OnceLock;

use chrono::{NaiveTime, Timelike};
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use super::error::SchedulingError;

/// First bookable start, minutes since midnight (09:00)
pub const OPENING_MINUTES: u32 = 9 * 60;
/// Closing time, minutes since midnight (18:00). The last slot starts one
/// step earlier, so every committed block ends by closing.
pub const CLOSING_MINUTES: u32 = 18 * 60;
pub const SLOT_MINUTES: u32 = 30;
/// Every appointment occupies this many consecutive slots (90 minutes)
pub const BLOCK_LEN: usize = 3;

const LABEL_FORMAT: &str = "%I:%M %p";

static GRID: OnceLock<TimeGrid> = OnceLock::new();

/// One position in the daily grid. Only the grid hands these out, so the
/// index is always in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeSlot {
    index: usize,
}

impl TimeSlot {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn label(&self) -> &'static str {
        TimeGrid::global().labels[self.index].as_str()
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for TimeSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TimeSlot", 2)?;
        state.serialize_field("index", &self.index)?;
        state.serialize_field("label", self.label())?;
        state.end()
    }
}

/// The contiguous run of slots an appointment holds once committed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OccupiedSlots {
    slots: [TimeSlot; BLOCK_LEN],
}

impl OccupiedSlots {
    pub fn first(&self) -> TimeSlot {
        self.slots[0]
    }

    pub fn last(&self) -> TimeSlot {
        self.slots[BLOCK_LEN - 1]
    }

    pub fn iter(&self) -> impl Iterator<Item = TimeSlot> + '_ {
        self.slots.iter().copied()
    }

    pub fn indices(&self) -> BTreeSet<usize> {
        self.slots.iter().map(TimeSlot::index).collect()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.slots.iter().any(|s| s.index == index)
    }
}

/// Fixed sequence of bookable slots for one operating day
#[derive(Debug)]
pub struct TimeGrid {
    labels: Vec<String>,
    label_to_index: HashMap<String, usize>,
}

impl TimeGrid {
    /// The process-wide grid, built on first use
    pub fn global() -> &'static TimeGrid {
        GRID.get_or_init(|| TimeGrid::new(OPENING_MINUTES, CLOSING_MINUTES, SLOT_MINUTES))
    }

    fn new(opening_minutes: u32, closing_minutes: u32, slot_minutes: u32) -> Self {
        let labels = calculate_time_slots(opening_minutes, closing_minutes, slot_minutes);
        let label_to_index = labels
            .iter()
            .enumerate()
            .map(|(idx, label)| (label.clone(), idx))
            .collect();
        TimeGrid {
            labels,
            label_to_index,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.labels.len().saturating_sub(1)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn slots(&self) -> impl Iterator<Item = TimeSlot> {
        (0..self.labels.len()).map(|index| TimeSlot { index })
    }

    pub fn slot(&self, index: usize) -> Option<TimeSlot> {
        (index < self.labels.len()).then_some(TimeSlot { index })
    }

    /// Exact lookup against the grid's own labels ("09:30 AM")
    pub fn slot_by_label(&self, label: &str) -> Option<TimeSlot> {
        self.label_to_index
            .get(label.trim())
            .map(|&index| TimeSlot { index })
    }

    /// Like `slot_by_label`, but also accepts 24-hour "HH:MM" input as long as
    /// it lands exactly on a grid boundary
    pub fn parse_label(&self, label: &str) -> Result<TimeSlot, SchedulingError> {
        if let Some(slot) = self.slot_by_label(label) {
            return Ok(slot);
        }
        parse_time_to_minutes(label)
            .filter(|&m| m >= OPENING_MINUTES && (m - OPENING_MINUTES) % SLOT_MINUTES == 0)
            .and_then(|m| self.slot(((m - OPENING_MINUTES) / SLOT_MINUTES) as usize))
            .ok_or_else(|| SchedulingError::UnknownTimeSlot(label.trim().to_string()))
    }

    /// The block that starts at `start`, or None when it would run past the
    /// last slot of the day
    pub fn block_starting_at(&self, start: usize) -> Option<OccupiedSlots> {
        if start + BLOCK_LEN > self.len() {
            return None;
        }
        Some(OccupiedSlots {
            slots: [
                TimeSlot { index: start },
                TimeSlot { index: start + 1 },
                TimeSlot { index: start + 2 },
            ],
        })
    }
}

/// Parses "HH:MM" (24-hour) or "HH:MM AM" (12-hour) to minutes since midnight
pub fn parse_time_to_minutes(time_str: &str) -> Option<u32> {
    let trimmed = time_str.trim();
    NaiveTime::parse_from_str(trimmed, LABEL_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .ok()
        .map(|t| t.num_seconds_from_midnight() / 60)
}

/// Labels every slot starting at or after `start_minutes` and before `end_minutes`
fn calculate_time_slots(start_minutes: u32, end_minutes: u32, interval: u32) -> Vec<String> {
    (start_minutes..end_minutes)
        .step_by(interval as usize)
        .filter_map(|m| NaiveTime::from_num_seconds_from_midnight_opt(m * 60, 0))
        .map(|t| t.format(LABEL_FORMAT).to_string())
        .collect()
}
