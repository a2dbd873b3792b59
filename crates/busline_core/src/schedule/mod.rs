//! Arrival schedules for a route.
//!
//! Everything in here is pure: the same stations, durations and departures
//! always produce the same table.

mod clock_time;
mod segment_durations;
#[allow(clippy::module_inception)]
mod schedule;
mod travel_duration;

pub use clock_time::{format_clock_time, parse_clock_time};
pub use schedule::{ArrivalTime, Schedule, ScheduleEntry, ScheduleError, compute_schedule};
pub use segment_durations::SegmentDurations;
pub use travel_duration::TravelDuration;
