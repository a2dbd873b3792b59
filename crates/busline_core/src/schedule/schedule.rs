use std::fmt::Display;

use jiff::{SignedDuration, civil::Time};
use serde::Serialize;
use thiserror::Error;

use super::{
    clock_time::format_clock_time, segment_durations::SegmentDurations,
    travel_duration::TravelDuration,
};

const MINUTES_PER_DAY: i64 = 24 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("A schedule needs at least two stations, got {0}")]
    NotEnoughStations(usize),

    #[error("Invalid departure time '{0}', expected HH:MM")]
    InvalidDepartureTime(String),
}

/// Wall-clock arrival at one station, with the number of midnights crossed
/// since the departure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArrivalTime {
    time: Time,
    day_offset: u32,
}

impl ArrivalTime {
    pub fn time(&self) -> Time {
        self.time
    }

    pub fn day_offset(&self) -> u32 {
        self.day_offset
    }

    pub fn is_next_day(&self) -> bool {
        self.day_offset > 0
    }
}

impl Display for ArrivalTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format_clock_time(self.time))
    }
}

/// Arrivals for one departure, index-aligned with the route's stations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    departure: Time,
    arrivals: Vec<ArrivalTime>,
}

impl ScheduleEntry {
    pub fn departure(&self) -> Time {
        self.departure
    }

    pub fn arrivals(&self) -> &[ArrivalTime] {
        &self.arrivals
    }

    pub fn final_arrival(&self) -> ArrivalTime {
        self.arrivals[self.arrivals.len() - 1]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schedule {
    station_count: usize,
    entries: Vec<ScheduleEntry>,
    total_duration: TravelDuration,
}

impl Schedule {
    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn station_count(&self) -> usize {
        self.station_count
    }

    pub fn total_duration(&self) -> TravelDuration {
        self.total_duration
    }
}

/// Computes the arrival table of every departure.
///
/// `durations` is normalized against the station count first, so missing
/// segments count as zero minutes and extra ones are ignored.
pub fn compute_schedule<S>(
    stations: &[S],
    durations: &[u32],
    departures: &[Time],
) -> Result<Schedule, ScheduleError> {
    if stations.len() < 2 {
        return Err(ScheduleError::NotEnoughStations(stations.len()));
    }

    let segments = SegmentDurations::from_minutes(durations, stations.len());

    let entries = departures
        .iter()
        .map(|&departure| ScheduleEntry {
            departure,
            arrivals: arrivals_for(departure, &segments),
        })
        .collect();

    Ok(Schedule {
        station_count: stations.len(),
        entries,
        total_duration: segments.total(),
    })
}

fn arrivals_for(departure: Time, segments: &SegmentDurations) -> Vec<ArrivalTime> {
    let departure_minute = i64::from(departure.hour()) * 60 + i64::from(departure.minute());

    let mut elapsed: i64 = 0;
    let mut arrivals = Vec::with_capacity(segments.len() + 1);
    arrivals.push(arrival_at(departure, departure_minute, elapsed));

    for &minutes in segments.minutes() {
        elapsed += i64::from(minutes);
        arrivals.push(arrival_at(departure, departure_minute, elapsed));
    }

    arrivals
}

fn arrival_at(departure: Time, departure_minute: i64, elapsed: i64) -> ArrivalTime {
    ArrivalTime {
        time: departure.wrapping_add(SignedDuration::from_mins(elapsed)),
        day_offset: ((departure_minute + elapsed) / MINUTES_PER_DAY) as u32,
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::time;

    use super::*;

    fn formatted(entry: &ScheduleEntry) -> Vec<String> {
        entry.arrivals().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_simple_schedule() {
        let schedule = compute_schedule(&["A", "B", "C"], &[8, 12], &[time(9, 0, 0, 0)]).unwrap();

        let entry = &schedule.entries()[0];
        assert_eq!(formatted(entry), vec!["09:00", "09:08", "09:20"]);
        assert!(entry.arrivals().iter().all(|arrival| !arrival.is_next_day()));
        assert_eq!(schedule.total_duration(), TravelDuration::from_minutes(20));
    }

    #[test]
    fn test_schedule_rolls_over_midnight() {
        let schedule =
            compute_schedule(&["A", "B", "C"], &[5, 10], &[time(23, 50, 0, 0)]).unwrap();

        let entry = &schedule.entries()[0];
        assert_eq!(formatted(entry), vec!["23:50", "23:55", "00:05"]);
        assert_eq!(entry.arrivals()[1].day_offset(), 0);
        assert_eq!(entry.final_arrival().day_offset(), 1);
    }

    #[test]
    fn test_first_arrival_is_departure() {
        let departures = [time(6, 30, 0, 0), time(18, 45, 0, 0)];
        let schedule = compute_schedule(&[1, 2, 3, 4], &[10, 20, 30], &departures).unwrap();

        for (entry, departure) in schedule.entries().iter().zip(departures) {
            assert_eq!(entry.arrivals()[0].time(), departure);
            assert_eq!(entry.arrivals().len(), schedule.station_count());
        }
    }

    #[test]
    fn test_multi_day_travel() {
        let schedule = compute_schedule(&["A", "B"], &[2 * 24 * 60 + 30], &[time(22, 0, 0, 0)])
            .unwrap();

        let arrival = schedule.entries()[0].final_arrival();
        assert_eq!(arrival.to_string(), "22:30");
        assert_eq!(arrival.day_offset(), 2);
    }

    #[test]
    fn test_missing_and_extra_durations() {
        let schedule = compute_schedule(&["A", "B", "C"], &[15], &[time(8, 0, 0, 0)]).unwrap();
        assert_eq!(formatted(&schedule.entries()[0]), vec!["08:00", "08:15", "08:15"]);

        let schedule =
            compute_schedule(&["A", "B"], &[15, 99, 99], &[time(8, 0, 0, 0)]).unwrap();
        assert_eq!(formatted(&schedule.entries()[0]), vec!["08:00", "08:15"]);
        assert_eq!(schedule.total_duration(), TravelDuration::from_minutes(15));
    }

    #[test]
    fn test_requires_two_stations() {
        assert_eq!(
            compute_schedule(&["A"], &[], &[time(8, 0, 0, 0)]),
            Err(ScheduleError::NotEnoughStations(1))
        );
    }

    #[test]
    fn test_no_departures() {
        let schedule = compute_schedule(&["A", "B"], &[10], &[]).unwrap();
        assert!(schedule.entries().is_empty());
        assert_eq!(schedule.total_duration(), TravelDuration::from_minutes(10));
    }

    #[test]
    fn test_huge_durations_do_not_overflow() {
        let durations = SegmentDurations::from_raw(&["4294967295", "1"], 3);
        let schedule =
            compute_schedule(&["A", "B", "C"], durations.minutes(), &[time(0, 0, 0, 0)]).unwrap();

        let arrivals = schedule.entries()[0].arrivals();
        assert_eq!(arrivals.len(), 3);
        assert_eq!(arrivals[2].day_offset(), ((u64::from(u32::MAX) + 1) / 1440) as u32);
        assert_eq!(schedule.total_duration().total_minutes(), u32::MAX);
    }
}
