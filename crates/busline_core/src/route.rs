use jiff::civil::Time;
use serde::Serialize;
use thiserror::Error;

use crate::{
    define_id_newtype,
    schedule::{
        Schedule, ScheduleError, SegmentDurations, TravelDuration, compute_schedule,
    },
    station::{CityId, StationId},
};

define_id_newtype!(RouteId);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("A route needs at least two stations, got {0}")]
    NotEnoughStations(usize),

    #[error("Source and destination must be different (station {0})")]
    SourceIsDestination(StationId),

    #[error("First station {found} does not match the declared source {expected}")]
    SourceMismatch {
        expected: StationId,
        found: StationId,
    },

    #[error("Last station {found} does not match the declared destination {expected}")]
    DestinationMismatch {
        expected: StationId,
        found: StationId,
    },

    #[error("Missing {0}")]
    MissingField(&'static str),
}

/// A validated route ("trajet"): ordered stations, one duration per segment
/// and the daily departure times.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Route {
    id: RouteId,
    name: String,
    city_id: Option<CityId>,
    stations: Vec<StationId>,
    segment_durations: SegmentDurations,
    departures: Vec<Time>,
}

impl Route {
    pub fn id(&self) -> RouteId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn city_id(&self) -> Option<CityId> {
        self.city_id
    }

    pub fn stations(&self) -> &[StationId] {
        &self.stations
    }

    pub fn source(&self) -> StationId {
        self.stations[0]
    }

    pub fn destination(&self) -> StationId {
        self.stations[self.stations.len() - 1]
    }

    pub fn segment_durations(&self) -> &SegmentDurations {
        &self.segment_durations
    }

    pub fn departures(&self) -> &[Time] {
        &self.departures
    }

    pub fn total_duration(&self) -> TravelDuration {
        self.segment_durations.total()
    }

    pub fn schedule(&self) -> Result<Schedule, ScheduleError> {
        compute_schedule(
            &self.stations,
            self.segment_durations.minutes(),
            &self.departures,
        )
    }
}

/// Raw route input as entered in the route editor.
#[derive(Default)]
pub struct RouteBuilder {
    id: Option<RouteId>,
    name: Option<String>,
    city_id: Option<CityId>,
    source: Option<StationId>,
    destination: Option<StationId>,
    stations: Vec<StationId>,
    raw_durations: Vec<String>,
    departures: Vec<Time>,
}

impl RouteBuilder {
    pub fn set_id(&mut self, id: RouteId) -> &mut Self {
        self.id = Some(id);
        self
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    pub fn set_city(&mut self, city_id: CityId) -> &mut Self {
        self.city_id = Some(city_id);
        self
    }

    pub fn set_source(&mut self, source: StationId) -> &mut Self {
        self.source = Some(source);
        self
    }

    pub fn set_destination(&mut self, destination: StationId) -> &mut Self {
        self.destination = Some(destination);
        self
    }

    pub fn set_stations(&mut self, stations: Vec<StationId>) -> &mut Self {
        self.stations = stations;
        self
    }

    pub fn set_segment_minutes(&mut self, minutes: &[u32]) -> &mut Self {
        self.raw_durations = minutes.iter().map(u32::to_string).collect();
        self
    }

    /// Durations as typed in the editor. Unparseable entries become zero.
    pub fn set_raw_durations<S: AsRef<str>>(&mut self, durations: &[S]) -> &mut Self {
        self.raw_durations = durations.iter().map(|d| d.as_ref().to_owned()).collect();
        self
    }

    pub fn set_departures(&mut self, departures: Vec<Time>) -> &mut Self {
        self.departures = departures;
        self
    }

    pub fn build(self) -> Result<Route, RouteError> {
        let id = self.id.ok_or(RouteError::MissingField("route id"))?;
        let source = self.source.ok_or(RouteError::MissingField("source"))?;
        let destination = self
            .destination
            .ok_or(RouteError::MissingField("destination"))?;

        if source == destination {
            return Err(RouteError::SourceIsDestination(source));
        }

        if self.stations.len() < 2 {
            return Err(RouteError::NotEnoughStations(self.stations.len()));
        }

        let first = self.stations[0];
        if first != source {
            return Err(RouteError::SourceMismatch {
                expected: source,
                found: first,
            });
        }

        let last = self.stations[self.stations.len() - 1];
        if last != destination {
            return Err(RouteError::DestinationMismatch {
                expected: destination,
                found: last,
            });
        }

        let segment_durations =
            SegmentDurations::from_raw(&self.raw_durations, self.stations.len());

        let mut departures = self.departures;
        departures.sort();
        departures.dedup();

        Ok(Route {
            id,
            name: self.name.unwrap_or_default(),
            city_id: self.city_id,
            stations: self.stations,
            segment_durations,
            departures,
        })
    }
}
