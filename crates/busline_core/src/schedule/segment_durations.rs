use serde::Serialize;

use super::travel_duration::TravelDuration;

/// Travel minutes between consecutive stations, always `stations - 1` long.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct SegmentDurations(Vec<u32>);

impl SegmentDurations {
    /// Normalizes editor input against the station count: unparseable or
    /// negative values become zero, missing ones are zero, extra ones are dropped.
    pub fn from_raw<S: AsRef<str>>(raw: &[S], station_count: usize) -> Self {
        let segments = station_count.saturating_sub(1);

        let minutes = (0..segments)
            .map(|index| match raw.get(index) {
                Some(value) => parse_minutes(value.as_ref()),
                None => 0,
            })
            .collect();

        if raw.len() > segments {
            tracing::debug!(
                provided = raw.len(),
                segments,
                "Dropping extra segment durations"
            );
        }

        SegmentDurations(minutes)
    }

    pub fn from_minutes(minutes: &[u32], station_count: usize) -> Self {
        let segments = station_count.saturating_sub(1);
        let mut normalized = minutes.iter().copied().take(segments).collect::<Vec<_>>();
        normalized.resize(segments, 0);
        SegmentDurations(normalized)
    }

    pub fn minutes(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Saturates at `u32::MAX` minutes.
    pub fn total(&self) -> TravelDuration {
        let minutes = self
            .0
            .iter()
            .fold(0u32, |total, minutes| total.saturating_add(*minutes));
        TravelDuration::from_minutes(minutes)
    }
}

fn parse_minutes(value: &str) -> u32 {
    let trimmed = value.trim();

    if let Ok(minutes) = trimmed.parse::<u32>() {
        return minutes;
    }

    // "7.5" style input from number fields; fractions are dropped
    match trimmed.parse::<f64>() {
        Ok(minutes) if minutes.is_finite() && minutes >= 0.0 => return minutes.trunc() as u32,
        _ => {}
    }

    tracing::debug!(value, "Defaulting unparseable segment duration to 0");
    0
}
