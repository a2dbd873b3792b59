use std::fmt::Display;

use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

/// Total travel time of a route, split the way planners read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct TravelDuration {
    hours: u32,
    minutes: u32,
}

impl TravelDuration {
    pub const fn from_minutes(total_minutes: u32) -> Self {
        Self {
            hours: total_minutes / 60,
            minutes: total_minutes % 60,
        }
    }

    pub const fn hours(&self) -> u32 {
        self.hours
    }

    pub const fn minutes(&self) -> u32 {
        self.minutes
    }

    pub const fn total_minutes(&self) -> u32 {
        self.hours * 60 + self.minutes
    }
}

impl From<TravelDuration> for SignedDuration {
    fn from(duration: TravelDuration) -> Self {
        SignedDuration::from_mins(i64::from(duration.total_minutes()))
    }
}

impl Display for TravelDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.hours, self.minutes) {
            (0, minutes) => write!(f, "{minutes}min"),
            (hours, 0) => write!(f, "{hours}h"),
            (hours, minutes) => write!(f, "{hours}h {minutes:02}min"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_minutes() {
        let duration = TravelDuration::from_minutes(135);
        assert_eq!(duration.hours(), 2);
        assert_eq!(duration.minutes(), 15);
        assert_eq!(duration.total_minutes(), 135);
    }

    #[test]
    fn test_display() {
        assert_eq!(TravelDuration::from_minutes(20).to_string(), "20min");
        assert_eq!(TravelDuration::from_minutes(120).to_string(), "2h");
        assert_eq!(TravelDuration::from_minutes(65).to_string(), "1h 05min");
    }

    #[test]
    fn test_into_signed_duration() {
        let duration: SignedDuration = TravelDuration::from_minutes(90).into();
        assert_eq!(duration, SignedDuration::from_mins(90));
    }
}
