use jiff::SpanRelativeTo;

pub fn parse_duration(input: &str) -> Result<jiff::SignedDuration, String> {
    if let Ok(duration) = input.parse::<jiff::SignedDuration>() {
        return Ok(duration);
    }

    if let Ok(duration) = input
        .parse::<jiff::Span>()
        .and_then(|span| span.to_duration(SpanRelativeTo::days_are_24_hours()))
    {
        return Ok(duration);
    }

    if let Ok(seconds) = input.parse::<i64>() {
        return Ok(jiff::SignedDuration::from_secs(seconds.abs()));
    }

    Err(String::from("Invalid duration"))
}

/// Positive durations only, as a std duration for tokio timers.
pub fn parse_period(input: &str) -> Result<std::time::Duration, String> {
    let duration = parse_duration(input)?;
    if duration.is_zero() || duration.is_negative() {
        return Err(String::from("Duration must be positive"));
    }

    Ok(duration.unsigned_abs())
}

pub fn parse_departure(input: &str) -> Result<jiff::civil::Time, String> {
    busline_core::schedule::parse_clock_time(input).map_err(|error| error.to_string())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("5s"), Ok(jiff::SignedDuration::from_secs(5)));
        assert_eq!(parse_duration("PT1M"), Ok(jiff::SignedDuration::from_secs(60)));
        assert_eq!(parse_duration("30"), Ok(jiff::SignedDuration::from_secs(30)));
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn test_parse_period() {
        assert_eq!(parse_period("2s"), Ok(Duration::from_secs(2)));
        assert!(parse_period("0").is_err());
    }

    #[test]
    fn test_parse_departure() {
        assert_eq!(parse_departure("23:50"), Ok(jiff::civil::time(23, 50, 0, 0)));
        assert!(parse_departure("25:00").is_err());
    }
}
