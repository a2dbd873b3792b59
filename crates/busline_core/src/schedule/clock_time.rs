use jiff::civil::Time;

use super::schedule::ScheduleError;

/// Parses a wall-clock time as typed in the route editor (`HH:MM` or `HH:MM:SS`).
pub fn parse_clock_time(input: &str) -> Result<Time, ScheduleError> {
    let trimmed = input.trim();

    Time::strptime("%H:%M", trimmed)
        .or_else(|_| Time::strptime("%H:%M:%S", trimmed))
        .map_err(|_| ScheduleError::InvalidDepartureTime(input.to_owned()))
}

pub fn format_clock_time(time: Time) -> String {
    time.strftime("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use jiff::civil::time;

    use super::*;

    #[test]
    fn test_parse_clock_time() {
        assert_eq!(parse_clock_time("09:00").unwrap(), time(9, 0, 0, 0));
        assert_eq!(parse_clock_time(" 23:50 ").unwrap(), time(23, 50, 0, 0));
        assert_eq!(parse_clock_time("07:15:30").unwrap(), time(7, 15, 30, 0));
    }

    #[test]
    fn test_parse_clock_time_rejects_garbage() {
        assert!(matches!(
            parse_clock_time("24:05"),
            Err(ScheduleError::InvalidDepartureTime(_))
        ));
        assert!(parse_clock_time("noon").is_err());
    }

    #[test]
    fn test_format_clock_time() {
        assert_eq!(format_clock_time(time(0, 5, 0, 0)), "00:05");
    }
}
