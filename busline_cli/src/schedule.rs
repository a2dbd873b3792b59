use busline_core::schedule::{Schedule, SegmentDurations, compute_schedule, format_clock_time};
use clap::Args;
use comfy_table::Table;
use jiff::civil::Time;

use crate::parsers;

#[derive(Args)]
pub struct ScheduleArgs {
    /// Station names in route order, comma separated
    #[arg(short, long, value_delimiter = ',', required = true)]
    stations: Vec<String>,

    /// Minutes between consecutive stations; missing or invalid values count as 0
    #[arg(short = 'm', long, value_delimiter = ',')]
    durations: Vec<String>,

    /// Departure times (HH:MM), comma separated
    #[arg(short, long, value_delimiter = ',', value_parser = parsers::parse_departure, required = true)]
    departures: Vec<Time>,
}

pub fn run(args: ScheduleArgs) -> anyhow::Result<()> {
    let durations = SegmentDurations::from_raw(&args.durations, args.stations.len());
    let schedule = compute_schedule(&args.stations, durations.minutes(), &args.departures)?;

    println!("{}", render_table(&args.stations, &schedule));
    println!("Total duration: {}", schedule.total_duration());

    Ok(())
}

/// One row per departure, one column per station. Arrivals after midnight
/// carry a `+N` day marker.
fn render_table(stations: &[String], schedule: &Schedule) -> Table {
    let mut table = Table::new();

    let mut header = vec![String::from("Departure")];
    header.extend(stations.iter().cloned());
    table.set_header(header);

    for entry in schedule.entries() {
        let mut row = vec![format_clock_time(entry.departure())];
        row.extend(entry.arrivals().iter().map(|arrival| {
            if arrival.is_next_day() {
                format!("{arrival} (+{})", arrival.day_offset())
            } else {
                arrival.to_string()
            }
        }));
        table.add_row(row);
    }

    table
}

#[cfg(test)]
mod tests {
    use jiff::civil::time;

    use super::*;

    #[test]
    fn test_render_table_marks_next_day() {
        let stations = vec![String::from("A"), String::from("B"), String::from("C")];
        let schedule = compute_schedule(&stations, &[5, 10], &[time(23, 50, 0, 0)]).unwrap();

        let rendered = render_table(&stations, &schedule).to_string();
        assert!(rendered.contains("23:55"));
        assert!(rendered.contains("00:05 (+1)"));
    }
}
