pub mod geo_position;
pub mod position;
pub mod route;
pub mod schedule;
pub mod station;
mod utils;
pub mod vehicle;

pub use geo_position::GeoPosition;
pub use position::{ArrivalOrder, PositionUpdate};
pub use route::{Route, RouteBuilder, RouteError, RouteId};
pub use station::{CityId, Station, StationId};
pub use vehicle::{Vehicle, VehicleId};
