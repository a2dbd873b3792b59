//! Presentation side of the live fleet map.
//!
//! [`MarkerReconciler`] turns a [`busline_feed::PositionStore`] into marker
//! changes on a [`MarkerSurface`], and owns selection, auto-fit and the
//! route overlay of the selected vehicle.

pub mod marker;
pub mod reconciler;
pub mod route_overlay;
pub mod surface;
mod utils;

pub use marker::{Marker, MarkerArena, MarkerIdx};
pub use reconciler::{MarkerDiff, MarkerReconciler, SelectionTicket};
pub use route_overlay::{OverlayStation, RouteOverlay, load_route_overlay};
pub use surface::{LoggingSurface, MarkerSurface};
pub use utils::bbox::BBox;
