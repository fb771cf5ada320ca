use crate::geo::{Point, SnapCorrection};
use std::fmt::Debug;
use std::sync::Arc;

/// Callback invoked with the clicked coordinate while the surface is
/// interactive. Held behind an `Arc` so the binder can compare callback
/// identity across rebinds.
pub type LocationCallback = Arc<dyn Fn(Point) + Send + Sync>;

/// The surface's exposed inputs. Any of them can change at any time; the
/// surface reconciles overlays against the current values rather than
/// recreating the map.
#[derive(Clone, Default)]
pub struct SurfaceProps {
    /// When true, clicks on the surface pick a location.
    pub interactive: bool,
    pub on_location_select: Option<LocationCallback>,
    /// User-picked point.
    pub selected_location: Option<Point>,
    /// Fixed destination, e.g. the event's venue.
    pub event_location: Option<Point>,
    /// Most recent geolocation fix.
    pub user_location: Option<Point>,
    pub route_path: Option<Vec<Point>>,
    pub start_snap: Option<SnapCorrection>,
    pub end_snap: Option<SnapCorrection>,
}

impl Debug for SurfaceProps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceProps")
            .field("interactive", &self.interactive)
            .field("on_location_select", &self.on_location_select.is_some())
            .field("selected_location", &self.selected_location)
            .field("event_location", &self.event_location)
            .field("user_location", &self.user_location)
            .field("route_points", &self.route_path.as_ref().map_or(0, Vec::len))
            .field("start_snap", &self.start_snap)
            .field("end_snap", &self.end_snap)
            .finish()
    }
}

/// Identity comparison for optional callbacks; the binder must not rebind
/// when the same `Arc` is applied again.
pub fn same_callback(a: Option<&LocationCallback>, b: Option<&LocationCallback>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        _ => false,
    }
}
