//! Surface command and event types.
//!
//! Commands flow from the host into the surface worker; events are broadcast
//! back out. Reconciliation itself is synchronous — these types only carry the
//! asynchronous edges (clicks, geolocation, route responses, teardown).

use crate::errors::{MapError, PositionErrorKind};
use crate::geo::{LatLngBounds, Point, SnapCorrection};
use crate::position::PositionFix;
use crate::surface::props::LocationCallback;
use std::fmt::Debug;
use tokio::sync::oneshot;

/// Commands the host sends to a running surface worker.
pub enum SurfaceCommand {
    // ****************************************
    // ** Input properties
    /// Toggle click-to-pick-location mode
    SetInteractive { interactive: bool },
    /// Replace (or clear) the location-select callback
    SetOnLocationSelect { callback: Option<LocationCallback> },
    /// Set or clear the user-picked point
    SetSelectedLocation { location: Option<Point> },
    /// Set or clear the destination point (e.g. the event's venue)
    SetEventLocation { location: Option<Point> },
    /// Set or clear the live user position
    SetUserLocation { location: Option<Point> },
    /// Replace the route inputs wholesale
    SetRoute {
        path: Option<Vec<Point>>,
        start_snap: Option<SnapCorrection>,
        end_snap: Option<SnapCorrection>,
    },

    // ****************************************
    // ** Interaction / navigation
    /// A click landed on the map surface at the given coordinate
    Click { at: Point },
    /// Start watching the device position and route to the destination
    Navigate { algorithm: String },
    /// Route to the destination from a manually chosen start point
    RouteFrom { start: Point, algorithm: String },

    // ****************************************
    // ** Lifecycle
    /// Tear the surface down and stop the worker
    Teardown {
        reply: oneshot::Sender<Result<(), MapError>>,
    },
}

impl Debug for SurfaceCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SetInteractive { interactive } => {
                write!(f, "SetInteractive({interactive})")
            }
            Self::SetOnLocationSelect { callback } => {
                write!(f, "SetOnLocationSelect(set: {})", callback.is_some())
            }
            Self::SetSelectedLocation { location } => {
                write!(f, "SetSelectedLocation({location:?})")
            }
            Self::SetEventLocation { location } => write!(f, "SetEventLocation({location:?})"),
            Self::SetUserLocation { location } => write!(f, "SetUserLocation({location:?})"),
            Self::SetRoute { path, start_snap, end_snap } => write!(
                f,
                "SetRoute(points: {}, snaps: {}/{})",
                path.as_ref().map_or(0, Vec::len),
                start_snap.is_some(),
                end_snap.is_some()
            ),
            Self::Click { at } => write!(f, "Click({at:?})"),
            Self::Navigate { algorithm } => write!(f, "Navigate({algorithm})"),
            Self::RouteFrom { start, algorithm } => {
                write!(f, "RouteFrom({start:?}, {algorithm})")
            }
            Self::Teardown { .. } => write!(f, "Teardown"),
        }
    }
}

/// Events broadcast by the surface while it runs.
#[derive(Debug, Clone)]
pub enum SurfaceEvent {
    // ****************************************
    // ** Lifecycle
    /// The map handle exists and the base layer is up
    SurfaceMounted { center: Point, zoom: u8 },
    /// The handle has been destroyed; every later input is a no-op
    SurfaceTornDown,

    // ****************************************
    // ** Interaction
    /// An interactive click picked a location
    LocationSelected { at: Point },

    // ****************************************
    // ** Overlays
    /// A marker reconciliation pass finished
    MarkersReconciled { drawn: usize },
    /// A route line (plus any snap lines) is on the map
    RouteDrawn { points: usize, snap_lines: usize },
    /// Route inputs emptied; no route is drawn
    RouteCleared,
    /// The camera was re-framed to fit a route
    ViewportFramed { bounds: LatLngBounds },

    // ****************************************
    // ** Navigation
    /// A position fix was applied to the live-user marker
    PositionUpdated { fix: PositionFix },
    /// The position stream ended with an error
    PositionLost { kind: PositionErrorKind },
    /// The route service failed; nothing was drawn
    RouteFailed { message: String },

    /// Non-fatal diagnostic
    Warning { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_debug_names_variants() {
        let cmd = SurfaceCommand::SetInteractive { interactive: true };
        assert_eq!(format!("{cmd:?}"), "SetInteractive(true)");

        let cmd = SurfaceCommand::SetRoute {
            path: Some(vec![Point::new(17.7836, 83.3786), Point::new(17.7850, 83.3800)]),
            start_snap: None,
            end_snap: None,
        };
        assert_eq!(format!("{cmd:?}"), "SetRoute(points: 2, snaps: false/false)");

        let (tx, _rx) = oneshot::channel();
        let cmd = SurfaceCommand::Teardown { reply: tx };
        assert_eq!(format!("{cmd:?}"), "Teardown");
    }

    #[test]
    fn event_debug_is_readable() {
        let ev = SurfaceEvent::RouteDrawn { points: 5, snap_lines: 1 };
        assert!(format!("{ev:?}").contains("RouteDrawn"));

        let ev = SurfaceEvent::PositionLost { kind: PositionErrorKind::Timeout };
        assert!(format!("{ev:?}").contains("Timeout"));
    }
}
