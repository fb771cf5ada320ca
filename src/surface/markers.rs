//! Marker reconciler: one marker per non-null point, redrawn from scratch on
//! every change. Owns only the `markers` sub-list of the overlay registry.

use crate::geo::Point;
use crate::surface::handle::MapHandle;

pub const SELECTED_LABEL: &str = "You selected this location";
pub const EVENT_LABEL: &str = "Event location";
pub const USER_LABEL: &str = "Your location";

/// Remove every marker this reconciler previously drew, then draw one marker
/// per non-null input. Two inputs at the same coordinate draw two stacked
/// markers; each carries its own label. Returns the number drawn.
pub fn reconcile(
    handle: &mut MapHandle,
    selected: Option<Point>,
    event: Option<Point>,
    user: Option<Point>,
) -> anyhow::Result<usize> {
    for id in handle.registry.markers.drain(..) {
        handle.backend.remove_overlay(id)?;
    }

    let inputs = [
        (selected, SELECTED_LABEL),
        (event, EVENT_LABEL),
        (user, USER_LABEL),
    ];
    for (point, label) in inputs {
        if let Some(at) = point {
            let id = handle.backend.add_marker(at, label)?;
            handle.registry.markers.push(id);
        }
    }

    log::trace!("marker reconciliation drew {} markers", handle.registry.markers.len());
    Ok(handle.registry.markers.len())
}
