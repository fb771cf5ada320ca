//! Route overlay renderer: the clear-then-draw cycle for the route line and
//! its snap-correction annotations.
//!
//! Each render cycle runs `Clearing -> Empty | Drawing` to completion within
//! one call, so a rapid sequence of route updates can only ever interleave
//! whole cycles. Clearing is idempotent by construction: it removes only the
//! overlays this renderer itself tracks.

use crate::geo::{LatLngBounds, Point, SnapCorrection};
use crate::render::backend::LineStyle;
use crate::surface::handle::MapHandle;

/// Result of one render cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RouteOutcome {
    /// Path had fewer than two points; stale overlays (if any) were removed
    /// and the viewport was left untouched.
    Cleared { removed: usize },
    /// A route line and `snap_lines` dashed corrections are on the map, and
    /// the viewport was re-framed to `framed`.
    Drawn { points: usize, snap_lines: usize, framed: LatLngBounds },
}

/// Run one render cycle against the current route inputs.
///
/// This is the only place that mutates the viewport after initial
/// construction; the re-frame happens without animation so rapid route
/// updates do not produce an unstable camera.
pub fn reconcile(
    handle: &mut MapHandle,
    path: Option<&[Point]>,
    start_snap: Option<SnapCorrection>,
    end_snap: Option<SnapCorrection>,
    fit_padding: f64,
) -> anyhow::Result<RouteOutcome> {
    // Clearing: unconditionally remove the previous route line and snap lines.
    let mut removed = 0;
    if let Some(id) = handle.registry.route.take() {
        handle.backend.remove_overlay(id)?;
        removed += 1;
    }
    for id in handle.registry.snaps.drain(..) {
        handle.backend.remove_overlay(id)?;
        removed += 1;
    }

    // Empty: nothing further to draw.
    let path = path.unwrap_or_default();
    if path.len() < 2 {
        log::trace!("route cycle: empty path ({} points), {removed} overlays removed", path.len());
        return Ok(RouteOutcome::Cleared { removed });
    }

    // Drawing: one continuous line, then up to two dashed corrections.
    let id = handle.backend.add_polyline(path, &LineStyle::route())?;
    handle.registry.route = Some(id);

    for snap in [start_snap, end_snap].into_iter().flatten() {
        let id = handle
            .backend
            .add_polyline(&[snap.original, snap.snapped], &LineStyle::snap())?;
        handle.registry.snaps.push(id);
    }

    // Re-frame to the smallest box containing the whole route, with margin.
    let bounds = LatLngBounds::from_points(path)
        .expect("path has at least two points")
        .pad(fit_padding);
    handle.viewport.frame(bounds);
    handle.backend.fit_bounds(&bounds)?;

    log::trace!(
        "route cycle: drew {} points, {} snap lines",
        path.len(),
        handle.registry.snaps.len()
    );
    Ok(RouteOutcome::Drawn {
        points: path.len(),
        snap_lines: handle.registry.snaps.len(),
        framed: bounds,
    })
}
