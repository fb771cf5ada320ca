use crate::geo::{LatLngBounds, Point};
use std::fmt::Debug;

// Map camera state: where the map looks, and how far in. Mutated only by the
// instance owner (initial view) and the route renderer (fit to route).
#[derive(Clone, PartialEq)]
pub struct Viewport {
    pub center: Point,
    pub zoom: u8,
    /// Pan boundary; the camera never centers outside this box.
    pub max_bounds: Option<LatLngBounds>,
    /// The padded box the camera was last framed to, if any.
    framed: Option<LatLngBounds>,
}

impl Debug for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Viewport {{ center: ({:.4}, {:.4}), zoom: {} }}",
            self.center.lat, self.center.lng, self.zoom
        )
    }
}

impl Viewport {
    pub fn new(center: Point, zoom: u8, max_bounds: Option<LatLngBounds>) -> Self {
        let mut vp = Self { center, zoom, max_bounds, framed: None };
        vp.clamp_center();
        vp
    }

    pub fn set_view(&mut self, center: Point, zoom: u8) {
        self.center = center;
        self.zoom = zoom;
        self.clamp_center();
    }

    /// Re-frame the camera to the given (already padded) bounds. There is no
    /// animation step: center and zoom jump directly to the fitted values.
    pub fn frame(&mut self, bounds: LatLngBounds) {
        self.center = bounds.center();
        self.zoom = zoom_for_span(bounds.lat_span().max(bounds.lng_span()));
        self.clamp_center();
        self.framed = Some(bounds);
    }

    pub fn framed(&self) -> Option<LatLngBounds> {
        self.framed
    }

    fn clamp_center(&mut self) {
        if let Some(b) = self.max_bounds {
            self.center.lat = self.center.lat.clamp(b.south_west.lat, b.north_east.lat);
            self.center.lng = self.center.lng.clamp(b.south_west.lng, b.north_east.lng);
        }
    }
}

const MIN_ZOOM: u8 = 3;
const MAX_ZOOM: u8 = 19;

// Zoom level whose 360/2^z degree window covers the given span.
fn zoom_for_span(span_deg: f64) -> u8 {
    if span_deg <= 0.0 {
        return MAX_ZOOM;
    }
    let zoom = (360.0 / span_deg).log2().floor();
    zoom.clamp(MIN_ZOOM as f64, MAX_ZOOM as f64) as u8
}
