use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// A WGS84 coordinate. Used both for overlay positions and for the route
/// service wire format, hence the serde derives.
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lng: f64,
}

impl Debug for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Point {{ lat: {:.6}, lng: {:.6} }}", self.lat, self.lng)
    }
}

impl Point {
    /// Panics on out-of-range coordinates: a malformed coordinate is a caller
    /// contract violation, not a runtime condition to recover from.
    pub fn new(lat: f64, lng: f64) -> Self {
        assert!(
            (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng),
            "coordinate out of range: ({lat}, {lng})"
        );
        Self { lat, lng }
    }
}

/// Axis-aligned geographic bounding box.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct LatLngBounds {
    pub south_west: Point,
    pub north_east: Point,
}

impl LatLngBounds {
    pub fn new(south_west: Point, north_east: Point) -> Self {
        Self { south_west, north_east }
    }

    /// Smallest box containing all given points. `None` for an empty slice.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Self::new(*first, *first);
        for p in &points[1..] {
            bounds.extend(*p);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, p: Point) {
        self.south_west.lat = self.south_west.lat.min(p.lat);
        self.south_west.lng = self.south_west.lng.min(p.lng);
        self.north_east.lat = self.north_east.lat.max(p.lat);
        self.north_east.lng = self.north_east.lng.max(p.lng);
    }

    pub fn contains(&self, p: Point) -> bool {
        p.lat >= self.south_west.lat
            && p.lat <= self.north_east.lat
            && p.lng >= self.south_west.lng
            && p.lng <= self.north_east.lng
    }

    /// Grow the box by `ratio` of its span on every side. A zero-span box
    /// (single point) still gets a small fixed margin so it stays frameable.
    pub fn pad(&self, ratio: f64) -> Self {
        const MIN_MARGIN_DEG: f64 = 0.0005;
        let lat_margin = ((self.north_east.lat - self.south_west.lat) * ratio).max(MIN_MARGIN_DEG);
        let lng_margin = ((self.north_east.lng - self.south_west.lng) * ratio).max(MIN_MARGIN_DEG);
        Self {
            south_west: Point {
                lat: self.south_west.lat - lat_margin,
                lng: self.south_west.lng - lng_margin,
            },
            north_east: Point {
                lat: self.north_east.lat + lat_margin,
                lng: self.north_east.lng + lng_margin,
            },
        }
    }

    pub fn center(&self) -> Point {
        Point {
            lat: (self.south_west.lat + self.north_east.lat) / 2.0,
            lng: (self.south_west.lng + self.north_east.lng) / 2.0,
        }
    }

    pub fn lat_span(&self) -> f64 {
        self.north_east.lat - self.south_west.lat
    }

    pub fn lng_span(&self) -> f64 {
        self.north_east.lng - self.south_west.lng
    }
}

/// Marks that a requested route endpoint was moved to the nearest point the
/// routing service could use. Rendered as a short dashed line.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapCorrection {
    pub original: Point,
    pub snapped: Point,
}
