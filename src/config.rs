use crate::geo::{LatLngBounds, Point};

#[derive(Debug, Clone)]
pub struct MapConfig {
    /// Tile URL template for the base layer.
    pub tile_url: String,
    pub attribution: String,
    /// Where the map centers when neither a destination nor a selection is known.
    pub fallback_center: Point,
    pub initial_zoom: u8,
    /// Maximum-pan boundary; keeps the map scoped to a campus when set.
    pub max_bounds: Option<LatLngBounds>,
    /// Margin ratio used when re-framing the viewport to a route.
    pub fit_padding: f64,
    /// Position fixes with accuracy below this stop the geolocation watch.
    pub accuracy_threshold_m: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "© OpenStreetMap contributors".to_string(),
            fallback_center: Point { lat: 40.7128, lng: -74.0060 },
            initial_zoom: 13,
            max_bounds: None,
            fit_padding: 0.15,
            accuracy_threshold_m: 50.0,
        }
    }
}

impl MapConfig {
    /// Config scoped to a campus: centered on the campus box and unable to pan
    /// away from it.
    pub fn campus(bounds: LatLngBounds) -> Self {
        Self {
            fallback_center: bounds.center(),
            initial_zoom: 16,
            max_bounds: Some(bounds),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn campus_config_centers_inside_bounds() {
        let bounds = LatLngBounds::new(Point::new(17.77, 83.36), Point::new(17.79, 83.39));
        let config = MapConfig::campus(bounds);
        assert_eq!(config.max_bounds, Some(bounds));
        assert!(bounds.contains(config.fallback_center));
    }
}
