use crate::config::MapConfig;
use crate::geo::{LatLngBounds, Point};
use std::fmt::Display;
use uuid::Uuid;

/// Identifier of a drawn overlay (marker, route line or snap line). The
/// overlay registry tracks these so reconciliation passes can remove exactly
/// what they previously added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayId(Uuid);

impl OverlayId {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for OverlayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stroke style for a polyline overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    pub color: String,
    pub weight: f32,
    pub opacity: f32,
    pub dashed: bool,
}

impl LineStyle {
    /// The continuous route line.
    pub fn route() -> Self {
        Self { color: "#4169E1".to_string(), weight: 6.0, opacity: 0.8, dashed: false }
    }

    /// Short dashed line from a requested endpoint to its snapped position.
    pub fn snap() -> Self {
        Self { color: "#FF8C00".to_string(), weight: 3.0, opacity: 0.9, dashed: true }
    }
}

/// The imperative drawing object behind a [`MapHandle`](crate::surface::MapHandle).
///
/// Implementations wrap whatever actually renders tiles and overlays (a DOM
/// map library, a GPU canvas, a test recorder). Calls occur on the surface's
/// owning thread; the surface guarantees it never calls a backend after
/// `destroy`.
pub trait MapBackend {
    fn name(&self) -> &str;

    /// Bring the underlying map object up: base tile layer, initial view and
    /// the maximum-pan boundary from `config`. Called exactly once per mount.
    /// Tile network requests are implicitly triggered here and not otherwise
    /// managed.
    fn init(&mut self, config: &MapConfig, center: Point, zoom: u8) -> anyhow::Result<()>;

    fn add_marker(&mut self, at: Point, label: &str) -> anyhow::Result<OverlayId>;

    /// Draw a polyline through `points` in order. At least two points.
    fn add_polyline(&mut self, points: &[Point], style: &LineStyle) -> anyhow::Result<OverlayId>;

    /// Remove a previously drawn overlay. Unknown ids are an error: the
    /// registry should never hand one over.
    fn remove_overlay(&mut self, id: OverlayId) -> anyhow::Result<()>;

    fn set_view(&mut self, center: Point, zoom: u8) -> anyhow::Result<()>;

    /// Re-frame the camera to the given bounds without animation.
    fn fit_bounds(&mut self, bounds: &LatLngBounds) -> anyhow::Result<()>;

    /// Tear the map object down. All overlays and listeners are gone
    /// afterwards; no other method is called on this backend again.
    fn destroy(&mut self) -> anyhow::Result<()>;
}
