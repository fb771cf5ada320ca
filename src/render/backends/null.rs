use crate::config::MapConfig;
use crate::geo::{LatLngBounds, Point};
use crate::render::backend::{LineStyle, MapBackend, OverlayId};
use anyhow::{bail, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// What the null backend remembers about one drawn overlay.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawnOverlay {
    Marker { at: Point, label: String },
    Polyline { points: Vec<Point>, style: LineStyle },
}

/// Recorded state of a [`NullBackend`], shared with its probes.
#[derive(Debug, Default)]
pub struct RecordedState {
    pub initialized: bool,
    pub destroyed: bool,
    pub overlays: HashMap<OverlayId, DrawnOverlay>,
    pub view: Option<(Point, u8)>,
    pub fitted: Option<LatLngBounds>,
    pub fit_count: usize,
}

/// Backend that draws nothing and records every call. The test double for the
/// whole surface layer.
pub struct NullBackend {
    state: Arc<Mutex<RecordedState>>,
}

impl NullBackend {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self { state: Arc::new(Mutex::new(RecordedState::default())) }
    }

    /// Handle onto the recorded state that stays valid after the backend has
    /// been boxed and moved into a surface.
    pub fn probe(&self) -> NullProbe {
        NullProbe { state: self.state.clone() }
    }
}

impl MapBackend for NullBackend {
    fn name(&self) -> &str {
        "NullBackend"
    }

    fn init(&mut self, _config: &MapConfig, center: Point, zoom: u8) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.initialized {
            bail!("NullBackend initialized twice");
        }
        state.initialized = true;
        state.view = Some((center, zoom));
        Ok(())
    }

    fn add_marker(&mut self, at: Point, label: &str) -> Result<OverlayId> {
        let id = OverlayId::new();
        self.state
            .lock()
            .unwrap()
            .overlays
            .insert(id, DrawnOverlay::Marker { at, label: label.to_string() });
        Ok(id)
    }

    fn add_polyline(&mut self, points: &[Point], style: &LineStyle) -> Result<OverlayId> {
        if points.len() < 2 {
            bail!("polyline needs at least two points, got {}", points.len());
        }
        let id = OverlayId::new();
        self.state
            .lock()
            .unwrap()
            .overlays
            .insert(id, DrawnOverlay::Polyline { points: points.to_vec(), style: style.clone() });
        Ok(id)
    }

    fn remove_overlay(&mut self, id: OverlayId) -> Result<()> {
        if self.state.lock().unwrap().overlays.remove(&id).is_none() {
            bail!("removed unknown overlay {id}");
        }
        Ok(())
    }

    fn set_view(&mut self, center: Point, zoom: u8) -> Result<()> {
        self.state.lock().unwrap().view = Some((center, zoom));
        Ok(())
    }

    fn fit_bounds(&mut self, bounds: &LatLngBounds) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.fitted = Some(*bounds);
        state.fit_count += 1;
        Ok(())
    }

    fn destroy(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.destroyed {
            bail!("NullBackend destroyed twice");
        }
        state.destroyed = true;
        Ok(())
    }
}

/// Read-only view of a [`NullBackend`]'s recorded state.
#[derive(Clone)]
pub struct NullProbe {
    state: Arc<Mutex<RecordedState>>,
}

impl NullProbe {
    pub fn overlay_count(&self) -> usize {
        self.state.lock().unwrap().overlays.len()
    }

    pub fn marker_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self
            .state
            .lock()
            .unwrap()
            .overlays
            .values()
            .filter_map(|o| match o {
                DrawnOverlay::Marker { label, .. } => Some(label.clone()),
                _ => None,
            })
            .collect();
        labels.sort();
        labels
    }

    pub fn marker_count(&self) -> usize {
        self.with_overlays(|o| matches!(o, DrawnOverlay::Marker { .. }))
    }

    pub fn solid_polylines(&self) -> Vec<Vec<Point>> {
        self.state
            .lock()
            .unwrap()
            .overlays
            .values()
            .filter_map(|o| match o {
                DrawnOverlay::Polyline { points, style } if !style.dashed => Some(points.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn dashed_polylines(&self) -> Vec<Vec<Point>> {
        self.state
            .lock()
            .unwrap()
            .overlays
            .values()
            .filter_map(|o| match o {
                DrawnOverlay::Polyline { points, style } if style.dashed => Some(points.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn fitted(&self) -> Option<LatLngBounds> {
        self.state.lock().unwrap().fitted
    }

    pub fn fit_count(&self) -> usize {
        self.state.lock().unwrap().fit_count
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.lock().unwrap().destroyed
    }

    fn with_overlays(&self, pred: impl Fn(&DrawnOverlay) -> bool) -> usize {
        self.state.lock().unwrap().overlays.values().filter(|o| pred(o)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_removes_overlays() {
        let mut backend = NullBackend::new();
        let probe = backend.probe();

        let id = backend.add_marker(Point::new(17.7836, 83.3786), "Event location").unwrap();
        assert_eq!(probe.marker_count(), 1);

        backend.remove_overlay(id).unwrap();
        assert_eq!(probe.overlay_count(), 0);
        assert!(backend.remove_overlay(id).is_err());
    }

    #[test]
    fn rejects_degenerate_polylines() {
        let mut backend = NullBackend::new();
        let err = backend.add_polyline(&[Point::new(0.0, 0.0)], &LineStyle::route());
        assert!(err.is_err());
    }

    #[test]
    fn double_init_and_double_destroy_fail() {
        let mut backend = NullBackend::new();
        let config = MapConfig::default();
        backend.init(&config, config.fallback_center, 13).unwrap();
        assert!(backend.init(&config, config.fallback_center, 13).is_err());

        backend.destroy().unwrap();
        assert!(backend.destroy().is_err());
    }
}
