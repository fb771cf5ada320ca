use crate::render::backend::{MapBackend, OverlayId};
use crate::surface::props::LocationCallback;
use crate::viewport::Viewport;
use uuid::Uuid;

/// Tracks every overlay currently drawn, segregated by the reconciler that
/// owns it. Invariant: after any reconciliation pass there is exactly one
/// entry per non-null logical input, and categories are never cross-owned.
#[derive(Debug, Default)]
pub struct OverlayRegistry {
    /// Markers drawn by the marker reconciler.
    pub markers: Vec<OverlayId>,
    /// The continuous route line, if drawn.
    pub route: Option<OverlayId>,
    /// Dashed snap-correction lines, at most two.
    pub snaps: Vec<OverlayId>,
}

impl OverlayRegistry {
    pub fn overlay_count(&self) -> usize {
        self.markers.len() + usize::from(self.route.is_some()) + self.snaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlay_count() == 0
    }
}

/// The single active click binding. Replacing the slot is how "unbind before
/// rebind" is enforced: there is no listener list to leak into.
pub struct ClickBinding {
    pub id: Uuid,
    pub callback: LocationCallback,
}

/// The owned, long-lived map instance: drawing backend, camera, overlay
/// registry and click-binding slot. Created once per mount and destroyed once
/// on teardown; overlays come and go many times within that window.
pub struct MapHandle {
    pub(crate) backend: Box<dyn MapBackend + Send>,
    pub registry: OverlayRegistry,
    pub viewport: Viewport,
    pub(crate) binding: Option<ClickBinding>,
}

impl MapHandle {
    pub fn new(backend: Box<dyn MapBackend + Send>, viewport: Viewport) -> Self {
        Self { backend, registry: OverlayRegistry::default(), viewport, binding: None }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Remove every tracked overlay, in registry order. Used by teardown,
    /// which runs this before the backend is destroyed.
    pub(crate) fn remove_all_overlays(&mut self) -> anyhow::Result<()> {
        for id in self.registry.markers.drain(..) {
            self.backend.remove_overlay(id)?;
        }
        if let Some(id) = self.registry.route.take() {
            self.backend.remove_overlay(id)?;
        }
        for id in self.registry.snaps.drain(..) {
            self.backend.remove_overlay(id)?;
        }
        Ok(())
    }
}
