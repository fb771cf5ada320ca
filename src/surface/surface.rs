use crate::config::MapConfig;
use crate::errors::MapError;
use crate::events::SurfaceEvent;
use crate::geo::{Point, SnapCorrection};
use crate::render::backend::MapBackend;
use crate::surface::handle::MapHandle;
use crate::surface::props::{same_callback, LocationCallback, SurfaceProps};
use crate::surface::{binder, markers, route, DEFAULT_CHANNEL_CAPACITY};
use crate::surface::route::RouteOutcome;
use crate::viewport::Viewport;
use tokio::sync::broadcast;

/// The map surface. Owns the long-lived [`MapHandle`] and reconciles its
/// overlays against the current [`SurfaceProps`].
///
/// All methods are synchronous: a reconciliation pass never yields, so it is
/// atomic with respect to whatever event loop drives the surface.
/// Asynchronous inputs (geolocation, route responses) go through
/// [`SurfaceWorker`](crate::worker::SurfaceWorker), whose continuations check
/// [`MapSurface::is_mounted`] and degrade to no-ops after teardown.
pub struct MapSurface {
    config: MapConfig,
    props: SurfaceProps,
    handle: Option<MapHandle>,
    /// True from mount until teardown begins.
    mounted: bool,
    event_tx: broadcast::Sender<SurfaceEvent>,
}

impl MapSurface {
    pub fn new(config: MapConfig) -> Self {
        let (event_tx, _first_rx) = broadcast::channel(DEFAULT_CHANNEL_CAPACITY);
        Self { config, props: SurfaceProps::default(), handle: None, mounted: false, event_tx }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SurfaceEvent> {
        self.event_tx.subscribe()
    }

    pub(crate) fn events_sender(&self) -> broadcast::Sender<SurfaceEvent> {
        self.event_tx.clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn props(&self) -> &SurfaceProps {
        &self.props
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.handle.as_ref().map(|h| &h.viewport)
    }

    /// Create the map instance. Idempotent: a second call on a live surface is
    /// skipped. Initial center priority: destination, else selected point,
    /// else the configured fallback.
    pub fn mount(&mut self, mut backend: Box<dyn MapBackend + Send>) -> Result<(), MapError> {
        if self.handle.is_some() {
            log::debug!("mount skipped: map handle already exists");
            return Ok(());
        }

        let center = self
            .props
            .event_location
            .or(self.props.selected_location)
            .unwrap_or(self.config.fallback_center);
        let zoom = self.config.initial_zoom;

        backend.init(&self.config, center, zoom)?;
        log::info!("map surface mounted on {} at {center:?} zoom {zoom}", backend.name());

        let viewport = Viewport::new(center, zoom, self.config.max_bounds);
        self.handle = Some(MapHandle::new(backend, viewport));
        self.mounted = true;

        // Bring overlays and the click binding up to the current props.
        self.sync_binding();
        self.reconcile_markers()?;
        if self.props.route_path.is_some() {
            self.reconcile_route()?;
        }

        let _ = self.event_tx.send(SurfaceEvent::SurfaceMounted { center, zoom });
        Ok(())
    }

    /// Destroy the map instance: detach the click binding, remove all tracked
    /// overlays, destroy the backend, clear the mounted flag — in that order,
    /// so overlay removal never runs against a destroyed handle. Idempotent.
    pub fn teardown(&mut self) -> Result<(), MapError> {
        let Some(mut handle) = self.handle.take() else {
            self.mounted = false;
            return Ok(());
        };

        let result = (|| -> Result<(), MapError> {
            handle.binding = None;
            handle.remove_all_overlays()?;
            handle.backend.destroy()?;
            Ok(())
        })();

        self.mounted = false;
        log::info!("map surface torn down");
        let _ = self.event_tx.send(SurfaceEvent::SurfaceTornDown);
        result
    }

    pub fn set_interactive(&mut self, interactive: bool) {
        if self.props.interactive == interactive {
            return;
        }
        self.props.interactive = interactive;
        self.sync_binding();
    }

    pub fn set_on_location_select(&mut self, callback: Option<LocationCallback>) {
        if same_callback(self.props.on_location_select.as_ref(), callback.as_ref()) {
            return;
        }
        self.props.on_location_select = callback;
        self.sync_binding();
    }

    pub fn set_selected_location(&mut self, location: Option<Point>) -> Result<(), MapError> {
        if self.props.selected_location == location {
            return Ok(());
        }
        self.props.selected_location = location;
        self.reconcile_markers()
    }

    pub fn set_event_location(&mut self, location: Option<Point>) -> Result<(), MapError> {
        if self.props.event_location == location {
            return Ok(());
        }
        self.props.event_location = location;
        self.reconcile_markers()
    }

    pub fn set_user_location(&mut self, location: Option<Point>) -> Result<(), MapError> {
        if self.props.user_location == location {
            return Ok(());
        }
        self.props.user_location = location;
        self.reconcile_markers()
    }

    /// Replace the route inputs and run one render cycle.
    pub fn set_route(
        &mut self,
        path: Option<Vec<Point>>,
        start_snap: Option<SnapCorrection>,
        end_snap: Option<SnapCorrection>,
    ) -> Result<(), MapError> {
        if self.props.route_path == path
            && self.props.start_snap == start_snap
            && self.props.end_snap == end_snap
        {
            return Ok(());
        }
        self.props.route_path = path;
        self.props.start_snap = start_snap;
        self.props.end_snap = end_snap;
        self.reconcile_route()
    }

    /// Apply a whole prop set, reconciling only what changed.
    pub fn apply_props(&mut self, props: SurfaceProps) -> Result<(), MapError> {
        let SurfaceProps {
            interactive,
            on_location_select,
            selected_location,
            event_location,
            user_location,
            route_path,
            start_snap,
            end_snap,
        } = props;

        self.set_interactive(interactive);
        self.set_on_location_select(on_location_select);
        self.set_selected_location(selected_location)?;
        self.set_event_location(event_location)?;
        self.set_user_location(user_location)?;
        self.set_route(route_path, start_snap, end_snap)
    }

    /// Deliver a click at the given coordinate. The interactive flag and the
    /// binding are consulted at dispatch time; clicks are never buffered.
    pub fn dispatch_click(&mut self, at: Point) {
        if !self.mounted {
            return;
        }
        let Some(handle) = self.handle.as_ref() else {
            return;
        };
        if !self.props.interactive {
            return;
        }
        if let Some(binding) = handle.binding.as_ref() {
            (binding.callback)(at);
            let _ = self.event_tx.send(SurfaceEvent::LocationSelected { at });
        }
    }

    /// No-op when there is no live handle; covers the window between
    /// teardown start and handle destruction.
    fn sync_binding(&mut self) {
        let interactive = self.props.interactive;
        let callback = self.props.on_location_select.clone();
        if let Some(handle) = self.handle.as_mut() {
            let change = binder::sync(handle, interactive, callback.as_ref());
            log::trace!("click binding sync: {change:?}");
        }
    }

    fn reconcile_markers(&mut self) -> Result<(), MapError> {
        if !self.mounted {
            return Ok(());
        }
        let (selected, event, user) = (
            self.props.selected_location,
            self.props.event_location,
            self.props.user_location,
        );
        let Some(handle) = self.handle.as_mut() else {
            return Ok(());
        };
        let drawn = markers::reconcile(handle, selected, event, user)?;
        let _ = self.event_tx.send(SurfaceEvent::MarkersReconciled { drawn });
        Ok(())
    }

    fn reconcile_route(&mut self) -> Result<(), MapError> {
        if !self.mounted {
            return Ok(());
        }
        let Some(handle) = self.handle.as_mut() else {
            return Ok(());
        };
        let outcome = route::reconcile(
            handle,
            self.props.route_path.as_deref(),
            self.props.start_snap,
            self.props.end_snap,
            self.config.fit_padding,
        )?;
        match outcome {
            RouteOutcome::Cleared { removed } => {
                if removed > 0 {
                    let _ = self.event_tx.send(SurfaceEvent::RouteCleared);
                }
            }
            RouteOutcome::Drawn { points, snap_lines, framed } => {
                let _ = self.event_tx.send(SurfaceEvent::RouteDrawn { points, snap_lines });
                let _ = self.event_tx.send(SurfaceEvent::ViewportFramed { bounds: framed });
            }
        }
        Ok(())
    }
}
