//! Async driver for a mounted map surface.
//!
//! The worker owns the surface and serializes every mutation through one
//! loop: host commands, live position fixes and route-service responses all
//! land here, so each reconciliation pass runs to completion before the next
//! input is looked at. Route requests may overlap; whichever response is
//! applied last determines what is drawn, because every response goes through
//! the same clear-then-draw pass.

use crate::errors::{MapError, RouteError};
use crate::events::{SurfaceCommand, SurfaceEvent};
use crate::geo::Point;
use crate::net::route::{RouteResponse, RouteService};
use crate::position::{AccuracyWatch, FixResult, PositionSource};
use crate::surface::{LocationCallback, MapSurface, DEFAULT_CHANNEL_CAPACITY};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

/// Cloneable handle for talking to a running [`SurfaceWorker`].
#[derive(Clone)]
pub struct SurfaceHandle {
    cmd_tx: mpsc::Sender<SurfaceCommand>,
    event_tx: broadcast::Sender<SurfaceEvent>,
}

impl SurfaceHandle {
    pub fn subscribe_events(&self) -> broadcast::Receiver<SurfaceEvent> {
        self.event_tx.subscribe()
    }

    async fn send(&self, cmd: SurfaceCommand) -> Result<(), MapError> {
        self.cmd_tx.send(cmd).await.map_err(|_| MapError::ChannelClosed)
    }

    pub async fn set_interactive(&self, interactive: bool) -> Result<(), MapError> {
        self.send(SurfaceCommand::SetInteractive { interactive }).await
    }

    pub async fn set_on_location_select(
        &self,
        callback: Option<LocationCallback>,
    ) -> Result<(), MapError> {
        self.send(SurfaceCommand::SetOnLocationSelect { callback }).await
    }

    pub async fn set_selected_location(&self, location: Option<Point>) -> Result<(), MapError> {
        self.send(SurfaceCommand::SetSelectedLocation { location }).await
    }

    pub async fn set_event_location(&self, location: Option<Point>) -> Result<(), MapError> {
        self.send(SurfaceCommand::SetEventLocation { location }).await
    }

    pub async fn set_user_location(&self, location: Option<Point>) -> Result<(), MapError> {
        self.send(SurfaceCommand::SetUserLocation { location }).await
    }

    pub async fn set_route(
        &self,
        path: Option<Vec<Point>>,
        start_snap: Option<crate::geo::SnapCorrection>,
        end_snap: Option<crate::geo::SnapCorrection>,
    ) -> Result<(), MapError> {
        self.send(SurfaceCommand::SetRoute { path, start_snap, end_snap }).await
    }

    pub async fn click(&self, at: Point) -> Result<(), MapError> {
        self.send(SurfaceCommand::Click { at }).await
    }

    /// Start watching the device position and routing to the destination.
    pub async fn navigate(&self, algorithm: &str) -> Result<(), MapError> {
        self.send(SurfaceCommand::Navigate { algorithm: algorithm.to_string() }).await
    }

    /// Route from a manually chosen start point instead of a geolocation fix.
    pub async fn route_from(&self, start: Point, algorithm: &str) -> Result<(), MapError> {
        self.send(SurfaceCommand::RouteFrom { start, algorithm: algorithm.to_string() }).await
    }

    /// Tear the surface down and stop the worker, waiting for cleanup to run.
    pub async fn teardown(&self) -> Result<(), MapError> {
        let (tx, rx) = oneshot::channel();
        self.send(SurfaceCommand::Teardown { reply: tx }).await?;
        rx.await.map_err(|_| MapError::ChannelClosed)?
    }
}

enum Flow {
    Continue,
    Stop,
}

enum Step {
    Command(Option<SurfaceCommand>),
    Fix(Option<FixResult>),
    Route(Option<Result<RouteResponse, RouteError>>),
}

pub struct SurfaceWorker {
    surface: MapSurface,
    cmd_rx: mpsc::Receiver<SurfaceCommand>,
    event_tx: broadcast::Sender<SurfaceEvent>,
    routes: Arc<dyn RouteService>,
    positions: Arc<dyn PositionSource>,
    watch: Option<AccuracyWatch>,
    route_tx: mpsc::Sender<Result<RouteResponse, RouteError>>,
    route_rx: mpsc::Receiver<Result<RouteResponse, RouteError>>,
    algorithm: String,
}

impl SurfaceWorker {
    /// Take ownership of an already-mounted surface and spawn the worker
    /// loop. The host keeps only the returned [`SurfaceHandle`]; dropping the
    /// last handle tears the surface down.
    pub fn spawn(
        surface: MapSurface,
        routes: Arc<dyn RouteService>,
        positions: Arc<dyn PositionSource>,
    ) -> (SurfaceHandle, JoinHandle<()>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(DEFAULT_CHANNEL_CAPACITY);
        let (route_tx, route_rx) = mpsc::channel(DEFAULT_CHANNEL_CAPACITY);
        let event_tx = surface.events_sender();
        let handle = SurfaceHandle { cmd_tx, event_tx: event_tx.clone() };
        let worker = Self {
            surface,
            cmd_rx,
            event_tx,
            routes,
            positions,
            watch: None,
            route_tx,
            route_rx,
            algorithm: crate::net::route::DEFAULT_ALGORITHM.to_string(),
        };
        let join = tokio::spawn(worker.run());
        (handle, join)
    }

    async fn run(mut self) {
        loop {
            let step = tokio::select! {
                cmd = self.cmd_rx.recv() => Step::Command(cmd),
                fix = poll_watch(&mut self.watch) => Step::Fix(fix),
                res = self.route_rx.recv() => Step::Route(res),
            };

            match step {
                Step::Command(None) => break, // all handles dropped
                Step::Command(Some(cmd)) => {
                    log::trace!("surface command: {cmd:?}");
                    if let Flow::Stop = self.handle_command(cmd) {
                        break;
                    }
                }
                Step::Fix(None) => self.watch = None, // stream ended
                Step::Fix(Some(item)) => self.handle_fix(item),
                Step::Route(None) => break, // unreachable: worker holds a sender
                Step::Route(Some(res)) => self.handle_route_result(res),
            }
        }

        // Covers exit via dropped handles; after an explicit Teardown the
        // surface is already unmounted and this is a no-op.
        self.watch = None;
        if self.surface.is_mounted() {
            if let Err(err) = self.surface.teardown() {
                log::error!("teardown on worker exit failed: {err}");
            }
        }
        log::debug!("surface worker exiting");
    }

    fn handle_command(&mut self, cmd: SurfaceCommand) -> Flow {
        match cmd {
            SurfaceCommand::SetInteractive { interactive } => {
                self.surface.set_interactive(interactive);
            }
            SurfaceCommand::SetOnLocationSelect { callback } => {
                self.surface.set_on_location_select(callback);
            }
            SurfaceCommand::SetSelectedLocation { location } => {
                let res = self.surface.set_selected_location(location);
                self.report(res);
            }
            SurfaceCommand::SetEventLocation { location } => {
                let res = self.surface.set_event_location(location);
                self.report(res);
            }
            SurfaceCommand::SetUserLocation { location } => {
                let res = self.surface.set_user_location(location);
                self.report(res);
            }
            SurfaceCommand::SetRoute { path, start_snap, end_snap } => {
                let res = self.surface.set_route(path, start_snap, end_snap);
                self.report(res);
            }
            SurfaceCommand::Click { at } => {
                self.surface.dispatch_click(at);
            }
            SurfaceCommand::Navigate { algorithm } => {
                self.algorithm = algorithm;
                self.start_watch();
            }
            SurfaceCommand::RouteFrom { start, algorithm } => {
                self.algorithm = algorithm;
                let res = self.surface.set_user_location(Some(start));
                self.report(res);
                self.request_route(start);
            }
            SurfaceCommand::Teardown { reply } => {
                // Release the position subscription first, then destroy the
                // surface. In-flight route requests are left to resolve; their
                // results find the loop gone and are dropped.
                self.watch = None;
                let res = self.surface.teardown();
                let _ = reply.send(res);
                return Flow::Stop;
            }
        }
        Flow::Continue
    }

    fn handle_fix(&mut self, item: FixResult) {
        match item {
            Ok(fix) => {
                let _ = self.event_tx.send(SurfaceEvent::PositionUpdated { fix });
                let res = self.surface.set_user_location(Some(fix.point));
                self.report(res);
                self.request_route(fix.point);
            }
            Err(kind) => {
                let _ = self.event_tx.send(SurfaceEvent::PositionLost { kind });
            }
        }
    }

    fn handle_route_result(&mut self, res: Result<RouteResponse, RouteError>) {
        match res {
            Ok(resp) => {
                if !self.surface.is_mounted() {
                    log::debug!("route response after teardown, dropping");
                    return;
                }
                log::debug!(
                    "applying route: {} points, {:.0}m, {}",
                    resp.path.len(),
                    resp.distance,
                    resp.algorithm
                );
                let res = self.surface.set_route(Some(resp.path), resp.start_snap, resp.end_snap);
                self.report(res);
            }
            Err(err) => {
                // A failed request is not an input change: whatever route is
                // currently drawn stays.
                log::warn!("route request failed: {err}");
                let _ = self.event_tx.send(SurfaceEvent::RouteFailed { message: err.to_string() });
            }
        }
    }

    fn start_watch(&mut self) {
        // Replace any existing watch, as a fresh user-initiated request.
        self.watch = None;
        let threshold = self.surface.config().accuracy_threshold_m;
        match AccuracyWatch::start(self.positions.as_ref(), threshold) {
            Ok(watch) => self.watch = Some(watch),
            Err(kind) => {
                let _ = self.event_tx.send(SurfaceEvent::PositionLost { kind });
            }
        }
    }

    /// Issue a route request from `start` to the current destination. Requests
    /// are not single-flight and are not cancelled at the transport level.
    fn request_route(&mut self, start: Point) {
        let Some(end) = self.surface.props().event_location else {
            log::debug!("no destination set, skipping route request");
            return;
        };
        let fut = self.routes.route(start, end, &self.algorithm);
        let tx = self.route_tx.clone();
        tokio::spawn(async move {
            let res = fut.await;
            // Worker gone means the surface was torn down; drop the result.
            let _ = tx.send(res).await;
        });
    }

    fn report(&self, res: Result<(), MapError>) {
        if let Err(err) = res {
            log::error!("surface reconciliation failed: {err}");
            let _ = self.event_tx.send(SurfaceEvent::Warning { message: err.to_string() });
        }
    }
}

async fn poll_watch(watch: &mut Option<AccuracyWatch>) -> Option<FixResult> {
    match watch {
        Some(w) => w.next().await,
        None => futures::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use crate::errors::PositionErrorKind;
    use crate::position::{PositionFix, SimulatedPositionSource};
    use crate::render::backends::null::{NullBackend, NullProbe};
    use futures::future::BoxFuture;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::timeout;

    fn pt(lat: f64, lng: f64) -> Point {
        Point::new(lat, lng)
    }

    fn fix(accuracy_m: f64) -> FixResult {
        Ok(PositionFix { point: pt(17.7840, 83.3790), accuracy_m, timestamp_ms: 1_700_000_000_000 })
    }

    fn response(path: Vec<Point>) -> RouteResponse {
        RouteResponse {
            distance: 412.5,
            duration: 297.0,
            algorithm: "astar".to_string(),
            path,
            metrics: String::new(),
            start_snap: None,
            end_snap: None,
        }
    }

    /// Route service that pops one scripted (delay, result) entry per call.
    struct ScriptedRoutes {
        script: Mutex<VecDeque<(Duration, Result<RouteResponse, RouteError>)>>,
    }

    impl ScriptedRoutes {
        fn new(script: Vec<(Duration, Result<RouteResponse, RouteError>)>) -> Self {
            Self { script: Mutex::new(script.into()) }
        }
    }

    impl RouteService for ScriptedRoutes {
        fn route(
            &self,
            _start: Point,
            _end: Point,
            _algorithm: &str,
        ) -> BoxFuture<'static, Result<RouteResponse, RouteError>> {
            let (delay, result) =
                self.script.lock().unwrap().pop_front().expect("unexpected route request");
            Box::pin(async move {
                tokio::time::sleep(delay).await;
                result
            })
        }
    }

    fn spawn_worker(
        routes: Arc<dyn RouteService>,
        positions: Arc<dyn PositionSource>,
    ) -> (SurfaceHandle, JoinHandle<()>, NullProbe) {
        let _ = env_logger::builder().is_test(true).try_init();
        let backend = NullBackend::new();
        let probe = backend.probe();
        let mut surface = MapSurface::new(MapConfig::default());
        surface.mount(Box::new(backend)).unwrap();
        let (handle, join) = SurfaceWorker::spawn(surface, routes, positions);
        (handle, join, probe)
    }

    async fn wait_for_route_draws(
        rx: &mut broadcast::Receiver<SurfaceEvent>,
        wanted: usize,
    ) -> usize {
        let mut drawn = 0;
        while drawn < wanted {
            let ev = timeout(Duration::from_secs(2), rx.recv())
                .await
                .expect("timed out waiting for events")
                .expect("event channel closed");
            if matches!(ev, SurfaceEvent::RouteDrawn { .. }) {
                drawn += 1;
            }
        }
        drawn
    }

    #[tokio::test]
    async fn teardown_race_drops_late_route_response() {
        let routes = Arc::new(ScriptedRoutes::new(vec![(
            Duration::from_millis(50),
            Ok(response(vec![pt(1.0, 1.0), pt(2.0, 2.0)])),
        )]));
        let positions = Arc::new(SimulatedPositionSource::unsupported());
        let (handle, join, probe) = spawn_worker(routes, positions);

        handle.set_event_location(Some(pt(2.0, 2.0))).await.unwrap();
        handle.route_from(pt(1.0, 1.0), "astar").await.unwrap();

        // Tear down before the response resolves.
        handle.teardown().await.unwrap();
        assert!(probe.is_destroyed());
        assert_eq!(probe.overlay_count(), 0);

        // The late resolution must not panic and must not draw anything.
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(probe.overlay_count(), 0);
        join.await.unwrap();
    }

    #[tokio::test]
    async fn navigate_routes_from_each_fix_until_accurate() {
        let path_coarse = vec![pt(17.7840, 83.3790), pt(17.7836, 83.3786)];
        let path_fine = vec![pt(17.7840, 83.3790), pt(17.7845, 83.3795), pt(17.7836, 83.3786)];
        let routes = Arc::new(ScriptedRoutes::new(vec![
            (Duration::ZERO, Ok(response(path_coarse))),
            (Duration::ZERO, Ok(response(path_fine.clone()))),
        ]));
        // Third fix is below the threshold already at the second, so only two
        // fixes are ever delivered.
        let positions =
            Arc::new(SimulatedPositionSource::new(vec![fix(120.0), fix(20.0), fix(5.0)]));
        let (handle, join, probe) = spawn_worker(routes, positions);
        let mut events = handle.subscribe_events();

        handle.set_event_location(Some(pt(17.7836, 83.3786))).await.unwrap();
        handle.navigate("astar").await.unwrap();

        wait_for_route_draws(&mut events, 2).await;

        // One route line, from the latest applied response.
        assert_eq!(probe.solid_polylines(), vec![path_fine]);
        let labels = probe.marker_labels();
        assert!(labels.contains(&"Event location".to_string()));
        assert!(labels.contains(&"Your location".to_string()));

        handle.teardown().await.unwrap();
        join.await.unwrap();
    }

    #[tokio::test]
    async fn overlapping_requests_last_applied_response_wins() {
        let slow_path = vec![pt(1.0, 1.0), pt(3.0, 3.0)];
        let fast_path = vec![pt(2.0, 2.0), pt(3.0, 3.0)];
        // First request resolves last: issue order must not matter.
        let routes = Arc::new(ScriptedRoutes::new(vec![
            (Duration::from_millis(60), Ok(response(slow_path.clone()))),
            (Duration::from_millis(5), Ok(response(fast_path))),
        ]));
        let positions = Arc::new(SimulatedPositionSource::unsupported());
        let (handle, join, probe) = spawn_worker(routes, positions);
        let mut events = handle.subscribe_events();

        handle.set_event_location(Some(pt(3.0, 3.0))).await.unwrap();
        handle.route_from(pt(1.0, 1.0), "astar").await.unwrap();
        handle.route_from(pt(2.0, 2.0), "astar").await.unwrap();

        wait_for_route_draws(&mut events, 2).await;

        // Exactly one line remains: the one applied last.
        assert_eq!(probe.solid_polylines(), vec![slow_path]);

        handle.teardown().await.unwrap();
        join.await.unwrap();
    }

    #[tokio::test]
    async fn route_failure_leaves_previous_route_drawn() {
        let good_path = vec![pt(1.0, 1.0), pt(3.0, 3.0)];
        let routes = Arc::new(ScriptedRoutes::new(vec![
            (Duration::ZERO, Ok(response(good_path.clone()))),
            (Duration::ZERO, Err(RouteError::NoPathFound)),
        ]));
        let positions = Arc::new(SimulatedPositionSource::unsupported());
        let (handle, join, probe) = spawn_worker(routes, positions);
        let mut events = handle.subscribe_events();

        handle.set_event_location(Some(pt(3.0, 3.0))).await.unwrap();
        handle.route_from(pt(1.0, 1.0), "astar").await.unwrap();
        wait_for_route_draws(&mut events, 1).await;

        handle.route_from(pt(2.0, 2.0), "astar").await.unwrap();
        let failed = loop {
            let ev = timeout(Duration::from_secs(2), events.recv()).await.unwrap().unwrap();
            if let SurfaceEvent::RouteFailed { message } = ev {
                break message;
            }
        };
        assert!(failed.contains("No path found"));
        assert_eq!(probe.solid_polylines(), vec![good_path]);

        handle.teardown().await.unwrap();
        join.await.unwrap();
    }

    #[tokio::test]
    async fn dropping_the_last_handle_tears_down() {
        let routes = Arc::new(ScriptedRoutes::new(vec![]));
        let positions = Arc::new(SimulatedPositionSource::unsupported());
        let (handle, join, probe) = spawn_worker(routes, positions);

        drop(handle);
        timeout(Duration::from_secs(2), join).await.unwrap().unwrap();
        assert!(probe.is_destroyed());
        assert_eq!(probe.overlay_count(), 0);
    }

    #[tokio::test]
    async fn unsupported_environment_surfaces_once() {
        let routes = Arc::new(ScriptedRoutes::new(vec![]));
        let positions = Arc::new(SimulatedPositionSource::unsupported());
        let (handle, join, _probe) = spawn_worker(routes, positions);
        let mut events = handle.subscribe_events();

        handle.navigate("astar").await.unwrap();
        let kind = loop {
            let ev = timeout(Duration::from_secs(2), events.recv()).await.unwrap().unwrap();
            if let SurfaceEvent::PositionLost { kind } = ev {
                break kind;
            }
        };
        assert_eq!(kind, PositionErrorKind::Unsupported);

        handle.teardown().await.unwrap();
        join.await.unwrap();
    }
}
