//! The map surface: one long-lived map instance plus the reconcilers that keep
//! its overlays in sync with independently changing inputs.
//!
//! Four cooperating responsibilities, all scoped to one mounted surface:
//!
//! - instance ownership ([`MapSurface::mount`] / [`MapSurface::teardown`])
//! - click binding ([`binder`])
//! - marker reconciliation ([`markers`])
//! - route overlay rendering ([`route`])

pub mod binder;
pub mod handle;
pub mod markers;
pub mod props;
pub mod route;

#[allow(clippy::module_inception)]
mod surface;

pub use handle::{MapHandle, OverlayRegistry};
pub use props::{LocationCallback, SurfaceProps};
pub use surface::MapSurface;

/// Capacity of the surface's broadcast event channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;
