pub mod config;
pub mod errors;
pub mod events;
pub mod geo;
pub mod net;
pub mod position;
pub mod render;
pub mod surface;
pub mod viewport;
pub mod worker;

pub use surface::*;
pub use worker::{SurfaceHandle, SurfaceWorker};
