pub mod backend;

/// Drawing backends for the map surface.
pub mod backends {
    pub mod null;
}

pub use backend::*;
