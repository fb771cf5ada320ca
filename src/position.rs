pub mod source;
pub mod watch;

pub use source::*;
pub use watch::*;
