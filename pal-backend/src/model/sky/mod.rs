pub mod solar;
pub mod window;

pub use window::{compute_window, NightInterval, SkyBounds, SkyWindow};
