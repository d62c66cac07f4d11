mod control;
mod handle;
mod pacer;
mod runner;
mod types;

pub use handle::{Runtime, RuntimeHandle};
pub use pacer::FramePacer;
pub use types::{FRAME_DURATION_NTSC, RuntimeConfig, RuntimeError};
