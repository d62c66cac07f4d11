//! Hosts a [`fam_core::Famicom`] on a worker thread and serves its storage
//! requests.

pub mod runtime;
pub mod storage;

pub use runtime::{FRAME_DURATION_NTSC, FramePacer, Runtime, RuntimeConfig, RuntimeError, RuntimeHandle};
pub use storage::{FileStorage, MemoryStorage, Storage};
