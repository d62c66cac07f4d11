use std::{path::PathBuf, time::Duration};

pub(crate) const CONTROL_REPLY_TIMEOUT: Duration = Duration::from_secs(2);
/// NTSC: ~60.0988 Hz
pub const FRAME_DURATION_NTSC: Duration = Duration::from_nanos(16_639_263);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Directory holding `<key>.sav` files. `None` keeps saves in memory.
    pub storage_dir: Option<PathBuf>,
    /// How long a caller waits for the worker to answer one request.
    pub reply_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            storage_dir: None,
            reply_timeout: CONTROL_REPLY_TIMEOUT,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("runtime control channel disconnected")]
    ControlChannelDisconnected,
    #[error("runtime did not respond in time for {op}")]
    ControlTimeout { op: &'static str },
    #[error("failed to spawn runtime thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error(transparent)]
    Core(#[from] fam_core::error::Error),
}
