//! Messages exchanged with the host driving a [`Famicom`](crate::Famicom).

use std::path::PathBuf;

/// How the cartridge for the next power-on is obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitParam {
    /// Read the image from disk.
    Path(PathBuf),
    /// Use an image already in memory.
    Rom(Vec<u8>),
    /// Use an image in memory but build the board registered under `id`,
    /// ignoring the header's mapper number.
    Registry { id: u16, rom: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Emulate one frame and return its picture and sound.
    Frame,
    /// Emulate one frame without drawing it.
    SkipFrame,
    /// Press the reset button; takes effect on the next frame.
    Reset,
    /// Flush save RAM and stop.
    Shutdown,
    /// Selects the cartridge; takes effect on the next power-on.
    SetParameter(InitParam),
    /// Host answer to a [`StorageRequest::Load`].
    StorageResponse(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub command: Command,
    /// Button masks for pad 1 and pad 2, bit 0 = A through bit 7 = Right.
    pub buttons: [u8; 2],
}

impl Request {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            buttons: [0; 2],
        }
    }

    pub fn with_buttons(mut self, buttons: [u8; 2]) -> Self {
        self.buttons = buttons;
        self
    }

    pub fn frame(buttons: [u8; 2]) -> Self {
        Self::new(Command::Frame).with_buttons(buttons)
    }

    pub fn skip_frame(buttons: [u8; 2]) -> Self {
        Self::new(Command::SkipFrame).with_buttons(buttons)
    }
}

/// Persistent storage operations the host performs on the core's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageRequest {
    /// Fetch `size` bytes stored under `key`; answered with
    /// [`Command::StorageResponse`].
    Load { key: String, size: usize },
    /// Persist `data` under `key`.
    Save { key: String, data: Vec<u8> },
}

/// Output of one request. Every field may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    /// 256x224 pixels, `0xAABBGGRR`.
    pub screen: Option<Box<[u32]>>,
    /// 8-bit unsigned PCM at 22080 Hz.
    pub sound: Option<Box<[u8]>>,
    pub storage: Vec<StorageRequest>,
}

impl Response {
    pub fn is_empty(&self) -> bool {
        self.screen.is_none() && self.sound.is_none() && self.storage.is_empty()
    }
}
