//! Cartridge PRG RAM at `$6000-$7FFF` and the policy deciding when a
//! battery-backed copy is handed to the host for storage.

use tracing::debug;

use crate::{memory::cpu::PRG_RAM_SIZE, ram::PrgRam};

/// Frames without a write before a dirty buffer is flushed.
pub const IDLE_FLUSH_FRAMES: u32 = 60;
/// Frames of continuous writes after which a flush is forced anyway.
pub const FORCED_FLUSH_FRAMES: u32 = 600;

/// 8 KiB of PRG RAM with a write counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRam {
    data: PrgRam,
    dirty: u32,
}

impl Default for SaveRam {
    fn default() -> Self {
        Self::new()
    }
}

impl SaveRam {
    pub fn new() -> Self {
        Self {
            data: PrgRam::new(),
            dirty: 0,
        }
    }

    #[inline]
    pub fn read(&self, offset: usize) -> u8 {
        self.data.read(offset)
    }

    /// CPU write; bumps the dirty counter.
    #[inline]
    pub fn write(&mut self, offset: usize, value: u8) {
        self.data.write(offset, value);
        self.dirty = self.dirty.wrapping_add(1);
    }

    /// Copies `bytes` starting at `offset` without touching the counter.
    pub(crate) fn load_at(&mut self, offset: usize, bytes: &[u8]) {
        let start = offset.min(PRG_RAM_SIZE);
        let end = (start + bytes.len()).min(PRG_RAM_SIZE);
        self.data[start..end].copy_from_slice(&bytes[..end - start]);
    }

    /// Replaces the contents with a stored image. Short images are
    /// zero-filled, long ones truncated.
    pub fn load(&mut self, bytes: &[u8]) {
        self.data.clear();
        self.load_at(0, bytes);
    }

    pub fn dirty_counter(&self) -> u32 {
        self.dirty
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data[..]
    }
}

/// Tracks the dirty counter frame by frame and reports when to save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushPolicy {
    /// Counter value seen at the end of the previous frame.
    last_seen: u32,
    /// Counter value at the last flush.
    flushed: u32,
    idle_frames: u32,
    /// Frames since the buffer first went dirty after a flush.
    dirty_frames: u32,
}

impl FlushPolicy {
    /// Starts tracking from `counter` with nothing to flush.
    pub fn new(counter: u32) -> Self {
        Self {
            last_seen: counter,
            flushed: counter,
            idle_frames: 0,
            dirty_frames: 0,
        }
    }

    /// Called once per frame; returns `true` when the buffer should be saved.
    pub fn end_frame(&mut self, counter: u32) -> bool {
        if counter == self.flushed {
            self.mark_flushed(counter);
            return false;
        }

        self.dirty_frames += 1;
        if counter == self.last_seen {
            self.idle_frames += 1;
        } else {
            self.last_seen = counter;
            self.idle_frames = 0;
        }

        if self.idle_frames >= IDLE_FLUSH_FRAMES {
            debug!(frames = self.idle_frames, "flushing idle save");
        } else if self.dirty_frames >= FORCED_FLUSH_FRAMES {
            debug!(frames = self.dirty_frames, "forcing save flush");
        } else {
            return false;
        }
        self.mark_flushed(counter);
        true
    }

    /// Whether writes happened since the last flush.
    pub fn is_dirty(&self, counter: u32) -> bool {
        counter != self.flushed
    }

    pub fn mark_flushed(&mut self, counter: u32) {
        self.last_seen = counter;
        self.flushed = counter;
        self.idle_frames = 0;
        self.dirty_frames = 0;
    }
}
