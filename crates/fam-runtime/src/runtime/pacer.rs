use std::time::{Duration, Instant};

use fam_core::MAX_SKIP_FRAMES;
use tracing::debug;

use super::types::FRAME_DURATION_NTSC;

/// Wall-clock frame scheduler. When the host falls behind it asks for
/// skip-frames instead of drawing every late frame.
#[derive(Debug, Clone)]
pub struct FramePacer {
    frame_duration: Duration,
    next_deadline: Option<Instant>,
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::new(FRAME_DURATION_NTSC)
    }
}

impl FramePacer {
    pub fn new(frame_duration: Duration) -> Self {
        Self {
            frame_duration,
            next_deadline: None,
        }
    }

    pub fn frame_duration(&self) -> Duration {
        self.frame_duration
    }

    /// Time left until the next frame is due.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.next_deadline
            .map_or(Duration::ZERO, |deadline| deadline.saturating_duration_since(now))
    }

    /// Consumes the frame due at `now` and returns how many skip-frames to
    /// run before it. Falling further behind than the core's skip cap
    /// re-anchors the schedule at `now`.
    pub fn plan(&mut self, now: Instant) -> u32 {
        let deadline = *self.next_deadline.get_or_insert(now);
        if now <= deadline || self.frame_duration.is_zero() {
            self.next_deadline = Some(deadline + self.frame_duration);
            return 0;
        }

        let late = (now - deadline).as_nanos() / self.frame_duration.as_nanos();
        let late = u32::try_from(late).unwrap_or(u32::MAX);
        if late > MAX_SKIP_FRAMES {
            debug!(late, "frame pacer re-anchored");
            self.next_deadline = Some(now + self.frame_duration);
            return MAX_SKIP_FRAMES;
        }
        self.next_deadline = Some(deadline + self.frame_duration * (late + 1));
        late
    }

    /// Forgets the schedule; the next `plan` starts a new one.
    pub fn reset(&mut self) {
        self.next_deadline = None;
    }
}
