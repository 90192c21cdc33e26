use std::cell::Cell;
use std::time::Instant;

/// Something that can invoke the frame callback once more, at the next
/// display refresh. On desktop this is `Window::request_redraw`.
pub trait FrameScheduler {
    fn request_frame(&self);
}

/// Where the loop is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Not started.
    Idle,
    /// A frame callback is pending.
    Scheduled,
    /// Inside the frame callback.
    Rendering,
    /// Stop was requested; no further frames are scheduled.
    Stopped,
}

/// Timing handed to each rendered frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Zero-based index of this frame.
    pub frame: u64,
    /// Seconds since the loop started.
    pub elapsed: f32,
    /// Seconds since the previous frame began (zero on the first frame).
    pub delta: f32,
}

/// Self-rescheduling render loop.
///
/// `start` schedules the first frame; every `end_frame` schedules the next
/// one, so once started the loop keeps running without outside help until
/// `stop` is called.
#[derive(Debug)]
pub struct FrameLoop {
    state: LoopState,
    started_at: Option<Instant>,
    last_frame: Option<Instant>,
    frames: u64,
    stop_requested: bool,
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameLoop {
    pub fn new() -> Self {
        Self {
            state: LoopState::Idle,
            started_at: None,
            last_frame: None,
            frames: 0,
            stop_requested: false,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// Idle → Scheduled. Returns false if the loop was already started.
    pub fn start(&mut self, scheduler: &impl FrameScheduler) -> bool {
        if self.state != LoopState::Idle {
            return false;
        }
        self.started_at = Some(Instant::now());
        self.state = LoopState::Scheduled;
        scheduler.request_frame();
        tracing::debug!("frame loop started");
        true
    }

    /// Scheduled → Rendering. A callback that arrives in any other state
    /// (spurious redraw before start, or after stop) yields `None`.
    pub fn begin_frame(&mut self) -> Option<FrameTime> {
        if self.state != LoopState::Scheduled {
            return None;
        }
        let now = Instant::now();
        let started = *self.started_at.get_or_insert(now);
        let delta = self
            .last_frame
            .map(|last| (now - last).as_secs_f32())
            .unwrap_or(0.0);
        self.last_frame = Some(now);
        self.state = LoopState::Rendering;
        Some(FrameTime {
            frame: self.frames,
            elapsed: (now - started).as_secs_f32(),
            delta,
        })
    }

    /// Rendering → Scheduled (requesting the next frame), or → Stopped if a
    /// stop was requested meanwhile.
    pub fn end_frame(&mut self, scheduler: &impl FrameScheduler) {
        if self.state != LoopState::Rendering {
            return;
        }
        self.frames += 1;
        if self.stop_requested {
            self.state = LoopState::Stopped;
            tracing::debug!("frame loop stopped after {} frames", self.frames);
        } else {
            self.state = LoopState::Scheduled;
            scheduler.request_frame();
        }
    }

    /// Stop rescheduling. Takes effect at the end of the current frame, or
    /// immediately when no frame is in flight.
    pub fn stop(&mut self) {
        self.stop_requested = true;
        if self.state != LoopState::Rendering {
            self.state = LoopState::Stopped;
        }
    }
}

/// Scheduler that records requests for a caller to pump, for headless
/// runs and tests.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    pending: Cell<u32>,
    total: Cell<u64>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one pending request, if any.
    pub fn take_request(&self) -> bool {
        let pending = self.pending.get();
        if pending == 0 {
            return false;
        }
        self.pending.set(pending - 1);
        true
    }

    pub fn pending(&self) -> u32 {
        self.pending.get()
    }

    pub fn total_requests(&self) -> u64 {
        self.total.get()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&self) {
        self.pending.set(self.pending.get() + 1);
        self.total.set(self.total.get() + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_schedules_one_frame() {
        let scheduler = ManualScheduler::new();
        let mut frame_loop = FrameLoop::new();
        assert_eq!(frame_loop.state(), LoopState::Idle);
        assert!(frame_loop.start(&scheduler));
        assert_eq!(frame_loop.state(), LoopState::Scheduled);
        assert_eq!(scheduler.pending(), 1);
        assert!(!frame_loop.start(&scheduler));
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn loop_sustains_itself() {
        let scheduler = ManualScheduler::new();
        let mut frame_loop = FrameLoop::new();
        frame_loop.start(&scheduler);

        // Act as the platform: only fire callbacks the loop asked for.
        let mut seen = Vec::new();
        while seen.len() < 120 && scheduler.take_request() {
            let time = frame_loop.begin_frame().unwrap();
            assert_eq!(frame_loop.state(), LoopState::Rendering);
            seen.push(time.frame);
            frame_loop.end_frame(&scheduler);
        }
        assert_eq!(seen, (0..120).collect::<Vec<u64>>());
        assert_eq!(frame_loop.frames_rendered(), 120);
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn elapsed_time_is_monotonic() {
        let scheduler = ManualScheduler::new();
        let mut frame_loop = FrameLoop::new();
        frame_loop.start(&scheduler);
        let mut last = -1.0f32;
        for i in 0..5 {
            scheduler.take_request();
            let time = frame_loop.begin_frame().unwrap();
            assert!(time.elapsed >= last);
            if i == 0 {
                assert_eq!(time.delta, 0.0);
            }
            last = time.elapsed;
            frame_loop.end_frame(&scheduler);
        }
    }

    #[test]
    fn callbacks_outside_scheduled_are_ignored() {
        let scheduler = ManualScheduler::new();
        let mut frame_loop = FrameLoop::new();
        assert!(frame_loop.begin_frame().is_none());
        frame_loop.start(&scheduler);
        assert!(frame_loop.begin_frame().is_some());
        assert!(frame_loop.begin_frame().is_none());
    }

    #[test]
    fn stop_during_frame_ends_the_loop() {
        let scheduler = ManualScheduler::new();
        let mut frame_loop = FrameLoop::new();
        frame_loop.start(&scheduler);
        scheduler.take_request();
        frame_loop.begin_frame();
        frame_loop.stop();
        assert_eq!(frame_loop.state(), LoopState::Rendering);
        frame_loop.end_frame(&scheduler);
        assert_eq!(frame_loop.state(), LoopState::Stopped);
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(frame_loop.frames_rendered(), 1);
    }

    #[test]
    fn stop_while_scheduled_drops_pending_frame() {
        let scheduler = ManualScheduler::new();
        let mut frame_loop = FrameLoop::new();
        frame_loop.start(&scheduler);
        frame_loop.stop();
        assert_eq!(frame_loop.state(), LoopState::Stopped);
        assert!(scheduler.take_request());
        assert!(frame_loop.begin_frame().is_none());
        assert_eq!(scheduler.total_requests(), 1);
    }
}
