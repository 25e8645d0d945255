use std::time::Instant;

/// Lifecycle of the per-refresh callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Setup has not finished yet; no tick may run.
    Idle,
    /// Both programs linked and resources allocated; ticks run once per refresh.
    Running,
    /// Disposed; no further ticks are scheduled.
    Disposed,
}

/// Gatekeeper for the frame loop.
///
/// The scheduler does not own a timer. The host calls [`begin_tick`] from its
/// redraw callback and only proceeds when the scheduler is running, which
/// keeps cancellation confined to the gaps between ticks.
///
/// [`begin_tick`]: FrameScheduler::begin_tick
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    state: SchedulerState,
    started_at: Option<Instant>,
    frames: u64,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self {
            state: SchedulerState::Idle,
            started_at: None,
            frames: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    /// Number of ticks started since [`start`](Self::start).
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Moves Idle → Running. Returns `false` from any other state.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.state != SchedulerState::Idle {
            return false;
        }
        self.state = SchedulerState::Running;
        self.started_at = Some(now);
        true
    }

    /// Claims the next tick. Returns `false` once disposed or before start.
    pub fn begin_tick(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.frames = self.frames.saturating_add(1);
        true
    }

    /// Stops scheduling. Returns `true` only for the call that performed the
    /// transition; later calls are no-ops.
    pub fn dispose(&mut self) -> bool {
        if self.state == SchedulerState::Disposed {
            return false;
        }
        self.state = SchedulerState::Disposed;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_scheduler_refuses_ticks() {
        let mut scheduler = FrameScheduler::new();
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert!(!scheduler.begin_tick());
        assert_eq!(scheduler.frames(), 0);
    }

    #[test]
    fn running_scheduler_counts_ticks() {
        let mut scheduler = FrameScheduler::new();
        assert!(scheduler.start(Instant::now()));
        assert!(scheduler.begin_tick());
        assert!(scheduler.begin_tick());
        assert_eq!(scheduler.frames(), 2);
        assert!(scheduler.started_at().is_some());
    }

    #[test]
    fn start_only_from_idle() {
        let mut scheduler = FrameScheduler::new();
        assert!(scheduler.start(Instant::now()));
        assert!(!scheduler.start(Instant::now()));
        scheduler.dispose();
        assert!(!scheduler.start(Instant::now()));
        assert_eq!(scheduler.state(), SchedulerState::Disposed);
    }

    #[test]
    fn dispose_is_idempotent_and_stops_ticks() {
        let mut scheduler = FrameScheduler::new();
        scheduler.start(Instant::now());
        assert!(scheduler.dispose());
        assert!(!scheduler.dispose());
        assert!(!scheduler.begin_tick());
        assert_eq!(scheduler.state(), SchedulerState::Disposed);
    }

    #[test]
    fn dispose_before_start_is_allowed() {
        let mut scheduler = FrameScheduler::new();
        assert!(scheduler.dispose());
        assert!(!scheduler.begin_tick());
    }
}
