use std::time::{Duration, Instant};

use crate::timeline::Ramp;
use crate::types::SurfaceSize;

/// Fraction of the remaining distance covered per tick.
pub const SMOOTHING_FACTOR: f32 = 0.1;
/// Length of the press/release ease.
pub const PRESS_RAMP: Duration = Duration::from_millis(200);
/// Diagonal offset applied at full press.
pub const PRESS_OFFSET: f32 = 0.4;

/// Pointer notifications delivered to a session.
///
/// Positions are already normalized to `[-1, 1]` per axis with `y` growing
/// downward, matching window coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Moved { x: f32, y: f32 },
    Pressed,
    Released,
}

/// Maps a physical cursor position onto `[-1, 1]²`, each axis against its own extent.
pub fn normalize_pointer(x: f64, y: f64, size: SurfaceSize) -> (f32, f32) {
    let width = f64::from(size.width.max(1));
    let height = f64::from(size.height.max(1));
    let nx = (x / width) * 2.0 - 1.0;
    let ny = (y / height) * 2.0 - 1.0;
    (nx.clamp(-1.0, 1.0) as f32, ny.clamp(-1.0, 1.0) as f32)
}

/// Smoothed pointer position plus the eased press offset.
#[derive(Debug, Clone)]
pub struct PointerTracker {
    target: [f32; 2],
    smoothed: [f32; 2],
    pressed: bool,
    press_progress: f32,
    ramp: Option<Ramp>,
}

impl Default for PointerTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PointerTracker {
    pub fn new() -> Self {
        Self {
            target: [0.0, 0.0],
            smoothed: [0.0, 0.0],
            pressed: false,
            press_progress: 0.0,
            ramp: None,
        }
    }

    /// A tracker that has fully settled at `(x, y)`, as after many ticks
    /// without new input.
    pub fn at_rest(x: f32, y: f32, pressed: bool) -> Self {
        let position = [x.clamp(-1.0, 1.0), y.clamp(-1.0, 1.0)];
        Self {
            target: position,
            smoothed: position,
            pressed,
            press_progress: if pressed { 1.0 } else { 0.0 },
            ramp: None,
        }
    }

    pub fn smoothed(&self) -> [f32; 2] {
        self.smoothed
    }

    pub fn press_progress(&self) -> f32 {
        self.press_progress
    }

    /// Applies one input event. Press state changes restart the ramp from the
    /// current progress, so a release mid-press eases back from where it was.
    pub fn apply(&mut self, event: PointerEvent, now: Instant) {
        match event {
            PointerEvent::Moved { x, y } => {
                self.target = [x.clamp(-1.0, 1.0), y.clamp(-1.0, 1.0)];
            }
            PointerEvent::Pressed => self.set_pressed(true, now),
            PointerEvent::Released => self.set_pressed(false, now),
        }
    }

    fn set_pressed(&mut self, pressed: bool, now: Instant) {
        if self.pressed == pressed {
            return;
        }
        self.pressed = pressed;
        let to = if pressed { 1.0 } else { 0.0 };
        self.ramp = Some(Ramp::new(self.press_progress, to, PRESS_RAMP, now));
    }

    /// Per-tick update: one smoothing step, then the press ramp sampled at `now`.
    pub fn advance(&mut self, now: Instant) {
        for axis in 0..2 {
            let delta = self.target[axis] - self.smoothed[axis];
            self.smoothed[axis] += delta * SMOOTHING_FACTOR;
        }

        if let Some(ramp) = self.ramp {
            let (value, finished) = ramp.sample(now);
            self.press_progress = value.clamp(0.0, 1.0);
            if finished {
                self.press_progress = ramp.target();
                self.ramp = None;
            }
        }
    }

    /// Pointer value handed to the color pass. The `y` axis flips from
    /// window-down to shader-up.
    pub fn color_pass_position(&self) -> [f32; 2] {
        let offset = self.press_progress * PRESS_OFFSET;
        [self.smoothed[0] + offset, -(self.smoothed[1] + offset)]
    }
}
