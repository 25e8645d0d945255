//! Renderer crate for warpgrad.
//!
//! Draws an animated, pointer-reactive gradient with two chained passes: a
//! color pass renders the warped, border-aware gradient into an offscreen
//! texture, and a noise pass samples that texture and writes grain-covered
//! pixels to the window surface. The overall flow is:
//!
//! ```text
//!   CLI / warpgrad
//!          │ RendererConfig, config updates
//!          ▼
//!   Renderer::run ──▶ winit event loop ──▶ InputHandle ──▶ SessionInput
//!                            │                                  │
//!                            └─▶ RedrawRequested ──▶ RenderSession::tick()
//!                                                     ├─▶ color pass ─▶ offscreen
//!                                                     └─▶ noise pass ─▶ surface
//! ```
//!
//! A `RenderSession` owns every GPU object of one epoch and records each of
//! them in a release ledger. Configuration and pointer changes only rewrite
//! uniforms; programs are compiled and linked once, when a session starts.
//! `field` evaluates the same math on the CPU for still exports and tests.

mod compile;
mod error;
pub mod field;
mod gpu;
mod lifecycle;
mod pointer;
mod resize;
mod runtime;
mod session;
mod timeline;
mod types;
mod window;

use anyhow::Result;
use crossbeam_channel::Receiver;

pub use error::{FrameError, RenderError, ShaderStage};
pub use gradientconfig::{RenderConfiguration, Rgb};
pub use lifecycle::{Lifecycle, ResourceId, ResourceKind};
pub use pointer::{
    normalize_pointer, PointerEvent, PointerTracker, PRESS_OFFSET, PRESS_RAMP, SMOOTHING_FACTOR,
};
pub use resize::ResizeSynchronizer;
pub use runtime::{FrameScheduler, SchedulerState};
pub use session::{
    input_channel, DrainedInput, InputHandle, RenderSession, SessionEvent, SessionInput,
    TickOutcome,
};
pub use timeline::{ease_in_out, Ramp};
pub use types::{GpuPowerPreference, RendererConfig, SurfaceSize};

/// Entry point that opens a window and renders until it closes.
pub struct Renderer {
    config: RendererConfig,
    updates: Option<Receiver<RenderConfiguration>>,
}

impl Renderer {
    /// Constructs a renderer with the supplied configuration.
    pub fn new(config: RendererConfig) -> Self {
        Self {
            config,
            updates: None,
        }
    }

    /// Whole configurations received here are applied between frames as
    /// uniform updates.
    pub fn with_configuration_updates(mut self, updates: Receiver<RenderConfiguration>) -> Self {
        self.updates = Some(updates);
        self
    }

    /// Runs the window event loop on the calling thread.
    pub fn run(self) -> Result<()> {
        window::run(self.config, self.updates)
    }
}
