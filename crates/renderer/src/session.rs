use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use crossbeam_channel::{unbounded, Receiver, Sender};
use gradientconfig::RenderConfiguration;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::error::{FrameError, RenderError};
use crate::gpu::{ColorUniforms, GpuState, NoiseUniforms};
use crate::lifecycle::{Lifecycle, ResourceKind};
use crate::pointer::{PointerEvent, PointerTracker};
use crate::resize::ResizeSynchronizer;
use crate::runtime::{FrameScheduler, SchedulerState};
use crate::types::{GpuPowerPreference, SurfaceSize};

/// Messages the host queues for the session between ticks.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Pointer(PointerEvent),
    Configure(RenderConfiguration),
    Resized(SurfaceSize),
}

/// Sending half of a session's input channel, held by the host.
#[derive(Debug, Clone)]
pub struct InputHandle {
    tx: Sender<SessionEvent>,
}

impl InputHandle {
    /// Queues an event. Returns `false` once the session has torn down its
    /// subscription.
    pub fn send(&self, event: SessionEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn pointer(&self, event: PointerEvent) -> bool {
        self.send(SessionEvent::Pointer(event))
    }

    pub fn configure(&self, configuration: RenderConfiguration) -> bool {
        self.send(SessionEvent::Configure(configuration))
    }

    pub fn resized(&self, size: SurfaceSize) -> bool {
        self.send(SessionEvent::Resized(size))
    }
}

/// Receiving half of a session's input channel.
#[derive(Debug)]
pub struct SessionInput {
    rx: Receiver<SessionEvent>,
}

/// Creates the explicit input channel injected into [`RenderSession::start`].
pub fn input_channel() -> (InputHandle, SessionInput) {
    let (tx, rx) = unbounded();
    (InputHandle { tx }, SessionInput { rx })
}

/// Everything queued since the previous tick.
#[derive(Debug, Default, PartialEq)]
pub struct DrainedInput {
    /// Pointer events in arrival order.
    pub pointer: Vec<PointerEvent>,
    /// Latest configuration; earlier ones are superseded.
    pub configuration: Option<RenderConfiguration>,
    /// Latest displayed size; earlier ones are superseded.
    pub resized: Option<SurfaceSize>,
}

impl SessionInput {
    pub fn drain(&self) -> DrainedInput {
        let mut drained = DrainedInput::default();
        for event in self.rx.try_iter() {
            match event {
                SessionEvent::Pointer(event) => drained.pointer.push(event),
                SessionEvent::Configure(configuration) => {
                    drained.configuration = Some(configuration)
                }
                SessionEvent::Resized(size) => drained.resized = Some(size),
            }
        }
        drained
    }
}

/// Records the input receiver as the session's first ledger entry; releasing
/// it unsubscribes every outstanding [`InputHandle`].
fn subscribe(input: SessionInput, lifecycle: &mut Lifecycle) -> Rc<RefCell<Option<SessionInput>>> {
    let input = Rc::new(RefCell::new(Some(input)));
    let subscription = input.clone();
    lifecycle.track(ResourceKind::Subscription, "session input", move || {
        subscription.borrow_mut().take();
    });
    input
}

/// Result of a successful [`RenderSession::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Presented,
    /// The scheduler is not running; nothing was drawn.
    Idle,
}

/// One epoch of rendering against a surface.
///
/// Starting a session compiles and links both programs and allocates every
/// GPU resource. Configuration changes afterwards only rewrite uniforms.
/// Rebuilding means tearing this session down and starting a new one.
pub struct RenderSession {
    gpu: Option<GpuState>,
    scheduler: FrameScheduler,
    pointer: PointerTracker,
    resize: ResizeSynchronizer,
    configuration: RenderConfiguration,
    input: Rc<RefCell<Option<SessionInput>>>,
    lifecycle: Lifecycle,
}

impl RenderSession {
    pub fn start<T>(
        target: &T,
        size: SurfaceSize,
        configuration: RenderConfiguration,
        input: SessionInput,
        gpu_power: GpuPowerPreference,
    ) -> Result<Self, RenderError>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let mut lifecycle = Lifecycle::new();
        let input = subscribe(input, &mut lifecycle);

        // Dropping `lifecycle` on the error path releases whatever was created.
        let gpu = GpuState::new(target, size, gpu_power, &mut lifecycle).map_err(|err| {
            tracing::error!(error = %err, "render session setup failed");
            err
        })?;

        let backing = gpu.size();
        let session = Self::assemble(Some(gpu), backing, configuration, input, lifecycle);
        tracing::debug!(size = %backing, live = session.lifecycle.live(), "render session running");
        Ok(session)
    }

    fn assemble(
        gpu: Option<GpuState>,
        backing: SurfaceSize,
        configuration: RenderConfiguration,
        input: Rc<RefCell<Option<SessionInput>>>,
        lifecycle: Lifecycle,
    ) -> Self {
        let mut scheduler = FrameScheduler::new();
        scheduler.start(Instant::now());
        Self {
            gpu,
            scheduler,
            pointer: PointerTracker::new(),
            resize: ResizeSynchronizer::new(backing),
            configuration,
            input,
            lifecycle,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn configuration(&self) -> &RenderConfiguration {
        &self.configuration
    }

    pub fn pointer(&self) -> &PointerTracker {
        &self.pointer
    }

    pub fn size(&self) -> SurfaceSize {
        self.resize.backing()
    }

    /// Re-applies the surface configuration after it was lost or outdated.
    pub fn reconfigure_surface(&mut self) {
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.reconfigure();
        }
    }

    /// Runs one frame: apply queued input, reconcile size, advance the
    /// pointer, then draw the color and noise passes.
    pub fn tick(&mut self, now: Instant) -> Result<TickOutcome, FrameError> {
        if !self.scheduler.begin_tick() {
            return Ok(TickOutcome::Idle);
        }
        let Some(gpu) = self.gpu.as_mut() else {
            return Ok(TickOutcome::Idle);
        };

        let drained = match self.input.borrow().as_ref() {
            Some(input) => input.drain(),
            None => DrainedInput::default(),
        };
        for event in drained.pointer {
            self.pointer.apply(event, now);
        }
        if let Some(configuration) = drained.configuration {
            self.configuration = configuration;
        }
        if let Some(displayed) = drained.resized {
            if let Some(size) = self.resize.reconcile(displayed) {
                gpu.resize(size, &mut self.lifecycle)?;
            }
        }

        self.pointer.advance(now);

        let color = ColorUniforms::new(
            &self.configuration,
            self.pointer.color_pass_position(),
            gpu.size(),
        );
        let noise = NoiseUniforms::new(&self.configuration);
        gpu.render(&color, &noise)?;
        Ok(TickOutcome::Presented)
    }

    /// Stops the frame loop and releases every resource and subscription.
    /// Safe to call more than once.
    pub fn teardown(&mut self) {
        let first = self.scheduler.dispose();
        let released = self.lifecycle.release_all();
        self.gpu = None;
        if first {
            let uptime = self
                .scheduler
                .started_at()
                .map(|started| started.elapsed().as_secs_f32())
                .unwrap_or_default();
            tracing::debug!(
                released,
                frames = self.scheduler.frames(),
                uptime_secs = uptime,
                "render session torn down"
            );
        }
    }
}

impl Drop for RenderSession {
    fn drop(&mut self) {
        self.teardown();
    }
}
