use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use crossbeam_channel::Receiver;
use gradientconfig::RenderConfiguration;
use tracing::{debug, error, info, warn};
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

use crate::error::{FrameError, RenderError};
use crate::pointer::{normalize_pointer, PointerEvent};
use crate::session::{input_channel, InputHandle, RenderSession};
use crate::types::{RendererConfig, SurfaceSize};

/// Owns the window and the current session epoch.
struct WindowHost {
    session: Option<RenderSession>,
    input: Option<InputHandle>,
    window: Arc<Window>,
    config: RendererConfig,
    configuration: RenderConfiguration,
    epoch: u64,
}

impl WindowHost {
    fn new(window: Arc<Window>, config: RendererConfig) -> Self {
        let configuration = config.configuration.clone();
        Self {
            session: None,
            input: None,
            window,
            config,
            configuration,
            epoch: 0,
        }
    }

    fn displayed_size(&self) -> SurfaceSize {
        SurfaceSize::from(self.window.inner_size())
    }

    /// Tears down the current epoch, then builds a new one.
    fn start_session(&mut self) -> Result<(), RenderError> {
        self.end_session();
        let (handle, input) = input_channel();
        let session = RenderSession::start(
            self.window.as_ref(),
            self.displayed_size(),
            self.configuration.clone(),
            input,
            self.config.gpu_power,
        )?;
        self.epoch += 1;
        info!(epoch = self.epoch, size = %session.size(), "render session started");
        self.session = Some(session);
        self.input = Some(handle);
        Ok(())
    }

    fn end_session(&mut self) {
        self.input = None;
        if let Some(mut session) = self.session.take() {
            session.teardown();
            debug!(epoch = self.epoch, "render session ended");
        }
    }

    fn send_pointer(&self, event: PointerEvent) {
        if let Some(input) = &self.input {
            input.pointer(event);
        }
    }

    fn apply_configuration(&mut self, configuration: RenderConfiguration) {
        for field in configuration.out_of_range_fields() {
            warn!(%field, "configuration value outside the control range");
        }
        self.configuration = configuration.clone();
        if let Some(input) = &self.input {
            input.configure(configuration);
        }
    }
}

impl Drop for WindowHost {
    fn drop(&mut self) {
        // The surface borrows the window's native handles.
        self.end_session();
    }
}

/// Opens the window and drives sessions until it closes.
pub(crate) fn run(
    config: RendererConfig,
    updates: Option<Receiver<RenderConfiguration>>,
) -> Result<()> {
    let event_loop =
        EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let window = WindowBuilder::new()
        .with_title(config.title.clone())
        .with_inner_size(winit::dpi::PhysicalSize::<u32>::from(config.surface_size))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = Arc::new(window);

    let mut host = WindowHost::new(window, config);
    host.start_session()
        .map_err(|err| anyhow!("failed to initialise renderer: {err}"))?;
    host.window.request_redraw();

    let mut failure: Option<anyhow::Error> = None;
    let run_result = event_loop.run(|event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == host.window.id() => match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                host.end_session();
                elwt.exit();
            }
            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = normalize_pointer(position.x, position.y, host.displayed_size());
                host.send_pointer(PointerEvent::Moved { x, y });
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let event = match state {
                    ElementState::Pressed => PointerEvent::Pressed,
                    ElementState::Released => PointerEvent::Released,
                };
                host.send_pointer(event);
            }
            WindowEvent::Resized(new_size) => {
                if let Some(input) = &host.input {
                    input.resized(SurfaceSize::from(new_size));
                }
                host.window.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                let Some(session) = host.session.as_mut() else {
                    return;
                };
                match session.tick(Instant::now()) {
                    Ok(_) => {}
                    Err(FrameError::Surface(
                        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated,
                    )) => {
                        session.reconfigure_surface();
                    }
                    Err(FrameError::Surface(wgpu::SurfaceError::Timeout)) => {
                        warn!("surface timeout; retrying next frame");
                    }
                    Err(FrameError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                        error!("surface out of memory; closing");
                        failure = Some(anyhow!("surface out of memory"));
                        host.end_session();
                        elwt.exit();
                    }
                    Err(FrameError::Surface(other)) => {
                        warn!(error = ?other, "surface error; retrying next frame");
                    }
                    Err(FrameError::Render(err)) => {
                        error!(error = %err, "render session failed");
                        failure = Some(anyhow!(err));
                        host.end_session();
                        elwt.exit();
                    }
                }
            }
            _ => {}
        },
        Event::Suspended => {
            host.end_session();
        }
        Event::Resumed => {
            if host.session.is_none() {
                if let Err(err) = host.start_session() {
                    error!(error = %err, "failed to restart render session");
                    failure = Some(anyhow!(err));
                    elwt.exit();
                }
            }
        }
        Event::AboutToWait => {
            if let Some(updates) = &updates {
                let latest = updates.try_iter().last();
                if let Some(configuration) = latest {
                    debug!("applying configuration update");
                    host.apply_configuration(configuration);
                }
            }
            if host.session.is_some() {
                host.window.request_redraw();
            }
            elwt.set_control_flow(ControlFlow::Wait);
        }
        _ => {}
    });

    host.end_session();
    if let Err(err) = run_result {
        return Err(anyhow!("window event loop error: {err}"));
    }
    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
