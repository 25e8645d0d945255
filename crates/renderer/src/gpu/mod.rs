//! GPU side of the two-pass pipeline.
//!
//! - `context` owns wgpu instance/device/surface wiring and reconfigures the
//!   swapchain when the window resizes.
//! - `pipeline` links the color and noise programs against one shared vertex
//!   module.
//! - `resources` allocates the quad, the offscreen target and its sampler.
//! - `uniforms` holds the std140 records and the per-frame upload slots.
//! - `scope` turns wgpu's asynchronous validation errors into results.
//! - `state` glues everything together and exposes the `GpuState` API used by
//!   `session`.

mod context;
#[cfg(test)]
pub(crate) mod headless;
mod pipeline;
mod resources;
pub(crate) mod scope;
mod state;
mod uniforms;

pub(crate) use state::GpuState;
pub(crate) use uniforms::{ColorUniforms, NoiseUniforms};
