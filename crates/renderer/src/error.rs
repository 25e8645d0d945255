//! Setup failures that abort a render session.

use std::fmt;

/// Pipeline stage a shader belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Anything that can go wrong while a session builds its GPU objects.
///
/// Every variant is terminal for the session: nothing is drawn and no retry
/// happens until the host starts a new session.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no GPU context available: {0}")]
    ContextUnavailable(String),
    #[error("failed to compile {stage} shader '{label}':\n{log}")]
    Compile {
        stage: ShaderStage,
        label: &'static str,
        log: String,
    },
    #[error("failed to link program '{label}':\n{log}")]
    Link { label: &'static str, log: String },
    #[error("failed to allocate {resource}: {log}")]
    ResourceAllocation { resource: &'static str, log: String },
}

/// Failure while producing a single frame.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    /// Reallocation after a resize failed; the session cannot continue.
    #[error(transparent)]
    Render(#[from] RenderError),
}
