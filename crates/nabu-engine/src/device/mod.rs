//! GPU device and off-screen surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue without a window
//! - allocating the hidden color and depth targets
//! - exposing the host-facing [`GraphicsContext`]

mod context;
mod gpu;
mod init;
mod surface;

pub use context::GraphicsContext;
pub use gpu::Gpu;
pub use init::{ContextConfig, DEFAULT_MAX_HEIGHT, DEFAULT_MAX_WIDTH};
pub use surface::{OffscreenSurface, DEPTH_FORMAT, SURFACE_FORMAT};
