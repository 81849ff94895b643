//! Frame rendering.
//!
//! Every frame is a full cycle on the off-screen surface:
//! - clear color and depth
//! - rewrite the shared vertex buffer with the (0,0)-(width,height) quad
//! - draw 6 vertices with the active program
//! - copy the frame rect back into host memory as BGRA bytes
//!
//! Convention:
//! - vertex positions are in pixels (top-left origin, +Y down)
//! - the viewport covers exactly the frame rect, so clip space maps onto it
//! - readback rows are top to bottom

mod frame;
mod quad;
mod readback;

pub use frame::FrameRenderer;
pub use quad::{quad_vertices, QuadVertex, QUAD_BYTES, QUAD_VERTEX_COUNT};
pub use readback::{frame_len, BYTES_PER_PIXEL};
