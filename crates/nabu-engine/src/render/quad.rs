use bytemuck::{Pod, Zeroable};

/// Number of vertices drawn per frame (two triangles).
pub const QUAD_VERTEX_COUNT: u32 = 6;

/// Interleaved vertex: `[pos_x, pos_y, uv_u, uv_v]`.
///
/// Position is in pixels (top-left origin, +Y down), UV spans (0,0)-(1,1).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x2, // position
        1 => Float32x2  // uv
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Size in bytes of one frame's vertex data.
pub const QUAD_BYTES: u64 = (std::mem::size_of::<QuadVertex>() * QUAD_VERTEX_COUNT as usize) as u64;

/// Vertices of the rectangle (0,0)-(width,height).
pub fn quad_vertices(width: u32, height: u32) -> [QuadVertex; QUAD_VERTEX_COUNT as usize] {
    let (w, h) = (width as f32, height as f32);
    let v = |x: f32, y: f32, u: f32, t: f32| QuadVertex {
        pos: [x, y],
        uv: [u, t],
    };

    [
        v(0.0, 0.0, 0.0, 0.0),
        v(0.0, h, 0.0, 1.0),
        v(w, 0.0, 1.0, 0.0),
        v(0.0, h, 0.0, 1.0),
        v(w, h, 1.0, 1.0),
        v(w, 0.0, 1.0, 0.0),
    ]
}
