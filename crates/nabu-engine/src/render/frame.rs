use crate::device::{Gpu, OffscreenSurface};
use crate::error::Result;
use crate::program::{Program, ProgramId};

use super::quad::{quad_vertices, QuadVertex, QUAD_BYTES, QUAD_VERTEX_COUNT};
use super::readback::Readback;

/// Per-frame orchestrator: clear, draw the quad, read the pixels back.
///
/// Owns the single shared vertex buffer, rewritten by every frame, and the
/// readback staging buffer. Also tracks the context-wide active program.
pub struct FrameRenderer {
    vertex_buffer: wgpu::Buffer,
    readback: Readback,
    active: Option<ProgramId>,
}

impl FrameRenderer {
    pub fn new(device: &wgpu::Device, surface: &OffscreenSurface) -> Self {
        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("nabu quad vbo"),
            size: QUAD_BYTES,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let (max_width, max_height) = surface.size();

        Self {
            vertex_buffer,
            readback: Readback::new(device, max_width, max_height),
            active: None,
        }
    }

    /// Marks `id` as the program used by subsequent frames.
    pub fn select(&mut self, id: ProgramId) {
        self.active = Some(id);
    }

    pub fn active(&self) -> Option<ProgramId> {
        self.active
    }

    /// Runs one clear-draw-readback cycle.
    ///
    /// Callers validate the frame size, the buffer length and the program's
    /// link status beforehand; `out` is exactly one frame long.
    pub(crate) fn render(
        &mut self,
        gpu: &Gpu,
        surface: &OffscreenSurface,
        program: &mut Program,
        clear: wgpu::Color,
        width: u32,
        height: u32,
        out: &mut [u8],
    ) -> Result<()> {
        let device = gpu.device();
        let queue = gpu.queue();

        program.flush_uniforms(queue);

        let vertices: [QuadVertex; QUAD_VERTEX_COUNT as usize] = quad_vertices(width, height);
        queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("nabu frame encoder"),
        });

        // Clear pass covers the whole surface, color and depth.
        {
            let _rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("nabu clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: surface.color_view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: surface.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        if let Some(pipeline) = program.pipeline() {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("nabu quad pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: surface.color_view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            // Clip space maps onto the frame rect, not the whole surface.
            rpass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);
            rpass.set_scissor_rect(0, 0, width, height);

            rpass.set_pipeline(pipeline);
            if let Some(bind_group) = program.bind_group() {
                rpass.set_bind_group(0, bind_group, &[]);
            }
            rpass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            rpass.draw(0..QUAD_VERTEX_COUNT, 0..1);
        }

        self.readback
            .encode_copy(&mut encoder, surface.color_texture(), width, height);

        let submission = queue.submit(std::iter::once(encoder.finish()));
        self.readback.read(device, submission, width, height, out)
    }
}
