use std::sync::mpsc;

use crate::error::{RenderError, Result};

/// Bytes per BGRA pixel.
pub const BYTES_PER_PIXEL: u32 = 4;

/// Number of bytes a `width` x `height` frame occupies in the caller's buffer.
pub fn frame_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * BYTES_PER_PIXEL as usize
}

/// Row pitch of the staging buffer; wgpu requires 256-byte aligned rows.
pub(crate) fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * BYTES_PER_PIXEL;
    unpadded.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT) * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT
}

/// Copies `height` tightly packed rows out of a padded staging image.
pub(crate) fn unpad_rows(src: &[u8], padded_row: usize, width: u32, height: u32, dst: &mut [u8]) {
    let row = (width * BYTES_PER_PIXEL) as usize;
    for (out, padded) in dst
        .chunks_exact_mut(row)
        .zip(src.chunks(padded_row))
        .take(height as usize)
    {
        out.copy_from_slice(&padded[..row]);
    }
}

/// Unmaps the buffer when dropped.
struct Unmap<'a>(&'a wgpu::Buffer);

impl Drop for Unmap<'_> {
    fn drop(&mut self) {
        self.0.unmap();
    }
}

/// Staging buffer the color target is copied into before reaching the host.
///
/// Sized once for the largest frame the surface allows.
pub(crate) struct Readback {
    buffer: wgpu::Buffer,
}

impl Readback {
    pub(crate) fn new(device: &wgpu::Device, max_width: u32, max_height: u32) -> Self {
        let size = padded_bytes_per_row(max_width) as u64 * max_height as u64;
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("nabu readback buffer"),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        Self { buffer }
    }

    /// Records the copy of the `width` x `height` corner of `texture`.
    pub(crate) fn encode_copy(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        texture: &wgpu::Texture,
        width: u32,
        height: u32,
    ) {
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row(width)),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Waits for `submission` and copies the frame into `out`.
    ///
    /// `out` must hold exactly `frame_len(width, height)` bytes.
    pub(crate) fn read(
        &self,
        device: &wgpu::Device,
        submission: wgpu::SubmissionIndex,
        width: u32,
        height: u32,
        out: &mut [u8],
    ) -> Result<()> {
        let padded_row = padded_bytes_per_row(width) as u64;
        let slice = self.buffer.slice(..padded_row * height as u64);

        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        if let Err(err) = device.poll(wgpu::PollType::Wait {
            submission_index: Some(submission),
            timeout: None,
        }) {
            // Cancels the pending map request.
            self.buffer.unmap();
            return Err(err.into());
        }

        rx.recv().map_err(|_| RenderError::ReadbackAborted)??;

        let _unmap = Unmap(&self.buffer);
        let data = slice.get_mapped_range();
        unpad_rows(&data, padded_row as usize, width, height, out);
        log::trace!("read back {width}x{height} frame");
        Ok(())
    }
}
