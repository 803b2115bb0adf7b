//! Synchronous copy of a heightfield rectangle into host memory.

use std::sync::mpsc;

use crate::error::RenderError;
use crate::heightfield::{GridRect, HeightfieldBuffer, Texel};

const BYTES_PER_TEXEL: u32 = 4;

/// Row pitch for `width` RGBA8 texels, rounded up to the copy alignment
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * BYTES_PER_TEXEL;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Strip row padding from a mapped copy
pub fn unpad_rows(data: &[u8], width: u32, height: u32, padded_row: u32) -> Vec<Texel> {
    let row_bytes = (width * BYTES_PER_TEXEL) as usize;
    let mut texels = Vec::with_capacity((width * height) as usize);
    for row in data.chunks(padded_row as usize).take(height as usize) {
        texels.extend(
            row[..row_bytes]
                .chunks_exact(4)
                .map(|t| [t[0], t[1], t[2], t[3]]),
        );
    }
    texels
}

/// Whether a staging buffer of `capacity` bytes cannot hold `size`
fn needs_new_staging(capacity: Option<u64>, size: u64) -> bool {
    capacity.map_or(true, |capacity| capacity < size)
}

/// Reads rectangles of the heightfield texture back to the host
///
/// The staging buffer is sized for the largest rectangle seen so far and
/// reused across frames.
pub struct HeightfieldReadback {
    staging: Option<(wgpu::Buffer, u64)>,
}

impl HeightfieldReadback {
    pub fn new() -> Self {
        Self { staging: None }
    }

    fn staging_buffer(&mut self, device: &wgpu::Device, size: u64) -> &wgpu::Buffer {
        if needs_new_staging(self.staging.as_ref().map(|(_, capacity)| *capacity), size) {
            self.staging = None;
        }
        let (buffer, _) = self.staging.get_or_insert_with(|| {
            let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Heightfield Readback Buffer"),
                size,
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                mapped_at_creation: false,
            });
            (buffer, size)
        });
        buffer
    }

    /// Copy `rect` out of `texture` and block until it is mapped
    pub fn read(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        texture: &wgpu::Texture,
        rect: GridRect,
    ) -> Result<HeightfieldBuffer, RenderError> {
        let resolution = texture.width();
        let padded_row = padded_bytes_per_row(rect.width);
        let size = (padded_row * rect.height) as u64;
        let buffer = self.staging_buffer(device, size);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Heightfield Readback Encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: rect.x,
                    y: rect.z,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(rect.height),
                },
            },
            wgpu::Extent3d {
                width: rect.width,
                height: rect.height,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..size);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device.poll(wgpu::Maintain::Wait);

        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(RenderError::Readback(e.to_string())),
            Err(e) => return Err(RenderError::Readback(e.to_string())),
        }

        let texels = {
            let data = slice.get_mapped_range();
            unpad_rows(&data, rect.width, rect.height, padded_row)
        };
        buffer.unmap();

        Ok(HeightfieldBuffer::new(resolution, rect, texels))
    }
}

impl Default for HeightfieldReadback {
    fn default() -> Self {
        Self::new()
    }
}
