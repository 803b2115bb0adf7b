//! Bounded heightfield read-back and height/normal queries.

use glam::{IVec2, Vec3};

use super::{GridRect, HeightSample, HeightfieldBuffer};
use crate::error::RenderError;

/// Anything that can hand back a rectangle of the current frame's heightfield
///
/// Implemented by the GPU read-back path and by in-memory buffers.
pub trait HeightfieldSource {
    /// Side length of the full heightfield (texels)
    fn resolution(&self) -> u32;

    /// Copy `rect` of the current heightfield into host memory
    fn read_region(&mut self, rect: GridRect) -> Result<HeightfieldBuffer, RenderError>;
}

impl HeightfieldSource for HeightfieldBuffer {
    fn resolution(&self) -> u32 {
        HeightfieldBuffer::resolution(self)
    }

    fn read_region(&mut self, rect: GridRect) -> Result<HeightfieldBuffer, RenderError> {
        Ok(self.crop(rect))
    }
}

/// Height queries over one bounded read-back
///
/// Built once per frame from the set of grid points the frame needs. Queries
/// outside the read-back rectangle return 0.
#[derive(Debug, Clone)]
pub struct HeightfieldSampler {
    region: Option<HeightfieldBuffer>,
    wave_height: f32,
}

impl HeightfieldSampler {
    /// Margin around the query points; covers the forward differences in `normal`
    pub const MARGIN: u32 = 1;

    /// Read the smallest rectangle covering `queries` from `source`
    ///
    /// Issues at most one `read_region` call, none when every query lies
    /// outside the heightfield.
    pub fn read<S: HeightfieldSource + ?Sized>(
        source: &mut S,
        queries: &[IVec2],
        wave_height: f32,
    ) -> Result<Self, RenderError> {
        let region = match GridRect::covering(queries, Self::MARGIN, source.resolution()) {
            Some(rect) => Some(source.read_region(rect)?),
            None => None,
        };
        Ok(Self {
            region,
            wave_height,
        })
    }

    /// Wrap an already-read region
    pub fn from_buffer(buffer: HeightfieldBuffer, wave_height: f32) -> Self {
        Self {
            region: Some(buffer),
            wave_height,
        }
    }

    /// The rectangle that was read back
    pub fn region(&self) -> Option<GridRect> {
        self.region.as_ref().map(HeightfieldBuffer::rect)
    }

    pub fn wave_height(&self) -> f32 {
        self.wave_height
    }

    /// `alpha / 255 * wave_height`, 0 outside the read-back rectangle
    pub fn height(&self, p: IVec2) -> f32 {
        self.region
            .as_ref()
            .and_then(|region| region.texel(p))
            .map_or(0.0, |texel| texel[3] as f32 / 255.0 * self.wave_height)
    }

    /// Surface normal from forward differences of neighbouring heights
    pub fn normal(&self, p: IVec2) -> Vec3 {
        let here = self.height(p);
        let dx = self.height(p + IVec2::X) - here;
        let dz = self.height(p + IVec2::Y) - here;
        Vec3::new(-dx, 2.0, dz).normalize()
    }

    /// Height at `p`, with a normal when both forward neighbours were read back
    pub fn sample(&self, p: IVec2) -> HeightSample {
        let has_neighbours = self.region.as_ref().is_some_and(|region| {
            let rect = region.rect();
            rect.contains(p) && rect.contains(p + IVec2::X) && rect.contains(p + IVec2::Y)
        });
        HeightSample {
            x: p.x,
            z: p.y,
            height: self.height(p),
            normal: has_neighbours.then(|| self.normal(p)),
        }
    }
}
