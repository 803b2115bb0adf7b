//! Heightfield texel storage and grid regions.
//!
//! The noise pass writes one RGBA8 texel per grid cell: RGB holds the surface
//! normal remapped to [0,1], A holds the wave height in [0,1]. Grid coordinates
//! are `(x, z)` with `z` running along texture rows.

mod sampler;

pub use sampler::{HeightfieldSampler, HeightfieldSource};

use glam::{IVec2, Vec3};

/// One RGBA8 heightfield texel
pub type Texel = [u8; 4];

/// Axis-aligned rectangle of texels inside a square heightfield
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridRect {
    pub x: u32,
    pub z: u32,
    pub width: u32,
    pub height: u32,
}

impl GridRect {
    /// The whole `resolution` x `resolution` grid
    pub fn full(resolution: u32) -> Self {
        Self {
            x: 0,
            z: 0,
            width: resolution,
            height: resolution,
        }
    }

    /// Smallest rectangle covering `points` grown by `margin` texels, clipped
    /// to the grid. `None` when nothing of it lies inside the grid.
    pub fn covering(points: &[IVec2], margin: u32, resolution: u32) -> Option<Self> {
        let first = *points.first()?;
        let (min, max) = points
            .iter()
            .fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p)));

        let margin = margin as i32;
        let last = resolution as i32 - 1;
        let lo = (min - IVec2::splat(margin)).max(IVec2::ZERO);
        let hi = (max + IVec2::splat(margin)).min(IVec2::splat(last));
        if resolution == 0 || lo.x > hi.x || lo.y > hi.y {
            return None;
        }

        Some(Self {
            x: lo.x as u32,
            z: lo.y as u32,
            width: (hi.x - lo.x + 1) as u32,
            height: (hi.y - lo.y + 1) as u32,
        })
    }

    pub fn contains(&self, p: IVec2) -> bool {
        p.x >= self.x as i32
            && p.y >= self.z as i32
            && p.x < (self.x + self.width) as i32
            && p.y < (self.z + self.height) as i32
    }

    pub fn texel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Overlap of two rectangles, if any
    pub fn intersect(&self, other: &GridRect) -> Option<GridRect> {
        let x0 = self.x.max(other.x);
        let z0 = self.z.max(other.z);
        let x1 = (self.x + self.width).min(other.x + other.width);
        let z1 = (self.z + self.height).min(other.z + other.height);
        (x0 < x1 && z0 < z1).then(|| GridRect {
            x: x0,
            z: z0,
            width: x1 - x0,
            height: z1 - z0,
        })
    }
}

/// A rectangle of heightfield texels in host memory
///
/// Only valid for the frame whose noise pass produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightfieldBuffer {
    resolution: u32,
    rect: GridRect,
    texels: Vec<Texel>,
}

impl HeightfieldBuffer {
    /// Wrap texels for `rect` (row-major, `rect.width` per row)
    pub fn new(resolution: u32, rect: GridRect, texels: Vec<Texel>) -> Self {
        debug_assert_eq!(texels.len(), rect.texel_count());
        Self {
            resolution,
            rect,
            texels,
        }
    }

    /// Wrap a complete `resolution` x `resolution` grid
    pub fn from_full(resolution: u32, texels: Vec<Texel>) -> Self {
        Self::new(resolution, GridRect::full(resolution), texels)
    }

    /// Side length of the full grid this region belongs to
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn rect(&self) -> GridRect {
        self.rect
    }

    pub fn texels(&self) -> &[Texel] {
        &self.texels
    }

    /// Texel at grid coordinate `p`, `None` outside this region
    pub fn texel(&self, p: IVec2) -> Option<Texel> {
        if !self.rect.contains(p) {
            return None;
        }
        let local_x = (p.x - self.rect.x as i32) as usize;
        let local_z = (p.y - self.rect.z as i32) as usize;
        self.texels
            .get(local_z * self.rect.width as usize + local_x)
            .copied()
    }

    /// Copy out the part of `rect` this region holds
    pub fn crop(&self, rect: GridRect) -> HeightfieldBuffer {
        let Some(rect) = self.rect.intersect(&rect) else {
            return HeightfieldBuffer::new(
                self.resolution,
                GridRect {
                    x: 0,
                    z: 0,
                    width: 0,
                    height: 0,
                },
                Vec::new(),
            );
        };

        let mut texels = Vec::with_capacity(rect.texel_count());
        for z in rect.z..rect.z + rect.height {
            let row_start = (z - self.rect.z) as usize * self.rect.width as usize
                + (rect.x - self.rect.x) as usize;
            texels.extend_from_slice(&self.texels[row_start..row_start + rect.width as usize]);
        }
        HeightfieldBuffer::new(self.resolution, rect, texels)
    }
}

/// Height (and optionally normal) at one grid cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightSample {
    pub x: i32,
    pub z: i32,
    pub height: f32,
    pub normal: Option<Vec3>,
}

/// Pack a unit normal and a [0,1] height into a texel
pub fn encode_texel(normal: Vec3, height: f32) -> Texel {
    let to_byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    let n = normal * 0.5 + Vec3::splat(0.5);
    [to_byte(n.x), to_byte(n.y), to_byte(n.z), to_byte(height)]
}

/// Unpack the normal stored in a texel's RGB channels
pub fn decode_normal(texel: Texel) -> Vec3 {
    let n = Vec3::new(texel[0] as f32, texel[1] as f32, texel[2] as f32) / 255.0;
    (n * 2.0 - Vec3::ONE).normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_covering_adds_margin_and_clips() {
        let points = [IVec2::new(10, 20), IVec2::new(14, 22)];
        let rect = GridRect::covering(&points, 1, 1024).unwrap();
        assert_eq!(
            rect,
            GridRect {
                x: 9,
                z: 19,
                width: 7,
                height: 5
            }
        );

        let edge = [IVec2::new(0, 0), IVec2::new(1023, 1023)];
        assert_eq!(GridRect::covering(&edge, 1, 1024), Some(GridRect::full(1024)));
    }

    #[test]
    fn test_covering_outside_grid_is_none() {
        let points = [IVec2::new(-10, -10), IVec2::new(-5, -4)];
        assert_eq!(GridRect::covering(&points, 1, 64), None);
        assert_eq!(GridRect::covering(&[], 1, 64), None);
    }

    #[test]
    fn test_crop_remaps_to_region_coordinates() {
        let resolution = 4;
        let texels: Vec<Texel> = (0..16).map(|i| [0, 0, 0, i as u8]).collect();
        let full = HeightfieldBuffer::from_full(resolution, texels);

        let rect = GridRect {
            x: 1,
            z: 2,
            width: 2,
            height: 2,
        };
        let region = full.crop(rect);
        assert_eq!(region.texels().len(), 4);
        assert_eq!(region.texel(IVec2::new(1, 2)), Some([0, 0, 0, 9]));
        assert_eq!(region.texel(IVec2::new(2, 3)), Some([0, 0, 0, 14]));
        assert_eq!(region.texel(IVec2::new(0, 0)), None);
    }

    #[test]
    fn test_texel_normal_encoding() {
        let texel = encode_texel(Vec3::Y, 1.0);
        assert_eq!(texel[3], 255);
        let normal = decode_normal(texel);
        assert!((normal - Vec3::Y).length() < 0.01);
    }
}
