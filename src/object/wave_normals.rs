//! Tiling normal map for small-scale surface ripples.

use std::f64::consts::TAU;
use std::path::Path;

use glam::Vec3;
use noise::{NoiseFn, Perlin};

use crate::error::AssetError;

/// RGBA8 normal map, `xyz * 0.5 + 0.5` with z up
#[derive(Debug, Clone)]
pub struct WaveNormalMap {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl WaveNormalMap {
    pub const PROCEDURAL_SIZE: u32 = 256;

    /// Decode an image file; any format `image` understands
    pub fn load(path: &Path) -> Result<Self, AssetError> {
        let image = image::open(path)
            .map_err(|source| AssetError::Texture {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();

        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(AssetError::TextureSize {
                path: path.to_path_buf(),
                width,
                height,
            });
        }

        Ok(Self {
            width,
            height,
            rgba: image.into_raw(),
        })
    }

    /// Seamless ripple normals from Perlin noise on a 4D torus
    pub fn procedural(size: u32, seed: u32) -> Self {
        let perlin = Perlin::new(seed);
        let size = size.max(2);
        let radius = 1.5;

        let heights: Vec<f32> = (0..size * size)
            .map(|i| {
                let u = (i % size) as f64 / size as f64 * TAU;
                let v = (i / size) as f64 / size as f64 * TAU;
                let p = [
                    u.cos() * radius,
                    u.sin() * radius,
                    v.cos() * radius,
                    v.sin() * radius,
                ];
                perlin.get(p) as f32
            })
            .collect();

        let at = |x: u32, y: u32| heights[((y % size) * size + (x % size)) as usize];
        let strength = 4.0;
        let mut rgba = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let dx = at(x + 1, y) - at(x + size - 1, y);
                let dy = at(x, y + 1) - at(x, y + size - 1);
                let normal = Vec3::new(-dx * strength, -dy * strength, 1.0).normalize();
                let encoded = normal * 0.5 + Vec3::splat(0.5);
                rgba.extend_from_slice(&[
                    (encoded.x * 255.0).round() as u8,
                    (encoded.y * 255.0).round() as u8,
                    (encoded.z * 255.0).round() as u8,
                    255,
                ]);
            }
        }

        Self {
            width: size,
            height: size,
            rgba,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_procedural_map_size_and_up_bias() {
        let map = WaveNormalMap::procedural(32, 7);
        assert_eq!(map.rgba.len(), 32 * 32 * 4);
        // Every encoded normal points out of the surface
        assert!(map.rgba.chunks(4).all(|t| t[2] >= 128 && t[3] == 255));
    }

    #[test]
    fn test_procedural_map_is_deterministic() {
        let a = WaveNormalMap::procedural(16, 3);
        let b = WaveNormalMap::procedural(16, 3);
        assert_eq!(a.rgba, b.rgba);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = WaveNormalMap::load(Path::new("does/not/exist.png")).unwrap_err();
        assert!(err.to_string().contains("does/not/exist.png"));
    }
}
