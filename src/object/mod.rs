//! The floating object and its asynchronously loaded assets.
//!
//! Assets are produced on a worker thread. Until they arrive the frame
//! pipeline leaves the object alone; if loading fails the object stays
//! absent for the rest of the run.

mod hull;
mod wave_normals;

pub use hull::{hull_mesh, HullDimensions, MeshVertex, ObjectMesh};
pub use wave_normals::WaveNormalMap;

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use crate::alignment::{Aabb, ObjectPose};
use crate::error::AssetError;

/// What the loader thread should produce
#[derive(Debug, Clone, Default)]
pub struct AssetRequest {
    /// Normal map image; procedural ripples when `None`
    pub wave_texture: Option<PathBuf>,
    pub hull: HullDimensions,
}

/// Floating object ready for alignment and drawing
#[derive(Debug, Clone)]
pub struct FloatingObject {
    pub mesh: ObjectMesh,
    /// Object-space bounds of `mesh`
    pub local_bounds: Aabb,
    pub pose: ObjectPose,
}

impl FloatingObject {
    pub fn new(mesh: ObjectMesh) -> Self {
        let local_bounds = mesh
            .bounds()
            .unwrap_or(Aabb::new(glam::Vec3::ZERO, glam::Vec3::ZERO));
        Self {
            mesh,
            local_bounds,
            pose: ObjectPose::default(),
        }
    }

    /// World-space bounds at the current pose
    pub fn world_bounds(&self) -> Aabb {
        self.local_bounds.transformed(&self.pose.model_matrix())
    }
}

/// Everything the loader thread hands back
#[derive(Debug)]
pub struct LoadedAssets {
    pub object: FloatingObject,
    pub wave_normals: WaveNormalMap,
}

impl LoadedAssets {
    pub fn load(request: &AssetRequest) -> Result<Self, AssetError> {
        let wave_normals = match &request.wave_texture {
            Some(path) => WaveNormalMap::load(path)?,
            None => WaveNormalMap::procedural(WaveNormalMap::PROCEDURAL_SIZE, 0),
        };
        Ok(Self {
            object: FloatingObject::new(hull_mesh(&request.hull)),
            wave_normals,
        })
    }
}

/// Loading state of the floating object
#[derive(Debug)]
pub enum ObjectHandle {
    Pending(Receiver<Result<LoadedAssets, AssetError>>),
    Ready(FloatingObject),
    Failed,
}

impl ObjectHandle {
    /// Start loading on a background thread
    pub fn spawn(request: AssetRequest) -> Self {
        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("asset-loader".into())
            .spawn(move || {
                // The receiver may be gone if the app already exited
                let _ = tx.send(LoadedAssets::load(&request));
            });

        match spawned {
            Ok(_) => Self::Pending(rx),
            Err(e) => {
                log::error!("Failed to start asset loader: {}", e);
                Self::Failed
            }
        }
    }

    /// Check for finished loading without blocking
    ///
    /// Returns the wave-normal map exactly once, on the transition to `Ready`,
    /// so the caller can upload it.
    pub fn poll(&mut self) -> Option<WaveNormalMap> {
        let Self::Pending(rx) = self else {
            return None;
        };

        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(AssetError::LoaderDisconnected),
        };

        match result {
            Ok(assets) => {
                log::info!(
                    "Floating object loaded: {} triangles, wave map {}x{}",
                    assets.object.mesh.indices.len() / 3,
                    assets.wave_normals.width,
                    assets.wave_normals.height
                );
                *self = Self::Ready(assets.object);
                Some(assets.wave_normals)
            }
            Err(e) => {
                log::error!("Asset loading failed, continuing without object: {}", e);
                *self = Self::Failed;
                None
            }
        }
    }

    pub fn object(&self) -> Option<&FloatingObject> {
        match self {
            Self::Ready(object) => Some(object),
            _ => None,
        }
    }

    pub fn object_mut(&mut self) -> Option<&mut FloatingObject> {
        match self {
            Self::Ready(object) => Some(object),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}
