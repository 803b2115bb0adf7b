//! Camera pose configuration and presets.

/// Scripted camera pose
#[derive(Debug, Clone)]
pub struct FixedCamera {
    /// Camera position (meters)
    pub position: [f32; 3],

    /// Euler rotation, XYZ order (radians)
    pub rotation_xyz: [f32; 3],
}

impl Default for FixedCamera {
    fn default() -> Self {
        Self {
            position: [-1.5784, 5.6844, 7.5588], // Three-quarter view onto the hull
            rotation_xyz: [-0.3786, -0.4076, -0.1564],
        }
    }
}

/// User-driven orbit camera around the floating object
#[derive(Debug, Clone)]
pub struct OrbitCameraParams {
    /// Orbit center (meters)
    pub target: [f32; 3],

    /// Initial distance from target (meters)
    pub distance_m: f32,

    /// Initial horizontal angle (degrees)
    pub azimuth_deg: f32,

    /// Initial vertical angle (degrees)
    pub elevation_deg: f32,

    /// Zoom limits (meters)
    pub min_distance_m: f32,
    pub max_distance_m: f32,

    /// Degrees of rotation per pixel dragged
    pub orbit_sensitivity: f32,

    /// Fraction of distance changed per scroll line
    pub zoom_factor: f32,
}

impl Default for OrbitCameraParams {
    fn default() -> Self {
        Self {
            target: [0.0, 0.0, 0.0],
            distance_m: 5.0,
            azimuth_deg: 0.0,
            elevation_deg: 10.0,
            min_distance_m: 1.0,
            max_distance_m: 400.0,
            orbit_sensitivity: 0.3,
            zoom_factor: 0.1,
        }
    }
}

/// Which camera drives the view at startup
#[derive(Debug, Clone)]
pub enum CameraPreset {
    /// Scripted pose, no user input
    Fixed(FixedCamera),

    /// Free orbit around the object
    Orbit(OrbitCameraParams),
}

impl Default for CameraPreset {
    fn default() -> Self {
        Self::Orbit(OrbitCameraParams::default())
    }
}
