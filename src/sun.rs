//! Simulated clock and sun position.

use std::f32::consts::PI;

use glam::Vec3;

use crate::params::{ClockParams, SunCycle};

const HOURS_PER_DAY: f32 = 24.0;
const SECONDS_PER_HOUR: f32 = 3600.0;

/// Sun direction and light strengths for one moment of the day
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunState {
    /// Unit vector toward the sun
    pub direction: Vec3,
    /// Directional light strength, 0 with the sun below the horizon
    pub intensity: f32,
    /// Auxiliary point light strength, rises as the sun falls
    pub night_light: f32,
}

impl SunState {
    /// Sun for `hour` (0-24)
    ///
    /// The sun angle runs linearly from 0 at sunrise to π at sunset and keeps
    /// going outside that window, which puts it below the horizon at night.
    pub fn at_hour(hour: f32, cycle: &SunCycle) -> Self {
        let day_fraction =
            (hour - cycle.sunrise_hour) / (cycle.sunset_hour - cycle.sunrise_hour);
        let angle = day_fraction * PI;
        let direction = Vec3::new(angle.cos(), angle.sin(), 0.0);
        let intensity = direction.dot(Vec3::Y).max(0.0) * cycle.max_intensity;
        let night_light = cycle.night_light_max * (1.0 - intensity / cycle.max_intensity);

        Self {
            direction,
            intensity,
            night_light,
        }
    }

    pub fn is_up(&self) -> bool {
        self.intensity > 0.0
    }
}

/// Time-of-day clock, optionally accelerated
#[derive(Debug, Clone)]
pub struct SimClock {
    hour: f32,
    time_scale: f32,
}

impl SimClock {
    pub fn new(params: &ClockParams) -> Self {
        Self {
            hour: params.start_hour.rem_euclid(HOURS_PER_DAY),
            time_scale: params.time_scale,
        }
    }

    /// Current hour (0-24)
    pub fn hour(&self) -> f32 {
        self.hour
    }

    /// Advance by `real_seconds` of wall time
    pub fn advance(&mut self, real_seconds: f32) -> f32 {
        let hours = real_seconds * self.time_scale / SECONDS_PER_HOUR;
        self.hour = (self.hour + hours).rem_euclid(HOURS_PER_DAY);
        self.hour
    }

    /// `HH:MM` for display
    pub fn label(&self) -> String {
        let minutes = (self.hour * 60.0) as u32 % (24 * 60);
        format!("{:02}:{:02}", minutes / 60, minutes % 60)
    }
}
