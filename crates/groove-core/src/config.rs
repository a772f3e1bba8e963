//! Runtime tuning for the synthesizer, camera and boundary handling.
//!
//! Every field defaults to the matching value in [`crate::constants`], so a
//! partial JSON document only needs the keys it overrides:
//!
//! ```json
//! { "boundary": "reflect_at_boundary", "camera": { "kp": 3.0 } }
//! ```

use crate::constants::*;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// What happens when the marker reaches the edge of the stage.
///
/// Earlier iterations of the visualizer mirrored the marker back off the
/// circular edge; the current one snaps it to the centre. Both are kept.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    ReflectAtBoundary,
    #[default]
    ResetAtBoundary,
}

impl BoundaryPolicy {
    #[inline]
    pub fn toggled(self) -> Self {
        match self {
            Self::ReflectAtBoundary => Self::ResetAtBoundary,
            Self::ResetAtBoundary => Self::ReflectAtBoundary,
        }
    }
}

impl std::str::FromStr for BoundaryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reflect" | "reflect_at_boundary" => Ok(Self::ReflectAtBoundary),
            "reset" | "reset_at_boundary" => Ok(Self::ResetAtBoundary),
            other => Err(format!("unknown boundary policy '{other}'")),
        }
    }
}

/// PI gains for the follow camera.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraGains {
    pub kp: f32,
    pub ki: f32,
    /// Eye distance from the stage plane.
    pub distance: f32,
}

impl Default for CameraGains {
    fn default() -> Self {
        Self {
            kp: CAMERA_KP,
            ki: CAMERA_KI,
            distance: CAMERA_Z,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    pub max_radius: f32,
    pub boundary_fraction: f32,
    pub target_radius_margin: f32,
    pub boundary: BoundaryPolicy,

    pub beat_look_ahead: f64,
    pub beat_cooldown: f64,
    pub pulse_decay: f32,
    pub beat_angle_offset: f32,

    pub centroid_norm_hz: f32,
    pub rolloff_norm_hz: f32,
    pub spectral_smoothing: f32,

    pub velocity_scale: f32,
    pub displacement_noise_floor: f32,
    pub min_velocity: f32,
    pub max_velocity: f32,
    pub acceleration_scale: f32,
    pub velocity_return_rate: f32,
    pub rms_miniscule_fraction: f32,
    pub max_rms_window: f64,

    pub onset_window: f64,
    pub onset_decay_rate: f32,
    pub onset_boost_factor: f32,

    pub pitch_high_threshold: f32,
    pub pitch_low_threshold: f32,

    pub camera: CameraGains,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            max_radius: MAX_RADIUS,
            boundary_fraction: BOUNDARY_FRACTION,
            target_radius_margin: TARGET_RADIUS_MARGIN,
            boundary: BoundaryPolicy::default(),
            beat_look_ahead: BEAT_LOOK_AHEAD_SEC,
            beat_cooldown: BEAT_COOLDOWN_SEC,
            pulse_decay: BEAT_PULSE_DECAY,
            beat_angle_offset: BEAT_ANGLE_OFFSET,
            centroid_norm_hz: CENTROID_NORM_HZ,
            rolloff_norm_hz: ROLLOFF_NORM_HZ,
            spectral_smoothing: SPECTRAL_SMOOTHING,
            velocity_scale: VELOCITY_SCALE,
            displacement_noise_floor: DISPLACEMENT_NOISE_FLOOR,
            min_velocity: MIN_VELOCITY,
            max_velocity: MAX_VELOCITY,
            acceleration_scale: ACCELERATION_SCALE,
            velocity_return_rate: VELOCITY_RETURN_RATE,
            rms_miniscule_fraction: RMS_MINISCULE_FRACTION,
            max_rms_window: MAX_RMS_WINDOW_SEC,
            onset_window: ONSET_WINDOW_SEC,
            onset_decay_rate: ONSET_DECAY_RATE,
            onset_boost_factor: ONSET_BOOST_FACTOR,
            pitch_high_threshold: PITCH_HIGH_THRESHOLD,
            pitch_low_threshold: PITCH_LOW_THRESHOLD,
            camera: CameraGains::default(),
        }
    }
}

impl SynthConfig {
    /// Parse a (possibly partial) JSON config and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn with_boundary(mut self, boundary: BoundaryPolicy) -> Self {
        self.boundary = boundary;
        self
    }

    /// Radius at which the boundary policy kicks in.
    #[inline]
    pub fn boundary_radius(&self) -> f32 {
        self.max_radius * self.boundary_fraction
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("max_radius", self.max_radius as f64)?;
        unit_interval("boundary_fraction", self.boundary_fraction as f64)?;
        if self.target_radius_margin < 0.0 || self.target_radius_margin >= self.max_radius {
            return Err(ConfigError::Invalid {
                field: "target_radius_margin",
                rule: "in [0, max_radius)",
                value: self.target_radius_margin as f64,
            });
        }
        non_negative("beat_look_ahead", self.beat_look_ahead)?;
        non_negative("beat_cooldown", self.beat_cooldown)?;
        unit_interval("pulse_decay", self.pulse_decay as f64)?;
        positive("centroid_norm_hz", self.centroid_norm_hz as f64)?;
        positive("rolloff_norm_hz", self.rolloff_norm_hz as f64)?;
        unit_interval("spectral_smoothing", self.spectral_smoothing as f64)?;
        non_negative("min_velocity", self.min_velocity as f64)?;
        if self.max_velocity < self.min_velocity {
            return Err(ConfigError::Invalid {
                field: "max_velocity",
                rule: ">= min_velocity",
                value: self.max_velocity as f64,
            });
        }
        non_negative("velocity_return_rate", self.velocity_return_rate as f64)?;
        non_negative("rms_miniscule_fraction", self.rms_miniscule_fraction as f64)?;
        positive("max_rms_window", self.max_rms_window)?;
        non_negative("onset_window", self.onset_window)?;
        non_negative("onset_decay_rate", self.onset_decay_rate as f64)?;
        if self.pitch_low_threshold > self.pitch_high_threshold {
            return Err(ConfigError::Invalid {
                field: "pitch_low_threshold",
                rule: "<= pitch_high_threshold",
                value: self.pitch_low_threshold as f64,
            });
        }
        non_negative("camera.kp", self.camera.kp as f64)?;
        non_negative("camera.ki", self.camera.ki as f64)?;
        positive("camera.distance", self.camera.distance as f64)?;
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            rule: "> 0",
            value,
        })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            rule: ">= 0",
            value,
        })
    }
}

fn unit_interval(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            rule: "in [0, 1]",
            value,
        })
    }
}
