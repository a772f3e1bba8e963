//! Audio-reactive marker motion.
//!
//! Each tick runs in a fixed order: beat detection, velocity update,
//! position integration, then colour/scale. Beats retarget the marker from
//! the smoothed spectral centroid (angle) and rolloff (distance); between
//! beats RMS energy relative to its recent average accelerates or relaxes
//! the velocity, onsets amplify that acceleration, and a single clearly
//! dominant pitch class steers the direction.

use crate::analysis::Analysis;
use crate::beat::{BeatHit, BeatTracker};
use crate::boundary::{self, clamp_to_radius};
use crate::config::{BoundaryPolicy, SynthConfig};
use crate::constants::{
    MARKER_BASE_SCALE, MARKER_LIGHTNESS_BASE, MARKER_LIGHTNESS_SPAN, MARKER_PULSE_SCALE,
    MARKER_SATURATION,
};
use crate::onset::OnsetTracker;
use crate::pitch::{self, Hsl, PitchClass, PitchStrengths, PITCH_CLASS_COUNT};
use glam::Vec2;
use std::f32::consts::TAU;

#[derive(Clone, Debug, PartialEq)]
pub struct MarkerState {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Velocity set by the last beat; the marker relaxes back to it when
    /// energy is steady.
    pub original_velocity: Vec2,
    /// Last beat target after boundary handling.
    pub target: Vec2,
    pub color: Hsl,
    pub scale: f32,
    pub pulse: f32,
}

impl Default for MarkerState {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            original_velocity: Vec2::ZERO,
            target: Vec2::ZERO,
            color: Hsl::default(),
            scale: MARKER_BASE_SCALE,
            pulse: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundaryEvent {
    Reset,
    Reflected,
}

/// What happened during one [`MotionSynthesizer::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickReport {
    pub beat: Option<BeatHit>,
    pub boundary: Option<BoundaryEvent>,
    pub onset_strength: f32,
    pub dominant: Option<PitchClass>,
}

/// Clamp a velocity's magnitude to `[min, max]`; anything slower than `min`
/// becomes exactly zero.
pub fn clamp_velocity(v: Vec2, min: f32, max: f32) -> Vec2 {
    let speed = v.length();
    if !speed.is_finite() || speed < min || speed == 0.0 {
        Vec2::ZERO
    } else if speed > max {
        v * (max / speed)
    } else {
        v
    }
}

pub struct MotionSynthesizer {
    config: SynthConfig,
    analysis: Analysis,
    beats: BeatTracker,
    onsets: OnsetTracker,
    smoothed_centroid: f32,
    smoothed_rolloff: f32,
    marker: MarkerState,
    ring: PitchStrengths,
    dominant: Option<PitchClass>,
}

impl MotionSynthesizer {
    pub fn new(analysis: Analysis, config: SynthConfig) -> Self {
        let (smoothed_centroid, smoothed_rolloff) = analysis
            .spectral
            .first()
            .map_or((0.0, 0.0), |s| (s.spectral_centroid, s.spectral_rolloff));
        Self {
            beats: BeatTracker::new(config.beat_look_ahead, config.beat_cooldown),
            onsets: OnsetTracker::new(config.onset_window, config.onset_decay_rate),
            config,
            analysis,
            smoothed_centroid,
            smoothed_rolloff,
            marker: MarkerState::default(),
            ring: [0.0; PITCH_CLASS_COUNT],
            dominant: None,
        }
    }

    #[inline]
    pub fn analysis(&self) -> &Analysis {
        &self.analysis
    }

    #[inline]
    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    #[inline]
    pub fn marker(&self) -> &MarkerState {
        &self.marker
    }

    #[inline]
    pub fn beats(&self) -> &BeatTracker {
        &self.beats
    }

    /// Pitch ring segment levels for the last visual update.
    #[inline]
    pub fn ring_levels(&self) -> &PitchStrengths {
        &self.ring
    }

    pub fn set_boundary_policy(&mut self, policy: BoundaryPolicy) {
        self.config.boundary = policy;
    }

    /// Advance the marker to playback time `t`, `dt` seconds after the previous tick.
    pub fn tick(&mut self, t: f64, dt: f32) -> TickReport {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let beat = self.check_for_beat(t);
        let onset_strength = self.update_velocity(t, dt);
        let boundary = self.integrate(dt);
        self.refresh_visuals(t);
        self.decay_pulse();
        TickReport {
            beat,
            boundary,
            onset_strength,
            dominant: self.dominant,
        }
    }

    /// Paused frames only let the beat pulse fade.
    pub fn idle(&mut self) {
        self.marker.scale = MARKER_BASE_SCALE + self.marker.pulse * MARKER_PULSE_SCALE;
        self.decay_pulse();
    }

    pub fn check_for_beat(&mut self, t: f64) -> Option<BeatHit> {
        let hit = self.beats.check(&self.analysis.beats, t)?;
        self.marker.pulse = 1.0;
        if let Some(target) = self.beat_target(t, hit.ordinal) {
            let displacement = target - self.marker.position;
            if displacement.length() > self.config.displacement_noise_floor {
                self.marker.original_velocity = displacement * self.config.velocity_scale;
                self.marker.velocity = clamp_velocity(
                    self.marker.original_velocity,
                    self.config.min_velocity,
                    self.config.max_velocity,
                );
            }
            self.marker.target = target;
        }
        Some(hit)
    }

    /// New target from the smoothed spectrum at `t`, after boundary handling.
    fn beat_target(&mut self, t: f64, ordinal: u64) -> Option<Vec2> {
        let sample = self.analysis.spectral_at(t)?;
        let k = self.config.spectral_smoothing;
        self.smoothed_centroid = k * sample.spectral_centroid + (1.0 - k) * self.smoothed_centroid;
        self.smoothed_rolloff = k * sample.spectral_rolloff + (1.0 - k) * self.smoothed_rolloff;

        let centroid = (self.smoothed_centroid / self.config.centroid_norm_hz).min(1.0);
        let rolloff = (self.smoothed_rolloff / self.config.rolloff_norm_hz).min(1.0);
        let mut angle = centroid * TAU;
        if ordinal % 2 == 1 {
            angle += self.config.beat_angle_offset;
        }
        let distance = rolloff * (self.config.max_radius - self.config.target_radius_margin);
        let target = Vec2::from_angle(angle) * distance;

        // only reachable when the margin is negative, which validate() rejects
        if target.length() <= self.config.max_radius {
            return Some(target);
        }
        Some(match self.config.boundary {
            BoundaryPolicy::ResetAtBoundary => Vec2::ZERO,
            BoundaryPolicy::ReflectAtBoundary => boundary::mirror_at_boundary(
                self.marker.position,
                target,
                self.config.max_radius,
                self.config.boundary_fraction,
            ),
        })
    }

    /// Steer the velocity from RMS energy, onsets and the dominant pitch.
    /// Returns the onset strength used.
    pub fn update_velocity(&mut self, t: f64, dt: f32) -> f32 {
        let cfg = &self.config;
        let onset_strength = self.onsets.observe(&self.analysis.onsets, t);
        let Some(sample) = self.analysis.spectral_at(t) else {
            return onset_strength;
        };
        let rms = sample.rms_energy;
        let window = self.beats.window().rms_window(cfg.max_rms_window);
        let average = self.analysis.mean_rms(t - window, t).unwrap_or(rms);

        let mut v = self.marker.velocity;
        let diff = if average > f32::EPSILON {
            (rms - average) / average
        } else {
            0.0
        };
        if diff.abs() <= cfg.rms_miniscule_fraction {
            let k = (cfg.velocity_return_rate * dt).min(1.0);
            v += (self.marker.original_velocity - v) * k;
        } else if let Some(dir) = v
            .try_normalize()
            .or_else(|| self.marker.original_velocity.try_normalize())
        {
            let boost = 1.0 + onset_strength * cfg.onset_boost_factor;
            v += dir * (diff * cfg.acceleration_scale * boost * dt);
        }

        let (high, low) = (cfg.pitch_high_threshold, cfg.pitch_low_threshold);
        self.dominant = self
            .analysis
            .pitch_at(t)
            .and_then(|p| pitch::dominant_override(&p.all_pitches, high, low));
        if let Some(class) = self.dominant {
            v = class.ring_direction() * v.length();
        }

        self.marker.velocity = clamp_velocity(v, cfg.min_velocity, cfg.max_velocity);
        onset_strength
    }

    /// `position += velocity * dt`, then the boundary policy.
    pub fn integrate(&mut self, dt: f32) -> Option<BoundaryEvent> {
        let cfg = &self.config;
        let m = &mut self.marker;
        let proposed = m.position + m.velocity * dt;
        let mut event = None;
        match cfg.boundary {
            BoundaryPolicy::ResetAtBoundary => {
                if proposed.length() >= cfg.boundary_radius() {
                    m.position = Vec2::ZERO;
                    event = Some(BoundaryEvent::Reset);
                } else {
                    m.position = proposed;
                }
            }
            BoundaryPolicy::ReflectAtBoundary => {
                if proposed.length() > cfg.max_radius {
                    let r = boundary::reflect_off_boundary(
                        m.position,
                        proposed,
                        cfg.max_radius,
                        cfg.boundary_fraction,
                    );
                    m.position = r.position;
                    if let Some(n) = r.normal {
                        m.velocity = boundary::reflect_velocity(m.velocity, n);
                        m.original_velocity = boundary::reflect_velocity(m.original_velocity, n);
                    }
                    event = Some(BoundaryEvent::Reflected);
                } else {
                    m.position = proposed;
                }
            }
        }
        if !m.position.is_finite() {
            m.position = Vec2::ZERO;
        } else if m.position.length() > cfg.max_radius {
            m.position = clamp_to_radius(m.position, cfg.boundary_radius());
        }
        event
    }

    /// Colour, pitch ring and scale for time `t`.
    pub fn refresh_visuals(&mut self, t: f64) {
        if let Some(sample) = self.analysis.pitch_at(t) {
            if let Some(strength) = sample.dominant_strength() {
                self.marker.color = Hsl::from_strength(
                    strength,
                    MARKER_SATURATION,
                    MARKER_LIGHTNESS_BASE,
                    MARKER_LIGHTNESS_SPAN,
                );
            }
            self.ring = pitch::ring_levels(
                &sample.all_pitches,
                self.config.pitch_low_threshold,
                self.config.pitch_high_threshold,
            );
        }
        self.marker.scale = MARKER_BASE_SCALE + self.marker.pulse * MARKER_PULSE_SCALE;
    }

    fn decay_pulse(&mut self) {
        self.marker.pulse *= self.config.pulse_decay;
    }

    /// Jump to `t`: rebase the beat and onset cursors and place the marker on
    /// the spectral target for `t` at rest.
    pub fn seek(&mut self, t: f64) {
        self.beats.rebase(&self.analysis.beats, t);
        self.onsets.rebase(&self.analysis.onsets, t);
        let ordinal = self.beats.fired_count();
        if let Some(target) = self.beat_target(t, ordinal) {
            self.marker.target = target;
            self.marker.position = target;
        }
        self.marker.velocity = Vec2::ZERO;
        self.marker.original_velocity = Vec2::ZERO;
        self.refresh_visuals(t);
        log::debug!(
            "[motion] seek to {:.3}s, next beat index {}",
            t,
            self.beats.cursor()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_snaps_slow_to_zero() {
        assert_eq!(clamp_velocity(Vec2::new(0.01, 0.0), 0.05, 4.0), Vec2::ZERO);
        let v = clamp_velocity(Vec2::new(30.0, 40.0), 0.05, 4.0);
        assert!((v.length() - 4.0).abs() < 1e-5);
        let v = clamp_velocity(Vec2::new(0.3, 0.4), 0.05, 4.0);
        assert_eq!(v, Vec2::new(0.3, 0.4));
        assert_eq!(clamp_velocity(Vec2::new(f32::NAN, 0.0), 0.05, 4.0), Vec2::ZERO);
    }

    #[test]
    fn empty_analysis_is_a_no_op() {
        let mut s = MotionSynthesizer::new(Analysis::default(), SynthConfig::default());
        for i in 0..10 {
            let r = s.tick(i as f64 * 0.1, 0.1);
            assert!(r.beat.is_none());
        }
        assert_eq!(s.marker().position, Vec2::ZERO);
        assert_eq!(s.marker().velocity, Vec2::ZERO);
        s.seek(3.0);
        assert_eq!(s.marker().position, Vec2::ZERO);
    }
}
