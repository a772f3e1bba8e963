use crate::analysis::Analysis;
use crate::beat::BeatHit;
use crate::camera::FollowCamera;
use crate::clock::{self, PlaybackClock, TimeSource};
use crate::config::{BoundaryPolicy, SynthConfig};
use crate::constants::DEFAULT_FPS;
use crate::motion::{BoundaryEvent, MarkerState, MotionSynthesizer};
use crate::pitch::PitchStrengths;
use glam::Vec3;

/// Longest simulation step taken in one frame; longer gaps (tab in the
/// background, debugger pause) are integrated as this much.
pub const MAX_STEP_SEC: f32 = 0.1;
/// A playback jump larger than this (or any jump backwards) is treated as a
/// seek made outside the session, e.g. through native audio controls.
pub const SEEK_JUMP_SEC: f64 = 1.0;

/// Everything a renderer needs for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameOutput {
    pub time: f64,
    pub playing: bool,
    pub frame_index: usize,
    pub marker: MarkerState,
    pub ring: PitchStrengths,
    pub camera_eye: Vec3,
    pub camera_target: Vec3,
    pub beat: Option<BeatHit>,
    pub boundary: Option<BoundaryEvent>,
}

/// Clock, synthesizer and camera driven together once per animation frame.
pub struct Session {
    clock: PlaybackClock,
    synth: MotionSynthesizer,
    camera: FollowCamera,
    frame_fps: f64,
    last_time: Option<f64>,
    last_now_ms: Option<f64>,
}

impl Session {
    pub fn new(analysis: Analysis, config: SynthConfig, clock: PlaybackClock) -> Self {
        let camera = FollowCamera::new(config.camera);
        let mut clock = clock;
        if clock.duration().is_none() {
            clock.set_duration(analysis.duration());
        }
        Self {
            clock,
            synth: MotionSynthesizer::new(analysis, config),
            camera,
            frame_fps: DEFAULT_FPS,
            last_time: None,
            last_now_ms: None,
        }
    }

    /// Frame rate of the keypoint/mesh sequence shown alongside the audio.
    pub fn with_frame_fps(mut self, fps: f64) -> Self {
        if fps.is_finite() && fps > 0.0 {
            self.frame_fps = fps;
        }
        self
    }

    #[inline]
    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    #[inline]
    pub fn clock_mut(&mut self) -> &mut PlaybackClock {
        &mut self.clock
    }

    #[inline]
    pub fn synth(&self) -> &MotionSynthesizer {
        &self.synth
    }

    #[inline]
    pub fn camera(&self) -> &FollowCamera {
        &self.camera
    }

    #[inline]
    pub fn boundary_policy(&self) -> BoundaryPolicy {
        self.synth.config().boundary
    }

    pub fn set_boundary_policy(&mut self, policy: BoundaryPolicy) {
        log::info!("[session] boundary policy {:?}", policy);
        self.synth.set_boundary_policy(policy);
    }

    pub fn play(&mut self) {
        self.clock.play();
    }

    pub fn pause(&mut self) {
        self.clock.pause();
    }

    pub fn toggle(&mut self) {
        self.clock.toggle();
    }

    pub fn on_ended(&mut self) {
        self.clock.on_ended();
        self.resync(0.0);
    }

    /// Move playback to `t` and re-synchronize every cursor. Returns the
    /// time actually set.
    pub fn seek(&mut self, t: f64) -> f64 {
        let t = self.clock.seek(t);
        self.resync(t);
        t
    }

    fn resync(&mut self, t: f64) {
        self.synth.seek(t);
        self.camera.snap_to(self.synth.marker().position);
        self.last_time = Some(t);
    }

    /// Forward gap treated as a seek. A stepped clock below 1 fps moves
    /// further than [`SEEK_JUMP_SEC`] on every step, so it gets two steps of slack.
    fn jump_threshold(&self) -> f64 {
        match self.clock.source() {
            TimeSource::Stepped { fps, .. } => SEEK_JUMP_SEC.max(2.0 / fps),
            TimeSource::External => SEEK_JUMP_SEC,
        }
    }

    fn frame_index(&self, t: f64) -> usize {
        match self.clock.source() {
            TimeSource::Stepped { .. } => self.clock.frame(),
            TimeSource::External => clock::frame_for_time(t, self.frame_fps),
        }
    }

    /// Run one animation frame. `now_ms` is a monotonic timestamp and
    /// `external_position` the audio element position, if audio drives time.
    pub fn frame(&mut self, now_ms: f64, external_position: Option<f64>) -> FrameOutput {
        let wall_dt = self
            .last_now_ms
            .map_or(0.0, |last| ((now_ms - last) / 1000.0) as f32)
            .clamp(0.0, MAX_STEP_SEC);
        self.last_now_ms = Some(now_ms);

        let tick = self.clock.tick(now_ms, external_position);
        let t = tick.time;
        let mut beat = None;
        let mut boundary = None;

        if self.clock.is_playing() {
            match self.last_time {
                Some(last) if t < last || t - last > self.jump_threshold() => {
                    log::info!("[session] playback jumped {:.2}s -> {:.2}s", last, t);
                    self.resync(t);
                }
                _ => {
                    let dt = self.last_time.map_or(0.0, |last| (t - last) as f32);
                    let report = self.synth.tick(t, dt.clamp(0.0, MAX_STEP_SEC));
                    beat = report.beat;
                    boundary = report.boundary;
                    self.last_time = Some(t);
                }
            }
        } else {
            self.synth.idle();
        }

        self.camera.update(self.synth.marker().position, wall_dt);

        FrameOutput {
            time: t,
            playing: self.clock.is_playing(),
            frame_index: self.frame_index(t),
            marker: self.synth.marker().clone(),
            ring: *self.synth.ring_levels(),
            camera_eye: self.camera.eye(),
            camera_target: self.camera.look_at(),
            beat,
            boundary,
        }
    }
}
