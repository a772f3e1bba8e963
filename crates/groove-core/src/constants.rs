// Default tuning for the motion synthesizer, camera and clock.
// `SynthConfig::default()` is built from these values.

// Stage geometry
pub const MAX_RADIUS: f32 = 5.0; // marker stays inside this disk
pub const BOUNDARY_FRACTION: f32 = 0.95; // boundary policy triggers at this share of MAX_RADIUS
pub const TARGET_RADIUS_MARGIN: f32 = 2.0; // beat targets land within MAX_RADIUS - margin

// Beat detection
pub const BEAT_LOOK_AHEAD_SEC: f64 = 0.05;
pub const BEAT_COOLDOWN_SEC: f64 = 0.15;
pub const BEAT_PULSE_DECAY: f32 = 0.95; // per rendered frame
pub const BEAT_ANGLE_OFFSET: f32 = std::f32::consts::FRAC_PI_4; // added on every other beat

// Spectral normalization and smoothing
pub const CENTROID_NORM_HZ: f32 = 5000.0;
pub const ROLLOFF_NORM_HZ: f32 = 10000.0;
pub const SPECTRAL_SMOOTHING: f32 = 0.3; // low-pass factor applied per beat

// Velocity dynamics
pub const VELOCITY_SCALE: f32 = 1.0;
pub const DISPLACEMENT_NOISE_FLOOR: f32 = 0.01;
pub const MIN_VELOCITY: f32 = 0.05;
pub const MAX_VELOCITY: f32 = 4.0;
pub const ACCELERATION_SCALE: f32 = 2.0;
pub const VELOCITY_RETURN_RATE: f32 = 2.0; // 1/s pull back toward the beat velocity
pub const RMS_MINISCULE_FRACTION: f32 = 0.10;
pub const MAX_RMS_WINDOW_SEC: f64 = 4.0;

// Onsets
pub const ONSET_WINDOW_SEC: f64 = 0.05;
pub const ONSET_DECAY_RATE: f32 = 20.0;
pub const ONSET_BOOST_FACTOR: f32 = 0.5;

// Pitch ring and dominant pitch override
pub const PITCH_HIGH_THRESHOLD: f32 = 0.7;
pub const PITCH_LOW_THRESHOLD: f32 = 0.5;

// Marker colour and size
pub const MARKER_SATURATION: f32 = 70.0;
pub const MARKER_LIGHTNESS_BASE: f32 = 50.0;
pub const MARKER_LIGHTNESS_SPAN: f32 = 30.0;
pub const MARKER_BASE_SCALE: f32 = 1.0;
pub const MARKER_PULSE_SCALE: f32 = 0.3;

// Follow camera (PI controller)
pub const CAMERA_KP: f32 = 5.0;
pub const CAMERA_KI: f32 = 0.5;
pub const CAMERA_Z: f32 = 5.0;

// Frame-stepped playback
pub const DEFAULT_FPS: f64 = 30.0;

// Keypoint overlay
pub const KEYPOINT_MIN_CONFIDENCE: f32 = 0.3;

// Float comparisons on playback time
pub const TIME_EPSILON: f64 = 1e-9;
