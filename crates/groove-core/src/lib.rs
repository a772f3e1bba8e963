//! Platform-free core of groove-viz.
//!
//! Nothing here touches the browser or the GPU, so the web front end and the
//! native CLI share it and it can be tested on the host.

pub mod analysis;
pub mod beat;
pub mod boundary;
pub mod camera;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod frames;
pub mod motion;
pub mod onset;
pub mod pitch;
pub mod session;
pub mod timeline;

pub use analysis::*;
pub use beat::{BeatHit, BeatTracker, BeatWindow};
pub use camera::{Camera, CameraState, FollowCamera};
pub use clock::{ClockTick, PlaybackClock, PlaybackState, TimeSource};
pub use config::{BoundaryPolicy, CameraGains, SynthConfig};
pub use error::*;
pub use frames::*;
pub use motion::{BoundaryEvent, MarkerState, MotionSynthesizer, TickReport};
pub use onset::OnsetTracker;
pub use pitch::{Hsl, PitchClass, PitchStrengths, PITCH_CLASS_COUNT};
pub use session::{FrameOutput, Session};
pub use timeline::{nearest_index, nearest_sample, SortedCursor, Timed};

// Shaders bundled as string constants
pub static MARKER_WGSL: &str = include_str!("../shaders/marker.wgsl");
pub static MESH_WGSL: &str = include_str!("../shaders/mesh.wgsl");
