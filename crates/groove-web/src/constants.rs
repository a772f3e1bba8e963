// DOM element ids
pub const GPU_CANVAS_ID: &str = "gpu-canvas";
pub const SKELETON_CANVAS_ID: &str = "skeleton-canvas";
pub const LOADING_ID: &str = "loading";
pub const LOADING_TEXT_ID: &str = "loading-progress";
pub const TITLE_ID: &str = "track-title";
pub const TIME_LABEL_ID: &str = "time-label";
pub const TIMELINE_ID: &str = "timeline";
pub const TIMELINE_FILL_ID: &str = "timeline-fill";
pub const HELP_ID: &str = "help-overlay";

// Defaults when the page URL does not say otherwise
pub const DEFAULT_TRACK: &str = "power-up";
pub const DEFAULT_FRAME_COUNT: usize = 0;

// Keypoint coordinates are in source-video pixels
pub const SOURCE_WIDTH: f32 = 1920.0;
pub const SOURCE_HEIGHT: f32 = 1080.0;
pub const BONE_COLOR: &str = "#00ff00";
pub const BONE_WIDTH: f64 = 3.0;
pub const JOINT_COLOR: &str = "#ff0000";
pub const JOINT_RADIUS: f64 = 5.0;

// Scene
pub const CLEAR_COLOR: [f64; 3] = [0.02, 0.02, 0.04];
pub const MARKER_RADIUS: f32 = 0.5;
pub const TARGET_RADIUS: f32 = 0.15;
pub const TARGET_ALPHA: f32 = 0.35;
pub const RING_MARGIN: f32 = 0.6;
pub const RING_DOT_BASE: f32 = 0.12;
pub const RING_DOT_SPAN: f32 = 0.25;
pub const RING_ALPHA_BASE: f32 = 0.25;
pub const MAX_INSTANCES: usize = 32;

// Two tracked people, blue then red
pub const MESH_COLORS: [[f32; 4]; 2] = [
    [0.204, 0.596, 0.859, 1.0],
    [0.906, 0.298, 0.235, 1.0],
];
pub const KEY_LIGHT: [f32; 4] = [0.3, 1.0, 1.0, 0.8];
pub const FILL_LIGHT: [f32; 4] = [-1.0, -0.5, 0.5, 0.3];
