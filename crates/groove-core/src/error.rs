use thiserror::Error;

/// Failures while reading an analysis document.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analysis json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{series} is not sorted by time at index {index}")]
    Unsorted { series: &'static str, index: usize },
    #[error("{series} has a non-finite time at index {index}")]
    NonFinite { series: &'static str, index: usize },
}

/// Failures while reading per-frame keypoint/mesh documents.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("face {face} references vertex {index} but topology has {num_vertices} vertices")]
    FaceOutOfRange {
        face: usize,
        index: u32,
        num_vertices: usize,
    },
    #[error("person {person} has {got} vertices, expected {expected}")]
    VertexCount {
        person: u32,
        got: usize,
        expected: usize,
    },
}

/// Rejected tuning values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{field} must be {rule} (got {value})")]
    Invalid {
        field: &'static str,
        rule: &'static str,
        value: f64,
    },
}
