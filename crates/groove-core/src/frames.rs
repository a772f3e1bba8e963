//! Per-frame assets: keypoint skeletons, body meshes, and load bookkeeping.

use crate::error::FrameError;
use glam::Vec3;
use serde::Deserialize;

/// Bone list for the 15-joint body layout (head/neck, arms, spine, legs).
pub const SKELETON_CONNECTIONS: [(usize, usize); 16] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 4),
    (1, 5),
    (5, 6),
    (6, 7),
    (1, 8),
    (8, 9),
    (8, 10),
    (9, 10),
    (10, 11),
    (8, 12),
    (8, 13),
    (12, 13),
    (13, 14),
];

/// Six-digit zero-padded file stem used for every per-frame asset.
#[inline]
pub fn frame_stem(index: usize) -> String {
    format!("{:06}", index)
}

/// Conventional asset locations relative to the page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetPaths {
    pub root: String,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            root: "assets".to_string(),
        }
    }
}

impl AssetPaths {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }

    pub fn analysis(&self, id: &str) -> String {
        format!("{}/analyses/{}.json", self.root, id)
    }

    pub fn audio(&self, id: &str) -> String {
        format!("{}/audio/{}.mp3", self.root, id)
    }

    pub fn config(&self) -> String {
        format!("{}/config.json", self.root)
    }

    pub fn keypoint_json(&self, id: &str, index: usize) -> String {
        format!("{}/{}/{}.json", self.root, id, frame_stem(index))
    }

    pub fn keypoint_image(&self, id: &str, index: usize) -> String {
        format!("{}/{}/{}.jpg", self.root, id, frame_stem(index))
    }

    pub fn mesh_json(&self, index: usize) -> String {
        format!("{}/motion-data/{}.json", self.root, frame_stem(index))
    }

    pub fn mesh_image(&self, index: usize) -> String {
        format!("{}/motion-data/{}.jpg", self.root, frame_stem(index))
    }

    pub fn topology(&self) -> String {
        format!("{}/motion-data/topology.json", self.root)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub confidence: f32,
}

impl Keypoint {
    #[inline]
    pub fn is_visible(&self, min_confidence: f32) -> bool {
        self.confidence > min_confidence
    }
}

#[derive(Deserialize)]
struct KeypointDocument {
    #[serde(default)]
    annots: Vec<Annotation>,
}

#[derive(Deserialize)]
struct Annotation {
    #[serde(default)]
    keypoints: Vec<Vec<f32>>,
}

/// Keypoints of the first annotated person in a frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeypointFrame {
    pub keypoints: Vec<Keypoint>,
}

impl KeypointFrame {
    /// Parse a frame document; `Ok(None)` when it has no annotated person.
    pub fn from_json_str(json: &str) -> Result<Option<Self>, FrameError> {
        let doc: KeypointDocument = serde_json::from_str(json)?;
        Ok(doc.annots.into_iter().next().map(|a| Self {
            keypoints: a
                .keypoints
                .iter()
                .map(|kp| Keypoint {
                    x: kp.first().copied().unwrap_or(0.0),
                    y: kp.get(1).copied().unwrap_or(0.0),
                    confidence: kp.get(2).copied().unwrap_or(0.0),
                })
                .collect(),
        }))
    }

    /// Bones whose two endpoints are both confidently detected.
    pub fn visible_bones(
        &self,
        min_confidence: f32,
    ) -> impl Iterator<Item = (Keypoint, Keypoint)> + '_ {
        SKELETON_CONNECTIONS.iter().filter_map(move |&(a, b)| {
            let (ka, kb) = (self.keypoints.get(a)?, self.keypoints.get(b)?);
            (ka.is_visible(min_confidence) && kb.is_visible(min_confidence)).then_some((*ka, *kb))
        })
    }

    pub fn visible_joints(&self, min_confidence: f32) -> impl Iterator<Item = Keypoint> + '_ {
        self.keypoints
            .iter()
            .copied()
            .filter(move |k| k.is_visible(min_confidence))
    }
}

/// Mesh topology shared by every frame of a sequence.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Topology {
    pub faces: Vec<[u32; 3]>,
    pub num_vertices: usize,
}

impl Topology {
    pub fn from_json_str(json: &str) -> Result<Self, FrameError> {
        let topo: Self = serde_json::from_str(json)?;
        topo.validate()?;
        Ok(topo)
    }

    pub fn validate(&self) -> Result<(), FrameError> {
        for (face, tri) in self.faces.iter().enumerate() {
            if let Some(&index) = tri.iter().find(|&&i| i as usize >= self.num_vertices) {
                return Err(FrameError::FaceOutOfRange {
                    face,
                    index,
                    num_vertices: self.num_vertices,
                });
            }
        }
        Ok(())
    }

    /// Flat triangle index list for an index buffer.
    pub fn indices(&self) -> Vec<u32> {
        self.faces.iter().flatten().copied().collect()
    }
}

/// One tracked person in a mesh frame.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PersonMesh {
    pub id: u32,
    #[serde(default)]
    pub vertices: Vec<[f32; 3]>,
    #[serde(rename = "Th", default)]
    pub translation: Vec<[f32; 3]>,
    #[serde(rename = "Rh", default)]
    pub rotation: Vec<[f32; 3]>,
}

impl PersonMesh {
    /// Write this person's vertices into a flat `xyz` position buffer.
    pub fn write_positions(&self, topology: &Topology, out: &mut [f32]) -> Result<(), FrameError> {
        if self.vertices.len() != topology.num_vertices || out.len() < self.vertices.len() * 3 {
            return Err(FrameError::VertexCount {
                person: self.id,
                got: self.vertices.len(),
                expected: topology.num_vertices,
            });
        }
        for (dst, v) in out.chunks_exact_mut(3).zip(&self.vertices) {
            dst.copy_from_slice(v);
        }
        Ok(())
    }
}

pub type MeshFrame = Vec<PersonMesh>;

pub fn mesh_frame_from_json_str(json: &str) -> Result<MeshFrame, FrameError> {
    Ok(serde_json::from_str(json)?)
}

/// Area-weighted per-vertex normals for an indexed triangle mesh.
pub fn vertex_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
    let n = positions.len() / 3;
    let mut acc = vec![Vec3::ZERO; n];
    let at = |i: u32| {
        let i = i as usize * 3;
        Vec3::new(positions[i], positions[i + 1], positions[i + 2])
    };
    for tri in indices.chunks_exact(3) {
        if tri.iter().any(|&i| i as usize >= n) {
            continue;
        }
        let (a, b, c) = (at(tri[0]), at(tri[1]), at(tri[2]));
        let face = (b - a).cross(c - a);
        for &i in tri {
            acc[i as usize] += face;
        }
    }
    acc.iter()
        .flat_map(|v| v.normalize_or_zero().to_array())
        .collect()
}

/// One slot per frame; failed loads leave their slot empty.
#[derive(Clone, Debug)]
pub struct FrameStore<T> {
    slots: Vec<Option<T>>,
}

impl<T> FrameStore<T> {
    pub fn new(frame_count: usize) -> Self {
        Self {
            slots: std::iter::repeat_with(|| None).take(frame_count).collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn insert(&mut self, index: usize, value: T) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = Some(value);
        }
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn loaded(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn missing(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.is_none().then_some(i))
    }
}

/// Settle a frame whose document and video still were fetched separately.
///
/// Either part on its own is enough to show the frame; the failed part is
/// logged and left out. Only when both fail is the document error returned.
pub fn settle_frame_parts<D, I, E: std::fmt::Display>(
    index: usize,
    doc: Result<D, E>,
    image: Result<I, E>,
) -> Result<(Option<D>, Option<I>), E> {
    match (doc, image) {
        (Err(doc_err), Err(image_err)) => {
            log::warn!("[loader] frame {} image: {:#}", index, image_err);
            Err(doc_err)
        }
        (doc, image) => {
            let doc = doc
                .map_err(|e| log::warn!("[loader] frame {} document: {:#}", index, e))
                .ok();
            let image = image
                .map_err(|e| log::warn!("[loader] frame {} image: {:#}", index, e))
                .ok();
            Ok((doc, image))
        }
    }
}

/// Load progress over a batch of independently settling assets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadProgress {
    pub expected: usize,
    pub loaded: usize,
    pub failed: usize,
}

impl LoadProgress {
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            ..Self::default()
        }
    }

    #[inline]
    pub fn record(&mut self, ok: bool) {
        if ok {
            self.loaded += 1;
        } else {
            self.failed += 1;
        }
    }

    #[inline]
    pub fn settled(&self) -> usize {
        self.loaded + self.failed
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.settled() >= self.expected
    }

    /// Settled share of the batch in percent.
    pub fn percent(&self) -> f32 {
        if self.expected == 0 {
            100.0
        } else {
            (self.settled() as f32 / self.expected as f32 * 100.0).min(100.0)
        }
    }
}

/// `"power-up"` → `"Power Up"`.
pub fn title_from_id(id: &str) -> String {
    id.split('-')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `m:ss` label for a playback time.
pub fn format_time(seconds: f64) -> String {
    let s = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let mins = (s / 60.0).floor() as u64;
    let secs = (s % 60.0).floor() as u64;
    format!("{}:{:02}", mins, secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_parts_settle_independently() {
        let ok: Result<u8, String> = Ok(1);
        let err = |m: &str| -> Result<u8, String> { Err(m.to_string()) };

        assert_eq!(settle_frame_parts(0, ok.clone(), ok.clone()), Ok((Some(1), Some(1))));
        // a missing document still shows the still
        assert_eq!(settle_frame_parts(7, err("404"), ok.clone()), Ok((None, Some(1))));
        assert_eq!(settle_frame_parts(7, ok, err("decode")), Ok((Some(1), None)));
        assert_eq!(
            settle_frame_parts(7, err("404"), err("decode")),
            Err::<(Option<u8>, Option<u8>), _>("404".to_string())
        );
    }

    #[test]
    fn stems_and_paths() {
        assert_eq!(frame_stem(42), "000042");
        let p = AssetPaths::default();
        assert_eq!(p.keypoint_json("power-up", 7), "assets/power-up/000007.json");
        assert_eq!(p.analysis("power-up"), "assets/analyses/power-up.json");
        assert_eq!(p.topology(), "assets/motion-data/topology.json");
        assert_eq!(p.mesh_image(3), "assets/motion-data/000003.jpg");
    }

    #[test]
    fn keypoint_frame_takes_first_person() {
        let f = KeypointFrame::from_json_str(
            r#"{"annots":[{"keypoints":[[1,2,0.9],[3,4,0.2]]},{"keypoints":[[9,9,1]]}]}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(f.keypoints.len(), 2);
        assert_eq!(f.keypoints[0], Keypoint { x: 1.0, y: 2.0, confidence: 0.9 });
        assert_eq!(f.visible_bones(0.3).count(), 0);
        assert_eq!(f.visible_joints(0.3).count(), 1);
        assert!(KeypointFrame::from_json_str(r#"{"annots":[]}"#).unwrap().is_none());
    }

    #[test]
    fn topology_rejects_out_of_range_faces() {
        let err = Topology::from_json_str(r#"{"faces":[[0,1,3]],"num_vertices":3}"#).unwrap_err();
        assert!(matches!(err, FrameError::FaceOutOfRange { index: 3, .. }));
    }

    #[test]
    fn normals_of_flat_triangle_point_up_z() {
        let pos = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let n = vertex_normals(&pos, &[0, 1, 2]);
        assert_eq!(&n[0..3], &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn progress_counts_failures_as_settled() {
        let mut p = LoadProgress::new(4);
        p.record(true);
        p.record(false);
        assert_eq!(p.percent(), 50.0);
        assert!(!p.is_done());
        p.record(true);
        p.record(true);
        assert!(p.is_done());
    }

    #[test]
    fn titles_and_time_labels() {
        assert_eq!(title_from_id("zaz-champs-elysees"), "Zaz Champs Elysees");
        assert_eq!(format_time(75.9), "1:15");
        assert_eq!(format_time(-3.0), "0:00");
    }

    #[test]
    fn store_tracks_missing_slots() {
        let mut s = FrameStore::new(3);
        s.insert(1, "b");
        s.insert(9, "ignored");
        assert_eq!(s.loaded(), 1);
        assert_eq!(s.missing().collect::<Vec<_>>(), vec![0, 2]);
    }
}
