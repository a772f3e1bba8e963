//! Offline check of a per-frame asset directory, mirroring what the web
//! loader does: every frame settles independently and failures are counted,
//! never fatal.

use clap::ValueEnum;
use groove_core::{frame_stem, mesh_frame_from_json_str, KeypointFrame, LoadProgress, Topology};
use std::io::Write;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FrameKind {
    /// `{index:06}.json` with an `annots[0].keypoints` list
    Keypoints,
    /// `{index:06}.json` person meshes plus `topology.json`
    Mesh,
}

#[derive(Debug, Default)]
pub struct FrameReport {
    pub progress: LoadProgress,
    /// Frames whose document does not exist.
    pub missing: Vec<usize>,
    /// Frames that exist but could not be used.
    pub failed: Vec<(usize, String)>,
    /// Keypoint frames with no annotated person.
    pub empty: usize,
    pub topology_error: Option<String>,
}

pub fn check_dir(dir: &Path, count: usize, kind: FrameKind) -> FrameReport {
    let mut report = FrameReport {
        progress: LoadProgress::new(count),
        ..FrameReport::default()
    };

    let topology = match kind {
        FrameKind::Keypoints => None,
        FrameKind::Mesh => match read_topology(dir) {
            Ok(t) => Some(t),
            Err(e) => {
                log::warn!("[frames] topology: {}", e);
                report.topology_error = Some(e);
                None
            }
        },
    };

    for index in 0..count {
        let path = dir.join(format!("{}.json", frame_stem(index)));
        let text = match std::fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                report.missing.push(index);
                report.progress.record(false);
                continue;
            }
            Err(e) => {
                report.failed.push((index, e.to_string()));
                report.progress.record(false);
                continue;
            }
        };
        let checked = match kind {
            FrameKind::Keypoints => KeypointFrame::from_json_str(&text)
                .map(|f| {
                    if f.is_none() {
                        report.empty += 1;
                    }
                })
                .map_err(|e| e.to_string()),
            FrameKind::Mesh => check_mesh(&text, topology.as_ref()),
        };
        match checked {
            Ok(()) => report.progress.record(true),
            Err(e) => {
                log::debug!("[frames] {}: {}", path.display(), e);
                report.failed.push((index, e));
                report.progress.record(false);
            }
        }
    }
    log::info!(
        "[frames] {} loaded, {} missing, {} failed",
        report.progress.loaded,
        report.missing.len(),
        report.failed.len()
    );
    report
}

fn read_topology(dir: &Path) -> Result<Topology, String> {
    let text = std::fs::read_to_string(dir.join("topology.json")).map_err(|e| e.to_string())?;
    Topology::from_json_str(&text).map_err(|e| e.to_string())
}

fn check_mesh(text: &str, topology: Option<&Topology>) -> Result<(), String> {
    let people = mesh_frame_from_json_str(text).map_err(|e| e.to_string())?;
    let Some(topology) = topology else {
        return Ok(());
    };
    let mut scratch = vec![0.0; topology.num_vertices * 3];
    for person in &people {
        person
            .write_positions(topology, &mut scratch)
            .map_err(|e| e.to_string())?;
    }
    Ok(())
}

fn ranges(indices: &[usize]) -> String {
    let mut parts = Vec::new();
    let mut iter = indices.iter().copied().peekable();
    while let Some(start) = iter.next() {
        let mut end = start;
        while iter.peek() == Some(&(end + 1)) {
            end += 1;
            iter.next();
        }
        parts.push(if start == end {
            start.to_string()
        } else {
            format!("{}-{}", start, end)
        });
    }
    parts.join(",")
}

pub fn write_report(out: &mut impl Write, r: &FrameReport) -> std::io::Result<()> {
    let p = &r.progress;
    writeln!(out, "loaded  {}/{} ({:.0}%)", p.loaded, p.expected, p.percent())?;
    if let Some(e) = &r.topology_error {
        writeln!(out, "topology unusable: {}", e)?;
    }
    if !r.missing.is_empty() {
        writeln!(out, "missing {}", ranges(&r.missing))?;
    }
    if r.empty > 0 {
        writeln!(out, "empty   {}", r.empty)?;
    }
    for (index, reason) in &r.failed {
        writeln!(out, "failed  {}: {}", frame_stem(*index), reason)?;
    }
    Ok(())
}
