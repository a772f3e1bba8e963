use groove_core::{Analysis, BoundaryEvent, PlaybackClock, Session, SynthConfig};
use serde::Serialize;
use std::io::Write;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TraceRow {
    pub time: f64,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub hue: f32,
    pub scale: f32,
    pub camera_x: f32,
    pub camera_y: f32,
    pub beat: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boundary: Option<&'static str>,
}

fn boundary_label(ev: BoundaryEvent) -> &'static str {
    match ev {
        BoundaryEvent::Reset => "reset",
        BoundaryEvent::Reflected => "reflected",
    }
}

/// Play the analysis from start to end at `fps`, as a browser would with
/// the audio element reporting its position every frame.
pub fn trace(analysis: Analysis, config: SynthConfig, fps: f64) -> Vec<TraceRow> {
    let fps = if fps.is_finite() && fps > 0.0 {
        fps
    } else {
        groove_core::constants::DEFAULT_FPS
    };
    let duration = analysis.duration();
    let mut session = Session::new(analysis, config, PlaybackClock::external());
    session.play();

    let frames = (duration * fps).floor() as usize;
    (0..=frames)
        .map(|i| {
            let t = i as f64 / fps;
            let out = session.frame(t * 1000.0, Some(t));
            let m = &out.marker;
            TraceRow {
                time: out.time,
                x: m.position.x,
                y: m.position.y,
                vx: m.velocity.x,
                vy: m.velocity.y,
                hue: m.color.hue,
                scale: m.scale,
                camera_x: out.camera_eye.x,
                camera_y: out.camera_eye.y,
                beat: out.beat.is_some(),
                boundary: out.boundary.map(boundary_label),
            }
        })
        .collect()
}

pub fn write_csv(out: &mut impl Write, rows: &[TraceRow]) -> std::io::Result<()> {
    writeln!(out, "time,x,y,vx,vy,hue,scale,camera_x,camera_y,beat,boundary")?;
    for r in rows {
        writeln!(
            out,
            "{:.4},{:.5},{:.5},{:.5},{:.5},{:.1},{:.4},{:.5},{:.5},{},{}",
            r.time,
            r.x,
            r.y,
            r.vx,
            r.vy,
            r.hue,
            r.scale,
            r.camera_x,
            r.camera_y,
            u8::from(r.beat),
            r.boundary.unwrap_or("")
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis() -> Analysis {
        let spectral: Vec<String> = (0..=40)
            .map(|i| {
                format!(
                    r#"{{"time": {}, "spectral_centroid": 2500.0, "spectral_rolloff": 5000.0, "rms_energy": 0.2}}"#,
                    i as f64 * 0.1
                )
            })
            .collect();
        let doc = format!(
            r#"{{"temporal_features": {{"beats": [1.0, 2.0, 3.0], "spectral_features": [{}]}}}}"#,
            spectral.join(",")
        );
        Analysis::from_json_str(&doc).unwrap()
    }

    #[test]
    fn trace_covers_the_track_and_marks_beats() {
        let rows = trace(analysis(), SynthConfig::default(), 30.0);
        assert_eq!(rows.len(), 121);
        assert_eq!(rows.iter().filter(|r| r.beat).count(), 3);
        assert!(rows.iter().all(|r| (r.x * r.x + r.y * r.y).sqrt() <= 5.0));
        assert_eq!(rows[0].time, 0.0);
    }

    #[test]
    fn csv_has_header_and_one_line_per_row() {
        let rows = trace(analysis(), SynthConfig::default(), 10.0);
        let mut buf = Vec::new();
        write_csv(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), rows.len() + 1);
        assert!(lines[0].starts_with("time,x,y"));
        assert_eq!(lines[1].split(',').count(), 11);
    }
}
