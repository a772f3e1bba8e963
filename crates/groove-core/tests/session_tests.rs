// Host-side tests for the per-frame session: clock, synthesizer and camera together.

use glam::Vec2;
use groove_core::{Analysis, PlaybackClock, Session, SynthConfig};
use serde_json::json;

fn analysis() -> Analysis {
    let spectral: Vec<_> = (0..=60)
        .map(|i| {
            json!({
                "time": i as f64 * 0.1,
                "spectral_centroid": 2500.0,
                "spectral_rolloff": 5000.0,
                "rms_energy": 0.2,
            })
        })
        .collect();
    let doc = json!({
        "temporal_features": {
            "beats": [1.0, 2.0, 3.0],
            "spectral_features": spectral,
        },
        "metadata": {"duration": 6.0},
    });
    Analysis::from_json_str(&doc.to_string()).unwrap()
}

fn session() -> Session {
    Session::new(analysis(), SynthConfig::default(), PlaybackClock::external())
}

/// Drive the session as an audio element would, one frame every `1/60` s.
fn play_through(s: &mut Session, from: f64, to: f64, now_ms: &mut f64) -> usize {
    let mut beats = 0;
    let mut t = from;
    while t <= to {
        *now_ms += 1000.0 / 60.0;
        if s.frame(*now_ms, Some(t)).beat.is_some() {
            beats += 1;
        }
        t += 1.0 / 60.0;
    }
    beats
}

#[test]
fn duration_comes_from_analysis() {
    let s = session();
    assert_eq!(s.clock().duration(), Some(6.0));
}

#[test]
fn stopped_session_does_not_move() {
    let mut s = session();
    let out = s.frame(0.0, Some(2.0));
    assert!(!out.playing);
    assert_eq!(out.time, 0.0);
    assert_eq!(out.marker.position, Vec2::ZERO);
    assert!(out.beat.is_none());
}

#[test]
fn playing_through_fires_every_beat() {
    let mut s = session();
    s.play();
    let mut now = 0.0;
    assert_eq!(play_through(&mut s, 0.0, 3.5, &mut now), 3);
    assert!(s.synth().marker().position.length() > 0.0);
}

#[test]
fn backwards_jump_resyncs_and_refires() {
    let mut s = session();
    s.play();
    let mut now = 0.0;
    assert_eq!(play_through(&mut s, 0.0, 2.5, &mut now), 2);

    // native controls scrubbed back to 0.5 s
    now += 16.0;
    let out = s.frame(now, Some(0.5));
    assert!(out.beat.is_none());
    assert_eq!(out.marker.velocity, Vec2::ZERO);
    assert_eq!(s.synth().beats().cursor(), 0);

    assert_eq!(play_through(&mut s, 0.52, 2.5, &mut now), 2);
}

#[test]
fn explicit_seek_snaps_camera() {
    let mut s = session();
    s.play();
    let t = s.seek(4.0);
    assert_eq!(t, 4.0);
    let marker = s.synth().marker().position;
    assert_eq!(s.camera().state().position, marker);
    assert_eq!(s.seek(99.0), 6.0);
}

#[test]
fn camera_trails_the_marker() {
    let mut s = session();
    s.play();
    let mut now = 0.0;
    play_through(&mut s, 0.0, 1.2, &mut now);
    let marker = s.synth().marker().position;
    let eye = s.camera().eye();
    // lagging behind but on its way
    assert!(eye.truncate().distance(marker) > 0.0);
    assert!(eye.truncate().length() > 0.0);
    assert_eq!(eye.z, SynthConfig::default().camera.distance);
}

#[test]
fn ended_rewinds_and_stops() {
    let mut s = session();
    s.play();
    let mut now = 0.0;
    play_through(&mut s, 0.0, 1.5, &mut now);
    s.on_ended();
    assert!(!s.clock().is_playing());
    assert_eq!(s.clock().time(), 0.0);
    assert_eq!(s.synth().beats().cursor(), 0);
}

#[test]
fn stepped_session_reports_frame_index() {
    let mut s = Session::new(analysis(), SynthConfig::default(), PlaybackClock::stepped(10.0, 50));
    s.play();
    s.frame(0.0, None);
    let out = s.frame(100.0, None);
    assert_eq!(out.frame_index, 1);
    assert!((out.time - 0.1).abs() < 1e-12);
}

#[test]
fn slow_stepped_clock_still_fires_beats() {
    let mut a = analysis();
    a.beats = vec![2.0, 4.0, 6.0, 8.0];
    // one frame every two seconds, six frames
    let mut s = Session::new(a, SynthConfig::default(), PlaybackClock::stepped(0.5, 6));
    s.play();
    let mut fired = Vec::new();
    for step in 0..=5 {
        let out = s.frame(step as f64 * 2000.0, None);
        if let Some(hit) = out.beat {
            fired.push(hit.beat_time);
        }
    }
    assert_eq!(fired, vec![2.0, 4.0, 6.0, 8.0]);
}
