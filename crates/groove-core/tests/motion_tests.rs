// Host-side tests for the motion synthesizer driven by synthetic analyses.

use glam::Vec2;
use groove_core::{Analysis, BoundaryEvent, BoundaryPolicy, MotionSynthesizer, SynthConfig};
use serde_json::{json, Value};

const FPS: f64 = 30.0;

fn spectral(times: impl Iterator<Item = f64>, f: impl Fn(f64) -> (f32, f32, f32)) -> Vec<Value> {
    times
        .map(|t| {
            let (centroid, rolloff, rms) = f(t);
            json!({
                "time": t,
                "spectral_centroid": centroid,
                "spectral_rolloff": rolloff,
                "zero_crossing_rate": 0.05,
                "rms_energy": rms,
            })
        })
        .collect()
}

fn analysis(beats: &[f64], spectral: Vec<Value>, pitch: Vec<Value>) -> Analysis {
    let doc = json!({
        "pitch_analysis": pitch,
        "temporal_features": {
            "beats": beats,
            "onsets": [],
            "spectral_features": spectral,
        },
    });
    Analysis::from_json_str(&doc.to_string()).unwrap()
}

fn steady_spectrum(until: f64) -> Vec<Value> {
    // centroid 2500 Hz -> angle pi, rolloff 5000 Hz -> distance 1.5
    spectral((0..=(until * 10.0) as usize).map(|i| i as f64 * 0.1), |_| (2500.0, 5000.0, 0.2))
}

fn pitch_at_one(all: Value) -> Vec<Value> {
    vec![json!({
        "time": 1.0,
        "dominant_pitches": [{"note": "C", "strength": 0.9}],
        "all_pitches": all,
    })]
}

fn run(synth: &mut MotionSynthesizer, until: f64) -> usize {
    let mut beats = 0;
    let frames = (until * FPS) as usize;
    for i in 0..=frames {
        let report = synth.tick(i as f64 / FPS, (1.0 / FPS) as f32);
        if report.beat.is_some() {
            beats += 1;
        }
    }
    beats
}

#[test]
fn three_beats_fire_three_times() {
    let a = analysis(&[1.0, 2.0, 3.0], steady_spectrum(4.0), vec![]);
    let mut synth = MotionSynthesizer::new(a, SynthConfig::default());
    assert_eq!(run(&mut synth, 4.0), 3);
    assert_eq!(synth.beats().fired_count(), 3);
}

#[test]
fn first_beat_targets_smoothed_spectrum() {
    let a = analysis(&[1.0], steady_spectrum(2.0), vec![]);
    let mut synth = MotionSynthesizer::new(a, SynthConfig::default());
    for i in 0..30 {
        synth.tick(i as f64 / FPS, (1.0 / FPS) as f32);
    }
    let report = synth.tick(1.0, (1.0 / FPS) as f32);
    assert!(report.beat.is_some());
    let m = synth.marker();
    assert!((m.target - Vec2::new(-1.5, 0.0)).length() < 1e-4);
    assert!((m.original_velocity - Vec2::new(-1.5, 0.0)).length() < 1e-4);
    assert!(m.velocity.x < 0.0);
}

#[test]
fn beat_pulse_scales_then_decays() {
    let a = analysis(&[1.0], steady_spectrum(2.0), vec![]);
    let mut synth = MotionSynthesizer::new(a, SynthConfig::default());
    synth.tick(1.0, 0.0);
    let m = synth.marker();
    assert!((m.scale - 1.3).abs() < 1e-6);
    assert!((m.pulse - 0.95).abs() < 1e-6);
    synth.tick(1.0 + 1.0 / FPS, (1.0 / FPS) as f32);
    assert!((synth.marker().pulse - 0.95 * 0.95).abs() < 1e-6);
    synth.idle();
    assert!((synth.marker().scale - (1.0 + 0.9025 * 0.3)).abs() < 1e-5);
}

#[test]
fn single_dominant_pitch_steers_velocity() {
    let a = analysis(
        &[1.0],
        steady_spectrum(2.0),
        pitch_at_one(json!({"C": 0.9, "D": 0.1, "E": 0.1, "G": 0.2})),
    );
    let mut synth = MotionSynthesizer::new(a, SynthConfig::default());
    let report = synth.tick(1.0, (1.0 / FPS) as f32);
    assert_eq!(report.dominant, Some(groove_core::PitchClass::C));
    let dir = synth.marker().velocity.normalize();
    let expected = Vec2::from_angle(15f32.to_radians());
    assert!((dir - expected).length() < 1e-4, "{:?}", dir);
    // speed is preserved from the beat
    assert!((synth.marker().velocity.length() - 1.5).abs() < 1e-3);
}

#[test]
fn competing_pitch_suppresses_override() {
    let a = analysis(
        &[1.0],
        steady_spectrum(2.0),
        pitch_at_one(json!({"C": 0.8, "D": 0.6})),
    );
    let mut synth = MotionSynthesizer::new(a, SynthConfig::default());
    let report = synth.tick(1.0, (1.0 / FPS) as f32);
    assert_eq!(report.dominant, None);
    let dir = synth.marker().velocity.normalize();
    assert!((dir - Vec2::new(-1.0, 0.0)).length() < 1e-4);
}

#[test]
fn half_strength_colour() {
    let pitch = vec![json!({
        "time": 0.0,
        "dominant_pitches": [{"note": "A", "strength": 0.5}],
        "all_pitches": {"A": 0.5},
    })];
    let a = analysis(&[], steady_spectrum(1.0), pitch);
    let mut synth = MotionSynthesizer::new(a, SynthConfig::default());
    synth.tick(0.0, 0.0);
    let c = synth.marker().color;
    assert_eq!((c.hue, c.saturation, c.lightness), (180.0, 70.0, 65.0));
}

fn turbulent(boundary: BoundaryPolicy) -> (MotionSynthesizer, SynthConfig) {
    let beats: Vec<f64> = (1..80).map(|i| i as f64 * 0.25).collect();
    let samples = spectral((0..=200).map(|i| i as f64 * 0.1), |t| {
        let centroid = 500.0 + 4400.0 * ((t * 1.7).sin() * 0.5 + 0.5) as f32;
        let rms = if (t * 10.0) as usize % 3 == 0 { 1.0 } else { 0.05 };
        (centroid, 10_000.0, rms)
    });
    let config = SynthConfig {
        velocity_scale: 10.0,
        max_velocity: 40.0,
        acceleration_scale: 50.0,
        ..SynthConfig::default()
    }
    .with_boundary(boundary);
    let onsets: Vec<f64> = beats.iter().map(|b| b - 0.01).collect();
    let mut a = analysis(&beats, samples, vec![]);
    a.onsets = onsets;
    (MotionSynthesizer::new(a, config.clone()), config)
}

#[test]
fn position_stays_inside_stage_when_resetting() {
    let (mut synth, cfg) = turbulent(BoundaryPolicy::ResetAtBoundary);
    let mut resets = 0;
    for i in 0..600 {
        let r = synth.tick(i as f64 / FPS, (1.0 / FPS) as f32);
        if r.boundary == Some(BoundaryEvent::Reset) {
            resets += 1;
        }
        assert!(synth.marker().position.length() < cfg.boundary_radius() + 1e-4);
    }
    assert!(resets > 0);
}

#[test]
fn position_stays_inside_stage_when_reflecting() {
    let (mut synth, cfg) = turbulent(BoundaryPolicy::ReflectAtBoundary);
    let mut bounces = 0;
    for i in 0..600 {
        let r = synth.tick(i as f64 / FPS, (1.0 / FPS) as f32);
        if r.boundary == Some(BoundaryEvent::Reflected) {
            bounces += 1;
        }
        assert!(synth.marker().position.length() <= cfg.max_radius + 1e-4);
    }
    assert!(bounces > 0);
}

#[test]
fn speed_is_zero_or_within_limits() {
    for policy in [BoundaryPolicy::ResetAtBoundary, BoundaryPolicy::ReflectAtBoundary] {
        let (mut synth, cfg) = turbulent(policy);
        for i in 0..600 {
            synth.tick(i as f64 / FPS, (1.0 / FPS) as f32);
            let speed = synth.marker().velocity.length();
            assert!(speed == 0.0 || speed >= cfg.min_velocity - 1e-6);
            assert!(speed <= cfg.max_velocity + 1e-3);
        }
    }
}

#[test]
fn seek_rests_marker_on_target() {
    let a = analysis(&[1.0, 2.0, 3.0], steady_spectrum(4.0), vec![]);
    let mut synth = MotionSynthesizer::new(a, SynthConfig::default());
    run(&mut synth, 2.5);
    synth.seek(0.5);
    let m = synth.marker();
    assert_eq!(m.velocity, Vec2::ZERO);
    assert_eq!(m.position, m.target);
    assert_eq!(synth.beats().cursor(), 0);
    // the same beats fire again after seeking back
    let mut fired = 0;
    for i in 15..=100 {
        if synth.tick(i as f64 / FPS, (1.0 / FPS) as f32).beat.is_some() {
            fired += 1;
        }
    }
    assert_eq!(fired, 3);
}

// rms 0.1 everywhere except a single loud sample at 2.0s
fn quiet_then_loud(onsets: &[f64]) -> MotionSynthesizer {
    let samples = spectral((0..=30).map(|i| i as f64 * 0.1), |t| {
        let rms = if (t - 2.0).abs() < 1e-9 { 0.3 } else { 0.1 };
        (2500.0, 5000.0, rms)
    });
    let mut a = analysis(&[1.0], samples, vec![]);
    a.onsets = onsets.to_vec();
    let mut synth = MotionSynthesizer::new(a, SynthConfig::default());
    assert!(synth.check_for_beat(1.0).is_some());
    assert!((synth.marker().velocity - Vec2::new(-1.5, 0.0)).length() < 1e-5);
    synth
}

// mean over [t - 4, t] at t = 2.0: twenty quiet samples and the loud one
fn loud_diff() -> f32 {
    let average = (20.0 * 0.1 + 0.3) / 21.0;
    (0.3 - average) / average
}

#[test]
fn loud_sample_accelerates_along_heading() {
    let cfg = SynthConfig::default();
    let mut synth = quiet_then_loud(&[]);
    let strength = synth.update_velocity(2.0, 0.1);
    assert_eq!(strength, 0.0);
    let expected = 1.5 + loud_diff() * cfg.acceleration_scale * 0.1;
    let v = synth.marker().velocity;
    assert!((v.length() - expected).abs() < 1e-4, "{} vs {}", v.length(), expected);
    assert!(v.y.abs() < 1e-6 && v.x < 0.0);
}

#[test]
fn recent_onset_boosts_acceleration() {
    let cfg = SynthConfig::default();
    let mut plain = quiet_then_loud(&[]);
    let mut boosted = quiet_then_loud(&[1.99]);
    plain.update_velocity(2.0, 0.1);
    let strength = boosted.update_velocity(2.0, 0.1);

    let expected_strength = (-cfg.onset_decay_rate * 0.01f32).exp();
    assert!((strength - expected_strength).abs() < 1e-4);

    let boost = 1.0 + expected_strength * cfg.onset_boost_factor;
    let expected = 1.5 + loud_diff() * cfg.acceleration_scale * boost * 0.1;
    let speed = boosted.marker().velocity.length();
    assert!((speed - expected).abs() < 1e-4, "{} vs {}", speed, expected);
    assert!(speed > plain.marker().velocity.length() + 0.1);
}

#[test]
fn steady_energy_relaxes_toward_beat_velocity() {
    let cfg = SynthConfig::default();
    let mut synth = quiet_then_loud(&[]);
    synth.update_velocity(2.0, 0.1);
    let sped_up = synth.marker().velocity;
    let original = synth.marker().original_velocity;
    assert!(sped_up.length() > original.length());

    // at 3.0s rms 0.1 sits within 10% of its 3.3/31 average
    synth.update_velocity(3.0, 0.1);
    let k = cfg.velocity_return_rate * 0.1;
    let expected = sped_up + (original - sped_up) * k;
    assert!((synth.marker().velocity - expected).length() < 1e-4);
}

#[test]
fn quiet_sample_decelerates() {
    let samples = spectral((0..=30).map(|i| i as f64 * 0.1), |t| {
        let rms = if (t - 2.0).abs() < 1e-9 { 0.05 } else { 0.2 };
        (2500.0, 5000.0, rms)
    });
    let a = analysis(&[1.0], samples, vec![]);
    let mut synth = MotionSynthesizer::new(a, SynthConfig::default());
    synth.check_for_beat(1.0);
    synth.update_velocity(2.0, 0.1);
    let v = synth.marker().velocity;
    assert!(v.length() < 1.5);
    assert!(v.x < 0.0);
}

#[test]
fn reflect_policy_mirrors_an_out_of_range_target() {
    // a negative margin lets targets land past the edge
    let a = || {
        let samples = spectral((0..=20).map(|i| i as f64 * 0.1), |_| (0.0, 10_000.0, 0.2));
        analysis(&[1.0], samples, vec![])
    };
    let cfg = SynthConfig {
        target_radius_margin: -3.0,
        ..SynthConfig::default()
    };
    assert!(cfg.validate().is_err());

    let reflect_cfg = cfg.clone().with_boundary(BoundaryPolicy::ReflectAtBoundary);
    let mut reflect = MotionSynthesizer::new(a(), reflect_cfg);
    reflect.check_for_beat(1.0);
    // straight out to 8 from the origin, bounced back 3 inside the edge at 5
    assert!((reflect.marker().target - Vec2::new(2.0, 0.0)).length() < 1e-4);

    let reset_cfg = cfg.with_boundary(BoundaryPolicy::ResetAtBoundary);
    let mut reset = MotionSynthesizer::new(a(), reset_cfg);
    reset.check_for_beat(1.0);
    assert_eq!(reset.marker().target, Vec2::ZERO);
}
