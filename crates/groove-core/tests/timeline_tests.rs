// Host-side tests for sample lookup and the beat/onset cursors.

use groove_core::{nearest_index, BeatTracker, OnsetTracker};

#[test]
fn nearest_prefers_lower_index_on_ties() {
    let times = [0.0, 1.0, 2.0];
    assert_eq!(nearest_index(&times[..], 0.5), Some(0));
    assert_eq!(nearest_index(&times[..], 1.5), Some(1));
    assert_eq!(nearest_index(&times[..], 1.51), Some(2));
    assert_eq!(nearest_index(&times[..], -4.0), Some(0));
    assert_eq!(nearest_index(&times[..], 99.0), Some(2));
    assert_eq!(nearest_index(&[] as &[f64], 1.0), None);
}

#[test]
fn nearest_picks_first_of_duplicate_run() {
    let times = [0.0, 1.0, 1.0, 1.0, 2.0];
    assert_eq!(nearest_index(&times[..], 1.0), Some(1));
    assert_eq!(nearest_index(&times[..], 1.2), Some(1));
}

#[test]
fn each_beat_fires_at_most_once() {
    let beats: Vec<f64> = (1..=20).map(|i| i as f64 * 0.5).collect();
    let mut tr = BeatTracker::new(0.05, 0.15);
    let mut fired = Vec::new();
    let mut t = 0.0;
    while t < 11.0 {
        if let Some(hit) = tr.check(&beats, t) {
            fired.push(hit.beat_time);
        }
        t += 1.0 / 60.0;
    }
    let mut dedup = fired.clone();
    dedup.dedup();
    assert_eq!(fired, dedup);
    assert!(fired.len() <= beats.len());
    // 60 fps steps always land inside a 50 ms window
    assert_eq!(fired.len(), beats.len());
}

#[test]
fn cooldown_separates_firings() {
    let beats = [1.0, 1.02, 1.04, 1.1, 1.3];
    let mut tr = BeatTracker::new(0.05, 0.15);
    let mut fired_at = Vec::new();
    for i in 0..200 {
        let t = i as f64 * 0.01;
        if let Some(hit) = tr.check(&beats, t) {
            fired_at.push(hit.fired_at);
        }
    }
    for w in fired_at.windows(2) {
        assert!(w[1] - w[0] >= 0.15 - 1e-9, "{:?}", fired_at);
    }
    assert_eq!(tr.cursor(), beats.len());
}

#[test]
fn large_step_skips_stale_beats() {
    let beats = [1.0, 2.0, 3.0];
    let mut tr = BeatTracker::new(0.05, 0.15);
    // jumping straight past two beats fires neither
    assert!(tr.check(&beats, 2.5).is_none());
    assert_eq!(tr.cursor(), 2);
    assert_eq!(tr.check(&beats, 3.01).map(|h| h.beat_time), Some(3.0));
}

#[test]
fn rebase_allows_refiring_after_seeking_back() {
    let beats = [1.0, 2.0, 3.0];
    let mut tr = BeatTracker::new(0.05, 0.15);
    assert!(tr.check(&beats, 1.0).is_some());
    assert!(tr.check(&beats, 2.0).is_some());
    tr.rebase(&beats, 0.9);
    assert_eq!(tr.cursor(), 0);
    assert!(tr.window().interval().is_none());
    assert_eq!(tr.check(&beats, 1.0).map(|h| h.beat_time), Some(1.0));
}

#[test]
fn rebase_onto_a_beat_fires_it_immediately() {
    let beats = [1.0, 2.0];
    let mut tr = BeatTracker::new(0.05, 0.15);
    tr.rebase(&beats, 2.0);
    assert_eq!(tr.check(&beats, 2.0).map(|h| h.beat_time), Some(2.0));
}

#[test]
fn onset_strength_decays_and_expires() {
    let onsets = [1.0, 2.0];
    let mut tr = OnsetTracker::new(0.05, 20.0);
    assert_eq!(tr.observe(&onsets, 0.5), 0.0);
    assert!((tr.observe(&onsets, 1.0) - 1.0).abs() < 1e-6);
    let s = tr.observe(&onsets, 1.03);
    assert!((s - (-20.0f32 * 0.03).exp()).abs() < 1e-4);
    assert_eq!(tr.observe(&onsets, 1.2), 0.0);
    assert_eq!(tr.latest(), Some(1.0));
    tr.rebase(&onsets, 1.01);
    assert_eq!(tr.latest(), Some(1.0));
    tr.rebase(&onsets, 0.2);
    assert_eq!(tr.latest(), None);
}
