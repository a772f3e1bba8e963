// Host-side tests for the pure input helpers.
// The main crate is wasm-only, so we include the pure-Rust modules directly.

#![allow(dead_code)]
#[path = "../src/input.rs"]
mod input;

use input::*;

#[test]
fn playback_keys() {
    assert_eq!(action_for_key(" "), Some(KeyAction::TogglePlay));
    assert_eq!(action_for_key("k"), Some(KeyAction::TogglePlay));
    assert_eq!(action_for_key("ArrowLeft"), Some(KeyAction::SeekBy(-SEEK_STEP_SEC)));
    assert_eq!(action_for_key("ArrowRight"), Some(KeyAction::SeekBy(SEEK_STEP_SEC)));
    assert_eq!(action_for_key("Home"), Some(KeyAction::SeekTo(0.0)));
    assert_eq!(action_for_key("B"), Some(KeyAction::ToggleBoundary));
    assert_eq!(action_for_key("?"), Some(KeyAction::ToggleHelp));
}

#[test]
fn unmapped_keys_are_ignored() {
    for key in ["x", "Enter", "ArrowUp", "Shift", ""] {
        assert_eq!(action_for_key(key), None, "{key:?}");
    }
}

#[test]
fn timeline_click_maps_to_time() {
    assert_eq!(timeline_time(50.0, 200.0, 120.0), Some(30.0));
    assert_eq!(timeline_time(-10.0, 200.0, 120.0), Some(0.0));
    assert_eq!(timeline_time(500.0, 200.0, 120.0), Some(120.0));
    assert_eq!(timeline_time(50.0, 0.0, 120.0), None);
    assert_eq!(timeline_time(50.0, 200.0, f64::NAN), None);
    assert_eq!(timeline_time(50.0, 200.0, 0.0), None);
}

#[test]
fn query_params() {
    let search = "?track=power-up&frames=120&mesh=1&empty=";
    assert_eq!(query_param(search, "track").as_deref(), Some("power-up"));
    assert_eq!(query_param(search, "frames").as_deref(), Some("120"));
    assert_eq!(query_param(search, "empty").as_deref(), Some(""));
    assert_eq!(query_param(search, "fps"), None);
    assert_eq!(query_param("", "track"), None);
    assert_eq!(query_param("track", "track").as_deref(), Some(""));
}

#[test]
fn keypoints_scale_from_source_pixels() {
    let (x, y) = scale_to_canvas(960.0, 540.0, (1920.0, 1080.0), (640.0, 360.0));
    assert_eq!((x, y), (320.0, 180.0));
    // degenerate source passes through
    assert_eq!(scale_to_canvas(3.0, 4.0, (0.0, 1080.0), (640.0, 360.0)), (3.0, 4.0));
}
