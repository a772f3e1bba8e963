//! Pure helpers behind the DOM handlers: key mapping, timeline hit-testing,
//! query parsing and skeleton coordinate scaling. Host-testable.

/// Seconds moved by one arrow-key press.
pub const SEEK_STEP_SEC: f64 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum KeyAction {
    TogglePlay,
    SeekBy(f64),
    SeekTo(f64),
    ToggleBoundary,
    ToggleHelp,
}

#[inline]
pub fn action_for_key(key: &str) -> Option<KeyAction> {
    match key {
        " " | "Spacebar" | "k" | "K" => Some(KeyAction::TogglePlay),
        "ArrowLeft" | "j" | "J" => Some(KeyAction::SeekBy(-SEEK_STEP_SEC)),
        "ArrowRight" | "l" | "L" => Some(KeyAction::SeekBy(SEEK_STEP_SEC)),
        "Home" | "0" => Some(KeyAction::SeekTo(0.0)),
        "b" | "B" => Some(KeyAction::ToggleBoundary),
        "h" | "H" | "?" => Some(KeyAction::ToggleHelp),
        _ => None,
    }
}

/// Playback time for a click `x` pixels into a timeline `width` pixels wide.
#[inline]
pub fn timeline_time(x: f64, width: f64, duration: f64) -> Option<f64> {
    if width.is_nan() || width <= 0.0 || !duration.is_finite() || duration <= 0.0 {
        return None;
    }
    Some((x / width).clamp(0.0, 1.0) * duration)
}

/// Value of `key` in a `?a=1&b=2` location search string.
pub fn query_param(search: &str, key: &str) -> Option<String> {
    search
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| {
            let mut it = pair.splitn(2, '=');
            Some((it.next()?, it.next().unwrap_or("")))
        })
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.to_string())
}

/// Map a point in source-image pixels onto a canvas of another size.
#[inline]
pub fn scale_to_canvas(x: f32, y: f32, source: (f32, f32), canvas: (f32, f32)) -> (f32, f32) {
    if source.0 <= 0.0 || source.1 <= 0.0 {
        return (x, y);
    }
    (x * canvas.0 / source.0, y * canvas.1 / source.1)
}
