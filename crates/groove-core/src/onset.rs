use crate::timeline::SortedCursor;

/// Tracks the most recent onset and how strongly it still boosts motion.
///
/// Strength is `exp(-decay_rate * dt)` where `dt` is the time since the
/// latest onset at or before `t`, and zero once `dt` exceeds `window`.
#[derive(Clone, Debug)]
pub struct OnsetTracker {
    window: f64,
    decay_rate: f32,
    cursor: SortedCursor,
    latest: Option<f64>,
}

impl OnsetTracker {
    pub fn new(window: f64, decay_rate: f32) -> Self {
        Self {
            window,
            decay_rate,
            cursor: SortedCursor::default(),
            latest: None,
        }
    }

    #[inline]
    pub fn latest(&self) -> Option<f64> {
        self.latest
    }

    /// Consume onsets up to `t` and return the current strength in `[0, 1]`.
    pub fn observe(&mut self, onsets: &[f64], t: f64) -> f32 {
        while let Some(o) = self.cursor.peek(onsets) {
            if o > t {
                break;
            }
            self.latest = Some(o);
            self.cursor.advance();
        }
        self.strength(t)
    }

    pub fn strength(&self, t: f64) -> f32 {
        match self.latest {
            Some(o) if t >= o && t - o <= self.window => (-self.decay_rate * (t - o) as f32).exp(),
            _ => 0.0,
        }
    }

    /// `1 + strength * factor`, the multiplier applied to acceleration.
    #[inline]
    pub fn boost(&self, t: f64, factor: f32) -> f32 {
        1.0 + self.strength(t) * factor
    }

    pub fn rebase(&mut self, onsets: &[f64], t: f64) {
        self.cursor.rebase(onsets, t);
        self.latest = self
            .cursor
            .index()
            .checked_sub(1)
            .and_then(|i| onsets.get(i).copied());
    }
}
