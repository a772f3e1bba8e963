use crate::constants::TIME_EPSILON;
use crate::timeline::SortedCursor;

/// A beat that fired on this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeatHit {
    /// Timestamp of the beat in the analysis.
    pub beat_time: f64,
    /// Playback time at which it was detected.
    pub fired_at: f64,
    /// Zero-based count of beats fired so far.
    pub ordinal: u64,
}

/// The two most recent beats, used to size the RMS averaging window.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BeatWindow {
    older: Option<f64>,
    newer: Option<f64>,
}

impl BeatWindow {
    pub fn push(&mut self, t: f64) {
        self.older = self.newer;
        self.newer = Some(t);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Interval between the last two beats, once two have been seen.
    pub fn interval(&self) -> Option<f64> {
        match (self.older, self.newer) {
            (Some(a), Some(b)) if b > a => Some(b - a),
            _ => None,
        }
    }

    /// Averaging window: the beat interval if known, never more than `max`.
    pub fn rms_window(&self, max: f64) -> f64 {
        self.interval().map_or(max, |i| i.min(max))
    }
}

/// Detects beats as playback time passes over them.
///
/// A beat at `b` fires when `t - look_ahead <= b <= t` and at least
/// `cooldown` seconds have passed since the previous firing. The cursor
/// only moves forward; beats it passes are consumed whether or not they
/// fired.
#[derive(Clone, Debug)]
pub struct BeatTracker {
    look_ahead: f64,
    cooldown: f64,
    cursor: SortedCursor,
    last_fired: Option<f64>,
    window: BeatWindow,
    fired: u64,
}

impl BeatTracker {
    pub fn new(look_ahead: f64, cooldown: f64) -> Self {
        Self {
            look_ahead,
            cooldown,
            cursor: SortedCursor::default(),
            last_fired: None,
            window: BeatWindow::default(),
            fired: 0,
        }
    }

    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor.index()
    }

    #[inline]
    pub fn last_fired(&self) -> Option<f64> {
        self.last_fired
    }

    #[inline]
    pub fn fired_count(&self) -> u64 {
        self.fired
    }

    #[inline]
    pub fn window(&self) -> &BeatWindow {
        &self.window
    }

    fn cooled_down(&self, t: f64) -> bool {
        self.last_fired
            .map_or(true, |last| t - last + TIME_EPSILON >= self.cooldown)
    }

    pub fn check(&mut self, beats: &[f64], t: f64) -> Option<BeatHit> {
        let mut hit = None;
        while let Some(b) = self.cursor.peek(beats) {
            if b > t {
                break;
            }
            if b >= t - self.look_ahead && hit.is_none() && self.cooled_down(t) {
                hit = Some(BeatHit {
                    beat_time: b,
                    fired_at: t,
                    ordinal: self.fired,
                });
                self.fired += 1;
                self.last_fired = Some(t);
                self.window.push(b);
                log::debug!("[beat] #{} at {:.3}s (t={:.3}s)", self.fired, b, t);
            }
            self.cursor.advance();
        }
        hit
    }

    /// Re-synchronize after a seek: the next beat considered is the first at
    /// or after `t`, and the cooldown does not block it.
    pub fn rebase(&mut self, beats: &[f64], t: f64) {
        self.cursor.rebase(beats, t);
        self.last_fired = Some(t - self.cooldown);
        self.window.clear();
    }
}
