//! Lookups over time-sorted sample series.

/// Anything stamped with a playback time in seconds.
pub trait Timed {
    fn time(&self) -> f64;
}

impl Timed for f64 {
    #[inline]
    fn time(&self) -> f64 {
        *self
    }
}

/// Index of the sample whose time is closest to `t`; ties go to the lower index.
///
/// `series` must be sorted by time. Returns `None` for an empty series.
pub fn nearest_index<T: Timed>(series: &[T], t: f64) -> Option<usize> {
    if series.is_empty() {
        return None;
    }
    let upper = series.partition_point(|s| s.time() < t);
    let best = if upper == 0 {
        0
    } else if upper == series.len() {
        series.len() - 1
    } else {
        let below = t - series[upper - 1].time();
        let above = series[upper].time() - t;
        if below <= above {
            upper - 1
        } else {
            upper
        }
    };
    // Equal timestamps: the first of the run is the earliest index at that distance.
    let at = series[best].time();
    Some(series.partition_point(|s| s.time() < at).min(best))
}

#[inline]
pub fn nearest_sample<T: Timed>(series: &[T], t: f64) -> Option<&T> {
    nearest_index(series, t).map(|i| &series[i])
}

/// First position in `series` whose time is not before `t`.
#[inline]
pub fn first_at_or_after<T: Timed>(series: &[T], t: f64) -> usize {
    series.partition_point(|s| s.time() < t)
}

/// Checks a series is non-decreasing and finite; returns the first offending index.
pub(crate) fn first_unsorted<T: Timed>(series: &[T]) -> Option<usize> {
    series
        .windows(2)
        .position(|w| w[1].time() < w[0].time())
        .map(|i| i + 1)
}

pub(crate) fn first_non_finite<T: Timed>(series: &[T]) -> Option<usize> {
    series.iter().position(|s| !s.time().is_finite())
}

/// Forward-only index into a sorted timestamp sequence.
///
/// During playback the cursor only moves forward; a seek calls [`rebase`]
/// which jumps it to the first timestamp at or after the new time.
///
/// [`rebase`]: SortedCursor::rebase
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SortedCursor {
    index: usize,
}

impl SortedCursor {
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn peek(&self, times: &[f64]) -> Option<f64> {
        times.get(self.index).copied()
    }

    #[inline]
    pub fn advance(&mut self) {
        self.index += 1;
    }

    pub fn rebase(&mut self, times: &[f64], t: f64) {
        self.index = first_at_or_after(times, t);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_prefers_lower_index_on_tie() {
        let times = [0.0, 1.0, 2.0];
        assert_eq!(nearest_index(&times, 0.5), Some(0));
        assert_eq!(nearest_index(&times, 1.5), Some(1));
        assert_eq!(nearest_index(&times, 1.51), Some(2));
    }

    #[test]
    fn nearest_clamps_out_of_range() {
        let times = [1.0, 2.0];
        assert_eq!(nearest_index(&times, -10.0), Some(0));
        assert_eq!(nearest_index(&times, 99.0), Some(1));
        assert_eq!(nearest_index::<f64>(&[], 1.0), None);
    }

    #[test]
    fn nearest_picks_first_of_duplicate_run() {
        let times = [0.0, 1.0, 1.0, 1.0, 3.0];
        assert_eq!(nearest_index(&times, 1.2), Some(1));
        assert_eq!(nearest_index(&times, 0.9), Some(1));
    }

    #[test]
    fn cursor_rebase_finds_first_at_or_after() {
        let beats = [1.0, 2.0, 3.0];
        let mut c = SortedCursor::default();
        c.rebase(&beats, 2.0);
        assert_eq!(c.index(), 1);
        c.rebase(&beats, 2.5);
        assert_eq!(c.index(), 2);
        c.rebase(&beats, 9.0);
        assert_eq!(c.index(), 3);
        assert_eq!(c.peek(&beats), None);
    }

    #[test]
    fn unsorted_detection() {
        assert_eq!(first_unsorted(&[0.0, 1.0, 0.5]), Some(2));
        assert_eq!(first_unsorted(&[0.0, 1.0, 1.0]), None);
        assert_eq!(first_non_finite(&[0.0, f64::NAN]), Some(1));
    }
}
