//! Playback clock.
//!
//! Time comes either from an external audio element (authoritative, polled
//! every tick) or from an internal frame counter stepped at a fixed rate
//! against a monotonic millisecond timestamp such as the one passed to
//! `requestAnimationFrame`.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TimeSource {
    External,
    Stepped { fps: f64, frame_count: usize },
}

/// Result of one clock tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClockTick {
    pub time: f64,
    /// Whether the time cursor moved on this tick.
    pub advanced: bool,
}

#[derive(Clone, Debug)]
pub struct PlaybackClock {
    source: TimeSource,
    state: PlaybackState,
    time: f64,
    frame: usize,
    duration: Option<f64>,
    last_step_ms: Option<f64>,
}

impl PlaybackClock {
    pub fn external() -> Self {
        Self::with_source(TimeSource::External)
    }

    pub fn stepped(fps: f64, frame_count: usize) -> Self {
        let fps = if fps.is_finite() && fps > 0.0 {
            fps
        } else {
            crate::constants::DEFAULT_FPS
        };
        let mut clock = Self::with_source(TimeSource::Stepped { fps, frame_count });
        clock.duration = Some(frame_count as f64 / fps);
        clock
    }

    fn with_source(source: TimeSource) -> Self {
        Self {
            source,
            state: PlaybackState::Stopped,
            time: 0.0,
            frame: 0,
            duration: None,
            last_step_ms: None,
        }
    }

    #[inline]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    #[inline]
    pub fn frame(&self) -> usize {
        self.frame
    }

    #[inline]
    pub fn source(&self) -> TimeSource {
        self.source
    }

    #[inline]
    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    /// Record the media duration once it is known (audio `loadedmetadata`).
    pub fn set_duration(&mut self, duration: f64) {
        if duration.is_finite() && duration >= 0.0 {
            self.duration = Some(duration);
        }
    }

    pub fn play(&mut self) {
        if self.state == PlaybackState::Playing {
            return;
        }
        self.state = PlaybackState::Playing;
        self.last_step_ms = None;
        log::info!("[clock] play at {:.2}s", self.time);
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Stopped {
            return;
        }
        self.state = PlaybackState::Stopped;
        log::info!("[clock] pause at {:.2}s", self.time);
    }

    pub fn toggle(&mut self) {
        match self.state {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Stopped => self.play(),
        }
    }

    /// End of media: stop and rewind.
    pub fn on_ended(&mut self) {
        self.state = PlaybackState::Stopped;
        self.time = 0.0;
        self.frame = 0;
        log::info!("[clock] ended");
    }

    /// Move the cursor to `t` (clamped to the known duration) and return
    /// the time actually set.
    pub fn seek(&mut self, t: f64) -> f64 {
        let mut t = if t.is_finite() { t.max(0.0) } else { 0.0 };
        if let Some(d) = self.duration {
            t = t.min(d);
        }
        match self.source {
            TimeSource::External => self.time = t,
            TimeSource::Stepped { .. } => {
                let frame = self.frame_for_time(t);
                self.seek_frame(frame);
            }
        }
        self.last_step_ms = None;
        self.time
    }

    /// Jump to a frame index, clamped to the sequence.
    pub fn seek_frame(&mut self, frame: usize) {
        match self.source {
            TimeSource::Stepped { fps, frame_count } => {
                self.frame = frame.min(frame_count.saturating_sub(1));
                self.time = self.frame as f64 / fps;
            }
            TimeSource::External => {
                self.frame = frame;
            }
        }
    }

    /// Frame index shown at time `t`.
    pub fn frame_for_time(&self, t: f64) -> usize {
        let fps = match self.source {
            TimeSource::Stepped { fps, .. } => fps,
            TimeSource::External => crate::constants::DEFAULT_FPS,
        };
        frame_for_time(t, fps)
    }

    /// Poll the clock. `now_ms` is a monotonic timestamp; `external_position`
    /// is the audio element's current position when one drives playback.
    pub fn tick(&mut self, now_ms: f64, external_position: Option<f64>) -> ClockTick {
        if self.state != PlaybackState::Playing {
            return ClockTick {
                time: self.time,
                advanced: false,
            };
        }
        match self.source {
            TimeSource::External => {
                let Some(pos) = external_position.filter(|p| p.is_finite()) else {
                    return ClockTick {
                        time: self.time,
                        advanced: false,
                    };
                };
                let advanced = pos != self.time;
                self.time = pos.max(0.0);
                ClockTick {
                    time: self.time,
                    advanced,
                }
            }
            TimeSource::Stepped { fps, frame_count } => {
                let frame_ms = 1000.0 / fps;
                let Some(last) = self.last_step_ms else {
                    self.last_step_ms = Some(now_ms);
                    return ClockTick {
                        time: self.time,
                        advanced: false,
                    };
                };
                if now_ms - last < frame_ms || frame_count == 0 {
                    return ClockTick {
                        time: self.time,
                        advanced: false,
                    };
                }
                self.last_step_ms = Some(now_ms);
                self.frame = (self.frame + 1) % frame_count;
                self.time = self.frame as f64 / fps;
                ClockTick {
                    time: self.time,
                    advanced: true,
                }
            }
        }
    }
}

#[inline]
pub fn frame_for_time(t: f64, fps: f64) -> usize {
    if t.is_finite() && t > 0.0 {
        (t * fps).floor() as usize
    } else {
        0
    }
}
