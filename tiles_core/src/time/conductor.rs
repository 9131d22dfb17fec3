use crate::time::clock::ClockSource;
use crate::Millis;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimelineMode {
    /// No frame sampled yet.
    Unsynced,
    /// Following the audio playback position.
    Audio,
    /// No audio clock at run start: render time since `origin_render`.
    Synthetic { origin_render: Millis },
}

/// Reconciles the audio playback position with the render clock.
///
/// Audio readings arrive at the audio callback's cadence, so between two
/// readings the conductor extrapolates with render time. The output is sampled
/// once per frame and never moves backwards while playing.
#[derive(Debug, Clone)]
pub struct Conductor {
    mode: TimelineMode,
    /// Raw value of the last audio reading, to detect fresh updates.
    last_reading: Option<Millis>,
    /// Song time at `last_sync_render`.
    anchor: Millis,
    last_sync_render: Millis,
    max_extrapolation: Millis,
    /// Audio mode only: the clock stopped reporting mid-run.
    audio_lost: bool,
    last_output: Option<Millis>,
    /// Render time of the previous sample.
    last_render: Millis,
    paused_at: Option<Millis>,
    paused_total: Millis,
}

impl Conductor {
    pub fn new(max_extrapolation: Millis) -> Self {
        Self {
            mode: TimelineMode::Unsynced,
            last_reading: None,
            anchor: 0.0,
            last_sync_render: 0.0,
            max_extrapolation,
            audio_lost: false,
            last_output: None,
            last_render: 0.0,
            paused_at: None,
            paused_total: 0.0,
        }
    }

    pub fn mode(&self) -> TimelineMode {
        self.mode
    }

    /// The last sampled song position.
    pub fn now(&self) -> Option<Millis> {
        self.last_output
    }

    /// Takes this frame's snapshot of song time.
    ///
    /// The timeline mode is chosen on the first sample and kept for the whole
    /// run, so an audio clock that shows up late does not make time jump. If
    /// the audio clock goes away mid-run, time keeps running on render time
    /// from the last output until readings come back.
    pub fn sample(&mut self, source: &dyn ClockSource, render_ms: Millis) -> Millis {
        let reading = source.position_ms();

        if self.mode == TimelineMode::Unsynced {
            match reading {
                Some(audio) => {
                    self.mode = TimelineMode::Audio;
                    self.last_reading = Some(audio);
                    self.anchor = audio;
                    self.last_sync_render = render_ms;
                }
                None => {
                    log::warn!("audio clock unavailable, using synthetic timeline");
                    self.mode = TimelineMode::Synthetic {
                        origin_render: render_ms,
                    };
                }
            }
        }

        let raw = match self.mode {
            TimelineMode::Synthetic { origin_render } => render_ms - origin_render - self.paused_total,
            _ => {
                match reading {
                    Some(audio) => {
                        if self.audio_lost || self.last_reading != Some(audio) {
                            if self.audio_lost {
                                log::info!("audio clock back at {audio:.1}ms");
                                self.audio_lost = false;
                            }
                            self.last_reading = Some(audio);
                            self.anchor = audio;
                            self.last_sync_render = render_ms;
                        }
                    }
                    None if !self.audio_lost => {
                        log::warn!("audio clock lost mid-run, continuing on render time");
                        self.audio_lost = true;
                        // Continue from the previous frame's output.
                        if let Some(prev) = self.last_output {
                            self.anchor = prev;
                            self.last_sync_render = self.last_render;
                        }
                    }
                    None => {}
                }
                // Once playback has finished no further readings come; time runs on
                // so tiles still in flight can resolve.
                let cap = if self.audio_lost || source.is_finished() {
                    Millis::INFINITY
                } else {
                    self.max_extrapolation
                };
                let elapsed = (render_ms - self.last_sync_render).clamp(0.0, cap);
                self.anchor + elapsed
            }
        };

        let output = match self.last_output {
            Some(prev) => raw.max(prev),
            None => raw,
        };
        self.last_output = Some(output);
        self.last_render = render_ms;
        output
    }

    pub fn pause(&mut self, render_ms: Millis) {
        if self.paused_at.is_none() {
            self.paused_at = Some(render_ms);
        }
    }

    /// Rebases the timeline so the paused interval is not counted.
    pub fn resume(&mut self, render_ms: Millis) {
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total += (render_ms - paused_at).max(0.0);
            // Audio was paused alongside; continue from where the run stopped.
            if let Some(position) = self.last_output {
                self.anchor = position;
            }
            self.last_sync_render = render_ms;
            self.last_render = render_ms;
        }
    }
}
