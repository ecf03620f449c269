//! Sequence playback
//!
//! [`play`] walks a sequence set once, triggering synths and resting on a
//! [`Timeline`]. Rests are async timer waits, so other loops keep running
//! while a sequence is resting.

use crate::descriptor::Descriptor;
use crate::engine::{EngineError, SynthCommand, SynthEngine};
use crate::reconstruct::Group;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Longest single rest, in seconds
const MAX_REST_SECS: f64 = 86_400.0;

/// How far the timeline may fall behind wall time before it is resynced
const LATE_LIMIT: Duration = Duration::from_millis(500);

/// Beats per minute
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    bpm: f64,
}

impl Tempo {
    /// A non-positive or non-finite tempo falls back to 60 BPM
    pub fn new(bpm: f64) -> Self {
        let bpm = if bpm.is_finite() && bpm > 0.0 {
            bpm
        } else {
            warn!("Invalid tempo {} BPM, using 60", bpm);
            60.0
        };
        Self { bpm }
    }

    /// Wall time for a number of beats; non-positive or non-finite is zero
    pub fn beats_to_duration(&self, beats: f64) -> Duration {
        if !beats.is_finite() || beats <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64((beats * 60.0 / self.bpm).min(MAX_REST_SECS))
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self::new(60.0)
    }
}

/// Logical clock for one loop.
///
/// Rests advance the logical time and sleep until it, so consecutive rests
/// do not accumulate scheduling drift.
#[derive(Debug)]
pub struct Timeline {
    tempo: Tempo,
    logical: Instant,
}

impl Timeline {
    pub fn new(tempo: Tempo) -> Self {
        Self {
            tempo,
            logical: Instant::now(),
        }
    }

    /// Suspend the calling task for `beats`
    pub async fn rest(&mut self, beats: f64) {
        let now = Instant::now();
        if now.saturating_duration_since(self.logical) > LATE_LIMIT {
            warn!(
                "Timeline {:?} behind, resyncing",
                now.saturating_duration_since(self.logical)
            );
            self.logical = now;
        }
        self.logical += self.tempo.beats_to_duration(beats);
        tokio::time::sleep_until(self.logical).await;
    }

    /// Restart logical time from now
    pub fn resync(&mut self) {
        self.logical = Instant::now();
    }
}

/// What one pass over a sequence did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassSummary {
    pub triggered: usize,
    pub rests: usize,
    pub skipped: usize,
    pub beats: f64,
}

/// Play every descriptor of a set once, in order.
///
/// Groups that are not descriptors are skipped. An engine failure aborts the
/// pass and is returned to the caller.
pub async fn play(
    set: &[Group],
    engine: &dyn SynthEngine,
    timeline: &mut Timeline,
) -> Result<PassSummary, EngineError> {
    let mut summary = PassSummary::default();

    for group in set {
        let event = match Descriptor::try_from(group.as_slice()) {
            Ok(event) => event,
            Err(rejection) => {
                if !rejection.is_shape() {
                    debug!("Skipping descriptor: {}", rejection);
                }
                summary.skipped += 1;
                continue;
            }
        };

        match event {
            Descriptor::Sleep { beats } => {
                timeline.rest(beats).await;
                summary.rests += 1;
                summary.beats += beats.max(0.0);
            }
            Descriptor::Synth {
                instrument,
                note,
                release,
                amp,
            } => {
                let cmd = SynthCommand {
                    release,
                    amp,
                    ..SynthCommand::new(instrument, note)
                };
                engine.trigger(&cmd)?;
                summary.triggered += 1;
            }
        }
    }

    Ok(summary)
}
