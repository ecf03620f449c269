//! The three live loops and the session that runs them
//!
//! - **ambient**: syncs on the ambient pattern and plays one long drone note
//!   per cue. It shares nothing with the other loops.
//! - **listener**: syncs on the sequence pattern, rebuilds the sequence set and
//!   publishes it to the [`SequenceSlot`].
//! - **player**: plays the current set over and over, picking up a newly
//!   published set at the start of each pass.
//!
//! All three run as tasks on one cooperative runtime. They only yield at
//! `sync` and at rests.

use crate::config::{AmbientConfig, Config};
use crate::cue::{AddressPattern, CueBus, CueReceiver, PatternError};
use crate::engine::{EngineError, SynthCommand, SynthEngine};
use crate::osc_server::OscServer;
use crate::player::{play, PassSummary, Tempo, Timeline};
use crate::reconstruct::reconstruct;
use crate::state::SequenceSlot;
use crate::token::{payload_tokens, PayloadError, Token};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rosc::OscType;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Drone voice driven by ambient cues
pub struct AmbientVoice {
    config: AmbientConfig,
    rng: StdRng,
}

impl AmbientVoice {
    pub fn new(config: AmbientConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { config, rng }
    }

    /// Drone command for a cue, using its first argument as the note
    pub fn command_for(&mut self, args: &[OscType]) -> Option<SynthCommand> {
        let note = Token::try_from(args.first()?).ok()?.to_string();
        let (min, max) = (self.config.cutoff_min, self.config.cutoff_max);
        // gen_range panics on an empty or unbounded range
        let cutoff = if min < max && (max - min).is_finite() {
            self.rng.gen_range(min..=max)
        } else {
            min
        };

        Some(
            SynthCommand::new(self.config.synth.as_str(), note)
                .with_attack(self.config.attack)
                .with_release(self.config.release)
                .with_cutoff(cutoff)
                .with_amp(self.config.amp),
        )
    }
}

/// Ambient loop: one drone note per matching cue
pub async fn ambient_loop(
    mut cues: CueReceiver,
    pattern: AddressPattern,
    mut voice: AmbientVoice,
    engine: Arc<dyn SynthEngine>,
) {
    while let Some(cue) = cues.sync(&pattern).await {
        match voice.command_for(&cue.args) {
            Some(cmd) => {
                if let Err(e) = engine.trigger(&cmd) {
                    error!("Ambient trigger failed: {}", e);
                }
            }
            None => warn!("Ambient cue {} carries no note", cue.path),
        }
    }
    debug!("Ambient loop stopped");
}

/// What the listener did with one sequence cue
#[derive(Debug, Clone, PartialEq)]
pub enum ListenOutcome {
    /// A new set was published
    Published { groups: usize },
    /// Payload was not a flat token array; the slot is untouched
    Rejected(PayloadError),
}

/// Decode a sequence cue and publish it
pub fn handle_sequence_cue(slot: &SequenceSlot, args: &[OscType]) -> ListenOutcome {
    match payload_tokens(args) {
        Ok(tokens) => {
            let set = reconstruct(&tokens);
            let groups = set.len();
            slot.publish(set);
            debug!("Published sequence with {} groups", groups);
            ListenOutcome::Published { groups }
        }
        Err(e) => {
            warn!("Received incorrect format: {}", e);
            ListenOutcome::Rejected(e)
        }
    }
}

/// Listener loop: publish every matching cue to the slot
pub async fn listener_loop(
    mut cues: CueReceiver,
    pattern: AddressPattern,
    slot: Arc<SequenceSlot>,
) {
    while let Some(cue) = cues.sync(&pattern).await {
        handle_sequence_cue(&slot, &cue.args);
    }
    debug!("Listener loop stopped");
}

/// Result of one player pass
#[derive(Debug)]
pub enum PassOutcome {
    /// Nothing to play; rested the idle interval
    Idle,
    Played(PassSummary),
    /// The engine failed; the rest of the pass was dropped
    Failed(EngineError),
}

/// Player loop state
pub struct PlayerLoop {
    slot: Arc<SequenceSlot>,
    engine: Arc<dyn SynthEngine>,
    timeline: Timeline,
    idle_beats: f64,
}

impl PlayerLoop {
    pub fn new(
        slot: Arc<SequenceSlot>,
        engine: Arc<dyn SynthEngine>,
        tempo: Tempo,
        idle_beats: f64,
    ) -> Self {
        Self {
            slot,
            engine,
            timeline: Timeline::new(tempo),
            idle_beats,
        }
    }

    /// Snapshot the slot and play it once
    pub async fn run_pass(&mut self) -> PassOutcome {
        let current = self.slot.current();

        if current.is_empty() {
            self.timeline.resync();
            self.timeline.rest(self.idle_beats).await;
            return PassOutcome::Idle;
        }

        if self.slot.take_update() {
            info!("Playing new sequence");
        }

        match play(&current, self.engine.as_ref(), &mut self.timeline).await {
            Ok(summary) => {
                // A set without rests would never yield
                if summary.beats <= 0.0 {
                    self.timeline.rest(self.idle_beats).await;
                }
                PassOutcome::Played(summary)
            }
            Err(e) => {
                error!("Sequence pass aborted: {}", e);
                self.timeline.resync();
                self.timeline.rest(self.idle_beats).await;
                PassOutcome::Failed(e)
            }
        }
    }

    pub async fn run(mut self) {
        loop {
            if let PassOutcome::Played(summary) = self.run_pass().await {
                debug!(
                    "Pass done: {} notes, {} rests, {} skipped, {} beats",
                    summary.triggered, summary.rests, summary.skipped, summary.beats
                );
            }
        }
    }
}

/// Compiled address patterns for the two inbound streams
#[derive(Debug, Clone)]
pub struct Patterns {
    pub ambient: AddressPattern,
    pub sequence: AddressPattern,
}

impl Patterns {
    pub fn from_config(config: &Config) -> Result<Self, PatternError> {
        Ok(Self {
            ambient: AddressPattern::new(&config.patterns.ambient)?,
            sequence: AddressPattern::new(&config.patterns.sequence)?,
        })
    }
}

/// A running setup: cue bus, shared slot, engine and the loops on top
pub struct Session {
    config: Config,
    patterns: Patterns,
    engine: Arc<dyn SynthEngine>,
    bus: CueBus,
    slot: Arc<SequenceSlot>,
}

impl Session {
    pub fn new(config: Config, engine: Arc<dyn SynthEngine>) -> Result<Self, PatternError> {
        let patterns = Patterns::from_config(&config)?;
        Ok(Self {
            config,
            patterns,
            engine,
            bus: CueBus::default(),
            slot: Arc::new(SequenceSlot::new()),
        })
    }

    pub fn bus(&self) -> CueBus {
        self.bus.clone()
    }

    pub fn slot(&self) -> Arc<SequenceSlot> {
        self.slot.clone()
    }

    /// Subscribe and spawn the three loops on the current runtime
    pub fn spawn_loops(&self) -> JoinSet<()> {
        let mut tasks = JoinSet::new();

        tasks.spawn(ambient_loop(
            self.bus.subscribe(),
            self.patterns.ambient.clone(),
            AmbientVoice::new(self.config.ambient.clone()),
            self.engine.clone(),
        ));

        tasks.spawn(listener_loop(
            self.bus.subscribe(),
            self.patterns.sequence.clone(),
            self.slot.clone(),
        ));

        let player = PlayerLoop::new(
            self.slot.clone(),
            self.engine.clone(),
            Tempo::new(self.config.player.bpm),
            self.config.player.idle_beats,
        );
        tasks.spawn(player.run());

        info!(
            "Loops running: ambient on {}, sequence on {}",
            self.patterns.ambient, self.patterns.sequence
        );
        tasks
    }

    /// Bind the OSC server and run until Ctrl-C or a task ends
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let server = OscServer::bind(self.config.server.listen, self.bus()).await?;
        let mut tasks = self.spawn_loops();
        tasks.spawn(server.run());

        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Stopping");
            }
            Some(joined) = tasks.join_next() => {
                if let Err(e) = joined {
                    error!("Loop task failed: {}", e);
                } else {
                    warn!("A loop ended unexpectedly");
                }
            }
        }

        tasks.abort_all();
        Ok(())
    }
}
