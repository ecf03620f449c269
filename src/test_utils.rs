//! Test doubles for unit and integration tests

use crate::engine::{EngineError, SynthCommand, SynthEngine};
use std::sync::{Mutex, MutexGuard};

/// Engine that records every command it is given
#[derive(Default)]
pub struct RecordingEngine {
    commands: Mutex<Vec<SynthCommand>>,
    fail_on: Option<String>,
}

impl RecordingEngine {
    /// Fails (without recording) for commands on this instrument
    pub fn failing_on(instrument: &str) -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
            fail_on: Some(instrument.to_string()),
        }
    }

    pub fn commands(&self) -> Vec<SynthCommand> {
        self.recorded().clone()
    }

    /// Instrument of every recorded command, in trigger order
    pub fn instruments(&self) -> Vec<String> {
        self.recorded().iter().map(|c| c.synth.clone()).collect()
    }

    fn recorded(&self) -> MutexGuard<'_, Vec<SynthCommand>> {
        // A panicking test thread must not hide what was recorded
        self.commands.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SynthEngine for RecordingEngine {
    fn trigger(&self, cmd: &SynthCommand) -> Result<(), EngineError> {
        if self.fail_on.as_deref() == Some(cmd.instrument()) {
            return Err(EngineError::UnknownNote(cmd.note.clone()));
        }
        self.recorded().push(cmd.clone());
        Ok(())
    }
}
