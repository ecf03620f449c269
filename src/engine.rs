//! Outbound synth engine
//!
//! The player and the ambient voice only produce [`SynthCommand`]s. A
//! [`SynthEngine`] turns them into sound somewhere else: [`OscEngine`] sends
//! scsynth `/s_new` messages, [`LogEngine`] only logs them.

use crate::note;
use rosc::{OscMessage, OscPacket, OscType};
use std::fmt;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::{debug, info};

/// One synth trigger
#[derive(Debug, Clone, PartialEq)]
pub struct SynthCommand {
    /// Instrument name, as sent by the sequence source
    pub synth: String,
    /// Note text: a MIDI number or a note name
    pub note: String,
    pub release: Option<f64>,
    pub amp: Option<f64>,
    pub attack: Option<f64>,
    pub cutoff: Option<f64>,
}

impl SynthCommand {
    /// Command with every parameter left to the synth's defaults
    pub fn new(synth: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            synth: synth.into(),
            note: note.into(),
            release: None,
            amp: None,
            attack: None,
            cutoff: None,
        }
    }

    pub fn with_release(mut self, release: f64) -> Self {
        self.release = Some(release);
        self
    }

    pub fn with_amp(mut self, amp: f64) -> Self {
        self.amp = Some(amp);
        self
    }

    pub fn with_attack(mut self, attack: f64) -> Self {
        self.attack = Some(attack);
        self
    }

    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = Some(cutoff);
        self
    }

    /// Instrument name without the `:` symbol prefix
    pub fn instrument(&self) -> &str {
        self.synth.trim().trim_start_matches(':')
    }

    /// Named parameters that are set, other than the note, in send order
    pub fn params(&self) -> Vec<(&'static str, f64)> {
        [
            ("attack", self.attack),
            ("release", self.release),
            ("cutoff", self.cutoff),
            ("amp", self.amp),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
        .collect()
    }
}

/// Engine failures
#[derive(Debug)]
pub enum EngineError {
    /// Instrument name was empty
    EmptyInstrument,
    /// Note text is neither a number nor a note name
    UnknownNote(String),
    /// OSC encoding failed
    Encode(String),
    /// Socket error
    Io(std::io::Error),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::EmptyInstrument => write!(f, "Synth command has no instrument name"),
            EngineError::UnknownNote(note) => write!(f, "Unknown note: {:?}", note),
            EngineError::Encode(msg) => write!(f, "OSC encode error: {}", msg),
            EngineError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Io(e)
    }
}

/// Something that can play synth commands
pub trait SynthEngine: Send + Sync {
    fn trigger(&self, cmd: &SynthCommand) -> Result<(), EngineError>;
}

/// Sends scsynth `/s_new` messages over UDP
pub struct OscEngine {
    socket: UdpSocket,
    target: SocketAddr,
    synth_prefix: String,
}

impl OscEngine {
    /// Bind a local socket for sending. Must be called inside a tokio runtime.
    pub fn new(target: SocketAddr, synth_prefix: impl Into<String>) -> Result<Self, EngineError> {
        let bind = if target.is_ipv6() { "[::]:0" } else { "0.0.0.0:0" };
        let socket = std::net::UdpSocket::bind(bind)?;
        socket.set_nonblocking(true)?;
        let socket = UdpSocket::from_std(socket)?;
        info!("Synth engine target {}", target);
        Ok(Self {
            socket,
            target,
            synth_prefix: synth_prefix.into(),
        })
    }

    /// Build the `/s_new` message for a command
    pub fn build_message(&self, cmd: &SynthCommand) -> Result<OscMessage, EngineError> {
        let instrument = cmd.instrument();
        if instrument.is_empty() {
            return Err(EngineError::EmptyInstrument);
        }
        let midi = note::resolve(&cmd.note)
            .ok_or_else(|| EngineError::UnknownNote(cmd.note.clone()))?;

        // node id -1 (auto), add action 0 (head), target group 0
        let mut args = vec![
            OscType::String(format!("{}{}", self.synth_prefix, instrument)),
            OscType::Int(-1),
            OscType::Int(0),
            OscType::Int(0),
            OscType::String("note".to_string()),
            OscType::Float(midi as f32),
        ];
        for (name, value) in cmd.params() {
            args.push(OscType::String(name.to_string()));
            args.push(OscType::Float(value as f32));
        }

        Ok(OscMessage {
            addr: "/s_new".to_string(),
            args,
        })
    }
}

impl SynthEngine for OscEngine {
    fn trigger(&self, cmd: &SynthCommand) -> Result<(), EngineError> {
        let msg = self.build_message(cmd)?;
        let buf = rosc::encoder::encode(&OscPacket::Message(msg))
            .map_err(|e| EngineError::Encode(e.to_string()))?;
        // Never waits: a full send buffer drops the note with an error
        self.socket.try_send_to(&buf, self.target)?;
        debug!("Sent {} ({} bytes) to {}", cmd.instrument(), buf.len(), self.target);
        Ok(())
    }
}

/// Dry-run engine: logs every trigger
#[derive(Debug, Default)]
pub struct LogEngine;

impl SynthEngine for LogEngine {
    fn trigger(&self, cmd: &SynthCommand) -> Result<(), EngineError> {
        if cmd.instrument().is_empty() {
            return Err(EngineError::EmptyInstrument);
        }
        let mut line = format!("synth :{}, note: {}", cmd.instrument(), cmd.note);
        for (name, value) in cmd.params() {
            line.push_str(&format!(", {}: {}", name, value));
        }
        info!("🎹 {}", line);
        Ok(())
    }
}
