//! Note and rest descriptors
//!
//! A descriptor is a group of exactly five tokens:
//! `(kind, instrument, note, duration, amplitude)`. A kind of `"sleep"` is a
//! rest of `duration` beats; every other kind triggers a synth. For a synth
//! the duration is its release, and a release or amplitude that is not a
//! number is left unset for the engine to default.

use crate::token::Token;
use std::fmt;

/// Number of tokens in a well-formed descriptor
pub const DESCRIPTOR_LEN: usize = 5;

/// Kind tag for rests
pub const SLEEP_KIND: &str = "sleep";

/// Kind tag senders use for synth triggers
pub const SYNTH_KIND: &str = "synth";

/// A playable event
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptor {
    /// Rest for a number of beats
    Sleep { beats: f64 },
    /// Trigger one note on an instrument
    Synth {
        instrument: String,
        note: String,
        release: Option<f64>,
        amp: Option<f64>,
    },
}

/// Why a group is not a playable descriptor
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// Wrong number of tokens
    Shape(usize),
    /// Rest duration is not a number
    Duration(String),
}

impl Rejection {
    /// Shape mismatches are expected noise and are skipped without a trace
    pub fn is_shape(&self) -> bool {
        matches!(self, Rejection::Shape(_))
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Shape(len) => {
                write!(f, "expected {} fields, got {}", DESCRIPTOR_LEN, len)
            }
            Rejection::Duration(value) => write!(f, "sleep duration is not a number: {:?}", value),
        }
    }
}

impl std::error::Error for Rejection {}

fn finite_number(token: &Token) -> Option<f64> {
    token.as_number().filter(|n| n.is_finite())
}

fn optional_number(value: Option<f64>) -> Token {
    value.map_or(Token::Nil, Token::Float)
}

impl Descriptor {
    pub fn sleep(beats: f64) -> Self {
        Descriptor::Sleep { beats }
    }

    pub fn synth(
        instrument: impl Into<String>,
        note: impl Into<String>,
        release: f64,
        amp: f64,
    ) -> Self {
        Descriptor::Synth {
            instrument: instrument.into(),
            note: note.into(),
            release: Some(release),
            amp: Some(amp),
        }
    }

    /// Beats this event holds the timeline for
    pub fn rest_beats(&self) -> f64 {
        match self {
            Descriptor::Sleep { beats } => *beats,
            Descriptor::Synth { .. } => 0.0,
        }
    }

    /// Encode as the five-token group senders put on the wire
    pub fn to_tokens(&self) -> Vec<Token> {
        match self {
            Descriptor::Sleep { beats } => vec![
                Token::text(SLEEP_KIND),
                Token::text(""),
                Token::text(""),
                Token::Float(*beats),
                Token::text(""),
            ],
            Descriptor::Synth {
                instrument,
                note,
                release,
                amp,
            } => vec![
                Token::text(SYNTH_KIND),
                Token::text(instrument.as_str()),
                Token::text(note.as_str()),
                optional_number(*release),
                optional_number(*amp),
            ],
        }
    }
}

impl TryFrom<&[Token]> for Descriptor {
    type Error = Rejection;

    fn try_from(group: &[Token]) -> Result<Self, Self::Error> {
        let [kind, instrument, note, duration, amp] = group else {
            return Err(Rejection::Shape(group.len()));
        };

        if kind.as_str() == Some(SLEEP_KIND) {
            let beats =
                finite_number(duration).ok_or_else(|| Rejection::Duration(duration.to_string()))?;
            return Ok(Descriptor::Sleep { beats });
        }

        Ok(Descriptor::Synth {
            instrument: instrument.to_string(),
            note: note.to_string(),
            release: finite_number(duration),
            amp: finite_number(amp),
        })
    }
}

/// Score line form, as the generator writes it. Unset values are left out.
impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Descriptor::Sleep { beats } => write!(f, "sleep {}", beats),
            Descriptor::Synth {
                instrument,
                note,
                release,
                amp,
            } => {
                write!(f, "synth :{}, note: :{}", instrument, note)?;
                if let Some(release) = release {
                    write!(f, ", release: {}", release)?;
                }
                if let Some(amp) = amp {
                    write!(f, ", amp: {}", amp)?;
                }
                Ok(())
            }
        }
    }
}
