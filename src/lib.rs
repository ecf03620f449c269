//! # Magnon - OSC Sequence Player
//!
//! Magnon listens for musical sequences sent over OSC as flat, sentinel
//! delimited arrays, rebuilds them, and plays them in a loop on an external
//! synth engine. A drone voice runs next to it, driven by the same source.
//!
//! ## Wire format
//!
//! A sequence message carries groups of five values, each group introduced by
//! the sentinel `"START"`:
//!
//! ```text
//! /synth "START" "synth" "piano" "C4" 1.0 0.5  "START" "sleep" "" "" 0.5 ""
//! ```
//!
//! Each group is `(kind, instrument, note, duration, amplitude)`. Kind
//! `"sleep"` rests for `duration` beats, anything else triggers a note.
//!
//! ```rust
//! use magnon::reconstruct::reconstruct;
//! use magnon::token::Token;
//!
//! let flat: Vec<Token> = ["START", "a", "b", "START", "START", "c"]
//!     .iter()
//!     .map(|s| Token::from(*s))
//!     .collect();
//! let groups = reconstruct(&flat);
//! assert_eq!(groups.len(), 2);
//! ```
//!
//! ## Architecture
//!
//! - [`osc_server`] - UDP listener, turns messages into cues
//! - [`cue`] - cue bus and `sync` on OSC address patterns
//! - [`loops`] - ambient, listener and player loops, and the [`loops::Session`]
//! - [`state`] - the shared sequence slot between listener and player
//! - [`player`] - one pass over a sequence, tempo and timeline
//! - [`reconstruct`], [`token`], [`descriptor`] - decoding
//! - [`engine`] - outbound synth commands (`/s_new` or log only)
//! - [`score`], [`client`] - the sending side
//!
//! All loops run on a single-threaded tokio runtime and yield only at `sync`
//! and at rests.

pub mod client;
pub mod config;
pub mod cue;
pub mod descriptor;
pub mod engine;
pub mod loops;
pub mod note;
pub mod osc_server;
pub mod player;
pub mod reconstruct;
pub mod score;
pub mod state;
pub mod test_utils;
pub mod token;
