//! Shared helpers for integration tests
#![allow(dead_code)]

use rosc::OscType;

pub fn s(value: &str) -> OscType {
    OscType::String(value.to_string())
}

/// Flattened OSC arguments for `(instrument, note, release, amp)` notes each
/// followed by a one-beat rest
pub fn note_then_rest(notes: &[(&str, &str, f32, f32)]) -> Vec<OscType> {
    let mut args = Vec::new();
    for (instrument, note, release, amp) in notes {
        args.extend([
            s("START"),
            s("synth"),
            s(instrument),
            s(note),
            OscType::Float(*release),
            OscType::Float(*amp),
        ]);
        args.extend([s("START"), s("sleep"), s(""), s(""), OscType::Float(1.0), s("")]);
    }
    args
}
