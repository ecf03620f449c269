//! Score text in Sonic Pi line syntax
//!
//! ```text
//! synth :piano, note: :C4, release: 1, amp: 0.5
//! sleep 0.5   # comments are allowed
//! ```
//!
//! Used on the sending side to turn a generated score into descriptors.
//! Generated text mixes prose with score lines, so lines are matched by
//! prefix and anything else is skipped.

use crate::descriptor::Descriptor;
use regex::Regex;
use tracing::debug;

lazy_static::lazy_static! {
    static ref SYNTH_LINE: Regex = Regex::new(concat!(
        r"^synth\s+:?([\w#-]+)\s*,\s*note:\s*:?([\w#.-]+)",
        r"\s*,\s*release:\s*([\d.]+)\s*,\s*amp:\s*([\d.]+)",
    ))
    .expect("synth line pattern");
    static ref SLEEP_LINE: Regex = Regex::new(r"^sleep\s+([\d.]+)").expect("sleep line pattern");
}

/// Parse every score line in `text`, skipping lines that are not one
pub fn parse(text: &str) -> Vec<Descriptor> {
    let mut events = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }

        match parse_line(line) {
            Some(event) => events.push(event),
            None => debug!("Skipping line {}: {}", idx + 1, line),
        }
    }

    events
}

/// `#` starts a comment only at line start or after whitespace (`F#2` is a note)
fn strip_comment(line: &str) -> &str {
    let mut prev_blank = true;
    for (idx, c) in line.char_indices() {
        if c == '#' && prev_blank {
            return &line[..idx];
        }
        prev_blank = c.is_whitespace();
    }
    line
}

/// Parse one comment-free line
pub fn parse_line(line: &str) -> Option<Descriptor> {
    if let Some(caps) = SYNTH_LINE.captures(line) {
        let release = caps[3].parse::<f64>().ok()?;
        let amp = caps[4].parse::<f64>().ok()?;
        return Some(Descriptor::synth(&caps[1], &caps[2], release, amp));
    }

    if let Some(caps) = SLEEP_LINE.captures(line) {
        let beats = caps[1].parse::<f64>().ok()?;
        return Some(Descriptor::sleep(beats));
    }

    None
}

/// Total rest time of a score, in beats
pub fn total_beats(events: &[Descriptor]) -> f64 {
    events.iter().map(Descriptor::rest_beats).sum()
}

/// Render descriptors back to score text
pub fn render(events: &[Descriptor]) -> String {
    events
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
