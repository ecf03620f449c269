//! Note name resolution
//!
//! Senders pass notes as text: either a MIDI number (`"60"`, `"61.5"`) or a
//! name such as `C4`, `:eb3`, `Fs2` or `a` (octave 4 when omitted).

use std::collections::HashMap;

/// MIDI note number type
pub type MidiNote = u8;

lazy_static::lazy_static! {
    static ref NOTE_TO_MIDI: HashMap<String, MidiNote> = {
        let mut m = HashMap::new();
        // Pitch classes with every sharp/flat spelling senders use
        let classes: [(&[&str], u8); 12] = [
            (&["c"], 0),
            (&["cs", "c#", "df", "db"], 1),
            (&["d"], 2),
            (&["ds", "d#", "ef", "eb"], 3),
            (&["e", "ff", "fb"], 4),
            (&["f", "es", "e#"], 5),
            (&["fs", "f#", "gf", "gb"], 6),
            (&["g"], 7),
            (&["gs", "g#", "af", "ab"], 8),
            (&["a"], 9),
            (&["as", "a#", "bf", "bb"], 10),
            (&["b"], 11),
        ];
        for octave in -1i32..=9 {
            let base = (octave + 1) * 12;
            for (names, offset) in classes.iter() {
                let midi = base + *offset as i32;
                if !(0..=127).contains(&midi) {
                    continue;
                }
                for name in names.iter() {
                    m.insert(format!("{}{}", name, octave), midi as MidiNote);
                }
            }
        }
        m
    };
}

/// Convert a note name to its MIDI number
pub fn note_to_midi(note: &str) -> Option<MidiNote> {
    let name = note.trim().trim_start_matches(':').to_lowercase();
    if name.is_empty() {
        return None;
    }

    if let Some(&midi) = NOTE_TO_MIDI.get(&name) {
        return Some(midi);
    }

    // No octave digit: default to octave 4
    if !name.ends_with(|c: char| c.is_ascii_digit()) {
        return NOTE_TO_MIDI.get(&format!("{}4", name)).copied();
    }

    None
}

/// Resolve note text to a (possibly fractional) MIDI number
pub fn resolve(note: &str) -> Option<f64> {
    let trimmed = note.trim();
    if let Ok(n) = trimmed.parse::<f64>() {
        return n.is_finite().then_some(n);
    }
    note_to_midi(trimmed).map(f64::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_names() {
        assert_eq!(note_to_midi("C4"), Some(60));
        assert_eq!(note_to_midi("a4"), Some(69));
        assert_eq!(note_to_midi("E2"), Some(40));
        assert_eq!(note_to_midi("c-1"), Some(0));
    }

    #[test]
    fn test_sonic_pi_symbol_prefix() {
        assert_eq!(note_to_midi(":c4"), Some(60));
        assert_eq!(note_to_midi(":Eb3"), Some(51));
    }

    #[test]
    fn test_accidentals() {
        assert_eq!(note_to_midi("fs2"), Some(42));
        assert_eq!(note_to_midi("F#2"), Some(42));
        assert_eq!(note_to_midi("gb2"), Some(42));
        assert_eq!(note_to_midi("bb3"), Some(58));
        assert_eq!(note_to_midi("b3"), Some(59));
    }

    #[test]
    fn test_default_octave() {
        assert_eq!(note_to_midi("a"), Some(69));
        assert_eq!(note_to_midi("cs"), Some(61));
    }

    #[test]
    fn test_unknown_names() {
        assert_eq!(note_to_midi(""), None);
        assert_eq!(note_to_midi("h4"), None);
        assert_eq!(note_to_midi("g10"), None);
    }

    #[test]
    fn test_resolve_numbers_and_names() {
        assert_eq!(resolve("60"), Some(60.0));
        assert_eq!(resolve("61.5"), Some(61.5));
        assert_eq!(resolve("C4"), Some(60.0));
        assert_eq!(resolve("nan"), None);
        assert_eq!(resolve("xyz"), None);
    }
}
