// Pitch domain and notes.
//
// A pitch is either an absolute MIDI tone (0-127) or one of two sentinels:
// Rest (silence) and Hold (continue the previous sounding pitch). A Note
// pairs a pitch with a rational Duration.
//
// The interval helpers and the pitch-name table are used by crossover
// point selection, fitness scoring, and the CLI's ranking report.

use crate::duration::Duration;
use serde::{Deserialize, Serialize};

/// A single pitch value: an absolute tone, silence, or a continuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pitch {
    /// MIDI pitch number, 0-127.
    Tone(u8),
    /// Silence.
    Rest,
    /// Continue the pitch of the previous sounding note.
    Hold,
}

impl Pitch {
    pub fn is_tone(&self) -> bool {
        matches!(self, Pitch::Tone(_))
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, Pitch::Rest)
    }

    pub fn is_hold(&self) -> bool {
        matches!(self, Pitch::Hold)
    }

    /// The MIDI tone, or None for the sentinels.
    pub fn tone(&self) -> Option<u8> {
        match self {
            Pitch::Tone(p) => Some(*p),
            _ => None,
        }
    }
}

/// One melodic event: a pitch sounding for a duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub pitch: Pitch,
    pub duration: Duration,
}

impl Note {
    pub fn new(pitch: Pitch, duration: Duration) -> Self {
        Note { pitch, duration }
    }
}

/// Musical interval helpers.
pub mod interval {
    /// Interval in semitones between two MIDI pitches.
    /// Positive means pitch_b is higher.
    pub fn semitones(pitch_a: u8, pitch_b: u8) -> i16 {
        pitch_b as i16 - pitch_a as i16
    }

    /// Absolute interval size in semitones.
    pub fn distance(pitch_a: u8, pitch_b: u8) -> u16 {
        semitones(pitch_a, pitch_b).unsigned_abs()
    }
}

/// Convert a MIDI pitch to a compact note name (e.g., "C4", "F#3").
pub fn pitch_name(pitch: u8) -> &'static str {
    // MIDI 60 is C4, so the table starts one octave below C0.
    const NAMES: &[&str] = &[
        "C-1", "C#-1", "D-1", "Eb-1", "E-1", "F-1", "F#-1", "G-1", "Ab-1", "A-1", "Bb-1", "B-1",
        "C0", "C#0", "D0", "Eb0", "E0", "F0", "F#0", "G0", "Ab0", "A0", "Bb0", "B0", "C1", "C#1",
        "D1", "Eb1", "E1", "F1", "F#1", "G1", "Ab1", "A1", "Bb1", "B1", "C2", "C#2", "D2", "Eb2",
        "E2", "F2", "F#2", "G2", "Ab2", "A2", "Bb2", "B2", "C3", "C#3", "D3", "Eb3", "E3", "F3",
        "F#3", "G3", "Ab3", "A3", "Bb3", "B3", "C4", "C#4", "D4", "Eb4", "E4", "F4", "F#4", "G4",
        "Ab4", "A4", "Bb4", "B4", "C5", "C#5", "D5", "Eb5", "E5", "F5", "F#5", "G5", "Ab5", "A5",
        "Bb5", "B5", "C6", "C#6", "D6", "Eb6", "E6", "F6", "F#6", "G6", "Ab6", "A6", "Bb6", "B6",
        "C7", "C#7", "D7", "Eb7", "E7", "F7", "F#7", "G7", "Ab7", "A7", "Bb7", "B7", "C8", "C#8",
        "D8", "Eb8", "E8", "F8", "F#8", "G8", "Ab8", "A8", "Bb8", "B8", "C9", "C#9", "D9", "Eb9",
        "E9", "F9", "F#9", "G9",
    ];
    if (pitch as usize) < NAMES.len() {
        NAMES[pitch as usize]
    } else {
        "??"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels() {
        assert!(Pitch::Rest.is_rest());
        assert!(Pitch::Hold.is_hold());
        assert!(Pitch::Tone(60).is_tone());
        assert_eq!(Pitch::Tone(60).tone(), Some(60));
        assert_eq!(Pitch::Hold.tone(), None);
    }

    #[test]
    fn test_interval_helpers() {
        assert_eq!(interval::semitones(60, 67), 7);
        assert_eq!(interval::semitones(67, 60), -7);
        assert_eq!(interval::distance(67, 60), 7);
    }

    #[test]
    fn test_pitch_names() {
        assert_eq!(pitch_name(0), "C-1");
        assert_eq!(pitch_name(60), "C4");
        assert_eq!(pitch_name(48), "C3");
        assert_eq!(pitch_name(91), "G6");
        assert_eq!(pitch_name(127), "G9");
        assert_eq!(pitch_name(128), "??");
    }
}
