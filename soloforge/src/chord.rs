// Chords and their playable pitch sets.
//
// Each chord type carries two fixed interval patterns from its root:
// - the arpeggio pattern: the exact chord tones, and
// - a wider compatible-scale pattern: one mapping scale per type.
//
// Both derivations instantiate the pattern at the requested root and
// filter to a pitch window. For any window of at least one octave the
// result is guaranteed non-empty; narrower windows are rejected once, up
// front, by parameter validation — the derivations themselves have no
// error path.
//
// Consumed by initializer.rs (deterministic note placement), mutation.rs
// (pitch-swap proposals), and fitness.rs (chord-tone accent alignment).

use crate::duration::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The twelve pitch classes. Spelled with the flats/sharps used by the
/// pitch-name table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteName {
    C,
    Db,
    D,
    Eb,
    E,
    F,
    Gb,
    G,
    Ab,
    A,
    Bb,
    B,
}

impl NoteName {
    /// Semitone offset from C.
    pub fn semitone(self) -> u8 {
        match self {
            NoteName::C => 0,
            NoteName::Db => 1,
            NoteName::D => 2,
            NoteName::Eb => 3,
            NoteName::E => 4,
            NoteName::F => 5,
            NoteName::Gb => 6,
            NoteName::G => 7,
            NoteName::Ab => 8,
            NoteName::A => 9,
            NoteName::Bb => 10,
            NoteName::B => 11,
        }
    }
}

impl FromStr for NoteName {
    type Err = String;

    /// Accepts both sharp and flat spellings ("C#" and "Db").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "C" => Ok(NoteName::C),
            "C#" | "Db" => Ok(NoteName::Db),
            "D" => Ok(NoteName::D),
            "D#" | "Eb" => Ok(NoteName::Eb),
            "E" => Ok(NoteName::E),
            "F" => Ok(NoteName::F),
            "F#" | "Gb" => Ok(NoteName::Gb),
            "G" => Ok(NoteName::G),
            "G#" | "Ab" => Ok(NoteName::Ab),
            "A" => Ok(NoteName::A),
            "A#" | "Bb" => Ok(NoteName::Bb),
            "B" => Ok(NoteName::B),
            _ => Err(format!("unknown note name '{s}'")),
        }
    }
}

/// Chord quality. Each variant maps to one arpeggio pattern and one
/// compatible scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChordType {
    Major,
    Minor,
    Diminished,
    Augmented,
    Dominant7,
    Major7,
    Minor7,
    Sus4,
}

impl ChordType {
    pub const ALL: [ChordType; 8] = [
        ChordType::Major,
        ChordType::Minor,
        ChordType::Diminished,
        ChordType::Augmented,
        ChordType::Dominant7,
        ChordType::Major7,
        ChordType::Minor7,
        ChordType::Sus4,
    ];

    /// Semitone intervals of the chord tones from the root.
    pub fn arpeggio_intervals(self) -> &'static [u8] {
        match self {
            ChordType::Major => &[0, 4, 7],
            ChordType::Minor => &[0, 3, 7],
            ChordType::Diminished => &[0, 3, 6],
            ChordType::Augmented => &[0, 4, 8],
            ChordType::Dominant7 => &[0, 4, 7, 10],
            ChordType::Major7 => &[0, 4, 7, 11],
            ChordType::Minor7 => &[0, 3, 7, 10],
            ChordType::Sus4 => &[0, 5, 7],
        }
    }

    /// Semitone intervals of the compatible scale from the root: one fixed
    /// mapping scale per type (Ionian for major qualities, Aeolian for
    /// minor, Dorian for minor sevenths, Mixolydian for dominants and
    /// suspensions, Locrian for diminished, whole-tone for augmented).
    pub fn scale_intervals(self) -> &'static [u8] {
        match self {
            ChordType::Major => &[0, 2, 4, 5, 7, 9, 11],
            ChordType::Minor => &[0, 2, 3, 5, 7, 8, 10],
            ChordType::Diminished => &[0, 1, 3, 5, 6, 8, 10],
            ChordType::Augmented => &[0, 2, 4, 6, 8, 10],
            ChordType::Dominant7 => &[0, 2, 4, 5, 7, 9, 10],
            ChordType::Major7 => &[0, 2, 4, 5, 7, 9, 11],
            ChordType::Minor7 => &[0, 2, 3, 5, 7, 9, 10],
            ChordType::Sus4 => &[0, 2, 4, 5, 7, 9, 10],
        }
    }
}

impl FromStr for ChordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "major" => Ok(ChordType::Major),
            "minor" => Ok(ChordType::Minor),
            "diminished" => Ok(ChordType::Diminished),
            "augmented" => Ok(ChordType::Augmented),
            "dominant7" => Ok(ChordType::Dominant7),
            "major7" => Ok(ChordType::Major7),
            "minor7" => Ok(ChordType::Minor7),
            "sus4" => Ok(ChordType::Sus4),
            _ => Err(format!("unknown chord type '{s}'")),
        }
    }
}

/// One chord of the harmonic skeleton: root, quality, and the span it
/// occupies inside its bar. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chord {
    root: NoteName,
    kind: ChordType,
    duration: Duration,
}

impl Chord {
    pub fn new(root: NoteName, kind: ChordType, duration: Duration) -> Self {
        Chord { root, kind, duration }
    }

    pub fn root(&self) -> NoteName {
        self.root
    }

    pub fn kind(&self) -> ChordType {
        self.kind
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// All chord tones inside `[low, high]`, ascending.
    pub fn arpeggio_pitches(&self, low: u8, high: u8) -> Vec<u8> {
        self.pitches_from(self.kind.arpeggio_intervals(), low, high)
    }

    /// All compatible-scale pitches inside `[low, high]`, ascending.
    pub fn scale_pitches(&self, low: u8, high: u8) -> Vec<u8> {
        self.pitches_from(self.kind.scale_intervals(), low, high)
    }

    /// True if the pitch's class is one of the chord tones.
    pub fn contains_chord_tone(&self, pitch: u8) -> bool {
        let pc = (pitch as u32 + 12 - self.root.semitone() as u32) % 12;
        self.kind.arpeggio_intervals().contains(&(pc as u8))
    }

    fn pitches_from(&self, intervals: &[u8], low: u8, high: u8) -> Vec<u8> {
        let root_pc = self.root.semitone();
        let mut classes = [false; 12];
        for &iv in intervals {
            classes[((root_pc + iv) % 12) as usize] = true;
        }
        (low..=high)
            .filter(|&p| classes[(p % 12) as usize])
            .collect()
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}-{:?}", self.root, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c_major_arpeggio() {
        let chord = Chord::new(NoteName::C, ChordType::Major, Duration::WHOLE);
        let pitches = chord.arpeggio_pitches(60, 72);
        // C4 E4 G4 C5
        assert_eq!(pitches, vec![60, 64, 67, 72]);
    }

    #[test]
    fn test_scale_wider_than_arpeggio() {
        let chord = Chord::new(NoteName::G, ChordType::Dominant7, Duration::WHOLE);
        let arp = chord.arpeggio_pitches(55, 79);
        let scale = chord.scale_pitches(55, 79);
        assert!(scale.len() > arp.len());
        // Every chord tone is also in the compatible scale.
        for p in &arp {
            assert!(scale.contains(p), "{p} missing from scale set");
        }
    }

    #[test]
    fn test_nonempty_for_any_octave_window() {
        // Every chord type, every root, every one-octave window: both
        // derivations are non-empty and stay inside the window.
        let roots = [
            NoteName::C,
            NoteName::Db,
            NoteName::D,
            NoteName::Eb,
            NoteName::E,
            NoteName::F,
            NoteName::Gb,
            NoteName::G,
            NoteName::Ab,
            NoteName::A,
            NoteName::Bb,
            NoteName::B,
        ];
        for kind in ChordType::ALL {
            for root in roots {
                let chord = Chord::new(root, kind, Duration::WHOLE);
                for low in (24..=96).step_by(5) {
                    let high = low + 12;
                    for set in [
                        chord.arpeggio_pitches(low, high),
                        chord.scale_pitches(low, high),
                    ] {
                        assert!(
                            !set.is_empty(),
                            "{chord} empty in [{low}, {high}]"
                        );
                        assert!(set.iter().all(|&p| p >= low && p <= high));
                    }
                }
            }
        }
    }

    #[test]
    fn test_contains_chord_tone() {
        let chord = Chord::new(NoteName::A, ChordType::Minor, Duration::WHOLE);
        assert!(chord.contains_chord_tone(69)); // A4
        assert!(chord.contains_chord_tone(72)); // C5 (minor third)
        assert!(chord.contains_chord_tone(76)); // E5 (fifth)
        assert!(!chord.contains_chord_tone(70)); // Bb4
    }

    #[test]
    fn test_note_name_parsing() {
        assert_eq!("C#".parse::<NoteName>().unwrap(), NoteName::Db);
        assert_eq!("Bb".parse::<NoteName>().unwrap(), NoteName::Bb);
        assert!("H".parse::<NoteName>().is_err());
        assert_eq!("minor7".parse::<ChordType>().unwrap(), ChordType::Minor7);
        assert!("power".parse::<ChordType>().is_err());
    }
}
