// Bars: the unit the whole search works in.
//
// A bar carries a time signature, an immutable chord sequence supplied by
// the harmonic skeleton, and a mutable note sequence that the initializers
// and mutation operators rewrite. Two duration invariants hold at rest
// (between operations, never assumed mid-mutation):
// - sum(chord durations) == the signature total, fixed at construction;
// - sum(note durations) == the same total, re-established by every
//   initializer and mutation operator before it returns.
//
// The chord-sum invariant is a documented precondition of the skeleton
// supplier (the progression parser validates it once at the boundary);
// the core does not re-check it per mutation.

use crate::chord::Chord;
use crate::duration::{Duration, Offset};
use crate::pitch::{Note, Pitch};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A time signature. Kept unreduced — 4/4 and 2/2 are different
/// signatures even though they span the same fraction of a whole note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: u8,
    pub denominator: u8,
}

impl TimeSignature {
    pub fn new(numerator: u8, denominator: u8) -> Self {
        assert!(numerator > 0 && denominator > 0, "degenerate time signature");
        TimeSignature { numerator, denominator }
    }

    /// The bar's total span as a fraction of a whole note.
    pub fn total(&self) -> Duration {
        Duration::new(self.numerator, self.denominator)
    }
}

/// One measure: signature, fixed chords, mutable notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time_signature: TimeSignature,
    pub chords: Vec<Chord>,
    pub notes: Vec<Note>,
}

impl Bar {
    /// Build a bar of the harmonic skeleton (no notes yet).
    ///
    /// Debug-asserts the chord-sum invariant; release builds trust the
    /// boundary validation in the progression parser.
    pub fn new(time_signature: TimeSignature, chords: Vec<Chord>) -> Self {
        debug_assert!(
            chords_fill_signature(&chords, time_signature),
            "chord durations must sum to the signature total"
        );
        Bar {
            time_signature,
            chords,
            notes: Vec::new(),
        }
    }

    /// Sum of note durations as an offset from the bar start.
    pub fn notes_total(&self) -> Offset {
        let mut total = Offset::zero();
        for note in &self.notes {
            total.push(note.duration);
        }
        total
    }

    /// True when the note durations sum exactly to the signature total.
    pub fn is_note_durations_valid(&self) -> bool {
        let mut expected = Offset::zero();
        expected.push(self.time_signature.total());
        self.notes_total() == expected
    }

    /// The chord sounding at a given offset from the bar start.
    pub fn chord_at(&self, offset: Offset) -> &Chord {
        let mut end = Offset::zero();
        for chord in &self.chords {
            end.push(chord.duration());
            if offset < end {
                return chord;
            }
        }
        // Offsets at or past the bar end attach to the final chord.
        self.chords.last().expect("bar has at least one chord")
    }

    /// Note-index range per chord, assigning each note to the chord that
    /// contains its onset. Ranges are contiguous and cover all notes.
    pub fn chord_spans(&self) -> Vec<(usize, Range<usize>)> {
        let mut spans: Vec<(usize, Range<usize>)> = Vec::new();
        let mut chord_end = Offset::zero();
        let mut chord_idx = 0usize;
        if let Some(first) = self.chords.first() {
            chord_end.push(first.duration());
        }

        let mut onset = Offset::zero();
        let mut span_start = 0usize;
        for (i, note) in self.notes.iter().enumerate() {
            while onset >= chord_end && chord_idx + 1 < self.chords.len() {
                if span_start < i {
                    spans.push((chord_idx, span_start..i));
                    span_start = i;
                }
                chord_idx += 1;
                chord_end.push(self.chords[chord_idx].duration());
            }
            onset.push(note.duration);
        }
        if span_start < self.notes.len() {
            spans.push((chord_idx, span_start..self.notes.len()));
        }
        spans
    }

    /// The first sounding tone of the bar, skipping rests and holds.
    pub fn first_tone(&self) -> Option<u8> {
        self.notes.iter().find_map(|n| n.pitch.tone())
    }

    /// The last sounding tone of the bar.
    pub fn last_tone(&self) -> Option<u8> {
        self.notes.iter().rev().find_map(|n| n.pitch.tone())
    }

    /// Indices of notes matching a pitch predicate.
    pub fn note_indices_where(&self, pred: impl Fn(&Pitch) -> bool) -> Vec<usize> {
        self.notes
            .iter()
            .enumerate()
            .filter(|(_, n)| pred(&n.pitch))
            .map(|(i, _)| i)
            .collect()
    }
}

fn chords_fill_signature(chords: &[Chord], ts: TimeSignature) -> bool {
    let mut total = Offset::zero();
    for chord in chords {
        total.push(chord.duration());
    }
    let mut expected = Offset::zero();
    expected.push(ts.total());
    total == expected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::{ChordType, NoteName};

    fn c_major_bar() -> Bar {
        let ts = TimeSignature::new(4, 4);
        Bar::new(
            ts,
            vec![Chord::new(NoteName::C, ChordType::Major, Duration::WHOLE)],
        )
    }

    fn two_chord_bar() -> Bar {
        let ts = TimeSignature::new(4, 4);
        Bar::new(
            ts,
            vec![
                Chord::new(NoteName::C, ChordType::Major, Duration::HALF),
                Chord::new(NoteName::G, ChordType::Dominant7, Duration::HALF),
            ],
        )
    }

    #[test]
    fn test_duration_invariant_detection() {
        let mut bar = c_major_bar();
        bar.notes = vec![
            Note::new(Pitch::Tone(60), Duration::HALF),
            Note::new(Pitch::Tone(64), Duration::QUARTER),
        ];
        assert!(!bar.is_note_durations_valid());
        bar.notes.push(Note::new(Pitch::Tone(67), Duration::QUARTER));
        assert!(bar.is_note_durations_valid());
    }

    #[test]
    fn test_chord_at_offset() {
        let bar = two_chord_bar();
        let mut off = Offset::zero();
        assert_eq!(bar.chord_at(off).root(), NoteName::C);
        off.push(Duration::QUARTER);
        assert_eq!(bar.chord_at(off).root(), NoteName::C);
        off.push(Duration::QUARTER);
        assert_eq!(bar.chord_at(off).root(), NoteName::G);
    }

    #[test]
    fn test_chord_spans() {
        let mut bar = two_chord_bar();
        bar.notes = vec![
            Note::new(Pitch::Tone(60), Duration::QUARTER),
            Note::new(Pitch::Tone(64), Duration::QUARTER),
            Note::new(Pitch::Tone(67), Duration::QUARTER),
            Note::new(Pitch::Tone(65), Duration::QUARTER),
        ];
        let spans = bar.chord_spans();
        assert_eq!(spans, vec![(0, 0..2), (1, 2..4)]);
    }

    #[test]
    fn test_first_and_last_tone_skip_sentinels() {
        let mut bar = c_major_bar();
        bar.notes = vec![
            Note::new(Pitch::Rest, Duration::QUARTER),
            Note::new(Pitch::Tone(64), Duration::QUARTER),
            Note::new(Pitch::Tone(67), Duration::QUARTER),
            Note::new(Pitch::Hold, Duration::QUARTER),
        ];
        assert_eq!(bar.first_tone(), Some(64));
        assert_eq!(bar.last_tone(), Some(67));
    }
}
