// One individual of the evolving population.
//
// A candidate owns a deep copy of its bar sequence — bars and notes are
// plain value types, so Clone is the deep copy and no two candidates ever
// alias note storage. The dirty flag marks candidates whose notes changed
// since the last fitness evaluation.
//
// Also home to the whole-melody primitives shared by seeding and the
// mutation operators: note-neighbor lookup across bar boundaries, the
// reverse-all twin used at population seeding, and the leading-hold
// repair (the first sounding event of a melody may never be Hold — there
// is nothing before it to hold).

use crate::bar::Bar;
use crate::pitch::Pitch;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MelodyCandidate {
    /// Generation this candidate was created in.
    pub generation: u32,
    /// Owned bar sequence, notes included.
    pub bars: Vec<Bar>,
    /// Last evaluated fitness. Meaningless while dirty.
    pub fitness: f64,
    /// True when the notes changed since the last evaluation.
    pub dirty: bool,
}

impl MelodyCandidate {
    pub fn new(bars: Vec<Bar>, generation: u32) -> Self {
        MelodyCandidate {
            generation,
            bars,
            fitness: 0.0,
            dirty: true,
        }
    }

    /// The reversed twin: every bar's note order inverted.
    pub fn reversed_twin(&self, generation: u32) -> Self {
        let mut twin = MelodyCandidate::new(self.bars.clone(), generation);
        for bar in &mut twin.bars {
            bar.notes.reverse();
        }
        twin.fix_leading_hold();
        twin
    }

    /// The pitch of the first sounding event, resolving nothing — a
    /// leading Hold is reported as None by `tone()`.
    pub fn first_sounding_pitch(&self) -> Option<Pitch> {
        self.bars
            .iter()
            .flat_map(|b| b.notes.iter())
            .map(|n| n.pitch)
            .find(|p| !p.is_rest())
    }

    /// Re-establish the hold-note invariant: if the melody's first
    /// sounding event is a Hold, give it the pitch of the nearest
    /// following tone (or silence it when no tone exists at all).
    pub fn fix_leading_hold(&mut self) {
        let replacement = self
            .bars
            .iter()
            .flat_map(|b| b.notes.iter())
            .find_map(|n| n.pitch.tone());
        for bar in &mut self.bars {
            for note in &mut bar.notes {
                match note.pitch {
                    Pitch::Rest => continue,
                    Pitch::Tone(_) => return,
                    Pitch::Hold => {
                        note.pitch = match replacement {
                            Some(p) => Pitch::Tone(p),
                            None => Pitch::Rest,
                        };
                        return;
                    }
                }
            }
        }
    }
}

/// The nearest sounding tone strictly before (bar_idx, note_idx),
/// scanning backward across bar boundaries.
pub fn nearest_tone_before(bars: &[Bar], bar_idx: usize, note_idx: usize) -> Option<u8> {
    let mut bar = bar_idx;
    let mut note = note_idx;
    loop {
        while note > 0 {
            note -= 1;
            if let Some(p) = bars[bar].notes[note].pitch.tone() {
                return Some(p);
            }
        }
        if bar == 0 {
            return None;
        }
        bar -= 1;
        note = bars[bar].notes.len();
    }
}

/// The nearest sounding tone strictly after (bar_idx, note_idx),
/// scanning forward across bar boundaries.
pub fn nearest_tone_after(bars: &[Bar], bar_idx: usize, note_idx: usize) -> Option<u8> {
    let mut first = true;
    for bar in bars.iter().skip(bar_idx) {
        let start = if first { note_idx + 1 } else { 0 };
        first = false;
        for note in bar.notes.iter().skip(start) {
            if let Some(p) = note.pitch.tone() {
                return Some(p);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bar::TimeSignature;
    use crate::chord::{Chord, ChordType, NoteName};
    use crate::duration::Duration;
    use crate::pitch::Note;

    fn bar_with(pitches: &[Pitch]) -> Bar {
        let ts = TimeSignature::new(4, 4);
        let mut bar = Bar::new(
            ts,
            vec![Chord::new(NoteName::C, ChordType::Major, Duration::WHOLE)],
        );
        bar.notes = pitches
            .iter()
            .map(|&p| Note::new(p, Duration::QUARTER))
            .collect();
        bar
    }

    #[test]
    fn test_clone_is_deep() {
        let cand = MelodyCandidate::new(
            vec![bar_with(&[
                Pitch::Tone(60),
                Pitch::Tone(64),
                Pitch::Tone(67),
                Pitch::Tone(72),
            ])],
            0,
        );
        let mut copy = cand.clone();
        copy.bars[0].notes[0].pitch = Pitch::Tone(48);
        assert_eq!(cand.bars[0].notes[0].pitch, Pitch::Tone(60));
    }

    #[test]
    fn test_fix_leading_hold() {
        let mut cand = MelodyCandidate::new(
            vec![bar_with(&[
                Pitch::Rest,
                Pitch::Hold,
                Pitch::Tone(64),
                Pitch::Tone(67),
            ])],
            0,
        );
        assert_eq!(cand.first_sounding_pitch(), Some(Pitch::Hold));
        cand.fix_leading_hold();
        assert_eq!(cand.first_sounding_pitch(), Some(Pitch::Tone(64)));
    }

    #[test]
    fn test_reversed_twin_never_starts_on_hold() {
        let cand = MelodyCandidate::new(
            vec![bar_with(&[
                Pitch::Tone(60),
                Pitch::Tone(62),
                Pitch::Tone(64),
                Pitch::Hold,
            ])],
            0,
        );
        let twin = cand.reversed_twin(0);
        assert_eq!(twin.first_sounding_pitch(), Some(Pitch::Tone(64)));
        // Original is untouched.
        assert_eq!(cand.bars[0].notes[0].pitch, Pitch::Tone(60));
    }

    #[test]
    fn test_neighbor_lookup_crosses_bars() {
        let bars = vec![
            bar_with(&[Pitch::Tone(60), Pitch::Tone(62), Pitch::Rest, Pitch::Tone(64)]),
            bar_with(&[Pitch::Hold, Pitch::Rest, Pitch::Tone(67), Pitch::Tone(69)]),
        ];
        assert_eq!(nearest_tone_before(&bars, 1, 0), Some(64));
        assert_eq!(nearest_tone_after(&bars, 0, 3), Some(67));
        assert_eq!(nearest_tone_before(&bars, 0, 0), None);
        assert_eq!(nearest_tone_after(&bars, 1, 3), None);
    }
}
