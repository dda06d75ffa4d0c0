// Deterministic note-sequence initializers.
//
// Eight placement patterns — {ascending, descending, chord-zigzag,
// bar-zigzag} crossed with {arpeggio source, scale source} — fill a bar
// sequence's notes from each chord's derived pitch set. Per chord: as
// many default-duration notes as fit, plus one remainder note when the
// division is inexact, so the bar-duration invariant holds exactly.
//
// The walk starts near the previous chord's last-played pitch (melodic
// continuity), or at the set midpoint for the first chord, then steps in
// the pattern's direction, bouncing from either edge of the set back to
// its middle. No randomness: initializer output is the deterministic
// skeleton used both by the simple compositor strategies and as seed
// material for the genetic population.
//
// Precondition: the pitch window spans at least one octave (validated
// once by CompositionParams); otherwise a chord's mapped set may be
// empty and the walk is undefined for that chord.

use crate::bar::Bar;
use crate::chord::Chord;
use crate::duration::Duration;
use crate::pitch::{Note, Pitch};

/// Placement direction pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitPattern {
    Ascending,
    Descending,
    /// Direction flips at every chord boundary.
    ChordZigzag,
    /// Direction flips at every bar boundary.
    BarZigzag,
}

impl InitPattern {
    pub const ALL: [InitPattern; 4] = [
        InitPattern::Ascending,
        InitPattern::Descending,
        InitPattern::ChordZigzag,
        InitPattern::BarZigzag,
    ];
}

/// Which derived pitch set the walk draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PitchSource {
    Arpeggio,
    Scale,
}

impl PitchSource {
    pub const ALL: [PitchSource; 2] = [PitchSource::Arpeggio, PitchSource::Scale];

    pub fn pitches(&self, chord: &Chord, low: u8, high: u8) -> Vec<u8> {
        match self {
            PitchSource::Arpeggio => chord.arpeggio_pitches(low, high),
            PitchSource::Scale => chord.scale_pitches(low, high),
        }
    }
}

/// Fill every bar's notes in place.
pub fn fill_bars(
    bars: &mut [Bar],
    pattern: InitPattern,
    source: PitchSource,
    low: u8,
    high: u8,
    default_duration: Duration,
) {
    let mut prev_pitch: Option<u8> = None;
    let mut chord_counter: usize = 0;

    for (bar_idx, bar) in bars.iter_mut().enumerate() {
        bar.notes.clear();
        let chords = bar.chords.clone();
        for chord in &chords {
            let direction = direction_for(pattern, bar_idx, chord_counter);
            chord_counter += 1;

            let set = source.pitches(chord, low, high);
            let slots = slot_durations(chord.duration(), default_duration);
            if set.is_empty() {
                debug_assert!(false, "empty pitch set for {chord} in [{low}, {high}]");
                for d in slots {
                    bar.notes.push(Note::new(Pitch::Rest, d));
                }
                continue;
            }

            let mut idx = match prev_pitch {
                Some(prev) => nearest_index(&set, prev),
                None => set.len() / 2,
            };
            for d in slots {
                let pitch = set[idx];
                bar.notes.push(Note::new(Pitch::Tone(pitch), d));
                prev_pitch = Some(pitch);
                idx = step_index(idx, direction, set.len());
            }
        }
        debug_assert!(bar.is_note_durations_valid());
    }
}

/// How many default-duration slots fit in a chord, plus the remainder.
fn slot_durations(chord_duration: Duration, default: Duration) -> Vec<Duration> {
    let mut slots = Vec::new();
    let mut rem = Some(chord_duration);
    while let Some(r) = rem {
        if r >= default {
            slots.push(default);
            rem = r.checked_sub(default);
        } else {
            slots.push(r);
            rem = None;
        }
    }
    slots
}

fn direction_for(pattern: InitPattern, bar_idx: usize, chord_counter: usize) -> i32 {
    match pattern {
        InitPattern::Ascending => 1,
        InitPattern::Descending => -1,
        InitPattern::ChordZigzag => {
            if chord_counter % 2 == 0 {
                1
            } else {
                -1
            }
        }
        InitPattern::BarZigzag => {
            if bar_idx % 2 == 0 {
                1
            } else {
                -1
            }
        }
    }
}

/// Step through the set, bouncing from either edge back to its middle.
fn step_index(idx: usize, direction: i32, len: usize) -> usize {
    let next = idx as i64 + direction as i64;
    if next < 0 || next >= len as i64 {
        len / 2
    } else {
        next as usize
    }
}

fn nearest_index(set: &[u8], target: u8) -> usize {
    set.iter()
        .enumerate()
        .min_by_key(|&(_, &p)| (p as i16 - target as i16).unsigned_abs())
        .map(|(i, _)| i)
        .expect("nearest_index called on empty set")
}
