// Music-aware mutation operators.
//
// Nine per-bar operators, picked uniformly at random for every bar of a
// mutated candidate:
//   1. chord-pitch swap     — re-pitch a tone from the chord's arpeggio set
//   2. scale-pitch swap     — same, from the chord's compatible scale
//   3. duration split       — one note becomes two (1:1, 1:3, or 3:1)
//   4. swap-two-notes       — exchange two notes inside the bar
//   5. reverse-chord-notes  — reverse the notes under one chord
//   6. reverse-bar-notes    — reverse each chord's notes, chord by chord
//   7. hold-toggle off      — a Hold regains its neighbor's pitch
//   8. hold-toggle on       — a tone becomes a Hold
//   9. syncopation          — pull a bar's first onset across the bar line
//
// (The tenth operator, reverse-all-notes, is melody-wide and runs only at
// population seeding — see MelodyCandidate::reversed_twin.)
//
// Every operator re-establishes the bar-duration invariant before it
// returns; an operator that finds no legal target is a no-op, never an
// error. The shared mutate_candidate driver repairs the leading-hold
// invariant after each application.

use crate::bar::Bar;
use crate::candidate::{MelodyCandidate, nearest_tone_after, nearest_tone_before};
use crate::duration::Duration;
use crate::pitch::{Note, Pitch};
use rand::Rng;

/// Everything an operator needs besides the bars themselves.
#[derive(Debug, Clone, Copy)]
pub struct MutationContext {
    /// Pitch window, inclusive.
    pub low: u8,
    pub high: u8,
    /// Semitone radius for the pitch-swap operators.
    pub swap_radius: u8,
    /// Shortest duration the split operator may produce.
    pub shortest: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOp {
    ChordPitchSwap,
    ScalePitchSwap,
    DurationSplit,
    SwapTwoNotes,
    ReverseChordNotes,
    ReverseBarNotes,
    HoldOff,
    HoldOn,
    Syncopation,
}

impl MutationOp {
    pub const ALL: [MutationOp; 9] = [
        MutationOp::ChordPitchSwap,
        MutationOp::ScalePitchSwap,
        MutationOp::DurationSplit,
        MutationOp::SwapTwoNotes,
        MutationOp::ReverseChordNotes,
        MutationOp::ReverseBarNotes,
        MutationOp::HoldOff,
        MutationOp::HoldOn,
        MutationOp::Syncopation,
    ];
}

/// Mutate one candidate: one uniformly chosen operator per bar.
pub fn mutate_candidate(
    candidate: &mut MelodyCandidate,
    ctx: &MutationContext,
    rng: &mut impl Rng,
) {
    for bar_idx in 0..candidate.bars.len() {
        let op = MutationOp::ALL[rng.random_range(0..MutationOp::ALL.len())];
        apply_op(&mut candidate.bars, bar_idx, op, ctx, rng);
        candidate.fix_leading_hold();
        debug_assert!(
            candidate.bars[bar_idx].is_note_durations_valid(),
            "{op:?} broke the duration invariant in bar {bar_idx}"
        );
    }
    candidate.dirty = true;
}

/// Apply one operator to one bar. Returns false when the operator found
/// no legal target (no-op).
pub fn apply_op(
    bars: &mut [Bar],
    bar_idx: usize,
    op: MutationOp,
    ctx: &MutationContext,
    rng: &mut impl Rng,
) -> bool {
    match op {
        MutationOp::ChordPitchSwap => pitch_swap(bars, bar_idx, false, ctx, rng),
        MutationOp::ScalePitchSwap => pitch_swap(bars, bar_idx, true, ctx, rng),
        MutationOp::DurationSplit => duration_split(bars, bar_idx, ctx, rng),
        MutationOp::SwapTwoNotes => swap_two_notes(bars, bar_idx, rng),
        MutationOp::ReverseChordNotes => reverse_chord_notes(bars, bar_idx, rng),
        MutationOp::ReverseBarNotes => reverse_bar_notes(bars, bar_idx),
        MutationOp::HoldOff => hold_off(bars, bar_idx, rng),
        MutationOp::HoldOn => hold_on(bars, bar_idx, rng),
        MutationOp::Syncopation => syncopate(bars, bar_idx, rng),
    }
}

/// Operators 1 and 2: replace a random tone with a nearby pitch from the
/// underlying chord's arpeggio or scale set.
fn pitch_swap(
    bars: &mut [Bar],
    bar_idx: usize,
    from_scale: bool,
    ctx: &MutationContext,
    rng: &mut impl Rng,
) -> bool {
    let bar = &bars[bar_idx];
    let tone_indices = bar.note_indices_where(|p| p.is_tone());
    if tone_indices.is_empty() {
        return false;
    }
    let note_idx = tone_indices[rng.random_range(0..tone_indices.len())];
    let current = bar.notes[note_idx]
        .pitch
        .tone()
        .expect("index filtered to tones");

    let spans = bar.chord_spans();
    let chord = spans
        .iter()
        .find(|(_, range)| range.contains(&note_idx))
        .map(|&(ci, _)| bar.chords[ci])
        .unwrap_or(bar.chords[0]);

    let set = if from_scale {
        chord.scale_pitches(ctx.low, ctx.high)
    } else {
        chord.arpeggio_pitches(ctx.low, ctx.high)
    };
    let options: Vec<u8> = set
        .into_iter()
        .filter(|&p| p != current && (p as i16 - current as i16).unsigned_abs() <= ctx.swap_radius as u16)
        .collect();
    if options.is_empty() {
        return false;
    }
    let replacement = options[rng.random_range(0..options.len())];
    bars[bar_idx].notes[note_idx].pitch = Pitch::Tone(replacement);
    true
}

/// Operator 3: split one note into two shorter notes summing to the
/// original, in one of three ratios: equal, anticipation (1:3), or
/// delay (3:1). Only notes long enough to respect the shortest-duration
/// floor are eligible.
fn duration_split(bars: &mut [Bar], bar_idx: usize, ctx: &MutationContext, rng: &mut impl Rng) -> bool {
    let ratio = rng.random_range(0..3u8);
    let parts_of = |d: Duration| -> Option<(Duration, Duration)> {
        match ratio {
            0 => d.half().map(|h| (h, h)),
            1 => d.quarter_part().zip(d.three_quarter_part()),
            _ => d.three_quarter_part().zip(d.quarter_part()),
        }
    };

    let bar = &bars[bar_idx];
    let eligible: Vec<(usize, (Duration, Duration))> = bar
        .notes
        .iter()
        .enumerate()
        .filter_map(|(i, n)| {
            let (a, b) = parts_of(n.duration)?;
            (a >= ctx.shortest && b >= ctx.shortest).then_some((i, (a, b)))
        })
        .collect();
    if eligible.is_empty() {
        return false;
    }
    let (note_idx, (first, second)) = eligible[rng.random_range(0..eligible.len())];
    let pitch = bars[bar_idx].notes[note_idx].pitch;
    bars[bar_idx].notes[note_idx] = Note::new(pitch, first);
    bars[bar_idx].notes.insert(note_idx + 1, Note::new(pitch, second));
    true
}

/// Operator 4: exchange the positions of two notes within the bar.
fn swap_two_notes(bars: &mut [Bar], bar_idx: usize, rng: &mut impl Rng) -> bool {
    let len = bars[bar_idx].notes.len();
    if len < 2 {
        return false;
    }
    let i = rng.random_range(0..len);
    let mut j = rng.random_range(0..len - 1);
    if j >= i {
        j += 1;
    }
    bars[bar_idx].notes.swap(i, j);
    true
}

/// Operator 5: reverse the note sub-sequence under one random chord.
fn reverse_chord_notes(bars: &mut [Bar], bar_idx: usize, rng: &mut impl Rng) -> bool {
    let spans = bars[bar_idx].chord_spans();
    if spans.is_empty() {
        return false;
    }
    let (_, range) = spans[rng.random_range(0..spans.len())].clone();
    bars[bar_idx].notes[range].reverse();
    true
}

/// Operator 6: reverse the whole bar chord-by-chord, each chord's notes
/// reversed in place so chord alignment is preserved.
fn reverse_bar_notes(bars: &mut [Bar], bar_idx: usize) -> bool {
    let spans = bars[bar_idx].chord_spans();
    if spans.is_empty() {
        return false;
    }
    for (_, range) in spans {
        bars[bar_idx].notes[range].reverse();
    }
    true
}

/// Operator 7: a random Hold regains a concrete pitch — the nearest
/// sounding predecessor, or the nearest successor when no predecessor
/// exists.
fn hold_off(bars: &mut [Bar], bar_idx: usize, rng: &mut impl Rng) -> bool {
    let holds = bars[bar_idx].note_indices_where(|p| p.is_hold());
    if holds.is_empty() {
        return false;
    }
    let note_idx = holds[rng.random_range(0..holds.len())];
    let pitch = nearest_tone_before(bars, bar_idx, note_idx)
        .or_else(|| nearest_tone_after(bars, bar_idx, note_idx));
    match pitch {
        Some(p) => {
            bars[bar_idx].notes[note_idx].pitch = Pitch::Tone(p);
            true
        }
        None => false,
    }
}

/// Operator 8: a random tone becomes a Hold. The melody's very first
/// sounding event is never eligible — it has nothing to hold from.
fn hold_on(bars: &mut [Bar], bar_idx: usize, rng: &mut impl Rng) -> bool {
    let first_sounding = first_sounding_position(bars);
    let candidates: Vec<usize> = bars[bar_idx]
        .note_indices_where(|p| p.is_tone())
        .into_iter()
        .filter(|&i| first_sounding != Some((bar_idx, i)))
        .collect();
    if candidates.is_empty() {
        return false;
    }
    let note_idx = candidates[rng.random_range(0..candidates.len())];
    bars[bar_idx].notes[note_idx].pitch = Pitch::Hold;
    true
}

fn first_sounding_position(bars: &[Bar]) -> Option<(usize, usize)> {
    for (bi, bar) in bars.iter().enumerate() {
        for (ni, note) in bar.notes.iter().enumerate() {
            if !note.pitch.is_rest() {
                return Some((bi, ni));
            }
        }
    }
    None
}

/// Operator 9: syncopation. The bar's first note becomes a Hold and its
/// onset moves into the preceding bar: the preceding bar's last note is
/// split (keeping its pitch, with an eighth note carrying the syncopated
/// pitch appended) or, when too short to split, replaced outright.
///
/// Legal only when both bars are non-empty, the bar's first note is a
/// tone, and both touched notes sit on the power-of-two duration
/// lattice. An illegal target bar is substituted with a random legal
/// one; when none exists the operator is a no-op.
fn syncopate(bars: &mut [Bar], bar_idx: usize, rng: &mut impl Rng) -> bool {
    let target = if syncopation_legal(bars, bar_idx) {
        bar_idx
    } else {
        let legal: Vec<usize> = (1..bars.len())
            .filter(|&i| syncopation_legal(bars, i))
            .collect();
        if legal.is_empty() {
            return false;
        }
        legal[rng.random_range(0..legal.len())]
    };

    let sync_pitch = bars[target].notes[0]
        .pitch
        .tone()
        .expect("legality check guarantees a tone");

    let prev_last_idx = bars[target - 1].notes.len() - 1;
    let prev_last = bars[target - 1].notes[prev_last_idx];
    match prev_last.duration.checked_sub(Duration::EIGHTH) {
        Some(kept) => {
            bars[target - 1].notes[prev_last_idx] = Note::new(prev_last.pitch, kept);
            bars[target - 1]
                .notes
                .push(Note::new(Pitch::Tone(sync_pitch), Duration::EIGHTH));
        }
        // An eighth or shorter: replace the note outright.
        None => {
            bars[target - 1].notes[prev_last_idx].pitch = Pitch::Tone(sync_pitch);
        }
    }
    bars[target].notes[0].pitch = Pitch::Hold;
    true
}

fn syncopation_legal(bars: &[Bar], bar_idx: usize) -> bool {
    if bar_idx == 0 || bar_idx >= bars.len() {
        return false;
    }
    let (Some(first), Some(prev_last)) = (bars[bar_idx].notes.first(), bars[bar_idx - 1].notes.last())
    else {
        return false;
    };
    first.pitch.is_tone()
        && first.duration.is_denominator_power_of_two()
        && prev_last.duration.is_denominator_power_of_two()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bar::TimeSignature;
    use crate::chord::{Chord, ChordType, NoteName};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn ctx() -> MutationContext {
        MutationContext {
            low: 48,
            high: 91,
            swap_radius: 7,
            shortest: Duration::THIRTY_SECOND,
        }
    }

    fn quarter_bar(tones: [u8; 4]) -> Bar {
        let ts = TimeSignature::new(4, 4);
        let mut bar = Bar::new(
            ts,
            vec![Chord::new(NoteName::C, ChordType::Major, Duration::WHOLE)],
        );
        bar.notes = tones
            .iter()
            .map(|&t| Note::new(Pitch::Tone(t), Duration::QUARTER))
            .collect();
        bar
    }

    #[test]
    fn test_every_operator_preserves_invariant() {
        let mut rng = StdRng::seed_from_u64(0xC0DA);
        for op in MutationOp::ALL {
            for trial in 0..50 {
                let mut bars = vec![
                    quarter_bar([60, 64, 67, 72]),
                    quarter_bar([64, 60, 72, 67]),
                    quarter_bar([67, 72, 60, 64]),
                ];
                apply_op(&mut bars, trial % 3, op, &ctx(), &mut rng);
                for (i, bar) in bars.iter().enumerate() {
                    assert!(
                        bar.is_note_durations_valid(),
                        "{op:?} broke bar {i} on trial {trial}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_chord_swap_stays_in_arpeggio() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..40 {
            let mut bars = vec![quarter_bar([60, 64, 67, 72])];
            if apply_op(&mut bars, 0, MutationOp::ChordPitchSwap, &ctx(), &mut rng) {
                let chord = bars[0].chords[0];
                for note in &bars[0].notes {
                    let p = note.pitch.tone().unwrap();
                    assert!(chord.contains_chord_tone(p), "pitch {p} not a chord tone");
                }
            }
        }
    }

    #[test]
    fn test_duration_split_sums_to_original() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut bars = vec![quarter_bar([60, 64, 67, 72])];
        assert!(apply_op(&mut bars, 0, MutationOp::DurationSplit, &ctx(), &mut rng));
        assert_eq!(bars[0].notes.len(), 5);
        assert!(bars[0].is_note_durations_valid());
    }

    #[test]
    fn test_split_respects_floor() {
        let mut rng = StdRng::seed_from_u64(3);
        let ts = TimeSignature::new(4, 4);
        let mut bar = Bar::new(
            ts,
            vec![Chord::new(NoteName::C, ChordType::Major, Duration::WHOLE)],
        );
        // All notes already at the floor: nothing is splittable.
        bar.notes = (0..32)
            .map(|_| Note::new(Pitch::Tone(60), Duration::THIRTY_SECOND))
            .collect();
        let mut bars = vec![bar];
        for _ in 0..20 {
            assert!(!apply_op(&mut bars, 0, MutationOp::DurationSplit, &ctx(), &mut rng));
        }
        assert_eq!(bars[0].notes.len(), 32);
    }

    #[test]
    fn test_hold_off_restores_neighbor_pitch() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut bars = vec![quarter_bar([60, 64, 67, 72]), quarter_bar([62, 65, 69, 74])];
        bars[1].notes[0].pitch = Pitch::Hold;
        assert!(apply_op(&mut bars, 1, MutationOp::HoldOff, &ctx(), &mut rng));
        assert_eq!(bars[1].notes[0].pitch, Pitch::Tone(72));
    }

    #[test]
    fn test_hold_on_never_targets_first_sounding_event() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..60 {
            let mut bars = vec![quarter_bar([60, 64, 67, 72])];
            apply_op(&mut bars, 0, MutationOp::HoldOn, &ctx(), &mut rng);
            assert_eq!(
                bars[0].notes[0].pitch,
                Pitch::Tone(60),
                "first sounding event must stay a tone"
            );
        }
    }

    #[test]
    fn test_hold_operators_noop_without_targets() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut bars = vec![quarter_bar([60, 64, 67, 72])];
        assert!(!apply_op(&mut bars, 0, MutationOp::HoldOff, &ctx(), &mut rng));

        let ts = TimeSignature::new(4, 4);
        let mut rest_bar = Bar::new(
            ts,
            vec![Chord::new(NoteName::C, ChordType::Major, Duration::WHOLE)],
        );
        rest_bar.notes = vec![Note::new(Pitch::Rest, Duration::WHOLE)];
        let mut bars = vec![rest_bar];
        assert!(!apply_op(&mut bars, 0, MutationOp::HoldOn, &ctx(), &mut rng));
    }

    #[test]
    fn test_syncopation_borrows_an_eighth() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut bars = vec![quarter_bar([60, 64, 67, 72]), quarter_bar([76, 74, 72, 69])];
        assert!(apply_op(&mut bars, 1, MutationOp::Syncopation, &ctx(), &mut rng));

        // Preceding bar: last quarter became eighth + eighth carrying the
        // syncopated pitch.
        assert_eq!(bars[0].notes.len(), 5);
        assert_eq!(bars[0].notes[3], Note::new(Pitch::Tone(72), Duration::EIGHTH));
        assert_eq!(bars[0].notes[4], Note::new(Pitch::Tone(76), Duration::EIGHTH));
        // Target bar: first note holds across the bar line.
        assert_eq!(bars[1].notes[0].pitch, Pitch::Hold);
        assert!(bars[0].is_note_durations_valid());
        assert!(bars[1].is_note_durations_valid());
    }

    #[test]
    fn test_syncopation_replaces_short_notes_outright() {
        let mut rng = StdRng::seed_from_u64(8);
        let ts = TimeSignature::new(4, 4);
        let mut first = Bar::new(
            ts,
            vec![Chord::new(NoteName::C, ChordType::Major, Duration::WHOLE)],
        );
        first.notes = vec![
            Note::new(Pitch::Tone(60), Duration::HALF),
            Note::new(Pitch::Tone(64), Duration::QUARTER),
            Note::new(Pitch::Tone(67), Duration::EIGHTH),
            Note::new(Pitch::Tone(69), Duration::EIGHTH),
        ];
        let mut bars = vec![first, quarter_bar([76, 74, 72, 69])];
        assert!(apply_op(&mut bars, 1, MutationOp::Syncopation, &ctx(), &mut rng));
        // The eighth was too short to split: replaced outright.
        assert_eq!(bars[0].notes.len(), 4);
        assert_eq!(bars[0].notes[3], Note::new(Pitch::Tone(76), Duration::EIGHTH));
        assert!(bars[0].is_note_durations_valid());
    }

    #[test]
    fn test_syncopation_substitutes_a_legal_bar() {
        let mut rng = StdRng::seed_from_u64(9);
        // Bar 0 can never syncopate (no preceding bar) but bar 1 can, so
        // targeting bar 0 must fall through to bar 1.
        let mut bars = vec![quarter_bar([60, 64, 67, 72]), quarter_bar([76, 74, 72, 69])];
        assert!(apply_op(&mut bars, 0, MutationOp::Syncopation, &ctx(), &mut rng));
        assert_eq!(bars[1].notes[0].pitch, Pitch::Hold);
    }

    #[test]
    fn test_mutate_candidate_keeps_melody_well_formed() {
        let mut rng = StdRng::seed_from_u64(0xBEEF);
        let mut candidate = MelodyCandidate::new(
            vec![
                quarter_bar([60, 64, 67, 72]),
                quarter_bar([64, 60, 72, 67]),
                quarter_bar([67, 72, 60, 64]),
                quarter_bar([72, 67, 64, 60]),
            ],
            0,
        );
        for _ in 0..200 {
            mutate_candidate(&mut candidate, &ctx(), &mut rng);
            for bar in &candidate.bars {
                assert!(bar.is_note_durations_valid());
            }
            if let Some(first) = candidate.first_sounding_pitch() {
                assert!(!first.is_hold(), "melody may never start on Hold");
            }
        }
        assert!(candidate.dirty);
    }
}
