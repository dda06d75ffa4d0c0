// MIDI output for generated melodies.
//
// Converts a bar sequence into a Standard MIDI File: a tempo track plus
// one melody track. Rests become gaps, holds prolong the preceding
// NoteOff, and durations map to ticks at 480 per quarter note.
//
// Uses the `midly` crate for MIDI writing. Output is SMF Format 1.

use crate::bar::Bar;
use crate::pitch::Pitch;
use midly::{
    Format, Header, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::path::Path;

/// Ticks per quarter note in MIDI output.
const TICKS_PER_QUARTER: u32 = 480;

/// Ticks per whole note; durations are fractions of a whole note.
const TICKS_PER_WHOLE: u32 = TICKS_PER_QUARTER * 4;

/// Convert a melody to MIDI and write to a file.
pub fn write_midi(
    bars: &[Bar],
    tempo_bpm: u16,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let smf = melody_to_smf(bars, tempo_bpm);
    let mut buf = Vec::new();
    smf.write(&mut buf)?;
    std::fs::write(path, &buf)?;
    Ok(())
}

/// Convert a melody to an in-memory SMF.
fn melody_to_smf(bars: &[Bar], tempo_bpm: u16) -> Smf<'static> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER as u16)),
    ));

    // Track 0: tempo track
    let mut tempo_track: Track<'static> = Vec::new();
    // Tempo meta values are 24-bit microseconds per quarter, so the
    // slowest representable tempo is 4 BPM. Zero would divide by zero.
    let tempo_microseconds = 60_000_000 / tempo_bpm.max(4) as u32;
    tempo_track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(midly::MetaMessage::Tempo(u24::new(tempo_microseconds))),
    });
    tempo_track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(midly::MetaMessage::EndOfTrack),
    });
    smf.tracks.push(tempo_track);

    let mut track: Track<'static> = Vec::new();
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(midly::MetaMessage::TrackName(b"Solo")),
    });
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Midi {
            channel: u4::new(0),
            message: MidiMessage::ProgramChange {
                // Tenor sax.
                program: u7::new(66),
            },
        },
    });

    let mut current_tick: u32 = 0;
    let mut last_event_tick: u32 = 0;
    let mut note_on: Option<u8> = None;

    for bar in bars {
        for note in &bar.notes {
            let ticks =
                TICKS_PER_WHOLE * note.duration.numerator() as u32 / note.duration.denominator() as u32;
            match note.pitch {
                Pitch::Hold => {
                    // Sounding note (or silence) carries on.
                }
                Pitch::Rest => {
                    if let Some(pitch) = note_on.take() {
                        track.push(note_off(pitch, current_tick - last_event_tick));
                        last_event_tick = current_tick;
                    }
                }
                Pitch::Tone(pitch) => {
                    if let Some(sounding) = note_on.take() {
                        track.push(note_off(sounding, current_tick - last_event_tick));
                        last_event_tick = current_tick;
                    }
                    track.push(TrackEvent {
                        delta: u28::new(current_tick - last_event_tick),
                        kind: TrackEventKind::Midi {
                            channel: u4::new(0),
                            message: MidiMessage::NoteOn {
                                key: u7::new(pitch),
                                vel: u7::new(80),
                            },
                        },
                    });
                    last_event_tick = current_tick;
                    note_on = Some(pitch);
                }
            }
            current_tick += ticks;
        }
    }

    // End final note
    if let Some(pitch) = note_on.take() {
        track.push(note_off(pitch, current_tick - last_event_tick));
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(midly::MetaMessage::EndOfTrack),
    });
    smf.tracks.push(track);

    smf
}

fn note_off(pitch: u8, delta: u32) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Midi {
            channel: u4::new(0),
            message: MidiMessage::NoteOff {
                key: u7::new(pitch),
                vel: u7::new(0),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bar::TimeSignature;
    use crate::chord::{Chord, ChordType, NoteName};
    use crate::duration::Duration;
    use crate::pitch::Note;

    fn bar(notes: Vec<Note>) -> Bar {
        let mut bar = Bar::new(
            TimeSignature::new(4, 4),
            vec![Chord::new(NoteName::C, ChordType::Major, Duration::WHOLE)],
        );
        bar.notes = notes;
        bar
    }

    fn note_events(smf: &Smf<'_>) -> Vec<(u32, bool, u8)> {
        smf.tracks[1]
            .iter()
            .filter_map(|e| match e.kind {
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOn { key, .. },
                    ..
                } => Some((e.delta.as_int(), true, key.as_int())),
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOff { key, .. },
                    ..
                } => Some((e.delta.as_int(), false, key.as_int())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_two_tracks_and_tempo() {
        let bars = vec![bar(vec![Note::new(Pitch::Tone(60), Duration::WHOLE)])];
        let smf = melody_to_smf(&bars, 120);
        assert_eq!(smf.tracks.len(), 2);
        assert!(matches!(
            smf.tracks[0][0].kind,
            TrackEventKind::Meta(midly::MetaMessage::Tempo(t)) if t.as_int() == 500_000
        ));
    }

    #[test]
    fn test_zero_tempo_is_clamped() {
        let bars = vec![bar(vec![Note::new(Pitch::Tone(60), Duration::WHOLE)])];
        let smf = melody_to_smf(&bars, 0);
        assert!(matches!(
            smf.tracks[0][0].kind,
            TrackEventKind::Meta(midly::MetaMessage::Tempo(t)) if t.as_int() == 15_000_000
        ));
    }

    #[test]
    fn test_hold_prolongs_and_rest_gaps() {
        // C quarter, hold quarter, rest quarter, E quarter.
        let bars = vec![bar(vec![
            Note::new(Pitch::Tone(60), Duration::QUARTER),
            Note::new(Pitch::Hold, Duration::QUARTER),
            Note::new(Pitch::Rest, Duration::QUARTER),
            Note::new(Pitch::Tone(64), Duration::QUARTER),
        ])];
        let events = note_events(&melody_to_smf(&bars, 120));
        assert_eq!(
            events,
            vec![
                (0, true, 60),
                // Off after two quarters (the hold).
                (960, false, 60),
                // On after the rest gap.
                (480, true, 64),
                (480, false, 64),
            ]
        );
    }

    #[test]
    fn test_adjacent_tones_abut_without_overlap() {
        let bars = vec![bar(vec![
            Note::new(Pitch::Tone(60), Duration::HALF),
            Note::new(Pitch::Tone(62), Duration::HALF),
        ])];
        let events = note_events(&melody_to_smf(&bars, 120));
        assert_eq!(
            events,
            vec![(0, true, 60), (960, false, 60), (0, true, 62), (960, false, 62)]
        );
    }
}
