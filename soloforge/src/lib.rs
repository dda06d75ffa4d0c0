// Soloforge
//
// A solo-melody generator that improvises single-voice lines over a
// fixed chord progression. A genetic algorithm breeds melodies from
// deterministic arpeggio/scale walks: N-point crossover splices parents
// at the bar boundaries that minimize melodic jumps, nine per-bar
// mutation operators reshape pitches and rhythms, and a weighted
// multi-criteria fitness function drives elitist plus selection.
//
// Architecture:
// - duration.rs: Rational note durations and cumulative bar offsets
// - pitch.rs: Pitches (tone / rest / hold), notes, interval helpers
// - chord.rs: Chord roots, qualities, arpeggio and scale pitch sets
// - bar.rs: Time signatures and bars (fixed chords, mutable notes)
// - progression.rs: Text chord-progression parser
// - initializer.rs: Deterministic walker patterns seeding the search
// - candidate.rs: Population members and the leading-hold repair
// - crossover.rs: N-point crossover with jump-minimizing point choice
// - mutation.rs: The per-bar mutation operators
// - fitness.rs: Weighted multi-criteria melody scoring (rayon fan-out)
// - selection.rs: Elitist plus selection
// - genetic.rs: The generational loop tying the pieces together
// - compositor.rs: Strategy trait + deterministic fallback strategies
// - midi.rs: MIDI file output for finished melodies
//
// The generator is deterministic given a seed, supporting reproducible
// output.

pub mod bar;
pub mod candidate;
pub mod chord;
pub mod compositor;
pub mod crossover;
pub mod duration;
pub mod fitness;
pub mod genetic;
pub mod initializer;
pub mod midi;
pub mod mutation;
pub mod pitch;
pub mod progression;
pub mod selection;
