// Fitness evaluation: multi-criteria scoring of candidate melodies.
//
// Each criterion is an independent pure function of one candidate's bars,
// normalized to [0, 1]; the candidate's scalar fitness is the weighted
// sum. All candidates in a generation are scored identically and
// independently — no evaluator compares candidates against each other —
// which makes the per-generation sweep embarrassingly parallel (rayon
// fan-out, with selection as the barrier between generations).
//
// Criteria:
// - smoothness:        fraction of adjacent tone intervals within a cap
// - variety:           distinct tones over total tones
// - range usage:       melodic span over the allowed window span
// - contour:           direction-change rate near a stylistic target
// - density balance:   evenness of note counts across bars
// - syncopation:       bars whose first onset holds across the bar line
// - accent alignment:  chord tones on integral beats

use crate::bar::Bar;
use crate::candidate::MelodyCandidate;
use crate::compositor::CompositionParams;
use crate::duration::Offset;
use crate::pitch::interval;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Weights for the fitness criteria. Tunable parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitnessWeights {
    pub smoothness: f64,
    pub variety: f64,
    pub range_usage: f64,
    pub contour: f64,
    pub density_balance: f64,
    pub syncopation: f64,
    pub accent_alignment: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        FitnessWeights {
            smoothness: 0.25,
            variety: 0.15,
            range_usage: 0.10,
            contour: 0.15,
            density_balance: 0.10,
            syncopation: 0.10,
            accent_alignment: 0.15,
        }
    }
}

impl FitnessWeights {
    /// Load a weight vector from a JSON file.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let data = std::fs::read_to_string(path)?;
        let weights: FitnessWeights = serde_json::from_str(&data)?;
        Ok(weights)
    }
}

/// Direction-change rate that scores a perfect contour mark.
const CONTOUR_TARGET: f64 = 0.4;

/// Score one melody. Returns a finite value; degenerate melodies (no
/// tones at all) score 0.
pub fn evaluate(bars: &[Bar], params: &CompositionParams, weights: &FitnessWeights) -> f64 {
    let score = weights.smoothness * score_smoothness(bars, params.max_smooth_interval)
        + weights.variety * score_variety(bars)
        + weights.range_usage * score_range_usage(bars, params.low, params.high)
        + weights.contour * score_contour(bars)
        + weights.density_balance * score_density_balance(bars)
        + weights.syncopation * score_syncopation(bars)
        + weights.accent_alignment * score_accent_alignment(bars);
    if score.is_finite() { score } else { 0.0 }
}

/// Score every dirty candidate in the population, in parallel.
pub fn evaluate_population(
    population: &mut [MelodyCandidate],
    params: &CompositionParams,
    weights: &FitnessWeights,
) {
    population
        .par_iter_mut()
        .filter(|c| c.dirty)
        .for_each(|c| {
            c.fitness = evaluate(&c.bars, params, weights);
            c.dirty = false;
        });
}

fn sounding_tones(bars: &[Bar]) -> Vec<u8> {
    bars.iter()
        .flat_map(|b| b.notes.iter())
        .filter_map(|n| n.pitch.tone())
        .collect()
}

/// Fraction of adjacent sounding-note intervals at or under the cap.
fn score_smoothness(bars: &[Bar], max_interval: u8) -> f64 {
    let tones = sounding_tones(bars);
    if tones.len() < 2 {
        return 0.0;
    }
    let smooth = tones
        .windows(2)
        .filter(|w| interval::distance(w[0], w[1]) <= max_interval as u16)
        .count();
    smooth as f64 / (tones.len() - 1) as f64
}

/// Distinct pitches over total sounding notes.
fn score_variety(bars: &[Bar]) -> f64 {
    let tones = sounding_tones(bars);
    if tones.is_empty() {
        return 0.0;
    }
    let mut seen = [false; 128];
    let mut distinct = 0usize;
    for &t in &tones {
        if !seen[t as usize] {
            seen[t as usize] = true;
            distinct += 1;
        }
    }
    distinct as f64 / tones.len() as f64
}

/// How much of the allowed pitch window the melody actually spans.
fn score_range_usage(bars: &[Bar], low: u8, high: u8) -> f64 {
    let tones = sounding_tones(bars);
    let (Some(&min), Some(&max)) = (tones.iter().min(), tones.iter().max()) else {
        return 0.0;
    };
    let window = (high - low).max(1) as f64;
    (((max - min) as f64) / window).clamp(0.0, 1.0)
}

/// Direction stability: how close the direction-change rate sits to the
/// stylistic target. A melody that changes direction on every interval
/// (sawtooth) or never (one long run) scores low.
fn score_contour(bars: &[Bar]) -> f64 {
    let tones = sounding_tones(bars);
    if tones.len() < 3 {
        return 0.0;
    }
    let directions: Vec<i8> = tones
        .windows(2)
        .map(|w| match w[1].cmp(&w[0]) {
            std::cmp::Ordering::Greater => 1i8,
            std::cmp::Ordering::Less => -1,
            std::cmp::Ordering::Equal => 0,
        })
        .collect();
    let changes = directions
        .windows(2)
        .filter(|w| w[0] != w[1])
        .count();
    let rate = changes as f64 / (directions.len() - 1) as f64;
    (1.0 - (rate - CONTOUR_TARGET).abs() / (1.0 - CONTOUR_TARGET)).clamp(0.0, 1.0)
}

/// Evenness of note counts across bars (1 - coefficient of variation).
fn score_density_balance(bars: &[Bar]) -> f64 {
    if bars.is_empty() {
        return 0.0;
    }
    let counts: Vec<f64> = bars.iter().map(|b| b.notes.len() as f64).collect();
    let mean = counts.iter().sum::<f64>() / counts.len() as f64;
    if mean == 0.0 {
        return 0.0;
    }
    let variance = counts.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / counts.len() as f64;
    (1.0 - variance.sqrt() / mean).clamp(0.0, 1.0)
}

/// Syncopation usage: fraction of bars (past the first) whose first note
/// holds across the preceding bar line, scaled so that moderate usage
/// already scores full marks.
fn score_syncopation(bars: &[Bar]) -> f64 {
    if bars.len() < 2 {
        return 0.0;
    }
    let syncopated = bars
        .iter()
        .skip(1)
        .filter(|b| b.notes.first().is_some_and(|n| n.pitch.is_hold()))
        .count();
    (syncopated as f64 / (bars.len() - 1) as f64 * 4.0).clamp(0.0, 1.0)
}

/// Fraction of metrically accented onsets (integral beats) that land on
/// a tone of the chord sounding there.
fn score_accent_alignment(bars: &[Bar]) -> f64 {
    let mut accented = 0usize;
    let mut aligned = 0usize;
    for bar in bars {
        let mut onset = Offset::zero();
        for note in &bar.notes {
            if onset.is_on_beat(bar.time_signature.denominator) {
                if let Some(p) = note.pitch.tone() {
                    accented += 1;
                    if bar.chord_at(onset).contains_chord_tone(p) {
                        aligned += 1;
                    }
                }
            }
            onset.push(note.duration);
        }
    }
    if accented == 0 {
        return 0.0;
    }
    aligned as f64 / accented as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bar::TimeSignature;
    use crate::chord::{Chord, ChordType, NoteName};
    use crate::compositor::Density;
    use crate::duration::Duration;
    use crate::pitch::{Note, Pitch};

    fn params() -> CompositionParams {
        CompositionParams {
            low: 48,
            high: 91,
            density: Density::Eighth,
            max_smooth_interval: 7,
        }
    }

    fn bar_with_tones(tones: &[u8]) -> Bar {
        let ts = TimeSignature::new(4, 4);
        let mut bar = Bar::new(
            ts,
            vec![Chord::new(NoteName::C, ChordType::Major, Duration::WHOLE)],
        );
        let dur = Duration::new(1, tones.len() as u8);
        bar.notes = tones.iter().map(|&t| Note::new(Pitch::Tone(t), dur)).collect();
        bar
    }

    #[test]
    fn test_smoothness_counts_small_intervals() {
        let bars = vec![bar_with_tones(&[60, 62, 64, 65])];
        assert_eq!(score_smoothness(&bars, 7), 1.0);
        let bars = vec![bar_with_tones(&[60, 72, 60, 72])];
        assert_eq!(score_smoothness(&bars, 7), 0.0);
    }

    #[test]
    fn test_variety_distinct_over_total() {
        let bars = vec![bar_with_tones(&[60, 60, 60, 60])];
        assert!((score_variety(&bars) - 0.25).abs() < 1e-9);
        let bars = vec![bar_with_tones(&[60, 62, 64, 65])];
        assert_eq!(score_variety(&bars), 1.0);
    }

    #[test]
    fn test_accent_alignment_prefers_chord_tones_on_beats() {
        // All quarter notes in 4/4: every onset is accented.
        let aligned = vec![bar_with_tones(&[60, 64, 67, 72])];
        assert_eq!(score_accent_alignment(&aligned), 1.0);
        let misaligned = vec![bar_with_tones(&[61, 62, 66, 70])];
        assert_eq!(score_accent_alignment(&misaligned), 0.0);
    }

    #[test]
    fn test_syncopation_score_sees_leading_holds() {
        let mut bars = vec![
            bar_with_tones(&[60, 64, 67, 72]),
            bar_with_tones(&[64, 67, 72, 76]),
        ];
        assert_eq!(score_syncopation(&bars), 0.0);
        bars[1].notes[0].pitch = Pitch::Hold;
        assert_eq!(score_syncopation(&bars), 1.0);
    }

    #[test]
    fn test_weighted_sum_stays_in_unit_range() {
        let bars = vec![
            bar_with_tones(&[60, 62, 64, 65]),
            bar_with_tones(&[67, 65, 64, 62]),
        ];
        let score = evaluate(&bars, &params(), &FitnessWeights::default());
        assert!(score > 0.0 && score <= 1.0, "score was {score}");
    }

    #[test]
    fn test_population_sweep_clears_dirty_flags() {
        let mut population = vec![
            MelodyCandidate::new(vec![bar_with_tones(&[60, 62, 64, 65])], 0),
            MelodyCandidate::new(vec![bar_with_tones(&[72, 60, 72, 60])], 0),
        ];
        evaluate_population(&mut population, &params(), &FitnessWeights::default());
        for c in &population {
            assert!(!c.dirty);
            assert!(c.fitness.is_finite());
        }
        // The smooth stepwise melody beats the octave sawtooth.
        assert!(population[0].fitness > population[1].fitness);
    }
}
