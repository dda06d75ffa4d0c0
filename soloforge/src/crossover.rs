// N-point crossover over bar sequences.
//
// A crossover point is a bar index at which the two parents' bar
// sequences are spliced; alternating which parent supplies bars between
// consecutive points yields two structurally complementary offspring
// with the parents' bar count. Bars are deep-copied, never shared.
//
// Point selection has two modes, chosen per pair: with probability
// `optimized_probability` (default 0.8) points are picked to minimize
// the combined melodic-interval jump across the splice — for each
// candidate boundary the jump of BOTH splice orientations is summed
// (last tone of the preceding bar against the first tone of the
// following bar, a→b and b→a), and the n smallest boundaries win.
// Otherwise n points are drawn uniformly without replacement.

use crate::bar::Bar;
use crate::candidate::MelodyCandidate;
use crate::pitch::interval;
use rand::Rng;
use rand::seq::SliceRandom;

/// Jump charged for a boundary where one side has no sounding tone.
const NEUTRAL_JUMP: u32 = 6;

/// Combined splice jump at `point` for both offspring orientations.
fn boundary_jump(a: &[Bar], b: &[Bar], point: usize) -> u32 {
    let ab = splice_jump(&a[point - 1], &b[point]);
    let ba = splice_jump(&b[point - 1], &a[point]);
    ab + ba
}

fn splice_jump(before: &Bar, after: &Bar) -> u32 {
    match (before.last_tone(), after.first_tone()) {
        (Some(l), Some(f)) => interval::distance(l, f) as u32,
        _ => NEUTRAL_JUMP,
    }
}

/// Pick `n` crossover points over parents with `bar_count` bars.
///
/// Returned points are strictly ascending bar indices in `1..bar_count`.
pub fn select_points(
    a: &[Bar],
    b: &[Bar],
    n: usize,
    optimized: bool,
    rng: &mut impl Rng,
) -> Vec<usize> {
    let bar_count = a.len();
    debug_assert_eq!(bar_count, b.len());
    let n = n.min(bar_count.saturating_sub(1)).max(1);

    let mut points: Vec<usize> = if optimized {
        let mut scored: Vec<(u32, usize)> = (1..bar_count)
            .map(|p| (boundary_jump(a, b, p), p))
            .collect();
        scored.sort();
        scored.into_iter().take(n).map(|(_, p)| p).collect()
    } else {
        let mut all: Vec<usize> = (1..bar_count).collect();
        let (chosen, _) = all.partial_shuffle(rng, n);
        chosen.to_vec()
    };
    points.sort_unstable();
    points
}

/// Classic alternating N-point crossover. Both offspring carry the
/// parents' bar count and the given generation tag.
pub fn n_point_crossover(
    a: &MelodyCandidate,
    b: &MelodyCandidate,
    points: &[usize],
    generation: u32,
) -> (MelodyCandidate, MelodyCandidate) {
    debug_assert_eq!(a.bars.len(), b.bars.len());
    let mut first = Vec::with_capacity(a.bars.len());
    let mut second = Vec::with_capacity(a.bars.len());

    let mut next_point = 0usize;
    let mut from_a = true;
    for i in 0..a.bars.len() {
        if next_point < points.len() && points[next_point] == i {
            from_a = !from_a;
            next_point += 1;
        }
        if from_a {
            first.push(a.bars[i].clone());
            second.push(b.bars[i].clone());
        } else {
            first.push(b.bars[i].clone());
            second.push(a.bars[i].clone());
        }
    }

    let mut c1 = MelodyCandidate::new(first, generation);
    let mut c2 = MelodyCandidate::new(second, generation);
    c1.fix_leading_hold();
    c2.fix_leading_hold();
    (c1, c2)
}

/// One full pair crossover: pick n ∈ [1,3] (capped at bar_count - 1),
/// choose the point-selection mode, splice.
pub fn crossover_pair(
    a: &MelodyCandidate,
    b: &MelodyCandidate,
    generation: u32,
    optimized_probability: f64,
    rng: &mut impl Rng,
) -> (MelodyCandidate, MelodyCandidate) {
    let n = rng.random_range(1..=3usize);
    let optimized = rng.random_bool(optimized_probability);
    let points = select_points(&a.bars, &b.bars, n, optimized, rng);
    n_point_crossover(a, b, &points, generation)
}
