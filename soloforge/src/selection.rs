// Elitist plus selection: survivors are drawn from parents and
// offspring together, so the best fitness seen never regresses between
// generations.

use crate::candidate::MelodyCandidate;

/// Reduce the population to at most `max_population` candidates.
///
/// Candidates born in `current_generation` and elders compete for half
/// the capacity each; whatever capacity one side leaves unused is filled
/// with the other side's next-best leftovers. The result is sorted
/// non-increasing by fitness. Candidates must already be evaluated.
pub fn plus_selection(
    population: Vec<MelodyCandidate>,
    current_generation: u32,
    max_population: usize,
) -> Vec<MelodyCandidate> {
    let (mut current, mut elder): (Vec<_>, Vec<_>) = population
        .into_iter()
        .partition(|c| c.generation == current_generation);
    sort_by_fitness(&mut current);
    sort_by_fitness(&mut elder);

    let half = max_population / 2;
    let take_current = current.len().min(half);
    let take_elder = elder.len().min(half);

    let mut survivors: Vec<MelodyCandidate> = current.drain(..take_current).collect();
    survivors.extend(elder.drain(..take_elder));

    // Fill leftover capacity from the merged remainder, best first.
    let mut remainder: Vec<MelodyCandidate> = current.into_iter().chain(elder).collect();
    sort_by_fitness(&mut remainder);
    let free = max_population.saturating_sub(survivors.len());
    survivors.extend(remainder.into_iter().take(free));

    sort_by_fitness(&mut survivors);
    survivors
}

fn sort_by_fitness(candidates: &mut [MelodyCandidate]) {
    candidates.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
}
