// Genetic search over melodies: seed a small population of
// deterministic walks, then loop crossover, mutation, evaluation and
// elitist selection until the fitness threshold or the generation cap
// is reached.

use crate::bar::Bar;
use crate::candidate::MelodyCandidate;
use crate::compositor::{CompositionParams, Compositor};
use crate::crossover::{crossover_pair, n_point_crossover, select_points};
use crate::fitness::{FitnessWeights, evaluate_population};
use crate::initializer::{InitPattern, PitchSource, fill_bars};
use crate::mutation::{MutationContext, mutate_candidate};
use crate::selection::plus_selection;
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Semitone radius within which pitch-swap mutations pick replacements.
const SWAP_RADIUS: u8 = 12;

/// Tunable knobs of the genetic search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaConfig {
    /// Hard cap on generations; the search never runs past it.
    pub max_generations: u32,
    /// Generations to run even after the threshold is met.
    pub min_generations: u32,
    /// Fitness at which the search may stop early.
    pub fitness_threshold: f64,
    pub max_population: usize,
    /// Pairs crossed per generation = population length / this divisor.
    pub crossover_divisor: usize,
    /// Probability a crossover uses interval-minimizing point selection
    /// rather than uniform random points.
    pub optimized_point_probability: f64,
    /// Fraction of the surviving elders re-mutated each generation.
    pub elder_mutation_fraction: f64,
}

impl Default for GaConfig {
    fn default() -> Self {
        GaConfig {
            max_generations: 200,
            min_generations: 10,
            fitness_threshold: 0.8,
            max_population: 32,
            crossover_divisor: 4,
            optimized_point_probability: 0.8,
            elder_mutation_fraction: 0.5,
        }
    }
}

impl GaConfig {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let data = std::fs::read_to_string(path)?;
        let config: GaConfig = serde_json::from_str(&data)?;
        Ok(config)
    }
}

/// Outcome of one search run.
#[derive(Debug)]
pub struct GaResult {
    /// Surviving melodies, best first.
    pub ranked: Vec<Vec<Bar>>,
    pub generations: u32,
    pub evaluations: u64,
    pub best_fitness: f64,
}

/// Build the initial population: every walker pattern over both pitch
/// sources, each with its reversed twin. An optional seed melody joins
/// with its twin plus the single-point offspring of every walker
/// candidate against both.
pub fn seed_population(
    skeleton: &[Bar],
    seed: Option<&[Bar]>,
    params: &CompositionParams,
    rng: &mut impl Rng,
) -> Vec<MelodyCandidate> {
    let duration = params.density.default_duration();
    let mut population = Vec::new();
    for pattern in InitPattern::ALL {
        for source in PitchSource::ALL {
            let mut bars = skeleton.to_vec();
            fill_bars(&mut bars, pattern, source, params.low, params.high, duration);
            let base = MelodyCandidate::new(bars, 0);
            let twin = base.reversed_twin(0);
            population.push(base);
            population.push(twin);
        }
    }
    if let Some(seed_bars) = seed {
        let mut seeded = MelodyCandidate::new(seed_bars.to_vec(), 0);
        seeded.fix_leading_hold();
        let seeded_twin = seeded.reversed_twin(0);
        let mut offspring = Vec::new();
        for parent in &[&seeded, &seeded_twin] {
            for candidate in &population {
                let points = select_points(&candidate.bars, &parent.bars, 1, true, rng);
                let (a, b) = n_point_crossover(candidate, parent, &points, 0);
                offspring.push(a);
                offspring.push(b);
            }
        }
        population.push(seeded);
        population.push(seeded_twin);
        population.extend(offspring);
    }
    population
}

/// Run the search to completion (or cancellation). The cancel flag is
/// polled once per generation; a cancelled run still returns whatever
/// the population holds, ranked.
pub fn run(
    skeleton: &[Bar],
    seed: Option<&[Bar]>,
    params: &CompositionParams,
    weights: &FitnessWeights,
    config: &GaConfig,
    cancel: &AtomicBool,
    rng: &mut StdRng,
) -> GaResult {
    let ctx = MutationContext {
        low: params.low,
        high: params.high,
        swap_radius: SWAP_RADIUS,
        shortest: params.density.shortest_duration(),
    };

    let mut population = seed_population(skeleton, seed, params, rng);
    let mut evaluations = count_dirty(&population);
    evaluate_population(&mut population, params, weights);
    population = plus_selection(population, 0, config.max_population);

    let mut generation = 0u32;
    loop {
        let best = population.first().map_or(0.0, |c| c.fitness);
        if generation >= config.max_generations
            || (best >= config.fitness_threshold && generation >= config.min_generations)
            || cancel.load(Ordering::Relaxed)
        {
            break;
        }
        generation += 1;

        // Crossover: random distinct parent pairs from the survivors.
        let pairs = (population.len() / config.crossover_divisor.max(1)).max(1);
        let mut offspring = Vec::with_capacity(pairs * 2);
        for _ in 0..pairs {
            let i = rng.random_range(0..population.len());
            let mut j = rng.random_range(0..population.len());
            while j == i && population.len() > 1 {
                j = rng.random_range(0..population.len());
            }
            let (a, b) = crossover_pair(
                &population[i],
                &population[j],
                generation,
                config.optimized_point_probability,
                rng,
            );
            offspring.push(a);
            offspring.push(b);
        }
        for child in &mut offspring {
            mutate_candidate(child, &ctx, rng);
        }

        // A random slice of the surviving elders is mutated in place.
        let elder_count =
            (population.len() as f64 * config.elder_mutation_fraction) as usize;
        let mut indices: Vec<usize> = (0..population.len()).collect();
        let (chosen, _) = indices.partial_shuffle(rng, elder_count);
        for &i in chosen.iter() {
            mutate_candidate(&mut population[i], &ctx, rng);
        }

        population.extend(offspring);
        evaluations += count_dirty(&population);
        evaluate_population(&mut population, params, weights);
        population = plus_selection(population, generation, config.max_population);
    }

    let best_fitness = population.first().map_or(0.0, |c| c.fitness);
    GaResult {
        ranked: population.into_iter().map(|c| c.bars).collect(),
        generations: generation,
        evaluations,
        best_fitness,
    }
}

fn count_dirty(population: &[MelodyCandidate]) -> u64 {
    population.iter().filter(|c| c.dirty).count() as u64
}

/// The genetic strategy behind the [`Compositor`] trait.
pub struct GeneticCompositor {
    pub config: GaConfig,
    pub weights: FitnessWeights,
    pub cancel: Arc<AtomicBool>,
}

impl Default for GeneticCompositor {
    fn default() -> Self {
        GeneticCompositor {
            config: GaConfig::default(),
            weights: FitnessWeights::default(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Compositor for GeneticCompositor {
    fn compose(
        &self,
        skeleton: &[Bar],
        seed: Option<&[Bar]>,
        params: &CompositionParams,
        rng: &mut StdRng,
    ) -> Result<Vec<Vec<Bar>>, Box<dyn std::error::Error>> {
        params.validate()?;
        let result = run(
            skeleton,
            seed,
            params,
            &self.weights,
            &self.config,
            self.cancel.as_ref(),
            rng,
        );
        Ok(result.ranked)
    }
}
