// Soloforge — CLI entry point.
//
// Generates a solo melody over a chord progression and writes it to MIDI.
// The pipeline: progression parsing → compositor run → ranking → MIDI output.
//
// Usage:
//   cargo run -p soloforge -- [output.mid] [--progression FILE] [--seed N]
//     [--strategy NAME] [--density NAME] [--generations N] [--weights FILE]
//     [--config FILE] [--tempo BPM]
//
// Strategies: genetic, arpeggio, scale, mix
// Densities: quarter, eighth, sixteenth, thirtysecond

use rand::SeedableRng;
use rand::rngs::StdRng;
use soloforge::compositor::{
    CompositionParams, Compositor, CompositorKind, Density, create_compositor,
};
use soloforge::fitness::{FitnessWeights, evaluate};
use soloforge::genetic::{GaConfig, GeneticCompositor};
use soloforge::midi::write_midi;
use soloforge::pitch::pitch_name;
use soloforge::progression::{load_progression, parse_progression};
use std::path::Path;

// ii-V-I-vi in C, used when no progression file is given.
const DEMO_PROGRESSION: &str = "\
4/4 D-minor7-4
4/4 G-dominant7-4
4/4 C-major7-4
4/4 A-minor7-4
4/4 D-minor7-2 G-dominant7-2
4/4 C-major7-4
4/4 F-major7-4
4/4 G-dominant7-4
";

fn main() {
    let args: Vec<String> = std::env::args().collect();

    // Parse arguments
    let output_path = args.get(1)
        .filter(|s| !s.starts_with("--"))
        .map(|s| s.as_str())
        .unwrap_or("solo.mid");
    let progression_file: Option<String> = parse_flag(&args, "--progression");
    let seed: Option<u64> = parse_flag(&args, "--seed");
    let generations: Option<u32> = parse_flag(&args, "--generations");
    let weights_file: Option<String> = parse_flag(&args, "--weights");
    let config_file: Option<String> = parse_flag(&args, "--config");
    let tempo: u16 = parse_flag(&args, "--tempo").filter(|&t| t > 0).unwrap_or(120);
    let strategy_name: String =
        parse_flag(&args, "--strategy").unwrap_or_else(|| "genetic".to_string());
    let density_name: String =
        parse_flag(&args, "--density").unwrap_or_else(|| "eighth".to_string());

    let strategy = match strategy_name.parse::<CompositorKind>() {
        Ok(k) => k,
        Err(e) => {
            eprintln!("{}. Using genetic.", e);
            CompositorKind::GeneticAlgorithm
        }
    };
    let density = match density_name.parse::<Density>() {
        Ok(d) => d,
        Err(e) => {
            eprintln!("{}. Using eighth.", e);
            Density::Eighth
        }
    };

    println!("=== Soloforge ===");
    println!("Output: {}", output_path);
    println!("Strategy: {}", strategy_name);
    println!("Density: {}", density_name);
    println!("Tempo: {} BPM", tempo);
    if let Some(s) = seed {
        println!("Seed: {}", s);
    }
    println!();

    // Initialize RNG
    let mut rng = if let Some(s) = seed {
        StdRng::seed_from_u64(s)
    } else {
        StdRng::from_os_rng()
    };

    // Load the progression
    println!("[1/4] Loading chord progression...");
    let skeleton = match &progression_file {
        Some(file) => match load_progression(Path::new(file)) {
            Ok(bars) => {
                println!("  Loaded {} bars from {}.", bars.len(), file);
                bars
            }
            Err(e) => {
                eprintln!("  Error reading {}: {}", file, e);
                std::process::exit(1);
            }
        },
        None => {
            let bars = parse_progression(DEMO_PROGRESSION)
                .unwrap_or_else(|e| panic!("built-in progression failed to parse: {e}"));
            println!("  Using built-in demo progression ({} bars).", bars.len());
            bars
        }
    };
    for (i, bar) in skeleton.iter().enumerate() {
        let chords: Vec<String> = bar.chords.iter().map(|c| c.to_string()).collect();
        println!(
            "  Bar {}: {}/{} {}",
            i + 1,
            bar.time_signature.numerator,
            bar.time_signature.denominator,
            chords.join(" ")
        );
    }

    // Configure the run
    println!("[2/4] Configuring compositor...");
    let params = CompositionParams {
        density,
        ..CompositionParams::default()
    };
    if let Err(e) = params.validate() {
        eprintln!("  Invalid parameters: {}", e);
        std::process::exit(1);
    }

    let weights = match &weights_file {
        Some(file) => match FitnessWeights::load(Path::new(file)) {
            Ok(w) => {
                println!("  Loaded fitness weights from {}.", file);
                w
            }
            Err(e) => {
                eprintln!("  Failed to load {}: {}. Using defaults.", file, e);
                FitnessWeights::default()
            }
        },
        None => FitnessWeights::default(),
    };

    let mut config = match &config_file {
        Some(file) => match GaConfig::load(Path::new(file)) {
            Ok(c) => {
                println!("  Loaded search config from {}.", file);
                c
            }
            Err(e) => {
                eprintln!("  Failed to load {}: {}. Using defaults.", file, e);
                GaConfig::default()
            }
        },
        None => GaConfig::default(),
    };
    if let Some(g) = generations {
        config.max_generations = g;
        config.min_generations = config.min_generations.min(g);
    }
    println!(
        "  Generations: {} min / {} max, population {}, threshold {:.2}",
        config.min_generations,
        config.max_generations,
        config.max_population,
        config.fitness_threshold
    );

    // Run the compositor
    println!("[3/4] Composing...");
    let compositor: Box<dyn Compositor> = match strategy {
        CompositorKind::GeneticAlgorithm => Box::new(GeneticCompositor {
            config,
            weights: weights.clone(),
            ..GeneticCompositor::default()
        }),
        other => create_compositor(other),
    };
    let ranked = match compositor.compose(&skeleton, None, &params, &mut rng) {
        Ok(melodies) => melodies,
        Err(e) => {
            eprintln!("  Composition failed: {}", e);
            std::process::exit(1);
        }
    };
    if ranked.is_empty() {
        eprintln!("  Composition produced no melodies.");
        std::process::exit(1);
    }
    println!("  {} melodies ranked:", ranked.len());
    for (i, melody) in ranked.iter().take(5).enumerate() {
        let notes: usize = melody.iter().map(|b| b.notes.len()).sum();
        let score = evaluate(melody, &params, &weights);
        let tones: Vec<u8> = melody
            .iter()
            .flat_map(|b| b.notes.iter())
            .filter_map(|n| n.pitch.tone())
            .collect();
        let range = match (tones.iter().min(), tones.iter().max()) {
            (Some(&lo), Some(&hi)) => format!("{}..{}", pitch_name(lo), pitch_name(hi)),
            _ => "-".to_string(),
        };
        println!("  #{}: fitness {:.4}, {} notes, range {}", i + 1, score, notes, range);
    }

    // Write MIDI
    println!("[4/4] Writing MIDI to {}...", output_path);
    let best = &ranked[0];
    match write_midi(best, tempo, Path::new(output_path)) {
        Ok(()) => {
            let beats: u32 = best
                .iter()
                .map(|b| b.time_signature.numerator as u32)
                .sum();
            let duration_seconds = beats as f64 * 60.0 / tempo as f64;
            println!("  Done! Duration: {:.0}s ({} bars)", duration_seconds, best.len());
        }
        Err(e) => {
            eprintln!("  Error writing MIDI: {}", e);
            std::process::exit(1);
        }
    }

    println!();
    println!("Play with: timidity {} (or any MIDI player)", output_path);
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}
