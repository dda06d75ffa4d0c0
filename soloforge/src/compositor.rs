// Compositor strategies: every way of turning a chord skeleton into a
// melody sits behind one trait. The genetic compositor is the
// interesting one; the deterministic walkers double as debugging aids
// and as the source material the genetic search is seeded from.

use crate::bar::Bar;
use crate::duration::Duration;
use crate::genetic::GeneticCompositor;
use crate::initializer::{InitPattern, PitchSource, fill_bars};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Rhythmic grain of the generated melody.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Density {
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
}

impl Density {
    /// Note value the initial walkers fill bars with.
    pub fn default_duration(self) -> Duration {
        match self {
            Density::Quarter => Duration::QUARTER,
            Density::Eighth => Duration::EIGHTH,
            Density::Sixteenth => Duration::SIXTEENTH,
            Density::ThirtySecond => Duration::THIRTY_SECOND,
        }
    }

    /// Shortest value the duration-splitting mutation may produce.
    pub fn shortest_duration(self) -> Duration {
        match self {
            Density::Quarter => Duration::SIXTEENTH,
            Density::Eighth | Density::Sixteenth | Density::ThirtySecond => {
                Duration::THIRTY_SECOND
            }
        }
    }
}

impl FromStr for Density {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quarter" => Ok(Density::Quarter),
            "eighth" => Ok(Density::Eighth),
            "sixteenth" => Ok(Density::Sixteenth),
            "thirtysecond" => Ok(Density::ThirtySecond),
            other => Err(format!("unknown density '{other}'")),
        }
    }
}

/// Melody-level parameters shared by every strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositionParams {
    /// Lowest admissible MIDI pitch.
    pub low: u8,
    /// Highest admissible MIDI pitch.
    pub high: u8,
    pub density: Density,
    /// Largest interval (semitones) still counted as smooth.
    pub max_smooth_interval: u8,
}

impl Default for CompositionParams {
    fn default() -> Self {
        CompositionParams {
            low: 48,
            high: 84,
            density: Density::Eighth,
            max_smooth_interval: 7,
        }
    }
}

impl CompositionParams {
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.low >= self.high {
            return Err(format!(
                "pitch range is empty: low {} must be below high {}",
                self.low, self.high
            )
            .into());
        }
        if self.high - self.low < 12 {
            return Err(format!(
                "pitch range {}..={} spans under one octave; walkers and \
                 mutations need at least 12 semitones",
                self.low, self.high
            )
            .into());
        }
        Ok(())
    }
}

/// A melody-generation strategy. Takes a chord skeleton (bars with
/// chords and signatures, notes ignored) and an optional seed melody
/// over the same skeleton; returns one or more melodies, best first.
pub trait Compositor {
    fn compose(
        &self,
        skeleton: &[Bar],
        seed: Option<&[Bar]>,
        params: &CompositionParams,
        rng: &mut StdRng,
    ) -> Result<Vec<Vec<Bar>>, Box<dyn std::error::Error>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositorKind {
    GeneticAlgorithm,
    Arpeggiator,
    Scalerator,
    ArpeggioScaleMix,
}

impl FromStr for CompositorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "genetic" => Ok(CompositorKind::GeneticAlgorithm),
            "arpeggio" => Ok(CompositorKind::Arpeggiator),
            "scale" => Ok(CompositorKind::Scalerator),
            "mix" => Ok(CompositorKind::ArpeggioScaleMix),
            other => Err(format!("unknown strategy '{other}'")),
        }
    }
}

pub fn create_compositor(kind: CompositorKind) -> Box<dyn Compositor> {
    match kind {
        CompositorKind::GeneticAlgorithm => Box::new(GeneticCompositor::default()),
        CompositorKind::Arpeggiator => Box::new(WalkingCompositor {
            sources: &[PitchSource::Arpeggio],
        }),
        CompositorKind::Scalerator => Box::new(WalkingCompositor {
            sources: &[PitchSource::Scale],
        }),
        CompositorKind::ArpeggioScaleMix => Box::new(WalkingCompositor {
            sources: &[PitchSource::Arpeggio, PitchSource::Scale],
        }),
    }
}

/// Deterministic strategy: ascending walk over a per-bar cycle of pitch
/// sources. One source gives the plain arpeggiator or scalerator; two
/// alternate bar by bar.
struct WalkingCompositor {
    sources: &'static [PitchSource],
}

impl Compositor for WalkingCompositor {
    fn compose(
        &self,
        skeleton: &[Bar],
        _seed: Option<&[Bar]>,
        params: &CompositionParams,
        _rng: &mut StdRng,
    ) -> Result<Vec<Vec<Bar>>, Box<dyn std::error::Error>> {
        let mut bars = skeleton.to_vec();
        let duration = params.density.default_duration();
        if let [source] = self.sources {
            // One source: a single continuous walk over the whole melody.
            fill_bars(
                &mut bars,
                InitPattern::Ascending,
                *source,
                params.low,
                params.high,
                duration,
            );
        } else {
            for (i, chunk) in bars.chunks_mut(1).enumerate() {
                let source = self.sources[i % self.sources.len()];
                fill_bars(
                    chunk,
                    InitPattern::Ascending,
                    source,
                    params.low,
                    params.high,
                    duration,
                );
            }
        }
        Ok(vec![bars])
    }
}
