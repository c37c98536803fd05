//! Initial terrain and vegetation generation.
//!
//! Produces the seed state the simulation starts from: fBm bedrock terrain
//! plus a second, independently seeded moisture field that drives initial
//! vegetation cover. The simulation itself never calls back into this
//! module; any `Vec<InitialColumn>` of the right length works.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use simdnoise::NoiseBuilder;

use crate::fields::InitialColumn;

/// Parameters for the fBm seed terrain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenConfig {
    /// Number of noise octaves for the terrain field.
    pub octaves: u8,
    /// Base frequency of the terrain noise.
    pub frequency: f32,
    /// Frequency multiplier per octave.
    pub lacunarity: f32,
    /// Amplitude decay per octave.
    pub gain: f32,
    /// Peak-to-valley half-range of the generated terrain.
    pub amplitude: f32,
    /// Uniform loose soil depth laid over the bedrock.
    pub regolith_depth: f32,
    /// Vegetation height at full moisture.
    pub max_vegetation: f32,
    /// Moisture below this grows no vegetation.
    pub moisture_floor: f32,
    /// Random seed; the moisture field derives its own seed from this.
    pub seed: i32,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            octaves: 4,
            frequency: 2.0,
            lacunarity: 2.0,
            gain: 0.5,
            amplitude: 1.0,
            regolith_depth: 0.05,
            max_vegetation: 0.2,
            moisture_floor: 0.3,
            seed: 42,
        }
    }
}

impl GenConfig {
    pub fn with_seed(seed: i32) -> Self {
        Self { seed, ..Default::default() }
    }
}

/// Generates the initial column stack for a `width` x `height` grid.
///
/// Terrain is fBm scaled to `[-amplitude, amplitude]` and may dip below
/// zero. Vegetation follows a higher-frequency moisture field: cover ramps
/// linearly from `moisture_floor` up to full moisture. All cells start dry.
pub fn generate_initial_columns(width: usize, height: usize, config: &GenConfig) -> Vec<InitialColumn> {
    let terrain = NoiseBuilder::fbm_2d(width, height)
        .with_seed(config.seed)
        .with_freq(config.frequency / width as f32)
        .with_octaves(config.octaves)
        .with_lacunarity(config.lacunarity)
        .with_gain(config.gain)
        .generate_scaled(-config.amplitude, config.amplitude);

    let moisture = NoiseBuilder::fbm_2d(width, height)
        .with_seed(config.seed.wrapping_add(31337))
        .with_freq(2.0 * config.frequency / width as f32)
        .with_octaves(3)
        .with_lacunarity(config.lacunarity)
        .with_gain(config.gain)
        .generate_scaled(0.0, 1.0);

    terrain
        .par_iter()
        .zip(moisture.par_iter())
        .map(|(&t, &m)| {
            let cover = ((m - config.moisture_floor) / (1.0 - config.moisture_floor))
                .clamp(0.0, 1.0);
            InitialColumn {
                terrain: t,
                regolith: config.regolith_depth,
                vegetation: cover * config.max_vegetation,
                water: 0.0,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generates_full_grid() {
        let columns = generate_initial_columns(32, 16, &GenConfig::default());
        assert_eq!(columns.len(), 32 * 16);
    }

    #[test]
    fn test_layers_within_bounds() {
        let config = GenConfig::default();
        let columns = generate_initial_columns(32, 32, &config);
        for col in &columns {
            assert!(col.terrain.abs() <= config.amplitude + 1e-4);
            assert_eq!(col.regolith, config.regolith_depth);
            assert!(col.vegetation >= 0.0 && col.vegetation <= config.max_vegetation + 1e-6);
            assert_eq!(col.water, 0.0);
        }
    }

    #[test]
    fn test_deterministic_for_seed() {
        let a = generate_initial_columns(16, 16, &GenConfig::with_seed(7));
        let b = generate_initial_columns(16, 16, &GenConfig::with_seed(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_seed_changes_terrain() {
        let a = generate_initial_columns(16, 16, &GenConfig::with_seed(1));
        let b = generate_initial_columns(16, 16, &GenConfig::with_seed(2));
        assert_ne!(a, b);
    }
}
