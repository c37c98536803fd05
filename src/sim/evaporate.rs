//! Evaporation: the last stage touching water each tick.

use rayon::prelude::*;

use crate::config::SimConfig;

/// Shrinks every water column by the exact factor `1 - evaporation * dt`,
/// in place on the tick's working water field. Validation guarantees the
/// factor is non-negative.
pub fn evaporate(config: &SimConfig, water: &mut [f32]) {
    let factor = 1.0 - config.evaporation * config.dt;
    if factor >= 1.0 {
        return;
    }
    water.par_iter_mut().for_each(|w| *w *= factor);
}
