//! Simulation configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fields::InitialColumn;

/// Errors detected while validating a [`SimConfig`] at startup.
///
/// Configuration errors are fatal: the simulation refuses to start rather
/// than silently clamping a bad parameter.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Grid dimensions {0}x{1} are invalid (both must be >= 2)")]
    InvalidDimensions(usize, usize),
    #[error("Parameter '{name}' must be positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },
    #[error("Parameter '{name}' must be non-negative, got {value}")]
    Negative { name: &'static str, value: f32 },
    #[error("Friction coefficient '{name}' must lie in [0, 1], got {value}")]
    FrictionOutOfRange { name: &'static str, value: f32 },
    #[error("Talus angle must lie in (0, 90) degrees, got {0}")]
    TalusAngleOutOfRange(f32),
    #[error("Evaporation would remove more than a full water column per tick (evaporation * dt = {0})")]
    EvaporationTooStrong(f32),
    #[error("Source {index} at ({x}, {y}) is outside the {width}x{height} grid")]
    SourceOutOfBounds { index: usize, x: usize, y: usize, width: usize, height: usize },
    #[error("Source {index} has invalid radius {radius}")]
    SourceRadiusInvalid { index: usize, radius: f32 },
    #[error("Rain radius {radius} leaves no valid drop positions on a {width}x{height} grid")]
    RainRadiusTooLarge { radius: f32, width: usize, height: usize },
    #[error("Rain intensity range [{min}, {max}] is invalid")]
    RainIntensityInvalid { min: f32, max: f32 },
    #[error("Initial column data has {got} cells, expected {expected}")]
    InitialDataLength { expected: usize, got: usize },
    #[error("Initial column {index} has a negative {layer} height ({value})")]
    NegativeInitialHeight { index: usize, layer: &'static str, value: f32 },
}

/// A fixed water source feeding the grid while source flow is active.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WaterSource {
    /// Cell x coordinate of the source center.
    pub x: usize,
    /// Cell y coordinate of the source center.
    pub y: usize,
    /// Intake radius in cells; cells strictly inside receive water.
    pub radius: f32,
    /// Water height added per second to each covered cell.
    pub rate: f32,
}

/// Random rainfall configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RainConfig {
    pub enabled: bool,
    /// Raindrops spawned per tick while rain is active.
    pub drops_per_tick: u32,
    /// Drop footprint radius in cells.
    pub radius: f32,
    /// Intensity is drawn uniformly from [min, max) per drop, in water
    /// height per second.
    pub intensity_min: f32,
    pub intensity_max: f32,
}

impl Default for RainConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            drops_per_tick: 1,
            radius: 2.5,
            intensity_min: 3.0,
            intensity_max: 5.0,
        }
    }
}

/// Immutable-per-run simulation parameters.
///
/// Validated once by [`crate::sim::Simulation::new`]; nothing here mutates
/// during a run. Runtime source/rain enable state lives in the injector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Grid width in cells.
    pub width: usize,
    /// Grid height in cells.
    pub height: usize,
    /// Simulation time step in seconds.
    pub dt: f32,
    /// Virtual pipe length, i.e. cell spacing.
    pub pipe_length: f32,
    /// Virtual pipe cross-section area.
    pub pipe_area: f32,
    /// Gravitational acceleration.
    pub gravity: f32,

    /// Per-tick retention of the previous water flux (0 = no memory).
    pub water_friction: f32,
    /// Per-tick retention of the previous regolith flux; typically lower
    /// than `water_friction`.
    pub regolith_friction: f32,

    /// Sediment transport capacity factor (Kc).
    pub sediment_capacity: f32,
    /// Dissolving rate from terrain into suspension (Ks).
    pub dissolving_rate: f32,
    /// Deposition rate from suspension into terrain (Kd).
    pub deposition_rate: f32,
    /// Cap on terrain eroded in a single tick.
    pub max_erosion_per_step: f32,
    /// Floor for sin(slope) in the capacity formula; keeps flowing water
    /// carrying sediment across flat terrain.
    pub min_tilt: f32,

    /// Angle of repose in degrees. Slopes steeper than this shed soil.
    pub talus_angle_deg: f32,
    /// Fraction of excess slope relaxed per second.
    pub talus_rate: f32,
    /// Skip talus flow for cells under more water than `submerge_threshold`.
    pub talus_exclude_submerged: bool,
    /// Water depth above which a cell counts as submerged.
    pub submerge_threshold: f32,

    /// Evaporation constant; water shrinks by `1 - evaporation * dt` per tick.
    pub evaporation: f32,

    /// Fixed inflow sources.
    pub sources: Vec<WaterSource>,
    /// Random rainfall.
    pub rain: RainConfig,
    /// Source flow auto-disables after this many seconds of activity.
    pub source_cutoff: f32,
    /// Rain auto-disables after this many seconds of activity.
    pub rain_cutoff: f32,

    /// Master switch for vegetation effects (capacity attenuation and the
    /// submersion/die-off lifecycle).
    pub vegetation_enabled: bool,
    /// Upper bound on living vegetation height.
    pub max_vegetation: f32,
    /// Capacity divisor growth per unit of vegetation height.
    pub vegetation_attenuation: f32,
    /// Continuous submersion time after which vegetation starts dying.
    pub vegetation_drown_time: f32,
    /// Living-to-dead conversion rate once drowning, height per second.
    pub vegetation_decay_rate: f32,
    /// Rate at which flowing water picks up dead vegetation, per unit speed.
    pub vegetation_pickup_rate: f32,

    /// RNG seed for raindrop placement.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::for_grid(256, 256)
    }
}

impl SimConfig {
    /// Builds a configuration scaled to the grid size: two sources in
    /// opposite quadrants, size-relative source/rain radii, and a time step
    /// small enough for the pipe model to stay stable at this resolution.
    pub fn for_grid(width: usize, height: usize) -> Self {
        let w = width as f32;
        let h = height as f32;
        let cutoff = 15.0 * (w / 256.0).max(1.0);

        Self {
            width,
            height,
            dt: (1.0 / (2.0 * w)).min(0.002),
            pipe_length: 1.0,
            pipe_area: 1.0,
            gravity: 9.81,

            water_friction: 0.99,
            regolith_friction: 0.5,

            sediment_capacity: 0.05,
            dissolving_rate: 0.05,
            deposition_rate: 0.05,
            max_erosion_per_step: 0.01,
            min_tilt: 0.005,

            talus_angle_deg: 35.0,
            talus_rate: 0.5,
            talus_exclude_submerged: false,
            submerge_threshold: 0.01,

            evaporation: 0.015,

            sources: vec![
                WaterSource {
                    x: (0.25 * w) as usize,
                    y: (0.25 * h) as usize,
                    radius: w / 20.0,
                    rate: 0.5,
                },
                WaterSource {
                    x: (0.75 * w) as usize,
                    y: (0.75 * h) as usize,
                    radius: w / 40.0,
                    rate: 0.75,
                },
            ],
            rain: RainConfig {
                radius: (w / 100.0).max(1.0),
                ..RainConfig::default()
            },
            source_cutoff: cutoff,
            rain_cutoff: cutoff,

            vegetation_enabled: true,
            max_vegetation: 0.2,
            vegetation_attenuation: 8.0,
            vegetation_drown_time: 2.0,
            vegetation_decay_rate: 0.05,
            vegetation_pickup_rate: 0.2,

            seed: 42,
        }
    }

    /// A quiet configuration with no sources, rain, evaporation, or
    /// vegetation. This is the closed-system baseline the conservation
    /// tests build on.
    pub fn quiescent(width: usize, height: usize) -> Self {
        Self {
            sources: Vec::new(),
            rain: RainConfig { enabled: false, ..RainConfig::default() },
            evaporation: 0.0,
            vegetation_enabled: false,
            ..Self::for_grid(width, height)
        }
    }

    /// Tangent of the angle of repose: the slope threshold for talus flow.
    #[inline]
    pub fn talus_threshold(&self) -> f32 {
        self.talus_angle_deg.to_radians().tan()
    }

    /// Validates every parameter, returning the first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width < 2 || self.height < 2 {
            return Err(ConfigError::InvalidDimensions(self.width, self.height));
        }

        for (name, value) in [
            ("dt", self.dt),
            ("pipe_length", self.pipe_length),
            ("pipe_area", self.pipe_area),
            ("gravity", self.gravity),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { name, value });
            }
        }

        for (name, value) in [
            ("sediment_capacity", self.sediment_capacity),
            ("dissolving_rate", self.dissolving_rate),
            ("deposition_rate", self.deposition_rate),
            ("max_erosion_per_step", self.max_erosion_per_step),
            ("min_tilt", self.min_tilt),
            ("talus_rate", self.talus_rate),
            ("submerge_threshold", self.submerge_threshold),
            ("evaporation", self.evaporation),
            ("source_cutoff", self.source_cutoff),
            ("rain_cutoff", self.rain_cutoff),
            ("max_vegetation", self.max_vegetation),
            ("vegetation_attenuation", self.vegetation_attenuation),
            ("vegetation_drown_time", self.vegetation_drown_time),
            ("vegetation_decay_rate", self.vegetation_decay_rate),
            ("vegetation_pickup_rate", self.vegetation_pickup_rate),
        ] {
            if !(value >= 0.0) {
                return Err(ConfigError::Negative { name, value });
            }
        }

        for (name, value) in [
            ("water_friction", self.water_friction),
            ("regolith_friction", self.regolith_friction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::FrictionOutOfRange { name, value });
            }
        }

        if !(self.talus_angle_deg > 0.0 && self.talus_angle_deg < 90.0) {
            return Err(ConfigError::TalusAngleOutOfRange(self.talus_angle_deg));
        }

        if self.evaporation * self.dt > 1.0 {
            return Err(ConfigError::EvaporationTooStrong(self.evaporation * self.dt));
        }

        for (index, source) in self.sources.iter().enumerate() {
            if source.x >= self.width || source.y >= self.height {
                return Err(ConfigError::SourceOutOfBounds {
                    index,
                    x: source.x,
                    y: source.y,
                    width: self.width,
                    height: self.height,
                });
            }
            if !(source.radius >= 0.0) || !(source.rate >= 0.0) {
                return Err(ConfigError::SourceRadiusInvalid { index, radius: source.radius });
            }
        }

        if self.rain.enabled && self.rain.drops_per_tick > 0 {
            let r = self.rain.radius.ceil() as usize;
            if 2 * r >= self.width || 2 * r >= self.height || !(self.rain.radius >= 0.0) {
                return Err(ConfigError::RainRadiusTooLarge {
                    radius: self.rain.radius,
                    width: self.width,
                    height: self.height,
                });
            }
            if !(self.rain.intensity_min >= 0.0)
                || self.rain.intensity_max < self.rain.intensity_min
            {
                return Err(ConfigError::RainIntensityInvalid {
                    min: self.rain.intensity_min,
                    max: self.rain.intensity_max,
                });
            }
        }

        Ok(())
    }

    /// Validates externally supplied initial column data against this
    /// configuration.
    pub fn validate_initial(&self, columns: &[InitialColumn]) -> Result<(), ConfigError> {
        let expected = self.width * self.height;
        if columns.len() != expected {
            return Err(ConfigError::InitialDataLength { expected, got: columns.len() });
        }

        for (index, col) in columns.iter().enumerate() {
            for (layer, value) in [
                ("regolith", col.regolith),
                ("vegetation", col.vegetation),
                ("water", col.water),
            ] {
                if !(value >= 0.0) {
                    return Err(ConfigError::NegativeInitialHeight { index, layer, value });
                }
            }
        }

        Ok(())
    }
}
