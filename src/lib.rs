//! Pipe-model hydraulic erosion simulation on a heightfield grid.
//!
//! Terrain is a grid of layered columns (bedrock, loose regolith,
//! vegetation, water). Water enters through fixed sources and rainfall,
//! flows through virtual pipes between neighboring columns, erodes and
//! transports sediment, relaxes over-steep soil slopes, and evaporates.
//! All state is double-buffered: each tick reads the committed state and
//! writes the next one, which becomes visible atomically at tick end.

pub mod config;
pub mod export;
pub mod fields;
pub mod gen;
pub mod grid;
pub mod sim;
pub mod snapshot;

pub use config::{ConfigError, RainConfig, SimConfig, WaterSource};
pub use fields::InitialColumn;
pub use gen::{generate_initial_columns, GenConfig};
pub use grid::Grid;
pub use sim::Simulation;
pub use snapshot::Snapshot;
