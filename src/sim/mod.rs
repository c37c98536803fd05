//! The staged simulation driver.
//!
//! One tick runs a fixed stage order, each stage a parallel per-cell kernel
//! reading last tick's committed state (and already-finished portions of
//! this tick's state) and writing this tick's state:
//!
//! 1. inject: sources and rainfall establish the working water field
//! 2. flux: water and regolith pipe flux updates
//! 3. height: flux divergence applied to water and regolith
//! 4. velocity: flow velocity derived from water flux and depth
//! 5. soil flow: talus transfers scheduled from over-steep slopes
//! 6. erosion: erode/deposit plus the vegetation lifecycle
//! 7. transport: suspended loads advected with the flow
//! 8. soil deposit: scheduled talus transfers applied
//! 9. evaporate: water shrunk by the evaporation factor
//! 10. commit: every double buffer flips its parity bit
//!
//! The stage boundaries are the synchronization points; kernels only ever
//! write the cell they are invoked for.

pub mod erosion;
pub mod evaporate;
pub mod flux;
pub mod height;
pub mod soil_deposit;
pub mod soil_flow;
pub mod source;
pub mod transport;
pub mod velocity;

pub use source::InjectorState;

use crate::config::{ConfigError, SimConfig};
use crate::fields::{
    zero_flux, zero_velocity, Buffered, ColumnFields, FluxField, InitialColumn, SoilCornerFlux,
    SoilFlux, TransferScratch, VelocityField, WaterAuxFields,
};
use crate::grid::Grid;
use crate::snapshot::Snapshot;

pub struct Simulation {
    config: SimConfig,
    grid: Grid,

    columns: Buffered<ColumnFields>,
    aux: Buffered<WaterAuxFields>,
    water_flux: Buffered<FluxField>,
    regolith_flux: Buffered<FluxField>,
    velocity: Buffered<VelocityField>,

    // Per-tick scratch, fully rewritten each tick.
    soil_flux: SoilFlux,
    soil_corner_flux: SoilCornerFlux,
    transfer: TransferScratch,

    injector: InjectorState,
    tick: u64,
    elapsed: f32,
}

impl Simulation {
    /// Builds a simulation from a validated configuration and initial
    /// column data of length `width * height`.
    pub fn new(config: SimConfig, initial: &[InitialColumn]) -> Result<Self, ConfigError> {
        config.validate()?;
        config.validate_initial(initial)?;

        let grid = Grid::new(config.width, config.height);
        let cells = grid.cells();
        let injector = InjectorState::new(&config);

        Ok(Self {
            grid,
            columns: Buffered::new(ColumnFields::from_initial(initial)),
            aux: Buffered::new(WaterAuxFields::zeroed(cells)),
            water_flux: Buffered::new(zero_flux(grid)),
            regolith_flux: Buffered::new(zero_flux(grid)),
            velocity: Buffered::new(zero_velocity(grid)),
            soil_flux: vec![[0.0; 4]; cells],
            soil_corner_flux: vec![[0.0; 4]; cells],
            transfer: TransferScratch::zeroed(cells),
            injector,
            config,
            tick: 0,
            elapsed: 0.0,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    /// Number of completed ticks.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated seconds elapsed.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn injector(&self) -> &InjectorState {
        &self.injector
    }

    /// Borrowed view of the committed state.
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            grid: self.grid,
            terrain: &self.columns.cur().terrain,
            regolith: &self.columns.cur().regolith,
            vegetation: &self.columns.cur().vegetation,
            water: &self.columns.cur().water,
            suspended_sediment: &self.aux.cur().suspended_sediment,
            suspended_dead_vegetation: &self.aux.cur().suspended_dead_vegetation,
            dead_vegetation: &self.aux.cur().dead_vegetation,
            velocity: self.velocity.cur(),
        }
    }

    /// Advances the simulation by `ticks` steps.
    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.step();
        }
    }

    /// Advances the simulation by one tick.
    pub fn step(&mut self) {
        let grid = self.grid;

        // 1. Injection establishes the tick's working water field.
        {
            let (cur, next) = self.columns.split();
            source::inject(grid, &self.config, &mut self.injector, &cur.water, &mut next.water);
        }

        // 2. Pipe flux updates, both layers against the fresh water field.
        {
            let (cur, next) = self.columns.split();
            let (prev_flux, next_flux) = self.water_flux.split();
            flux::update_water_flux(grid, &self.config, cur, &next.water, prev_flux, next_flux);
        }
        {
            let cur = self.columns.cur();
            let (prev_flux, next_flux) = self.regolith_flux.split();
            flux::update_regolith_flux(
                grid,
                &self.config,
                &cur.terrain,
                &cur.regolith,
                prev_flux,
                next_flux,
            );
        }

        // 3. Height integration from the flux divergence.
        {
            let (cur, next) = self.columns.split();
            height::integrate_water(grid, &self.config, self.water_flux.next(), &mut next.water);
            height::integrate_regolith(
                grid,
                &self.config,
                self.regolith_flux.next(),
                &cur.regolith,
                &mut next.regolith,
            );
        }

        // 4. Velocity from the flux and the mean of pre/post depths.
        {
            let (cur, next) = self.columns.split();
            velocity::derive_velocity(
                grid,
                &self.config,
                self.water_flux.next(),
                &cur.water,
                &next.water,
                self.velocity.next_mut(),
            );
        }

        // 5. Talus scheduling against the post-creep regolith.
        {
            let (cur, next) = self.columns.split();
            soil_flow::schedule_soil_flow(
                grid,
                &self.config,
                &cur.terrain,
                &next.regolith,
                &next.water,
                &mut self.soil_flux,
                &mut self.soil_corner_flux,
            );
        }

        // 6. Erosion/deposition and the vegetation lifecycle.
        {
            let (cur, next) = self.columns.split();
            let (cur_aux, next_aux) = self.aux.split();
            erosion::erode_deposit(
                grid,
                &self.config,
                &cur.terrain,
                &cur_aux.suspended_sediment,
                &cur.vegetation,
                self.velocity.next(),
                &mut next.terrain,
                &mut next_aux.suspended_sediment,
            );
            erosion::update_vegetation(
                &self.config,
                &next.water,
                self.velocity.next(),
                &cur.vegetation,
                &cur_aux.time_submerged,
                &cur_aux.dead_vegetation,
                &cur_aux.suspended_dead_vegetation,
                &mut next.vegetation,
                &mut next_aux.time_submerged,
                &mut next_aux.dead_vegetation,
                &mut next_aux.suspended_dead_vegetation,
            );
        }

        // 7. Suspended loads advect with the flow.
        {
            let next_aux = self.aux.next_mut();
            transport::compute_transfers(
                grid,
                &self.config,
                self.velocity.next(),
                &next_aux.suspended_sediment,
                &next_aux.suspended_dead_vegetation,
                &mut self.transfer,
            );
            let next_aux = self.aux.next_mut();
            transport::apply_transfers(
                grid,
                &self.transfer,
                &mut next_aux.suspended_sediment,
                &mut next_aux.suspended_dead_vegetation,
            );
        }

        // 8. Scheduled talus transfers land.
        soil_deposit::apply_soil_flow(
            grid,
            &self.config,
            &self.soil_flux,
            &self.soil_corner_flux,
            &mut self.columns.next_mut().regolith,
        );

        // 9. Evaporation closes the water budget.
        evaporate::evaporate(&self.config, &mut self.columns.next_mut().water);

        // 10. Commit: flip every parity bit at once.
        self.columns.commit();
        self.aux.commit();
        self.water_flux.commit();
        self.regolith_flux.commit();
        self.velocity.commit();

        self.tick += 1;
        self.elapsed += self.config.dt;
    }
}
