//! The per-step phase sequence: timestep control, the Lagrangian
//! predictor/corrector, the directionally split remap, and the periodic
//! field summary. Every phase runs its kernel on all tiles of the chunk in
//! parallel, and halo updates between phases go through
//! [`crate::halo::update_halo`].

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::chunk::Chunk;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::field::{Depth, FieldId, FieldSelector};
use crate::halo;
use crate::index_space::Axis;
use crate::kernels::calc_dt::{self, Control, TimestepLimit};
use crate::kernels::field_summary::{self, Summary};
use crate::kernels::{self, Sweep, TimeLevel, G_SMALL};
use crate::message::{util, Communicator};
use crate::profiler::{Phase, Profiler};
use crate::tile::Tile;
use FieldId::*;

const PRIME_FIELDS: [FieldId; 10] = [Density0, Energy0, Pressure, Viscosity, Density1, Energy1, XVel0, YVel0, XVel1, YVel1];
const TIMESTEP_FIELDS: [FieldId; 5] = [Pressure, Energy0, Density0, XVel0, YVel0];
const CELL_ADVECTION_FIELDS: [FieldId; 4] = [Density1, Energy1, VolFluxX, VolFluxY];
const MOM_ADVECTION_FIELDS: [FieldId; 6] = [Density1, Energy1, XVel1, YVel1, MassFluxX, MassFluxY];




/**
 * Simulation time, the step count, and the current and previous timesteps.
 */
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Clock {
    pub step: u64,
    pub time: f64,
    pub dt: f64,
    pub dtold: f64,
}




/**
 * The global timestep chosen for a step, what limited it, and where.
 */
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepReport {
    pub step: u64,
    pub time: f64,
    pub dt: f64,
    pub control: Control,
    pub cell: (i64, i64),
    pub position: (f64, f64),
}




/**
 * One row of the summary history.
 */
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub step: u64,
    pub time: f64,
    pub summary: Summary,
}




/**
 * What a completed run reports: the final clock and summary, and for a
 * standard test problem the percentage difference from the reference
 * kinetic energy and whether it passed.
 */
#[derive(Clone, Debug, PartialEq)]
pub struct RunOutcome {
    pub clock: Clock,
    pub summary: Summary,
    pub test_problem: Option<(u32, f64, bool)>,
    pub wall_seconds: f64,
}




/**
 * The solver state owned by one rank: its chunk of the mesh, the
 * communicator linking it to the other ranks, the clock, and the profiler.
 */
pub struct Hydro<C: Communicator> {
    config: Config,
    comm: C,
    chunk: Chunk,
    clock: Clock,
    profiler: Profiler,
    history: Vec<SummaryRecord>,
    interrupt: Option<Arc<AtomicBool>>,
}




// ============================================================================
impl<C: Communicator> Hydro<C> {

    /**
     * Decompose the grid, build this rank's chunk and initialise the tile
     * geometry. Every rank computes the same decomposition, but only this
     * rank knows whether its own chunk splits into tiles, so a failure here
     * is passed to every peer through the abort path.
     */
    pub fn new(config: Config, comm: C) -> Result<Self> {
        let mut chunk = config
            .validate()
            .and_then(|_| Chunk::for_rank(&config.grid, comm.rank(), comm.size(), config.tiles_per_chunk))
            .map_err(|e| {
                comm.abort(&e.to_string());
                e
            })?;
        let grid = &config.grid;
        chunk.tiles.par_iter_mut().for_each(|tile| kernels::geometry::initialise(tile, grid));

        debug!(
            "rank {} owns cells {:?} to {:?} in {} tiles",
            comm.rank(),
            chunk.block.lower,
            chunk.block.upper,
            chunk.tiles.len());

        let dtinit = config.timestep.dtinit;
        Ok(Self {
            profiler: Profiler::new(config.profiler),
            config,
            comm,
            chunk,
            clock: Clock { step: 0, time: 0.0, dt: dtinit, dtold: dtinit },
            history: Vec::new(),
            interrupt: None,
        })
    }

    /**
     * Stop the run at the next step boundary once the flag is raised.
     */
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn comm(&self) -> &C {
        &self.comm
    }

    pub fn chunk(&self) -> &Chunk {
        &self.chunk
    }

    pub fn chunk_mut(&mut self) -> &mut Chunk {
        &mut self.chunk
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    pub fn profiler(&self) -> &Profiler {
        &self.profiler
    }

    pub fn history(&self) -> &[SummaryRecord] {
        &self.history
    }

    fn for_each_tile<F>(&mut self, phase: Phase, f: F)
    where
        F: Fn(&mut Tile) + Send + Sync
    {
        let tiles = &mut self.chunk.tiles;
        self.profiler.time(phase, || tiles.par_iter_mut().for_each(f))
    }

    /**
     * Write the initial state, fill every halo the first step reads, and
     * report the initial summary. Ends with a barrier, so no rank starts
     * stepping before all are set up.
     */
    pub fn start(&mut self) -> Result<Summary> {
        let states = &self.config.states;
        self.chunk.tiles.par_iter_mut().for_each(|tile| kernels::generate::generate(tile, states));

        self.ideal_gas(TimeLevel::Start);
        self.update_halo(&PRIME_FIELDS, Depth::Two)?;

        let summary = self.field_summary()?;
        self.comm.barrier()?;

        let dtinit = self.config.timestep.dtinit;
        self.clock.dt = dtinit;
        self.clock.dtold = dtinit;
        Ok(summary)
    }

    pub fn update_halo(&mut self, fields: &[FieldId], depth: Depth) -> Result<()> {
        halo::update_halo(&mut self.chunk, &self.comm, &FieldSelector::from(fields), depth, &mut self.profiler)
    }

    pub fn ideal_gas(&mut self, level: TimeLevel) {
        self.for_each_tile(Phase::IdealGas, |tile| kernels::ideal_gas::ideal_gas(tile, level))
    }

    pub fn viscosity(&mut self) {
        self.for_each_tile(Phase::Viscosity, kernels::viscosity::viscosity)
    }

    pub fn revert(&mut self) {
        self.for_each_tile(Phase::Revert, kernels::revert::revert)
    }

    pub fn accelerate(&mut self) {
        let dt = self.clock.dt;
        self.for_each_tile(Phase::Acceleration, |tile| kernels::accelerate::accelerate(tile, dt))
    }

    pub fn flux_calc(&mut self) {
        let dt = self.clock.dt;
        self.for_each_tile(Phase::Flux, |tile| kernels::flux_calc::flux_calc(tile, dt))
    }

    pub fn reset_field(&mut self) {
        self.for_each_tile(Phase::Reset, kernels::reset_field::reset_field)
    }

    pub fn pdv(&mut self, predict: bool) -> Result<()> {
        let dt = self.clock.dt;
        let tiles = &mut self.chunk.tiles;
        self.profiler.time(Phase::PdV, || tiles.par_iter_mut().try_for_each(|tile| kernels::pdv::pdv(tile, predict, dt)))
    }

    /**
     * Choose the timestep for the next step. Each tile proposes its stable
     * limit; the smallest on the rank is capped by the growth and maximum
     * limits and then reduced across ranks, keeping the control and cell of
     * the winning rank (the lowest rank on a tie). A step below `dtmin` is
     * reported by the rank that owns the limiting cell, and the run carries
     * on.
     */
    pub fn timestep(&mut self) -> Result<StepReport> {
        self.ideal_gas(TimeLevel::Start);
        self.update_halo(&TIMESTEP_FIELDS, Depth::One)?;
        self.viscosity();
        self.update_halo(&[Viscosity], Depth::One)?;

        let controls = &self.config.timestep;
        let tiles = &self.chunk.tiles;
        let comm = &self.comm;
        let clock = &self.clock;

        let (tile, limit, reduced) = self.profiler.time(Phase::Timestep, || -> Result<_> {
            let limits: Vec<TimestepLimit> = tiles.par_iter().map(|tile| calc_dt::calc_dt(tile, controls)).collect();
            let (tile, limit) = limits
                .into_iter()
                .enumerate()
                .fold(None, |best: Option<(usize, TimestepLimit)>, (n, limit)| match best {
                    Some((_, b)) if b.dt <= limit.dt => best,
                    _ => Some((n, limit)),
                })
                .ok_or_else(|| Error::Config("chunk has no tiles".into()))?;

            let mut dt = limit.dt;
            let mut control = limit.control;

            if clock.dtold * controls.dtrise < dt {
                dt = clock.dtold * controls.dtrise;
                control = Control::Expand;
            }
            if controls.dtmax < dt {
                dt = controls.dtmax;
                control = Control::Max;
            }
            let candidate = [
                dt,
                comm.rank() as f64,
                control.index() as f64,
                limit.position.0,
                limit.position.1,
                limit.cell.0 as f64,
                limit.cell.1 as f64,
            ];
            let reduced = comm.all_reduce(smaller_candidate, util::encode_f64s(candidate.iter().cloned()))?;
            Ok((tile, limit, util::decode_f64s(&reduced)?))
        })?;

        if reduced.len() != 7 {
            return Err(Error::Malformed(format!("timestep reduction gave {} values", reduced.len())))
        }
        let control = Control::ALL
            .get(reduced[2] as usize)
            .cloned()
            .ok_or_else(|| Error::Malformed(format!("unknown timestep control {}", reduced[2])))?;

        let report = StepReport {
            step: self.clock.step + 1,
            time: self.clock.time,
            dt: reduced[0],
            control,
            cell: (reduced[5] as i64, reduced[6] as i64),
            position: (reduced[3], reduced[4]),
        };

        if report.dt < self.config.timestep.dtmin && reduced[1] as usize == self.comm.rank() {
            warn!("small timestep: {}", calc_dt::small_timestep_report(&self.chunk.tiles[tile], &limit));
        }
        self.clock.dt = report.dt;
        self.clock.dtold = report.dt;
        Ok(report)
    }

    /**
     * Remap the Lagrangian result back onto the fixed mesh in two
     * directional sweeps, the first along `first`.
     */
    pub fn advection(&mut self, first: Axis) -> Result<()> {
        self.update_halo(&CELL_ADVECTION_FIELDS, Depth::Two)?;

        for &(sweep, direction) in &[(Sweep::First, first), (Sweep::Second, first.transverse())] {
            self.for_each_tile(Phase::CellAdvection, |tile| kernels::advec_cell::advec_cell(tile, sweep, direction));
            self.update_halo(&MOM_ADVECTION_FIELDS, Depth::Two)?;

            for &velocity in &[Axis::I, Axis::J] {
                self.for_each_tile(Phase::MomAdvection, |tile| kernels::advec_mom::advec_mom(tile, velocity, direction, sweep));
            }
        }
        Ok(())
    }

    /**
     * Advance the solution by one step, sweeping `first` first in the
     * remap. Returns the timestep report for the step.
     */
    pub fn step(&mut self, first: Axis) -> Result<StepReport> {
        let report = self.timestep()?;

        if self.comm.is_boss() {
            info!(
                "step {:>6} time {:.7e} control {:<6} timestep {:.7e} cell ({}, {}) x {:.7e} y {:.7e}",
                report.step,
                report.time,
                report.control,
                report.dt,
                report.cell.0,
                report.cell.1,
                report.position.0,
                report.position.1);
        }

        self.pdv(true)?;
        self.ideal_gas(TimeLevel::Advanced);
        self.update_halo(&[Pressure], Depth::One)?;
        self.revert();
        self.accelerate();
        self.pdv(false)?;
        self.flux_calc();
        self.advection(first)?;
        self.reset_field();

        self.clock.step += 1;
        self.clock.time += self.clock.dt;
        Ok(report)
    }

    /**
     * Totals over the whole mesh for the start-of-step state, summed across
     * ranks. Every rank gets the result; the boss logs it and every rank
     * appends it to the history.
     */
    pub fn field_summary(&mut self) -> Result<Summary> {
        self.ideal_gas(TimeLevel::Start);

        let tiles = &self.chunk.tiles;
        let local = self.profiler.time(Phase::Summary, || {
            let per_tile: Vec<_> = tiles.par_iter().map(field_summary::field_summary).collect();
            per_tile.into_iter().fold(Summary::default(), Summary::merge)
        });
        let totals = self.comm.all_reduce_f64(|a, b| a + b, &local.to_array())?;
        let summary = Summary::from_slice(&totals)
            .ok_or_else(|| Error::Malformed(format!("summary reduction gave {} values", totals.len())))?;

        if self.comm.is_boss() {
            info!(
                "summary step {} time {:.7e}: volume {:.7e} mass {:.7e} density {:.7e} pressure {:.7e} internal energy {:.7e} kinetic energy {:.7e} total energy {:.7e}",
                self.clock.step,
                self.clock.time,
                summary.volume,
                summary.mass,
                summary.density(),
                summary.mean_pressure(),
                summary.internal_energy,
                summary.kinetic_energy,
                summary.total_energy());
        }
        self.history.push(SummaryRecord { step: self.clock.step, time: self.clock.time, summary });
        Ok(summary)
    }

    fn is_complete(&self) -> bool {
        self.clock.time + G_SMALL > self.config.end_time || self.clock.step >= self.config.end_step
    }

    fn check_interrupt(&self) -> Result<()> {
        match &self.interrupt {
            Some(flag) if flag.load(Ordering::SeqCst) => Err(Error::Interrupted),
            _ => Ok(()),
        }
    }

    /**
     * Set up and step until the end time or the step limit, with a summary
     * every `summary_frequency` steps and one at the end. Afterwards the
     * boss checks a configured test problem, reports the profile, and
     * writes the summary history if asked to.
     */
    pub fn run(&mut self) -> Result<RunOutcome> {
        let start = Instant::now();
        let mut summary = self.start()?;

        while !self.is_complete() {
            self.check_interrupt()?;
            let first = self.config.advection_order.first_axis(self.clock.step + 1);
            self.step(first)?;

            let frequency = self.config.summary_frequency;
            let periodic = frequency != 0 && self.clock.step % frequency == 0;

            if periodic || self.is_complete() {
                summary = self.field_summary()?;
            }
        }
        let wall_seconds = start.elapsed().as_secs_f64();

        let test_problem = match self.config.test_problem {
            Some(problem) => field_summary::check_test_problem(problem, summary.kinetic_energy)
                .map(|(difference, passed)| (problem, difference, passed)),
            None => None,
        };

        if self.comm.is_boss() {
            info!("run completed in {:.3}s after {} steps", wall_seconds, self.clock.step);

            if let Some((problem, difference, passed)) = test_problem {
                info!("test problem {} is within {:e}% of the expected solution", problem, difference);
                info!("this test is considered {}", if passed { "PASSED" } else { "NOT PASSED" });
            }
        }

        if self.profiler.is_enabled() {
            let slowest = self.comm.all_reduce_f64(f64::max, &self.profiler.seconds())?;

            if self.comm.is_boss() {
                info!("\n{}", Profiler::report(&slowest, wall_seconds));
            }
        }

        if let (true, Some(path)) = (self.comm.is_boss(), &self.config.summary_output) {
            write_history(path, &self.history)?;
            info!("wrote {} summary records to {}", self.history.len(), path.display());
        }

        Ok(RunOutcome { clock: self.clock, summary, test_problem, wall_seconds })
    }
}




/**
 * Pick the smaller of two encoded timestep candidates, comparing the
 * timestep and then the rank.
 */
fn smaller_candidate(a: Vec<u8>, b: Vec<u8>) -> Result<Vec<u8>> {
    let (x, y) = (util::decode_f64s(&a)?, util::decode_f64s(&b)?);

    if x.len() < 2 || y.len() < 2 {
        return Err(Error::Malformed("timestep candidate is too short".into()))
    }
    if (y[0], y[1]) < (x[0], x[1]) {
        Ok(b)
    } else {
        Ok(a)
    }
}




/**
 * Write summary records as CBOR.
 */
pub fn write_history<P: AsRef<Path>>(path: P, history: &[SummaryRecord]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    ciborium::ser::into_writer(history, &mut writer).map_err(|e| match e {
        ciborium::ser::Error::Io(e) => Error::Io(e),
        ciborium::ser::Error::Value(message) => Error::Malformed(message),
    })?;
    writer.flush()?;
    Ok(())
}

pub fn read_history<P: AsRef<Path>>(path: P) -> Result<Vec<SummaryRecord>> {
    let reader = BufReader::new(File::open(path)?);
    ciborium::de::from_reader(reader).map_err(|e| match e {
        ciborium::de::Error::Io(e) => Error::Io(e),
        e => Error::Malformed(e.to_string()),
    })
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::*;
    use crate::grid::Grid;
    use crate::message::LocalCommunicator;

    fn solo(config: Config) -> Hydro<LocalCommunicator> {
        let comm = LocalCommunicator::group(1).remove(0);
        Hydro::new(config, comm).unwrap()
    }

    #[test]
    fn first_step_is_limited_by_the_initial_timestep() {
        let mut hydro = solo(Config::default());
        hydro.start().unwrap();
        let report = hydro.step(Axis::I).unwrap();

        assert_eq!(report.step, 1);
        assert_eq!(report.dt, 0.04);
        assert_eq!(hydro.clock().step, 1);
        assert_eq!(hydro.clock().time, 0.04);
    }

    #[test]
    fn initial_summary_matches_the_states() {
        let mut hydro = solo(Config::default());
        let summary = hydro.start().unwrap();

        // 10 x 10 unit cells: the 5 x 2 rectangle at density 1, the rest at 0.2
        assert!((summary.volume - 100.0).abs() < 1e-12);
        assert!((summary.mass - (10.0 + 90.0 * 0.2)).abs() < 1e-12);
        assert!((summary.internal_energy - (10.0 * 2.5 + 18.0 * 1.0)).abs() < 1e-12);
        assert_eq!(summary.kinetic_energy, 0.0);
        assert_eq!(hydro.history().len(), 1);
    }

    #[test]
    fn run_stops_at_the_step_limit_with_a_final_summary() {
        let config = Config { end_step: 7, summary_frequency: 5, tiles_per_chunk: 2, ..Config::default() };
        let mut hydro = solo(config);
        let outcome = hydro.run().unwrap();

        assert_eq!(outcome.clock.step, 7);
        let steps: Vec<_> = hydro.history().iter().map(|r| r.step).collect();
        assert_eq!(steps, vec![0, 5, 7]);
        assert!(outcome.summary.kinetic_energy > 0.0);
        assert!(outcome.test_problem.is_none());
    }

    #[test]
    fn tiles_do_not_change_the_answer() {
        let run = |tiles| {
            let config = Config { end_step: 6, tiles_per_chunk: tiles, ..Config::default() };
            let mut hydro = solo(config);
            hydro.run().unwrap().summary
        };
        let one = run(1);
        let four = run(4);

        for (a, b) in one.to_array().iter().zip(&four.to_array()) {
            assert!((a - b).abs() <= 1e-12 * a.abs().max(1.0), "{} vs {}", a, b);
        }
    }

    #[test]
    fn raised_interrupt_stops_the_run() {
        let flag = Arc::new(AtomicBool::new(true));
        let mut hydro = solo(Config::default()).with_interrupt(flag);
        assert!(matches!(hydro.run(), Err(Error::Interrupted)));
    }

    #[test]
    fn growth_is_capped_by_dtrise() {
        let mut config = Config::default();
        config.grid = Grid { x_cells: 4, y_cells: 4, ..Grid::default() };
        config.timestep.dtinit = 1e-4;
        config.timestep.dtmax = 1.0;
        let mut hydro = solo(config);
        hydro.start().unwrap();
        let report = hydro.step(Axis::I).unwrap();

        assert_eq!(report.control, Control::Expand);
        assert!((report.dt - 1.5e-4).abs() < 1e-18);
    }

    #[test]
    fn small_timestep_is_reported_and_the_run_continues() {
        let mut config = Config { end_step: 3, ..Config::default() };
        config.timestep.dtmin = 1.0;
        let outcome = solo(config).run().unwrap();

        assert_eq!(outcome.clock.step, 3);
        assert_eq!(outcome.clock.dt, 0.04);
    }

    #[test]
    fn history_round_trips_through_cbor() {
        let mut hydro = solo(Config::default());
        hydro.start().unwrap();
        let path = std::env::temp_dir().join(format!("stagger-history-{}.cbor", std::process::id()));
        write_history(&path, hydro.history()).unwrap();
        let read = read_history(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(read, hydro.history());
    }
}
