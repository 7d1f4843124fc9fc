use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::grid::Grid;
use crate::index_space::Axis;




/**
 * The region an initial state covers. The first state of a problem must be
 * the background, which fills the whole mesh; later states overwrite it
 * where they apply.
 */
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StateGeometry {
    Background,
    Rectangle { xmin: f64, xmax: f64, ymin: f64, ymax: f64 },
    Circle { x: f64, y: f64, radius: f64 },
    Point { x: f64, y: f64 },
}

impl Default for StateGeometry {
    fn default() -> Self {
        StateGeometry::Background
    }
}




/**
 * An initial material state: density, specific internal energy, and a
 * velocity applied to the nodes of every cell the state covers.
 */
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub density: f64,
    pub energy: f64,
    #[serde(default)]
    pub xvel: f64,
    #[serde(default)]
    pub yvel: f64,
    #[serde(default)]
    pub geometry: StateGeometry,
}

impl State {
    pub fn new(density: f64, energy: f64, geometry: StateGeometry) -> Self {
        Self { density, energy, xvel: 0.0, yvel: 0.0, geometry }
    }
}




/**
 * Limits on the timestep: the initial and maximum steps, the floor below
 * which a step is reported as suspiciously small, the maximum growth factor
 * per step, and the safety factors applied to the sound-speed, velocity and
 * divergence limits.
 */
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimestepControls {
    pub dtinit: f64,
    pub dtmax: f64,
    pub dtmin: f64,
    pub dtrise: f64,
    pub dtc_safe: f64,
    pub dtu_safe: f64,
    pub dtv_safe: f64,
    pub dtdiv_safe: f64,
}

impl Default for TimestepControls {
    fn default() -> Self {
        Self {
            dtinit: 0.1,
            dtmax: 1.0,
            dtmin: 0.0000001,
            dtrise: 1.5,
            dtc_safe: 0.7,
            dtu_safe: 0.5,
            dtv_safe: 0.5,
            dtdiv_safe: 0.7,
        }
    }
}




/**
 * Which axis each step's advection sweeps first.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvectionOrder {
    /// Alternate every step, starting with x on the first step.
    Alternate,
    XFirst,
    YFirst,
}

impl Default for AdvectionOrder {
    fn default() -> Self {
        AdvectionOrder::Alternate
    }
}

impl AdvectionOrder {

    /**
     * The axis swept first on the given step, counting steps from 1.
     */
    pub fn first_axis(self, step: u64) -> Axis {
        match self {
            AdvectionOrder::Alternate if step % 2 == 1 => Axis::I,
            AdvectionOrder::Alternate => Axis::J,
            AdvectionOrder::XFirst => Axis::I,
            AdvectionOrder::YFirst => Axis::J,
        }
    }
}




/**
 * Everything needed to set up and run a problem. Missing entries in an input
 * file take their default values.
 */
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub grid: Grid,
    pub states: Vec<State>,
    pub timestep: TimestepControls,
    pub end_time: f64,
    pub end_step: u64,
    pub summary_frequency: u64,
    pub tiles_per_chunk: usize,
    pub advection_order: AdvectionOrder,
    pub profiler: bool,
    pub test_problem: Option<u32>,
    pub summary_output: Option<PathBuf>,
}




// ============================================================================
impl Default for Config {
    fn default() -> Self {
        Self {
            grid: Grid::default(),
            states: vec![
                State::new(0.2, 1.0, StateGeometry::Background),
                State::new(1.0, 2.5, StateGeometry::Rectangle { xmin: 0.0, xmax: 5.0, ymin: 0.0, ymax: 2.0 }),
            ],
            timestep: TimestepControls { dtinit: 0.04, dtmax: 0.04, ..TimestepControls::default() },
            end_time: 10.0,
            end_step: u64::MAX,
            summary_frequency: 10,
            tiles_per_chunk: 1,
            advection_order: AdvectionOrder::Alternate,
            profiler: false,
            test_problem: None,
            summary_output: None,
        }
    }
}




// ============================================================================
impl Config {

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;

        match self.states.first() {
            Some(State { geometry: StateGeometry::Background, .. }) => {}
            _ => return Err(Error::Config("the first state must be the background".into())),
        }
        if self.states.iter().any(|s| !(s.density > 0.0) || !(s.energy >= 0.0)) {
            return Err(Error::Config("states need a positive density and non-negative energy".into()))
        }
        if self.states.iter().skip(1).any(|s| s.geometry == StateGeometry::Background) {
            return Err(Error::Config("only the first state may be the background".into()))
        }

        let t = &self.timestep;
        if !(t.dtinit > 0.0 && t.dtmax > 0.0 && t.dtmin >= 0.0 && t.dtrise >= 1.0) {
            return Err(Error::Config("timestep limits must be positive and dtrise at least 1".into()))
        }
        if !(t.dtc_safe > 0.0 && t.dtu_safe > 0.0 && t.dtv_safe > 0.0 && t.dtdiv_safe > 0.0) {
            return Err(Error::Config("timestep safety factors must be positive".into()))
        }
        if self.tiles_per_chunk == 0 {
            return Err(Error::Config("tiles_per_chunk must be at least 1".into()))
        }
        if let Some(problem) = self.test_problem {
            if !(1..=5).contains(&problem) {
                return Err(Error::Config(format!("no reference solution for test problem {}", problem)))
            }
        }
        Ok(())
    }
}
