//! Per-tile stencil kernels. Each kernel reads and writes one tile's arrays
//! over fixed index ranges and never triggers a halo update; the
//! orchestrator in [`crate::hydro`] refreshes ghost layers between kernels.
//!
//! Indexes are tile-local: interior cells are `1..=x_max` by `1..=y_max`,
//! nodes and faces run one further on their staggered axis.

pub mod accelerate;
pub mod advec_cell;
pub mod advec_mom;
pub mod calc_dt;
pub mod field_summary;
pub mod flux_calc;
pub mod generate;
pub mod geometry;
pub mod ideal_gas;
pub mod pdv;
pub mod reset_field;
pub mod revert;
pub mod viscosity;

use crate::index_space::Axis;

/// Below this, a value counts as zero in divisions.
pub const G_SMALL: f64 = 1.0e-16;

/// Stands in for "no limit".
pub const G_BIG: f64 = 1.0e+21;

/**
 * Which copy of density and energy a kernel works on: level 0 holds the
 * start-of-step state, level 1 the state being advanced.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeLevel {
    Start,
    Advanced,
}

/**
 * Which of the two directional sweeps of a step's advection is running.
 * The first sweep accounts for the volume change still owed to the second.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sweep {
    First,
    Second,
}

/**
 * The tile index `along` steps along `axis` and `across` steps along the
 * other axis. Lets the directional sweeps share one body for both axes.
 */
pub(crate) fn oriented(axis: Axis, along: i64, across: i64) -> (i64, i64) {
    match axis {
        Axis::I => (along, across),
        Axis::J => (across, along),
    }
}
