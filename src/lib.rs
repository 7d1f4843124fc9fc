//! Stagger is a two-dimensional compressible hydrodynamics solver on a
//! staggered Cartesian mesh: density, energy and pressure live at cell
//! centers, velocities at nodes, and fluxes on faces. Each step is a
//! Lagrangian predictor/corrector followed by a directionally split remap
//! back onto the fixed mesh.
//!
//! The mesh is split into one chunk per rank, and each chunk into tiles
//! which are advanced in parallel. Ghost layers are refreshed by three
//! paths: copies between sibling tiles, a packed exchange with neighbor
//! ranks over a [`message::Communicator`], and a reflective fill on the
//! edge of the domain.

pub mod chunk;
pub mod config;
pub mod decompose;
pub mod error;
pub mod field;
pub mod grid;
pub mod halo;
pub mod hydro;
pub mod index_space;
pub mod kernels;
pub mod message;
pub mod profiler;
pub mod tile;

pub use config::Config;
pub use error::{Error, Result};
pub use hydro::Hydro;
