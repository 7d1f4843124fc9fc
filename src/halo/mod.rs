//! Halo updates. One call refreshes the ghost layers of every tile in a
//! chunk for a set of fields, in three stages which must run in this order:
//!
//! 1. copies between sibling tiles of the chunk ([`local`]),
//! 2. the packed message exchange with neighbor ranks ([`exchange`]),
//! 3. the reflective fill on the edge of the global domain ([`boundary`]).
//!
//! The later stages read ghost cells written by the earlier ones, which is
//! how corner values propagate.

pub mod boundary;
pub mod exchange;
pub mod local;

use core::ops::RangeInclusive;

use crate::chunk::Chunk;
use crate::decompose::Side;
use crate::error::Result;
use crate::field::{Depth, FieldSelector, Staggering};
use crate::index_space::Axis;
use crate::message::Communicator;
use crate::profiler::{Phase, Profiler};




/**
 * Maps a (layer, along-edge) pair near one side of a tile to tile-local
 * `(j, k)`. The index normal to the side is `origin + stride * layer`, and
 * the along-edge index passes through unchanged.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EdgeMap {
    normal: Axis,
    origin: i64,
    stride: i64,
}




// ============================================================================
impl EdgeMap {

    pub fn new(normal: Axis, origin: i64, stride: i64) -> Self {
        Self { normal, origin, stride }
    }

    pub fn at(&self, layer: i64, along: i64) -> (i64, i64) {
        let n = self.origin + self.stride * layer;
        match self.normal {
            Axis::I => (n, along),
            Axis::J => (along, n),
        }
    }

    /**
     * Ghost layer `d` beyond the given side: `1 - d` below the lower edge
     * and `max + s + d` above the upper one, so a staggered quantity's edge
     * node belongs to the interior.
     */
    pub fn halo(side: Side, extent: (i64, i64), staggering: Staggering) -> Self {
        let axis = side.axis();
        let s = staggering.along(axis);

        if side.is_lower() {
            Self::new(axis, 1, -1)
        } else {
            Self::new(axis, axis.select(extent) + s, 1)
        }
    }

    /**
     * Interior layer `d` inside the given side, i.e. the data which fills
     * the neighbor's ghost layer `d` on the far side of it. A shared edge
     * node is skipped since both neighbors own a copy.
     */
    pub fn edge(side: Side, extent: (i64, i64), staggering: Staggering) -> Self {
        let axis = side.axis();
        let s = staggering.along(axis);

        if side.is_lower() {
            Self::new(axis, s, 1)
        } else {
            Self::new(axis, axis.select(extent) + 1, -1)
        }
    }
}




/**
 * Along-edge index range for a side of a tile with the given extent: the
 * interior entries (including a staggered extra node) widened by `pad` on
 * both ends.
 */
pub fn along_range(side: Side, extent: (i64, i64), staggering: Staggering, pad: i64) -> RangeInclusive<i64> {
    let axis = side.axis().transverse();
    1 - pad ..= axis.select(extent) + staggering.along(axis) + pad
}




/**
 * Refresh the selected fields' ghost layers to the given depth on every tile
 * of the chunk. On return each ghost cell holds either a neighbor's data or a
 * reflected boundary value. Errors from the exchange are fatal to the job.
 */
pub fn update_halo<C: Communicator>(
    chunk: &mut Chunk,
    comm: &C,
    selector: &FieldSelector,
    depth: Depth,
    profiler: &mut Profiler) -> Result<()>
{
    if selector.is_empty() {
        return Ok(())
    }
    if chunk.tiles.len() > 1 {
        profiler.time(Phase::TileHalo, || local::update_tile_halos(&mut chunk.tiles, selector, depth));
    }
    profiler.time(Phase::MpiHalo, || exchange::exchange(chunk, comm, selector, depth))?;
    profiler.time(Phase::SelfHalo, || boundary::update_boundary_halos(chunk, selector, depth));
    Ok(())
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn ghost_and_edge_layers_line_up_across_a_shared_side() {
        // Tile A (4 wide) on the left of tile B (3 wide): A's right ghost
        // layers come from B's left edge, and B's left ghosts from A's right.
        for &stag in &[Staggering::Cell, Staggering::Vertex, Staggering::XFace] {
            let s = stag.along(Axis::I);
            let a_halo = EdgeMap::halo(Side::Right, (4, 5), stag);
            let b_edge = EdgeMap::edge(Side::Left, (3, 5), stag);
            let b_halo = EdgeMap::halo(Side::Left, (3, 5), stag);
            let a_edge = EdgeMap::edge(Side::Right, (4, 5), stag);

            for d in 1..=2 {
                // B's local j sits 4 to the right of A's local j.
                assert_eq!(a_halo.at(d, 2).0 - 4, b_edge.at(d, 2).0);
                assert_eq!(b_halo.at(d, 2).0 + 4, a_edge.at(d, 2).0);
                assert!(a_edge.at(d, 2).0 <= 4 && b_edge.at(d, 2).0 >= 1 + s);
            }
        }
    }

    #[test]
    fn along_range_covers_corners() {
        assert_eq!(along_range(Side::Left, (4, 6), Staggering::Vertex, 2), -1..=9);
        assert_eq!(along_range(Side::Bottom, (4, 6), Staggering::YFace, 0), 1..=4);
        assert_eq!(along_range(Side::Top, (4, 6), Staggering::XFace, 1), 0..=6);
    }
}
