use rayon::prelude::*;

use crate::chunk::Chunk;
use crate::decompose::{Neighbors, Side};
use crate::field::{Depth, FieldArray, FieldId, FieldSelector, Staggering};
use crate::tile::Tile;
use super::{along_range, EdgeMap};




/**
 * Where a reflected quantity mirrors about. Cell-centered data mirrors
 * across the cell face on the edge; node and face data mirrors about the
 * first index inside the edge, which for a staggered axis is the edge node
 * itself.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pivot {
    Face,
    Index,
}




/**
 * How one field reflects through one side of the domain.
 */
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reflection {
    pub pivot: Pivot,
    pub sign: f64,
}

impl Reflection {

    /**
     * The reflection rule for a field at a side. Vector components normal
     * to the side change sign; everything else is copied.
     */
    pub fn rule(field: FieldId, side: Side) -> Self {
        let pivot = match field.staggering() {
            Staggering::Cell => Pivot::Face,
            _ => Pivot::Index,
        };
        let sign = if field.component() == Some(side.axis()) { -1.0 } else { 1.0 };
        Self { pivot, sign }
    }

    /**
     * The interior entry which ghost layer `d` copies: layer `d` is
     * `halo.at(d, r)`, its source is `source.at(d, r)`.
     */
    fn source(&self, side: Side, extent: (i64, i64), staggering: Staggering) -> EdgeMap {
        let axis = side.axis();
        let top = axis.select(extent) + staggering.along(axis);

        match (side.is_lower(), self.pivot) {
            (true, Pivot::Face) => EdgeMap::new(axis, 0, 1),
            (true, Pivot::Index) => EdgeMap::new(axis, 1, 1),
            (false, Pivot::Face) => EdgeMap::new(axis, top + 1, -1),
            (false, Pivot::Index) => EdgeMap::new(axis, top, -1),
        }
    }
}




/**
 * Fill the ghost layers of one field on one side by reflecting the interior.
 * The along-edge range includes the corners, so sides applied later see the
 * corners written by sides applied earlier.
 */
pub fn reflect(array: &mut FieldArray, field: FieldId, side: Side, extent: (i64, i64), depth: Depth) {
    let stag = field.staggering();
    let rule = Reflection::rule(field, side);
    let halo = EdgeMap::halo(side, extent, stag);
    let source = rule.source(side, extent, stag);

    for r in along_range(side, extent, stag, depth.get()) {
        for d in 1..=depth.get() {
            array[halo.at(d, r)] = rule.sign * array[source.at(d, r)]
        }
    }
}




/**
 * Reflect the selected fields on every side of the tile which lies on the
 * edge of the global domain, meaning the side is external at both the tile
 * and the chunk level. Sides go bottom, top, left, right for each field.
 */
pub fn reflect_tile(tile: &mut Tile, chunk_neighbors: &Neighbors, selector: &FieldSelector, depth: Depth) {
    let extent = tile.extent();
    let sides: Vec<_> = [Side::Bottom, Side::Top, Side::Left, Side::Right]
        .iter()
        .cloned()
        .filter(|&s| tile.on_chunk_edge(s) && chunk_neighbors.is_external(s))
        .collect();

    for field in selector.iter() {
        for &side in &sides {
            reflect(tile.fields.get_mut(field), field, side, extent, depth)
        }
    }
}

pub fn update_boundary_halos(chunk: &mut Chunk, selector: &FieldSelector, depth: Depth) {
    let neighbors = &chunk.block.neighbors;
    chunk.tiles.par_iter_mut().for_each(|tile| reflect_tile(tile, neighbors, selector, depth));
}
