use rayon::prelude::*;

use crate::decompose::{Neighbor, Side};
use crate::field::{Depth, FieldId, FieldSelector};
use crate::tile::Tile;
use super::{along_range, EdgeMap};




/**
 * Ghost values for one field on one side of a tile, copied out of the
 * sibling tile across that side.
 */
struct Strip {
    field: FieldId,
    side: Side,
    values: Vec<f64>,
}




/**
 * Fill ghost layers between sibling tiles of one chunk. Bottom and top go
 * first, over the interior along-edge range; then left and right, over the
 * range widened by the depth, which picks up corner values written by the
 * first pass. Each pass gathers from an immutable view of all tiles and then
 * scatters into each tile, so both halves run in parallel.
 */
pub fn update_tile_halos(tiles: &mut [Tile], selector: &FieldSelector, depth: Depth) {
    copy_pass(tiles, &[Side::Bottom, Side::Top], selector, depth, 0);
    copy_pass(tiles, &[Side::Left, Side::Right], selector, depth, depth.get());
}

fn copy_pass(tiles: &mut [Tile], sides: &[Side], selector: &FieldSelector, depth: Depth, pad: i64) {
    let strips: Vec<Vec<Strip>> = (0..tiles.len())
        .into_par_iter()
        .map(|n| gather(tiles, n, sides, selector, depth, pad))
        .collect();

    tiles
        .par_iter_mut()
        .zip(strips)
        .for_each(|(tile, strips)| scatter(tile, strips, depth, pad));
}

fn gather(tiles: &[Tile], target: usize, sides: &[Side], selector: &FieldSelector, depth: Depth, pad: i64) -> Vec<Strip> {
    let tile = &tiles[target];
    let mut strips = Vec::new();

    for &side in sides {
        if let Neighbor::Internal(n) = tile.block.neighbors.get(side) {
            let source = &tiles[n];

            for field in selector.iter() {
                let stag = field.staggering();
                let edge = EdgeMap::edge(side.opposite(), source.extent(), stag);
                let array = source.fields.get(field);
                let mut values = Vec::new();

                for d in 1..=depth.get() {
                    for r in along_range(side, tile.extent(), stag, pad) {
                        values.push(array[edge.at(d, r)])
                    }
                }
                strips.push(Strip { field, side, values })
            }
        }
    }
    strips
}

fn scatter(tile: &mut Tile, strips: Vec<Strip>, depth: Depth, pad: i64) {
    let extent = tile.extent();

    for strip in strips {
        let stag = strip.field.staggering();
        let halo = EdgeMap::halo(strip.side, extent, stag);
        let array = tile.fields.get_mut(strip.field);
        let mut values = strip.values.into_iter();

        for d in 1..=depth.get() {
            for r in along_range(strip.side, extent, stag, pad) {
                if let Some(v) = values.next() {
                    array[halo.at(d, r)] = v
                }
            }
        }
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::*;
    use crate::chunk::Chunk;
    use crate::field::allocated_space;
    use crate::grid::Grid;

    /// Fill every interior entry of every tile with a function of its
    /// chunk-local position, so copied values can be checked by position.
    fn tagged_chunk(cells: (usize, usize), tiles: usize) -> Chunk {
        let grid = Grid { x_cells: cells.0, y_cells: cells.1, ..Grid::default() };
        let mut chunk = Chunk::for_rank(&grid, 0, 1, tiles).unwrap();
        let lower = chunk.block.lower;

        for tile in &mut chunk.tiles {
            let offset = (tile.block.lower.0 - lower.0, tile.block.lower.1 - lower.1);
            let extent = tile.extent();

            for &field in &FieldId::ALL {
                let (sx, sy) = field.staggering().offset();
                let array = tile.fields.get_mut(field);
                array.fill(f64::NAN);

                for k in 1..=extent.1 + sy {
                    for j in 1..=extent.0 + sx {
                        array[(j, k)] = position_value(field, j + offset.0, k + offset.1)
                    }
                }
            }
        }
        chunk
    }

    fn position_value(field: FieldId, j: i64, k: i64) -> f64 {
        (field.index() * 10000) as f64 + (j * 100 + k) as f64
    }

    #[test]
    fn sibling_ghosts_hold_neighbor_interior_values() {
        let mut chunk = tagged_chunk((9, 8), 4);
        let lower = chunk.block.lower;
        let upper = chunk.block.upper;
        update_tile_halos(&mut chunk.tiles, &FieldSelector::all(), Depth::Two);

        for tile in &chunk.tiles {
            let offset = (tile.block.lower.0 - lower.0, tile.block.lower.1 - lower.1);

            for &field in &FieldId::ALL {
                let (sx, sy) = field.staggering().offset();
                let array = tile.fields.get(field);
                let nodes_x = upper.0 - lower.0 + 1 + sx;
                let nodes_y = upper.1 - lower.1 + 1 + sy;

                for (j, k) in allocated_space(tile.x_max, tile.y_max, field.staggering()).iter() {
                    let (cj, ck) = (j + offset.0, k + offset.1);
                    let interior = (1..=tile.x_max + sx).contains(&j) && (1..=tile.y_max + sy).contains(&k);
                    let in_chunk = (1..=nodes_x).contains(&cj) && (1..=nodes_y).contains(&ck);

                    if interior || in_chunk {
                        assert_eq!(array[(j, k)], position_value(field, cj, ck), "{:?} at {:?}", field, (j, k));
                    }
                }
            }
        }
    }

    #[test]
    fn depth_one_leaves_the_second_layer_alone() {
        let mut chunk = tagged_chunk((8, 8), 4);
        update_tile_halos(&mut chunk.tiles, &FieldSelector::none().with(FieldId::Density0), Depth::One);

        let tile = &chunk.tiles[0];
        assert_eq!(tile.fields.density0[(5, 2)], position_value(FieldId::Density0, 5, 2));
        assert!(tile.fields.density0[(6, 2)].is_nan());
        assert!(tile.fields.energy0[(5, 2)].is_nan());
    }
}
