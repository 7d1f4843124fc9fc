use log::trace;

use crate::chunk::{Chunk, CommBuffers};
use crate::decompose::{Neighbor, Side};
use crate::error::{Error, Result};
use crate::field::{Depth, FieldId, FieldSelector, NUM_FIELDS};
use crate::message::{util, Communicator};
use super::{along_range, EdgeMap};




/**
 * Where each selected field starts in a side's message buffer. Both ends of
 * an exchange compute the same offsets, since a shared side has the same
 * length on either chunk.
 */
pub fn field_offsets(selector: &FieldSelector, depth: Depth, edge_length: i64) -> ([usize; NUM_FIELDS], usize) {
    let stride = depth.get() as usize * CommBuffers::stride(edge_length);
    let mut offsets = [0; NUM_FIELDS];
    let mut total = 0;

    for field in selector.iter() {
        offsets[field.index()] = total;
        total += stride;
    }
    (offsets, total)
}




/**
 * Position of ghost layer `layer` at chunk-local along-edge index `along`
 * within one field's block of a message buffer. Layers vary fastest and
 * the along-edge index starts at `1 - depth`.
 */
fn buffer_index(offset: usize, depth: Depth, along: i64, layer: i64) -> usize {
    let d = depth.get();
    offset + ((along - (1 - d)) * d + (layer - 1)) as usize
}

/**
 * Copy the selected fields from every tile on the given chunk edge into the
 * side's send buffer. Returns the number of values packed. Tiles overlap in
 * their ghost rows, and after the sibling copies those overlaps agree.
 */
pub fn pack(chunk: &mut Chunk, side: Side, selector: &FieldSelector, depth: Depth) -> usize {
    let (offsets, total) = field_offsets(selector, depth, chunk.block.edge_length(side));
    let buffer = chunk.buffers.send_mut(side);

    for tile in chunk.tiles.iter().filter(|t| t.on_chunk_edge(side)) {
        let shift = side.axis().transverse().select(tile.offset_in(&chunk.block));

        for field in selector.iter() {
            let stag = field.staggering();
            let edge = EdgeMap::edge(side, tile.extent(), stag);
            let array = tile.fields.get(field);

            for r in along_range(side, tile.extent(), stag, depth.get()) {
                for d in 1..=depth.get() {
                    buffer[buffer_index(offsets[field.index()], depth, r + shift, d)] = array[edge.at(d, r)]
                }
            }
        }
    }
    total
}




/**
 * Copy from the side's receive buffer into the ghost layers of every tile on
 * the given chunk edge.
 */
pub fn unpack(chunk: &mut Chunk, side: Side, selector: &FieldSelector, depth: Depth) {
    let (offsets, _) = field_offsets(selector, depth, chunk.block.edge_length(side));
    let buffer = chunk.buffers.recv(side);

    for tile in chunk.tiles.iter_mut().filter(|t| t.on_chunk_edge(side)) {
        let shift = side.axis().transverse().select(tile.offset_in(&chunk.block));
        let extent = tile.extent();

        for field in selector.iter() {
            let stag = field.staggering();
            let halo = EdgeMap::halo(side, extent, stag);
            let array = tile.fields.get_mut(field);

            for r in along_range(side, extent, stag, depth.get()) {
                for d in 1..=depth.get() {
                    array[halo.at(d, r)] = buffer[buffer_index(offsets[field.index()], depth, r + shift, d)]
                }
            }
        }
    }
}




/**
 * Exchange ghost layers with neighbor ranks. Left and right are packed,
 * sent, received and unpacked before bottom and top start, because the
 * bottom/top messages include the ghost columns just filled, which is how
 * corner values cross diagonally between ranks.
 */
pub fn exchange<C: Communicator>(chunk: &mut Chunk, comm: &C, selector: &FieldSelector, depth: Depth) -> Result<()> {
    for pair in &[[Side::Left, Side::Right], [Side::Bottom, Side::Top]] {
        for &side in pair {
            if let Neighbor::Internal(rank) = chunk.block.neighbors.get(side) {
                let total = pack(chunk, side, selector, depth);
                let message = util::encode_f64s(chunk.buffers.send(side)[..total].iter().cloned());
                trace!("sending {} values to rank {} ({:?})", total, rank, side);
                comm.send(rank, side.tag(), message)?;
            }
        }
        for &side in pair {
            if let Neighbor::Internal(rank) = chunk.block.neighbors.get(side) {
                let (_, expected) = field_offsets(selector, depth, chunk.block.edge_length(side));
                let values = util::decode_f64s(&comm.recv(rank, side.opposite().tag())?)?;

                if values.len() != expected {
                    return Err(Error::BufferSize { side, expected, received: values.len() })
                }
                chunk.buffers.recv_mut(side)[..expected].copy_from_slice(&values);
                unpack(chunk, side, selector, depth);
            }
        }
    }
    Ok(())
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::*;
    use crate::grid::Grid;
    use crate::halo::local::update_tile_halos;
    use crate::index_space::Axis;
    use crate::message::LocalCommunicator;
    use std::thread;

    fn fill_interior(chunk: &mut Chunk, f: impl Fn(FieldId, i64, i64) -> f64) {
        for tile in &mut chunk.tiles {
            let lower = tile.block.lower;
            for &field in &FieldId::ALL {
                let (sx, sy) = field.staggering().offset();
                let array = tile.fields.get_mut(field);
                array.fill(f64::NAN);
                for k in 1..=tile.y_max + sy {
                    for j in 1..=tile.x_max + sx {
                        array[(j, k)] = f(field, j + lower.0 - 1, k + lower.1 - 1)
                    }
                }
            }
        }
    }

    fn global_value(field: FieldId, j: i64, k: i64) -> f64 {
        (field.index() * 1000000) as f64 + (j * 1000 + k) as f64
    }

    #[test]
    fn offsets_skip_unselected_fields() {
        let selector = FieldSelector::none().with(FieldId::Energy1).with(FieldId::Density1).with(FieldId::MassFluxY);
        let (offsets, total) = field_offsets(&selector, Depth::Two, 10);
        assert_eq!(offsets[FieldId::Density1.index()], 0);
        assert_eq!(offsets[FieldId::Energy1.index()], 30);
        assert_eq!(offsets[FieldId::MassFluxY.index()], 60);
        assert_eq!(total, 90);
    }

    #[test]
    fn pack_then_unpack_is_bit_exact() {
        // A chunk whose right edge is packed and then unpacked into a
        // neighbor built from the same layout must see the sender's
        // interior layers, for every staggering and both depths.
        let grid = Grid { x_cells: 12, y_cells: 7, ..Grid::default() };

        for &depth in &[Depth::One, Depth::Two] {
            let mut left = Chunk::for_rank(&grid, 0, 2, 2).unwrap();
            let mut right = Chunk::for_rank(&grid, 1, 2, 2).unwrap();
            fill_interior(&mut left, |f, j, k| global_value(f, j, k) + 0.1);
            fill_interior(&mut right, |f, j, k| global_value(f, j, k) + 0.1);

            let selector = FieldSelector::all();
            update_tile_halos(&mut left.tiles, &selector, depth);
            update_tile_halos(&mut right.tiles, &selector, depth);
            let total = pack(&mut left, Side::Right, &selector, depth);
            let sent = left.buffers.send(Side::Right)[..total].to_vec();
            right.buffers.recv_mut(Side::Left)[..total].copy_from_slice(&sent);
            unpack(&mut right, Side::Left, &selector, depth);

            for tile in right.tiles.iter().filter(|t| t.on_chunk_edge(Side::Left)) {
                for &field in &FieldId::ALL {
                    let stag = field.staggering();
                    let halo = EdgeMap::halo(Side::Left, tile.extent(), stag);
                    let array = tile.fields.get(field);

                    for k in 1..=tile.y_max + stag.along(Axis::J) {
                        for d in 1..=depth.get() {
                            let (j, k) = halo.at(d, k);
                            let gj = j + tile.block.lower.0 - 1;
                            let gk = k + tile.block.lower.1 - 1;
                            assert_eq!(array[(j, k)].to_bits(), (global_value(field, gj, gk) + 0.1).to_bits());
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn four_ranks_fill_every_ghost_cell_inside_the_domain() {
        let grid = Grid { x_cells: 10, y_cells: 9, ..Grid::default() };

        let handles: Vec<_> = LocalCommunicator::group(4)
            .into_iter()
            .map(|comm| {
                let grid = grid.clone();
                thread::spawn(move || {
                    let mut chunk = Chunk::for_rank(&grid, comm.rank(), comm.size(), 2).unwrap();
                    fill_interior(&mut chunk, global_value);
                    update_tile_halos(&mut chunk.tiles, &FieldSelector::all(), Depth::Two);
                    exchange(&mut chunk, &comm, &FieldSelector::all(), Depth::Two).unwrap();
                    chunk
                })
            })
            .collect();

        for handle in handles {
            let chunk = handle.join().unwrap();

            for tile in &chunk.tiles {
                for &field in &FieldId::ALL {
                    let (sx, sy) = field.staggering().offset();
                    let array = tile.fields.get(field);

                    for (j, k) in crate::field::allocated_space(tile.x_max, tile.y_max, field.staggering()).iter() {
                        let gj = j + tile.block.lower.0 - 1;
                        let gk = k + tile.block.lower.1 - 1;

                        if (1..=10 + sx).contains(&gj) && (1..=9 + sy).contains(&gk) {
                            assert_eq!(array[(j, k)], global_value(field, gj, gk), "{:?} at {:?}", field, (gj, gk));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn short_messages_are_rejected() {
        let grid = Grid { x_cells: 4, y_cells: 2, ..Grid::default() };

        let handles: Vec<_> = LocalCommunicator::group(2)
            .into_iter()
            .map(|comm| {
                let grid = grid.clone();
                thread::spawn(move || {
                    let mut chunk = Chunk::for_rank(&grid, comm.rank(), comm.size(), 1).unwrap();
                    if comm.rank() == 0 {
                        comm.send(1, Side::Right.tag(), util::encode_f64s(vec![1.0; 3])).unwrap();
                        comm.recv(1, Side::Left.tag()).unwrap();
                        None
                    } else {
                        let selector = FieldSelector::none().with(FieldId::Density0);
                        Some(exchange(&mut chunk, &comm, &selector, Depth::One))
                    }
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        match &results[1] {
            Some(Err(Error::BufferSize { side: Side::Left, expected: 7, received: 3 })) => {}
            other => panic!("unexpected {:?}", other),
        }
    }
}
