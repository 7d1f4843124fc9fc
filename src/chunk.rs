use crate::decompose::{self, Block, Side};
use crate::error::{Error, Result};
use crate::field::{MAX_DEPTH, NUM_FIELDS};
use crate::grid::Grid;
use crate::tile::Tile;




/**
 * Flat send and receive buffers for the four sides of a chunk. Each side is
 * sized once for every field at the maximum depth, so no halo update ever
 * reallocates.
 */
#[derive(Clone, Debug)]
pub struct CommBuffers {
    send: [Vec<f64>; 4],
    recv: [Vec<f64>; 4],
}




// ============================================================================
impl CommBuffers {

    /**
     * Number of values one field contributes per ghost layer on a side whose
     * edge is `edge_length` cells long. The along-edge range covers the
     * cells, a staggered extra node, and the halo corners at both ends.
     */
    pub fn stride(edge_length: i64) -> usize {
        (edge_length + 5) as usize
    }

    pub fn new(block: &Block) -> Self {
        let size = |side: Side| NUM_FIELDS * MAX_DEPTH as usize * Self::stride(block.edge_length(side));
        let buffers = || [
            vec![0.0; size(Side::Left)],
            vec![0.0; size(Side::Right)],
            vec![0.0; size(Side::Bottom)],
            vec![0.0; size(Side::Top)],
        ];
        Self { send: buffers(), recv: buffers() }
    }

    pub fn send(&self, side: Side) -> &[f64] {
        &self.send[side.index()]
    }

    pub fn send_mut(&mut self, side: Side) -> &mut [f64] {
        &mut self.send[side.index()]
    }

    pub fn recv(&self, side: Side) -> &[f64] {
        &self.recv[side.index()]
    }

    pub fn recv_mut(&mut self, side: Side) -> &mut [f64] {
        &mut self.recv[side.index()]
    }
}




/**
 * The part of the grid owned by one rank. `block` holds the chunk's global
 * extent and its neighbor ranks; the tiles exactly partition it.
 */
#[derive(Clone, Debug)]
pub struct Chunk {
    pub block: Block,
    pub tiles: Vec<Tile>,
    pub buffers: CommBuffers,
}




// ============================================================================
impl Chunk {

    pub fn new(block: Block, tiles_per_chunk: usize) -> Result<Self> {
        let (nx, ny) = block.cells();
        let tiles = decompose::partition((nx as usize, ny as usize), block.lower, tiles_per_chunk)?
            .into_iter()
            .map(Tile::new)
            .collect();

        Ok(Self {
            buffers: CommBuffers::new(&block),
            block,
            tiles,
        })
    }

    /**
     * Decompose the grid over `size` ranks and build the chunk owned by
     * `rank`. Every rank computes the same decomposition independently.
     */
    pub fn for_rank(grid: &Grid, rank: usize, size: usize, tiles_per_chunk: usize) -> Result<Self> {
        let mut blocks = decompose::partition(grid.cells(), (1, 1), size)?;

        if rank >= blocks.len() {
            return Err(Error::Config(format!("rank {} is outside a group of {}", rank, size)))
        }
        Self::new(blocks.swap_remove(rank), tiles_per_chunk)
    }
}
