use crate::error::{Error, Result};
use crate::index_space::{Axis, IndexSpace};




/**
 * One of the four sides of a rectangular block.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
    Bottom,
    Top,
}




// ============================================================================
impl Side {

    pub const ALL: [Side; 4] = [Side::Left, Side::Right, Side::Bottom, Side::Top];

    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
            Side::Bottom => 2,
            Side::Top => 3,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
            Side::Bottom => Side::Top,
            Side::Top => Side::Bottom,
        }
    }

    /**
     * The axis normal to this side.
     */
    pub fn axis(self) -> Axis {
        match self {
            Side::Left | Side::Right => Axis::I,
            Side::Bottom | Side::Top => Axis::J,
        }
    }

    pub fn is_lower(self) -> bool {
        matches!(self, Side::Left | Side::Bottom)
    }

    /**
     * Message tag for halo data travelling toward this side: data sent to
     * the left neighbor travels left and carries tag 1, and so on.
     */
    pub fn tag(self) -> u32 {
        match self {
            Side::Left => 1,
            Side::Right => 2,
            Side::Bottom => 3,
            Side::Top => 4,
        }
    }
}




/**
 * What lies across one side of a chunk or tile: either a block at the same
 * level (a chunk rank, or a sibling tile index within the chunk), or the
 * edge of the enclosing region.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Neighbor {
    Internal(usize),
    External,
}

impl Neighbor {
    pub fn is_external(&self) -> bool {
        matches!(self, Neighbor::External)
    }
}




/**
 * The four neighbor slots of a block, indexed by side.
 */
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Neighbors([Neighbor; 4]);

impl Neighbors {
    pub fn external() -> Self {
        Self([Neighbor::External; 4])
    }

    pub fn get(&self, side: Side) -> Neighbor {
        self.0[side.index()]
    }

    pub fn set(&mut self, side: Side, neighbor: Neighbor) {
        self.0[side.index()] = neighbor
    }

    pub fn is_external(&self, side: Side) -> bool {
        self.get(side).is_external()
    }
}




/**
 * A rectangular block of cells produced by the decomposer. Bounds are global
 * 1-based cell indexes and both ends are inclusive.
 */
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub id: usize,
    pub lower: (i64, i64),
    pub upper: (i64, i64),
    pub neighbors: Neighbors,
}




// ============================================================================
impl Block {

    pub fn cells(&self) -> (i64, i64) {
        (self.upper.0 - self.lower.0 + 1, self.upper.1 - self.lower.1 + 1)
    }

    pub fn index_space(&self) -> IndexSpace {
        IndexSpace::inclusive((self.lower.0, self.upper.0), (self.lower.1, self.upper.1))
    }

    /**
     * Number of cells along the given side.
     */
    pub fn edge_length(&self, side: Side) -> i64 {
        side.axis().transverse().select(self.cells())
    }
}




/**
 * Choose a `(count_x, count_y)` factoring of `count` blocks whose aspect
 * ratio best matches the mesh: the first divisor `c` (ascending) with
 * `(count / c) / c <= mesh_ratio` gives `count_y = c`. When no divisor fits,
 * or every block would be stacked vertically, fall back to a strip along the
 * longer axis.
 */
pub fn factorize(count: usize, mesh_ratio: f64) -> (usize, usize) {
    let found = (1..=count)
        .filter(|c| count % c == 0)
        .find(|&c| (count as f64 / c as f64) / c as f64 <= mesh_ratio)
        .map(|c| (count / c, c));

    match found {
        Some((_, y)) if y == count => strip(count, mesh_ratio),
        Some(split) => split,
        None => strip(count, mesh_ratio),
    }
}

fn strip(count: usize, mesh_ratio: f64) -> (usize, usize) {
    if mesh_ratio >= 1.0 {
        (count, 1)
    } else {
        (1, count)
    }
}




/**
 * Split `cells` into `parts` contiguous runs, the first `cells % parts` of
 * them one cell longer. Returns the offset and length of each run.
 */
fn split(cells: usize, parts: usize) -> Vec<(i64, i64)> {
    let delta = cells / parts;
    let extra = cells % parts;

    (0..parts)
        .map(|i| {
            let start = i * delta + i.min(extra);
            let len = delta + if i < extra { 1 } else { 0 };
            (start as i64, len as i64)
        })
        .collect()
}




/**
 * Decompose a block of `cells` whose lower-left cell is `origin` into
 * `count` sub-blocks. Sub-blocks are numbered row-major with x fastest, and
 * each gets the id of its neighbor on every side, or `External` where it
 * touches the edge of the enclosing block. This is used at both levels:
 * the global grid into chunks (ids are ranks), and a chunk into tiles (ids
 * are tile indexes).
 */
pub fn partition(cells: (usize, usize), origin: (i64, i64), count: usize) -> Result<Vec<Block>> {
    if count == 0 || cells.0 == 0 || cells.1 == 0 {
        return Err(Error::Decomposition { count, cells })
    }

    let (nx, ny) = factorize(count, cells.0 as f64 / cells.1 as f64);

    if nx > cells.0 || ny > cells.1 {
        return Err(Error::Decomposition { count, cells })
    }

    let runs_x = split(cells.0, nx);
    let runs_y = split(cells.1, ny);
    let mut blocks = Vec::with_capacity(count);

    for (cy, &(y0, ly)) in runs_y.iter().enumerate() {
        for (cx, &(x0, lx)) in runs_x.iter().enumerate() {
            let id = cy * nx + cx;
            let mut neighbors = Neighbors::external();

            if cx > 0 {
                neighbors.set(Side::Left, Neighbor::Internal(id - 1))
            }
            if cx + 1 < nx {
                neighbors.set(Side::Right, Neighbor::Internal(id + 1))
            }
            if cy > 0 {
                neighbors.set(Side::Bottom, Neighbor::Internal(id - nx))
            }
            if cy + 1 < ny {
                neighbors.set(Side::Top, Neighbor::Internal(id + nx))
            }

            blocks.push(Block {
                id,
                lower: (origin.0 + x0, origin.1 + y0),
                upper: (origin.0 + x0 + lx - 1, origin.1 + y0 + ly - 1),
                neighbors,
            })
        }
    }
    Ok(blocks)
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::*;

    fn assert_exact_cover(blocks: &[Block], lower: (i64, i64), cells: (usize, usize)) {
        let domain = IndexSpace::new(
            lower.0 .. lower.0 + cells.0 as i64,
            lower.1 .. lower.1 + cells.1 as i64);
        let mut hits = vec![0; domain.len()];

        for block in blocks {
            assert!(block.cells().0 > 0 && block.cells().1 > 0);
            assert!(domain.contains_space(&block.index_space()));
            for index in block.index_space().iter() {
                hits[domain.linear_offset(index)] += 1
            }
        }
        assert!(hits.iter().all(|&h| h == 1));
    }

    #[test]
    fn eight_by_eight_over_four_ranks_is_two_by_two() {
        let blocks = partition((8, 8), (1, 1), 4).unwrap();
        assert_eq!(factorize(4, 1.0), (2, 2));
        assert_eq!(blocks.len(), 4);
        assert!(blocks.iter().all(|b| b.cells() == (4, 4)));
        assert_eq!(blocks[0].lower, (1, 1));
        assert_eq!(blocks[3].upper, (8, 8));
        assert_eq!(blocks[0].neighbors.get(Side::Right), Neighbor::Internal(1));
        assert_eq!(blocks[0].neighbors.get(Side::Top), Neighbor::Internal(2));
        assert!(blocks[0].neighbors.is_external(Side::Left));
        assert!(blocks[0].neighbors.is_external(Side::Bottom));
        assert_eq!(blocks[3].neighbors.get(Side::Left), Neighbor::Internal(2));
        assert_eq!(blocks[3].neighbors.get(Side::Bottom), Neighbor::Internal(1));
    }

    #[test]
    fn blocks_exactly_cover_the_grid_for_many_shapes() {
        for &cells in &[(10, 10), (17, 5), (3, 40), (64, 64), (7, 7)] {
            for count in 1..=12 {
                let (nx, ny) = factorize(count, cells.0 as f64 / cells.1 as f64);
                assert_eq!(nx * ny, count);

                match partition(cells, (1, 1), count) {
                    Ok(blocks) => assert_exact_cover(&blocks, (1, 1), cells),
                    Err(_) => assert!(nx > cells.0 || ny > cells.1),
                }
            }
        }
    }

    #[test]
    fn tiles_exactly_cover_their_chunk() {
        for chunk in partition((30, 20), (1, 1), 6).unwrap() {
            let cells = (chunk.cells().0 as usize, chunk.cells().1 as usize);
            let tiles = partition(cells, chunk.lower, 4).unwrap();
            assert_exact_cover(&tiles, chunk.lower, cells);
        }
    }

    #[test]
    fn neighbor_links_are_symmetric() {
        let blocks = partition((12, 9), (1, 1), 6).unwrap();

        for block in &blocks {
            for &side in &Side::ALL {
                if let Neighbor::Internal(n) = block.neighbors.get(side) {
                    assert_eq!(blocks[n].neighbors.get(side.opposite()), Neighbor::Internal(block.id));
                    assert_eq!(block.edge_length(side), blocks[n].edge_length(side.opposite()));
                }
            }
        }
    }

    #[test]
    fn extra_cells_go_to_the_first_blocks() {
        let blocks = partition((10, 1), (1, 1), 3).unwrap();
        let widths: Vec<_> = blocks.iter().map(|b| b.cells().0).collect();
        assert_eq!(widths, vec![4, 3, 3]);
        assert_eq!(blocks[1].lower.0, 5);
    }

    #[test]
    fn fallback_strips_follow_the_long_axis() {
        assert_eq!(factorize(1, 1.0), (1, 1));
        assert_eq!(factorize(7, 1.0), (7, 1));
        assert_eq!(factorize(3, 0.5), (1, 3));
        assert_eq!(factorize(4, 4.0), (4, 1));
    }

    #[test]
    fn zero_width_blocks_are_an_error() {
        assert!(partition((2, 2), (1, 1), 5).is_err());
        assert!(partition((3, 3), (1, 1), 0).is_err());
    }
}
