use core::ops::Range;




/**
 * Identifier for a Cartesian axis. `I` runs along x (the `j` index of a tile)
 * and `J` runs along y (the `k` index).
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    I,
    J,
}




// ============================================================================
impl Axis {

    /**
     * Return the other axis.
     */
    pub fn transverse(self) -> Self {
        match self {
            Axis::I => Axis::J,
            Axis::J => Axis::I,
        }
    }

    /**
     * Pick the component of a pair belonging to this axis.
     */
    pub fn select<T>(self, pair: (T, T)) -> T {
        match self {
            Axis::I => pair.0,
            Axis::J => pair.1,
        }
    }
}




/**
 * Represents a rectangular region in a discrete index space. Tile-local
 * indexes are signed, because halo cells sit at zero and negative indexes
 * beyond the lower edges.
 */
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexSpace {
    di: Range<i64>,
    dj: Range<i64>,
}




// ============================================================================
impl IndexSpace {


    pub fn new(di: Range<i64>, dj: Range<i64>) -> Self {

        assert!(
            di.start <= di.end && dj.start <= dj.end,
            "index space has negative volume");

        Self { di, dj }
    }


    /**
     * Build an index space from inclusive bounds on each axis, which is the
     * way tile extents and loop ranges are usually written.
     */
    pub fn inclusive(i: (i64, i64), j: (i64, i64)) -> Self {
        Self::new(i.0 .. i.1 + 1, j.0 .. j.1 + 1)
    }


    /**
     * Return the number of indexes on each axis.
     */
    pub fn dim(&self) -> (usize, usize) {
        ((self.di.end - self.di.start) as usize,
         (self.dj.end - self.dj.start) as usize)
    }


    /**
     * Return the number of elements in this index space.
     */
    pub fn len(&self) -> usize {
        let (l, m) = self.dim();
        l * m
    }


    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }


    /**
     * Return the minimum index (inclusive).
     */
    pub fn start(&self) -> (i64, i64) {
        (self.di.start, self.dj.start)
    }


    /**
     * Return the maximum index (exclusive).
     */
    pub fn end(&self) -> (i64, i64) {
        (self.di.end, self.dj.end)
    }


    /**
     * Return the index range along one axis.
     */
    pub fn range(&self, axis: Axis) -> Range<i64> {
        match axis {
            Axis::I => self.di.clone(),
            Axis::J => self.dj.clone(),
        }
    }


    /**
     * Determine whether this index space contains the given index.
     */
    pub fn contains(&self, index: (i64, i64)) -> bool {
        self.di.contains(&index.0) && self.dj.contains(&index.1)
    }


    /**
     * Determine whether another index space is a subset of this one.
     */
    pub fn contains_space(&self, other: &Self) -> bool {
        other.di.start >= self.di.start && other.di.end <= self.di.end &&
        other.dj.start >= self.dj.start && other.dj.end <= self.dj.end
    }


    /**
     * Return the linear offset for the given index, in a memory buffer
     * aligned with the start of this index space, where the first index
     * increases fastest. Kernels loop `k` outer and `j` inner, so this keeps
     * their inner loops contiguous.
     */
    pub fn linear_offset(&self, index: (i64, i64)) -> usize {
        let i = (index.0 - self.di.start) as usize;
        let j = (index.1 - self.dj.start) as usize;
        let l = (self.di.end - self.di.start) as usize;
        j * l + i
    }


    /**
     * Return an iterator which traverses the index space with the first
     * index increasing fastest, matching `linear_offset`.
     */
    pub fn iter(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.dj.clone().flat_map(move |j| self.di.clone().map(move |i| (i, j)))
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::{Axis, IndexSpace};

    #[test]
    fn linear_offset_runs_first_index_fastest() {
        let space = IndexSpace::new(-1..3, -1..2);
        assert_eq!(space.linear_offset((-1, -1)), 0);
        assert_eq!(space.linear_offset((0, -1)), 1);
        assert_eq!(space.linear_offset((-1, 0)), 4);
        assert_eq!(space.linear_offset((2, 1)), space.len() - 1);
    }

    #[test]
    fn iteration_agrees_with_linear_offset() {
        let space = IndexSpace::inclusive((-2, 4), (-2, 3));
        for (n, index) in space.iter().enumerate() {
            assert_eq!(space.linear_offset(index), n);
        }
    }

    #[test]
    fn axis_ranges_and_containment() {
        let cells = IndexSpace::inclusive((1, 4), (1, 3));
        let nodes = IndexSpace::inclusive((1, 5), (1, 4));
        assert_eq!(cells.dim(), (4, 3));
        assert_eq!(nodes.range(Axis::J), 1..5);
        assert!(nodes.contains_space(&cells));
        assert!(!cells.contains_space(&nodes));
        assert!(IndexSpace::new(3..3, 0..4).is_empty());
    }
}
