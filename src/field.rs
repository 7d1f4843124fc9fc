use core::ops::{Index, IndexMut, Range};
use crate::index_space::{Axis, IndexSpace};




/**
 * Number of fields which take part in halo updates.
 */
pub const NUM_FIELDS: usize = 15;

/**
 * Deepest halo any update asks for. Field arrays carry this many ghost
 * layers (plus one more on the upper side for staggered quantities).
 */
pub const MAX_DEPTH: i64 = 2;




/**
 * The fields which take part in halo updates, in the fixed order used to lay
 * them out in message buffers.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldId {
    Density0,
    Density1,
    Energy0,
    Energy1,
    Pressure,
    Viscosity,
    SoundSpeed,
    XVel0,
    XVel1,
    YVel0,
    YVel1,
    VolFluxX,
    VolFluxY,
    MassFluxX,
    MassFluxY,
}




// ============================================================================
impl FieldId {

    pub const ALL: [FieldId; NUM_FIELDS] = [
        FieldId::Density0,
        FieldId::Density1,
        FieldId::Energy0,
        FieldId::Energy1,
        FieldId::Pressure,
        FieldId::Viscosity,
        FieldId::SoundSpeed,
        FieldId::XVel0,
        FieldId::XVel1,
        FieldId::YVel0,
        FieldId::YVel1,
        FieldId::VolFluxX,
        FieldId::VolFluxY,
        FieldId::MassFluxX,
        FieldId::MassFluxY,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn staggering(self) -> Staggering {
        use FieldId::*;

        match self {
            Density0 | Density1 | Energy0 | Energy1 | Pressure | Viscosity | SoundSpeed => Staggering::Cell,
            XVel0 | XVel1 | YVel0 | YVel1 => Staggering::Vertex,
            VolFluxX | MassFluxX => Staggering::XFace,
            VolFluxY | MassFluxY => Staggering::YFace,
        }
    }

    /**
     * The axis along which this field is a vector component, if any. The
     * sign of such a field flips when it is reflected through a boundary
     * normal to that axis.
     */
    pub fn component(self) -> Option<Axis> {
        use FieldId::*;

        match self {
            XVel0 | XVel1 | VolFluxX | MassFluxX => Some(Axis::I),
            YVel0 | YVel1 | VolFluxY | MassFluxY => Some(Axis::J),
            _ => None,
        }
    }
}




/**
 * Where a quantity lives on the staggered mesh. Node and face quantities
 * have one more entry than cells along each staggered axis.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Staggering {
    Cell,
    Vertex,
    XFace,
    YFace,
}

impl Staggering {
    pub fn offset(self) -> (i64, i64) {
        match self {
            Staggering::Cell => (0, 0),
            Staggering::Vertex => (1, 1),
            Staggering::XFace => (1, 0),
            Staggering::YFace => (0, 1),
        }
    }

    pub fn along(self, axis: Axis) -> i64 {
        axis.select(self.offset())
    }
}




/**
 * Selects the fields a halo update applies to.
 */
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FieldSelector([bool; NUM_FIELDS]);

impl FieldSelector {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self([true; NUM_FIELDS])
    }

    pub fn with(mut self, field: FieldId) -> Self {
        self.0[field.index()] = true;
        self
    }

    pub fn contains(&self, field: FieldId) -> bool {
        self.0[field.index()]
    }

    pub fn is_empty(&self) -> bool {
        !self.0.iter().any(|&s| s)
    }

    /**
     * Iterate the selected fields in buffer order.
     */
    pub fn iter(&self) -> impl Iterator<Item = FieldId> + '_ {
        FieldId::ALL.iter().cloned().filter(move |f| self.contains(*f))
    }
}

impl From<&[FieldId]> for FieldSelector {
    fn from(fields: &[FieldId]) -> Self {
        fields.iter().fold(Self::none(), |s, &f| s.with(f))
    }
}




/**
 * Number of ghost layers a halo update fills.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Depth {
    One,
    Two,
}

impl Depth {
    pub fn get(self) -> i64 {
        match self {
            Depth::One => 1,
            Depth::Two => 2,
        }
    }
}




/**
 * Index space a tile with `x_max` by `y_max` cells allocates for a quantity
 * with the given staggering: `1 - MAX_DEPTH ..= max + MAX_DEPTH + s` on each
 * axis.
 */
pub fn allocated_space(x_max: i64, y_max: i64, staggering: Staggering) -> IndexSpace {
    let (sx, sy) = staggering.offset();
    IndexSpace::inclusive(
        (1 - MAX_DEPTH, x_max + MAX_DEPTH + sx),
        (1 - MAX_DEPTH, y_max + MAX_DEPTH + sy))
}




/**
 * A dense 2D array of `f64` addressed by signed logical `(j, k)` indexes.
 */
#[derive(Clone, Debug, PartialEq)]
pub struct FieldArray {
    space: IndexSpace,
    data: Vec<f64>,
}




// ============================================================================
impl FieldArray {

    pub fn new(space: IndexSpace) -> Self {
        Self::filled(space, 0.0)
    }

    pub fn filled(space: IndexSpace, value: f64) -> Self {
        Self { data: vec![value; space.len()], space }
    }

    pub fn index_space(&self) -> &IndexSpace {
        &self.space
    }

    pub fn fill(&mut self, value: f64) {
        for x in &mut self.data {
            *x = value
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

impl Index<(i64, i64)> for FieldArray {
    type Output = f64;

    fn index(&self, index: (i64, i64)) -> &f64 {
        debug_assert!(self.space.contains(index), "{:?} outside {:?}", index, self.space);
        &self.data[self.space.linear_offset(index)]
    }
}

impl IndexMut<(i64, i64)> for FieldArray {
    fn index_mut(&mut self, index: (i64, i64)) -> &mut f64 {
        debug_assert!(self.space.contains(index), "{:?} outside {:?}", index, self.space);
        &mut self.data[self.space.linear_offset(index)]
    }
}




/**
 * A 1D array over one axis, for the per-row and per-column geometry.
 */
#[derive(Clone, Debug, PartialEq)]
pub struct AxisArray {
    start: i64,
    data: Vec<f64>,
}

impl AxisArray {
    pub fn new(range: Range<i64>) -> Self {
        Self { start: range.start, data: vec![0.0; (range.end - range.start) as usize] }
    }

    pub fn range(&self) -> Range<i64> {
        self.start .. self.start + self.data.len() as i64
    }
}

impl Index<i64> for AxisArray {
    type Output = f64;

    fn index(&self, i: i64) -> &f64 {
        &self.data[(i - self.start) as usize]
    }
}

impl IndexMut<i64> for AxisArray {
    fn index_mut(&mut self, i: i64) -> &mut f64 {
        &mut self.data[(i - self.start) as usize]
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn selector_iterates_in_buffer_order() {
        let selector = FieldSelector::from(&[FieldId::YVel0, FieldId::Density0, FieldId::Pressure][..]);
        let fields: Vec<_> = selector.iter().collect();
        assert_eq!(fields, vec![FieldId::Density0, FieldId::Pressure, FieldId::YVel0]);
        assert!(FieldSelector::none().is_empty());
        assert_eq!(FieldSelector::all().iter().count(), NUM_FIELDS);
    }

    #[test]
    fn field_order_matches_enumeration() {
        for (n, field) in FieldId::ALL.iter().enumerate() {
            assert_eq!(field.index(), n)
        }
    }

    #[test]
    fn staggered_arrays_carry_an_extra_upper_entry() {
        let cell = allocated_space(4, 3, Staggering::Cell);
        let node = allocated_space(4, 3, Staggering::Vertex);
        let xface = allocated_space(4, 3, Staggering::XFace);
        assert_eq!(cell.start(), (-1, -1));
        assert_eq!(cell.end(), (7, 6));
        assert_eq!(node.end(), (8, 7));
        assert_eq!(xface.end(), (8, 6));
    }

    #[test]
    fn field_array_addresses_negative_indexes() {
        let mut array = FieldArray::new(allocated_space(2, 2, Staggering::Cell));
        array[(-1, -1)] = 1.0;
        array[(4, 4)] = 2.0;
        assert_eq!(array.as_slice()[0], 1.0);
        assert_eq!(*array.as_slice().last().unwrap(), 2.0);

        let mut axis = AxisArray::new(-1..5);
        axis[-1] = 3.0;
        assert_eq!(axis[-1], 3.0);
        assert_eq!(axis.range(), -1..5);
    }
}
