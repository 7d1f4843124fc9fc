use crate::decompose::{Block, Side};
use crate::field::{allocated_space, AxisArray, FieldArray, FieldId, Staggering, MAX_DEPTH};
use crate::index_space::IndexSpace;




/**
 * The halo-exchanged quantities of one tile. Kernels borrow individual
 * members directly; halo code goes through `get` and `get_mut`.
 */
#[derive(Clone, Debug)]
pub struct TileFields {
    pub density0: FieldArray,
    pub density1: FieldArray,
    pub energy0: FieldArray,
    pub energy1: FieldArray,
    pub pressure: FieldArray,
    pub viscosity: FieldArray,
    pub soundspeed: FieldArray,
    pub xvel0: FieldArray,
    pub xvel1: FieldArray,
    pub yvel0: FieldArray,
    pub yvel1: FieldArray,
    pub vol_flux_x: FieldArray,
    pub vol_flux_y: FieldArray,
    pub mass_flux_x: FieldArray,
    pub mass_flux_y: FieldArray,
}




// ============================================================================
impl TileFields {

    pub fn new(x_max: i64, y_max: i64) -> Self {
        let array = |field: FieldId| FieldArray::new(allocated_space(x_max, y_max, field.staggering()));

        Self {
            density0: array(FieldId::Density0),
            density1: array(FieldId::Density1),
            energy0: array(FieldId::Energy0),
            energy1: array(FieldId::Energy1),
            pressure: array(FieldId::Pressure),
            viscosity: array(FieldId::Viscosity),
            soundspeed: array(FieldId::SoundSpeed),
            xvel0: array(FieldId::XVel0),
            xvel1: array(FieldId::XVel1),
            yvel0: array(FieldId::YVel0),
            yvel1: array(FieldId::YVel1),
            vol_flux_x: array(FieldId::VolFluxX),
            vol_flux_y: array(FieldId::VolFluxY),
            mass_flux_x: array(FieldId::MassFluxX),
            mass_flux_y: array(FieldId::MassFluxY),
        }
    }

    pub fn get(&self, field: FieldId) -> &FieldArray {
        use FieldId::*;

        match field {
            Density0 => &self.density0,
            Density1 => &self.density1,
            Energy0 => &self.energy0,
            Energy1 => &self.energy1,
            Pressure => &self.pressure,
            Viscosity => &self.viscosity,
            SoundSpeed => &self.soundspeed,
            XVel0 => &self.xvel0,
            XVel1 => &self.xvel1,
            YVel0 => &self.yvel0,
            YVel1 => &self.yvel1,
            VolFluxX => &self.vol_flux_x,
            VolFluxY => &self.vol_flux_y,
            MassFluxX => &self.mass_flux_x,
            MassFluxY => &self.mass_flux_y,
        }
    }

    pub fn get_mut(&mut self, field: FieldId) -> &mut FieldArray {
        use FieldId::*;

        match field {
            Density0 => &mut self.density0,
            Density1 => &mut self.density1,
            Energy0 => &mut self.energy0,
            Energy1 => &mut self.energy1,
            Pressure => &mut self.pressure,
            Viscosity => &mut self.viscosity,
            SoundSpeed => &mut self.soundspeed,
            XVel0 => &mut self.xvel0,
            XVel1 => &mut self.xvel1,
            YVel0 => &mut self.yvel0,
            YVel1 => &mut self.yvel1,
            VolFluxX => &mut self.vol_flux_x,
            VolFluxY => &mut self.vol_flux_y,
            MassFluxX => &mut self.mass_flux_x,
            MassFluxY => &mut self.mass_flux_y,
        }
    }
}




/**
 * Static mesh geometry of a tile: node and cell coordinates and widths along
 * each axis, cell volumes and face areas. Written once at setup. The 1D
 * arrays reach one entry past the deepest halo, since the momentum limiter
 * looks two nodes upwind of the last node it updates.
 */
#[derive(Clone, Debug)]
pub struct Geometry {
    pub vertexx: AxisArray,
    pub vertexy: AxisArray,
    pub vertexdx: AxisArray,
    pub vertexdy: AxisArray,
    pub cellx: AxisArray,
    pub celly: AxisArray,
    pub celldx: AxisArray,
    pub celldy: AxisArray,
    pub volume: FieldArray,
    pub xarea: FieldArray,
    pub yarea: FieldArray,
}

impl Geometry {
    pub fn new(x_max: i64, y_max: i64) -> Self {
        let lo = 1 - MAX_DEPTH;
        Self {
            vertexx: AxisArray::new(lo .. x_max + MAX_DEPTH + 3),
            vertexy: AxisArray::new(lo .. y_max + MAX_DEPTH + 3),
            vertexdx: AxisArray::new(lo .. x_max + MAX_DEPTH + 3),
            vertexdy: AxisArray::new(lo .. y_max + MAX_DEPTH + 3),
            cellx: AxisArray::new(lo .. x_max + MAX_DEPTH + 2),
            celly: AxisArray::new(lo .. y_max + MAX_DEPTH + 2),
            celldx: AxisArray::new(lo .. x_max + MAX_DEPTH + 2),
            celldy: AxisArray::new(lo .. y_max + MAX_DEPTH + 2),
            volume: FieldArray::new(allocated_space(x_max, y_max, Staggering::Cell)),
            xarea: FieldArray::new(allocated_space(x_max, y_max, Staggering::XFace)),
            yarea: FieldArray::new(allocated_space(x_max, y_max, Staggering::YFace)),
        }
    }
}




/**
 * Work arrays shared by the PdV and advection kernels. Node sized, so every
 * staggering fits.
 */
#[derive(Clone, Debug)]
pub struct Scratch {
    pub volume_change: FieldArray,
    pub pre_vol: FieldArray,
    pub post_vol: FieldArray,
    pub pre_mass: FieldArray,
    pub post_mass: FieldArray,
    pub advec_vol: FieldArray,
    pub post_ener: FieldArray,
    pub ener_flux: FieldArray,
    pub node_flux: FieldArray,
    pub node_mass_post: FieldArray,
    pub node_mass_pre: FieldArray,
    pub mom_flux: FieldArray,
}

impl Scratch {
    pub fn new(x_max: i64, y_max: i64) -> Self {
        let array = || FieldArray::new(allocated_space(x_max, y_max, Staggering::Vertex));
        Self {
            volume_change: array(),
            pre_vol: array(),
            post_vol: array(),
            pre_mass: array(),
            post_mass: array(),
            advec_vol: array(),
            post_ener: array(),
            ener_flux: array(),
            node_flux: array(),
            node_mass_post: array(),
            node_mass_pre: array(),
            mom_flux: array(),
        }
    }
}




/**
 * A tile: the unit of on-node parallel work. Local indexes run over
 * `1..=x_max` by `1..=y_max`, with halo layers outside. `block` records the
 * tile's global placement and its sibling tiles.
 */
#[derive(Clone, Debug)]
pub struct Tile {
    pub block: Block,
    pub x_max: i64,
    pub y_max: i64,
    pub fields: TileFields,
    pub geometry: Geometry,
    pub scratch: Scratch,
}




// ============================================================================
impl Tile {

    pub fn new(block: Block) -> Self {
        let (x_max, y_max) = block.cells();
        Self {
            block,
            x_max,
            y_max,
            fields: TileFields::new(x_max, y_max),
            geometry: Geometry::new(x_max, y_max),
            scratch: Scratch::new(x_max, y_max),
        }
    }

    pub fn extent(&self) -> (i64, i64) {
        (self.x_max, self.y_max)
    }

    /**
     * The interior cells, `1..=x_max` by `1..=y_max`.
     */
    pub fn interior(&self) -> IndexSpace {
        IndexSpace::inclusive((1, self.x_max), (1, self.y_max))
    }

    /**
     * Whether this tile lies on the given edge of its chunk. Only such tiles
     * take part in the inter-process exchange and the external boundary
     * fill on that side.
     */
    pub fn on_chunk_edge(&self, side: Side) -> bool {
        self.block.neighbors.is_external(side)
    }

    /**
     * Offset of tile-local indexes from chunk-local indexes: chunk-local
     * `(j, k)` is tile-local `(j, k)` plus this offset.
     */
    pub fn offset_in(&self, chunk: &Block) -> (i64, i64) {
        (self.block.lower.0 - chunk.lower.0, self.block.lower.1 - chunk.lower.1)
    }
}
