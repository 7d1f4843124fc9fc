use crate::tile::Tile;

/**
 * Promote the advanced level to the start of the next step: density and
 * energy over the interior cells, velocities over every node.
 */
pub fn reset_field(tile: &mut Tile) {
    let interior = tile.interior();
    let f = &mut tile.fields;

    for i in interior.iter() {
        f.density0[i] = f.density1[i];
        f.energy0[i] = f.energy1[i];
    }
    for k in 1..=tile.y_max + 1 {
        for j in 1..=tile.x_max + 1 {
            f.xvel0[(j, k)] = f.xvel1[(j, k)];
            f.yvel0[(j, k)] = f.yvel1[(j, k)];
        }
    }
}
