use crate::field::FieldArray;
use crate::tile::Tile;

/**
 * Advance node velocities over the step from the pressure and viscosity
 * gradients of the four surrounding cells. Each
 * node's mass is the average of the four cell masses around it. Covers
 * every node of the tile, `1..=x_max + 1` by `1..=y_max + 1`, reading
 * cell quantities one layer into the halo.
 */
pub fn accelerate(tile: &mut Tile, dt: f64) {
    let halfdt = 0.5 * dt;
    let g = &tile.geometry;
    let f = &mut tile.fields;

    for k in 1..=tile.y_max + 1 {
        for j in 1..=tile.x_max + 1 {
            let nodal_mass =
                f.density0[(j - 1, k - 1)] * g.volume[(j - 1, k - 1)] +
                f.density0[(j, k - 1)] * g.volume[(j, k - 1)] +
                f.density0[(j, k)] * g.volume[(j, k)] +
                f.density0[(j - 1, k)] * g.volume[(j - 1, k)];
            let step_by_mass = halfdt / (nodal_mass * 0.25);

            let xgrad = |q: &FieldArray| {
                g.xarea[(j, k)] * (q[(j, k)] - q[(j - 1, k)]) + g.xarea[(j, k - 1)] * (q[(j, k - 1)] - q[(j - 1, k - 1)])
            };
            let ygrad = |q: &FieldArray| {
                g.yarea[(j, k)] * (q[(j, k)] - q[(j, k - 1)]) + g.yarea[(j - 1, k)] * (q[(j - 1, k)] - q[(j - 1, k - 1)])
            };

            let xvel = f.xvel0[(j, k)] - step_by_mass * xgrad(&f.pressure) - step_by_mass * xgrad(&f.viscosity);
            let yvel = f.yvel0[(j, k)] - step_by_mass * ygrad(&f.pressure) - step_by_mass * ygrad(&f.viscosity);
            f.xvel1[(j, k)] = xvel;
            f.yvel1[(j, k)] = yvel;
        }
    }
}
