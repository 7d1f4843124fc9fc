use crate::tile::Tile;

/**
 * Artificial viscosity over the tile interior. Only cells in compression,
 * where the velocity field converges along the pressure gradient, get a
 * non-zero value, which smooths shock fronts without damping the rest of
 * the flow. Reads node velocities and pressure one layer into the halo.
 */
pub fn viscosity(tile: &mut Tile) {
    let interior = tile.interior();
    let g = &tile.geometry;
    let f = &mut tile.fields;

    for (j, k) in interior.iter() {
        let (dx, dy) = (g.celldx[j], g.celldy[k]);
        let ugrad = (f.xvel0[(j + 1, k)] + f.xvel0[(j + 1, k + 1)]) - (f.xvel0[(j, k)] + f.xvel0[(j, k + 1)]);
        let vgrad = (f.yvel0[(j, k + 1)] + f.yvel0[(j + 1, k + 1)]) - (f.yvel0[(j, k)] + f.yvel0[(j + 1, k)]);
        let div = dx * ugrad + dy * vgrad;

        let strain2 =
            0.5 * (f.xvel0[(j, k + 1)] + f.xvel0[(j + 1, k + 1)] - f.xvel0[(j, k)] - f.xvel0[(j + 1, k)]) / dy +
            0.5 * (f.yvel0[(j + 1, k)] + f.yvel0[(j + 1, k + 1)] - f.yvel0[(j, k)] - f.yvel0[(j, k + 1)]) / dx;

        let pgradx = (f.pressure[(j + 1, k)] - f.pressure[(j - 1, k)]) / (dx + g.celldx[j + 1]);
        let pgrady = (f.pressure[(j, k + 1)] - f.pressure[(j, k - 1)]) / (dy + g.celldy[k + 1]);
        let pgradx2 = pgradx * pgradx;
        let pgrady2 = pgrady * pgrady;

        let limiter = ((0.5 * ugrad / dx) * pgradx2 + (0.5 * vgrad / dy) * pgrady2 + strain2 * pgradx * pgrady)
            / f64::max(pgradx2 + pgrady2, 1.0e-16);

        f.viscosity[(j, k)] = if limiter > 0.0 || div >= 0.0 {
            0.0
        } else {
            let pgradx = pgradx.signum() * f64::max(1.0e-16, pgradx.abs());
            let pgrady = pgrady.signum() * f64::max(1.0e-16, pgrady.abs());
            let pgrad = (pgradx * pgradx + pgrady * pgrady).sqrt();
            let xgrad = (dx * pgrad / pgradx).abs();
            let ygrad = (dy * pgrad / pgrady).abs();
            let grad = f64::min(xgrad, ygrad);
            2.0 * f.density0[(j, k)] * grad * grad * limiter * limiter
        }
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::*;
    use crate::kernels::ideal_gas::ideal_gas;
    use crate::kernels::testing::uniform_tile;
    use crate::kernels::TimeLevel;

    #[test]
    fn expanding_flow_has_no_viscosity() {
        let mut tile = uniform_tile(6, 1.0, 1.0);
        for (j, k) in tile.fields.xvel0.index_space().clone().iter() {
            tile.fields.xvel0[(j, k)] = 0.1 * j as f64;
        }
        ideal_gas(&mut tile, TimeLevel::Start);
        viscosity(&mut tile);

        for i in tile.interior().iter() {
            assert_eq!(tile.fields.viscosity[i], 0.0);
        }
    }

    #[test]
    fn compression_against_the_pressure_gradient_is_viscous() {
        let mut tile = uniform_tile(6, 1.0, 1.0);
        for (j, k) in tile.fields.xvel0.index_space().clone().iter() {
            tile.fields.xvel0[(j, k)] = -0.1 * j as f64;
        }
        for (j, k) in tile.fields.pressure.index_space().clone().iter() {
            tile.fields.pressure[(j, k)] = j as f64;
        }
        viscosity(&mut tile);

        let (dx, dy) = (tile.geometry.celldx[3], tile.geometry.celldy[3]);
        let limiter = 0.5 * (-0.2) / dx;
        let expected = 2.0 * 1.0 * dx * dx * limiter * limiter;
        assert!(dy > 0.0);
        assert!((tile.fields.viscosity[(3, 3)] - expected).abs() < 1e-12 * expected);
    }
}
