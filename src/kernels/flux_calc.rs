use crate::tile::Tile;

/**
 * Volume swept through each cell face over the step, from the time-centred
 * face velocity. X-faces cover `1..=x_max + 1` by `1..=y_max` and y-faces
 * `1..=x_max` by `1..=y_max + 1`.
 */
pub fn flux_calc(tile: &mut Tile, dt: f64) {
    let g = &tile.geometry;
    let f = &mut tile.fields;

    for k in 1..=tile.y_max {
        for j in 1..=tile.x_max + 1 {
            f.vol_flux_x[(j, k)] = 0.25 * dt * g.xarea[(j, k)] *
                (f.xvel0[(j, k)] + f.xvel0[(j, k + 1)] + f.xvel1[(j, k)] + f.xvel1[(j, k + 1)]);
        }
    }
    for k in 1..=tile.y_max + 1 {
        for j in 1..=tile.x_max {
            f.vol_flux_y[(j, k)] = 0.25 * dt * g.yarea[(j, k)] *
                (f.yvel0[(j, k)] + f.yvel0[(j + 1, k)] + f.yvel1[(j, k)] + f.yvel1[(j + 1, k)]);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::kernels::testing::uniform_tile;

    #[test]
    fn uniform_velocity_sweeps_area_times_distance() {
        let mut tile = uniform_tile(4, 1.0, 1.0);
        tile.fields.xvel0.fill(1.0);
        tile.fields.xvel1.fill(3.0);
        tile.fields.yvel1.fill(-2.0);
        flux_calc(&mut tile, 0.5);

        assert!((tile.fields.vol_flux_x[(5, 4)] - 0.25 * 2.0 * 0.5).abs() < 1e-15);
        assert!((tile.fields.vol_flux_y[(4, 5)] + 0.25 * 1.0 * 0.5).abs() < 1e-15);
        assert_eq!(tile.fields.vol_flux_x[(6, 4)], 0.0);
    }
}
