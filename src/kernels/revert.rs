use crate::tile::Tile;

/**
 * Restore the advanced density and energy to their start-of-step values,
 * discarding what the PdV predictor wrote.
 */
pub fn revert(tile: &mut Tile) {
    let interior = tile.interior();
    let f = &mut tile.fields;

    for i in interior.iter() {
        f.density1[i] = f.density0[i];
        f.energy1[i] = f.energy0[i];
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::kernels::testing::uniform_tile;

    #[test]
    fn interior_returns_to_level_zero() {
        let mut tile = uniform_tile(3, 1.0, 2.0);
        tile.fields.density1.fill(9.0);
        tile.fields.energy1.fill(9.0);
        revert(&mut tile);

        assert_eq!(tile.fields.density1[(2, 3)], 1.0);
        assert_eq!(tile.fields.energy1[(1, 1)], 2.0);
        assert_eq!(tile.fields.density1[(0, 1)], 9.0);
    }
}
