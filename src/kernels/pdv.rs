use crate::error::{Error, Result};
use crate::tile::Tile;

/**
 * Advance density and energy through the compression or expansion of each
 * cell by its face velocities. The predictor covers half a step using the
 * start-of-step velocities; the corrector covers the full step using the
 * average of the start and advanced velocities. Energy changes by the
 * pressure-plus-viscosity work done on the cell.
 *
 * A cell whose volume would become non-positive, as a whole or along
 * either axis alone, fails the step with `Error::NegativeVolume`.
 */
pub fn pdv(tile: &mut Tile, predict: bool, dt: f64) -> Result<()> {
    let interior = tile.interior();
    let lower = tile.block.lower;
    let g = &tile.geometry;
    let f = &mut tile.fields;
    let volume_change = &mut tile.scratch.volume_change;

    let (xvel1, yvel1, factor) = if predict {
        (&f.xvel0, &f.yvel0, 0.25 * dt * 0.5)
    } else {
        (&f.xvel1, &f.yvel1, 0.25 * dt)
    };
    let (xvel0, yvel0) = (&f.xvel0, &f.yvel0);

    for (j, k) in interior.iter() {
        let left_flux = g.xarea[(j, k)] * (xvel0[(j, k)] + xvel0[(j, k + 1)] + xvel1[(j, k)] + xvel1[(j, k + 1)]) * factor;
        let right_flux = g.xarea[(j + 1, k)] * (xvel0[(j + 1, k)] + xvel0[(j + 1, k + 1)] + xvel1[(j + 1, k)] + xvel1[(j + 1, k + 1)]) * factor;
        let bottom_flux = g.yarea[(j, k)] * (yvel0[(j, k)] + yvel0[(j + 1, k)] + yvel1[(j, k)] + yvel1[(j + 1, k)]) * factor;
        let top_flux = g.yarea[(j, k + 1)] * (yvel0[(j, k + 1)] + yvel0[(j + 1, k + 1)] + yvel1[(j, k + 1)] + yvel1[(j + 1, k + 1)]) * factor;
        let total_flux = right_flux - left_flux + top_flux - bottom_flux;
        let volume = g.volume[(j, k)];

        let min_cell_volume = f64::min(
            volume + total_flux,
            f64::min(volume + right_flux - left_flux, volume + top_flux - bottom_flux));

        if min_cell_volume <= 0.0 {
            return Err(Error::NegativeVolume {
                cell: (j + lower.0 - 1, k + lower.1 - 1),
                volume: min_cell_volume,
            })
        }

        let change = volume / (volume + total_flux);
        let density0 = f.density0[(j, k)];
        let energy_change = (f.pressure[(j, k)] / density0 + f.viscosity[(j, k)] / density0) * total_flux / volume;

        volume_change[(j, k)] = change;
        f.energy1[(j, k)] = f.energy0[(j, k)] - energy_change;
        f.density1[(j, k)] = density0 * change;
    }
    Ok(())
}
