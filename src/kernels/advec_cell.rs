use crate::index_space::Axis;
use crate::tile::{Scratch, Tile, TileFields};
use super::{oriented, Sweep};

const ONE_BY_SIX: f64 = 1.0 / 6.0;

/**
 * Van Leer limited correction to the donor value, from the upwind, donor
 * and downwind values of a quantity. Zero at extrema.
 */
fn limited(upwind: f64, donor: f64, downwind: f64, sigma: f64, sigma3: f64, sigma4: f64) -> f64 {
    let diffuw = donor - upwind;
    let diffdw = downwind - donor;
    let wind = if diffdw <= 0.0 { -1.0 } else { 1.0 };

    if diffuw * diffdw > 0.0 {
        let bound = ONE_BY_SIX * (sigma3 * diffuw.abs() + sigma4 * diffdw.abs());
        (1.0 - sigma) * wind * diffuw.abs().min(diffdw.abs()).min(bound)
    } else {
        0.0
    }
}

/**
 * Remap density and energy through the cell faces normal to `axis`, using
 * the volume fluxes from the Lagrangian step. Writes the face mass fluxes
 * for the momentum remap that follows.
 *
 * The cell volume before the sweep depends on which sweep this is: the
 * first sweep starts from the fully displaced volume, the second from the
 * volume displaced along its own axis only.
 */
pub fn advec_cell(tile: &mut Tile, sweep: Sweep, axis: Axis) {
    let (x_max, y_max) = tile.extent();
    let g = &tile.geometry;
    let TileFields { density1, energy1, vol_flux_x, vol_flux_y, mass_flux_x, mass_flux_y, .. } = &mut tile.fields;
    let Scratch { pre_vol, pre_mass, post_mass, post_ener, advec_vol, ener_flux, .. } = &mut tile.scratch;

    for k in -1..=y_max + 2 {
        for j in -1..=x_max + 2 {
            let div_x = vol_flux_x[(j + 1, k)] - vol_flux_x[(j, k)];
            let div_y = vol_flux_y[(j, k + 1)] - vol_flux_y[(j, k)];

            pre_vol[(j, k)] = match sweep {
                Sweep::First => g.volume[(j, k)] + (div_x + div_y),
                Sweep::Second => g.volume[(j, k)] + axis.select((div_x, div_y)),
            };
        }
    }

    let (vol_flux, mass_flux, vertexd) = match axis {
        Axis::I => (&*vol_flux_x, mass_flux_x, &g.vertexdx),
        Axis::J => (&*vol_flux_y, mass_flux_y, &g.vertexdy),
    };
    let along_max = axis.select((x_max, y_max));
    let across_max = axis.transverse().select((x_max, y_max));
    let at = |a, c| oriented(axis, a, c);

    for c in 1..=across_max {
        for a in 1..=along_max + 2 {
            let flux = vol_flux[at(a, c)];

            let (upwind, donor, downwind, dif) = if flux > 0.0 {
                (a - 2, a - 1, a, a - 1)
            } else {
                let upwind = i64::min(a + 1, along_max + 2);
                (upwind, a, a - 1, upwind)
            };

            let sigmat = flux.abs() / pre_vol[at(donor, c)];
            let sigma3 = (1.0 + sigmat) * (vertexd[a] / vertexd[dif]);
            let sigma4 = 2.0 - sigmat;

            let density_donor = density1[at(donor, c)];
            let mass = flux * (density_donor + limited(
                density1[at(upwind, c)], density_donor, density1[at(downwind, c)], sigmat, sigma3, sigma4));
            let sigmam = mass.abs() / (density_donor * pre_vol[at(donor, c)]);
            let energy_donor = energy1[at(donor, c)];

            mass_flux[at(a, c)] = mass;
            ener_flux[at(a, c)] = mass * (energy_donor + limited(
                energy1[at(upwind, c)], energy_donor, energy1[at(downwind, c)], sigmam, sigma3, sigma4));
        }
    }

    for c in 1..=across_max {
        for a in 1..=along_max {
            let (here, next) = (at(a, c), at(a + 1, c));

            pre_mass[here] = density1[here] * pre_vol[here];
            post_mass[here] = pre_mass[here] + mass_flux[here] - mass_flux[next];
            post_ener[here] = (energy1[here] * pre_mass[here] + ener_flux[here] - ener_flux[next]) / post_mass[here];
            advec_vol[here] = pre_vol[here] + vol_flux[here] - vol_flux[next];
            density1[here] = post_mass[here] / advec_vol[here];
            energy1[here] = post_ener[here];
        }
    }
}
