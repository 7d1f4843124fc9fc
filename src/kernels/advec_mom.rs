use crate::index_space::Axis;
use crate::tile::{Scratch, Tile, TileFields};
use super::{oriented, Sweep};

/**
 * Remap one velocity component through the node-centred control volumes
 * along `direction`. Node mass fluxes are averaged from the face mass
 * fluxes the preceding cell remap wrote, and the node masses before and
 * after the sweep come from the cell volumes implied by the sweep order.
 */
pub fn advec_mom(tile: &mut Tile, velocity: Axis, direction: Axis, sweep: Sweep) {
    let (x_max, y_max) = tile.extent();
    let g = &tile.geometry;
    let TileFields { density1, xvel1, yvel1, vol_flux_x, vol_flux_y, mass_flux_x, mass_flux_y, .. } = &mut tile.fields;
    let Scratch { pre_vol, post_vol, node_flux, node_mass_post, node_mass_pre, mom_flux, .. } = &mut tile.scratch;

    for k in -1..=y_max + 2 {
        for j in -1..=x_max + 2 {
            let div_x = vol_flux_x[(j + 1, k)] - vol_flux_x[(j, k)];
            let div_y = vol_flux_y[(j, k + 1)] - vol_flux_y[(j, k)];
            let (along, across) = match direction {
                Axis::I => (div_x, div_y),
                Axis::J => (div_y, div_x),
            };
            let volume = g.volume[(j, k)];

            let post = match sweep {
                Sweep::First => volume + across,
                Sweep::Second => volume,
            };
            post_vol[(j, k)] = post;
            pre_vol[(j, k)] = post + along;
        }
    }

    let vel1 = match velocity {
        Axis::I => xvel1,
        Axis::J => yvel1,
    };
    let (mass_flux, width) = match direction {
        Axis::I => (&*mass_flux_x, &g.celldx),
        Axis::J => (&*mass_flux_y, &g.celldy),
    };
    let along_max = direction.select((x_max, y_max));
    let across_max = direction.transverse().select((x_max, y_max));
    let at = |a, c| oriented(direction, a, c);

    for c in 1..=across_max + 1 {
        for a in -1..=along_max + 2 {
            node_flux[at(a, c)] = 0.25 * (
                mass_flux[at(a, c - 1)] + mass_flux[at(a, c)] +
                mass_flux[at(a + 1, c - 1)] + mass_flux[at(a + 1, c)]);
        }
    }

    for c in 1..=across_max + 1 {
        for a in 0..=along_max + 2 {
            let post = 0.25 * (
                density1[at(a, c - 1)] * post_vol[at(a, c - 1)] +
                density1[at(a, c)] * post_vol[at(a, c)] +
                density1[at(a - 1, c - 1)] * post_vol[at(a - 1, c - 1)] +
                density1[at(a - 1, c)] * post_vol[at(a - 1, c)]);

            node_mass_post[at(a, c)] = post;
            node_mass_pre[at(a, c)] = post - node_flux[at(a - 1, c)] + node_flux[at(a, c)];
        }
    }

    for c in 1..=across_max + 1 {
        for a in 0..=along_max + 1 {
            let flux = node_flux[at(a, c)];

            let (upwind, donor, downwind, dif) = if flux < 0.0 {
                (a + 2, a + 1, a, a + 2)
            } else {
                (a - 1, a, a + 1, a - 1)
            };

            let sigma = flux.abs() / node_mass_pre[at(donor, c)];
            let vdiffuw = vel1[at(donor, c)] - vel1[at(upwind, c)];
            let vdiffdw = vel1[at(downwind, c)] - vel1[at(donor, c)];

            let limiter = if vdiffuw * vdiffdw > 0.0 {
                let auw = vdiffuw.abs();
                let adw = vdiffdw.abs();
                let wind = if vdiffdw <= 0.0 { -1.0 } else { 1.0 };
                let w = width[a];
                let bound = w * ((2.0 - sigma) * adw / w + (1.0 + sigma) * auw / width[dif]) / 6.0;
                wind * bound.min(auw).min(adw)
            } else {
                0.0
            };

            mom_flux[at(a, c)] = (vel1[at(donor, c)] + (1.0 - sigma) * limiter) * flux;
        }
    }

    for c in 1..=across_max + 1 {
        for a in 1..=along_max + 1 {
            let here = at(a, c);
            vel1[here] = (vel1[here] * node_mass_pre[here] + mom_flux[at(a - 1, c)] - mom_flux[here]) / node_mass_post[here];
        }
    }
}
