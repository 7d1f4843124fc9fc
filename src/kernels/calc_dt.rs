use std::fmt;

use crate::config::TimestepControls;
use crate::tile::Tile;
use super::{G_BIG, G_SMALL};




/**
 * What limited the timestep. The first four come from the stability
 * conditions evaluated per cell; the last two are applied by the driver
 * when the step would grow too fast or exceed the configured maximum.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Sound,
    XVel,
    YVel,
    Div,
    Expand,
    Max,
}

impl Control {
    pub const ALL: [Control; 6] = [
        Control::Sound,
        Control::XVel,
        Control::YVel,
        Control::Div,
        Control::Expand,
        Control::Max,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Control::Sound => "sound",
            Control::XVel => "xvel",
            Control::YVel => "yvel",
            Control::Div => "div",
            Control::Expand => "expand",
            Control::Max => "max",
        }
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}




/**
 * The smallest stable timestep found on a tile, the condition that set it,
 * and where: `local` is the tile-local cell, `cell` the same cell in global
 * indexes, and `position` its center.
 */
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimestepLimit {
    pub dt: f64,
    pub control: Control,
    pub local: (i64, i64),
    pub cell: (i64, i64),
    pub position: (f64, f64),
}




/**
 * Evaluate the sound-speed, velocity and divergence limits in every interior
 * cell and return the smallest. Ties go to the first candidate in k-major,
 * j-minor order, and within a cell in the order sound, xvel, yvel, div.
 */
pub fn calc_dt(tile: &Tile, controls: &TimestepControls) -> TimestepLimit {
    let g = &tile.geometry;
    let f = &tile.fields;
    let mut best = (G_BIG, Control::Sound, (1, 1));

    for (j, k) in tile.interior().iter() {
        let volume = g.volume[(j, k)];

        let cc = f.soundspeed[(j, k)] * f.soundspeed[(j, k)] + 2.0 * f.viscosity[(j, k)] / f.density0[(j, k)];
        let cc = f64::max(cc.sqrt(), G_SMALL);
        let dtct = controls.dtc_safe * f64::min(g.celldx[j], g.celldy[k]) / cc;

        let dv1 = (f.xvel0[(j, k)] + f.xvel0[(j, k + 1)]) * g.xarea[(j, k)];
        let dv2 = (f.xvel0[(j + 1, k)] + f.xvel0[(j + 1, k + 1)]) * g.xarea[(j + 1, k)];
        let mut div = dv2 - dv1;
        let dtut = controls.dtu_safe * 2.0 * volume / f64::max(f64::max(dv1.abs(), dv2.abs()), G_SMALL * volume);

        let dv1 = (f.yvel0[(j, k)] + f.yvel0[(j + 1, k)]) * g.yarea[(j, k)];
        let dv2 = (f.yvel0[(j, k + 1)] + f.yvel0[(j + 1, k + 1)]) * g.yarea[(j, k + 1)];
        div += dv2 - dv1;
        let dtvt = controls.dtv_safe * 2.0 * volume / f64::max(f64::max(dv1.abs(), dv2.abs()), G_SMALL * volume);

        let div = div / (2.0 * volume);
        let dtdivt = if div < -G_SMALL { controls.dtdiv_safe * (-1.0 / div) } else { G_BIG };

        for &(dt, control) in &[(dtct, Control::Sound), (dtut, Control::XVel), (dtvt, Control::YVel), (dtdivt, Control::Div)] {
            if dt < best.0 {
                best = (dt, control, (j, k))
            }
        }
    }

    let (dt, control, (j, k)) = best;
    TimestepLimit {
        dt,
        control,
        local: (j, k),
        cell: (j + tile.block.lower.0 - 1, k + tile.block.lower.1 - 1),
        position: (g.cellx[j], g.celly[k]),
    }
}




/**
 * The state around the cell which set a suspiciously small timestep.
 */
pub fn small_timestep_report(tile: &Tile, limit: &TimestepLimit) -> String {
    let f = &tile.fields;
    let (j, k) = limit.local;
    let nodes = [(j, k), (j + 1, k), (j + 1, k + 1), (j, k + 1)];
    let velocities: Vec<_> = nodes
        .iter()
        .map(|&n| format!("({:.6e}, {:.6e})", f.xvel0[n], f.yvel0[n]))
        .collect();

    format!(
        "timestep {:.6e} ({}) at cell {:?}, position ({:.6e}, {:.6e}); node velocities {}; density {:.6e} energy {:.6e} pressure {:.6e} soundspeed {:.6e}",
        limit.dt,
        limit.control,
        limit.cell,
        limit.position.0,
        limit.position.1,
        velocities.join(" "),
        f.density0[(j, k)],
        f.energy0[(j, k)],
        f.pressure[(j, k)],
        f.soundspeed[(j, k)])
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::*;
    use crate::kernels::ideal_gas::ideal_gas;
    use crate::kernels::testing::uniform_tile;
    use crate::kernels::TimeLevel;

    #[test]
    fn gas_at_rest_is_limited_by_sound_speed() {
        let mut tile = uniform_tile(5, 1.0, 2.5);
        ideal_gas(&mut tile, TimeLevel::Start);
        let controls = TimestepControls::default();
        let limit = calc_dt(&tile, &controls);

        let c = tile.fields.soundspeed[(1, 1)];
        let expected = controls.dtc_safe * 0.2 / c;
        assert_eq!(limit.control, Control::Sound);
        assert!((limit.dt - expected).abs() < 1e-14);
        assert_eq!(limit.cell, (1, 1));
        assert_eq!(limit.position, (0.1, 0.1));
    }

    #[test]
    fn a_fast_node_sets_the_limit_and_the_cell() {
        let mut tile = uniform_tile(5, 1.0, 2.5);
        ideal_gas(&mut tile, TimeLevel::Start);
        tile.fields.xvel0[(4, 3)] = 1000.0;
        let limit = calc_dt(&tile, &TimestepControls::default());

        assert_eq!(limit.control, Control::XVel);
        assert_eq!(limit.cell, (3, 2));
        let volume = 0.04;
        let expected = 0.5 * 2.0 * volume / (1000.0 * 0.2);
        assert!((limit.dt - expected).abs() < 1e-14);
        assert!(small_timestep_report(&tile, &limit).contains("xvel"));
    }
}
