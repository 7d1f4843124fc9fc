use serde::{Deserialize, Serialize};

use crate::tile::Tile;




/**
 * Totals over a region of the mesh: volume, mass, volume-weighted pressure,
 * internal and kinetic energy. Summaries of disjoint regions combine with
 * `merge`, which is associative and commutative, so tiles and ranks can be
 * reduced in any grouping.
 */
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub volume: f64,
    pub mass: f64,
    pub pressure: f64,
    pub internal_energy: f64,
    pub kinetic_energy: f64,
}




// ============================================================================
impl Summary {

    pub const LEN: usize = 5;

    pub fn merge(self, other: Self) -> Self {
        Self {
            volume: self.volume + other.volume,
            mass: self.mass + other.mass,
            pressure: self.pressure + other.pressure,
            internal_energy: self.internal_energy + other.internal_energy,
            kinetic_energy: self.kinetic_energy + other.kinetic_energy,
        }
    }

    pub fn to_array(&self) -> [f64; Self::LEN] {
        [self.volume, self.mass, self.pressure, self.internal_energy, self.kinetic_energy]
    }

    pub fn from_slice(values: &[f64]) -> Option<Self> {
        match *values {
            [volume, mass, pressure, internal_energy, kinetic_energy] => {
                Some(Self { volume, mass, pressure, internal_energy, kinetic_energy })
            }
            _ => None,
        }
    }

    pub fn density(&self) -> f64 {
        self.mass / self.volume
    }

    pub fn mean_pressure(&self) -> f64 {
        self.pressure / self.volume
    }

    pub fn total_energy(&self) -> f64 {
        self.internal_energy + self.kinetic_energy
    }
}




/**
 * Sum the start-of-step state over the tile interior. Pressure must be
 * current for the level 0 density and energy. A cell's kinetic energy uses
 * the mean squared speed of its four nodes.
 */
pub fn field_summary(tile: &Tile) -> Summary {
    let g = &tile.geometry;
    let f = &tile.fields;

    tile.interior().iter().fold(Summary::default(), |total, (j, k)| {
        let mut vsqrd = 0.0;
        for kv in k..=k + 1 {
            for jv in j..=j + 1 {
                vsqrd += 0.25 * (f.xvel0[(jv, kv)] * f.xvel0[(jv, kv)] + f.yvel0[(jv, kv)] * f.yvel0[(jv, kv)]);
            }
        }
        let volume = g.volume[(j, k)];
        let mass = volume * f.density0[(j, k)];

        total.merge(Summary {
            volume,
            mass,
            pressure: volume * f.pressure[(j, k)],
            internal_energy: mass * f.energy0[(j, k)],
            kinetic_energy: mass * 0.5 * vsqrd,
        })
    })
}




/**
 * Final kinetic energy of the standard test problems, from a single-core
 * IEEE-conforming reference run.
 */
pub fn reference_kinetic_energy(problem: u32) -> Option<f64> {
    match problem {
        1 => Some(1.82280367310258),
        2 => Some(1.19316898756307),
        3 => Some(2.58984003503994),
        4 => Some(0.307475452287895),
        5 => Some(4.85350315783719),
        _ => None,
    }
}

/**
 * How far a final kinetic energy is from a test problem's reference, in
 * percent, and whether that is close enough to pass.
 */
pub fn check_test_problem(problem: u32, kinetic_energy: f64) -> Option<(f64, bool)> {
    let reference = reference_kinetic_energy(problem)?;
    let difference = (100.0 * (kinetic_energy / reference) - 100.0).abs();
    Some((difference, difference < 0.001))
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::*;
    use crate::kernels::ideal_gas::ideal_gas;
    use crate::kernels::testing::uniform_tile;
    use crate::kernels::TimeLevel;

    #[test]
    fn uniform_state_totals() {
        let mut tile = uniform_tile(4, 2.0, 3.0);
        tile.fields.xvel0.fill(1.0);
        ideal_gas(&mut tile, TimeLevel::Start);
        let s = field_summary(&tile);

        assert!((s.volume - 1.0).abs() < 1e-14);
        assert!((s.mass - 2.0).abs() < 1e-14);
        assert!((s.internal_energy - 6.0).abs() < 1e-14);
        assert!((s.kinetic_energy - 1.0).abs() < 1e-14);
        assert!((s.mean_pressure() - 0.4 * 6.0).abs() < 1e-13);
        assert!((s.density() - 2.0).abs() < 1e-14);
    }

    #[test]
    fn merge_is_order_free() {
        let a = Summary { volume: 1.0, mass: 2.0, pressure: 3.0, internal_energy: 4.0, kinetic_energy: 5.0 };
        let b = Summary { volume: 0.5, mass: 0.25, pressure: 0.125, internal_energy: 1.0, kinetic_energy: 2.0 };
        assert_eq!(a.merge(b), b.merge(a));
        assert_eq!(a.merge(Summary::default()), a);
        assert_eq!(Summary::from_slice(&a.to_array()), Some(a));
        assert_eq!(Summary::from_slice(&[1.0]), None);
    }

    #[test]
    fn test_problem_tolerance() {
        assert_eq!(check_test_problem(1, 1.82280367310258), Some((0.0, true)));
        assert!(!check_test_problem(2, 1.2).unwrap().1);
        assert!(check_test_problem(4, 0.307475452287895 * (1.0 + 5e-6)).unwrap().1);
        assert_eq!(check_test_problem(6, 1.0), None);
    }
}
