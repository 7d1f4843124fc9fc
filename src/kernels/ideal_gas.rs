use crate::tile::Tile;
use super::TimeLevel;

/// Ratio of specific heats.
pub const GAMMA: f64 = 1.4;

/**
 * Ideal gas equation of state: pressure and sound speed over the tile
 * interior, from density and energy at the given time level.
 */
pub fn ideal_gas(tile: &mut Tile, level: TimeLevel) {
    let interior = tile.interior();
    let f = &mut tile.fields;

    let (density, energy) = match level {
        TimeLevel::Start => (&f.density0, &f.energy0),
        TimeLevel::Advanced => (&f.density1, &f.energy1),
    };

    for (j, k) in interior.iter() {
        let d = density[(j, k)];
        let v = 1.0 / d;
        let pressure = (GAMMA - 1.0) * d * energy[(j, k)];
        let pressure_by_energy = (GAMMA - 1.0) * d;
        let pressure_by_volume = -d * pressure;
        let sound_speed_squared = v * v * (pressure * pressure_by_energy - pressure_by_volume);

        f.pressure[(j, k)] = pressure;
        f.soundspeed[(j, k)] = sound_speed_squared.sqrt();
    }
}
