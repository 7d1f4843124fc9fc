use crate::config::{State, StateGeometry};
use crate::field::{allocated_space, Staggering};
use crate::tile::Tile;

/**
 * Whether cell `(j, k)` of the tile is covered by the given state geometry.
 * Rectangles take every cell they touch, circles the cells whose centers
 * are inside, and points the cell whose lower-left node sits exactly on
 * the point.
 */
fn covers(tile: &Tile, geometry: &StateGeometry, j: i64, k: i64) -> bool {
    let g = &tile.geometry;

    match *geometry {
        StateGeometry::Background => true,
        StateGeometry::Rectangle { xmin, xmax, ymin, ymax } => {
            g.vertexx[j + 1] >= xmin && g.vertexx[j] < xmax &&
            g.vertexy[k + 1] >= ymin && g.vertexy[k] < ymax
        }
        StateGeometry::Circle { x, y, radius } => {
            let dx = g.cellx[j] - x;
            let dy = g.celly[k] - y;
            (dx * dx + dy * dy).sqrt() <= radius
        }
        StateGeometry::Point { x, y } => {
            g.vertexx[j] == x && g.vertexy[k] == y
        }
    }
}

/**
 * Write the initial density, energy and node velocities of a tile. The
 * first state is the background and fills every allocated entry; each later
 * state overwrites the cells it covers, together with the four nodes of
 * each such cell. Geometry must have been initialised first.
 */
pub fn generate(tile: &mut Tile, states: &[State]) {
    let background = match states.first() {
        Some(state) => state,
        None => return,
    };
    tile.fields.density0.fill(background.density);
    tile.fields.energy0.fill(background.energy);
    tile.fields.xvel0.fill(background.xvel);
    tile.fields.yvel0.fill(background.yvel);

    let cells = allocated_space(tile.x_max, tile.y_max, Staggering::Cell);

    for state in &states[1..] {
        let covered: Vec<_> = cells.iter().filter(|&(j, k)| covers(tile, &state.geometry, j, k)).collect();
        let f = &mut tile.fields;

        for (j, k) in covered {
            f.density0[(j, k)] = state.density;
            f.energy0[(j, k)] = state.energy;

            for kt in k..=k + 1 {
                for jt in j..=j + 1 {
                    f.xvel0[(jt, kt)] = state.xvel;
                    f.yvel0[(jt, kt)] = state.yvel;
                }
            }
        }
    }
}
