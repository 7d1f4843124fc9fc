use crate::grid::Grid;
use crate::tile::Tile;

/**
 * Set the static mesh geometry of a tile from the grid and the tile's global
 * placement: node and cell coordinates and widths, cell volumes, and face
 * areas. Covers the ghost layers too, so stencils reading the halo see
 * consistent geometry.
 */
pub fn initialise(tile: &mut Tile, grid: &Grid) {
    let (dx, dy) = grid.cell_spacing();
    let xmin = grid.xmin + dx * (tile.block.lower.0 - 1) as f64;
    let ymin = grid.ymin + dy * (tile.block.lower.1 - 1) as f64;
    let g = &mut tile.geometry;

    for j in g.vertexx.range() {
        g.vertexx[j] = xmin + dx * (j - 1) as f64;
        g.vertexdx[j] = dx;
    }
    for k in g.vertexy.range() {
        g.vertexy[k] = ymin + dy * (k - 1) as f64;
        g.vertexdy[k] = dy;
    }
    for j in g.cellx.range() {
        g.cellx[j] = 0.5 * (g.vertexx[j] + g.vertexx[j + 1]);
        g.celldx[j] = dx;
    }
    for k in g.celly.range() {
        g.celly[k] = 0.5 * (g.vertexy[k] + g.vertexy[k + 1]);
        g.celldy[k] = dy;
    }

    let space = g.volume.index_space().clone();
    for (j, k) in space.iter() {
        g.volume[(j, k)] = dx * dy;
    }
    let space = g.xarea.index_space().clone();
    for (j, k) in space.iter() {
        g.xarea[(j, k)] = g.celldy[k];
    }
    let space = g.yarea.index_space().clone();
    for (j, k) in space.iter() {
        g.yarea[(j, k)] = g.celldx[j];
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::decompose::partition;

    #[test]
    fn tiles_know_where_they_are() {
        let grid = Grid { x_cells: 8, y_cells: 4, xmin: -2.0, xmax: 2.0, ymin: 0.0, ymax: 1.0 };
        let blocks = partition(grid.cells(), (1, 1), 2).unwrap();
        let mut tile = Tile::new(blocks[1].clone());
        initialise(&mut tile, &grid);

        let g = &tile.geometry;
        assert_eq!(tile.block.lower, (5, 1));
        assert_eq!(g.vertexx[1], 0.0);
        assert_eq!(g.vertexx[5], 2.0);
        assert_eq!(g.vertexx[-1], -1.0);
        assert_eq!(g.cellx[1], 0.25);
        assert_eq!(g.vertexy[5], 1.0);
        assert_eq!(g.volume[(2, 2)], 0.125);
        assert_eq!(g.xarea[(5, 1)], 0.25);
        assert_eq!(g.yarea[(1, 5)], 0.5);
    }
}
