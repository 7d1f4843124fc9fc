use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};




/**
 * The global mesh: a rectangle of `x_cells` by `y_cells` uniform cells
 * covering the physical region `[xmin, xmax] x [ymin, ymax]`. Global cell
 * indexes are 1-based and inclusive, so the domain is
 * `1..=x_cells x 1..=y_cells`.
 */
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub x_cells: usize,
    pub y_cells: usize,
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}




// ============================================================================
impl Grid {

    pub fn cells(&self) -> (usize, usize) {
        (self.x_cells, self.y_cells)
    }

    pub fn cell_spacing(&self) -> (f64, f64) {
        let dx = (self.xmax - self.xmin) / self.x_cells as f64;
        let dy = (self.ymax - self.ymin) / self.y_cells as f64;
        (dx, dy)
    }

    pub fn validate(&self) -> Result<()> {
        if self.x_cells == 0 || self.y_cells == 0 {
            return Err(Error::Config("grid must have at least one cell on each axis".into()))
        }
        if !(self.xmax > self.xmin) || !(self.ymax > self.ymin) {
            return Err(Error::Config(format!(
                "grid bounds [{}, {}] x [{}, {}] are empty",
                self.xmin, self.xmax, self.ymin, self.ymax)))
        }
        Ok(())
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            x_cells: 10,
            y_cells: 10,
            xmin: 0.0,
            xmax: 10.0,
            ymin: 0.0,
            ymax: 10.0,
        }
    }
}
