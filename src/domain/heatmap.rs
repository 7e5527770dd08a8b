use crate::domain::models::Shot;

/// Goal mouth dimensions, in feet. Shot positions are measured from the
/// bottom-left post.
pub const NET_WIDTH_FT: f32 = 6.0;
pub const NET_HEIGHT_FT: f32 = 4.0;

/// Shot counts binned over the goal mouth. Row 0 is the crossbar side.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapGrid {
    cols: usize,
    rows: usize,
    cells: Vec<u32>,
    max: u32,
}

impl HeatmapGrid {
    /// Shots outside the net are left out.
    pub fn from_shots<'a>(shots: impl IntoIterator<Item = &'a Shot>, cols: usize, rows: usize) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        let mut cells = vec![0u32; cols * rows];

        for shot in shots {
            if !(0.0..=NET_WIDTH_FT).contains(&shot.x) || !(0.0..=NET_HEIGHT_FT).contains(&shot.y) {
                continue;
            }
            let col = ((shot.x / NET_WIDTH_FT) * cols as f32) as usize;
            let row = (((NET_HEIGHT_FT - shot.y) / NET_HEIGHT_FT) * rows as f32) as usize;
            cells[row.min(rows - 1) * cols + col.min(cols - 1)] += 1;
        }

        let max = cells.iter().copied().max().unwrap_or(0);
        Self {
            cols,
            rows,
            cells,
            max,
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn count(&self, col: usize, row: usize) -> u32 {
        self.cells.get(row * self.cols + col).copied().unwrap_or(0)
    }

    /// Count relative to the busiest cell, in `[0, 1]`.
    pub fn intensity(&self, col: usize, row: usize) -> f32 {
        if self.max == 0 {
            0.0
        } else {
            self.count(col, row) as f32 / self.max as f32
        }
    }

    pub fn total(&self) -> u32 {
        self.cells.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ShotResult;

    fn shot(x: f32, y: f32) -> Shot {
        Shot {
            id: 0,
            block_id: None,
            time: None,
            x,
            y,
            result: ShotResult::Made,
        }
    }

    #[test]
    fn test_binning_corners() {
        let shots = [shot(0.1, 3.9), shot(5.9, 0.1), shot(5.9, 0.2), shot(6.0, 0.0)];
        let grid = HeatmapGrid::from_shots(&shots, 3, 2);
        // Top-left
        assert_eq!(grid.count(0, 0), 1);
        // Bottom-right, the post itself included
        assert_eq!(grid.count(2, 1), 3);
        assert_eq!(grid.intensity(2, 1), 1.0);
        assert!((grid.intensity(0, 0) - 1.0 / 3.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_outside_shots_are_ignored() {
        let shots = [shot(-1.0, 2.0), shot(3.0, 4.5), shot(3.0, 2.0)];
        let grid = HeatmapGrid::from_shots(&shots, 4, 4);
        assert_eq!(grid.total(), 1);
    }

    #[test]
    fn test_empty_grid_has_zero_intensity() {
        let grid = HeatmapGrid::from_shots(Vec::<Shot>::new().iter(), 2, 2);
        assert_eq!(grid.intensity(1, 1), 0.0);
        assert_eq!(grid.count(5, 5), 0);
    }
}
