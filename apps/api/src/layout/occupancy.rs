//! Occupancy Tracker — which cells of the virtual grid are already claimed.
//!
//! Rows are created lazily; any cell never grown to reads as free. One
//! tracker belongs to exactly one layout pass. Cells are never released, so
//! the first open row only moves down and is tracked incrementally.

use crate::layout::sizing::CardSize;

#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    columns: u32,
    rows: Vec<Vec<bool>>,
    open_from: usize,
}

impl OccupancyGrid {
    pub fn new(columns: u32) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            open_from: 0,
        }
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows grown so far (the occupied extent).
    #[cfg(test)]
    pub fn row_count(&self) -> u32 {
        self.rows.len() as u32
    }

    pub fn is_occupied(&self, x: u32, y: u32) -> bool {
        self.rows
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .copied()
            .unwrap_or(false)
    }

    /// True when the whole footprint lies inside the columns and is free.
    pub fn can_place(&self, x: u32, y: u32, size: CardSize) -> bool {
        if x + size.width > self.columns {
            return false;
        }
        (y..y + size.height).all(|cy| (x..x + size.width).all(|cx| !self.is_occupied(cx, cy)))
    }

    pub fn mark_occupied(&mut self, x: u32, y: u32, size: CardSize) {
        let bottom = (y + size.height) as usize;
        let columns = self.columns as usize;
        if self.rows.len() < bottom {
            self.rows.resize_with(bottom, || vec![false; columns]);
        }
        for row in &mut self.rows[y as usize..bottom] {
            for cell in &mut row[x as usize..(x + size.width) as usize] {
                *cell = true;
            }
        }
        while self
            .rows
            .get(self.open_from)
            .is_some_and(|row| row.iter().all(|c| *c))
        {
            self.open_from += 1;
        }
    }

    /// Every cell in row `y` left of column `x` is claimed.
    pub fn row_filled_before(&self, x: u32, y: u32) -> bool {
        (0..x).all(|cx| self.is_occupied(cx, y))
    }

    /// First row with at least one free cell; rows past the extent are free.
    pub fn first_open_row(&self) -> u32 {
        self.open_from as u32
    }

    /// First free cell in row-major order.
    pub fn first_free_cell(&self) -> (u32, u32) {
        let y = self.first_open_row();
        let x = (0..self.columns)
            .find(|&x| !self.is_occupied(x, y))
            .unwrap_or(0);
        (x, y)
    }
}
