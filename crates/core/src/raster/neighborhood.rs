//! Neighbor enumeration shared by filling and inundation

use serde::{Deserialize, Serialize};

/// Edge-adjacent offsets: N, W, E, S
const ROOK_OFFSETS: [(isize, isize); 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];

/// Edge- and corner-adjacent offsets in row-major order
const QUEEN_OFFSETS: [(isize, isize); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1),           (0, 1),
    (1, -1),  (1, 0),  (1, 1),
];

/// Which cells count as neighbors of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    /// The 4 edge-adjacent cells
    #[default]
    Four,
    /// The 4 edge-adjacent plus the 4 diagonal cells
    Eight,
}

impl Connectivity {
    /// Build from a neighbor count (4 or 8)
    pub fn from_degree(degree: u8) -> Option<Self> {
        match degree {
            4 => Some(Connectivity::Four),
            8 => Some(Connectivity::Eight),
            _ => None,
        }
    }

    /// Number of neighbors of an interior cell
    pub fn degree(&self) -> usize {
        self.offsets().len()
    }

    /// Relative (row, col) offsets of the neighbors
    pub fn offsets(&self) -> &'static [(isize, isize)] {
        match self {
            Connectivity::Four => &ROOK_OFFSETS,
            Connectivity::Eight => &QUEEN_OFFSETS,
        }
    }

    /// In-bounds neighbors of (row, col) in a `rows x cols` grid
    pub fn neighbors(&self, row: usize, col: usize, rows: usize, cols: usize) -> Neighbors {
        Neighbors {
            row,
            col,
            rows,
            cols,
            offsets: self.offsets(),
            index: 0,
        }
    }
}

/// Iterator over the in-bounds neighbors of one cell, clipped at the grid edge
#[derive(Debug, Clone)]
pub struct Neighbors {
    row: usize,
    col: usize,
    rows: usize,
    cols: usize,
    offsets: &'static [(isize, isize)],
    index: usize,
}

impl Iterator for Neighbors {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        while self.index < self.offsets.len() {
            let (dr, dc) = self.offsets[self.index];
            self.index += 1;

            let nr = self.row as isize + dr;
            let nc = self.col as isize + dc;
            if nr < 0 || nc < 0 || nr >= self.rows as isize || nc >= self.cols as isize {
                continue;
            }
            return Some((nr as usize, nc as usize));
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.offsets.len() - self.index))
    }
}
