//! Playfield grid: a walled rectangle of cells, each empty or holding a digit.

use crate::config::{ConfigError, MAX_FIELD_HEIGHT, MAX_FIELD_WIDTH};

/// Single cell of the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Wall,
    /// Token value, always 1..=9.
    Digit(u8),
}

impl Cell {
    #[inline]
    pub fn is_empty(self) -> bool {
        self == Self::Empty
    }

    /// Glyph used by the renderer.
    pub fn glyph(self) -> char {
        match self {
            Self::Empty => ' ',
            Self::Wall => '#',
            Self::Digit(d) => char::from(b'0' + d),
        }
    }
}

/// Field of `width × height` cells. The outermost ring is wall; everything inside is playable.
/// y=0 is the top row, x=0 the left wall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    pub width: usize,
    pub height: usize,
    /// rows[y][x] = cell.
    rows: Vec<Vec<Cell>>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Result<Self, ConfigError> {
        if width <= 2 || height <= 2 {
            return Err(ConfigError::FieldTooSmall { width, height });
        }
        if width > MAX_FIELD_WIDTH || height > MAX_FIELD_HEIGHT {
            return Err(ConfigError::FieldTooLarge { width, height });
        }
        let rows = (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| {
                        if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
                            Cell::Wall
                        } else {
                            Cell::Empty
                        }
                    })
                    .collect()
            })
            .collect();
        Ok(Self {
            width,
            height,
            rows,
        })
    }

    #[inline]
    pub fn is_border(&self, x: usize, y: usize) -> bool {
        x == 0 || y == 0 || x == self.width - 1 || y == self.height - 1
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<Cell> {
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    /// Write an interior cell. Wall cells and `Cell::Wall` values are refused.
    /// Writing outside the field is a caller bug and panics in debug builds.
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) -> bool {
        let in_bounds = x < self.width && y < self.height;
        debug_assert!(
            in_bounds,
            "cell ({}, {}) outside {}x{} field",
            x, y, self.width, self.height
        );
        if !in_bounds || self.is_border(x, y) || cell == Cell::Wall {
            return false;
        }
        self.rows[y][x] = cell;
        true
    }

    /// Playable rows, top to bottom.
    pub fn interior_rows(&self) -> std::ops::Range<usize> {
        1..self.height - 1
    }

    /// Playable columns, left to right.
    pub fn interior_cols(&self) -> std::ops::Range<usize> {
        1..self.width - 1
    }

    /// Leftmost playable column; a token here on the next scroll hits the wall.
    #[inline]
    pub fn wall_column(&self) -> usize {
        1
    }

    /// Rightmost playable column, where tokens enter.
    #[inline]
    pub fn spawn_column(&self) -> usize {
        self.width - 2
    }

    /// First cell showing `digit`, searching column by column from the left,
    /// top to bottom within a column.
    pub fn first_digit(&self, digit: u8) -> Option<(usize, usize)> {
        for x in self.interior_cols() {
            for y in self.interior_rows() {
                if self.rows[y][x] == Cell::Digit(digit) {
                    return Some((x, y));
                }
            }
        }
        None
    }

    /// All tokens currently on the field as (x, y, value).
    pub fn digits(&self) -> impl Iterator<Item = (usize, usize, u8)> + '_ {
        self.rows.iter().enumerate().flat_map(|(y, row)| {
            row.iter().enumerate().filter_map(move |(x, cell)| match cell {
                Cell::Digit(d) => Some((x, y, *d)),
                _ => None,
            })
        })
    }

    /// Rows for rendering, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Shift one interior row left by a column, emptying the rightmost playable cell.
    /// Whatever sat in the leftmost playable column is overwritten.
    pub(crate) fn shift_row_left(&mut self, y: usize) {
        let row = &mut self.rows[y];
        for x in 2..self.width - 1 {
            row[x - 1] = row[x];
            row[x] = Cell::Empty;
        }
    }
}
