//! Contains the PlaneMapper struct, which describes a relationship
//! between a square grid of cells and two other planes: the square
//! window of the complex plane the cells sample, and the output
//! surface the cells are painted onto.
use itertools::iproduct;
use num::Complex;

use crate::error::RenderError;

/// A grid cell, addressed by row and column.  Rows walk the imaginary
/// axis, columns the real one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Cell {
    /// Row index, `0..segments`.
    pub row: usize,
    /// Column index, `0..segments`.
    pub col: usize,
}

impl Cell {
    /// Row and column, in that order.
    pub fn new(row: usize, col: usize) -> Self {
        Cell { row, col }
    }
}

/// A rectangle on the output surface, in surface units.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rect {
    /// Distance from the left edge.
    pub left: f64,
    /// Distance from the top edge.
    pub top: f64,
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Rect {
    /// Left, top, width, height.
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Rect {
            left,
            top,
            width,
            height,
        }
    }

    /// Whether every coordinate is a finite number.
    pub fn is_finite(&self) -> bool {
        self.left.is_finite()
            && self.top.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
    }
}

/// The sampled window.  One interval serves both axes, so the window
/// is always square.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GridRegion {
    segments: usize,
    start: f64,
    end: f64,
}

impl GridRegion {
    /// Fails if there are no segments or the interval is empty,
    /// inverted, or not finite.
    pub fn new(segments: usize, start: f64, end: f64) -> Result<Self, RenderError> {
        if segments == 0 || !start.is_finite() || !end.is_finite() || end <= start {
            return Err(RenderError::InvalidRegion {
                segments,
                start,
                end,
            });
        }
        Ok(GridRegion {
            segments,
            start,
            end,
        })
    }

    /// Cells per axis.
    pub fn segments(&self) -> usize {
        self.segments
    }

    /// Lower bound on both axes.
    pub fn start(&self) -> f64 {
        self.start
    }

    /// Upper bound on both axes.
    pub fn end(&self) -> f64 {
        self.end
    }

    /// Width of one cell in plane units.
    pub fn step(&self) -> f64 {
        (self.end - self.start) / (self.segments as f64)
    }

    /// The plane point sampled for a cell: its lower-left corner.
    pub fn cell_to_point(&self, cell: &Cell) -> Complex<f64> {
        let step = self.step();
        Complex::new(
            (cell.col as f64) * step + self.start,
            (cell.row as f64) * step + self.start,
        )
    }
}

/// Where cells land on the output surface.
///
/// The cell size is derived from the surface width alone and reused
/// for the vertical placement, so on a surface that is taller than it
/// is wide the grid does not reach the bottom edge.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CellLayout {
    cell_size: f64,
    x_offset: f64,
    y_offset: f64,
}

impl CellLayout {
    /// `output_width` is the full surface width, offsets included.
    pub fn new(output_width: f64, segments: usize, x_offset: f64, y_offset: f64) -> Self {
        CellLayout {
            cell_size: (output_width - x_offset) / (segments as f64),
            x_offset,
            y_offset,
        }
    }

    /// Side length of one painted cell.
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// The square a cell is painted into.
    pub fn cell_to_rect(&self, cell: &Cell) -> Rect {
        Rect::new(
            (cell.col as f64) * self.cell_size + self.x_offset,
            (cell.row as f64) * self.cell_size + self.y_offset,
            self.cell_size,
            self.cell_size,
        )
    }
}

/// Maps cells to points on the complex plane and to rectangles on
/// the output surface.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlaneMapper {
    /// The complex side.
    pub region: GridRegion,
    /// The surface side.
    pub layout: CellLayout,
}

impl PlaneMapper {
    /// Pair a region with a layout.  Both must agree on the number
    /// of segments; the layout is normally built from
    /// `region.segments()`.
    pub fn new(region: GridRegion, layout: CellLayout) -> Self {
        PlaneMapper { region, layout }
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.region.segments * self.region.segments
    }

    /// A valid region always has at least one cell.
    pub fn is_empty(&self) -> bool {
        self.region.segments == 0
    }

    /// Row-major position of a cell.
    pub fn index(&self, cell: &Cell) -> usize {
        cell.row * self.region.segments + cell.col
    }

    /// See [`GridRegion::cell_to_point`].
    pub fn cell_to_point(&self, cell: &Cell) -> Complex<f64> {
        self.region.cell_to_point(cell)
    }

    /// See [`CellLayout::cell_to_rect`].
    pub fn cell_to_rect(&self, cell: &Cell) -> Rect {
        self.layout.cell_to_rect(cell)
    }

    /// Every cell, row by row.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + Send {
        let segments = self.region.segments;
        iproduct!(0..segments, 0..segments).map(|(row, col)| Cell::new(row, col))
    }
}
