#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Divergence map renderer
//!
//! The Mandelbrot set is the set of points `c` on the complex plane
//! for which repeatedly squaring and adding `c` never runs away to
//! infinity.  This crate samples a square window of the plane on an
//! N×N grid, decides for every cell whether the orbit of its point is
//! bounded or not, and paints the unbounded cells onto a surface.
//!
//! The decision is deliberately crude.  A point already outside the
//! threshold disk escapes at once; any other point escapes only if
//! its orbit overflows the floating point range within the iteration
//! budget.  The result is binary, there is no colouring by escape
//! speed.
//!
//! Cells are independent, so the sampler can run them one by one on
//! the calling thread or spread them over worker threads, painting
//! through a shared, locked surface.

pub mod axes;
pub mod complex;
pub mod config;
pub mod error;
pub mod escape;
pub mod planes;
pub mod render;
pub mod sampler;
pub mod surface;

pub use crate::complex::ComplexOps;
pub use crate::config::Config;
pub use crate::error::RenderError;
pub use crate::escape::{classify, escape, Classification, Escape, Params};
pub use crate::planes::{Cell, CellLayout, GridRegion, PlaneMapper, Rect};
pub use crate::render::{render_visualization, Completion, RenderHandle, Visualization};
pub use crate::sampler::{sample_grid, CellOutcome, Schedule};
pub use crate::surface::{Color, ImageSurface, RecordingSurface, Surface, SurfaceCall, TextAlign};
