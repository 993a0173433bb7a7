// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The failures a render pass can report.  Numeric overflow is not
//! among them: an orbit blowing up is how a cell gets classified.

use failure::Fail;

use crate::planes::Rect;

/// Everything that can go wrong between reading a configuration and
/// the last paint call of a pass.
#[derive(Debug, Fail)]
pub enum RenderError {
    /// The sampled window is empty or inverted.
    #[fail(
        display = "invalid region: {} segments over [{}, {}]",
        segments, start, end
    )]
    InvalidRegion {
        /// Grid resolution per axis.
        segments: usize,
        /// Lower bound on both axes.
        start: f64,
        /// Upper bound on both axes.
        end: f64,
    },

    /// A configuration option is out of range.
    #[fail(display = "invalid configuration: {}", _0)]
    InvalidConfig(String),

    /// A colour string could not be parsed.
    #[fail(display = "could not parse colour {:?}", _0)]
    InvalidColor(String),

    /// A surface was asked to paint a rectangle it cannot place.
    #[fail(display = "cannot paint rectangle {:?}", _0)]
    InvalidRect(Rect),

    /// Another thread panicked while holding the surface.
    #[fail(display = "the output surface was poisoned by a panicking painter")]
    SurfacePoisoned,

    /// A sampling worker panicked.
    #[fail(display = "a sampling worker panicked")]
    WorkerPanicked,

    /// The background pass went away without reporting a result.
    #[fail(display = "the render pass was abandoned before completing")]
    RenderAbandoned,
}
