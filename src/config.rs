//! The options a render pass reads, once, before it starts.

use failure::Error;

use crate::error::RenderError;
use crate::escape::Params;
use crate::planes::GridRegion;
use crate::surface::Color;

/// Everything that shapes one render pass.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Config {
    /// Side of the square grid area, in surface units.
    pub size: u32,
    /// Space reserved left of and above the grid for the axes.
    pub gap: u32,
    /// Grid resolution per axis.
    pub segments: usize,
    /// Lower bound of the sampled window on both axes.
    pub min: f64,
    /// Upper bound of the sampled window on both axes.
    pub max: f64,
    /// Fast-path divergence cutoff.
    pub threshold: f64,
    /// Iteration budget per cell.
    pub points_to_generate: usize,
    /// Fill for unbounded cells.
    pub dark_color: Color,
    /// Background, which is what bounded cells show.
    pub light_color: Color,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            size: 2000,
            gap: 30,
            segments: 500,
            min: -2.0,
            max: 2.0,
            threshold: 2.0,
            points_to_generate: 100,
            dark_color: Color::BLACK,
            light_color: Color::WHITE,
        }
    }
}

impl Config {
    /// Side of the whole surface: grid plus gap.
    pub fn canvas_size(&self) -> u32 {
        self.size.saturating_add(self.gap)
    }

    /// The sampled window.
    pub fn region(&self) -> Result<GridRegion, RenderError> {
        GridRegion::new(self.segments, self.min, self.max)
    }

    /// Threshold and iteration budget.
    pub fn params(&self) -> Params {
        Params::new(self.threshold, self.points_to_generate)
    }

    /// Reject options that cannot produce a picture.
    pub fn validate(&self) -> Result<(), Error> {
        if self.size == 0 {
            return Err(RenderError::InvalidConfig("size must be positive".to_string()).into());
        }
        if self.points_to_generate == 0 {
            return Err(RenderError::InvalidConfig(
                "the iteration budget must be positive".to_string(),
            )
            .into());
        }
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(RenderError::InvalidConfig(format!(
                "threshold must be a non-negative number, not {}",
                self.threshold
            ))
            .into());
        }
        self.region()?;
        Ok(())
    }
}
