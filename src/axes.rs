//! Axis decoration drawn before the grid: the plot area, and a row
//! and a column of tick marks with value labels.

use failure::Error;

use crate::planes::Rect;
use crate::surface::{Color, Surface, TextAlign};

/// Number of intervals between labels on each axis.
pub const LABEL_STEPS: u32 = 10;

/// Label size in surface units; labels sit this far from the grid.
const TEXT_SIZE: f64 = 10.0;

/// Length of a tick mark.
const TICK_LENGTH: f64 = 5.0;

/// `rgba(0, 0, 0, 0.9)`
pub const LABEL_COLOR: Color = Color::rgba(0, 0, 0, 230);

/// Tick marks use the canvas default stroke.
pub const TICK_COLOR: Color = Color::BLACK;

/// What the axes need to know about the pass.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AxisSpec {
    /// Grid resolution; carried along but the labels use a fixed count.
    pub segments: usize,
    /// Smallest labelled value.
    pub min: f64,
    /// Largest labelled value.
    pub max: f64,
    /// Space left of the grid.
    pub x_offset: f64,
    /// Space above the grid.
    pub y_offset: f64,
}

/// Round to two decimals, halves towards positive infinity.
fn round_label(value: f64) -> f64 {
    (value * 100.0 + 0.5).floor() / 100.0
}

/// The label values, from `min` to `max` inclusive.
pub fn label_values(min: f64, max: f64) -> Vec<f64> {
    let increment = (max - min) / f64::from(LABEL_STEPS);
    (0..=LABEL_STEPS)
        .map(|i| round_label(min + increment * f64::from(i)))
        .collect()
}

/// Fill the plot area with the current fill style, then draw the
/// labels and ticks.  Label spacing divides the whole surface, gap
/// included, so the last labels fall past the end of the grid.
pub fn render_axes<S: Surface + ?Sized>(surface: &mut S, spec: &AxisSpec) -> Result<(), Error> {
    let (width, height) = surface.size();
    let (width, height) = (f64::from(width), f64::from(height));

    surface.fill_rect(Rect::new(
        spec.x_offset,
        spec.y_offset,
        width - spec.x_offset,
        height - spec.y_offset,
    ))?;

    let cell_x = width / f64::from(LABEL_STEPS);
    let cell_y = height / f64::from(LABEL_STEPS);
    surface.set_fill_style(LABEL_COLOR)?;
    surface.set_stroke_style(TICK_COLOR)?;

    for (i, value) in label_values(spec.min, spec.max).into_iter().enumerate() {
        let text = value.to_string();
        let i = i as f64;

        let y = i * cell_y + spec.y_offset;
        surface.fill_text(&text, spec.x_offset - TEXT_SIZE, y, TextAlign::Right)?;
        surface.stroke_rect(Rect::new(spec.x_offset - TICK_LENGTH, y, TICK_LENGTH, 1.0))?;

        let x = i * cell_x + spec.x_offset;
        surface.fill_text(&text, x, spec.y_offset - TEXT_SIZE, TextAlign::Center)?;
        surface.stroke_rect(Rect::new(x, spec.y_offset - TICK_LENGTH, 1.0, TICK_LENGTH))?;
    }
    Ok(())
}
