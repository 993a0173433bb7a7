// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The paint target.  A render pass talks to its output only through
//! the `Surface` trait, which is a small subset of a 2D canvas: a
//! current fill and stroke style, axis-aligned rectangles, and text.

use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use failure::Error;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use log::trace;

use crate::error::RenderError;
use crate::planes::Rect;

/// An sRGB colour with straight alpha.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Opacity, 255 is opaque.
    pub a: u8,
}

impl Color {
    /// Opaque black, the initial style of a fresh surface.
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    /// An opaque colour.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b, a: 255 }
    }

    /// A colour with an explicit alpha.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color { r, g, b, a }
    }
}

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl FromStr for Color {
    type Err = RenderError;

    /// Accepts `#rgb`, `#rrggbb` and `#rrggbbaa`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RenderError::InvalidColor(s.to_string());
        let digits = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        let nibbles = digits
            .bytes()
            .map(hex_digit)
            .collect::<Option<Vec<u8>>>()
            .ok_or_else(invalid)?;
        match nibbles.as_slice() {
            [r, g, b] => Ok(Color::rgb(r * 17, g * 17, b * 17)),
            [r1, r0, g1, g0, b1, b0] => Ok(Color::rgb(r1 * 16 + r0, g1 * 16 + g0, b1 * 16 + b0)),
            [r1, r0, g1, g0, b1, b0, a1, a0] => Ok(Color::rgba(
                r1 * 16 + r0,
                g1 * 16 + g0,
                b1 * 16 + b0,
                a1 * 16 + a0,
            )),
            _ => Err(invalid()),
        }
    }
}

/// Horizontal anchoring of a text run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TextAlign {
    /// The anchor is the right end of the text.
    Right,
    /// The anchor is the middle of the text.
    Center,
}

/// Something a render pass can paint on.
///
/// Implementations are not expected to be internally synchronized;
/// concurrent painters share a surface through a `Mutex`.
pub trait Surface {
    /// Width and height in surface units.
    fn size(&self) -> (u32, u32);

    /// Discard the contents and change the dimensions.
    fn resize(&mut self, width: u32, height: u32) -> Result<(), Error>;

    /// Colour used by `fill_rect` and `fill_text`.
    fn set_fill_style(&mut self, color: Color) -> Result<(), Error>;

    /// Colour used by `stroke_rect`.
    fn set_stroke_style(&mut self, color: Color) -> Result<(), Error>;

    /// Paint the interior of a rectangle with the fill style.
    fn fill_rect(&mut self, rect: Rect) -> Result<(), Error>;

    /// Paint the one-unit outline of a rectangle with the stroke style.
    fn stroke_rect(&mut self, rect: Rect) -> Result<(), Error>;

    /// Draw a text label, vertically centred on `y`.
    fn fill_text(&mut self, text: &str, x: f64, y: f64, align: TextAlign) -> Result<(), Error>;
}

/// Lock a shared surface, turning poisoning into an error.
pub fn lock<S>(surface: &Mutex<S>) -> Result<MutexGuard<'_, S>, RenderError> {
    surface.lock().map_err(|_| RenderError::SurfacePoisoned)
}

/// A raster surface backed by an RGBA image.  One surface unit is one
/// pixel; rectangle edges are rounded to the nearest pixel boundary.
#[derive(Clone, Debug)]
pub struct ImageSurface {
    image: RgbaImage,
    fill: Color,
    stroke: Color,
}

impl ImageSurface {
    /// A transparent surface of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        ImageSurface {
            image: RgbaImage::new(width, height),
            fill: Color::BLACK,
            stroke: Color::BLACK,
        }
    }

    /// The pixels painted so far.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Colour of one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        let Rgba([r, g, b, a]) = *self.image.get_pixel(x, y);
        Color::rgba(r, g, b, a)
    }

    /// Write the surface to disk.  The format follows the file
    /// extension, with `.pnm` taken as PNM; alpha is dropped so that
    /// PNM works too.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        let format = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("pnm") => ImageFormat::Pnm,
            _ => ImageFormat::from_path(path)?,
        };
        let rgb = DynamicImage::ImageRgba8(self.image.clone()).to_rgb8();
        rgb.save_with_format(path, format)?;
        Ok(())
    }

    /// Blend a `GLYPH_SCALE` square block whose top-left corner may lie
    /// off the surface.
    fn blend_block(&mut self, x: i64, y: i64, color: Color) {
        let (width, height) = (i64::from(self.image.width()), i64::from(self.image.height()));
        for py in y.max(0)..(y + GLYPH_SCALE).min(height) {
            for px in x.max(0)..(x + GLYPH_SCALE).min(width) {
                self.blend(px as u32, py as u32, color);
            }
        }
    }

    /// Clamp a rectangle to pixel bounds: `(x0, y0, x1, y1)`, half-open.
    fn pixel_bounds(&self, rect: Rect) -> Result<(u32, u32, u32, u32), Error> {
        if !rect.is_finite() {
            return Err(RenderError::InvalidRect(rect).into());
        }
        let (width, height) = (f64::from(self.image.width()), f64::from(self.image.height()));
        let x0 = rect.left.round().max(0.0).min(width);
        let y0 = rect.top.round().max(0.0).min(height);
        let x1 = (rect.left + rect.width).round().max(x0).min(width);
        let y1 = (rect.top + rect.height).round().max(y0).min(height);
        Ok((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }

    fn blend(&mut self, x: u32, y: u32, color: Color) {
        let pixel = self.image.get_pixel_mut(x, y);
        if color.a == 255 {
            *pixel = Rgba([color.r, color.g, color.b, 255]);
            return;
        }
        let alpha = u32::from(color.a);
        let mix = |src: u8, dst: u8| -> u8 {
            ((u32::from(src) * alpha + u32::from(dst) * (255 - alpha) + 127) / 255) as u8
        };
        let Rgba([r, g, b, a]) = *pixel;
        *pixel = Rgba([
            mix(color.r, r),
            mix(color.g, g),
            mix(color.b, b),
            (alpha + u32::from(a) * (255 - alpha) / 255) as u8,
        ]);
    }
}

impl Surface for ImageSurface {
    fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        self.image = RgbaImage::new(width, height);
        Ok(())
    }

    fn set_fill_style(&mut self, color: Color) -> Result<(), Error> {
        self.fill = color;
        Ok(())
    }

    fn set_stroke_style(&mut self, color: Color) -> Result<(), Error> {
        self.stroke = color;
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect) -> Result<(), Error> {
        let (x0, y0, x1, y1) = self.pixel_bounds(rect)?;
        let color = self.fill;
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend(x, y, color);
            }
        }
        Ok(())
    }

    fn stroke_rect(&mut self, rect: Rect) -> Result<(), Error> {
        let (x0, y0, x1, y1) = self.pixel_bounds(rect)?;
        let color = self.stroke;
        for y in y0..y1 {
            for x in x0..x1 {
                if x == x0 || y == y0 || x + 1 == x1 || y + 1 == y1 {
                    self.blend(x, y, color);
                }
            }
        }
        Ok(())
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, align: TextAlign) -> Result<(), Error> {
        if !x.is_finite() || !y.is_finite() {
            return Err(RenderError::InvalidRect(Rect::new(x, y, 0.0, 0.0)).into());
        }
        let width = text_width(text) as f64;
        let left = match align {
            TextAlign::Right => x - width,
            TextAlign::Center => x - width / 2.0,
        };
        let top = (y - (GLYPH_HEIGHT * GLYPH_SCALE) as f64 / 2.0).round() as i64;
        let left = left.round() as i64;
        trace!("label {:?} at ({}, {})", text, left, top);

        let color = self.fill;
        for (i, ch) in text.chars().enumerate() {
            let origin = left + i as i64 * GLYPH_ADVANCE * GLYPH_SCALE;
            for (dy, &row) in glyph(ch).iter().enumerate() {
                for dx in 0..GLYPH_WIDTH {
                    if row & (1 << (GLYPH_WIDTH - 1 - dx)) != 0 {
                        self.blend_block(
                            origin + dx * GLYPH_SCALE,
                            top + dy as i64 * GLYPH_SCALE,
                            color,
                        );
                    }
                }
            }
        }
        Ok(())
    }
}

const GLYPH_WIDTH: i64 = 3;
const GLYPH_HEIGHT: i64 = 5;
/// Glyph width plus one column of spacing.
const GLYPH_ADVANCE: i64 = 4;
/// A 3x5 glyph drawn at this scale is ten pixels tall.
const GLYPH_SCALE: i64 = 2;

/// Rows of a 3x5 bitmap, most significant bit on the left.  Only what
/// a number label needs; anything else is blank.
fn glyph(ch: char) -> [u8; 5] {
    match ch {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        _ => [0; 5],
    }
}

/// Rendered width of a label in pixels, without trailing spacing.
fn text_width(text: &str) -> i64 {
    match text.chars().count() as i64 {
        0 => 0,
        n => (n * GLYPH_ADVANCE - (GLYPH_ADVANCE - GLYPH_WIDTH)) * GLYPH_SCALE,
    }
}

/// One call made against a `RecordingSurface`.
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceCall {
    /// `resize(width, height)`
    Resize(u32, u32),
    /// `set_fill_style(color)`
    SetFillStyle(Color),
    /// `set_stroke_style(color)`
    SetStrokeStyle(Color),
    /// `fill_rect(rect)`
    FillRect(Rect),
    /// `stroke_rect(rect)`
    StrokeRect(Rect),
    /// `fill_text(text, x, y, align)`
    FillText {
        /// The label.
        text: String,
        /// Anchor x.
        x: f64,
        /// Anchor y.
        y: f64,
        /// Anchoring.
        align: TextAlign,
    },
}

/// A surface that paints nothing and remembers every call, in order.
#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    /// The calls received so far.
    pub calls: Vec<SurfaceCall>,
}

impl RecordingSurface {
    /// An empty recording with the given size.
    pub fn new(width: u32, height: u32) -> Self {
        RecordingSurface {
            width,
            height,
            calls: Vec::new(),
        }
    }

    /// All rectangles filled while the given colour was the fill style.
    pub fn filled_with(&self, color: Color) -> Vec<Rect> {
        let mut current = None;
        let mut rects = Vec::new();
        for call in &self.calls {
            match call {
                SurfaceCall::SetFillStyle(c) => current = Some(*c),
                SurfaceCall::FillRect(r) if current == Some(color) => rects.push(*r),
                _ => {}
            }
        }
        rects
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        self.width = width;
        self.height = height;
        self.calls.push(SurfaceCall::Resize(width, height));
        Ok(())
    }

    fn set_fill_style(&mut self, color: Color) -> Result<(), Error> {
        self.calls.push(SurfaceCall::SetFillStyle(color));
        Ok(())
    }

    fn set_stroke_style(&mut self, color: Color) -> Result<(), Error> {
        self.calls.push(SurfaceCall::SetStrokeStyle(color));
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect) -> Result<(), Error> {
        self.calls.push(SurfaceCall::FillRect(rect));
        Ok(())
    }

    fn stroke_rect(&mut self, rect: Rect) -> Result<(), Error> {
        self.calls.push(SurfaceCall::StrokeRect(rect));
        Ok(())
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, align: TextAlign) -> Result<(), Error> {
        self.calls.push(SurfaceCall::FillText {
            text: text.to_string(),
            x,
            y,
            align,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colours() {
        assert_eq!("#000000".parse::<Color>().unwrap(), Color::BLACK);
        assert_eq!("#fff".parse::<Color>().unwrap(), Color::WHITE);
        assert_eq!("#1A2b3C".parse::<Color>().unwrap(), Color::rgb(0x1a, 0x2b, 0x3c));
        assert_eq!(
            "#000000e6".parse::<Color>().unwrap(),
            Color::rgba(0, 0, 0, 230)
        );
    }

    #[test]
    fn rejects_malformed_colours() {
        assert!("000000".parse::<Color>().is_err());
        assert!("#12345".parse::<Color>().is_err());
        assert!("#gggggg".parse::<Color>().is_err());
        assert!("".parse::<Color>().is_err());
    }

    #[test]
    fn fill_rect_rounds_and_clamps() {
        let mut surface = ImageSurface::new(10, 10);
        surface.set_fill_style(Color::rgb(255, 0, 0)).unwrap();
        surface.fill_rect(Rect::new(7.6, -3.0, 10.0, 4.4)).unwrap();
        assert_eq!(surface.pixel(8, 0), Color::rgb(255, 0, 0));
        assert_eq!(surface.pixel(9, 0), Color::rgb(255, 0, 0));
        assert_eq!(surface.pixel(7, 0), Color::rgba(0, 0, 0, 0));
        assert_eq!(surface.pixel(8, 1), Color::rgba(0, 0, 0, 0));
    }

    #[test]
    fn fill_rect_blends_translucent_colours() {
        let mut surface = ImageSurface::new(2, 2);
        surface.set_fill_style(Color::WHITE).unwrap();
        surface.fill_rect(Rect::new(0.0, 0.0, 2.0, 2.0)).unwrap();
        surface.set_fill_style(Color::rgba(0, 0, 0, 230)).unwrap();
        surface.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0)).unwrap();
        assert_eq!(surface.pixel(0, 0), Color::rgba(25, 25, 25, 255));
        assert_eq!(surface.pixel(1, 1), Color::WHITE);
    }

    #[test]
    fn stroke_rect_only_paints_the_outline() {
        let mut surface = ImageSurface::new(5, 5);
        surface.stroke_rect(Rect::new(0.0, 0.0, 5.0, 5.0)).unwrap();
        assert_eq!(surface.pixel(0, 2), Color::BLACK);
        assert_eq!(surface.pixel(4, 4), Color::BLACK);
        assert_eq!(surface.pixel(2, 2), Color::rgba(0, 0, 0, 0));
    }

    #[test]
    fn non_finite_rect_is_an_error() {
        let mut surface = ImageSurface::new(5, 5);
        let err = surface
            .fill_rect(Rect::new(std::f64::NAN, 0.0, 1.0, 1.0))
            .unwrap_err();
        match err.downcast_ref::<RenderError>() {
            Some(RenderError::InvalidRect(_)) => {}
            other => panic!("unexpected error {:?}", other),
        }
    }

    fn painted(surface: &ImageSurface) -> Vec<(u32, u32)> {
        let (width, height) = surface.size();
        let mut points = Vec::new();
        for y in 0..height {
            for x in 0..width {
                if surface.pixel(x, y) != Color::WHITE {
                    points.push((x, y));
                }
            }
        }
        points
    }

    fn label(text: &str, x: f64, y: f64, align: TextAlign) -> ImageSurface {
        let mut surface = ImageSurface::new(40, 20);
        surface.set_fill_style(Color::WHITE).unwrap();
        surface.fill_rect(Rect::new(0.0, 0.0, 40.0, 20.0)).unwrap();
        surface.set_fill_style(Color::BLACK).unwrap();
        surface.fill_text(text, x, y, align).unwrap();
        surface
    }

    #[test]
    fn labels_are_painted_with_the_fill_style() {
        let surface = label("-1.6", 30.0, 10.0, TextAlign::Right);
        let points = painted(&surface);
        assert!(!points.is_empty());
        for &(x, y) in &points {
            assert_eq!(surface.pixel(x, y), Color::BLACK);
        }
    }

    #[test]
    fn right_aligned_label_ends_at_the_anchor_and_centres_vertically() {
        // "10" is two glyphs: 2 * 8 - 2 = 14 pixels wide, 10 tall.
        let points = painted(&label("10", 30.0, 10.0, TextAlign::Right));
        let min_x = points.iter().map(|p| p.0).min().unwrap();
        let max_x = points.iter().map(|p| p.0).max().unwrap();
        let min_y = points.iter().map(|p| p.1).min().unwrap();
        let max_y = points.iter().map(|p| p.1).max().unwrap();
        assert_eq!((min_x, max_x), (16, 29));
        assert_eq!((min_y, max_y), (5, 14));
    }

    #[test]
    fn centred_label_straddles_the_anchor() {
        // "0" is 6 pixels wide, so it spans 17..23 around x = 20.
        let points = painted(&label("0", 20.0, 10.0, TextAlign::Center));
        let min_x = points.iter().map(|p| p.0).min().unwrap();
        let max_x = points.iter().map(|p| p.0).max().unwrap();
        assert_eq!((min_x, max_x), (17, 22));
    }

    #[test]
    fn labels_clip_at_the_edges() {
        let surface = label("-2", 0.0, 0.0, TextAlign::Center);
        assert!(!painted(&surface).is_empty());
    }

    #[test]
    fn pnm_extension_is_written_as_pnm() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.pnm");
        let mut surface = ImageSurface::new(3, 2);
        surface.set_fill_style(Color::WHITE).unwrap();
        surface.fill_rect(Rect::new(0.0, 0.0, 3.0, 2.0)).unwrap();
        surface.save(&path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], b"P6");
    }

    #[test]
    fn recording_tracks_fill_style() {
        let mut surface = RecordingSurface::new(4, 4);
        surface.set_fill_style(Color::WHITE).unwrap();
        surface.fill_rect(Rect::new(0.0, 0.0, 4.0, 4.0)).unwrap();
        surface.set_fill_style(Color::BLACK).unwrap();
        surface.fill_rect(Rect::new(1.0, 1.0, 1.0, 1.0)).unwrap();
        assert_eq!(surface.filled_with(Color::BLACK), vec![Rect::new(1.0, 1.0, 1.0, 1.0)]);
        assert_eq!(surface.filled_with(Color::WHITE).len(), 1);
    }
}
