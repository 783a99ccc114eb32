//! The signature capture surface: one finalized [`SignatureImage`] per
//! invocation, from exactly one of three modes (draw, type, upload).
//!
//! Nothing outside the surface is touched until a mode's finalizer succeeds;
//! every failure leaves the surface reusable so the user can retry or switch
//! modes.

use crate::fonts::FontLibrary;
use crate::raster::{self, SignatureImage, SignatureOrigin, WHITE_THRESHOLD};
use crate::Error;
use image::{imageops, Rgba, RgbaImage};
use rusttype::{point, Scale};

/// Capture canvas size, shared by all three modes.
pub const PAD_WIDTH: u32 = 400;
pub const PAD_HEIGHT: u32 = 200;

/// Point size for typed signatures.
pub const TYPE_FONT_SIZE: f32 = 48.0;

const INK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const PAD_BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Freehand draw mode. Records stroke paths; rasterizes on [`DrawPad::finish`].
#[derive(Debug, Clone)]
pub struct DrawPad {
    width: u32,
    height: u32,
    pen_radius: f32,
    strokes: Vec<Vec<(f32, f32)>>,
}

impl Default for DrawPad {
    fn default() -> Self {
        DrawPad {
            width: PAD_WIDTH,
            height: PAD_HEIGHT,
            pen_radius: 2.0,
            strokes: Vec::new(),
        }
    }
}

impl DrawPad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_stroke(&mut self) {
        self.strokes.push(Vec::new());
    }

    /// Append a point to the current stroke, starting one if needed.
    /// Coordinates are pad-relative pixels; out-of-range points are clamped
    /// when rasterized, not rejected.
    pub fn add_point(&mut self, x: f32, y: f32) {
        if self.strokes.is_empty() {
            self.strokes.push(Vec::new());
        }
        self.strokes
            .last_mut()
            .expect("stroke list is non-empty")
            .push((x, y));
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.iter().all(|stroke| stroke.is_empty())
    }

    /// Rasterize the recorded strokes into a signature image.
    ///
    /// Extraction is a two-step strategy: trim to the ink's bounding box,
    /// and fall back to the full canvas when the trim yields nothing usable.
    pub fn finish(&self) -> Result<SignatureImage, Error> {
        if self.is_empty() {
            return Err(Error::Validation("empty signature".to_owned()));
        }

        let mut canvas = RgbaImage::from_pixel(self.width, self.height, PAD_BACKGROUND);
        for stroke in &self.strokes {
            match stroke.as_slice() {
                [] => continue,
                [single] => self.stamp(&mut canvas, *single),
                points => {
                    for pair in points.windows(2) {
                        self.stamp_segment(&mut canvas, pair[0], pair[1]);
                    }
                }
            }
        }
        raster::key_out_white(&mut canvas, WHITE_THRESHOLD);

        let extracted = match self.trimmed(&canvas) {
            Some(trimmed) => trimmed,
            None => canvas,
        };
        SignatureImage::from_rgba(&extracted, SignatureOrigin::Drawn)
    }

    /// Crop to the ink bounds plus a pen-radius margin. `None` when there is
    /// no ink or the trimmed box would be degenerate.
    fn trimmed(&self, canvas: &RgbaImage) -> Option<RgbaImage> {
        let (x0, y0, x1, y1) = raster::ink_bounds(canvas)?;
        let margin = self.pen_radius.ceil() as u32;
        let x0 = x0.saturating_sub(margin);
        let y0 = y0.saturating_sub(margin);
        let x1 = (x1 + margin).min(self.width - 1);
        let y1 = (y1 + margin).min(self.height - 1);
        let (w, h) = (x1 - x0 + 1, y1 - y0 + 1);
        if w < 2 || h < 2 {
            return None;
        }
        Some(imageops::crop_imm(canvas, x0, y0, w, h).to_image())
    }

    fn stamp_segment(&self, canvas: &mut RgbaImage, from: (f32, f32), to: (f32, f32)) {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let length = (dx * dx + dy * dy).sqrt();
        let steps = (length / (self.pen_radius * 0.5).max(0.5)).ceil().max(1.0) as u32;
        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            self.stamp(canvas, (from.0 + dx * t, from.1 + dy * t));
        }
    }

    fn stamp(&self, canvas: &mut RgbaImage, center: (f32, f32)) {
        let radius = self.pen_radius;
        let x_min = (center.0 - radius).floor().max(0.0) as u32;
        let y_min = (center.1 - radius).floor().max(0.0) as u32;
        let x_max = ((center.0 + radius).ceil() as u32).min(self.width.saturating_sub(1));
        let y_max = ((center.1 + radius).ceil() as u32).min(self.height.saturating_sub(1));
        for y in y_min..=y_max {
            for x in x_min..=x_max {
                let (fx, fy) = (x as f32 - center.0, y as f32 - center.1);
                if fx * fx + fy * fy <= radius * radius {
                    canvas.put_pixel(x, y, INK);
                }
            }
        }
    }
}

/// Type mode: user-entered text rendered with a decorative font, centered on
/// a transparent canvas.
#[derive(Debug, Clone)]
pub struct TypedSignature {
    text: String,
    family: String,
}

impl TypedSignature {
    pub fn new(text: impl Into<String>, family: impl Into<String>) -> Self {
        TypedSignature {
            text: text.into(),
            family: family.into(),
        }
    }

    /// Render the text to a signature image.
    ///
    /// Awaits the font's readiness before rasterizing so the output uses the
    /// selected face, never a fallback.
    pub async fn rasterize(&self, fonts: &FontLibrary) -> Result<SignatureImage, Error> {
        if self.text.trim().is_empty() {
            return Err(Error::Validation(
                "typed signature text must not be empty".to_owned(),
            ));
        }
        let font = fonts.get(&self.family).await?;

        let scale = Scale::uniform(TYPE_FONT_SIZE);
        let v_metrics = font.v_metrics(scale);
        // Baseline such that ascender and descender sit symmetrically around
        // the canvas midline.
        let baseline = PAD_HEIGHT as f32 / 2.0 + (v_metrics.ascent + v_metrics.descent) / 2.0;
        let glyphs: Vec<_> = font
            .layout(self.text.trim(), scale, point(0.0, baseline))
            .collect();

        let mut min_x = i32::MAX;
        let mut max_x = i32::MIN;
        for glyph in &glyphs {
            if let Some(bb) = glyph.pixel_bounding_box() {
                min_x = min_x.min(bb.min.x);
                max_x = max_x.max(bb.max.x);
            }
        }
        if min_x > max_x {
            return Err(Error::Render(
                "font produced no visible glyphs".to_owned(),
            ));
        }
        let offset_x = (PAD_WIDTH as i32 - (max_x - min_x)) / 2 - min_x;

        let mut canvas = RgbaImage::new(PAD_WIDTH, PAD_HEIGHT);
        for glyph in &glyphs {
            if let Some(bb) = glyph.pixel_bounding_box() {
                glyph.draw(|gx, gy, coverage| {
                    let px = bb.min.x + gx as i32 + offset_x;
                    let py = bb.min.y + gy as i32;
                    if px < 0 || py < 0 || px >= PAD_WIDTH as i32 || py >= PAD_HEIGHT as i32 {
                        return;
                    }
                    let alpha = (coverage * 255.0).round() as u8;
                    let pixel = canvas.get_pixel_mut(px as u32, py as u32);
                    pixel.0 = [0, 0, 0, pixel.0[3].max(alpha)];
                });
            }
        }
        SignatureImage::from_rgba(&canvas, SignatureOrigin::Typed)
    }
}

/// Upload mode: a user-selected raster file, resampled onto the pad box with
/// its near-white background removed.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    data: Vec<u8>,
}

impl UploadedImage {
    pub fn new(data: Vec<u8>) -> Result<Self, Error> {
        if data.is_empty() {
            return Err(Error::Validation("no file selected".to_owned()));
        }
        Ok(UploadedImage { data })
    }

    pub fn rasterize(&self) -> Result<SignatureImage, Error> {
        let decoded = image::load_from_memory(&self.data)?.to_rgba8();
        let mut resampled =
            imageops::resize(&decoded, PAD_WIDTH, PAD_HEIGHT, imageops::FilterType::Triangle);
        raster::key_out_white(&mut resampled, WHITE_THRESHOLD);
        SignatureImage::from_rgba(&resampled, SignatureOrigin::Uploaded)
    }
}
