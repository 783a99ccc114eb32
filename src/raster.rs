//! Signature rasters: transparent-background RGBA images, encoded as PNG
//! before anything downstream touches them.

use crate::Error;
use image::RgbaImage;

/// Channel value above which a pixel counts as background white.
pub const WHITE_THRESHOLD: u8 = 240;

/// Which capture mode produced a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureOrigin {
    Drawn,
    Typed,
    Uploaded,
}

/// A finalized signature image.
///
/// Always holds an RGBA PNG with the background already keyed out. The raw
/// raster is dropped at construction; everything downstream (placement
/// records, the compositor, the proof artifact) works from the encoded bytes.
#[derive(Debug, Clone)]
pub struct SignatureImage {
    png: Vec<u8>,
    width: u32,
    height: u32,
    origin: SignatureOrigin,
}

impl SignatureImage {
    /// Encode a raster into a signature image.
    ///
    /// Rejects degenerate payloads: a zero-sized canvas or one with no visible
    /// ink decodes to nothing worth placing.
    pub fn from_rgba(image: &RgbaImage, origin: SignatureOrigin) -> Result<Self, Error> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::Render("signature raster has no pixels".to_owned()));
        }
        if is_blank(image) {
            return Err(Error::Render(
                "signature raster has no visible content".to_owned(),
            ));
        }
        let png = encode_png(image)?;
        Ok(SignatureImage {
            png,
            width,
            height,
            origin,
        })
    }

    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn origin(&self) -> SignatureOrigin {
        self.origin
    }
}

/// Make near-white pixels fully transparent.
///
/// A pixel is keyed out when all of R, G and B exceed `threshold`. This is the
/// background-removal approximation for drawn and uploaded signatures; typed
/// signatures are rendered onto a transparent canvas and never need it.
pub(crate) fn key_out_white(image: &mut RgbaImage, threshold: u8) {
    for pixel in image.pixels_mut() {
        let [r, g, b, _] = pixel.0;
        if r > threshold && g > threshold && b > threshold {
            pixel.0[3] = 0;
        }
    }
}

/// Bounding box of all pixels with non-zero alpha, as (x0, y0, x1, y1)
/// inclusive. `None` when the raster is fully transparent.
pub(crate) fn ink_bounds(image: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel.0[3] == 0 {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    bounds
}

pub(crate) fn is_blank(image: &RgbaImage) -> bool {
    image.pixels().all(|pixel| pixel.0[3] == 0)
}

pub(crate) fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, Error> {
    let (width, height) = image.dimensions();
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(image.as_raw())?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn white_canvas(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]))
    }

    #[test]
    fn keying_clears_every_near_white_pixel() {
        let mut image = white_canvas(8, 8);
        image.put_pixel(3, 3, Rgba([0, 0, 0, 255]));
        image.put_pixel(4, 4, Rgba([241, 241, 241, 255]));
        key_out_white(&mut image, WHITE_THRESHOLD);

        // The only opaque pixel left is the ink.
        let opaque: Vec<_> = image
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[3] != 0)
            .collect();
        assert_eq!(opaque.len(), 1);
        assert_eq!((opaque[0].0, opaque[0].1), (3, 3));
    }

    #[test]
    fn keying_keeps_dark_and_colored_pixels() {
        let mut image = white_canvas(4, 4);
        image.put_pixel(0, 0, Rgba([240, 240, 240, 255])); // at threshold, not above
        image.put_pixel(1, 1, Rgba([250, 10, 10, 255])); // red, not background
        key_out_white(&mut image, WHITE_THRESHOLD);
        assert_eq!(image.get_pixel(0, 0).0[3], 255);
        assert_eq!(image.get_pixel(1, 1).0[3], 255);
    }

    #[test]
    fn ink_bounds_cover_exactly_the_opaque_region() {
        let mut image = RgbaImage::new(20, 10);
        image.put_pixel(5, 2, Rgba([0, 0, 0, 255]));
        image.put_pixel(12, 7, Rgba([0, 0, 0, 128]));
        assert_eq!(ink_bounds(&image), Some((5, 2, 12, 7)));
    }

    #[test]
    fn from_rgba_rejects_fully_transparent_rasters() {
        let image = RgbaImage::new(10, 10);
        let err = SignatureImage::from_rgba(&image, SignatureOrigin::Drawn).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Render);
    }

    #[test]
    fn from_rgba_encodes_a_decodable_png() {
        let mut image = RgbaImage::new(6, 4);
        image.put_pixel(1, 1, Rgba([0, 0, 0, 255]));
        let signature = SignatureImage::from_rgba(&image, SignatureOrigin::Uploaded).unwrap();
        assert_eq!(signature.width(), 6);
        assert_eq!(signature.height(), 4);

        let decoder = png::Decoder::new(signature.png_bytes());
        let reader = decoder.read_info().unwrap();
        let info = reader.info();
        assert_eq!(info.color_type, png::ColorType::Rgba);
        assert_eq!((info.width, info.height), (6, 4));
    }
}
