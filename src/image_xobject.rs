//! PDF Image XObjects for signature rasters.
//!
//! Signature images are always 8-bit RGBA PNGs (our own capture surface
//! encodes them), so decoding is strict: the color channels become a
//! `DeviceRGB` image stream and the alpha channel becomes a `DeviceGray`
//! soft-mask stream referenced through `SMask`.

use crate::Error;
use lopdf::ObjectId;
use std::io::Read;

#[derive(Debug, Clone)]
pub(crate) struct ImageXObject {
    pub width: u32,
    pub height: u32,
    /// Grayscale soft masks set this; color images use DeviceRGB.
    pub device_gray: bool,
    pub image_data: Vec<u8>,
    pub s_mask: Option<ObjectId>,
}

impl ImageXObject {
    /// Decode an RGBA PNG into a color image and its alpha soft mask.
    pub(crate) fn decode_rgba_png<R: Read>(
        decoder: png::Decoder<R>,
    ) -> Result<(Self, Self), Error> {
        let mut reader = decoder.read_info()?;
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf)?;
        if info.color_type != png::ColorType::Rgba || info.bit_depth != png::BitDepth::Eight {
            return Err(Error::Composition(format!(
                "signature raster must be 8-bit RGBA, got {:?}/{:?}",
                info.color_type, info.bit_depth
            )));
        }
        let data = &buf[..info.buffer_size()];

        let mut rgb = Vec::with_capacity(data.len() / 4 * 3);
        let mut alpha = Vec::with_capacity(data.len() / 4);
        for pixel in data.chunks_exact(4) {
            rgb.extend_from_slice(&pixel[..3]);
            alpha.push(pixel[3]);
        }

        let color = ImageXObject {
            width: info.width,
            height: info.height,
            device_gray: false,
            image_data: rgb,
            s_mask: None, // filled in once the mask has an object id
        };
        let mask = ImageXObject {
            width: info.width,
            height: info.height,
            device_gray: true,
            image_data: alpha,
            s_mask: None,
        };
        Ok((color, mask))
    }
}

impl From<ImageXObject> for lopdf::Stream {
    fn from(image: ImageXObject) -> Self {
        use lopdf::Object::*;

        let color_space = if image.device_gray {
            "DeviceGray"
        } else {
            "DeviceRGB"
        };
        let mut dict = lopdf::Dictionary::from_iter(vec![
            ("Type", Name("XObject".as_bytes().to_vec())),
            ("Subtype", Name("Image".as_bytes().to_vec())),
            ("Width", Integer(image.width as i64)),
            ("Height", Integer(image.height as i64)),
            ("BitsPerComponent", Integer(8)),
            ("Interpolate", false.into()),
            ("ColorSpace", Name(color_space.as_bytes().to_vec())),
        ]);
        if let Some(s_mask) = image.s_mask {
            dict.set("SMask", Reference(s_mask));
        }

        lopdf::Stream::new(dict, image.image_data)
    }
}

impl From<ImageXObject> for lopdf::Object {
    fn from(image: ImageXObject) -> Self {
        lopdf::Object::Stream(image.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn rgba_png_splits_into_color_and_mask() {
        let mut raster = RgbaImage::new(2, 2);
        raster.put_pixel(0, 0, Rgba([10, 20, 30, 255]));
        raster.put_pixel(1, 1, Rgba([40, 50, 60, 0]));
        let png = crate::raster::encode_png(&raster).unwrap();

        let (color, mask) = ImageXObject::decode_rgba_png(png::Decoder::new(&png[..])).unwrap();
        assert_eq!((color.width, color.height), (2, 2));
        assert_eq!(color.image_data.len(), 2 * 2 * 3);
        assert_eq!(&color.image_data[..3], &[10, 20, 30]);
        assert_eq!(mask.image_data, vec![255, 0, 0, 0]);
        assert!(mask.device_gray);
    }

    #[test]
    fn non_rgba_png_is_rejected() {
        // Encode a grayscale PNG by hand.
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, 2, 1);
            encoder.set_color(png::ColorType::Grayscale);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[0, 255]).unwrap();
        }
        let err = ImageXObject::decode_rgba_png(png::Decoder::new(&out[..])).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Composition);
    }

    #[test]
    fn mask_reference_lands_in_the_stream_dictionary() {
        let image = ImageXObject {
            width: 1,
            height: 1,
            device_gray: false,
            image_data: vec![1, 2, 3],
            s_mask: Some((42, 0)),
        };
        let stream: lopdf::Stream = image.into();
        assert!(stream.dict.has(b"SMask"));
    }
}
