//! Embeds a session's signature placements into the source document.
//!
//! Placement coordinates arrive in reference viewport space (origin top-left,
//! y growing downward); PDF page space has its origin bottom-left with y
//! growing upward, so the transform scales by page/reference ratios and flips
//! the vertical axis.
//!
//! Composition is atomic by construction: it is a pure function from source
//! bytes to signed bytes, so any failure simply means no output document.

use crate::image_xobject::ImageXObject;
use crate::session::PlacementSession;
use crate::viewport::{REFERENCE_HEIGHT, REFERENCE_WIDTH};
use crate::Error;
use lopdf::{Document, Object, ObjectId};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Letter-size fallback for pages without an explicit MediaBox.
const FALLBACK_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// A placement rectangle in page space.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Rectangle {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// The signed document plus the "signed-by" proof raster.
#[derive(Debug, Clone)]
pub struct CompositionResult {
    document: Vec<u8>,
    proof: Vec<u8>,
}

impl CompositionResult {
    pub fn document(&self) -> &[u8] {
        &self.document
    }

    /// PNG of the first placed signature.
    pub fn proof_png(&self) -> &[u8] {
        &self.proof
    }

    pub fn proof_data_url(&self) -> String {
        format!("data:image/png;base64,{}", base64::encode(&self.proof))
    }
}

/// Stateless compositor; reference dimensions are configurable because the
/// defaults are an assumption about the rendering surface, not a measurement.
#[derive(Debug, Clone)]
pub struct Compositor {
    reference_width: f32,
    reference_height: f32,
}

impl Default for Compositor {
    fn default() -> Self {
        Compositor {
            reference_width: REFERENCE_WIDTH,
            reference_height: REFERENCE_HEIGHT,
        }
    }
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// A compositor for callers that measure their real render surface
    /// instead of assuming the reference constants.
    pub fn with_reference_size(reference_width: f32, reference_height: f32) -> Self {
        Compositor {
            reference_width,
            reference_height,
        }
    }

    /// Embed every placement of `session` into `source` and serialize the
    /// result. Placements are stamped in insertion order; overlapping
    /// placements overlay earlier ones.
    pub fn compose(
        &self,
        source: &[u8],
        session: &PlacementSession,
    ) -> Result<CompositionResult, Error> {
        if session.is_empty() {
            return Err(Error::Validation(
                "place at least one signature".to_owned(),
            ));
        }

        let mut document = Document::load_mem(source)?;
        let pages = document.get_pages();
        // One XObject per distinct raster, shared across placements.
        let mut embedded: HashMap<[u8; 32], ObjectId> = HashMap::new();

        for record in session.placements() {
            let page_id = match pages.get(&record.page()) {
                Some(page_id) => *page_id,
                None => {
                    // Should not occur: the viewport enforces page bounds.
                    log::warn!(
                        "skipping placement {} on nonexistent page {}",
                        record.id(),
                        record.page()
                    );
                    continue;
                }
            };

            let (page_width, page_height) = page_size(&document, page_id)?;
            let rect = to_page_space(
                record.x(),
                record.y(),
                record.width(),
                record.height(),
                page_width,
                page_height,
                self.reference_width,
                self.reference_height,
            );

            let digest: [u8; 32] = Sha256::digest(record.image().png_bytes()).into();
            let image_name = xobject_name(&digest);
            let image_id = match embedded.get(&digest) {
                // Raster was already embedded, reuse the object.
                Some(image_id) => *image_id,
                None => {
                    let image_id = add_image_xobject(&mut document, record.image().png_bytes())?;
                    embedded.insert(digest, image_id);
                    image_id
                }
            };
            // The name is digest-derived, so re-adding it to a page's
            // resources is a no-op rather than a duplicate.
            document.add_xobject(page_id, image_name.as_bytes().to_vec(), image_id)?;
            stamp_page_content(&mut document, page_id, &image_name, rect)?;
            log::info!(
                "inserted signature {} on page {} at ({:.1}, {:.1}) objId: ({},{})",
                record.id(),
                record.page(),
                rect.x1,
                rect.y1,
                image_id.0,
                image_id.1,
            );
        }

        let mut bytes = Vec::new();
        document.save_to(&mut bytes).map_err(lopdf::Error::from)?;
        let proof = session.placements()[0].image().png_bytes().to_vec();
        Ok(CompositionResult {
            document: bytes,
            proof,
        })
    }
}

/// Transform a reference-space box into page space.
///
/// x and width scale by `page_width / reference_width`, y and height by
/// `page_height / reference_height`; the vertical axis flips because screen
/// coordinates grow downward while page coordinates grow upward.
#[allow(clippy::too_many_arguments)]
pub(crate) fn to_page_space(
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    page_width: f32,
    page_height: f32,
    reference_width: f32,
    reference_height: f32,
) -> Rectangle {
    let scale_x = page_width / reference_width;
    let scale_y = page_height / reference_height;
    let scaled_width = width * scale_x;
    let scaled_height = height * scale_y;
    let page_x = x * scale_x;
    let page_y = page_height - y * scale_y - scaled_height;
    Rectangle {
        x1: page_x,
        y1: page_y,
        x2: page_x + scaled_width,
        y2: page_y + scaled_height,
    }
}

fn add_image_xobject(document: &mut Document, png_bytes: &[u8]) -> Result<ObjectId, Error> {
    let decoder = png::Decoder::new(png_bytes);
    let (mut color, mask) = ImageXObject::decode_rgba_png(decoder)?;
    let mask_id = document.add_object(mask);
    color.s_mask = Some(mask_id);
    Ok(document.add_object(color))
}

/// Width/height of a page from its MediaBox; Letter when absent.
fn page_size(document: &Document, page_id: ObjectId) -> Result<(f32, f32), Error> {
    let page_dict = document.get_object(page_id)?.as_dict()?;
    let media_box = match page_dict.get(b"MediaBox") {
        Ok(media_box) => media_box.as_array()?,
        Err(_) => {
            log::warn!("page ({},{}) has no MediaBox, assuming Letter", page_id.0, page_id.1);
            return Ok(FALLBACK_PAGE_SIZE);
        }
    };
    if media_box.len() < 4 {
        return Err(Error::Composition("MediaBox has fewer than 4 entries".to_owned()));
    }
    let llx = object_as_f32(&media_box[0])?;
    let lly = object_as_f32(&media_box[1])?;
    let urx = object_as_f32(&media_box[2])?;
    let ury = object_as_f32(&media_box[3])?;
    Ok((urx - llx, ury - lly))
}

fn object_as_f32(object: &Object) -> Result<f32, Error> {
    match object {
        Object::Integer(value) => Ok(*value as f32),
        Object::Real(value) => Ok(*value),
        _ => Err(Error::Composition(
            "MediaBox entry is not a number".to_owned(),
        )),
    }
}

fn xobject_name(digest: &[u8; 32]) -> String {
    let mut name = String::from("Sig");
    for byte in &digest[..8] {
        name.push_str(&format!("{:02x}", byte));
    }
    name
}

/// Append `q`/`cm`/`Do`/`Q` to the page content so the named XObject is drawn
/// at `rect`. See PDF 1.7 spec, Table A.1 for the operators.
fn stamp_page_content(
    document: &mut Document,
    page_id: ObjectId,
    xobject_name: &str,
    rect: Rectangle,
) -> Result<(), Error> {
    use lopdf::{content::Operation, Object::Name};
    let mut content = document.get_and_decode_page_content(page_id)?;
    let position = (rect.x1, rect.y1);
    let size = (rect.x2 - rect.x1, rect.y2 - rect.y1);
    // `q` = save graphics state
    content.operations.push(Operation::new("q", vec![]));
    // `cm` = concatenate matrix to current transformation matrix
    content.operations.push(Operation::new(
        "cm",
        vec![
            size.0.into(),
            0i32.into(),
            0i32.into(),
            size.1.into(),
            position.0.into(),
            position.1.into(),
        ],
    ));
    // `Do` = invoke named XObject
    content.operations.push(Operation::new(
        "Do",
        vec![Name(xobject_name.as_bytes().to_vec())],
    ));
    // `Q` = restore graphics state
    content.operations.push(Operation::new("Q", vec![]));

    document.change_page_content(page_id, content.encode()?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{SignatureImage, SignatureOrigin};
    use crate::ErrorKind;
    use image::{Rgba, RgbaImage};
    use lopdf::{content::Content, content::Operation, Dictionary, Stream};

    fn test_signature() -> SignatureImage {
        let mut raster = RgbaImage::new(20, 8);
        for x in 2..18 {
            raster.put_pixel(x, 4, Rgba([0, 0, 0, 255]));
        }
        SignatureImage::from_rgba(&raster, SignatureOrigin::Drawn).unwrap()
    }

    fn create_test_pdf(num_pages: u32) -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let mut page_ids = Vec::new();

        for _ in 0..num_pages {
            let content = Content {
                operations: vec![Operation::new("BT", vec![]), Operation::new("ET", vec![])],
            };
            let content_id =
                doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
            let page = Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                (
                    "MediaBox",
                    Object::Array(vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(612),
                        Object::Integer(792),
                    ]),
                ),
                ("Contents", Object::Reference(content_id)),
            ]);
            page_ids.push(doc.add_object(page));
        }

        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(num_pages as i64)),
            (
                "Kids",
                Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
            ),
        ]);
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]);
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    fn count_image_xobjects(bytes: &[u8]) -> usize {
        let doc = Document::load_mem(bytes).unwrap();
        doc.objects
            .values()
            .filter(|object| match object {
                Object::Stream(stream) => matches!(
                    stream.dict.get(b"Subtype").and_then(|s| s.as_name()),
                    Ok(b"Image")
                ),
                _ => false,
            })
            .count()
    }

    #[test]
    fn empty_session_is_a_validation_error() {
        let pdf = create_test_pdf(1);
        let session = PlacementSession::new();
        let err = Compositor::new().compose(&pdf, &session).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn single_placement_embeds_one_image_on_page_one() {
        let pdf = create_test_pdf(2);
        let mut session = PlacementSession::new();
        session.add_placement(test_signature(), 1, 100.0, 200.0, 200.0, 80.0);

        let result = Compositor::new().compose(&pdf, &session).unwrap();
        // One color image plus its soft mask.
        assert_eq!(count_image_xobjects(result.document()), 2);

        let doc = Document::load_mem(result.document()).unwrap();
        let pages = doc.get_pages();
        let content = doc.get_and_decode_page_content(pages[&1]).unwrap();
        assert!(content.operations.iter().any(|op| op.operator == "Do"));
        let untouched = doc.get_and_decode_page_content(pages[&2]).unwrap();
        assert!(untouched.operations.iter().all(|op| op.operator != "Do"));
    }

    #[test]
    fn identical_rasters_share_one_embedded_image() {
        let pdf = create_test_pdf(2);
        let signature = test_signature();
        let mut session = PlacementSession::new();
        session.add_placement(signature.clone(), 1, 50.0, 50.0, 200.0, 80.0);
        session.add_placement(signature, 2, 300.0, 400.0, 200.0, 80.0);

        let result = Compositor::new().compose(&pdf, &session).unwrap();
        // Still just one color image and one mask despite two placements.
        assert_eq!(count_image_xobjects(result.document()), 2);
    }

    #[test]
    fn placement_on_a_missing_page_is_skipped() {
        let pdf = create_test_pdf(1);
        let mut session = PlacementSession::new();
        session.add_placement(test_signature(), 5, 10.0, 10.0, 200.0, 80.0);
        // No page 5; composition succeeds with nothing embedded.
        let result = Compositor::new().compose(&pdf, &session).unwrap();
        assert_eq!(count_image_xobjects(result.document()), 0);
    }

    #[test]
    fn unparseable_source_fails_without_output() {
        let mut session = PlacementSession::new();
        session.add_placement(test_signature(), 1, 10.0, 10.0, 200.0, 80.0);
        let err = Compositor::new()
            .compose(b"not a pdf at all", &session)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Composition);
    }

    #[test]
    fn proof_is_the_first_placements_raster() {
        let pdf = create_test_pdf(1);
        let first = test_signature();
        let mut second_raster = RgbaImage::new(10, 10);
        second_raster.put_pixel(5, 5, Rgba([0, 0, 255, 255]));
        let second = SignatureImage::from_rgba(&second_raster, SignatureOrigin::Typed).unwrap();

        let mut session = PlacementSession::new();
        session.add_placement(first.clone(), 1, 0.0, 0.0, 200.0, 80.0);
        session.add_placement(second, 1, 100.0, 100.0, 200.0, 80.0);

        let result = Compositor::new().compose(&pdf, &session).unwrap();
        assert_eq!(result.proof_png(), first.png_bytes());
        assert!(result.proof_data_url().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn vertical_axis_flips_into_page_space() {
        // A box at the very top of the reference viewport lands at the very
        // top of the page, i.e. y1 near page_height - box height.
        let rect = to_page_space(0.0, 0.0, 200.0, 80.0, 612.0, 792.0, 800.0, 1100.0);
        assert!((rect.x1 - 0.0).abs() < 1e-3);
        let expected_height = 80.0 * 792.0 / 1100.0;
        assert!((rect.y1 - (792.0 - expected_height)).abs() < 1e-3);
        assert!((rect.y2 - 792.0).abs() < 1e-3);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Native-space origin equals (x*Pw/Rw, Ph - y*Ph/Rh - h*Ph/Rh) and
        /// size equals (w*Pw/Rw, h*Ph/Rh).
        #[test]
        fn transform_matches_the_reference_formula(
            x in 0.0f32..800.0,
            y in 0.0f32..1100.0,
            width in 10.0f32..400.0,
            height in 10.0f32..200.0,
            page_width in 100.0f32..2000.0,
            page_height in 100.0f32..2000.0,
        ) {
            let rect = to_page_space(x, y, width, height, page_width, page_height, 800.0, 1100.0);
            let expected_x = x * page_width / 800.0;
            let expected_w = width * page_width / 800.0;
            let expected_h = height * page_height / 1100.0;
            let expected_y = page_height - y * page_height / 1100.0 - expected_h;
            prop_assert!((rect.x1 - expected_x).abs() < 0.05);
            prop_assert!((rect.y1 - expected_y).abs() < 0.05);
            prop_assert!(((rect.x2 - rect.x1) - expected_w).abs() < 0.05);
            prop_assert!(((rect.y2 - rect.y1) - expected_h).abs() < 0.05);
        }

        /// The transformed box always stays inside the page when the input
        /// box is inside the reference viewport.
        #[test]
        fn boxes_inside_the_viewport_stay_inside_the_page(
            x in 0.0f32..600.0,
            y in 0.0f32..1020.0,
            page_width in 100.0f32..2000.0,
            page_height in 100.0f32..2000.0,
        ) {
            let rect = to_page_space(x, y, 200.0, 80.0, page_width, page_height, 800.0, 1100.0);
            prop_assert!(rect.x1 >= -0.05);
            prop_assert!(rect.y1 >= -0.05);
            prop_assert!(rect.x2 <= page_width + 0.05);
            prop_assert!(rect.y2 <= page_height + 0.05);
        }
    }
}
