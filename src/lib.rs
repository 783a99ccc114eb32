//! Capture signature images, place them on the pages of a PDF, and produce a
//! signed document for submission.
//!
//! The pieces mirror a signing dialog: a capture surface ([`DrawPad`],
//! [`TypedSignature`], [`UploadedImage`]) produces a [`SignatureImage`]; a
//! [`Viewport`] turns clicks into placement anchors; a [`PlacementSession`]
//! holds the placed signatures; the [`Compositor`] embeds them into the
//! document; and a [`SigningDialog`] ties all of it to the caller-supplied
//! [`DocumentSource`] and [`SignHandler`] boundaries.

mod capture;
mod compositor;
mod dialog;
mod error;
mod fetch;
mod fonts;
mod image_xobject;
mod raster;
mod session;
mod viewport;

pub use capture::{DrawPad, TypedSignature, UploadedImage, PAD_HEIGHT, PAD_WIDTH, TYPE_FONT_SIZE};
pub use compositor::{CompositionResult, Compositor};
pub use dialog::{SignHandler, SigningDialog, SubmissionRequest};
pub use error::{Error, ErrorKind};
pub use fetch::{DocumentSource, HttpSource};
pub use fonts::FontLibrary;
pub use raster::{SignatureImage, SignatureOrigin, WHITE_THRESHOLD};
pub use session::{PlacementRecord, PlacementSession};
pub use viewport::{
    InteractionMode, PlacementAnchor, Viewport, DEFAULT_BOX_HEIGHT, DEFAULT_BOX_WIDTH, MAX_SCALE,
    MIN_SCALE, REFERENCE_HEIGHT, REFERENCE_WIDTH, SCALE_STEP,
};

pub use lopdf;
