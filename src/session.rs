//! The in-memory model of a signing session: an ordered list of placed
//! signatures plus the session-level comments.

use crate::raster::SignatureImage;
use uuid::Uuid;

/// One signature anchored to a page.
///
/// Coordinates and box size are in reference viewport space (see
/// [`crate::viewport`]). A record is never mutated after creation;
/// a correction is a remove followed by a new placement.
#[derive(Debug, Clone)]
pub struct PlacementRecord {
    id: Uuid,
    image: SignatureImage,
    page: u32,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl PlacementRecord {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn image(&self) -> &SignatureImage {
        &self.image
    }

    /// 1-based page index in the source document.
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }
}

/// Owned by the signing dialog that opened it; torn down with it.
#[derive(Debug, Clone, Default)]
pub struct PlacementSession {
    placements: Vec<PlacementRecord>,
    comments: String,
}

impl PlacementSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a placement and return its freshly generated id.
    pub fn add_placement(
        &mut self,
        image: SignatureImage,
        page: u32,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.placements.push(PlacementRecord {
            id,
            image,
            page,
            x,
            y,
            width,
            height,
        });
        id
    }

    /// Remove by id. Removing an absent id is a no-op.
    pub fn remove_placement(&mut self, id: Uuid) {
        self.placements.retain(|record| record.id != id);
    }

    pub fn clear_all(&mut self) {
        self.placements.clear();
    }

    /// Placements in insertion order.
    pub fn placements(&self) -> &[PlacementRecord] {
        &self.placements
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn comments(&self) -> &str {
        &self.comments
    }

    pub fn set_comments(&mut self, comments: impl Into<String>) {
        self.comments = comments.into();
    }
}
