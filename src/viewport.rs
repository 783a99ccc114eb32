//! Viewport state for the signing dialog: which page is visible, at what
//! zoom, and how raw clicks translate into placement anchors.
//!
//! On-screen coordinates depend on the zoom active at click time; anchors are
//! normalized into *reference space* (the assumed base render size of a page,
//! [`REFERENCE_WIDTH`] x [`REFERENCE_HEIGHT`]) so a placement made at 1.5x
//! lands where a placement made at 0.5x would.

/// Assumed base pixel dimensions of a rendered page.
pub const REFERENCE_WIDTH: f32 = 800.0;
pub const REFERENCE_HEIGHT: f32 = 1100.0;

pub const MIN_SCALE: f32 = 0.5;
pub const MAX_SCALE: f32 = 2.0;
pub const SCALE_STEP: f32 = 0.1;

/// Default signature box, in reference-space pixels.
pub const DEFAULT_BOX_WIDTH: f32 = 200.0;
pub const DEFAULT_BOX_HEIGHT: f32 = 80.0;

/// Whether clicks place signatures or fall through to normal viewing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionMode {
    Review,
    Place,
}

/// A click resolved to reference space, ready to become a placement once the
/// capture surface confirms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementAnchor {
    pub page: u32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone)]
pub struct Viewport {
    current_page: u32,
    total_pages: u32,
    scale: f32,
    mode: InteractionMode,
}

impl Viewport {
    /// `total_pages` must be at least 1; the caller checks the document first.
    pub fn new(total_pages: u32) -> Self {
        debug_assert!(total_pages >= 1);
        Viewport {
            current_page: 1,
            total_pages,
            scale: 1.0,
            mode: InteractionMode::Review,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: InteractionMode) {
        self.mode = mode;
    }

    /// No-op at the last page.
    pub fn next_page(&mut self) {
        if self.current_page < self.total_pages {
            self.current_page += 1;
        }
    }

    /// No-op at the first page.
    pub fn prev_page(&mut self) {
        if self.current_page > 1 {
            self.current_page -= 1;
        }
    }

    pub fn zoom_in(&mut self) {
        self.scale = (self.scale + SCALE_STEP).min(MAX_SCALE);
    }

    pub fn zoom_out(&mut self) {
        self.scale = (self.scale - SCALE_STEP).max(MIN_SCALE);
    }

    pub fn reset_zoom(&mut self) {
        self.scale = 1.0;
    }

    /// Translate a click at on-screen offsets (relative to the rendered page's
    /// top-left corner, at the current zoom) into a placement anchor.
    ///
    /// Returns `None` while not in placement mode, and for clicks outside the
    /// rendered page area.
    pub fn click(&self, x: f32, y: f32) -> Option<PlacementAnchor> {
        if self.mode != InteractionMode::Place {
            return None;
        }
        let rendered_width = REFERENCE_WIDTH * self.scale;
        let rendered_height = REFERENCE_HEIGHT * self.scale;
        if x < 0.0 || y < 0.0 || x > rendered_width || y > rendered_height {
            log::debug!("ignoring click outside page bounds: ({}, {})", x, y);
            return None;
        }
        Some(PlacementAnchor {
            page: self.current_page,
            x: x / self.scale,
            y: y / self.scale,
            width: DEFAULT_BOX_WIDTH,
            height: DEFAULT_BOX_HEIGHT,
        })
    }
}
