//! The signing dialog: the caller-scoped object that owns the placement
//! session, the viewport and the external boundaries for one document.
//!
//! Created when the signing UI opens, dropped when it closes; no state
//! survives it.

use crate::compositor::Compositor;
use crate::fetch::DocumentSource;
use crate::raster::SignatureImage;
use crate::session::PlacementSession;
use crate::viewport::{PlacementAnchor, Viewport};
use crate::Error;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Metadata delivered alongside the signed document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    pub comments: String,
    pub placement_count: usize,
    pub signed_at: DateTime<Utc>,
}

/// The external submission boundary. The implementation owns the actual
/// upload endpoint; this crate never hardcodes it.
#[async_trait]
pub trait SignHandler: Send + Sync {
    async fn on_sign(
        &self,
        document: &[u8],
        proof_data_url: &str,
        request: &SubmissionRequest,
    ) -> Result<(), Error>;

    /// Invoked when the dialog is dismissed without submitting.
    async fn on_cancel(&self) {}
}

#[async_trait]
impl<T: SignHandler + ?Sized> SignHandler for std::sync::Arc<T> {
    async fn on_sign(
        &self,
        document: &[u8],
        proof_data_url: &str,
        request: &SubmissionRequest,
    ) -> Result<(), Error> {
        (**self).on_sign(document, proof_data_url, request).await
    }

    async fn on_cancel(&self) {
        (**self).on_cancel().await;
    }
}

pub struct SigningDialog<S: DocumentSource, H: SignHandler> {
    document_url: String,
    source: S,
    handler: H,
    session: PlacementSession,
    viewport: Viewport,
    compositor: Compositor,
    submit_in_flight: bool,
    open: bool,
}

impl<S: DocumentSource, H: SignHandler> SigningDialog<S, H> {
    /// Open the dialog for a document, fetching it once to learn the page
    /// count.
    pub async fn open(source: S, handler: H, document_url: impl Into<String>) -> Result<Self, Error> {
        let document_url = document_url.into();
        let bytes = source.fetch(&document_url).await?;
        let document = lopdf::Document::load_mem(&bytes)?;
        let total_pages = document.get_pages().len() as u32;
        if total_pages == 0 {
            return Err(Error::Composition("document has no pages".to_owned()));
        }

        Ok(SigningDialog {
            document_url,
            source,
            handler,
            session: PlacementSession::new(),
            viewport: Viewport::new(total_pages),
            compositor: Compositor::new(),
            submit_in_flight: false,
            open: true,
        })
    }

    pub fn session(&self) -> &PlacementSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut PlacementSession {
        &mut self.session
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn submit_in_flight(&self) -> bool {
        self.submit_in_flight
    }

    /// Resolve a click into an anchor; the UI then opens the capture surface.
    /// `None` when the click does not start a placement.
    pub fn begin_placement(&self, x: f32, y: f32) -> Option<PlacementAnchor> {
        self.viewport.click(x, y)
    }

    /// Record a confirmed capture at the anchor.
    pub fn confirm_placement(&mut self, image: SignatureImage, anchor: PlacementAnchor) -> Uuid {
        self.session.add_placement(
            image,
            anchor.page,
            anchor.x,
            anchor.y,
            anchor.width,
            anchor.height,
        )
    }

    /// Compose and deliver the signed document.
    ///
    /// Fails locally with a validation error when nothing is placed; on any
    /// failure the session is preserved so the user can retry. Success clears
    /// the session. A second call while one is in flight is a no-op.
    pub async fn submit(&mut self) -> Result<(), Error> {
        if self.submit_in_flight {
            log::debug!("submit ignored, one is already in flight");
            return Ok(());
        }
        if self.session.is_empty() {
            return Err(Error::Validation(
                "place at least one signature".to_owned(),
            ));
        }

        self.submit_in_flight = true;
        let outcome = self.submit_inner().await;
        self.submit_in_flight = false;

        if !self.open {
            // Dialog was closed while the submission ran; drop the result.
            log::debug!("dropping stale submission result for {}", self.document_url);
            return Ok(());
        }
        if outcome.is_ok() {
            self.session.clear_all();
        }
        outcome
    }

    async fn submit_inner(&mut self) -> Result<(), Error> {
        let source_bytes = self.source.fetch(&self.document_url).await?;
        let result = self.compositor.compose(&source_bytes, &self.session)?;
        let request = SubmissionRequest {
            comments: self.session.comments().to_owned(),
            placement_count: self.session.placements().len(),
            signed_at: Utc::now(),
        };
        self.handler
            .on_sign(result.document(), &result.proof_data_url(), &request)
            .await
    }

    /// Dismiss without submitting. No network call beyond the cancel
    /// notification; all placement state is discarded.
    pub async fn cancel(&mut self) {
        self.open = false;
        self.session.clear_all();
        self.handler.on_cancel().await;
    }
}
