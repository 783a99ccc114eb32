use std::fmt;

/// What went wrong, grouped the way the UI reports it.
///
/// Every [`Error`] maps to exactly one kind; the kind decides which
/// user-facing message is shown and whether retrying locally makes sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Required input is missing (empty signature, no file, no placements).
    Validation,
    /// The capture surface failed to produce a usable raster.
    Render,
    /// Document fetch, page resolution, embedding or serialization failed.
    Composition,
    /// The external submission boundary rejected the signed document.
    Submission,
}

#[derive(Debug)]
pub enum Error {
    Validation(String),
    Render(String),
    Composition(String),
    Submission(String),
    LoPdfError(lopdf::Error),
    PngDecodeError(png::DecodingError),
    PngEncodeError(png::EncodingError),
    ImageError(image::ImageError),
    HttpError(reqwest::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::Render(_) | Error::PngEncodeError(_) | Error::ImageError(_) => {
                ErrorKind::Render
            }
            Error::Composition(_)
            | Error::LoPdfError(_)
            | Error::PngDecodeError(_)
            | Error::HttpError(_) => ErrorKind::Composition,
            Error::Submission(_) => ErrorKind::Submission,
        }
    }

    /// Message shown to the user at the signing dialog boundary.
    /// Composition failures are deliberately generic.
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::Render | ErrorKind::Submission => self.to_string(),
            ErrorKind::Composition => "failed to process document".to_owned(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Validation(msg) => write!(f, "{}", msg),
            Error::Render(msg) => write!(f, "{}", msg),
            Error::Composition(msg) => write!(f, "{}", msg),
            Error::Submission(msg) => write!(f, "{}", msg),
            Error::LoPdfError(err) => write!(f, "pdf error: {}", err),
            Error::PngDecodeError(err) => write!(f, "png decode error: {}", err),
            Error::PngEncodeError(err) => write!(f, "png encode error: {}", err),
            Error::ImageError(err) => write!(f, "image error: {}", err),
            Error::HttpError(err) => write!(f, "http error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::LoPdfError(err) => Some(err),
            Error::PngDecodeError(err) => Some(err),
            Error::PngEncodeError(err) => Some(err),
            Error::ImageError(err) => Some(err),
            Error::HttpError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Self::LoPdfError(err)
    }
}

impl From<png::DecodingError> for Error {
    fn from(err: png::DecodingError) -> Self {
        Self::PngDecodeError(err)
    }
}

impl From<png::EncodingError> for Error {
    fn from(err: png::EncodingError) -> Self {
        Self::PngEncodeError(err)
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Self::ImageError(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::HttpError(err)
    }
}
