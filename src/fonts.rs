//! Decorative fonts for typed signatures.
//!
//! Rasterizing a typed signature must wait until the chosen font is actually
//! loaded, otherwise the output silently falls back to whatever is at hand.
//! [`FontLibrary::get`] is that readiness point: it resolves once the font
//! bytes are read and parsed, and caches the parsed font for reuse.

use crate::Error;
use rusttype::Font;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub struct FontLibrary {
    dir: PathBuf,
    cache: Mutex<HashMap<String, Arc<Font<'static>>>>,
}

impl FontLibrary {
    /// A library serving `<family>.ttf` files from `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FontLibrary {
            dir: dir.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a font family, loading it on first use.
    ///
    /// Family names are plain file stems; anything that looks like a path is
    /// rejected rather than resolved outside the font directory.
    pub async fn get(&self, family: &str) -> Result<Arc<Font<'static>>, Error> {
        if family.is_empty() {
            return Err(Error::Validation("no font family selected".to_owned()));
        }
        if family.contains(['/', '\\', '.']) {
            return Err(Error::Validation(format!(
                "invalid font family name `{}`",
                family
            )));
        }

        if let Some(font) = self.cache.lock().unwrap().get(family) {
            return Ok(font.clone());
        }

        let path = self.dir.join(format!("{}.ttf", family));
        let data = tokio::fs::read(&path).await.map_err(|err| {
            Error::Render(format!("font `{}` is not available: {}", family, err))
        })?;
        let font = Font::try_from_vec(data)
            .ok_or_else(|| Error::Render(format!("font `{}` could not be parsed", family)))?;

        let font = Arc::new(font);
        self.cache
            .lock()
            .unwrap()
            .insert(family.to_owned(), font.clone());
        log::debug!("loaded font family `{}` from {:?}", family, path);
        Ok(font)
    }
}
