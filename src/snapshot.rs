use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageFormat, RgbaImage};
use thiserror::Error;

use crate::surface::Surface;

/// Prefix of every serialized snapshot.
pub const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Errors that can occur while encoding or decoding a snapshot
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("PNG codec error: {0}")]
    Codec(#[from] image::ImageError),

    #[error("failed to decode base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("snapshot is not a PNG data URL")]
    MalformedDataUrl,
}

/// A serialized, decodable encoding of a surface's bitmap.
///
/// The payload is a PNG wrapped in a base64 data URL, so the same value is
/// usable for durable checkpoints, surface-to-surface handoff, and export.
/// PNG is lossless: decoding and redrawing a snapshot onto a cleared surface
/// of identical dimensions reproduces the source bitmap exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanvasSnapshot {
    data_url: String,
}

impl CanvasSnapshot {
    /// Encodes the surface's current bitmap.
    pub fn of_surface(surface: &Surface) -> Result<Self, SnapshotError> {
        let mut png = Vec::new();
        image::DynamicImage::ImageRgba8(surface.image().clone())
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(Self {
            data_url: format!("{DATA_URL_PREFIX}{}", STANDARD.encode(&png)),
        })
    }

    /// Wraps an already-serialized snapshot, validating its shape.
    pub fn from_data_url(data_url: impl Into<String>) -> Result<Self, SnapshotError> {
        let data_url = data_url.into();
        if !data_url.starts_with(DATA_URL_PREFIX) {
            return Err(SnapshotError::MalformedDataUrl);
        }
        Ok(Self { data_url })
    }

    pub fn as_data_url(&self) -> &str {
        &self.data_url
    }

    /// The raw PNG bytes, as consumed by export and analysis collaborators.
    pub fn png_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(STANDARD.decode(&self.data_url[DATA_URL_PREFIX.len()..])?)
    }

    /// Decodes the snapshot back into a bitmap.
    pub fn decode(&self) -> Result<RgbaImage, SnapshotError> {
        let png = self.png_bytes()?;
        Ok(image::load_from_memory_with_format(&png, ImageFormat::Png)?.to_rgba8())
    }
}
