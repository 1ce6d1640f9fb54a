//! External collaborator interfaces: OCR, image tagging, and export.
//!
//! The drawing core only ever supplies bitmap bytes to these services and
//! consumes their results; every failure here is reported and dropped, and
//! must never corrupt or block the draw/erase/checkpoint path.

use std::future::Future;

use thiserror::Error;

pub mod export;
pub mod ocr;
pub mod tagging;

pub use export::{FileExporter, NotebookExporter};
pub use ocr::{OcrTransport, OperationLocation, TextRecognizer};
pub use tagging::{ImageAnalysis, ImageTagger};

#[cfg(not(target_arch = "wasm32"))]
pub use export::DiskExporter;

/// Errors from collaborator services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("service is not available on this platform")]
    Unavailable,

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("service returned a malformed response: {0}")]
    Malformed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Platform capabilities, resolved once at startup.
///
/// Core logic branches only on these flags; no call site inspects the
/// environment itself.
#[derive(Debug, Clone, Copy)]
pub struct Capabilities {
    /// Pressure/contact-width reporting from the input device.
    pub pressure_input: bool,
    /// Exporting the bitmap to a local file.
    pub file_export: bool,
    /// Reading images from the system clipboard.
    pub clipboard_images: bool,
}

impl Capabilities {
    /// Capabilities of the current platform.
    pub fn detect() -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        {
            Self {
                pressure_input: true,
                file_export: true,
                clipboard_images: true,
            }
        }
        #[cfg(target_arch = "wasm32")]
        {
            Self {
                pressure_input: true,
                file_export: false,
                clipboard_images: false,
            }
        }
    }

    /// The reduced feature set used when every optional API is missing.
    pub fn none() -> Self {
        Self {
            pressure_input: false,
            file_export: false,
            clipboard_images: false,
        }
    }
}

/// Runs a collaborator future off the UI thread (or on the local task queue
/// on wasm). Fire-and-forget: outcomes are reported by the future itself.
pub fn spawn(future: impl Future<Output = ()> + Send + 'static) {
    #[cfg(not(target_arch = "wasm32"))]
    std::thread::spawn(move || futures::executor::block_on(future));
    #[cfg(target_arch = "wasm32")]
    wasm_bindgen_futures::spawn_local(future);
}
