use egui::Context;
use image::RgbaImage;

/// Decodes image files dropped onto the window so they can be placed on the
/// canvas.
#[derive(Default)]
pub struct FileDropHandler {
    processed: Vec<String>,
}

impl FileDropHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the images newly dropped this frame, decoded to RGBA.
    /// Non-image files and files already handled are skipped.
    pub fn poll_dropped_images(&mut self, ctx: &Context) -> Vec<RgbaImage> {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let mut images = Vec::new();

        for file in &dropped {
            let name = if let Some(path) = &file.path {
                path.display().to_string()
            } else if !file.name.is_empty() {
                file.name.clone()
            } else {
                "unknown".to_owned()
            };
            if self.processed.contains(&name) {
                continue;
            }

            let bytes = if let Some(bytes) = &file.bytes {
                Some(bytes.to_vec())
            } else if let Some(path) = &file.path {
                #[cfg(not(target_arch = "wasm32"))]
                {
                    match std::fs::read(path) {
                        Ok(bytes) => Some(bytes),
                        Err(err) => {
                            log::error!("failed to read dropped file {}: {err}", path.display());
                            None
                        }
                    }
                }
                #[cfg(target_arch = "wasm32")]
                {
                    log::warn!("file path access not supported on wasm: {name}");
                    None
                }
            } else {
                None
            };

            let Some(bytes) = bytes else { continue };
            match image::load_from_memory(&bytes) {
                Ok(decoded) => {
                    log::info!("decoded dropped image {name} ({}x{})", decoded.width(), decoded.height());
                    images.push(decoded.to_rgba8());
                    self.processed.push(name);
                }
                Err(err) => log::warn!("dropped file {name} is not a supported image: {err}"),
            }
        }

        images
    }
}
