use image::RgbaImage;

/// Tries to read an image off the system clipboard.
///
/// Handles raw image data (screenshots, copies from other editors) and text
/// content that is a path to an image file. Returns `None` when the
/// clipboard holds neither.
#[cfg(not(target_arch = "wasm32"))]
pub fn read_clipboard_image() -> Option<RgbaImage> {
    let mut clip = match arboard::Clipboard::new() {
        Ok(clip) => clip,
        Err(err) => {
            log::warn!("system clipboard unavailable: {err}");
            return None;
        }
    };

    // arboard hands back ImageData { width, height, bytes } in RGBA order.
    if let Ok(data) = clip.get_image() {
        if let Some(image) =
            RgbaImage::from_raw(data.width as u32, data.height as u32, data.bytes.into_owned())
        {
            log::info!("pasted {}x{} clipboard image", image.width(), image.height());
            return Some(image);
        }
    }

    // A file copied as text may be a path to an image.
    if let Ok(text) = clip.get_text() {
        let path = std::path::Path::new(text.trim());
        if path.is_file() {
            if let Ok(decoded) = image::open(path) {
                return Some(decoded.to_rgba8());
            }
        }
    }

    None
}

/// Browsers gate clipboard reads behind user-activated DOM events, which
/// never reach this code path.
#[cfg(target_arch = "wasm32")]
pub fn read_clipboard_image() -> Option<RgbaImage> {
    None
}
