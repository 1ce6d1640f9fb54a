use std::collections::HashMap;

use egui::{ColorImage, Context, TextureHandle, TextureId, TextureOptions};

use crate::surface::{Surface, SurfaceRole};

/// Uploads surfaces to egui textures, keyed by role and surface version so
/// an unchanged surface is never re-uploaded.
#[derive(Default)]
pub struct SurfaceTextures {
    cache: HashMap<SurfaceRole, (u64, TextureHandle)>,
}

impl SurfaceTextures {
    pub fn new() -> Self {
        Self::default()
    }

    /// The texture for `surface`, uploading it if the cached version is
    /// stale. Returns `None` for an uninitialized surface.
    pub fn texture_for(&mut self, role: SurfaceRole, surface: &Surface, ctx: &Context) -> Option<TextureId> {
        if surface.is_empty() {
            return None;
        }
        if let Some((version, handle)) = self.cache.get(&role) {
            if *version == surface.version() {
                return Some(handle.id());
            }
        }

        let size = [surface.width() as usize, surface.height() as usize];
        let image = ColorImage::from_rgba_unmultiplied(size, surface.image().as_raw());
        let handle = ctx.load_texture(format!("surface_{role:?}"), image, TextureOptions::NEAREST);
        let id = handle.id();
        self.cache.insert(role, (surface.version(), handle));
        Some(id)
    }

    /// Drops a cached texture, forcing re-upload. Used when a surface is
    /// destroyed on a mode transition.
    pub fn invalidate(&mut self, role: SurfaceRole) {
        self.cache.remove(&role);
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}
