use egui::{Color32, Pos2};
use image::RgbaImage;

use crate::error::CanvasError;
use crate::snapshot::CanvasSnapshot;
use crate::surface::Surface;

/// Viewport resizes are only observed at or above this width, to avoid
/// thrashing on mobile viewport quirks.
pub const RESIZE_BREAKPOINT_WIDTH: u32 = 1200;

/// Grid line pitch in pixels.
pub const GRID_PITCH: u32 = 40;
/// Grid line thickness in pixels.
pub const GRID_LINE_WIDTH: u32 = 2;
/// Inset of the first grid line from the surface edge.
pub const GRID_MARGIN: u32 = 2;

/// Placed images are drawn at this fixed square size.
pub const PLACED_IMAGE_SIZE: u32 = 400;

fn grid_color() -> Color32 {
    // lightgrey at single-layer 0.6 alpha
    Color32::from_rgba_unmultiplied(211, 211, 211, 153)
}

/// Which surface is currently receiving strokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurfaceMode {
    /// The main surface is active; the grid may be overlaid.
    #[default]
    Normal,
    /// A movable copy is active; the main surface is hidden.
    Drag,
}

/// Owns the live surfaces and performs content-preserving handoff between
/// them on mode changes and resizes.
///
/// Handoff is synchronous and atomic: snapshot the outgoing surface, build
/// the incoming one at the current viewport, redraw the snapshot at the
/// origin, then swap. The constructor returning is the ready signal, so no
/// scheduling delay is ever needed and a handoff can never interleave with a
/// frame tick.
pub struct SurfaceManager {
    main: Surface,
    grid: Surface,
    drag: Option<Surface>,
    mode: SurfaceMode,
    grid_visible: bool,
    viewport: (u32, u32),
}

impl SurfaceManager {
    /// Creates the manager with a white main surface and a transparent grid
    /// overlay. A zero-sized viewport yields empty surfaces on which all
    /// drawing is a no-op until the first real viewport arrives.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            main: Surface::new_filled(width, height, Color32::WHITE),
            grid: Surface::new(width, height),
            drag: None,
            mode: SurfaceMode::Normal,
            grid_visible: false,
            viewport: (width, height),
        }
    }

    pub fn mode(&self) -> SurfaceMode {
        self.mode
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn main(&self) -> &Surface {
        &self.main
    }

    pub fn grid(&self) -> &Surface {
        &self.grid
    }

    pub fn grid_visible(&self) -> bool {
        self.grid_visible
    }

    /// The surface strokes land on. Callers must not cache this reference
    /// across a mode transition.
    pub fn active_surface(&self) -> &Surface {
        if self.mode == SurfaceMode::Drag {
            if let Some(drag) = &self.drag {
                return drag;
            }
        }
        &self.main
    }

    pub fn active_surface_mut(&mut self) -> &mut Surface {
        if self.mode == SurfaceMode::Drag {
            if let Some(drag) = &mut self.drag {
                return drag;
            }
        }
        &mut self.main
    }

    /// Enters or leaves drag mode with a content-preserving handoff.
    ///
    /// Returns `Ok(true)` when the mode actually changed. Leaving drag mode
    /// rebuilds the main surface at the current viewport (a content-losing
    /// resize), which is why the snapshot/redraw step is mandatory.
    pub fn set_drag_mode(&mut self, enabled: bool) -> Result<bool, CanvasError> {
        if enabled == (self.mode == SurfaceMode::Drag) {
            return Ok(false);
        }
        if self.main.is_empty() {
            return Err(CanvasError::UninitializedSurface);
        }
        let (vw, vh) = self.viewport;
        if enabled {
            let snapshot = CanvasSnapshot::of_surface(&self.main)?;
            let mut drag = Surface::new_filled(vw, vh, Color32::WHITE);
            drag.blit(&snapshot.decode()?, Pos2::ZERO);
            self.drag = Some(drag);
            self.mode = SurfaceMode::Drag;
        } else {
            let snapshot = match &self.drag {
                Some(drag) => CanvasSnapshot::of_surface(drag)?,
                None => CanvasSnapshot::of_surface(&self.main)?,
            };
            self.main = Surface::new_filled(vw, vh, Color32::WHITE);
            self.main.blit(&snapshot.decode()?, Pos2::ZERO);
            self.drag = None;
            self.mode = SurfaceMode::Normal;
        }
        log::debug!("surface mode is now {:?}", self.mode);
        Ok(true)
    }

    /// Tracks the viewport and resizes surfaces when allowed.
    ///
    /// The first non-empty viewport always initializes the surfaces. After
    /// that, rebuilds only happen at or above the resize breakpoint, and
    /// every content-destroying rebuild is wrapped in the same
    /// snapshot/redraw cycle as a mode handoff.
    pub fn handle_viewport(&mut self, width: u32, height: u32) -> Result<(), CanvasError> {
        if (width, height) == self.viewport || width == 0 || height == 0 {
            return Ok(());
        }
        self.viewport = (width, height);

        if self.main.is_empty() {
            self.main = Surface::new_filled(width, height, Color32::WHITE);
            self.grid = Surface::new(width, height);
            if self.grid_visible {
                self.render_grid();
            }
            return Ok(());
        }

        if width < RESIZE_BREAKPOINT_WIDTH {
            return Ok(());
        }

        match self.mode {
            SurfaceMode::Normal => {
                let snapshot = CanvasSnapshot::of_surface(&self.main)?;
                self.main = Surface::new_filled(width, height, Color32::WHITE);
                self.main.blit(&snapshot.decode()?, Pos2::ZERO);
            }
            SurfaceMode::Drag => {
                if let Some(drag) = &self.drag {
                    let snapshot = CanvasSnapshot::of_surface(drag)?;
                    let mut rebuilt = Surface::new_filled(width, height, Color32::WHITE);
                    rebuilt.blit(&snapshot.decode()?, Pos2::ZERO);
                    self.drag = Some(rebuilt);
                }
            }
        }
        self.grid = Surface::new(width, height);
        if self.grid_visible {
            self.render_grid();
        }
        Ok(())
    }

    /// Clears the active surface to its blank (white) state.
    pub fn clear_active(&mut self) {
        self.active_surface_mut().fill(Color32::WHITE);
    }

    /// Clears the active surface and redraws `snapshot` onto it at origin.
    pub fn load_snapshot(&mut self, snapshot: &CanvasSnapshot) -> Result<(), CanvasError> {
        if self.active_surface().is_empty() {
            return Err(CanvasError::UninitializedSurface);
        }
        let decoded = snapshot.decode()?;
        let active = self.active_surface_mut();
        active.fill(Color32::WHITE);
        active.blit(&decoded, Pos2::ZERO);
        Ok(())
    }

    /// Draws the alignment grid. Idempotent: the overlay is cleared and
    /// re-rendered from scratch, so repeated calls never stack lines or
    /// deepen the alpha.
    pub fn draw_grid(&mut self) {
        if self.grid.is_empty() {
            return;
        }
        self.render_grid();
        self.grid_visible = true;
    }

    /// Erases the grid overlay to transparent.
    pub fn clear_grid(&mut self) {
        self.grid.clear();
        self.grid_visible = false;
    }

    fn render_grid(&mut self) {
        self.grid.clear();
        let (w, h) = (self.grid.width(), self.grid.height());
        let color = grid_color();
        let mut x = GRID_MARGIN;
        while x <= w {
            self.grid.write_rect(x, 0, GRID_LINE_WIDTH, h, color);
            x += GRID_PITCH;
        }
        let mut y = GRID_MARGIN;
        while y <= h {
            self.grid.write_rect(0, y, w, GRID_LINE_WIDTH, color);
            y += GRID_PITCH;
        }
    }

    /// Blits an externally supplied image onto the active surface at `at`,
    /// scaled to the fixed placement size.
    pub fn place_image(&mut self, source: &RgbaImage, at: Pos2) {
        if self.active_surface().is_empty() {
            return;
        }
        let resized = image::imageops::resize(
            source,
            PLACED_IMAGE_SIZE,
            PLACED_IMAGE_SIZE,
            image::imageops::FilterType::Triangle,
        );
        self.active_surface_mut().blit(&resized, at);
    }
}
