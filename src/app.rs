use std::sync::Arc;

use egui::{Color32, Pos2, Rect, Vec2};
use futures::future::BoxFuture;
use futures::FutureExt;
use image::RgbaImage;
use parking_lot::Mutex;

use crate::clipboard;
use crate::error::CanvasError;
use crate::event::{CanvasEvent, EventBus, LogObserver};
use crate::file_drop::FileDropHandler;
use crate::frame::{FrameDriver, TickOutcome};
use crate::input::{InputHandler, PointerEvent, PointerState};
use crate::manager::{SurfaceManager, SurfaceMode, RESIZE_BREAKPOINT_WIDTH};
use crate::persist::{CheckpointGateway, KeyValueStore, MemoryStore, SavedImage};
use crate::render::{ToolMode, ToolState};
use crate::services::{
    self, Capabilities, FileExporter, ImageTagger, NotebookExporter, ServiceError, TextRecognizer,
};
use crate::snapshot::CanvasSnapshot;
use crate::surface::SurfaceRole;
use crate::texture::SurfaceTextures;
use crate::util::time;

/// The drawing surface application.
///
/// Wires pointer input through the frame driver onto the active surface,
/// checkpoints the bitmap on every completed stroke, and exposes the
/// host-facing operations: clear, save-under-name, grid overlay, image
/// placement, and tool/mode/drag switches.
pub struct InkApp {
    manager: SurfaceManager,
    pointer: PointerState,
    input: InputHandler,
    driver: FrameDriver,
    tool: ToolState,
    gateway: CheckpointGateway,
    textures: SurfaceTextures,
    events: EventBus,
    capabilities: Capabilities,
    file_drops: FileDropHandler,

    tagger: Option<Arc<dyn ImageTagger>>,
    exporter: Option<Arc<dyn FileExporter>>,
    notebook: Option<Arc<dyn NotebookExporter>>,
    recognizer: Option<Arc<TextRecognizer>>,

    /// Image armed for placement at the next tap.
    pending_placement: Option<RgbaImage>,
    /// Externally supplied drawing that overrides the checkpoint on startup.
    external_drawing: Option<CanvasSnapshot>,
    restored: bool,
    /// Recognition result awaiting pickup by the UI thread.
    recognized_text: Arc<Mutex<Option<String>>>,

    /// View offset of the movable copy while in drag mode.
    drag_offset: Vec2,
    pan_anchor: Option<Pos2>,
    save_name: String,
}

impl InkApp {
    /// App wired from explicit parts. Hosts that manage their own storage or
    /// capability set build through this; `new` is the eframe entry point.
    pub fn from_parts(capabilities: Capabilities, store: Box<dyn KeyValueStore>) -> Self {
        let events = EventBus::new();
        events.subscribe(Box::new(LogObserver));

        Self {
            // Sized on the first frame, once the real viewport is known.
            manager: SurfaceManager::new(0, 0),
            pointer: PointerState::default(),
            input: InputHandler::new(capabilities),
            driver: FrameDriver::new(),
            tool: ToolState::default(),
            gateway: CheckpointGateway::new(store),
            textures: SurfaceTextures::new(),
            events,
            capabilities,
            file_drops: FileDropHandler::new(),
            tagger: None,
            exporter: None,
            notebook: None,
            recognizer: None,
            pending_placement: None,
            external_drawing: None,
            restored: false,
            recognized_text: Arc::new(Mutex::new(None)),
            drag_offset: Vec2::ZERO,
            pan_anchor: None,
            save_name: String::new(),
        }
    }

    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let mut app = Self::from_parts(Capabilities::detect(), open_default_store());
        if let Some(tool) = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
        {
            app.tool = tool;
        }
        app
    }

    pub fn with_tagger(mut self, tagger: Arc<dyn ImageTagger>) -> Self {
        self.tagger = Some(tagger);
        self
    }

    pub fn with_exporter(mut self, exporter: Arc<dyn FileExporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    pub fn with_notebook(mut self, notebook: Arc<dyn NotebookExporter>) -> Self {
        self.notebook = Some(notebook);
        self
    }

    pub fn with_recognizer(mut self, recognizer: Arc<TextRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn tool(&self) -> &ToolState {
        &self.tool
    }

    pub fn set_color(&mut self, color: Color32) {
        self.tool.color = color;
    }

    pub fn set_mode(&mut self, mode: ToolMode) {
        self.tool.mode = mode;
    }

    pub fn drag_mode(&self) -> bool {
        self.manager.mode() == SurfaceMode::Drag
    }

    /// The saved-board records accumulated by `save_canvas`.
    pub fn saved_images(&self) -> Vec<SavedImage> {
        self.gateway.saved_images()
    }

    /// Tracks a viewport change, resizing the surfaces when allowed.
    pub fn handle_viewport(&mut self, width: u32, height: u32) -> Result<(), CanvasError> {
        self.manager.handle_viewport(width, height)
    }

    /// Enters or leaves drag mode. The handoff preserves the bitmap; a
    /// failure leaves the current mode untouched.
    pub fn set_drag_mode(&mut self, enabled: bool) {
        let from = self.manager.mode();
        match self.manager.set_drag_mode(enabled) {
            Ok(true) => {
                self.drag_offset = Vec2::ZERO;
                self.pan_anchor = None;
                self.textures.invalidate(SurfaceRole::Drag);
                self.events.emit(CanvasEvent::ModeChanged {
                    from,
                    to: self.manager.mode(),
                });
            }
            Ok(false) => {}
            Err(err) => log::warn!("drag mode change failed: {err}"),
        }
    }

    /// Clears the active surface and deletes the durable checkpoint. Also
    /// forgets any externally supplied drawing so a cleared canvas is not
    /// silently repopulated.
    pub fn clear_canvas(&mut self) {
        self.manager.clear_active();
        self.external_drawing = None;
        if let Err(err) = self.gateway.clear_checkpoint() {
            log::warn!("failed to delete checkpoint: {err}");
        }
        self.events.emit(CanvasEvent::CanvasCleared);
    }

    /// Replaces the canvas content with an externally supplied drawing.
    pub fn load_drawing(&mut self, snapshot: CanvasSnapshot) -> Result<(), CanvasError> {
        if let Err(err) = self.gateway.clear_checkpoint() {
            log::warn!("failed to delete checkpoint: {err}");
        }
        if !self.manager.main().is_empty() {
            self.manager.load_snapshot(&snapshot)?;
            self.events.emit(CanvasEvent::DrawingLoaded);
        }
        // Also kept for startup, in case the surfaces are not sized yet.
        self.external_drawing = Some(snapshot);
        Ok(())
    }

    /// Saves the current bitmap under `name`: appends a saved-board record
    /// (enriched by the tagging collaborator when one is wired) and exports
    /// the PNG when the platform allows it.
    pub fn save_canvas(&mut self, name: &str) -> Result<(), CanvasError> {
        let snapshot = CanvasSnapshot::of_surface(self.manager.main())?;
        let record = SavedImage::new(name, snapshot.as_data_url());

        if self.capabilities.file_export {
            if let Some(exporter) = &self.exporter {
                match snapshot.png_bytes() {
                    Ok(bytes) => {
                        if let Err(err) = exporter.export(name, &bytes) {
                            log::warn!("file export failed: {err}");
                        }
                    }
                    Err(err) => log::warn!("file export skipped: {err}"),
                }
            }
        }

        match &self.tagger {
            Some(tagger) => {
                let tagger = tagger.clone();
                let gateway = self.gateway.clone();
                let bytes = snapshot.png_bytes()?;
                let mut record = record;
                services::spawn(async move {
                    match tagger.analyze(bytes).await {
                        Ok(analysis) => crate::services::tagging::enrich(&mut record, &analysis),
                        Err(err) => log::warn!("image tagging failed: {err}"),
                    }
                    if let Err(err) = gateway.push_saved_image(record) {
                        log::warn!("failed to persist saved board: {err}");
                    }
                });
            }
            None => self.gateway.push_saved_image(record)?,
        }
        Ok(())
    }

    /// Saves the board under `name` and hands its PNG to the notebook
    /// collaborator. The caller drives the returned upload future.
    pub fn export_to_notebook(
        &mut self,
        name: &str,
    ) -> Result<BoxFuture<'static, Result<(), ServiceError>>, CanvasError> {
        let notebook = self.notebook.clone().ok_or(ServiceError::Unavailable)?;
        if self.manager.main().is_empty() {
            return Err(CanvasError::UninitializedSurface);
        }
        self.save_canvas(name)?;
        let bytes = CanvasSnapshot::of_surface(self.manager.main())?.png_bytes()?;
        Ok(notebook.upload(name, bytes))
    }

    /// Draws the translucent alignment grid overlay.
    pub fn draw_grid(&mut self) {
        self.manager.draw_grid();
        self.events.emit(CanvasEvent::GridShown);
    }

    /// Clears the alignment grid overlay.
    pub fn clear_grid(&mut self) {
        self.manager.clear_grid();
        self.events.emit(CanvasEvent::GridCleared);
    }

    /// Arms an externally supplied image for placement; the next tap on the
    /// canvas blits it at the tapped point.
    pub fn place_image_bytes(&mut self, bytes: &[u8]) -> Result<(), CanvasError> {
        let decoded = image::load_from_memory(bytes)?.to_rgba8();
        self.pending_placement = Some(decoded);
        Ok(())
    }

    /// Arms the system clipboard's image (if any) for placement at the next
    /// tap. Errs on platforms without clipboard image access.
    pub fn paste_clipboard_image(&mut self) -> Result<(), CanvasError> {
        if !self.capabilities.clipboard_images {
            return Err(ServiceError::Unavailable.into());
        }
        match clipboard::read_clipboard_image() {
            Some(image) => self.pending_placement = Some(image),
            None => log::debug!("clipboard holds no image"),
        }
        Ok(())
    }

    /// Runs handwriting recognition over the current bitmap, when the OCR
    /// collaborator is wired. The caller drives the returned future.
    pub fn recognize_text(&self) -> Option<BoxFuture<'static, Result<String, ServiceError>>> {
        let recognizer = self.recognizer.clone()?;
        let bytes = CanvasSnapshot::of_surface(self.manager.main())
            .and_then(|snapshot| snapshot.png_bytes())
            .map_err(|err| log::warn!("text recognition skipped: {err}"))
            .ok()?;
        Some(async move { recognizer.recognize(bytes).await }.boxed())
    }

    /// Kicks off text recognition in the background; the result lands on the
    /// system clipboard on a later frame.
    pub fn request_text_recognition(&mut self) -> Result<(), CanvasError> {
        let future = self.recognize_text().ok_or(ServiceError::Unavailable)?;
        let slot = self.recognized_text.clone();
        services::spawn(async move {
            match future.await {
                Ok(text) => *slot.lock() = Some(text),
                Err(err) => log::warn!("text recognition failed: {err}"),
            }
        });
        Ok(())
    }

    fn board_name(&self) -> String {
        if self.save_name.is_empty() {
            "My board".to_owned()
        } else {
            self.save_name.clone()
        }
    }

    fn apply_pointer_event(&mut self, event: PointerEvent, now: f64) {
        // Drag mode pans the movable copy instead of drawing.
        if self.manager.mode() == SurfaceMode::Drag {
            match event {
                PointerEvent::Down(sample) => self.pan_anchor = Some(sample.pos),
                PointerEvent::Move { sample, .. } => {
                    if let Some(anchor) = self.pan_anchor {
                        self.drag_offset += sample.pos - anchor;
                        self.pan_anchor = Some(sample.pos);
                    }
                }
                PointerEvent::Up => self.pan_anchor = None,
            }
            return;
        }

        match event {
            PointerEvent::Down(sample) => {
                if let Some(image) = self.pending_placement.take() {
                    self.manager.place_image(&image, sample.pos);
                    return;
                }
                self.pointer.pointer_down(sample, now);
            }
            PointerEvent::Move { sample, predicted } => {
                self.pointer.pointer_move(sample, &predicted);
            }
            PointerEvent::Up => {
                // Draw any segment still pending before the flag drops, so
                // a move arriving in the same batch as the release sticks.
                self.driver.flush(&mut self.pointer, &mut self.manager, &self.tool);
                if self.pointer.pointer_up() {
                    self.schedule_checkpoint();
                }
            }
        }
    }

    fn schedule_checkpoint(&mut self) {
        match CanvasSnapshot::of_surface(self.manager.main()) {
            Ok(snapshot) => {
                self.gateway.schedule_checkpoint(snapshot);
                self.events.emit(CanvasEvent::CheckpointScheduled);
            }
            Err(err) => log::warn!("checkpoint skipped, snapshot encode failed: {err}"),
        }
    }

    fn restore_startup_state(&mut self) {
        let snapshot = match (&self.external_drawing, self.gateway.restore()) {
            (Some(external), _) => Some(external.clone()),
            (None, restored) => restored,
        };
        if let Some(snapshot) = snapshot {
            match self.manager.load_snapshot(&snapshot) {
                Ok(()) => self.events.emit(CanvasEvent::DrawingLoaded),
                Err(err) => log::warn!("startup restore failed: {err}"),
            }
        }
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui
                .selectable_label(self.tool.mode == ToolMode::Pen, "✏ Pen")
                .clicked()
            {
                self.set_mode(ToolMode::Pen);
            }
            if ui
                .selectable_label(self.tool.mode == ToolMode::Erase, "⌫ Erase")
                .clicked()
            {
                self.set_mode(ToolMode::Erase);
            }
            egui::color_picker::color_edit_button_srgba(
                ui,
                &mut self.tool.color,
                egui::color_picker::Alpha::Opaque,
            );
            ui.separator();

            if ui.selectable_label(self.manager.grid_visible(), "Grid").clicked() {
                if self.manager.grid_visible() {
                    self.clear_grid();
                } else {
                    self.draw_grid();
                }
            }
            if ui.selectable_label(self.drag_mode(), "Drag").clicked() {
                let enabled = !self.drag_mode();
                self.set_drag_mode(enabled);
            }
            if self.capabilities.clipboard_images && ui.button("Paste").clicked() {
                if let Err(err) = self.paste_clipboard_image() {
                    log::warn!("clipboard paste failed: {err}");
                }
            }
            if self.recognizer.is_some()
                && self.manager.viewport().0 >= RESIZE_BREAKPOINT_WIDTH
                && ui.button("Copy Text").clicked()
            {
                if let Err(err) = self.request_text_recognition() {
                    log::warn!("text recognition unavailable: {err}");
                }
            }
            ui.separator();

            if ui.button("Clear").clicked() {
                self.clear_canvas();
            }
            ui.text_edit_singleline(&mut self.save_name);
            if ui.button("Save").clicked() {
                let name = self.board_name();
                if let Err(err) = self.save_canvas(&name) {
                    log::warn!("save failed: {err}");
                }
            }
            if self.notebook.is_some() && ui.button("Send").clicked() {
                let name = self.board_name();
                match self.export_to_notebook(&name) {
                    Ok(upload) => services::spawn(async move {
                        if let Err(err) = upload.await {
                            log::warn!("notebook upload failed: {err}");
                        }
                    }),
                    Err(err) => log::warn!("notebook export failed: {err}"),
                }
            }
        });
    }

    fn paint_surfaces(&mut self, ctx: &egui::Context, painter: &egui::Painter, rect: Rect) {
        let uv = Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));

        let (role, offset) = match self.manager.mode() {
            SurfaceMode::Drag => (SurfaceRole::Drag, self.drag_offset),
            SurfaceMode::Normal => (SurfaceRole::Main, Vec2::ZERO),
        };
        let surface = self.manager.active_surface();
        if let Some(texture) = self.textures.texture_for(role, surface, ctx) {
            let size = egui::vec2(surface.width() as f32, surface.height() as f32);
            painter.image(texture, Rect::from_min_size(rect.min + offset, size), uv, Color32::WHITE);
        }

        if self.manager.grid_visible() {
            let grid = self.manager.grid();
            if let Some(texture) = self.textures.texture_for(SurfaceRole::Grid, grid, ctx) {
                let size = egui::vec2(grid.width() as f32, grid.height() as f32);
                painter.image(texture, Rect::from_min_size(rect.min, size), uv, Color32::WHITE);
            }
        }
    }
}

impl eframe::App for InkApp {
    /// Called by the framework to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, &self.tool);
    }

    /// Called once per display frame; this is the render loop.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = time::current_time_secs();

        for image in self.file_drops.poll_dropped_images(ctx) {
            self.pending_placement = Some(image);
        }
        if self.capabilities.clipboard_images
            && ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::V))
        {
            if let Err(err) = self.paste_clipboard_image() {
                log::warn!("clipboard paste failed: {err}");
            }
        }
        if let Some(text) = self.recognized_text.lock().take() {
            ctx.output_mut(|o| o.copied_text = text);
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.toolbar(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let available = ui.available_size();
                let (response, painter) = ui.allocate_painter(available, egui::Sense::drag());
                let rect = response.rect;

                if let Err(err) =
                    self.handle_viewport(rect.width().max(0.0) as u32, rect.height().max(0.0) as u32)
                {
                    log::warn!("viewport change failed: {err}");
                }
                if !self.restored && !self.manager.main().is_empty() {
                    self.restore_startup_state();
                    self.restored = true;
                }

                for event in self.input.collect(ctx, rect) {
                    self.apply_pointer_event(event, now);
                }

                match self.driver.tick(&mut self.pointer, &mut self.manager, &self.tool, now) {
                    TickOutcome::StrokeStarted => self.events.emit(CanvasEvent::StrokeStarted),
                    TickOutcome::StrokeFinished => self.events.emit(CanvasEvent::StrokeFinished),
                    _ => {}
                }

                self.paint_surfaces(ctx, &painter, rect);
            });

        // The loop must run indefinitely, even before any drawing starts,
        // so input feels instantaneous.
        ctx.request_repaint();
    }
}

fn open_default_store() -> Box<dyn KeyValueStore> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Some(dir) = eframe::storage_dir("inkboard") {
            match crate::persist::JsonFileStore::open(dir.join("state")) {
                Ok(store) => return Box::new(store),
                Err(err) => {
                    log::warn!("durable store unavailable, state is in-memory for this session: {err}");
                }
            }
        }
    }
    Box::new(MemoryStore::new())
}
