#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod clipboard;
pub mod error;
pub mod event;
pub mod file_drop;
pub mod frame;
pub mod input;
pub mod manager;
pub mod persist;
pub mod render;
pub mod services;
pub mod snapshot;
pub mod surface;
pub mod texture;
pub mod util;

pub use app::InkApp;
pub use error::CanvasError;
pub use frame::{FrameDriver, StrokePhase, TickOutcome};
pub use input::{DeviceKind, InputHandler, PointerEvent, PointerSample, PointerState};
pub use manager::{SurfaceManager, SurfaceMode};
pub use persist::{CheckpointGateway, JsonFileStore, KeyValueStore, MemoryStore, SavedImage};
pub use render::{ToolMode, ToolState};
pub use snapshot::CanvasSnapshot;
pub use surface::{Composite, Surface, SurfaceRole};
