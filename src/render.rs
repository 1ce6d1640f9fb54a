use egui::Color32;

use crate::input::{DeviceKind, PointerSample};
use crate::surface::{Composite, Surface};

/// Line width for mouse strokes, in pixels.
pub const BASE_LINE_WIDTH: f32 = 10.0;

/// Reported touch contact widths carry roughly this much sensor padding,
/// which is subtracted before stroking.
pub const CONTACT_WIDTH_BIAS: f32 = 40.0;

/// Thinnest stroke a pressure device can produce.
pub const MIN_LINE_WIDTH: f32 = 1.0;

/// The active drawing tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum ToolMode {
    /// Paints over existing content.
    #[default]
    Pen,
    /// Cuts pixels out to transparency regardless of their color.
    Erase,
}

/// Tool settings shared by every stroke: mode, color, and the base width.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ToolState {
    pub mode: ToolMode,
    pub color: Color32,
    pub base_width: f32,
}

impl Default for ToolState {
    fn default() -> Self {
        Self {
            mode: ToolMode::Pen,
            color: Color32::RED,
            base_width: BASE_LINE_WIDTH,
        }
    }
}

/// Line width policy: pressure devices derive width from their reported
/// contact width, floored so thin touches stay visible; mouse input and the
/// eraser use the fixed base width.
pub fn line_width(tool: &ToolState, sample: &PointerSample) -> f32 {
    if tool.mode == ToolMode::Erase {
        return tool.base_width;
    }
    match sample.contact_width {
        Some(width) if sample.device != DeviceKind::Mouse => {
            (width - CONTACT_WIDTH_BIAS).max(MIN_LINE_WIDTH)
        }
        _ => tool.base_width,
    }
}

/// Draws one line segment from `from` to `to` onto `surface`.
///
/// Each segment is an independent draw, so color, width, and composite mode
/// may change between consecutive frames without artifacts. Drawing onto an
/// uninitialized surface is a silent no-op.
pub fn draw_segment(surface: &mut Surface, from: &PointerSample, to: &PointerSample, tool: &ToolState) {
    let width = line_width(tool, to);
    match tool.mode {
        ToolMode::Pen => surface.stroke_segment(from.pos, to.pos, width, Composite::SourceOver, tool.color),
        ToolMode::Erase => {
            surface.stroke_segment(from.pos, to.pos, width, Composite::DestinationOut, Color32::BLACK)
        }
    }
}
