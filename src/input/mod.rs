use egui::{Context, Event, Pos2, Rect, TouchPhase};

use crate::services::Capabilities;

/// How long a touch pointer-down is held back before it starts a stroke, so
/// an accidental tap does not register as a zero-length stroke.
pub const TOUCH_DEBOUNCE_SECS: f64 = 0.010;

/// The kind of device a pointer event originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceKind {
    #[default]
    Mouse,
    Touch,
    Pen,
}

/// One normalized pointer sample in canvas-local coordinates.
///
/// `contact_width` approximates the contact width reported by
/// pressure-sensitive devices; mouse input reports `None`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerSample {
    pub pos: Pos2,
    pub contact_width: Option<f32>,
    pub device: DeviceKind,
    pub ctrl: bool,
}

/// A normalized pointer event, ready for the frame driver.
#[derive(Debug, Clone)]
pub enum PointerEvent {
    Down(PointerSample),
    Move {
        sample: PointerSample,
        /// Predicted follow-up samples, when the input source provides them.
        predicted: Vec<PointerSample>,
    },
    Up,
}

/// Shared pointer state bridging input events and the per-frame render tick.
///
/// While `drawing` is true, `last` is the stroke's previous endpoint and
/// `current` the freshest sample; the frame tick draws `last -> current` and
/// then advances `last`.
#[derive(Debug, Clone, Default)]
pub struct PointerState {
    pub drawing: bool,
    pub last: PointerSample,
    pub current: PointerSample,
    pending_touch_since: Option<f64>,
}

impl PointerState {
    /// Starts a stroke at `sample`. Touch devices arm the debounce instead of
    /// drawing immediately; [`Self::resolve_touch_debounce`] flips `drawing`
    /// once it expires.
    pub fn pointer_down(&mut self, sample: PointerSample, now: f64) {
        self.last = sample;
        self.current = sample;
        if sample.device == DeviceKind::Touch {
            self.pending_touch_since = Some(now);
        } else {
            self.drawing = true;
        }
    }

    /// Updates the live position. The first predicted sample is preferred
    /// over the raw one for lower perceived latency. Never touches `last`.
    pub fn pointer_move(&mut self, sample: PointerSample, predicted: &[PointerSample]) {
        self.current = predicted.first().copied().unwrap_or(sample);
    }

    /// Ends the stroke. Returns whether one was actually in progress.
    pub fn pointer_up(&mut self) -> bool {
        let was_drawing = self.drawing;
        self.drawing = false;
        self.pending_touch_since = None;
        was_drawing
    }

    /// Promotes a debounced touch-down into an active stroke once the
    /// debounce interval has elapsed.
    pub fn resolve_touch_debounce(&mut self, now: f64) {
        if let Some(since) = self.pending_touch_since {
            if now - since >= TOUCH_DEBOUNCE_SECS {
                self.drawing = true;
                self.pending_touch_since = None;
            }
        }
    }
}

/// Translates raw egui input into normalized pointer events.
///
/// Normalization subtracts the canvas rect origin from screen coordinates so
/// strokes land correctly regardless of surrounding layout. When the
/// platform reports no pressure capability, contact widths are dropped here,
/// at the single entry point, so downstream code never re-checks.
pub struct InputHandler {
    pressure_input: bool,
    touch_active: bool,
    last_touch_force: Option<f32>,
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new(Capabilities::detect())
    }
}

impl InputHandler {
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            pressure_input: capabilities.pressure_input,
            touch_active: false,
            last_touch_force: None,
        }
    }

    /// Converts a screen-space position plus device metadata into a sample
    /// in canvas-local coordinates.
    pub fn normalize(
        &self,
        screen_pos: Pos2,
        canvas_rect: Rect,
        contact_width: Option<f32>,
        device: DeviceKind,
        ctrl: bool,
    ) -> PointerSample {
        PointerSample {
            pos: Pos2::new(screen_pos.x - canvas_rect.min.x, screen_pos.y - canvas_rect.min.y),
            contact_width: if self.pressure_input { contact_width } else { None },
            device,
            ctrl,
        }
    }

    /// Drains this frame's egui input into normalized pointer events.
    ///
    /// Pointer-downs outside the canvas rect are ignored; moves and ups pass
    /// through so a stroke that wanders off the canvas still terminates.
    pub fn collect(&mut self, ctx: &Context, canvas_rect: Rect) -> Vec<PointerEvent> {
        let mut out = Vec::new();
        ctx.input(|input| {
            let ctrl = input.modifiers.ctrl;
            for event in &input.events {
                match event {
                    Event::Touch { phase, force, .. } => match phase {
                        TouchPhase::Start | TouchPhase::Move => {
                            self.touch_active = true;
                            self.last_touch_force = *force;
                        }
                        TouchPhase::End | TouchPhase::Cancel => {
                            self.touch_active = false;
                            self.last_touch_force = None;
                        }
                    },
                    Event::PointerButton {
                        pos,
                        button: egui::PointerButton::Primary,
                        pressed,
                        modifiers,
                    } => {
                        if *pressed {
                            if canvas_rect.contains(*pos) {
                                out.push(PointerEvent::Down(self.normalize(
                                    *pos,
                                    canvas_rect,
                                    self.contact_width(),
                                    self.device(),
                                    modifiers.ctrl,
                                )));
                            }
                        } else {
                            out.push(PointerEvent::Up);
                        }
                    }
                    Event::PointerMoved(pos) => {
                        out.push(PointerEvent::Move {
                            sample: self.normalize(
                                *pos,
                                canvas_rect,
                                self.contact_width(),
                                self.device(),
                                ctrl,
                            ),
                            // egui does not predict pointer positions.
                            predicted: Vec::new(),
                        });
                    }
                    Event::PointerGone => out.push(PointerEvent::Up),
                    _ => {}
                }
            }
        });
        out
    }

    fn device(&self) -> DeviceKind {
        if self.touch_active {
            DeviceKind::Touch
        } else {
            DeviceKind::Mouse
        }
    }

    /// Contact width estimated from the normalized touch force, in pixels.
    fn contact_width(&self) -> Option<f32> {
        self.last_touch_force.map(|force| 40.0 + force * 60.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    fn mouse_sample(x: f32, y: f32) -> PointerSample {
        PointerSample {
            pos: pos2(x, y),
            ..Default::default()
        }
    }

    #[test]
    fn mouse_down_starts_drawing_immediately() {
        let mut state = PointerState::default();
        state.pointer_down(mouse_sample(10.0, 10.0), 0.0);
        assert!(state.drawing);
        assert_eq!(state.last, state.current);
    }

    #[test]
    fn touch_down_waits_for_debounce() {
        let mut state = PointerState::default();
        let sample = PointerSample {
            pos: pos2(5.0, 5.0),
            device: DeviceKind::Touch,
            ..Default::default()
        };
        state.pointer_down(sample, 1.0);
        assert!(!state.drawing);

        state.resolve_touch_debounce(1.005);
        assert!(!state.drawing);

        state.resolve_touch_debounce(1.011);
        assert!(state.drawing);
    }

    #[test]
    fn tap_released_before_debounce_never_draws() {
        let mut state = PointerState::default();
        let sample = PointerSample {
            pos: pos2(5.0, 5.0),
            device: DeviceKind::Touch,
            ..Default::default()
        };
        state.pointer_down(sample, 1.0);
        assert!(!state.pointer_up());
        state.resolve_touch_debounce(2.0);
        assert!(!state.drawing);
    }

    #[test]
    fn move_prefers_first_predicted_sample() {
        let mut state = PointerState::default();
        state.pointer_down(mouse_sample(0.0, 0.0), 0.0);
        let predicted = [mouse_sample(12.0, 3.0), mouse_sample(14.0, 4.0)];
        state.pointer_move(mouse_sample(10.0, 2.0), &predicted);
        assert_eq!(state.current.pos, pos2(12.0, 3.0));
        // The stroke's previous endpoint is untouched by moves.
        assert_eq!(state.last.pos, pos2(0.0, 0.0));
    }

    #[test]
    fn move_without_prediction_uses_raw_sample() {
        let mut state = PointerState::default();
        state.pointer_down(mouse_sample(0.0, 0.0), 0.0);
        state.pointer_move(mouse_sample(10.0, 2.0), &[]);
        assert_eq!(state.current.pos, pos2(10.0, 2.0));
    }

    #[test]
    fn normalization_is_canvas_local() {
        let handler = InputHandler::default();
        let rect = Rect::from_min_size(pos2(100.0, 50.0), egui::vec2(800.0, 600.0));
        let sample = handler.normalize(pos2(110.0, 60.0), rect, None, DeviceKind::Mouse, false);
        assert_eq!(sample.pos, pos2(10.0, 10.0));
    }

    #[test]
    fn missing_pressure_capability_strips_contact_width() {
        let handler = InputHandler::new(Capabilities::none());
        let rect = Rect::from_min_size(pos2(0.0, 0.0), egui::vec2(800.0, 600.0));
        let sample = handler.normalize(pos2(10.0, 10.0), rect, Some(60.0), DeviceKind::Touch, false);
        assert_eq!(sample.contact_width, None);

        // With the capability present the width passes through.
        let handler = InputHandler::new(Capabilities::detect());
        let sample = handler.normalize(pos2(10.0, 10.0), rect, Some(60.0), DeviceKind::Touch, false);
        assert_eq!(sample.contact_width, Some(60.0));
    }
}
