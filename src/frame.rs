use crate::input::PointerState;
use crate::manager::SurfaceManager;
use crate::render::{self, ToolState};

/// Explicit stroke lifecycle, advanced only by pointer events and the touch
/// debounce. Replaces juggling independent boolean flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrokePhase {
    #[default]
    Idle,
    Stroking,
}

/// What a frame tick did, so the caller can emit lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No stroke in progress.
    Idle,
    /// A stroke began this frame.
    StrokeStarted,
    /// The stroke was extended by one segment.
    StrokeExtended,
    /// The stroke is live but no new input arrived; nothing was drawn.
    StrokeHeld,
    /// The pointer was released; the stroke is complete.
    StrokeFinished,
}

/// The per-frame driver of stroke rendering.
///
/// Runs once per display frame, for the whole life of the app. Bursts of
/// pointer moves between frames collapse to the latest sample; frames with
/// no new input draw nothing. This decouples render cadence from input
/// cadence.
#[derive(Debug, Default)]
pub struct FrameDriver {
    phase: StrokePhase,
}

impl FrameDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> StrokePhase {
        self.phase
    }

    /// Advances one frame: resolves the touch debounce, then extends the
    /// current stroke on the active surface if the pointer is down.
    pub fn tick(
        &mut self,
        pointer: &mut PointerState,
        manager: &mut SurfaceManager,
        tool: &ToolState,
        now: f64,
    ) -> TickOutcome {
        pointer.resolve_touch_debounce(now);

        if !pointer.drawing {
            if self.phase == StrokePhase::Stroking {
                self.phase = StrokePhase::Idle;
                return TickOutcome::StrokeFinished;
            }
            return TickOutcome::Idle;
        }

        let started = self.phase == StrokePhase::Idle;
        self.phase = StrokePhase::Stroking;

        if pointer.current != pointer.last {
            render::draw_segment(manager.active_surface_mut(), &pointer.last, &pointer.current, tool);
            pointer.last = pointer.current;
            if started {
                TickOutcome::StrokeStarted
            } else {
                TickOutcome::StrokeExtended
            }
        } else if started {
            TickOutcome::StrokeStarted
        } else {
            TickOutcome::StrokeHeld
        }
    }

    /// Draws any segment still pending between `last` and `current`.
    ///
    /// Called on pointer-up before the drawing flag drops, so a move that
    /// arrived in the same input batch as the release is not lost.
    pub fn flush(&mut self, pointer: &mut PointerState, manager: &mut SurfaceManager, tool: &ToolState) {
        if pointer.drawing && pointer.current != pointer.last {
            render::draw_segment(manager.active_surface_mut(), &pointer.last, &pointer.current, tool);
            pointer.last = pointer.current;
        }
    }
}
