use std::cell::RefCell;

use crate::manager::SurfaceMode;

/// Lifecycle events of the drawing surface, broadcast to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasEvent {
    StrokeStarted,
    StrokeFinished,
    ModeChanged { from: SurfaceMode, to: SurfaceMode },
    GridShown,
    GridCleared,
    CanvasCleared,
    DrawingLoaded,
    CheckpointScheduled,
}

pub trait EventObserver {
    fn on_event(&mut self, event: &CanvasEvent);
}

/// A simple bus broadcasting canvas events to registered observers.
pub struct EventBus {
    observers: RefCell<Vec<Box<dyn EventObserver>>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("observers", &self.observers.borrow().len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            observers: RefCell::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, observer: Box<dyn EventObserver>) {
        self.observers.borrow_mut().push(observer);
    }

    pub fn emit(&self, event: CanvasEvent) {
        for observer in &mut *self.observers.borrow_mut() {
            observer.on_event(&event);
        }
    }
}

/// Observer that forwards every event to the log.
pub struct LogObserver;

impl EventObserver for LogObserver {
    fn on_event(&mut self, event: &CanvasEvent) {
        log::debug!("canvas event: {event:?}");
    }
}
