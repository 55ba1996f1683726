use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;

use eframe::egui::Vec2;

use crate::error::InteractionError;

/// Queued state changes, applied at the start of the next frame.
#[derive(Clone, Debug, PartialEq)]
pub enum LayoutCommand {
    Pin { node_id: String, position: Vec2 },
    Unpin { node_id: String },
    /// Pin that follows the pointer.
    Drag { node_id: String, position: Vec2 },
    /// End of a drag; the pin is kept only when `keep_pinned` is set.
    Release { node_id: String, keep_pinned: bool },
}

impl LayoutCommand {
    pub fn node_id(&self) -> &str {
        match self {
            Self::Pin { node_id, .. }
            | Self::Unpin { node_id }
            | Self::Drag { node_id, .. }
            | Self::Release { node_id, .. } => node_id,
        }
    }
}

/// Cloneable handle that queues commands for one scheduler. Sends fail while
/// the scheduler is stopped and after it is dropped.
#[derive(Clone, Debug)]
pub struct CommandSender {
    tx: Sender<LayoutCommand>,
    accepting: Arc<AtomicBool>,
}

impl CommandSender {
    pub(super) fn new(tx: Sender<LayoutCommand>, accepting: Arc<AtomicBool>) -> Self {
        Self { tx, accepting }
    }

    pub fn send(&self, command: LayoutCommand) -> Result<(), InteractionError> {
        if !self.accepting.load(Ordering::Acquire) {
            return Err(InteractionError::SchedulerStopped);
        }
        self.tx
            .send(command)
            .map_err(|_| InteractionError::SchedulerDropped)
    }
}
