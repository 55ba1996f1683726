mod highlight;
mod viewport;

use eframe::egui::{Pos2, Rect, Vec2, vec2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::InteractionError;
use crate::simulation::{CommandSender, LayoutCommand, Scheduler};

pub use highlight::HighlightMode;
use highlight::LabelMatcher;
pub use viewport::{MAX_ZOOM, MIN_ZOOM, Viewport};

/// What happens to a node's pin when a drag ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragPolicy {
    #[default]
    Release,
    KeepPinned,
}

/// Translates user input into scheduler commands and owns the presentation
/// state (viewport, highlight query) that never feeds back into physics.
pub struct InteractionController {
    commands: CommandSender,
    viewport: Viewport,
    drag_policy: DragPolicy,
    highlight_mode: HighlightMode,
    query: String,
}

impl InteractionController {
    pub fn new(scheduler: &Scheduler) -> Self {
        Self {
            commands: scheduler.commands(),
            viewport: Viewport::default(),
            drag_policy: DragPolicy::default(),
            highlight_mode: HighlightMode::default(),
            query: String::new(),
        }
    }

    pub fn with_drag_policy(mut self, drag_policy: DragPolicy) -> Self {
        self.drag_policy = drag_policy;
        self
    }

    pub fn with_highlight_mode(mut self, highlight_mode: HighlightMode) -> Self {
        self.highlight_mode = highlight_mode;
        self
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn drag_policy(&self) -> DragPolicy {
        self.drag_policy
    }

    pub fn set_drag_policy(&mut self, drag_policy: DragPolicy) {
        self.drag_policy = drag_policy;
    }

    pub fn highlight_mode(&self) -> HighlightMode {
        self.highlight_mode
    }

    pub fn set_highlight_mode(&mut self, highlight_mode: HighlightMode) {
        self.highlight_mode = highlight_mode;
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Freezes `node_id` at `(x, y)` from the next frame on.
    pub fn pin(&self, node_id: &str, x: f32, y: f32) -> Result<(), InteractionError> {
        let position = finite_position(node_id, x, y)?;
        self.send(LayoutCommand::Pin {
            node_id: node_id.to_owned(),
            position,
        })
    }

    /// Lets the node move again. Does not reheat a settled layout.
    pub fn unpin(&self, node_id: &str) -> Result<(), InteractionError> {
        self.send(LayoutCommand::Unpin {
            node_id: node_id.to_owned(),
        })
    }

    pub fn drag(&self, node_id: &str, x: f32, y: f32) -> Result<(), InteractionError> {
        let position = finite_position(node_id, x, y)?;
        self.send(LayoutCommand::Drag {
            node_id: node_id.to_owned(),
            position,
        })
    }

    /// Drag with a pointer in screen space, mapped through the viewport.
    pub fn drag_screen(
        &self,
        rect: Rect,
        node_id: &str,
        pointer: Pos2,
    ) -> Result<(), InteractionError> {
        let world = self.viewport.screen_to_world(rect, pointer);
        self.drag(node_id, world.x, world.y)
    }

    pub fn end_drag(&self, node_id: &str) -> Result<(), InteractionError> {
        self.send(LayoutCommand::Release {
            node_id: node_id.to_owned(),
            keep_pinned: self.drag_policy == DragPolicy::KeepPinned,
        })
    }

    pub fn set_viewport(&mut self, zoom: f32, pan: Vec2) -> Result<(), InteractionError> {
        self.viewport.set(zoom, pan)
    }

    pub fn pan_by(&mut self, delta: Vec2) -> Result<(), InteractionError> {
        self.viewport.pan_by(delta)
    }

    pub fn zoom_about(
        &mut self,
        rect: Rect,
        pointer: Pos2,
        scroll: f32,
    ) -> Result<(), InteractionError> {
        self.viewport.zoom_about(rect, pointer, scroll)
    }

    /// Flags nodes whose label matches `query` and returns how many matched.
    /// A blank query clears every flag.
    pub fn highlight(&mut self, scheduler: &mut Scheduler, query: &str) -> usize {
        self.query = query.to_owned();
        self.refresh_highlight(scheduler)
    }

    /// Re-applies the current query, e.g. after the scheduler restarted on a
    /// new subgraph.
    pub fn refresh_highlight(&self, scheduler: &mut Scheduler) -> usize {
        let matcher = LabelMatcher::new(self.highlight_mode, &self.query);
        let count = scheduler.set_highlights(|node| matcher.matches(&node.label));
        debug!(query = %self.query, count, "highlight updated");
        count
    }

    fn send(&self, command: LayoutCommand) -> Result<(), InteractionError> {
        self.commands.send(command)
    }
}

fn finite_position(node_id: &str, x: f32, y: f32) -> Result<Vec2, InteractionError> {
    if x.is_finite() && y.is_finite() {
        Ok(vec2(x, y))
    } else {
        Err(InteractionError::NonFiniteCoordinates {
            node_id: node_id.to_owned(),
        })
    }
}
