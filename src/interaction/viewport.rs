use eframe::egui::{Pos2, Rect, Vec2};

use crate::error::InteractionError;

pub const MIN_ZOOM: f32 = 0.05;
pub const MAX_ZOOM: f32 = 6.0;

/// Zoom/pan transform between world and screen space. Independent of the
/// simulation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    zoom: f32,
    pan: Vec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
        }
    }
}

impl Viewport {
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    /// Non-finite or non-positive zoom and non-finite pan are rejected and
    /// leave the viewport unchanged; finite zoom is clamped into range.
    pub fn set(&mut self, zoom: f32, pan: Vec2) -> Result<(), InteractionError> {
        if !(zoom.is_finite() && zoom > 0.0) {
            return Err(InteractionError::InvalidZoom(zoom));
        }
        if !pan.is_finite() {
            return Err(InteractionError::NonFinitePan);
        }

        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan = pan;
        Ok(())
    }

    pub fn pan_by(&mut self, delta: Vec2) -> Result<(), InteractionError> {
        self.set(self.zoom, self.pan + delta)
    }

    /// Scroll-wheel zoom that keeps the world point under `pointer` fixed.
    pub fn zoom_about(
        &mut self,
        rect: Rect,
        pointer: Pos2,
        scroll: f32,
    ) -> Result<(), InteractionError> {
        if !scroll.is_finite() {
            return Err(InteractionError::InvalidZoom(scroll));
        }
        if scroll.abs() <= f32::EPSILON {
            return Ok(());
        }

        let world_before = self.screen_to_world(rect, pointer);
        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        let zoom = (self.zoom * zoom_factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let pan = pointer - rect.center() - (world_before * zoom);
        self.set(zoom, pan)
    }

    pub fn world_to_screen(&self, rect: Rect, world: Vec2) -> Pos2 {
        rect.center() + self.pan + world * self.zoom
    }

    pub fn screen_to_world(&self, rect: Rect, screen: Pos2) -> Vec2 {
        (screen - rect.center() - self.pan) / self.zoom
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;

    fn rect() -> Rect {
        Rect::from_min_size(Pos2::ZERO, vec2(800.0, 600.0))
    }

    #[test]
    fn rejects_degenerate_zoom_and_pan() {
        let mut viewport = Viewport::default();
        assert_eq!(viewport.set(0.0, Vec2::ZERO), Err(InteractionError::InvalidZoom(0.0)));
        assert_eq!(
            viewport.set(-2.0, Vec2::ZERO),
            Err(InteractionError::InvalidZoom(-2.0))
        );
        assert!(viewport.set(f32::NAN, Vec2::ZERO).is_err());
        assert!(viewport.set(f32::INFINITY, Vec2::ZERO).is_err());
        assert_eq!(
            viewport.set(1.0, vec2(f32::NAN, 0.0)),
            Err(InteractionError::NonFinitePan)
        );
        assert_eq!(viewport, Viewport::default());
    }

    #[test]
    fn clamps_zoom_into_range() {
        let mut viewport = Viewport::default();
        viewport.set(100.0, vec2(5.0, 5.0)).unwrap();
        assert_eq!(viewport.zoom(), MAX_ZOOM);
        viewport.set(0.0001, Vec2::ZERO).unwrap();
        assert_eq!(viewport.zoom(), MIN_ZOOM);
    }

    #[test]
    fn pan_by_accumulates_and_rejects_non_finite_deltas() {
        let mut viewport = Viewport::default();
        viewport.set(2.0, vec2(10.0, -4.0)).unwrap();

        viewport.pan_by(vec2(5.0, 6.0)).unwrap();
        viewport.pan_by(vec2(-1.0, 0.5)).unwrap();
        assert_eq!(viewport.pan(), vec2(14.0, 2.5));
        assert_eq!(viewport.zoom(), 2.0);

        assert_eq!(
            viewport.pan_by(vec2(f32::INFINITY, 0.0)),
            Err(InteractionError::NonFinitePan)
        );
        assert_eq!(viewport.pan(), vec2(14.0, 2.5));
    }

    #[test]
    fn screen_and_world_round_trip() {
        let mut viewport = Viewport::default();
        viewport.set(2.0, vec2(30.0, -10.0)).unwrap();

        let world = vec2(12.0, 7.5);
        let screen = viewport.world_to_screen(rect(), world);
        assert_eq!(screen, pos2(400.0 + 30.0 + 24.0, 300.0 - 10.0 + 15.0));
        assert!((viewport.screen_to_world(rect(), screen) - world).length() < 1e-4);
    }

    #[test]
    fn zoom_keeps_pointer_anchored() {
        let mut viewport = Viewport::default();
        let pointer = pos2(620.0, 140.0);
        let anchored = viewport.screen_to_world(rect(), pointer);

        viewport.zoom_about(rect(), pointer, 80.0).unwrap();
        assert!(viewport.zoom() > 1.0);
        assert!((viewport.screen_to_world(rect(), pointer) - anchored).length() < 1e-3);

        let zoom = viewport.zoom();
        viewport.zoom_about(rect(), pointer, 0.0).unwrap();
        assert_eq!(viewport.zoom(), zoom);
    }
}
