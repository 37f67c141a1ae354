//! Crop rectangle editing driven by pointer events from the inspector.
//!
//! The editor keeps the selection in image pixel space and receives pointer
//! positions in display space; the current [`ViewTransform`] converts between
//! the two. Every rectangle it stores is normalized and lies inside the image.

use eframe::egui::{Pos2, Rect, pos2, vec2};
use log::debug;

use crate::geometry::{CropBox, ImageBounds, ViewTransform, is_meaningful};
use crate::hit_test::{Handle, HitArea, hit_test};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Interaction {
    #[default]
    Idle,
    Creating,
    Moving,
    Resizing(Handle),
}

/// Captured on pointer-down, dropped on pointer-up.
#[derive(Clone, Copy, Debug)]
struct DragAnchor {
    pointer: Pos2,
    snapshot: Option<Rect>,
}

#[derive(Debug, Default)]
pub struct CropEditor {
    bounds: Option<ImageBounds>,
    view: ViewTransform,
    selection: Option<Rect>,
    interaction: Interaction,
    anchor: Option<DragAnchor>,
}

impl CropEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new source image was loaded. Any selection or drag is discarded.
    pub fn set_image_bounds(&mut self, width: u32, height: u32) {
        self.bounds = ImageBounds::new(width, height);
        self.selection = None;
        self.interaction = Interaction::Idle;
        self.anchor = None;
        debug!("inspector bounds set to {width}x{height}");
    }

    pub fn bounds(&self) -> Option<ImageBounds> {
        self.bounds
    }

    pub fn set_view(&mut self, view: ViewTransform) {
        self.view = view;
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    pub fn selection(&self) -> Option<Rect> {
        self.selection
    }

    /// The selection, if it is large enough to crop with.
    pub fn active_crop(&self) -> Option<Rect> {
        self.selection.filter(|r| is_meaningful(*r))
    }

    pub fn crop_box(&self) -> Option<CropBox> {
        self.active_crop().map(CropBox::from_rect)
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
        self.interaction = Interaction::Idle;
        self.anchor = None;
    }

    fn accepts_input(&self) -> bool {
        self.bounds.is_some() && !self.view.is_degenerate()
    }

    /// What a press at `pos` would do, for cursor feedback.
    pub fn hover(&self, pos: Pos2) -> HitArea {
        hit_test(pos, self.selection, &self.view)
    }

    pub fn pointer_down(&mut self, pos: Pos2) {
        let Some(bounds) = self.bounds.filter(|_| self.accepts_input()) else {
            return;
        };
        let area = hit_test(pos, self.selection, &self.view);
        let mut pointer = self.view.to_image_pos(pos);
        self.interaction = match area {
            HitArea::Create => {
                // presses in the letterbox bars start on the nearest image edge
                let image = bounds.rect();
                pointer = pointer.clamp(image.min, image.max);
                self.selection = Some(Rect::from_min_max(pointer, pointer));
                Interaction::Creating
            }
            HitArea::Move => Interaction::Moving,
            HitArea::Corner(handle) => Interaction::Resizing(handle),
        };
        self.anchor = Some(DragAnchor {
            pointer,
            snapshot: self.selection,
        });
        debug!("drag started: {:?} at {:?}", self.interaction, pointer);
    }

    /// Returns `true` when the selection changed and downstream consumers
    /// should be notified.
    pub fn pointer_move(&mut self, pos: Pos2) -> bool {
        let (Some(bounds), Some(anchor)) = (self.bounds, self.anchor) else {
            return false;
        };
        let pointer = self.view.to_image_pos(pos);

        let next = match self.interaction {
            Interaction::Idle => return false,
            Interaction::Creating => Rect::from_two_pos(anchor.pointer, pointer),
            Interaction::Moving => {
                let Some(snapshot) = anchor.snapshot else {
                    return false;
                };
                keep_inside(snapshot.translate(pointer - anchor.pointer), &bounds)
            }
            Interaction::Resizing(handle) => {
                let Some(snapshot) = anchor.snapshot else {
                    return false;
                };
                Rect::from_two_pos(handle.opposite_of(snapshot), pointer)
            }
        };

        let next = bounds.clip(next);
        let changed = self.selection != Some(next);
        self.selection = Some(next);
        changed
    }

    /// Ends the current drag. Returns `true` if one was in progress, so the
    /// consumer recomputes on release just like on move.
    pub fn pointer_up(&mut self) -> bool {
        if self.interaction == Interaction::Idle {
            return false;
        }
        self.interaction = Interaction::Idle;
        self.anchor = None;
        if self.selection.is_some_and(|r| r.width() <= 0.0 || r.height() <= 0.0) {
            self.selection = None;
        }
        debug!("drag finished, selection {:?}", self.selection);
        true
    }

    /// Numeric entry path. Negative sizes are flipped, the result is clipped
    /// to the image, and an empty result clears the selection.
    pub fn set_manual(&mut self, x: f32, y: f32, width: f32, height: f32) -> bool {
        let Some(bounds) = self.bounds else {
            return false;
        };
        let rect = bounds.clip(Rect::from_two_pos(pos2(x, y), pos2(x + width, y + height)));
        let next = (rect.width() > 0.0 && rect.height() > 0.0).then_some(rect);
        let changed = self.selection != next;
        self.selection = next;
        changed
    }

    /// Reinstates a selection saved earlier, through the same clipping path.
    pub fn restore(&mut self, selection: Option<Rect>) -> bool {
        match selection {
            Some(r) => self.set_manual(r.min.x, r.min.y, r.width(), r.height()),
            None => {
                let changed = self.selection.is_some();
                self.clear_selection();
                changed
            }
        }
    }
}

/// Shifts `rect` back inside `bounds` edge by edge without resizing it.
fn keep_inside(mut rect: Rect, bounds: &ImageBounds) -> Rect {
    if rect.min.x < 0.0 {
        rect = rect.translate(vec2(-rect.min.x, 0.0));
    }
    if rect.min.y < 0.0 {
        rect = rect.translate(vec2(0.0, -rect.min.y));
    }
    if rect.max.x > bounds.width() {
        rect = rect.translate(vec2(bounds.width() - rect.max.x, 0.0));
    }
    if rect.max.y > bounds.height() {
        rect = rect.translate(vec2(0.0, bounds.height() - rect.max.y));
    }
    rect
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 800x600 image shown 1:1 with no offset, so display == image space.
    fn editor() -> CropEditor {
        let mut e = CropEditor::new();
        e.set_image_bounds(800, 600);
        e.set_view(ViewTransform {
            scale: 1.0,
            offset: vec2(0.0, 0.0),
        });
        e
    }

    fn rect(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect::from_min_size(pos2(x, y), vec2(w, h))
    }

    fn assert_inside(e: &CropEditor) {
        if let Some(r) = e.selection() {
            assert!(r.width() >= 0.0 && r.height() >= 0.0, "{r:?}");
            assert!(r.min.x >= 0.0 && r.min.y >= 0.0, "{r:?}");
            assert!(r.max.x <= 800.0 && r.max.y <= 600.0, "{r:?}");
        }
    }

    #[test]
    fn create_drag_builds_normalized_rect() {
        let mut e = editor();
        e.pointer_down(pos2(100.0, 100.0));
        assert_eq!(e.interaction(), Interaction::Creating);
        assert!(e.pointer_move(pos2(300.0, 250.0)));
        assert_eq!(e.selection(), Some(rect(100.0, 100.0, 200.0, 150.0)));
        assert!(e.pointer_up());
        assert_eq!(e.interaction(), Interaction::Idle);
    }

    #[test]
    fn create_drag_up_and_left_normalizes() {
        let mut e = editor();
        e.pointer_down(pos2(300.0, 250.0));
        e.pointer_move(pos2(100.0, 100.0));
        assert_eq!(e.selection(), Some(rect(100.0, 100.0, 200.0, 150.0)));
    }

    #[test]
    fn create_drag_past_the_image_is_clipped() {
        let mut e = editor();
        e.pointer_down(pos2(700.0, 500.0));
        e.pointer_move(pos2(1000.0, 900.0));
        assert_eq!(e.selection(), Some(rect(700.0, 500.0, 100.0, 100.0)));
    }

    #[test]
    fn click_without_drag_leaves_no_selection() {
        let mut e = editor();
        e.set_manual(50.0, 50.0, 200.0, 100.0);
        e.pointer_down(pos2(600.0, 500.0));
        assert_eq!(e.selection(), Some(rect(600.0, 500.0, 0.0, 0.0)));
        assert!(e.pointer_up());
        assert_eq!(e.selection(), None);
    }

    #[test]
    fn move_clamps_at_left_edge() {
        let mut e = editor();
        e.set_manual(50.0, 50.0, 200.0, 100.0);
        e.pointer_down(pos2(150.0, 100.0));
        assert_eq!(e.interaction(), Interaction::Moving);
        e.pointer_move(pos2(50.0, 100.0));
        assert_eq!(e.selection(), Some(rect(0.0, 50.0, 200.0, 100.0)));
    }

    #[test]
    fn move_keeps_size_and_only_clamps_position() {
        let mut e = editor();
        e.set_manual(300.0, 200.0, 200.0, 100.0);
        e.pointer_down(pos2(400.0, 250.0));
        for (dx, dy) in [(10.0, 5.0), (-250.0, 40.0), (900.0, -900.0), (-5000.0, 5000.0), (3.0, 3.0)] {
            e.pointer_move(pos2(400.0 + dx, 250.0 + dy));
            let r = e.selection().unwrap();
            assert_eq!(r.size(), vec2(200.0, 100.0));
            assert_inside(&e);
        }
        assert_eq!(e.selection(), Some(rect(303.0, 203.0, 200.0, 100.0)));
    }

    #[test]
    fn move_is_relative_to_the_snapshot() {
        let mut e = editor();
        e.set_manual(100.0, 100.0, 100.0, 100.0);
        e.pointer_down(pos2(150.0, 150.0));
        e.pointer_move(pos2(160.0, 170.0));
        e.pointer_move(pos2(170.0, 190.0));
        assert_eq!(e.selection(), Some(rect(120.0, 140.0, 100.0, 100.0)));
    }

    #[test]
    fn corner_resize_moves_only_that_corner() {
        let mut e = editor();
        e.set_manual(100.0, 100.0, 200.0, 100.0);
        e.pointer_down(pos2(300.0, 200.0));
        assert_eq!(e.interaction(), Interaction::Resizing(Handle::BottomRight));
        e.pointer_move(pos2(350.0, 260.0));
        assert_eq!(e.selection(), Some(rect(100.0, 100.0, 250.0, 160.0)));
    }

    #[test]
    fn corner_dragged_past_opposite_flips() {
        let mut e = editor();
        e.set_manual(100.0, 100.0, 200.0, 100.0);
        e.pointer_down(pos2(100.0, 100.0));
        assert_eq!(e.interaction(), Interaction::Resizing(Handle::TopLeft));
        e.pointer_move(pos2(400.0, 300.0));
        assert_eq!(e.selection(), Some(rect(300.0, 200.0, 100.0, 100.0)));
        e.pointer_move(pos2(350.0, 150.0));
        assert_eq!(e.selection(), Some(rect(300.0, 150.0, 50.0, 50.0)));
        assert_inside(&e);
    }

    #[test]
    fn pointer_down_outside_replaces_selection() {
        let mut e = editor();
        e.set_manual(100.0, 100.0, 50.0, 50.0);
        e.pointer_down(pos2(500.0, 400.0));
        assert_eq!(e.interaction(), Interaction::Creating);
        e.pointer_move(pos2(520.0, 430.0));
        assert_eq!(e.selection(), Some(rect(500.0, 400.0, 20.0, 30.0)));
    }

    #[test]
    fn display_offset_and_scale_are_respected() {
        let mut e = CropEditor::new();
        e.set_image_bounds(800, 600);
        e.set_view(ViewTransform::fit(
            Rect::from_min_size(pos2(0.0, 0.0), vec2(400.0, 400.0)),
            vec2(800.0, 600.0),
        ));
        // scale 0.5, offset (0, 50)
        e.pointer_down(pos2(50.0, 100.0));
        e.pointer_move(pos2(150.0, 175.0));
        assert_eq!(e.selection(), Some(rect(100.0, 100.0, 200.0, 150.0)));
    }

    #[test]
    fn press_in_letterbox_bar_starts_on_the_image_edge() {
        let mut e = CropEditor::new();
        e.set_image_bounds(800, 600);
        e.set_view(ViewTransform::fit(
            Rect::from_min_size(pos2(0.0, 0.0), vec2(400.0, 400.0)),
            vec2(800.0, 600.0),
        ));
        // image spans y 50..350 on screen; y 10 is in the top bar
        e.pointer_down(pos2(200.0, 10.0));
        assert_eq!(e.interaction(), Interaction::Creating);
        assert_eq!(e.selection(), Some(rect(400.0, 0.0, 0.0, 0.0)));
        assert_inside(&e);

        e.pointer_move(pos2(250.0, 100.0));
        assert_eq!(e.selection(), Some(rect(400.0, 0.0, 100.0, 100.0)));
    }

    #[test]
    fn idle_moves_do_nothing() {
        let mut e = editor();
        assert!(!e.pointer_move(pos2(10.0, 10.0)));
        assert!(!e.pointer_up());
        assert_eq!(e.selection(), None);
    }

    #[test]
    fn no_image_means_no_interaction() {
        let mut e = CropEditor::new();
        e.set_image_bounds(0, 600);
        e.set_view(ViewTransform {
            scale: 1.0,
            offset: vec2(0.0, 0.0),
        });
        e.pointer_down(pos2(10.0, 10.0));
        assert!(!e.pointer_move(pos2(50.0, 50.0)));
        assert_eq!(e.selection(), None);
        assert!(!e.set_manual(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn new_image_resets_selection() {
        let mut e = editor();
        e.set_manual(10.0, 10.0, 100.0, 100.0);
        e.set_image_bounds(320, 240);
        assert_eq!(e.selection(), None);
        assert_eq!(e.bounds(), ImageBounds::new(320, 240));
    }

    #[test]
    fn manual_entry_shares_the_clipping_path() {
        let mut e = editor();
        assert!(e.set_manual(700.0, 550.0, 300.0, 300.0));
        assert_eq!(e.selection(), Some(rect(700.0, 550.0, 100.0, 50.0)));
        assert!(e.set_manual(200.0, 200.0, -100.0, -50.0));
        assert_eq!(e.selection(), Some(rect(100.0, 150.0, 100.0, 50.0)));
        assert!(e.set_manual(900.0, 10.0, 50.0, 50.0));
        assert_eq!(e.selection(), None);
        assert!(!e.set_manual(900.0, 10.0, 50.0, 50.0));
    }

    #[test]
    fn active_crop_requires_meaningful_size() {
        let mut e = editor();
        e.set_manual(10.0, 10.0, 4.0, 100.0);
        assert!(e.selection().is_some());
        assert_eq!(e.active_crop(), None);
        assert_eq!(e.crop_box(), None);

        e.set_manual(10.5, 20.2, 100.0, 50.0);
        assert_eq!(
            e.crop_box(),
            Some(CropBox { left: 10, top: 20, right: 110, bottom: 70 })
        );
    }

    #[test]
    fn restore_round_trips_and_clears() {
        let mut e = editor();
        assert!(e.restore(Some(rect(20.0, 30.0, 40.0, 50.0))));
        assert_eq!(e.selection(), Some(rect(20.0, 30.0, 40.0, 50.0)));
        assert!(e.restore(None));
        assert_eq!(e.selection(), None);
    }

    #[test]
    fn every_sequence_stays_inside_the_image() {
        // Small LCG so the walk is deterministic.
        let mut seed: u32 = 0x2545_f491;
        let mut next = move |range: f32| {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (seed >> 8) as f32 / (1u32 << 24) as f32 * range
        };

        let mut e = editor();
        for _ in 0..200 {
            e.pointer_down(pos2(next(1000.0) - 100.0, next(800.0) - 100.0));
            assert_inside(&e);
            for _ in 0..8 {
                e.pointer_move(pos2(next(1200.0) - 200.0, next(1000.0) - 200.0));
                assert_inside(&e);
            }
            e.pointer_up();
            assert_inside(&e);
        }
    }
}
