//! Mapping between image pixel space and the inspector's display space.

use eframe::egui::{Pos2, Rect, Vec2, pos2, vec2};
use serde::{Deserialize, Serialize};

/// Selections at or below this size (in image pixels) on either axis are not
/// used for cropping or as an aspect reference.
pub const MIN_SELECTION: f32 = 5.0;

/// Pixel dimensions of the loaded source image. Never zero on either axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageBounds {
    width: f32,
    height: f32,
}

impl ImageBounds {
    pub fn new(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self {
            width: width as f32,
            height: height as f32,
        })
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn size(&self) -> Vec2 {
        vec2(self.width, self.height)
    }

    pub fn rect(&self) -> Rect {
        Rect::from_min_size(Pos2::ZERO, self.size())
    }

    /// Intersects `rect` with the image. The result is normalized and may be
    /// zero-sized when `rect` lies entirely outside.
    pub fn clip(&self, rect: Rect) -> Rect {
        let max = pos2(self.width, self.height);
        let a = rect.min.clamp(Pos2::ZERO, max);
        let b = rect.max.clamp(Pos2::ZERO, max);
        Rect::from_two_pos(a, b)
    }

    /// Height over width of the whole image.
    pub fn aspect(&self) -> f32 {
        self.height / self.width
    }
}

/// Uniform scale plus letterbox offset from image space to display space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub scale: f32,
    pub offset: Vec2,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::ZERO
    }
}

impl ViewTransform {
    /// Maps everything onto the display origin; used while there is no image.
    pub const ZERO: Self = Self {
        scale: 0.0,
        offset: Vec2::ZERO,
    };

    /// Fits an image of `image_size` inside `display`, preserving aspect and
    /// centering the leftover space.
    pub fn fit(display: Rect, image_size: Vec2) -> Self {
        if image_size.x <= 0.0
            || image_size.y <= 0.0
            || display.width() <= 0.0
            || display.height() <= 0.0
        {
            return Self::ZERO;
        }

        let scale = (display.width() / image_size.x).min(display.height() / image_size.y);
        let shown = image_size * scale;
        let offset = display.min.to_vec2() + (display.size() - shown) / 2.0;

        Self { scale, offset }
    }

    pub fn is_degenerate(&self) -> bool {
        self.scale <= 0.0 || !self.scale.is_finite()
    }

    pub fn to_display_pos(&self, pos: Pos2) -> Pos2 {
        pos2(
            pos.x * self.scale + self.offset.x,
            pos.y * self.scale + self.offset.y,
        )
    }

    /// Origin is mapped, size is only scaled.
    pub fn to_display_rect(&self, rect: Rect) -> Rect {
        Rect::from_min_size(self.to_display_pos(rect.min), rect.size() * self.scale)
    }

    pub fn to_image_pos(&self, pos: Pos2) -> Pos2 {
        if self.is_degenerate() {
            return Pos2::ZERO;
        }
        pos2(
            (pos.x - self.offset.x) / self.scale,
            (pos.y - self.offset.y) / self.scale,
        )
    }

    /// Where the whole image lands on screen.
    pub fn image_rect(&self, bounds: &ImageBounds) -> Rect {
        self.to_display_rect(bounds.rect())
    }
}

/// Integer pixel crop box handed to the conversion pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropBox {
    /// Truncates the selection edges to whole pixels.
    pub fn from_rect(rect: Rect) -> Self {
        Self {
            left: rect.min.x.max(0.0) as u32,
            top: rect.min.y.max(0.0) as u32,
            right: rect.max.x.max(0.0) as u32,
            bottom: rect.max.y.max(0.0) as u32,
        }
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }
}

/// Whether a selection is large enough to crop with.
pub fn is_meaningful(rect: Rect) -> bool {
    rect.width() > MIN_SELECTION && rect.height() > MIN_SELECTION
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display() -> Rect {
        Rect::from_min_size(pos2(10.0, 20.0), vec2(400.0, 400.0))
    }

    #[test]
    fn fit_letterboxes_wide_image() {
        let view = ViewTransform::fit(display(), vec2(800.0, 600.0));
        assert_eq!(view.scale, 0.5);
        // 400x300 shown inside 400x400, 50 px bars top and bottom
        assert_eq!(view.offset, vec2(10.0, 70.0));
    }

    #[test]
    fn fit_pillarboxes_tall_image() {
        let view = ViewTransform::fit(display(), vec2(200.0, 800.0));
        assert_eq!(view.scale, 0.5);
        assert_eq!(view.offset, vec2(160.0, 20.0));
    }

    #[test]
    fn rect_maps_origin_and_scales_size() {
        let view = ViewTransform::fit(display(), vec2(800.0, 600.0));
        let r = view.to_display_rect(Rect::from_min_size(pos2(100.0, 100.0), vec2(200.0, 50.0)));
        assert_eq!(r.min, pos2(60.0, 120.0));
        assert_eq!(r.size(), vec2(100.0, 25.0));
    }

    #[test]
    fn image_to_display_round_trips() {
        let view = ViewTransform::fit(display(), vec2(1023.0, 767.0));
        for p in [pos2(0.0, 0.0), pos2(511.5, 300.25), pos2(1023.0, 767.0), pos2(3.0, 700.0)] {
            let back = view.to_image_pos(view.to_display_pos(p));
            assert!((back - p).length() < 1e-3, "{p:?} came back as {back:?}");
        }
    }

    #[test]
    fn zero_sized_image_maps_to_nothing() {
        let view = ViewTransform::fit(display(), vec2(0.0, 600.0));
        assert!(view.is_degenerate());
        assert_eq!(view.to_image_pos(pos2(50.0, 50.0)), Pos2::ZERO);
        assert!(ImageBounds::new(0, 600).is_none());
        assert!(ImageBounds::new(10, 0).is_none());
    }

    #[test]
    fn clip_keeps_rect_inside_image() {
        let bounds = ImageBounds::new(800, 600).unwrap();
        let r = bounds.clip(Rect::from_min_max(pos2(-20.0, 500.0), pos2(900.0, 700.0)));
        assert_eq!(r, Rect::from_min_max(pos2(0.0, 500.0), pos2(800.0, 600.0)));

        let outside = bounds.clip(Rect::from_min_max(pos2(900.0, 10.0), pos2(950.0, 20.0)));
        assert_eq!(outside.width(), 0.0);
        assert!(bounds.rect().contains_rect(outside));
    }

    #[test]
    fn crop_box_truncates_edges() {
        let b = CropBox::from_rect(Rect::from_min_size(pos2(10.7, 3.2), vec2(100.6, 50.5)));
        assert_eq!(b, CropBox { left: 10, top: 3, right: 111, bottom: 53 });
        assert_eq!(b.width(), 101);
        assert_eq!(b.height(), 50);
    }

    #[test]
    fn tiny_selections_are_not_meaningful() {
        assert!(!is_meaningful(Rect::from_min_size(Pos2::ZERO, vec2(5.0, 100.0))));
        assert!(is_meaningful(Rect::from_min_size(Pos2::ZERO, vec2(5.5, 5.5))));
    }
}
