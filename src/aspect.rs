//! Width/height linkage for the ASCII output grid.

use std::ops::RangeInclusive;

use eframe::egui::Rect;
use serde::{Deserialize, Serialize};

use crate::geometry::{ImageBounds, is_meaningful};

/// A monospace cell is about twice as tall as it is wide.
pub const CHAR_CELL_ASPECT: f32 = 0.5;

pub const WIDTH_RANGE: RangeInclusive<u32> = 20..=600;
pub const HEIGHT_RANGE: RangeInclusive<u32> = 10..=300;

/// Height over width of whatever will actually be converted: the selection
/// when it is meaningful, otherwise the full image.
pub fn reference_aspect(selection: Option<Rect>, bounds: ImageBounds) -> f32 {
    match selection.filter(|r| is_meaningful(*r)) {
        Some(r) => r.height() / r.width(),
        None => bounds.aspect(),
    }
}

pub fn linked_height(width: u32, aspect: f32) -> u32 {
    (width as f32 * aspect * CHAR_CELL_ASPECT).round().max(0.0) as u32
}

pub fn linked_width(height: u32, aspect: f32) -> u32 {
    (height as f32 / aspect / CHAR_CELL_ASPECT).round().max(0.0) as u32
}

fn clamp_to(value: u32, range: &RangeInclusive<u32>) -> u32 {
    value.clamp(*range.start(), *range.end())
}

/// Output grid size in characters with an optional aspect lock.
///
/// Setting one dimension while locked derives the other. The derived value
/// is applied with `applying` raised so it does not sync back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutputSize {
    width: u32,
    height: u32,
    locked: bool,
    #[serde(skip)]
    applying: bool,
}

impl Default for OutputSize {
    fn default() -> Self {
        Self {
            width: 120,
            height: 60,
            locked: true,
            applying: false,
        }
    }
}

impl OutputSize {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn locked(&self) -> bool {
        self.locked
    }

    /// `reference` is `None` while no image is loaded, which disables the
    /// linkage.
    pub fn set_width(&mut self, width: u32, reference: Option<f32>) {
        self.width = clamp_to(width, &WIDTH_RANGE);
        if self.applying || !self.locked {
            return;
        }
        let Some(aspect) = reference else {
            return;
        };
        self.applying = true;
        self.set_height(linked_height(self.width, aspect), reference);
        self.applying = false;
    }

    pub fn set_height(&mut self, height: u32, reference: Option<f32>) {
        self.height = clamp_to(height, &HEIGHT_RANGE);
        if self.applying || !self.locked {
            return;
        }
        let Some(aspect) = reference else {
            return;
        };
        self.applying = true;
        self.set_width(linked_width(self.height, aspect), reference);
        self.applying = false;
    }

    /// Brings values read from disk back into range without relinking them.
    pub fn clamped(self) -> Self {
        Self {
            width: clamp_to(self.width, &WIDTH_RANGE),
            height: clamp_to(self.height, &HEIGHT_RANGE),
            locked: self.locked,
            applying: false,
        }
    }

    /// Turning the lock on re-derives the height from the current width.
    pub fn set_locked(&mut self, locked: bool, reference: Option<f32>) {
        self.locked = locked;
        self.resync(reference);
    }

    /// Re-derives the height after the reference changed (crop edited, image
    /// loaded).
    pub fn resync(&mut self, reference: Option<f32>) {
        self.set_width(self.width, reference);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::{pos2, vec2};

    fn image() -> ImageBounds {
        ImageBounds::new(800, 600).unwrap()
    }

    #[test]
    fn whole_image_reference_without_crop() {
        let aspect = reference_aspect(None, image());
        assert_eq!(aspect, 0.75);
        let mut size = OutputSize::default();
        size.set_width(120, Some(aspect));
        assert_eq!(size.height(), 45);
        assert_eq!(size.width(), 120);
    }

    #[test]
    fn meaningful_selection_is_the_reference() {
        let sel = Rect::from_min_size(pos2(10.0, 10.0), vec2(200.0, 100.0));
        assert_eq!(reference_aspect(Some(sel), image()), 0.5);

        let sliver = Rect::from_min_size(pos2(10.0, 10.0), vec2(200.0, 4.0));
        assert_eq!(reference_aspect(Some(sliver), image()), 0.75);
    }

    #[test]
    fn height_drives_width() {
        let mut size = OutputSize::default();
        size.set_height(90, Some(0.75));
        assert_eq!(size.width(), 240);
        assert_eq!(size.height(), 90);
    }

    #[test]
    fn derived_value_does_not_echo_back() {
        let mut size = OutputSize::default();
        // 121 * 0.75 * 0.5 = 45.375 -> 45, and 45 would map back to 120
        size.set_width(121, Some(0.75));
        assert_eq!(size.height(), 45);
        assert_eq!(size.width(), 121);
        size.set_width(121, Some(0.75));
        assert_eq!((size.width(), size.height()), (121, 45));
    }

    #[test]
    fn derived_value_is_clamped_to_range() {
        let mut size = OutputSize::default();
        size.set_width(600, Some(2.0));
        assert_eq!(size.height(), *HEIGHT_RANGE.end());
        size.set_height(10, Some(4.0));
        assert_eq!(size.width(), *WIDTH_RANGE.start());
        size.set_width(5000, None);
        assert_eq!(size.width(), 600);
    }

    #[test]
    fn unlocked_or_without_image_leaves_other_side_alone() {
        let mut size = OutputSize::default();
        size.set_width(200, None);
        assert_eq!(size.height(), 60);

        size.set_locked(false, Some(0.75));
        size.set_width(300, Some(0.75));
        assert_eq!(size.height(), 60);

        size.set_locked(true, Some(0.75));
        assert_eq!(size.height(), 113);
    }

    #[test]
    fn linked_formulas_round() {
        assert_eq!(linked_height(100, 0.333), 17);
        assert_eq!(linked_width(25, 0.75), 67);
    }
}
