//! Brightness, contrast and inversion applied before conversion.

use std::ops::RangeInclusive;

use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};

pub const FACTOR_RANGE: RangeInclusive<f32> = 0.5..=5.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Adjustments {
    pub contrast: f32,
    pub brightness: f32,
    pub invert: bool,
}

impl Default for Adjustments {
    fn default() -> Self {
        Self {
            contrast: 1.0,
            brightness: 1.0,
            invert: false,
        }
    }
}

impl Adjustments {
    /// Pulls factors back into [`FACTOR_RANGE`]; non-finite ones reset to 1.
    pub fn clamped(self) -> Self {
        let fit = |v: f32| {
            if v.is_finite() {
                v.clamp(*FACTOR_RANGE.start(), *FACTOR_RANGE.end())
            } else {
                1.0
            }
        };
        Self {
            contrast: fit(self.contrast),
            brightness: fit(self.brightness),
            invert: self.invert,
        }
    }

    pub fn is_identity(&self) -> bool {
        !self.invert && self.contrast == 1.0 && self.brightness == 1.0
    }

    /// Invert, then contrast, then brightness.
    pub fn apply(&self, image: &DynamicImage) -> RgbImage {
        let mut rgb = image.to_rgb8();
        if self.is_identity() {
            return rgb;
        }

        if self.invert {
            image::imageops::invert(&mut rgb);
        }

        if self.contrast != 1.0 {
            let mean = mean_luma(&rgb);
            for p in rgb.pixels_mut() {
                for c in p.0.iter_mut() {
                    *c = to_channel(mean + (*c as f32 - mean) * self.contrast);
                }
            }
        }

        if self.brightness != 1.0 {
            for p in rgb.pixels_mut() {
                for c in p.0.iter_mut() {
                    *c = to_channel(*c as f32 * self.brightness);
                }
            }
        }

        rgb
    }
}

/// Average grey level, rounded to a whole step like the contrast reference.
fn mean_luma(rgb: &RgbImage) -> f32 {
    let gray = DynamicImage::ImageRgb8(rgb.clone()).to_luma8();
    let count = gray.pixels().len().max(1) as f64;
    let sum: f64 = gray.pixels().map(|p| p.0[0] as f64).sum();
    (sum / count).round() as f32
}

fn to_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn two_tone(a: u8, b: u8) -> DynamicImage {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([a, a, a]));
        img.put_pixel(1, 0, Rgb([b, b, b]));
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn defaults_leave_pixels_alone() {
        let out = Adjustments::default().apply(&two_tone(17, 230));
        assert_eq!(out.get_pixel(0, 0), &Rgb([17, 17, 17]));
        assert_eq!(out.get_pixel(1, 0), &Rgb([230, 230, 230]));
    }

    #[test]
    fn brightness_scales_and_saturates() {
        let adj = Adjustments {
            brightness: 2.0,
            ..Default::default()
        };
        let out = adj.apply(&two_tone(100, 200));
        assert_eq!(out.get_pixel(0, 0).0[0], 200);
        assert_eq!(out.get_pixel(1, 0).0[0], 255);
    }

    #[test]
    fn contrast_spreads_around_the_mean() {
        let adj = Adjustments {
            contrast: 2.0,
            ..Default::default()
        };
        let out = adj.apply(&two_tone(50, 150));
        assert_eq!(out.get_pixel(0, 0).0[0], 0);
        assert_eq!(out.get_pixel(1, 0).0[0], 200);
    }

    #[test]
    fn invert_runs_before_brightness() {
        let adj = Adjustments {
            invert: true,
            brightness: 0.5,
            ..Default::default()
        };
        let out = adj.apply(&two_tone(0, 255));
        assert_eq!(out.get_pixel(0, 0).0[0], 128);
        assert_eq!(out.get_pixel(1, 0).0[0], 0);
    }

    #[test]
    fn clamped_pulls_factors_into_range() {
        let adj = Adjustments {
            contrast: 40.0,
            brightness: f32::NAN,
            invert: true,
        }
        .clamped();
        assert_eq!(adj.contrast, 5.0);
        assert_eq!(adj.brightness, 1.0);
        assert!(adj.invert);
    }
}
