use std::fmt;
use std::str::FromStr;

use image::{Rgb, RgbImage};
use lazy_static::lazy_static;
use ndarray::Array2;

use crate::fractal::MAX_ITERATIONS;

/// Colour given to points that never escape.
pub const BOUNDED: u32 = 0x000000;

pub trait Painter {
    /// Packed `0x00RRGGBB` colour for an escape result.
    fn color(&self, escape: Option<u32>) -> u32;
}

/// Hue drifting three full turns over the iteration range, starting at 0.7.
pub fn hue(i: u32) -> f32 {
    0.7 + (i as f32 / MAX_ITERATIONS as f32) * 3.0
}

fn channel(v: f32) -> u32 {
    ((v * 255.0 + 0.5) as u32).min(255)
}

/// Hue/saturation/brightness to packed RGB.
///
/// Only the fractional part of `hue` is used. Matches the classic
/// `HSBtoRGB` rounding (`v * 255 + 0.5`, truncated) for `brightness <= 1`.
pub fn hsb_to_rgb(hue: f32, saturation: f32, brightness: f32) -> u32 {
    let (r, g, b) = if saturation == 0.0 {
        let v = channel(brightness);
        (v, v, v)
    } else {
        let h = (hue - hue.floor()) * 6.0;
        let f = h - h.floor();
        let p = brightness * (1.0 - saturation);
        let q = brightness * (1.0 - saturation * f);
        let t = brightness * (1.0 - saturation * (1.0 - f));
        let (r, g, b) = match h as u32 {
            0 => (brightness, t, p),
            1 => (q, brightness, p),
            2 => (p, brightness, t),
            3 => (p, q, brightness),
            4 => (t, p, brightness),
            _ => (brightness, p, q),
        };
        (channel(r), channel(g), channel(b))
    };
    (r << 16) | (g << 8) | b
}

pub fn to_rgb(color: u32) -> Rgb<u8> {
    Rgb([(color >> 16) as u8, (color >> 8) as u8, color as u8])
}

lazy_static! {
    static ref HSB_TABLE: Vec<u32> = (0..MAX_ITERATIONS)
        .map(|i| hsb_to_rgb(hue(i), 1.0, 1.0))
        .collect();
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HsbPainter {
    brightness: f32,
}

impl HsbPainter {
    /// `brightness` is clamped to `(0, 1]`; anything at or below zero would
    /// make escaped points indistinguishable from bounded ones.
    pub fn new(brightness: f32) -> Self {
        let brightness = if brightness.is_nan() {
            1.0
        } else {
            brightness.clamp(f32::EPSILON, 1.0)
        };
        Self { brightness }
    }

    pub fn brightness(&self) -> f32 {
        self.brightness
    }
}

impl Default for HsbPainter {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Painter for HsbPainter {
    fn color(&self, escape: Option<u32>) -> u32 {
        match escape {
            None => BOUNDED,
            Some(i) if self.brightness == 1.0 && i < MAX_ITERATIONS => HSB_TABLE[i as usize],
            Some(i) => hsb_to_rgb(hue(i.min(MAX_ITERATIONS)), 1.0, self.brightness),
        }
    }
}

pub struct GreyscalePainter {
    max_i_value: f64,
}

impl GreyscalePainter {
    pub fn new(max_i_value: u32) -> Self {
        Self {
            max_i_value: max_i_value.max(1) as f64,
        }
    }
}

impl Default for GreyscalePainter {
    fn default() -> Self {
        Self::new(MAX_ITERATIONS)
    }
}

impl Painter for GreyscalePainter {
    fn color(&self, escape: Option<u32>) -> u32 {
        let i_value = match escape {
            Some(i) => i,
            None => return BOUNDED,
        };
        let frac: f64 = i_value as f64 / self.max_i_value;
        let frac = frac.clamp(0.0, 1.0);
        let v = 255 - (frac * 255.0).round() as u32;
        (v << 16) | (v << 8) | v
    }
}

/// Colour scheme picked through [`crate::Config`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Palette {
    #[default]
    Hsb,
    Greyscale,
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Palette::Hsb => write!(f, "hsb"),
            Palette::Greyscale => write!(f, "greyscale"),
        }
    }
}

impl FromStr for Palette {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hsb" | "hue" => Ok(Palette::Hsb),
            "greyscale" | "grayscale" | "grey" | "gray" => Ok(Palette::Greyscale),
            other => Err(format!("unknown palette '{}'", other)),
        }
    }
}

/// Unpacks a colour grid into an RGB image.
pub fn to_image(colors: &Array2<u32>) -> RgbImage {
    let (height, width) = colors.dim();
    let mut img = RgbImage::new(width as u32, height as u32);
    for ((y, x), &color) in colors.indexed_iter() {
        img.put_pixel(x as u32, y as u32, to_rgb(color));
    }
    img
}
