use num::{traits::NumOps, Num, One};

use crate::complex::*;
use crate::error::{Error, Result};
use crate::fractal::EscapeTime;

trait Two {
    fn two() -> Self;
}

impl<T> Two for T
where
    T: One + NumOps,
{
    fn two() -> Self {
        T::one() + T::one()
    }
}

/// Maps pixel `index` of a dimension `extent` pixels long onto `[lo, hi)`.
///
/// Used for both directions of the pixel/plane relation: rendering walks
/// every index through it, and a zoom click is converted with the very same
/// call so the clicked pixel lands exactly where it was drawn.
pub fn map_coordinate(lo: f64, hi: f64, extent: u32, index: u32) -> f64 {
    debug_assert!(extent > 0, "empty extent");
    debug_assert!(index < extent, "index {} outside extent {}", index, extent);
    lo + ((hi - lo) * index as f64) / extent as f64
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Axis<T> {
    pub min: T,
    pub max: T,
}

impl<T> Axis<T>
where
    T: Num + Copy,
{
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    pub fn length(&self) -> T {
        self.max - self.min
    }

    pub fn center(&self) -> T {
        (self.max + self.min) / T::two()
    }
}

impl Axis<f64> {
    pub fn coord(&self, extent: u32, index: u32) -> f64 {
        map_coordinate(self.min, self.max, extent, index)
    }
}

/// Axis-aligned rectangle of the complex plane mapped onto the pixel grid.
///
/// `origin` is the corner with the smallest coordinates; pixel row 0 maps to
/// `origin_y`, so imaginary values grow downwards on screen.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    origin_x: f64,
    origin_y: f64,
    width: f64,
    height: f64,
}

impl Viewport {
    pub fn new(origin_x: f64, origin_y: f64, width: f64, height: f64) -> Result<Self> {
        // Negated comparison so NaN is rejected too.
        if !(width > 0.0 && height > 0.0) {
            return Err(Error::InvalidViewport { width, height });
        }
        Ok(Self {
            origin_x,
            origin_y,
            width,
            height,
        })
    }

    /// For literal defaults whose sides are known to be positive.
    pub(crate) const fn fixed(origin_x: f64, origin_y: f64, width: f64, height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            width,
            height,
        }
    }

    pub fn from_axes(x: Axis<f64>, y: Axis<f64>) -> Result<Self> {
        Self::new(x.min, y.min, x.length(), y.length())
    }

    pub fn origin_x(&self) -> f64 {
        self.origin_x
    }

    pub fn origin_y(&self) -> f64 {
        self.origin_y
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn x_axis(&self) -> Axis<f64> {
        Axis::new(self.origin_x, self.origin_x + self.width)
    }

    pub fn y_axis(&self) -> Axis<f64> {
        Axis::new(self.origin_y, self.origin_y + self.height)
    }

    pub fn center(&self) -> C<f64> {
        c(self.x_axis().center(), self.y_axis().center())
    }

    /// Plane coordinate drawn at pixel `(px, py)` of a `size`x`size` grid.
    pub fn pixel_to_plane(&self, size: u32, px: u32, py: u32) -> C<f64> {
        c(self.x_axis().coord(size, px), self.y_axis().coord(size, py))
    }

    pub fn reset<A: EscapeTime>(&mut self, algorithm: &A) {
        *self = algorithm.initial_viewport();
    }

    /// Scales both sides by `factor` (below 1 zooms in) and centres the
    /// result on `(x, y)`.
    ///
    /// Nothing stops repeated zooming; past roughly 1e-15 of the initial
    /// width neighbouring pixels collapse onto the same `f64`.
    pub fn recenter_and_zoom(&mut self, x: f64, y: f64, factor: f64) -> Result<()> {
        let width = self.width * factor;
        let height = self.height * factor;
        if !(factor.is_finite() && width > 0.0 && height > 0.0) {
            return Err(Error::InvalidViewport { width, height });
        }
        self.width = width;
        self.height = height;
        self.origin_x = x - width / f64::two();
        self.origin_y = y - height / f64::two();
        Ok(())
    }
}
