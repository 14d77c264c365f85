use crate::complex::C;
use crate::coord::Viewport;

use super::{iterate, EscapeTime};

/// `z' = z² + c`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Mandelbrot;

impl EscapeTime for Mandelbrot {
    fn name(&self) -> &'static str {
        "Mandelbrot"
    }

    fn initial_viewport(&self) -> Viewport {
        Viewport::fixed(-2.0, -1.5, 3.0, 3.0)
    }

    fn escape_iterations(&self, x: f64, y: f64) -> Option<u32> {
        iterate(x, y, |z: C<f64>, c| z * z + c)
    }
}
