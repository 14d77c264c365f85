use crate::complex::C;
use crate::coord::Viewport;

use super::{iterate, EscapeTime};

/// Conjugate iteration, `z' = conj(z)² + c`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Tricorn;

impl EscapeTime for Tricorn {
    fn name(&self) -> &'static str {
        "Tricorn"
    }

    fn initial_viewport(&self) -> Viewport {
        Viewport::fixed(-2.0, -2.0, 4.0, 4.0)
    }

    fn escape_iterations(&self, x: f64, y: f64) -> Option<u32> {
        iterate(x, y, |z: C<f64>, c| {
            let zc = z.conj();
            zc * zc + c
        })
    }
}
