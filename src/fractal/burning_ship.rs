use crate::complex::{fold_abs, C};
use crate::coord::Viewport;

use super::{iterate, EscapeTime};

/// `z' = (|Re z| + i|Im z|)² + c`, which expands to `(x² − y² + cx, 2|xy| + cy)`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BurningShip;

impl EscapeTime for BurningShip {
    fn name(&self) -> &'static str {
        "Burning Ship"
    }

    /// x in [-2, 2], y in [-2.5, 1.5]; with y growing downwards the ship
    /// sits upright.
    fn initial_viewport(&self) -> Viewport {
        Viewport::fixed(-2.0, -2.5, 4.0, 4.0)
    }

    fn escape_iterations(&self, x: f64, y: f64) -> Option<u32> {
        iterate(x, y, |z: C<f64>, c| {
            let za = fold_abs(z);
            za * za + c
        })
    }
}
