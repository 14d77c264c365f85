use std::fmt;
use std::str::FromStr;

use crate::complex::{c, escaped, C};
use crate::coord::Viewport;
use crate::error::Error;

pub mod burning_ship;
pub mod mandelbrot;
pub mod tricorn;

pub use burning_ship::BurningShip;
pub use mandelbrot::Mandelbrot;
pub use tricorn::Tricorn;

pub const MAX_ITERATIONS: u32 = 2000;

/// An escape-time map over the complex plane.
///
/// Implementations are stateless; the row scheduler copies them into every
/// job, so `Copy + Send + Sync` is expected of anything dispatched.
pub trait EscapeTime {
    fn name(&self) -> &'static str;

    /// Region shown on selection and after a reset.
    fn initial_viewport(&self) -> Viewport;

    /// Zero-based index of the step after which `|z|² > 4`, or `None` when
    /// the orbit stays bounded for [`MAX_ITERATIONS`] steps.
    fn escape_iterations(&self, x: f64, y: f64) -> Option<u32>;
}

/// Runs `step` from `z = c = (x, y)` until bailout or the iteration cap.
pub(crate) fn iterate<F>(x: f64, y: f64, step: F) -> Option<u32>
where
    F: Fn(C<f64>, C<f64>) -> C<f64>,
{
    let c0 = c(x, y);
    let mut z = c0;
    for i in 0..MAX_ITERATIONS {
        z = step(z, c0);
        if escaped(&z) {
            return Some(i);
        }
    }
    None
}

/// The selectable algorithms, in menu order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Fractal {
    #[default]
    Mandelbrot,
    Tricorn,
    BurningShip,
}

impl Fractal {
    pub const ALL: [Fractal; 3] = [Fractal::Mandelbrot, Fractal::Tricorn, Fractal::BurningShip];
}

impl EscapeTime for Fractal {
    fn name(&self) -> &'static str {
        match self {
            Self::Mandelbrot => Mandelbrot.name(),
            Self::Tricorn => Tricorn.name(),
            Self::BurningShip => BurningShip.name(),
        }
    }

    fn initial_viewport(&self) -> Viewport {
        match self {
            Self::Mandelbrot => Mandelbrot.initial_viewport(),
            Self::Tricorn => Tricorn.initial_viewport(),
            Self::BurningShip => BurningShip.initial_viewport(),
        }
    }

    fn escape_iterations(&self, x: f64, y: f64) -> Option<u32> {
        match self {
            Self::Mandelbrot => Mandelbrot.escape_iterations(x, y),
            Self::Tricorn => Tricorn.escape_iterations(x, y),
            Self::BurningShip => BurningShip.escape_iterations(x, y),
        }
    }
}

impl fmt::Display for Fractal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Fractal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|ch| !matches!(ch, ' ' | '-' | '_'))
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "mandelbrot" => Ok(Self::Mandelbrot),
            "tricorn" => Ok(Self::Tricorn),
            "burningship" => Ok(Self::BurningShip),
            _ => Err(Error::UnsupportedAlgorithm(s.to_string())),
        }
    }
}
