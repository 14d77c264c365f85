//! Escape-time fractal rendering: coordinate mapping, the Mandelbrot family
//! of maps, viewport navigation, and a row-parallel scheduler that draws
//! into any [`pixels::PixelSink`].
use std::sync::Arc;

use ndarray::Array2;

pub mod bench;
pub mod complex;
pub mod config;
pub mod coord;
pub mod error;
pub mod explorer;
pub mod export;
pub mod fractal;
pub mod painter;
pub mod pixels;
pub mod scheduler;
pub mod threads;

pub use config::Config;
pub use error::{Error, Result};
pub use explorer::{Action, Explorer};
pub use fractal::{EscapeTime, Fractal};
pub use pixels::{ImageDisplay, PixelSink};

/// Renders the default view of `fractal` and returns the colour grid.
pub fn render(fractal: Fractal, config: Config) -> Result<Array2<u32>> {
    let display = Arc::new(ImageDisplay::new(config.display_size));
    let mut explorer = Explorer::new(config, display)?;
    if fractal != explorer.algorithm() {
        explorer.select(fractal);
    }
    explorer.wait_idle();
    Ok(explorer.snapshot())
}
