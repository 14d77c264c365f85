use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use image::RgbImage;
use ndarray::Array2;

use crate::painter::to_image;

/// Square colour grid the renderer draws into, typically backed by whatever
/// widget displays the image.
///
/// Methods take `&self`: row jobs on several worker threads write into the
/// same sink, each into its own row.
pub trait PixelSink: Send + Sync {
    fn size(&self) -> u32;

    fn set_pixel(&self, x: u32, y: u32, color: u32);

    /// Stores a whole computed row. Implementations should make the row
    /// visible in one step; the default falls back to per-pixel writes.
    fn write_row(&self, y: u32, colors: &[u32]) {
        for (x, &color) in colors.iter().enumerate() {
            self.set_pixel(x as u32, y, color);
        }
    }

    fn repaint_region(&self, _x: u32, _y: u32, _width: u32, _height: u32) {}

    fn snapshot(&self) -> Array2<u32>;

    fn clear(&self);

    /// Reallocates the grid as `size`x`size` black pixels.
    fn resize(&self, size: u32);
}

/// In-memory sink guarded by a single lock, held only while a row is copied.
#[derive(Debug)]
pub struct ImageDisplay {
    pixels: Mutex<Array2<u32>>,
    repaints: AtomicUsize,
}

impl ImageDisplay {
    pub fn new(size: u32) -> Self {
        Self {
            pixels: Mutex::new(Array2::zeros((size as usize, size as usize))),
            repaints: AtomicUsize::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Array2<u32>> {
        // A poisoned grid is still a grid of valid colours.
        self.pixels.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        self.lock()[[y as usize, x as usize]]
    }

    /// Number of repaint requests received so far.
    pub fn repaints(&self) -> usize {
        self.repaints.load(Ordering::SeqCst)
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        to_image(&self.lock())
    }
}

impl PixelSink for ImageDisplay {
    fn size(&self) -> u32 {
        self.lock().nrows() as u32
    }

    /// Writes outside the grid, left over from before a resize, are dropped.
    fn set_pixel(&self, x: u32, y: u32, color: u32) {
        if let Some(pixel) = self.lock().get_mut([y as usize, x as usize]) {
            *pixel = color;
        }
    }

    fn write_row(&self, y: u32, colors: &[u32]) {
        let mut pixels = self.lock();
        if y as usize >= pixels.nrows() {
            log::debug!("dropping row {} outside a {}-row grid", y, pixels.nrows());
            return;
        }
        let mut row = pixels.row_mut(y as usize);
        for (dst, &src) in row.iter_mut().zip(colors) {
            *dst = src;
        }
    }

    fn repaint_region(&self, x: u32, y: u32, width: u32, height: u32) {
        log::trace!("repaint {}x{} at ({}, {})", width, height, x, y);
        self.repaints.fetch_add(1, Ordering::SeqCst);
    }

    fn snapshot(&self) -> Array2<u32> {
        self.lock().clone()
    }

    fn clear(&self) {
        self.lock().fill(0);
    }

    fn resize(&self, size: u32) {
        *self.lock() = Array2::zeros((size as usize, size as usize));
    }
}
