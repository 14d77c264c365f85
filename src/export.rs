use std::path::Path;

use ndarray::Array2;

use crate::error::Result;
use crate::painter::to_image;

/// Writes a colour grid as an image file, PNG unless the extension names
/// another lossless format `image` knows.
pub fn save_png<P: AsRef<Path>>(colors: &Array2<u32>, path: P) -> Result<()> {
    let path = path.as_ref();
    match to_image(colors).save(path) {
        Ok(()) => {
            log::info!("saved {}x{} image to {}", colors.ncols(), colors.nrows(), path.display());
            Ok(())
        }
        Err(e) => {
            log::warn!("could not save {}: {}", path.display(), e);
            Err(e.into())
        }
    }
}
