use crate::painter::Palette;

/// Factor applied to both viewport sides on every zoom click.
pub const ZOOM_FACTOR: f64 = 0.8;

pub const DEFAULT_DISPLAY_SIZE: u32 = 800;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Config {
    /// Side of the square image in pixels.
    pub display_size: u32,
    pub zoom_factor: f64,
    /// Worker threads used for row jobs.
    pub threads: usize,
    /// HSB brightness of escaped points.
    pub brightness: f32,
    pub palette: Palette,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            display_size: DEFAULT_DISPLAY_SIZE,
            zoom_factor: ZOOM_FACTOR,
            threads: num_cpus::get(),
            brightness: 1.0,
            palette: Palette::Hsb,
        }
    }
}

impl Config {
    pub fn with_display_size(mut self, display_size: u32) -> Self {
        self.display_size = display_size;
        self
    }

    pub fn with_zoom_factor(mut self, zoom_factor: f64) -> Self {
        self.zoom_factor = zoom_factor;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_brightness(mut self, brightness: f32) -> Self {
        self.brightness = brightness;
        self
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.display_size, 800);
        assert_eq!(config.zoom_factor, 0.8);
        assert!(config.threads >= 1);
    }

    #[test]
    fn test_builders() {
        let config = Config::default()
            .with_display_size(64)
            .with_threads(2)
            .with_zoom_factor(0.5)
            .with_brightness(0.9)
            .with_palette(Palette::Greyscale);
        assert_eq!(
            config,
            Config {
                display_size: 64,
                zoom_factor: 0.5,
                threads: 2,
                brightness: 0.9,
                palette: Palette::Greyscale,
            }
        );
    }
}
