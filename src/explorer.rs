use std::path::Path;
use std::sync::mpsc::{Receiver, RecvError};
use std::sync::Arc;

use crate::config::Config;
use crate::coord::{map_coordinate, Viewport};
use crate::error::{Error, Result};
use crate::export::save_png;
use crate::fractal::{EscapeTime, Fractal};
use crate::painter::{GreyscalePainter, HsbPainter, Palette};
use crate::pixels::PixelSink;
use crate::scheduler::{Frame, RenderEvent, RenderPass, RowScheduler};

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Resize(u32),
    /// A click at pixel `(x, y)`.
    ZoomAt(u32, u32),
    Reset,
    Select(Fractal),
}

/// State owned by the control thread: the active algorithm, its viewport and
/// the pass currently drawing them.
///
/// Every mutator starts a fresh pass and disables the UI until that pass,
/// and no older one, reports completion.
pub struct Explorer {
    config: Config,
    algorithm: Fractal,
    viewport: Viewport,
    sink: Arc<dyn PixelSink>,
    scheduler: RowScheduler,
    events: Receiver<RenderEvent>,
    pass: Arc<RenderPass>,
    enabled: bool,
}

impl Explorer {
    pub fn new(config: Config, sink: Arc<dyn PixelSink>) -> Result<Self> {
        if config.display_size == 0 {
            return Err(Error::InvalidSize(0));
        }
        if !(config.zoom_factor.is_finite() && config.zoom_factor > 0.0) {
            return Err(Error::InvalidViewport {
                width: config.zoom_factor,
                height: config.zoom_factor,
            });
        }
        if sink.size() != config.display_size {
            sink.resize(config.display_size);
        }
        let algorithm = Fractal::default();
        let viewport = algorithm.initial_viewport();
        let (mut scheduler, events) = match config.palette {
            Palette::Hsb => RowScheduler::new(config.threads, HsbPainter::new(config.brightness)),
            Palette::Greyscale => RowScheduler::new(config.threads, GreyscalePainter::default()),
        };
        let frame = Frame {
            viewport,
            size: config.display_size,
            algorithm,
        };
        let pass = scheduler.dispatch(frame, sink.clone());
        Ok(Self {
            config,
            algorithm,
            viewport,
            sink,
            scheduler,
            events,
            pass,
            enabled: false,
        })
    }

    pub fn algorithm(&self) -> Fractal {
        self.algorithm
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn display_size(&self) -> u32 {
        self.config.display_size
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pass(&self) -> &Arc<RenderPass> {
        &self.pass
    }

    /// False while the latest pass is still drawing.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn apply(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Resize(size) => self.resize(size),
            Action::ZoomAt(x, y) => self.zoom_at(x, y),
            Action::Reset => {
                self.reset();
                Ok(())
            }
            Action::Select(fractal) => {
                self.select(fractal);
                Ok(())
            }
        }
    }

    pub fn select(&mut self, algorithm: Fractal) {
        log::info!("switching to {}", algorithm);
        self.algorithm = algorithm;
        self.viewport.reset(&algorithm);
        self.redraw();
    }

    /// Unknown names are rejected and leave the current view untouched.
    pub fn select_by_name(&mut self, name: &str) -> Result<()> {
        let algorithm: Fractal = name.parse()?;
        self.select(algorithm);
        Ok(())
    }

    pub fn reset(&mut self) {
        self.viewport.reset(&self.algorithm);
        self.redraw();
    }

    /// Centres the view on the plane point under pixel `(x, y)` and zooms by
    /// the configured factor.
    pub fn zoom_at(&mut self, x: u32, y: u32) -> Result<()> {
        let size = self.config.display_size;
        let x = x.min(size - 1);
        let y = y.min(size - 1);
        let x_axis = self.viewport.x_axis();
        let y_axis = self.viewport.y_axis();
        let cx = map_coordinate(x_axis.min, x_axis.max, size, x);
        let cy = map_coordinate(y_axis.min, y_axis.max, size, y);
        self.viewport.recenter_and_zoom(cx, cy, self.config.zoom_factor)?;
        self.redraw();
        Ok(())
    }

    pub fn resize(&mut self, size: u32) -> Result<()> {
        if size == 0 {
            return Err(Error::InvalidSize(size));
        }
        self.scheduler.cancel();
        self.config.display_size = size;
        self.sink.resize(size);
        self.redraw();
        Ok(())
    }

    /// Starts a pass over the current frame, superseding any running one.
    pub fn redraw(&mut self) {
        let frame = Frame {
            viewport: self.viewport,
            size: self.config.display_size,
            algorithm: self.algorithm,
        };
        self.enabled = false;
        self.pass = self.scheduler.dispatch(frame, self.sink.clone());
    }

    fn handle(&mut self, event: RenderEvent) {
        if let RenderEvent::PassCompleted { pass } = event {
            if pass == self.pass.id() {
                self.enabled = true;
            }
        }
    }

    /// Applies all pending render events without blocking. Returns them for
    /// callers that track per-row progress.
    pub fn poll_events(&mut self) -> Vec<RenderEvent> {
        let events: Vec<RenderEvent> = self.events.try_iter().collect();
        for &event in &events {
            self.handle(event);
        }
        events
    }

    /// Blocks until the latest pass has completed and the UI is enabled.
    pub fn wait_idle(&mut self) {
        while !self.enabled {
            match self.events.recv() {
                Ok(event) => self.handle(event),
                Err(RecvError) => return,
            }
        }
    }

    pub fn snapshot(&self) -> ndarray::Array2<u32> {
        self.sink.snapshot()
    }

    pub fn export_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save_png(&self.sink.snapshot(), path)
    }
}
