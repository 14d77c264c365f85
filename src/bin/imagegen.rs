use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use structopt::StructOpt;

use fractview::painter::Palette;
use fractview::{Config, Explorer, Fractal, ImageDisplay};

#[derive(Debug, StructOpt)]
#[structopt(name = "fractview-imagegen", about = "Render an escape-time fractal to a PNG file")]
struct Opt {
    /// Side of the square image in pixels
    #[structopt(short, long, default_value = "800")]
    size: u32,

    /// mandelbrot, tricorn or burning-ship
    #[structopt(short, long, default_value = "mandelbrot")]
    fractal: Fractal,

    /// Zoom click as X,Y pixel coordinates; repeat to zoom further
    #[structopt(short, long, parse(try_from_str = parse_click))]
    zoom: Vec<(u32, u32)>,

    /// hsb or greyscale
    #[structopt(short, long, default_value = "hsb")]
    palette: Palette,

    /// Worker threads, defaults to the number of CPUs
    #[structopt(short, long)]
    threads: Option<usize>,

    #[structopt(short, long, parse(from_os_str), default_value = "out.png")]
    output: PathBuf,
}

fn parse_click(s: &str) -> Result<(u32, u32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got '{}'", s))?;
    let x = x.trim().parse().map_err(|e| format!("bad x '{}': {}", x, e))?;
    let y = y.trim().parse().map_err(|e| format!("bad y '{}': {}", y, e))?;
    Ok((x, y))
}

fn run(opt: Opt) -> fractview::Result<()> {
    let mut config = Config::default()
        .with_display_size(opt.size)
        .with_palette(opt.palette);
    if let Some(threads) = opt.threads {
        config = config.with_threads(threads);
    }
    let display = Arc::new(ImageDisplay::new(opt.size));
    let mut explorer = Explorer::new(config, display)?;
    if opt.fractal != explorer.algorithm() {
        explorer.select(opt.fractal);
    }
    for (x, y) in opt.zoom {
        explorer.zoom_at(x, y)?;
    }
    explorer.wait_idle();
    log::info!("final viewport {:?}", explorer.viewport());
    explorer.export_png(&opt.output)
}

fn main() {
    env_logger::init();
    let opt = Opt::from_args();
    if let Err(e) = run(opt) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}
