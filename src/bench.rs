//! Wall-clock timings for the `harness = false` benches, with pixel
//! throughput for anything that draws frames.
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use crate::{render, Config, Fractal};

pub struct Benchmark {
    name: String,
    repeats: usize,
    pixels: Option<u64>,
    f: Box<dyn Fn()>,
}

impl Benchmark {
    pub fn new<F: Fn() + 'static>(name: impl Into<String>, repeats: usize, f: F) -> Self {
        Self {
            name: name.into(),
            repeats: repeats.max(1),
            pixels: None,
            f: Box::new(f),
        }
    }

    /// Full renders of the default view through the row scheduler.
    pub fn frame(fractal: Fractal, size: u32, threads: usize, repeats: usize) -> Self {
        let config = Config::default().with_display_size(size).with_threads(threads);
        let name = format!("{} {}px t{}", fractal, size, threads);
        Self::new(name, repeats, move || {
            if let Err(e) = render(fractal, config) {
                log::error!("render failed: {}", e);
            }
        })
        .with_pixels(size as u64 * size as u64)
    }

    /// Pixels produced by one call, for the throughput column.
    pub fn with_pixels(mut self, pixels: u64) -> Self {
        self.pixels = Some(pixels);
        self
    }

    fn measure(&self) -> Sample {
        let start = Instant::now();
        for _ in 0..self.repeats {
            (self.f)();
        }
        Sample {
            name: self.name.clone(),
            repeats: self.repeats,
            pixels: self.pixels,
            total: start.elapsed(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Sample {
    pub name: String,
    pub repeats: usize,
    pub pixels: Option<u64>,
    pub total: Duration,
}

impl Sample {
    pub fn per_call(&self) -> Duration {
        self.total / self.repeats as u32
    }

    pub fn megapixels_per_sec(&self) -> Option<f64> {
        let secs = self.total.as_secs_f64();
        match self.pixels {
            Some(px) if secs > 0.0 => Some(px as f64 * self.repeats as f64 / secs / 1e6),
            _ => None,
        }
    }
}

/// Short duration with a unit chosen to keep four significant digits.
pub fn format_duration(d: Duration) -> String {
    let ns = d.as_nanos();
    if ns < 10_000 {
        format!("{}ns", ns)
    } else if ns < 10_000_000 {
        format!("{}us", ns / 1_000)
    } else if ns < 10_000_000_000 {
        format!("{}ms", ns / 1_000_000)
    } else {
        format!("{:.1}s", d.as_secs_f64())
    }
}

pub struct Report {
    name: String,
    samples: Vec<Sample>,
}

impl Report {
    /// Runs every benchmark in order, printing a dot after each.
    pub fn run(name: &str, benches: &[Benchmark]) -> io::Result<Self> {
        let mut out = io::stdout();
        write!(out, "{} ", name)?;
        let mut samples = Vec::with_capacity(benches.len());
        for bench in benches {
            samples.push(bench.measure());
            write!(out, ".")?;
            out.flush()?;
        }
        writeln!(out)?;
        Ok(Self {
            name: name.to_string(),
            samples,
        })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn show(&self) {
        println!("  {:<32} {:>9} {:>9} {:>8}", "benchmark", "total", "per call", "Mpx/s");
        for s in &self.samples {
            let throughput = match s.megapixels_per_sec() {
                Some(mpx) => format!("{:.2}", mpx),
                None => "-".to_string(),
            };
            println!(
                "  {:<32} {:>9} {:>9} {:>8}",
                s.name,
                format_duration(s.total),
                format_duration(s.per_call()),
                throughput
            );
        }
    }

    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut csv = String::from("benchmark,repeats,total_us,per_call_us,mpx_per_s\n");
        for s in &self.samples {
            let mpx = s.megapixels_per_sec().map(|v| format!("{:.3}", v)).unwrap_or_default();
            csv.push_str(&format!(
                "{},{},{},{},{}\n",
                s.name,
                s.repeats,
                s.total.as_micros(),
                s.per_call().as_micros(),
                mpx
            ));
        }
        fs::write(path, csv)
    }

    /// Prints the table and saves `benchmark_<name>.csv`.
    pub fn finish(&self) -> io::Result<()> {
        self.show();
        self.write_csv(format!("benchmark_{}.csv", self.name))
    }
}
