use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;

use crate::coord::Viewport;
use crate::fractal::EscapeTime;
use crate::painter::Painter;
use crate::pixels::PixelSink;
use crate::threads::WorkerPool;

/// How many pixels a row job computes between cancellation checks.
pub const CANCEL_CHECK_INTERVAL_PIXELS: u32 = 1024;

/// Everything a row job reads, copied at dispatch time.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Frame<A> {
    pub viewport: Viewport,
    pub size: u32,
    pub algorithm: A,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RenderEvent {
    /// Row `row` of pass `pass` has been written and repainted.
    RowCompleted { pass: u64, row: u32 },
    /// Every row job of the pass has run. A row whose job panicked is
    /// missing its `RowCompleted`.
    PassCompleted { pass: u64 },
    /// The pass was superseded; some rows were skipped.
    PassCancelled { pass: u64 },
}

/// One render of one frame.
///
/// `remaining` starts at the row count and is decremented exactly once per
/// row job, delivered or skipped, so exactly one job observes it reach zero.
#[derive(Debug)]
pub struct RenderPass {
    id: u64,
    rows: u32,
    remaining: AtomicU32,
    cancelled: AtomicBool,
    finished: Mutex<bool>,
    done: Condvar,
}

impl RenderPass {
    fn new(id: u64, rows: u32) -> Self {
        Self {
            id,
            rows,
            remaining: AtomicU32::new(rows),
            cancelled: AtomicBool::new(false),
            finished: Mutex::new(rows == 0),
            done: Condvar::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn remaining(&self) -> u32 {
        self.remaining.load(Ordering::SeqCst)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn is_finished(&self) -> bool {
        *self.finished.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Blocks until every row job of this pass has run or been skipped.
    pub fn wait(&self) {
        let mut finished = self.finished.lock().unwrap_or_else(|e| e.into_inner());
        while !*finished {
            finished = self.done.wait(finished).unwrap_or_else(|e| e.into_inner());
        }
    }

    /// True for the single call that retires the last row.
    fn retire_row(&self) -> bool {
        if self.remaining.fetch_sub(1, Ordering::SeqCst) != 1 {
            return false;
        }
        *self.finished.lock().unwrap_or_else(|e| e.into_inner()) = true;
        self.done.notify_all();
        true
    }
}

/// Colours of row `y`, or `None` if `cancelled` turned true part way.
pub fn compute_row<A, P>(
    frame: &Frame<A>,
    y: u32,
    painter: &P,
    cancelled: &AtomicBool,
) -> Option<Vec<u32>>
where
    A: EscapeTime,
    P: Painter + ?Sized,
{
    let x_axis = frame.viewport.x_axis();
    let y_coord = frame.viewport.y_axis().coord(frame.size, y);
    let mut row = Vec::with_capacity(frame.size as usize);
    for x in 0..frame.size {
        if x % CANCEL_CHECK_INTERVAL_PIXELS == 0 && cancelled.load(Ordering::Relaxed) {
            return None;
        }
        let x_coord = x_axis.coord(frame.size, x);
        row.push(painter.color(frame.algorithm.escape_iterations(x_coord, y_coord)));
    }
    Some(row)
}

/// Splits each frame into one job per row on a bounded worker pool.
///
/// Starting a pass cancels the one before it. No row of the old pass is
/// written once `cancel` or `dispatch` has returned.
pub struct RowScheduler {
    pool: WorkerPool,
    painter: Arc<dyn Painter + Send + Sync>,
    events: mpsc::Sender<RenderEvent>,
    /// Id of the only pass allowed to write into sinks, 0 for none. Rows
    /// are written while holding it.
    live: Arc<Mutex<u64>>,
    next_id: u64,
    current: Option<Arc<RenderPass>>,
}

impl RowScheduler {
    pub fn new<P>(threads: usize, painter: P) -> (Self, mpsc::Receiver<RenderEvent>)
    where
        P: Painter + Send + Sync + 'static,
    {
        let (events, rx) = mpsc::channel();
        let this = Self {
            pool: WorkerPool::new(threads),
            painter: Arc::new(painter),
            events,
            live: Arc::new(Mutex::new(0)),
            next_id: 0,
            current: None,
        };
        (this, rx)
    }

    pub fn threads(&self) -> usize {
        self.pool.size()
    }

    pub fn current(&self) -> Option<&Arc<RenderPass>> {
        self.current.as_ref()
    }

    /// Cancels the running pass, if any. Once this returns none of its rows
    /// will be written, so the sink may be resized or cleared.
    pub fn cancel(&mut self) {
        if let Some(pass) = self.current.take() {
            if !pass.is_finished() {
                log::debug!("cancelling pass {} with {} rows left", pass.id(), pass.remaining());
                pass.cancel();
            }
        }
        // Waits out a row write already in progress.
        *lock_live(&self.live) = 0;
    }

    pub fn dispatch<A>(&mut self, frame: Frame<A>, sink: Arc<dyn PixelSink>) -> Arc<RenderPass>
    where
        A: EscapeTime + Copy + Send + Sync + 'static,
    {
        self.cancel();
        self.next_id += 1;
        let pass = Arc::new(RenderPass::new(self.next_id, frame.size));
        self.current = Some(pass.clone());
        *lock_live(&self.live) = pass.id();
        log::debug!(
            "pass {}: {} rows of {} over {:?}",
            pass.id(),
            frame.size,
            frame.algorithm.name(),
            frame.viewport
        );

        if frame.size == 0 {
            let _ = self.events.send(RenderEvent::PassCompleted { pass: pass.id() });
            return pass;
        }

        for y in 0..frame.size {
            let pass = pass.clone();
            let painter = self.painter.clone();
            let sink = sink.clone();
            let events = self.events.clone();
            let live = self.live.clone();
            self.pool.execute(move || {
                let job = RowJob {
                    pass: &pass,
                    live: &live,
                    events: &events,
                };
                job.run(&frame, y, painter.as_ref(), sink.as_ref());
            });
        }
        pass
    }
}

impl Drop for RowScheduler {
    fn drop(&mut self) {
        // Queued rows of the running pass are skipped while the pool drains.
        self.cancel();
    }
}

fn lock_live(live: &Mutex<u64>) -> MutexGuard<'_, u64> {
    live.lock().unwrap_or_else(|e| e.into_inner())
}

/// One row of one pass. The row is retired when the job is dropped, so a
/// job that panics part way still counts towards its pass.
struct RowJob<'a> {
    pass: &'a RenderPass,
    live: &'a Mutex<u64>,
    events: &'a mpsc::Sender<RenderEvent>,
}

impl RowJob<'_> {
    fn run<A: EscapeTime>(
        &self,
        frame: &Frame<A>,
        y: u32,
        painter: &(dyn Painter + Send + Sync),
        sink: &dyn PixelSink,
    ) {
        let id = self.pass.id();
        let row = match compute_row(frame, y, painter, &self.pass.cancelled) {
            Some(row) => row,
            None => return,
        };
        {
            let live = lock_live(self.live);
            if *live != id {
                log::trace!("pass {}: dropping superseded row {}", id, y);
                return;
            }
            sink.write_row(y, &row);
            sink.repaint_region(0, y, frame.size, 1);
        }
        log::trace!("pass {}: row {} done", id, y);
        // A closed receiver only means nobody listens for progress any more.
        let _ = self.events.send(RenderEvent::RowCompleted { pass: id, row: y });
    }
}

impl Drop for RowJob<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            log::error!("pass {}: row job panicked", self.pass.id());
        }
        if !self.pass.retire_row() {
            return;
        }
        let pass = self.pass.id();
        let event = if self.pass.is_cancelled() {
            log::debug!("pass {} cancelled", pass);
            RenderEvent::PassCancelled { pass }
        } else {
            log::debug!("pass {} complete", pass);
            RenderEvent::PassCompleted { pass }
        };
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fractal::{Fractal, Mandelbrot};
    use crate::painter::HsbPainter;
    use crate::pixels::ImageDisplay;
    use ndarray::Array2;
    use std::sync::atomic::AtomicUsize;

    fn frame(size: u32) -> Frame<Fractal> {
        Frame {
            viewport: Fractal::Mandelbrot.initial_viewport(),
            size,
            algorithm: Fractal::Mandelbrot,
        }
    }

    fn drain(rx: &mpsc::Receiver<RenderEvent>) -> Vec<RenderEvent> {
        rx.try_iter().collect()
    }

    struct CountingSink {
        inner: ImageDisplay,
        rows: AtomicUsize,
    }

    impl PixelSink for CountingSink {
        fn size(&self) -> u32 {
            self.inner.size()
        }
        fn set_pixel(&self, x: u32, y: u32, color: u32) {
            self.inner.set_pixel(x, y, color)
        }
        fn write_row(&self, y: u32, colors: &[u32]) {
            self.rows.fetch_add(1, Ordering::SeqCst);
            self.inner.write_row(y, colors)
        }
        fn snapshot(&self) -> Array2<u32> {
            self.inner.snapshot()
        }
        fn clear(&self) {
            self.inner.clear()
        }
        fn resize(&self, size: u32) {
            self.inner.resize(size)
        }
    }

    struct Gate {
        open: Mutex<bool>,
        opened: Condvar,
    }

    impl Gate {
        const fn new() -> Self {
            Self {
                open: Mutex::new(false),
                opened: Condvar::new(),
            }
        }

        fn release(&self) {
            *self.open.lock().unwrap() = true;
            self.opened.notify_all();
        }

        fn pass(&self) {
            let mut open = self.open.lock().unwrap();
            while !*open {
                open = self.opened.wait(open).unwrap();
            }
        }
    }

    /// Mandelbrot whose every point waits for a gate to open.
    #[derive(Copy, Clone)]
    struct Held(&'static Gate);

    impl EscapeTime for Held {
        fn name(&self) -> &'static str {
            "held"
        }
        fn initial_viewport(&self) -> Viewport {
            Fractal::Mandelbrot.initial_viewport()
        }
        fn escape_iterations(&self, x: f64, y: f64) -> Option<u32> {
            self.0.pass();
            Mandelbrot.escape_iterations(x, y)
        }
    }

    /// Panics on the lower half of the plane.
    #[derive(Copy, Clone)]
    struct Faulty;

    impl EscapeTime for Faulty {
        fn name(&self) -> &'static str {
            "faulty"
        }
        fn initial_viewport(&self) -> Viewport {
            Viewport::new(-1.0, -1.0, 2.0, 2.0).unwrap()
        }
        fn escape_iterations(&self, _x: f64, y: f64) -> Option<u32> {
            if y < 0.0 {
                panic!("no orbit below the real axis");
            }
            None
        }
    }

    fn held_frame(gate: &'static Gate, size: u32) -> Frame<Held> {
        Frame {
            viewport: Fractal::Mandelbrot.initial_viewport(),
            size,
            algorithm: Held(gate),
        }
    }

    #[test]
    fn test_pass_runs_one_job_per_row() {
        let size = 24;
        let (mut scheduler, rx) = RowScheduler::new(4, HsbPainter::default());
        let sink = Arc::new(CountingSink {
            inner: ImageDisplay::new(size),
            rows: AtomicUsize::new(0),
        });
        let pass = scheduler.dispatch(frame(size), sink.clone());
        pass.wait();

        assert!(pass.is_finished());
        assert_eq!(pass.remaining(), 0);
        assert_eq!(sink.rows.load(Ordering::SeqCst), size as usize);

        let events: Vec<RenderEvent> = (0..=size).map(|_| rx.recv().unwrap()).collect();
        let rows = events
            .iter()
            .filter(|e| matches!(e, RenderEvent::RowCompleted { .. }))
            .count();
        assert_eq!(rows, size as usize);
        assert_eq!(events.last(), Some(&RenderEvent::PassCompleted { pass: pass.id() }));
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn test_output_matches_direct_computation() {
        let size = 16;
        let painter = HsbPainter::default();
        let (mut scheduler, _rx) = RowScheduler::new(3, painter);
        let display = Arc::new(ImageDisplay::new(size));
        scheduler.dispatch(frame(size), display.clone()).wait();

        let viewport = Fractal::Mandelbrot.initial_viewport();
        for y in 0..size {
            for x in 0..size {
                let p = viewport.pixel_to_plane(size, x, y);
                let expected = painter.color(Mandelbrot.escape_iterations(p.re, p.im));
                assert_eq!(display.pixel(x, y), expected, "pixel ({}, {})", x, y);
            }
        }
        assert_eq!(display.repaints(), size as usize);
    }

    #[test]
    fn test_compute_row_stops_when_cancelled() {
        let cancelled = AtomicBool::new(true);
        assert_eq!(compute_row(&frame(8), 0, &HsbPainter::default(), &cancelled), None);
        cancelled.store(false, Ordering::SeqCst);
        let row = compute_row(&frame(8), 0, &HsbPainter::default(), &cancelled).unwrap();
        assert_eq!(row.len(), 8);
    }

    #[test]
    fn test_new_pass_cancels_previous() {
        static GATE: Gate = Gate::new();
        let size = 6;
        let (mut scheduler, rx) = RowScheduler::new(1, HsbPainter::default());
        let display = Arc::new(ImageDisplay::new(size));

        let first = scheduler.dispatch(held_frame(&GATE, size), display.clone());
        let second = scheduler.dispatch(frame(size), display.clone());
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        GATE.release();
        first.wait();
        second.wait();

        let mut events = vec![];
        while !events.contains(&RenderEvent::PassCompleted { pass: second.id() }) {
            events.push(rx.recv().unwrap());
        }
        events.extend(drain(&rx));
        assert!(events.contains(&RenderEvent::PassCancelled { pass: first.id() }));
        assert!(!events.contains(&RenderEvent::PassCompleted { pass: first.id() }));
        assert!(!events
            .iter()
            .any(|e| matches!(e, RenderEvent::RowCompleted { pass, .. } if *pass == first.id())));
        let terminal = events
            .iter()
            .filter(|e| !matches!(e, RenderEvent::RowCompleted { .. }))
            .count();
        assert_eq!(terminal, 2);
        let second_rows = events
            .iter()
            .filter(|e| matches!(e, RenderEvent::RowCompleted { pass, .. } if *pass == second.id()))
            .count();
        assert_eq!(second_rows, size as usize);
    }

    #[test]
    fn test_panicking_row_still_finishes_pass() {
        let size = 4;
        let (mut scheduler, rx) = RowScheduler::new(2, HsbPainter::default());
        let display = Arc::new(ImageDisplay::new(size));
        let faulty = Frame {
            viewport: Faulty.initial_viewport(),
            size,
            algorithm: Faulty,
        };
        let pass = scheduler.dispatch(faulty, display);
        pass.wait();
        assert_eq!(pass.remaining(), 0);

        let mut events = vec![];
        while !events.contains(&RenderEvent::PassCompleted { pass: pass.id() }) {
            events.push(rx.recv().unwrap());
        }
        let mut rows: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                RenderEvent::RowCompleted { row, .. } => Some(*row),
                _ => None,
            })
            .collect();
        rows.sort_unstable();
        assert_eq!(rows, vec![2, 3]);

        // The pool is still usable afterwards.
        let next = scheduler.dispatch(frame(size), Arc::new(ImageDisplay::new(size)));
        next.wait();
        assert!(!next.is_cancelled());
    }

    #[test]
    fn test_shrinking_sink_under_cancelled_pass() {
        static GATE: Gate = Gate::new();
        let (mut scheduler, rx) = RowScheduler::new(4, HsbPainter::default());
        let display = Arc::new(ImageDisplay::new(8));

        let pass = scheduler.dispatch(held_frame(&GATE, 8), display.clone());
        scheduler.cancel();
        display.resize(4);
        GATE.release();
        pass.wait();

        assert!(pass.is_finished());
        assert_eq!(pass.remaining(), 0);
        assert_eq!(rx.recv().unwrap(), RenderEvent::PassCancelled { pass: pass.id() });
        assert!(drain(&rx).is_empty());
        assert!(display.snapshot().iter().all(|&c| c == 0));
    }

    #[test]
    fn test_late_stale_rows_leave_latest_image_alone() {
        static GATE: Gate = Gate::new();
        // Two workers stay parked on the old rows, the third draws the new pass.
        let (mut scheduler, rx) = RowScheduler::new(3, HsbPainter::default());
        let display = Arc::new(ImageDisplay::new(2));
        let old = scheduler.dispatch(held_frame(&GATE, 2), display.clone());

        scheduler.cancel();
        display.resize(6);
        let tricorn = Frame {
            viewport: Fractal::Tricorn.initial_viewport(),
            size: 6,
            algorithm: Fractal::Tricorn,
        };
        let latest = scheduler.dispatch(tricorn, display.clone());
        latest.wait();
        let finished = display.snapshot();

        GATE.release();
        old.wait();
        assert_eq!(display.snapshot(), finished);

        let painter = HsbPainter::default();
        for y in 0..6 {
            for x in 0..6 {
                let p = tricorn.viewport.pixel_to_plane(6, x, y);
                let expected = painter.color(Fractal::Tricorn.escape_iterations(p.re, p.im));
                assert_eq!(display.pixel(x, y), expected, "pixel ({}, {})", x, y);
            }
        }

        let mut events = vec![];
        while !events.contains(&RenderEvent::PassCancelled { pass: old.id() }) {
            events.push(rx.recv().unwrap());
        }
        assert!(!events
            .iter()
            .any(|e| matches!(e, RenderEvent::RowCompleted { pass, .. } if *pass == old.id())));
    }

    #[test]
    fn test_empty_frame_completes_immediately() {
        let (mut scheduler, rx) = RowScheduler::new(1, HsbPainter::default());
        let pass = scheduler.dispatch(frame(0), Arc::new(ImageDisplay::new(0)));
        assert!(pass.is_finished());
        pass.wait();
        assert_eq!(rx.recv().unwrap(), RenderEvent::PassCompleted { pass: pass.id() });
    }

    #[test]
    fn test_pass_ids_increase() {
        let (mut scheduler, _rx) = RowScheduler::new(2, HsbPainter::default());
        let display: Arc<dyn PixelSink> = Arc::new(ImageDisplay::new(4));
        let a = scheduler.dispatch(frame(4), display.clone());
        let b = scheduler.dispatch(frame(4), display);
        assert!(b.id() > a.id());
        assert_eq!(scheduler.current().map(|p| p.id()), Some(b.id()));
        b.wait();
    }
}
