use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

type Job = Box<dyn FnOnce() + Send + 'static>;

struct Worker {
    handle: Option<thread::JoinHandle<()>>,
}

impl Worker {
    fn new(id: usize, rx: Arc<Mutex<mpsc::Receiver<Job>>>) -> Self {
        let handle = thread::spawn(move || loop {
            // Lock only for the receive so other workers can pick up jobs
            // while this one computes.
            let job = match rx.lock().unwrap_or_else(|e| e.into_inner()).recv() {
                Ok(job) => job,
                Err(_) => return,
            };
            if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                log::error!("job panicked on worker {}", id);
            }
        });
        Self {
            handle: Some(handle),
        }
    }
}

/// Fixed set of threads pulling boxed jobs off one shared queue.
///
/// Dropping the pool closes the queue; workers finish whatever is still
/// queued and are joined.
pub struct WorkerPool {
    workers: Vec<Worker>,
    tx: Option<mpsc::Sender<Job>>,
}

impl WorkerPool {
    pub fn new(n: usize) -> Self {
        let n = n.max(1);
        let (tx, rx) = mpsc::channel::<Job>();
        let rx = Arc::new(Mutex::new(rx));
        let workers = (0..n).map(|id| Worker::new(id, rx.clone())).collect();
        log::debug!("started worker pool with {} threads", n);
        Self {
            workers,
            tx: Some(tx),
        }
    }

    /// One worker per logical CPU.
    pub fn with_available_threads() -> Self {
        Self::new(num_cpus::get())
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    pub fn execute<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let sent = match self.tx {
            Some(ref tx) => tx.send(Box::new(f)).is_ok(),
            None => false,
        };
        if !sent {
            log::warn!("worker pool is shut down, job dropped");
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        drop(self.tx.take());
        for worker in &mut self.workers {
            if let Some(handle) = worker.handle.take() {
                if handle.join().is_err() {
                    log::error!("failed to join worker thread");
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    #[test]
    fn test_runs_every_job() {
        let count = Arc::new(AtomicUsize::new(0));
        {
            let pool = WorkerPool::new(4);
            for _ in 0..100 {
                let count = count.clone();
                pool.execute(move || {
                    count.fetch_add(1, Ordering::SeqCst);
                });
            }
        }
        assert_eq!(count.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn test_zero_threads_means_one() {
        assert_eq!(WorkerPool::new(0).size(), 1);
        assert!(WorkerPool::with_available_threads().size() >= 1);
    }

    #[test]
    fn test_jobs_run_concurrently() {
        // Deadlocks unless all three jobs are in flight at once.
        let pool = WorkerPool::new(3);
        let barrier = Arc::new(Barrier::new(4));
        for _ in 0..3 {
            let barrier = barrier.clone();
            pool.execute(move || {
                barrier.wait();
            });
        }
        barrier.wait();
    }

    #[test]
    fn test_survives_panicking_job() {
        let count = Arc::new(AtomicUsize::new(0));
        {
            let pool = WorkerPool::new(1);
            pool.execute(|| panic!("boom"));
            let count = count.clone();
            pool.execute(move || {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
