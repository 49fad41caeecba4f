use super::task::Task;
use super::worker::Worker;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::telemetry::Metrics;
use crossbeam_deque::Injector;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

#[cfg(target_os = "linux")]
fn pin_thread_to_core(core_id: usize) {
    unsafe {
        let mut cpuset: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_SET(core_id, &mut cpuset);
        let result = libc::sched_setaffinity(
            0, // current thread
            std::mem::size_of::<libc::cpu_set_t>(),
            &cpuset,
        );
        if result != 0 {
            tracing::warn!(core_id, "failed to pin worker thread");
        }
    }
}

pub struct CpuPool {
    workers: Vec<WorkerHandle>,
    injector: Arc<Injector<Task>>,
    shutdown: Arc<AtomicBool>,
    num_threads: usize,
    pending_tasks: Arc<AtomicUsize>,
    wake_cursor: AtomicUsize,
    pub(crate) metrics: Arc<Metrics>,
}

struct WorkerHandle {
    thread: Option<JoinHandle<()>>,
    unparker: thread::Thread,
}

impl CpuPool {
    pub fn new(config: &Config) -> Result<Self> {
        let num_threads = config.worker_threads();
        if num_threads == 0 {
            return Err(Error::config("need at least 1 thread"));
        }

        let injector = Arc::new(Injector::new());
        let shutdown = Arc::new(AtomicBool::new(false));
        let pending_tasks = Arc::new(AtomicUsize::new(0));
        let metrics = Arc::new(Metrics::new());

        let mut workers = Vec::with_capacity(num_threads);
        let mut stealers = Vec::with_capacity(num_threads);

        for id in 0..num_threads {
            let worker = Worker::new(id, metrics.clone());
            stealers.push(worker.local_queue.stealer());
            workers.push(worker);
        }

        let mut handles = Vec::with_capacity(num_threads);

        for worker in workers {
            let id = worker.id;
            let stealers_clone = stealers.clone();
            let injector_clone = injector.clone();
            let shutdown_clone = shutdown.clone();
            let pending_clone = pending_tasks.clone();
            let name = format!("{}-{}", config.thread_name_prefix, id);

            let mut builder = thread::Builder::new().name(name);

            if let Some(stack_size) = config.stack_size {
                builder = builder.stack_size(stack_size);
            }

            let pin_workers = config.pin_workers;
            let thread = builder
                .spawn(move || {
                    #[cfg(target_os = "linux")]
                    if pin_workers {
                        pin_thread_to_core(id);
                    }
                    #[cfg(not(target_os = "linux"))]
                    let _ = pin_workers;

                    worker.run(stealers_clone, injector_clone, shutdown_clone, pending_clone);
                })
                .map_err(|e| Error::executor(format!("spawn failed: {}", e)))?;

            let unparker = thread.thread().clone();

            handles.push(WorkerHandle {
                thread: Some(thread),
                unparker,
            });
        }

        tracing::debug!(num_threads, "worker pool started");

        Ok(Self {
            workers: handles,
            injector,
            shutdown,
            num_threads,
            pending_tasks,
            wake_cursor: AtomicUsize::new(0),
            metrics,
        })
    }

    pub(crate) fn submit(&self, task: Task) {
        self.pending_tasks.fetch_add(1, Ordering::Relaxed);
        self.injector.push(task);

        // Wake one worker round-robin; parked workers also self-wake on a
        // short timeout, so a missed wakeup only adds latency.
        let cursor = self.wake_cursor.fetch_add(1, Ordering::Relaxed);
        if let Some(worker) = self.workers.get(cursor % self.num_threads) {
            worker.unparker.unpark();
        }
    }

    pub fn execute<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit(Task::new(f));
    }

    pub fn pending_tasks(&self) -> usize {
        self.pending_tasks.load(Ordering::Relaxed)
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    pub fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::Release);

        // wake everyone up to check shutdown flag
        for worker in &self.workers {
            worker.unparker.unpark();
        }

        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                let _ = thread.join();
            }
        }
    }
}

impl Drop for CpuPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
