// worker thread stuff
use super::panic_handler::panic_message;
use super::task::Task;
use crate::telemetry::Metrics;
use crate::util::Backoff;
use crossbeam_deque::{Injector, Stealer, Worker as WorkerQueue};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

pub type WorkerId = usize;

pub(crate) struct Worker {
    pub id: WorkerId,
    pub local_queue: WorkerQueue<Task>,
    pub metrics: Arc<Metrics>,
}

impl Worker {
    pub fn new(id: WorkerId, metrics: Arc<Metrics>) -> Self {
        Self {
            id,
            local_queue: WorkerQueue::new_fifo(),
            metrics,
        }
    }

    // main loop
    pub fn run(
        &self,
        stealers: Vec<Stealer<Task>>,
        injector: Arc<Injector<Task>>,
        shutdown: Arc<AtomicBool>,
        pending_tasks: Arc<AtomicUsize>,
    ) {
        let mut backoff = Backoff::new();

        loop {
            if shutdown.load(Ordering::Acquire) {
                break;
            }

            // Priority: local -> global -> steal
            if let Some(task) = self.find_task(&stealers, &injector) {
                backoff.reset();
                self.execute_task(task);
                pending_tasks.fetch_sub(1, Ordering::Relaxed);
            } else if backoff.idle() {
                thread::park_timeout(Duration::from_micros(100));
            }
        }
    }

    fn find_task(&self, stealers: &[Stealer<Task>], injector: &Injector<Task>) -> Option<Task> {
        // 1. Local queue first (best cache locality)
        if let Some(task) = self.local_queue.pop() {
            return Some(task);
        }

        // 2. Global injector queue
        loop {
            match injector.steal_batch_and_pop(&self.local_queue) {
                crossbeam_deque::Steal::Success(task) => {
                    self.metrics.record_task_stolen();
                    return Some(task);
                }
                crossbeam_deque::Steal::Empty => break,
                crossbeam_deque::Steal::Retry => continue,
            }
        }

        // 3. Steal from other workers
        self.try_steal_from_workers(stealers)
    }

    fn try_steal_from_workers(&self, stealers: &[Stealer<Task>]) -> Option<Task> {
        use rand::seq::SliceRandom;
        use rand::thread_rng;

        if stealers.is_empty() {
            return None;
        }

        let mut indices: Vec<usize> = (0..stealers.len()).collect();
        indices.shuffle(&mut thread_rng());

        for &idx in &indices {
            if idx == self.id {
                continue;
            }

            loop {
                match stealers[idx].steal_batch_and_pop(&self.local_queue) {
                    crossbeam_deque::Steal::Success(task) => {
                        self.metrics.record_task_stolen();
                        return Some(task);
                    }
                    crossbeam_deque::Steal::Empty => break,
                    crossbeam_deque::Steal::Retry => continue,
                }
            }
        }

        None
    }

    fn execute_task(&self, task: Task) {
        let tid = task.id;
        let start = Instant::now();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            task.execute();
        }));

        let duration_ns = start.elapsed().as_nanos() as u64;

        match result {
            Ok(_) => self.metrics.record_task_execution(duration_ns),
            Err(payload) => {
                tracing::error!(task = ?tid, "task panicked: {}", panic_message(payload));
                self.metrics.record_task_panic();
            }
        }
    }
}
