use crate::config::Config;
use crate::error::{Error, Result};
use crate::executor::CpuPool;
use crate::telemetry::MetricsSnapshot;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::thread::ThreadId;

pub struct Runtime {
    pub(crate) pool: Arc<CpuPool>,
    config: Config,
}

impl Runtime {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let pool = CpuPool::new(&config)?;

        Ok(Self {
            pool: Arc::new(pool),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.pool.metrics.snapshot()
    }
}

// Global runtime for simple API
static GLOBAL_RUNTIME: RwLock<Option<Arc<Runtime>>> = RwLock::new(None);

// Thread-local runtime for isolated tests
thread_local! {
    static THREAD_RUNTIME: std::cell::RefCell<Option<Arc<Runtime>>> =
        const { std::cell::RefCell::new(None) };
}

// Track which threads have thread-local runtimes
static THREAD_RUNTIME_MAP: OnceLock<Mutex<HashMap<ThreadId, bool>>> = OnceLock::new();

fn get_thread_runtime_map() -> &'static Mutex<HashMap<ThreadId, bool>> {
    THREAD_RUNTIME_MAP.get_or_init(|| Mutex::new(HashMap::new()))
}

fn thread_has_local_runtime() -> bool {
    let thread_id = std::thread::current().id();
    get_thread_runtime_map()
        .lock()
        .get(&thread_id)
        .copied()
        .unwrap_or(false)
}

pub fn init() -> Result<()> {
    init_with_config(Config::default())
}

pub fn init_with_config(config: Config) -> Result<()> {
    if thread_has_local_runtime() {
        let has_existing = THREAD_RUNTIME.with(|rt| rt.borrow().is_some());
        if has_existing {
            return Err(Error::AlreadyInitialized);
        }

        let rt = Runtime::new(config)?;
        THREAD_RUNTIME.with(|rt_cell| {
            *rt_cell.borrow_mut() = Some(Arc::new(rt));
        });

        Ok(())
    } else {
        let mut runtime = GLOBAL_RUNTIME.write();

        if runtime.is_some() {
            return Err(Error::AlreadyInitialized);
        }

        let rt = Runtime::new(config)?;
        *runtime = Some(Arc::new(rt));

        tracing::debug!("runtime initialized");
        Ok(())
    }
}

/// Initialize runtime in thread-local mode (for tests)
pub fn init_thread_local() -> Result<()> {
    init_thread_local_with_config(Config::default())
}

/// Initialize runtime in thread-local mode with config (for tests)
pub fn init_thread_local_with_config(config: Config) -> Result<()> {
    let thread_id = std::thread::current().id();
    get_thread_runtime_map().lock().insert(thread_id, true);

    let has_existing = THREAD_RUNTIME.with(|rt| rt.borrow().is_some());
    if has_existing {
        return Err(Error::AlreadyInitialized);
    }

    let rt = Runtime::new(config)?;
    THREAD_RUNTIME.with(|rt_cell| {
        *rt_cell.borrow_mut() = Some(Arc::new(rt));
    });

    Ok(())
}

pub(crate) fn try_current() -> Result<Arc<Runtime>> {
    if thread_has_local_runtime() {
        THREAD_RUNTIME.with(|rt| rt.borrow().clone().ok_or(Error::NotInitialized))
    } else {
        GLOBAL_RUNTIME
            .read()
            .as_ref()
            .cloned()
            .ok_or(Error::NotInitialized)
    }
}

/// Snapshot of the current runtime's pool metrics.
pub fn metrics_snapshot() -> Result<MetricsSnapshot> {
    Ok(try_current()?.metrics_snapshot())
}

#[cfg(test)]
pub(crate) fn mark_thread_local_for_tests(enabled: bool) {
    let thread_id = std::thread::current().id();
    if enabled {
        get_thread_runtime_map().lock().insert(thread_id, true);
    } else {
        get_thread_runtime_map().lock().remove(&thread_id);
    }
}

pub fn shutdown() {
    if thread_has_local_runtime() {
        let thread_id = std::thread::current().id();
        THREAD_RUNTIME.with(|rt_cell| {
            *rt_cell.borrow_mut() = None;
        });
        get_thread_runtime_map().lock().remove(&thread_id);
    } else {
        let mut runtime = GLOBAL_RUNTIME.write();
        if runtime.take().is_some() {
            tracing::debug!("runtime shut down");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_init() {
        init_thread_local().unwrap();

        let result = init();
        assert!(result.is_err());

        shutdown();
    }

    #[test]
    fn test_custom_config() {
        let config = Config::builder().num_threads(2).build().unwrap();

        init_thread_local_with_config(config).unwrap();

        let rt = try_current().unwrap();
        assert_eq!(rt.pool.num_threads(), 2);

        shutdown();
    }

    #[test]
    fn test_not_initialized() {
        // mark this thread as thread-local so the global runtime (possibly
        // started by another test) is not visible here
        mark_thread_local_for_tests(true);

        assert!(matches!(try_current(), Err(Error::NotInitialized)));

        mark_thread_local_for_tests(false);
    }
}
