//! Worker pools that run page load jobs off the control thread.

use log::debug;

use crate::error::{AppError, Result};

/// A unit of background work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs tasks somewhere other than the calling thread.
pub trait JobExecutor: Send + Sync {
    fn execute(&self, task: Task);
}

/// Bounded `rayon` thread pool used for image decoding.
pub struct RayonExecutor {
    pool: rayon::ThreadPool,
}

impl RayonExecutor {
    pub fn new(threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("page-loader-{}", i))
            .build()
            .map_err(|e| AppError::WorkerPool(e.to_string()))?;
        debug!("Started decode pool with {} threads", pool.current_num_threads());
        Ok(Self { pool })
    }
}

impl JobExecutor for RayonExecutor {
    fn execute(&self, task: Task) {
        self.pool.spawn(task);
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn rayon_executor_runs_tasks_off_thread() {
        let executor = RayonExecutor::new(1).unwrap();
        let caller = std::thread::current().id();
        let (tx, rx) = mpsc::channel();
        executor.execute(Box::new(move || {
            tx.send(std::thread::current().id()).unwrap();
        }));
        assert_ne!(rx.recv().unwrap(), caller);
    }
}
