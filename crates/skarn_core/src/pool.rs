use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use tracing::debug;

/// Worker pool for CPU-bound chunk work (noise evaluation, lighting,
/// meshing). Thin wrapper so callers never touch rayon directly.
pub struct WorkerPool {
    pool: ThreadPool,
}

impl WorkerPool {
    pub fn new(num_threads: Option<usize>) -> Result<Self, ThreadPoolBuildError> {
        let mut builder = ThreadPoolBuilder::new();
        if let Some(count) = num_threads {
            builder = builder.num_threads(count);
        }

        let pool = builder.build()?;
        debug!("worker pool started with {} threads", pool.current_num_threads());
        Ok(Self { pool })
    }

    pub fn thread_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Fans `items` out across the pool and blocks until every job has
    /// finished. Jobs must not share mutable state; results travel back
    /// through whatever channel the caller closed over.
    pub fn run_batch<T, F>(&self, items: Vec<T>, job: F)
    where
        T: Send,
        F: Fn(T) + Send + Sync,
    {
        let job = &job;
        self.pool.scope(|scope| {
            for item in items {
                scope.spawn(move |_| job(item));
            }
        });
    }

    pub fn scope<'scope, OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce(&rayon::Scope<'scope>) -> R + Send,
        R: Send,
    {
        self.pool.scope(op)
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        let pool = ThreadPoolBuilder::new()
            .build()
            .expect("failed to create default rayon thread pool");
        Self { pool }
    }
}
