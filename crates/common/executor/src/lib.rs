use std::{future::Future, io};

use tokio::{
    runtime::{Builder, Runtime},
    sync::broadcast,
    task::{JoinError, JoinHandle},
};

pub struct TallyExecutor {
    runtime: Runtime,
    shutdown: broadcast::Sender<()>,
}

impl TallyExecutor {
    /// Creates a multi-threaded executor. ``workers`` bounds both the async workers and the
    /// blocking pool; `None` keeps the tokio defaults.
    pub fn new(workers: Option<usize>) -> io::Result<Self> {
        let mut builder = Builder::new_multi_thread();
        builder.enable_all().thread_name("tally-worker");
        if let Some(workers) = workers {
            builder.worker_threads(workers).max_blocking_threads(workers);
        }
        Ok(Self::with_runtime(builder.build()?))
    }

    /// Creates a new executor with an existing runtime
    pub fn with_runtime(runtime: Runtime) -> Self {
        let (shutdown, _) = broadcast::channel(1);
        Self { runtime, shutdown }
    }

    /// Spawns a blocking task in a dedicated thread pool
    pub fn spawn_blocking<F, R>(&self, task: F) -> JoinHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.runtime.spawn_blocking(task)
    }

    /// Runs ``tasks`` on the blocking pool and waits for all of them. Results keep the order the
    /// tasks were submitted in.
    ///
    /// Returns `None` when a shutdown is signalled or the process is interrupted first.
    pub fn run_blocking<F, R>(
        &self,
        tasks: impl IntoIterator<Item = F>,
    ) -> Option<Vec<Result<R, JoinError>>>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let handles: Vec<_> = tasks
            .into_iter()
            .map(|task| self.spawn_blocking(task))
            .collect();
        let mut shutdown = self.shutdown.subscribe();

        self.runtime.block_on(async move {
            tokio::select! {
                results = futures::future::join_all(handles) => Some(results),
                _ = shutdown.recv() => None,
                _ = tokio::signal::ctrl_c() => None,
            }
        })
    }

    /// Runs ``future`` to completion on the runtime
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Handle that triggers a shutdown when sent to, usable from inside tasks
    pub fn shutdown_signal(&self) -> broadcast::Sender<()> {
        self.shutdown.clone()
    }

    /// Triggers a shutdown signal to every pending [`TallyExecutor::run_blocking`] call
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(());
    }

    /// Get a reference to the underlying runtime
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }
}

#[cfg(test)]
mod tests {
    use std::{thread::sleep, time::Duration};

    use super::*;

    #[test]
    fn test_blocking_task() {
        let executor = TallyExecutor::new(Some(2)).unwrap();

        let handle = executor.spawn_blocking(|| {
            sleep(Duration::from_millis(100));
            42
        });

        assert_eq!(executor.block_on(handle).unwrap(), 42);
    }

    #[test]
    fn test_run_blocking_keeps_submission_order() {
        let executor = TallyExecutor::new(None).unwrap();

        let tasks = (0..3u64).map(|i| {
            move || {
                sleep(Duration::from_millis(50 * (3 - i)));
                i
            }
        });

        let results = executor.run_blocking(tasks).unwrap();
        let results: Vec<_> = results.into_iter().map(Result::unwrap).collect();
        assert_eq!(results, vec![0, 1, 2]);
    }

    #[test]
    fn test_run_blocking_stops_on_shutdown() {
        let executor = TallyExecutor::new(Some(2)).unwrap();
        let shutdown = executor.shutdown_signal();

        let tasks: Vec<Box<dyn FnOnce() -> u64 + Send>> = vec![
            Box::new(move || {
                sleep(Duration::from_millis(50));
                let _ = shutdown.send(());
                0
            }),
            Box::new(|| {
                sleep(Duration::from_millis(500));
                1
            }),
        ];

        assert!(executor.run_blocking(tasks).is_none());
    }

    #[test]
    fn test_task_panic_is_reported() {
        let executor = TallyExecutor::new(Some(1)).unwrap();

        let results = executor
            .run_blocking([|| -> u64 { panic!("chunk failed") }])
            .unwrap();

        assert!(results[0].as_ref().unwrap_err().is_panic());
    }
}
