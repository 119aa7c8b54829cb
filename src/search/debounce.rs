//! Cancelable delayed tasks and a debouncer built on them

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Handle to a task started by [`schedule`]
#[derive(Debug)]
pub struct TaskHandle {
    join: JoinHandle<()>,
}

impl TaskHandle {
    /// Abort the task; a no-op if it already ran
    pub fn cancel(&self) {
        self.join.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

/// Run `task` after `delay` on the current runtime
pub fn schedule<F>(delay: Duration, task: F) -> TaskHandle
where
    F: Future<Output = ()> + Send + 'static,
{
    let join = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        task.await;
    });
    TaskHandle { join }
}

/// Keeps at most one pending task; each call cancels the previous one
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<TaskHandle>,
    generation: u64,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            generation: 0,
        }
    }

    /// Cancel any pending task and schedule a new one.
    ///
    /// `make` receives the generation number of the new call, which callers
    /// can use to discard results from superseded calls.
    pub fn call<M, F>(&mut self, make: M) -> u64
    where
        M: FnOnce(u64) -> F,
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.generation += 1;
        self.pending = Some(schedule(self.delay, make(self.generation)));
        self.generation
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.cancel();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test(start_paused = true)]
    async fn test_schedule_runs_after_delay() {
        let ran = Arc::new(Mutex::new(false));
        let flag = ran.clone();
        let handle = schedule(Duration::from_millis(100), async move {
            *flag.lock().unwrap() = true;
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!*ran.lock().unwrap());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(*ran.lock().unwrap());
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_run() {
        let ran = Arc::new(Mutex::new(false));
        let flag = ran.clone();
        let handle = schedule(Duration::from_millis(100), async move {
            *flag.lock().unwrap() = true;
        });

        handle.cancel();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!*ran.lock().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_calls_run_only_the_last() {
        let runs = Arc::new(Mutex::new(Vec::new()));
        let mut debouncer = Debouncer::new(Duration::from_millis(500));

        for query in ["a", "ap", "app"] {
            let runs = runs.clone();
            debouncer.call(move |_| async move {
                runs.lock().unwrap().push(query);
            });
            tokio::time::advance(Duration::from_millis(40)).await;
        }
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(*runs.lock().unwrap(), vec!["app"]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_calls_outside_window_all_run() {
        let runs = Arc::new(Mutex::new(Vec::new()));
        let mut debouncer = Debouncer::new(Duration::from_millis(100));

        for query in ["first", "second"] {
            let runs = runs.clone();
            debouncer.call(move |_| async move {
                runs.lock().unwrap().push(query);
            });
            tokio::time::sleep(Duration::from_millis(150)).await;
        }

        assert_eq!(*runs.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generation_increments() {
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        let first = debouncer.call(|_| async {});
        let second = debouncer.call(|generation| {
            assert_eq!(generation, 2);
            async {}
        });
        assert_eq!((first, second), (1, 2));
    }
}
