use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Holds at most one background task. Starting another first joins the one in
/// flight, so two tasks never overlap.
pub struct WorkerSlot<T> {
    current: Mutex<Option<JoinHandle<T>>>,
    /// Spawned tasks that have not finished yet. Readable without `current`.
    live: Arc<AtomicUsize>,
}

impl<T: Send + 'static> Default for WorkerSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> WorkerSlot<T> {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Wait for the previous task (if any) to finish, then spawn `task`.
    pub async fn start<F>(&self, task: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        let mut slot = self.current.lock().await;
        if let Some(previous) = slot.take() {
            debug!("Waiting for the previous background task before starting a new one");
            join(previous).await;
        }
        let live = LiveTask::enter(&self.live);
        *slot = Some(tokio::spawn(async move {
            let _live = live;
            task.await
        }));
    }

    /// Join the task in flight, returning its output. `None` when idle.
    pub async fn wait_idle(&self) -> Option<T> {
        let mut slot = self.current.lock().await;
        match slot.take() {
            Some(handle) => join(handle).await,
            None => None,
        }
    }

    /// Does not wait, even while `start` is joining a previous task.
    pub fn is_running(&self) -> bool {
        self.live.load(Ordering::SeqCst) > 0
    }
}

/// Counts a task as live until dropped, which also happens when it panics.
struct LiveTask(Arc<AtomicUsize>);

impl LiveTask {
    fn enter(live: &Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self(live.clone())
    }
}

impl Drop for LiveTask {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn join<T>(handle: JoinHandle<T>) -> Option<T> {
    match handle.await {
        Ok(output) => Some(output),
        Err(err) => {
            error!("Background task ended abnormally: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::oneshot;

    use super::*;

    #[tokio::test]
    async fn idle_slot_has_nothing_to_join() {
        let slot: WorkerSlot<u32> = WorkerSlot::new();
        assert!(!slot.is_running());
        assert_eq!(slot.wait_idle().await, None);
    }

    #[tokio::test]
    async fn wait_idle_returns_the_task_output() {
        let slot = WorkerSlot::new();
        slot.start(async { 7 }).await;
        assert_eq!(slot.wait_idle().await, Some(7));
        assert_eq!(slot.wait_idle().await, None);
    }

    #[tokio::test]
    async fn tasks_never_overlap() {
        let slot = Arc::new(WorkerSlot::new());
        let active = Arc::new(AtomicUsize::new(0));
        let max_active = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let active = active.clone();
            let max_active = max_active.clone();
            let finished = finished.clone();
            slot.start(async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                max_active.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                finished.fetch_add(1, Ordering::SeqCst);
            })
            .await;
        }
        slot.wait_idle().await;

        assert_eq!(max_active.load(Ordering::SeqCst), 1);
        assert_eq!(finished.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn panicking_task_does_not_wedge_the_slot() {
        let slot: WorkerSlot<i32> = WorkerSlot::new();
        slot.start(async { panic!("boom") }).await;
        slot.start(async { 1 }).await;
        assert_eq!(slot.wait_idle().await, Some(1));
        assert!(!slot.is_running());
    }

    #[tokio::test]
    async fn is_running_answers_while_start_joins_the_previous_task() {
        let slot = Arc::new(WorkerSlot::new());
        let (release, gate) = oneshot::channel::<()>();
        slot.start(async move {
            let _ = gate.await;
            1
        })
        .await;

        let starter = {
            let slot = slot.clone();
            tokio::spawn(async move { slot.start(async { 2 }).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!starter.is_finished());
        assert!(slot.is_running());

        release.send(()).unwrap();
        starter.await.unwrap();
        assert_eq!(slot.wait_idle().await, Some(2));
        assert!(!slot.is_running());
    }
}
