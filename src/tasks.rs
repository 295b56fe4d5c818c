use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinError;
use tokio::task::JoinSet;

/// Bounded set of handler tasks running beside the dispatch loop.
pub struct Tasks {
    set: JoinSet<()>,
    permits: Arc<Semaphore>,
}

impl Tasks {
    pub fn new(limit: usize) -> Self {
        Self {
            set: JoinSet::new(),
            permits: Arc::new(Semaphore::new(limit)),
        }
    }

    pub fn spawn<F>(&mut self, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Ok(permit) = Arc::clone(&self.permits).try_acquire_owned() else {
            tracing::warn!(running = self.set.len(), "too many running tasks, dropping one");
            return false;
        };
        self.set.spawn(async move {
            task.await;
            drop(permit);
        });
        true
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Waits for the next task to finish. Pending forever when empty.
    pub async fn join_next(&mut self) -> Result<(), JoinError> {
        match self.set.join_next().await {
            Some(res) => res,
            None => std::future::pending().await,
        }
    }

    /// Gives in-flight tasks `grace` to finish, then aborts the rest.
    pub async fn shutdown(&mut self, grace: Duration) {
        if self.set.is_empty() {
            return;
        }
        tracing::debug!(running = self.set.len(), "waiting for handler tasks");

        let drain = async {
            while let Some(res) = self.set.join_next().await {
                log_join(res);
            }
        };
        if tokio::time::timeout(grace, drain).await.is_err() {
            tracing::warn!(
                running = self.set.len(),
                "handler tasks did not finish in time, aborting"
            );
            self.set.shutdown().await;
        }
    }
}

pub(crate) fn log_join(res: Result<(), JoinError>) {
    if let Err(err) = res {
        if err.is_panic() {
            tracing::error!("handler task panicked: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn spawn_is_bounded() {
        let mut tasks = Tasks::new(2);
        let (tx, rx) = oneshot::channel::<()>();
        let rx = Arc::new(tokio::sync::Mutex::new(Some(rx)));

        for _ in 0..2 {
            let rx = rx.clone();
            assert!(tasks.spawn(async move {
                if let Some(rx) = rx.lock().await.take() {
                    let _ = rx.await;
                }
            }));
        }
        assert!(!tasks.spawn(async {}));
        assert_eq!(tasks.len(), 2);

        drop(tx);
        tasks.join_next().await.unwrap();
        tasks.join_next().await.unwrap();
        assert!(tasks.is_empty());
        assert!(tasks.spawn(async {}));
    }

    #[tokio::test]
    async fn shutdown_aborts_stuck_tasks() {
        let mut tasks = Tasks::new(4);
        tasks.spawn(std::future::pending());
        tasks.shutdown(Duration::from_millis(20)).await;
        assert!(tasks.is_empty());
    }
}
