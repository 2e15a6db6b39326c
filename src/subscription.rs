//! Scoped resources shared by the session and collection layers.
//!
//! [`SubscriptionHandle`] owns one live listener: the source-side
//! registration plus the task pumping its events into local state. Dropping
//! the handle releases both. [`LoadingGuard`] raises a `loading` flag for the
//! lifetime of an operation and lowers it on every exit path.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::models::{CollectionView, Session};
use crate::traits::ListenerRegistration;

/// An active listener connection.
#[derive(Debug)]
pub struct SubscriptionHandle {
    label: &'static str,
    registration: ListenerRegistration,
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    pub(crate) fn new(
        label: &'static str,
        registration: ListenerRegistration,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            label,
            registration,
            task,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// False once the source closed the listener or reported an error.
    pub fn is_active(&self) -> bool {
        self.registration.is_attached() && !self.task.is_finished()
    }

    pub fn release(self) {}
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.registration.cancel();
        self.task.abort();
        debug!(listener = self.label, "Listener released");
    }
}

/// State carrying a `loading` indicator.
pub(crate) trait LoadingFlag {
    fn set_loading(&mut self, loading: bool);
}

impl LoadingFlag for Session {
    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }
}

impl LoadingFlag for CollectionView {
    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }
}

/// Holds `loading = true` until dropped.
///
/// Dropping happens on success, on error, and when the owning future is
/// cancelled mid-flight.
pub(crate) struct LoadingGuard<'a, T: LoadingFlag> {
    state: &'a watch::Sender<T>,
}

impl<'a, T: LoadingFlag> LoadingGuard<'a, T> {
    pub(crate) fn raise(state: &'a watch::Sender<T>) -> Self {
        state.send_modify(|s| s.set_loading(true));
        Self { state }
    }
}

impl<T: LoadingFlag> Drop for LoadingGuard<'_, T> {
    fn drop(&mut self) {
        self.state.send_modify(|s| s.set_loading(false));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_loading_guard_raises_and_lowers() {
        let (tx, rx) = watch::channel(CollectionView::default());
        {
            let _guard = LoadingGuard::raise(&tx);
            assert!(rx.borrow().loading);
        }
        assert!(!rx.borrow().loading);
    }

    #[tokio::test]
    async fn test_loading_guard_released_on_cancelled_future() {
        let (tx, rx) = watch::channel(CollectionView::default());
        let tx = Arc::new(tx);

        let state = tx.clone();
        let task = tokio::spawn(async move {
            let _guard = LoadingGuard::raise(&state);
            std::future::pending::<()>().await;
        });
        let mut observer = rx.clone();
        observer.wait_for(|view| view.loading).await.unwrap();

        task.abort();
        let _ = task.await;
        assert!(!rx.borrow().loading);
    }

    #[tokio::test]
    async fn test_handle_drop_detaches_and_aborts() {
        let detached = Arc::new(AtomicBool::new(false));
        let flag = detached.clone();
        let registration = ListenerRegistration::new(move || flag.store(true, Ordering::SeqCst));
        let task = tokio::spawn(std::future::pending::<()>());

        let handle = SubscriptionHandle::new("test", registration, task);
        assert!(handle.is_active());
        assert_eq!(handle.label(), "test");

        handle.release();
        assert!(detached.load(Ordering::SeqCst));
    }
}
