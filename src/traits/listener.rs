//! Unsubscribe token returned by push-notification sources.

use std::fmt;

type DetachFn = Box<dyn FnOnce() + Send + Sync>;

/// Detaches a listener from its source exactly once.
///
/// The detach function runs on [`detach`](Self::detach), [`cancel`](Self::cancel)
/// or drop, whichever comes first. Providers hand one out with every listener
/// so callers never need to remember to unsubscribe.
pub struct ListenerRegistration {
    detach: Option<DetachFn>,
}

impl ListenerRegistration {
    pub fn new(detach: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// A registration with nothing to detach, for listeners the source
    /// already closed.
    pub fn noop() -> Self {
        Self { detach: None }
    }

    pub fn is_attached(&self) -> bool {
        self.detach.is_some()
    }

    /// Run the detach function now. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }

    pub fn detach(mut self) {
        self.cancel();
    }
}

impl Drop for ListenerRegistration {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for ListenerRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistration")
            .field("attached", &self.is_attached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting() -> (ListenerRegistration, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let registration = ListenerRegistration::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (registration, calls)
    }

    #[test]
    fn test_detach_runs_once() {
        let (mut registration, calls) = counting();
        assert!(registration.is_attached());
        registration.cancel();
        registration.cancel();
        assert!(!registration.is_attached());
        drop(registration);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_detaches() {
        let (registration, calls) = counting();
        drop(registration);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_noop() {
        let registration = ListenerRegistration::noop();
        assert!(!registration.is_attached());
        registration.detach();
    }
}
