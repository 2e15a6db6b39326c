//! Reactive source of the current user id.

use std::sync::Arc;

use tokio::sync::watch;

use crate::models::{Session, UserId};

/// Anything that can tell the collection layer who is signed in right now.
pub trait UserIdSource: Send + Sync {
    fn current_user_id(&self) -> Option<UserId>;
}

impl UserIdSource for watch::Receiver<Session> {
    fn current_user_id(&self) -> Option<UserId> {
        self.borrow().user_id().cloned()
    }
}

impl UserIdSource for watch::Receiver<Option<UserId>> {
    fn current_user_id(&self) -> Option<UserId> {
        self.borrow().clone()
    }
}

impl<T: UserIdSource + ?Sized> UserIdSource for Arc<T> {
    fn current_user_id(&self) -> Option<UserId> {
        (**self).current_user_id()
    }
}

impl UserIdSource for Option<UserId> {
    fn current_user_id(&self) -> Option<UserId> {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserIdentity;

    #[test]
    fn test_session_receiver_tracks_user() {
        let (tx, rx) = watch::channel(Session::default());
        assert_eq!(rx.current_user_id(), None);

        tx.send_modify(|session| session.user = Some(UserIdentity::new("alice")));
        assert_eq!(rx.current_user_id(), Some(UserId::from("alice")));
    }

    #[test]
    fn test_plain_user_id_receiver() {
        let (tx, rx) = watch::channel(Some(UserId::from("bob")));
        assert_eq!(rx.current_user_id(), Some(UserId::from("bob")));
        tx.send_replace(None);
        assert_eq!(rx.current_user_id(), None);
    }

    #[test]
    fn test_arc_forwarding() {
        let source: Arc<dyn UserIdSource> = Arc::new(Some(UserId::from("carol")));
        assert_eq!(source.current_user_id(), Some(UserId::from("carol")));
    }
}
