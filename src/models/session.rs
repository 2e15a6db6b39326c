use super::user::{UserId, UserIdentity};

/// Authentication state observed by the UI.
///
/// A fresh session has no user and `loading = true` until the identity
/// provider reports its initial state.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: Option<UserIdentity>,
    pub loading: bool,
    /// Bumped whenever the auth listener is replaced or detached.
    pub(crate) listener_epoch: u64,
}

/// Where the session state machine currently sits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    /// Provider has not reported yet, or a sign-in is in flight.
    Unknown,
    Authenticated(UserId),
    Anonymous,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            user: None,
            loading: true,
            listener_epoch: 0,
        }
    }
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        self.user == other.user && self.loading == other.loading
    }
}

impl Session {
    pub fn user_id(&self) -> Option<&UserId> {
        self.user.as_ref().map(|user| &user.uid)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn phase(&self) -> SessionPhase {
        match (&self.user, self.loading) {
            (Some(user), _) => SessionPhase::Authenticated(user.uid.clone()),
            (None, true) => SessionPhase::Unknown,
            (None, false) => SessionPhase::Anonymous,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_session_is_unknown() {
        let session = Session::default();
        assert!(session.loading);
        assert!(session.user.is_none());
        assert_eq!(session.phase(), SessionPhase::Unknown);
    }

    #[test]
    fn test_phase_transitions() {
        let mut session = Session::default();
        session.loading = false;
        assert_eq!(session.phase(), SessionPhase::Anonymous);

        session.user = Some(UserIdentity::new("u-1"));
        assert_eq!(
            session.phase(),
            SessionPhase::Authenticated(UserId::from("u-1"))
        );
        assert_eq!(session.user_id().map(UserId::as_str), Some("u-1"));

        session.loading = true;
        assert!(matches!(session.phase(), SessionPhase::Authenticated(_)));
    }

    #[test]
    fn test_equality_ignores_listener_epoch() {
        let a = Session::default();
        let mut b = Session::default();
        b.listener_epoch = 7;
        assert_eq!(a, b);
    }
}
