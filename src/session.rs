use tokio::sync::watch;

use crate::{
    errors::AppError,
    models::{Account, Session},
};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Absent,
    Established(Session),
}

/// Explicit holder of the current session, handed to every service that
/// needs an identity. Subscribers see each transition.
#[derive(Debug)]
pub struct SessionContext {
    state: watch::Sender<SessionState>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::absent()
    }
}

impl SessionContext {
    pub fn absent() -> Self {
        let (state, _) = watch::channel(SessionState::Absent);
        Self { state }
    }

    pub fn established(session: Session) -> Self {
        let (state, _) = watch::channel(SessionState::Established(session));
        Self { state }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn current(&self) -> Option<Session> {
        match &*self.state.borrow() {
            SessionState::Established(session) => Some(session.clone()),
            SessionState::Absent => None,
        }
    }

    pub fn require(&self) -> Result<Session, AppError> {
        self.current()
            .ok_or_else(|| AppError::Unauthorized("You need to be signed in".into()))
    }

    pub fn establish(&self, session: Session) {
        self.state.send_replace(SessionState::Established(session));
    }

    /// Applies `update` to the account snapshot of an established session.
    /// Does nothing while absent.
    pub fn replace_account(&self, update: impl FnOnce(&mut Account)) {
        self.state.send_if_modified(|state| match state {
            SessionState::Established(session) => {
                let before = session.account.clone();
                update(&mut session.account);
                session.account != before
            }
            SessionState::Absent => false,
        });
    }

    pub fn clear(&self) {
        self.state.send_replace(SessionState::Absent);
    }
}
