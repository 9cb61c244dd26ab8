// Scoped sessions
//
// A `ScopedSession` guarantees that a login does not outlive the scope
// that made it: `close()` logs out explicitly, and dropping the guard
// while still authenticated schedules the logout on the tokio runtime.

use std::ops::{Deref, DerefMut};

use tracing::{debug, warn};

use crate::error::Error;
use crate::session::Session;

impl Session {
    /// Enter a scope bound to this session's base URL.
    ///
    /// Fails with [`Error::Uninitialized`] if no base URL was configured.
    pub fn enter(self) -> Result<ScopedSession, Error> {
        if !self.is_initialized() {
            return Err(Error::Uninitialized);
        }
        Ok(ScopedSession {
            session: Some(self),
        })
    }
}

/// A [`Session`] that logs out when its scope ends.
///
/// Derefs to `Session`, so every dispatcher and paging method is
/// available on the guard.
#[derive(Debug)]
pub struct ScopedSession {
    session: Option<Session>,
}

impl ScopedSession {
    /// Leave the scope, logging out if still authenticated.
    pub async fn close(mut self) -> Result<Session, Error> {
        let mut session = self.take();
        if session.is_authenticated() {
            session.logout().await?;
        }
        Ok(session)
    }

    fn take(&mut self) -> Session {
        match self.session.take() {
            Some(session) => session,
            None => unreachable!("scoped session used after close"),
        }
    }
}

impl Deref for ScopedSession {
    type Target = Session;

    fn deref(&self) -> &Session {
        match &self.session {
            Some(session) => session,
            None => unreachable!("scoped session used after close"),
        }
    }
}

impl DerefMut for ScopedSession {
    fn deref_mut(&mut self) -> &mut Session {
        match &mut self.session {
            Some(session) => session,
            None => unreachable!("scoped session used after close"),
        }
    }
}

impl Drop for ScopedSession {
    fn drop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        if !session.is_authenticated() {
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!("scope ended while logged in, scheduling logout");
                handle.spawn(async move {
                    if let Err(e) = session.logout().await {
                        warn!(error = %e, "logout on scope exit failed");
                    }
                });
            }
            Err(_) => {
                warn!("scope ended outside a tokio runtime, session left logged in");
            }
        }
    }
}
