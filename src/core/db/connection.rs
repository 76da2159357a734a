/// Connection Management Module
///
/// Owns the single session behind a `Database` and turns it into usable
/// cursors: stale results are drained, dropped sessions are reconnected once.

use crate::core::db::session::{Cursor, Session, SessionState};
use crate::core::{DbError, Result};
use tracing::{debug, warn};

/// Connection manager for one session
#[derive(Debug)]
pub struct ConnectionManager<S: Session> {
    session: S,
}

impl<S: Session> ConnectionManager<S> {
    /// Takes ownership of an already connected session.
    pub fn new(session: S) -> Self {
        ConnectionManager { session }
    }

    /// Current liveness, as far as can be told without a round trip.
    pub fn state(&self) -> SessionState {
        if !self.session.is_connected() {
            SessionState::Disconnected
        } else if self.session.has_unread_result() {
            SessionState::PendingResult
        } else {
            SessionState::Connected
        }
    }

    /// Returns a fresh cursor bound to a live session.
    ///
    /// Any unread result from an abandoned streaming read is drained first; a
    /// failed drain is logged and otherwise ignored. If the session no longer
    /// answers a ping, one reconnect is attempted.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Connection` if the reconnect fails, or whatever the
    /// session reports when opening the cursor.
    pub fn acquire_cursor(&mut self) -> Result<Box<dyn Cursor + '_>> {
        if self.session.has_unread_result() {
            self.drain();
        }

        if let Err(e) = self.session.ping() {
            warn!("Session ping failed, reconnecting: {}", e);
            self.session
                .reconnect()
                .map_err(|e| DbError::Connection(format!("reconnect failed: {e}")))?;
            debug!("Session reconnected");
        }

        self.session.cursor()
    }

    /// Releases the session. The manager is consumed, so this happens once.
    pub fn close(mut self) -> Result<()> {
        debug!("Closing session");
        self.session.close()
    }

    #[cfg(test)]
    pub(crate) fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    fn drain(&mut self) {
        match self.session.drain_unread_result() {
            Ok(discarded) => debug!("Drained {} unread rows from previous result", discarded),
            Err(e) => {
                let e = DbError::Drain(e.to_string());
                warn!("{}", e);
            }
        }
    }
}
