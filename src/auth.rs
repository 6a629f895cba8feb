use std::fmt;

use crate::matcher;
use crate::point::{Point, Tolerance};
use crate::sequence::{CommitError, SequenceStore};

/// Where the session sits in the save/login flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    NoPasswordSaved,
    AwaitingEntry,
    Authenticated,
}

/// Error returned by [`AuthSession::on_login_requested`] before any commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginError {
    NoSavedPassword,
}

impl fmt::Display for LoginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginError::NoSavedPassword => write!(f, "no password saved"),
        }
    }
}

impl std::error::Error for LoginError {}

/// Outcome of a single login attempt, captured before the working sequence
/// is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginAttempt {
    pub matched: bool,
    pub entered_len: usize,
    pub saved_len: usize,
    /// Largest per-axis deviation, when the sequence lengths lined up.
    pub max_deviation: Option<i32>,
}

/// Session facade the presentation layer drives with raw input events.
///
/// The presentation layer forwards clicks via [`on_point_entered`], save
/// actions via [`on_save_requested`] and login actions via
/// [`on_login_requested`], then reacts to the returned outcomes. The session
/// never renders anything and holds no UI state.
///
/// [`on_point_entered`]: AuthSession::on_point_entered
/// [`on_save_requested`]: AuthSession::on_save_requested
/// [`on_login_requested`]: AuthSession::on_login_requested
#[derive(Debug)]
pub struct AuthSession {
    store: SequenceStore,
    tolerance: Tolerance,
    phase: AuthPhase,
}

impl AuthSession {
    pub fn new(tolerance: Tolerance) -> Self {
        Self {
            store: SequenceStore::new(),
            tolerance,
            phase: AuthPhase::NoPasswordSaved,
        }
    }

    pub fn phase(&self) -> AuthPhase {
        self.phase
    }

    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    pub fn has_saved(&self) -> bool {
        self.store.has_saved()
    }

    /// Clicks recorded since the last save, login attempt, or clear.
    pub fn working_points(&self) -> &[Point] {
        self.store.working()
    }

    pub fn on_point_entered(&mut self, x: i32, y: i32) {
        self.store.append(Point::new(x, y));
    }

    /// Commit the working sequence as the new password.
    ///
    /// Succeeds from any phase and lands in [`AuthPhase::AwaitingEntry`];
    /// re-saving overwrites the previous password outright.
    pub fn on_save_requested(&mut self) -> Result<(), CommitError> {
        self.store.commit()?;
        self.phase = AuthPhase::AwaitingEntry;
        Ok(())
    }

    /// Compare the working sequence against the saved password.
    ///
    /// The working sequence is cleared whether or not the attempt matched;
    /// the saved password is never touched. A matching attempt moves the
    /// phase to [`AuthPhase::Authenticated`], a failed one stays in
    /// [`AuthPhase::AwaitingEntry`].
    pub fn on_login_requested(&mut self) -> Result<LoginAttempt, LoginError> {
        let saved = self.store.saved().ok_or(LoginError::NoSavedPassword)?;
        let entered = self.store.working();

        let attempt = LoginAttempt {
            matched: matcher::matches(saved, entered, self.tolerance),
            entered_len: entered.len(),
            saved_len: saved.len(),
            max_deviation: matcher::max_axis_deviation(saved, entered),
        };

        self.store.clear_working();
        if attempt.matched {
            self.phase = AuthPhase::Authenticated;
        }

        Ok(attempt)
    }

    /// Throw away the in-progress entry, e.g. when the user resets the canvas.
    pub fn clear_entry(&mut self) {
        self.store.clear_working();
    }

    /// Leave the authenticated state and return to entry.
    ///
    /// The saved password survives; only the phase and the working sequence
    /// are reset.
    pub fn log_out(&mut self) {
        self.store.clear_working();
        self.phase = if self.store.has_saved() {
            AuthPhase::AwaitingEntry
        } else {
            AuthPhase::NoPasswordSaved
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn enter(session: &mut AuthSession, points: &[(i32, i32)]) {
        for &(x, y) in points {
            session.on_point_entered(x, y);
        }
    }

    #[test]
    fn test_session_starts_with_no_password() {
        let session = AuthSession::new(10);

        assert_eq!(session.phase(), AuthPhase::NoPasswordSaved);
        assert!(!session.has_saved());
        assert!(session.working_points().is_empty());
    }

    #[test]
    fn test_save_requires_at_least_one_point() {
        let mut session = AuthSession::new(10);

        assert_matches!(
            session.on_save_requested(),
            Err(CommitError::EmptySequence)
        );
        assert_eq!(session.phase(), AuthPhase::NoPasswordSaved);
    }

    #[test]
    fn test_save_then_matching_login_authenticates() {
        let mut session = AuthSession::new(10);
        enter(&mut session, &[(5, 5), (50, 50), (100, 100)]);
        session.on_save_requested().unwrap();
        assert_eq!(session.phase(), AuthPhase::AwaitingEntry);
        assert!(session.working_points().is_empty());

        enter(&mut session, &[(6, 6), (49, 49), (101, 101)]);
        let attempt = session.on_login_requested().unwrap();

        assert!(attempt.matched);
        assert_eq!(attempt.entered_len, 3);
        assert_eq!(attempt.saved_len, 3);
        assert_eq!(attempt.max_deviation, Some(1));
        assert_eq!(session.phase(), AuthPhase::Authenticated);
        assert!(session.working_points().is_empty());
    }

    #[test]
    fn test_short_entry_fails_on_length() {
        let mut session = AuthSession::new(10);
        enter(&mut session, &[(5, 5), (50, 50), (100, 100)]);
        session.on_save_requested().unwrap();

        enter(&mut session, &[(6, 6), (49, 49)]);
        let attempt = session.on_login_requested().unwrap();

        assert!(!attempt.matched);
        assert_eq!(attempt.max_deviation, None);
        assert_eq!(session.phase(), AuthPhase::AwaitingEntry);
    }

    #[test]
    fn test_failed_login_clears_entry_and_keeps_password() {
        let mut session = AuthSession::new(2);
        enter(&mut session, &[(10, 10)]);
        session.on_save_requested().unwrap();

        enter(&mut session, &[(90, 90)]);
        let attempt = session.on_login_requested().unwrap();
        assert!(!attempt.matched);
        assert!(session.working_points().is_empty());

        // Password still there: an exact re-entry now succeeds.
        enter(&mut session, &[(10, 10)]);
        assert!(session.on_login_requested().unwrap().matched);
    }

    #[test]
    fn test_login_without_saved_password_is_rejected() {
        let mut session = AuthSession::new(10);
        enter(&mut session, &[(1, 1)]);

        assert_matches!(
            session.on_login_requested(),
            Err(LoginError::NoSavedPassword)
        );
        // A rejected precondition is not an attempt; the entry survives.
        assert_eq!(session.working_points().len(), 1);
    }

    #[test]
    fn test_recommit_overwrites_from_any_phase() {
        let mut session = AuthSession::new(10);
        enter(&mut session, &[(1, 1)]);
        session.on_save_requested().unwrap();
        enter(&mut session, &[(1, 1)]);
        session.on_login_requested().unwrap();
        assert_eq!(session.phase(), AuthPhase::Authenticated);

        // Re-save while authenticated: back to awaiting entry, new password.
        enter(&mut session, &[(2, 2), (3, 3)]);
        session.on_save_requested().unwrap();
        assert_eq!(session.phase(), AuthPhase::AwaitingEntry);

        enter(&mut session, &[(1, 1)]);
        assert!(!session.on_login_requested().unwrap().matched);
        enter(&mut session, &[(2, 2), (3, 3)]);
        assert!(session.on_login_requested().unwrap().matched);
    }

    #[test]
    fn test_log_out_returns_to_awaiting_entry() {
        let mut session = AuthSession::new(10);
        enter(&mut session, &[(4, 4)]);
        session.on_save_requested().unwrap();
        enter(&mut session, &[(4, 4)]);
        session.on_login_requested().unwrap();
        assert_eq!(session.phase(), AuthPhase::Authenticated);

        session.log_out();

        assert_eq!(session.phase(), AuthPhase::AwaitingEntry);
        assert!(session.has_saved());
        assert!(session.working_points().is_empty());
    }

    #[test]
    fn test_clear_entry_only_drops_working_points() {
        let mut session = AuthSession::new(10);
        enter(&mut session, &[(4, 4)]);
        session.on_save_requested().unwrap();
        enter(&mut session, &[(9, 9), (8, 8)]);

        session.clear_entry();

        assert!(session.working_points().is_empty());
        assert!(session.has_saved());
        assert_eq!(session.phase(), AuthPhase::AwaitingEntry);
    }
}
