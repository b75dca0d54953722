use serde::{Deserialize, Serialize};

/// Status of the mailbox authorization session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthStatus {
    /// No client credentials have been supplied.
    Unconfigured,
    /// Credentials are present; the authorization code exchange is pending.
    Pending,
    /// The exchange succeeded; downstream collectors may run.
    Authenticated,
    /// The exchange failed; carries the provider's message.
    Error(String),
}

/// Explicit authorization session value.
///
/// The OAuth flow itself (consent redirect, token exchange, mailbox access)
/// lives outside this crate; callers drive this state machine with the two
/// lifecycle events and pass the session by reference to whoever needs the
/// gate. There is no ambient "last authenticated session".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    status: AuthStatus,
}

impl AuthSession {
    /// Fresh session with no credentials.
    pub fn new() -> Self {
        Self {
            status: AuthStatus::Unconfigured,
        }
    }

    /// Current status.
    pub fn status(&self) -> &AuthStatus {
        &self.status
    }

    /// Whether the collector gate is open.
    pub fn is_authenticated(&self) -> bool {
        self.status == AuthStatus::Authenticated
    }

    /// Event: client credentials were uploaded. Moves any state to `Pending`.
    pub fn credentials_uploaded(&mut self) {
        self.status = AuthStatus::Pending;
    }

    /// Event: the authorization code exchange completed.
    ///
    /// Ignored unless the session is `Pending`; a stray callback cannot
    /// authenticate an unconfigured session.
    pub fn authorization_code_exchanged(&mut self, result: Result<(), String>) {
        if self.status != AuthStatus::Pending {
            return;
        }
        self.status = match result {
            Ok(()) => AuthStatus::Authenticated,
            Err(message) => AuthStatus::Error(message),
        };
    }

    /// Event: credentials were revoked or replaced. Back to `Unconfigured`.
    pub fn reset(&mut self) {
        self.status = AuthStatus::Unconfigured;
    }
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}
