/// Failure reported by the identity service or the document store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// The service answered and refused the request; carries its message.
    #[error("{0}")]
    Rejected(String),

    #[error("network error: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("not signed in")]
    NotSignedIn,
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ServiceError::Decode(err.to_string())
        } else {
            ServiceError::Transport(err.to_string())
        }
    }
}

/// Outcome of a session action, worded for the notice shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("enter an email address and a password")]
    MissingCredentials,

    #[error("sign-up failed: {0}")]
    SignUp(#[source] ServiceError),

    #[error("sign-in failed: {0}")]
    SignIn(#[source] ServiceError),

    #[error("sign-out failed: {0}")]
    SignOut(#[source] ServiceError),
}
