use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  info,
  warn
};

use crate::error::{
  ServiceError,
  SessionError
};

/// Identifier issued by the identity service; doubles as the document key.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
)]
pub struct UserId(String);

impl UserId {
  pub fn new(
    raw: impl Into<String>
  ) -> Self {
    Self(raw.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for UserId {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(&self.0)
  }
}

#[derive(
  Debug, Clone, PartialEq, Eq,
)]
pub struct User {
  pub uid:   UserId,
  pub email: String
}

#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Eq,
)]
pub enum SessionState {
  #[default]
  SignedOut,
  SignedIn(User)
}

impl SessionState {
  pub fn user(&self) -> Option<&User> {
    match self {
      | SessionState::SignedOut => {
        None
      }
      | SessionState::SignedIn(
        user
      ) => Some(user)
    }
  }

  pub fn is_signed_in(&self) -> bool {
    self.user().is_some()
  }
}

/// Account and session operations of the external identity service.
#[async_trait(?Send)]
pub trait IdentityService {
  /// Registers an account. Does not leave the new account signed in.
  async fn create_account(
    &self,
    email: &str,
    password: &str
  ) -> Result<User, ServiceError>;

  async fn authenticate(
    &self,
    email: &str,
    password: &str
  ) -> Result<User, ServiceError>;

  async fn end_session(
    &self
  ) -> Result<(), ServiceError>;
}

type Listener = Box<dyn Fn(&SessionState)>;

/// Two-state session observer over an [`IdentityService`].
///
/// Listeners see the current state once when they subscribe and after that
/// only real transitions: setting the state it already holds is silent.
pub struct SessionManager {
  identity:  Rc<dyn IdentityService>,
  state:     RefCell<SessionState>,
  listeners: RefCell<Vec<Listener>>
}

impl SessionManager {
  pub fn new(
    identity: Rc<dyn IdentityService>
  ) -> Self {
    Self {
      identity,
      state: RefCell::new(
        SessionState::SignedOut
      ),
      listeners: RefCell::new(
        Vec::new()
      )
    }
  }

  pub fn current(&self) -> SessionState {
    self.state.borrow().clone()
  }

  pub fn subscribe<F>(
    &self,
    listener: F
  ) where
    F: Fn(&SessionState) + 'static
  {
    let snapshot = self.current();
    listener(&snapshot);
    self
      .listeners
      .borrow_mut()
      .push(Box::new(listener));
    debug!(
      listeners =
        self.listeners.borrow().len(),
      "session listener registered"
    );
  }

  #[tracing::instrument(skip(
    self, password
  ))]
  pub async fn sign_up(
    &self,
    email: &str,
    password: &str
  ) -> Result<User, SessionError> {
    match self
      .identity
      .create_account(email, password)
      .await
    {
      | Ok(user) => {
        info!(uid = %user.uid, "account created");
        Ok(user)
      }
      | Err(err) => {
        warn!(error = %err, "sign-up rejected");
        Err(SessionError::SignUp(err))
      }
    }
  }

  #[tracing::instrument(skip(
    self, password
  ))]
  pub async fn sign_in(
    &self,
    email: &str,
    password: &str
  ) -> Result<User, SessionError> {
    let email = email.trim();
    if email.is_empty()
      || password.is_empty()
    {
      debug!(
        "sign-in rejected locally: \
         missing credentials"
      );
      return Err(
        SessionError::MissingCredentials
      );
    }

    let user = self
      .identity
      .authenticate(email, password)
      .await
      .map_err(|err| {
        warn!(error = %err, "sign-in failed");
        SessionError::SignIn(err)
      })?;

    info!(uid = %user.uid, "signed in");
    self.transition(
      SessionState::SignedIn(
        user.clone()
      )
    );
    Ok(user)
  }

  #[tracing::instrument(skip(self))]
  pub async fn sign_out(
    &self
  ) -> Result<(), SessionError> {
    self
      .identity
      .end_session()
      .await
      .map_err(|err| {
        warn!(error = %err, "sign-out failed");
        SessionError::SignOut(err)
      })?;

    info!("signed out");
    self.transition(
      SessionState::SignedOut
    );
    Ok(())
  }

  fn transition(
    &self,
    next: SessionState
  ) {
    {
      let mut state =
        self.state.borrow_mut();
      if *state == next {
        debug!(
          "session state unchanged; \
           not notifying"
        );
        return;
      }
      *state = next.clone();
    }

    for listener in
      self.listeners.borrow().iter()
    {
      listener(&next);
    }
  }
}
