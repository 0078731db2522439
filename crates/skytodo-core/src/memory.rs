//! In-process identity and document services.
//!
//! Both keep everything in memory for the lifetime of the tab. They back the
//! `memory` backend and the test suite. Rejection messages follow the codes
//! the Firebase REST endpoints return, so the UI shows the same notices.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::ServiceError;
use crate::session::{IdentityService, User, UserId};
use crate::store::DocumentStore;
use crate::task::TaskDocument;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
struct Account {
    uid: UserId,
    password: String,
}

#[derive(Debug, Default)]
pub struct MemoryIdentityService {
    accounts: RefCell<HashMap<String, Account>>,
    signed_in: RefCell<Option<User>>,
    next_uid: Cell<u64>,
    calls: Cell<usize>,
}

impl MemoryIdentityService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an account directly, without counting as a service call.
    pub fn insert_account(&self, email: &str, password: &str) -> Result<User, ServiceError> {
        let email = email.trim().to_ascii_lowercase();
        if !looks_like_email(&email) {
            return Err(ServiceError::Rejected("INVALID_EMAIL".to_string()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ServiceError::Rejected(format!(
                "WEAK_PASSWORD : Password should be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let mut accounts = self.accounts.borrow_mut();
        if accounts.contains_key(&email) {
            return Err(ServiceError::Rejected("EMAIL_EXISTS".to_string()));
        }

        let next = self.next_uid.get() + 1;
        self.next_uid.set(next);
        let uid = UserId::new(format!("local-{next:04}"));
        accounts.insert(
            email.clone(),
            Account {
                uid: uid.clone(),
                password: password.to_string(),
            },
        );
        Ok(User { uid, email })
    }

    /// Number of trait calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn current_user(&self) -> Option<User> {
        self.signed_in.borrow().clone()
    }

    fn count_call(&self) {
        self.calls.set(self.calls.get() + 1);
    }
}

#[async_trait(?Send)]
impl IdentityService for MemoryIdentityService {
    async fn create_account(&self, email: &str, password: &str) -> Result<User, ServiceError> {
        self.count_call();
        let user = self.insert_account(email, password)?;
        info!(uid = %user.uid, "memory account created");
        Ok(user)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<User, ServiceError> {
        self.count_call();
        let email = email.trim().to_ascii_lowercase();
        let accounts = self.accounts.borrow();
        let user = match accounts.get(&email) {
            Some(account) if account.password == password => User {
                uid: account.uid.clone(),
                email,
            },
            _ => {
                return Err(ServiceError::Rejected(
                    "INVALID_LOGIN_CREDENTIALS".to_string(),
                ));
            }
        };

        *self.signed_in.borrow_mut() = Some(user.clone());
        Ok(user)
    }

    async fn end_session(&self) -> Result<(), ServiceError> {
        self.count_call();
        self.signed_in.borrow_mut().take();
        Ok(())
    }
}

/// Keeps each document as serialized JSON, so reads go through the same
/// serde path a remote store would.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RefCell<HashMap<UserId, String>>,
    reads: Cell<usize>,
    writes: Cell<usize>,
    offline: Cell<bool>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    /// While offline every read and write fails with a transport error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    pub fn raw(&self, key: &UserId) -> Option<String> {
        self.documents.borrow().get(key).cloned()
    }

    fn check_online(&self) -> Result<(), ServiceError> {
        if self.offline.get() {
            Err(ServiceError::Transport("document store unreachable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait(?Send)]
impl DocumentStore for MemoryDocumentStore {
    async fn read(&self, key: &UserId) -> Result<Option<TaskDocument>, ServiceError> {
        self.reads.set(self.reads.get() + 1);
        self.check_online()?;

        let Some(raw) = self.documents.borrow().get(key).cloned() else {
            debug!(%key, "no document stored");
            return Ok(None);
        };
        let document =
            serde_json::from_str(&raw).map_err(|err| ServiceError::Decode(err.to_string()))?;
        Ok(Some(document))
    }

    async fn write(&self, key: &UserId, document: &TaskDocument) -> Result<(), ServiceError> {
        self.writes.set(self.writes.get() + 1);
        self.check_online()?;

        let raw =
            serde_json::to_string(document).map_err(|err| ServiceError::Decode(err.to_string()))?;
        self.documents.borrow_mut().insert(key.clone(), raw);
        debug!(%key, tasks = document.len(), "document stored");
        Ok(())
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}
