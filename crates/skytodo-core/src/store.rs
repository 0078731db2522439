use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::ServiceError;
use crate::session::UserId;
use crate::task::TaskDocument;

/// One document per user, addressed by the user's id.
#[async_trait(?Send)]
pub trait DocumentStore {
    async fn read(&self, key: &UserId) -> Result<Option<TaskDocument>, ServiceError>;

    /// Replaces whatever is stored under `key`.
    async fn write(&self, key: &UserId, document: &TaskDocument) -> Result<(), ServiceError>;
}

/// Full-document write produced by a controller mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWrite {
    pub key: UserId,
    pub document: TaskDocument,
}

impl PendingWrite {
    #[tracing::instrument(skip(self, store), fields(key = %self.key, tasks = self.document.len()))]
    pub async fn send(self, store: &dyn DocumentStore) -> Result<(), ServiceError> {
        match store.write(&self.key, &self.document).await {
            Ok(()) => {
                debug!("persisted task document");
                Ok(())
            }
            Err(err) => {
                // Memory now differs from storage until the next successful write.
                warn!(error = %err, "persist failed");
                Err(err)
            }
        }
    }
}

#[tracing::instrument(skip(store))]
pub async fn fetch(store: &dyn DocumentStore, key: &UserId) -> Result<Option<TaskDocument>, ServiceError> {
    let document = store.read(key).await.inspect_err(|err| {
        warn!(error = %err, "load failed");
    })?;
    debug!(found = document.is_some(), tasks = document.as_ref().map_or(0, TaskDocument::len), "loaded task document");
    Ok(document)
}
