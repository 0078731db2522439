use std::rc::Rc;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{FirebaseClient, decode_response, rejection};
use crate::error::ServiceError;
use crate::session::UserId;
use crate::store::DocumentStore;
use crate::task::{Deadline, Priority, Task, TaskDocument, TaskId};

/// `{collection}/{uid}` documents in Cloud Firestore.
#[derive(Debug, Clone)]
pub struct FirestoreStore {
    client: Rc<FirebaseClient>,
}

impl FirestoreStore {
    pub(crate) fn new(client: Rc<FirebaseClient>) -> Self {
        Self { client }
    }

    fn document_url(&self, key: &UserId) -> String {
        let cfg = self.client.config();
        format!(
            "{}/v1/projects/{}/databases/(default)/documents/{}/{}",
            cfg.firestore_endpoint.trim_end_matches('/'),
            cfg.project_id,
            cfg.collection,
            key
        )
    }
}

#[async_trait(?Send)]
impl DocumentStore for FirestoreStore {
    #[tracing::instrument(skip(self))]
    async fn read(&self, key: &UserId) -> Result<Option<TaskDocument>, ServiceError> {
        let token = self.client.id_token().await?;
        let response = self
            .client
            .http
            .get(self.document_url(key))
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        read_outcome(status, &body)
    }

    #[tracing::instrument(skip(self, document), fields(tasks = document.len()))]
    async fn write(&self, key: &UserId, document: &TaskDocument) -> Result<(), ServiceError> {
        let token = self.client.id_token().await?;
        let payload = serde_json::to_string(&FirestoreDocument::from_tasks(document))
            .map_err(|err| ServiceError::Decode(err.to_string()))?;

        // PATCH without an update mask replaces every field of the document.
        let response = self
            .client
            .http
            .patch(self.document_url(key))
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        write_outcome(status, &body)
    }
}

/// A missing document is a user with no tasks yet, not an error.
fn read_outcome(status: StatusCode, body: &str) -> Result<Option<TaskDocument>, ServiceError> {
    if status == StatusCode::NOT_FOUND {
        debug!("no firestore document yet");
        return Ok(None);
    }
    let document: FirestoreDocument = decode_response(status, body)?;
    Ok(Some(document.into_tasks()))
}

fn write_outcome(status: StatusCode, body: &str) -> Result<(), ServiceError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(rejection(status, body))
    }
}

// Firestore typed-value encoding of `{ data: [ {text, deadline, priority, done} ] }`.

#[derive(Debug, Default, Serialize, Deserialize)]
struct FirestoreDocument {
    #[serde(default)]
    fields: DocumentFields,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct DocumentFields {
    #[serde(default)]
    data: Option<ArrayField>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArrayField {
    #[serde(default)]
    array_value: ArrayValue,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ArrayValue {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    values: Vec<MapField>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapField {
    #[serde(default)]
    map_value: MapValue,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct MapValue {
    #[serde(default)]
    fields: TaskFields,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TaskFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<StringField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    deadline: Option<StringField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    priority: Option<StringField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    done: Option<BoolField>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StringField {
    string_value: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoolField {
    boolean_value: bool,
}

impl StringField {
    fn new(value: impl Into<String>) -> Option<Self> {
        Some(Self {
            string_value: value.into(),
        })
    }
}

impl FirestoreDocument {
    fn from_tasks(document: &TaskDocument) -> Self {
        let values = document
            .data
            .iter()
            .map(|task| MapField {
                map_value: MapValue {
                    fields: TaskFields {
                        text: StringField::new(task.text.clone()),
                        deadline: StringField::new(task.deadline.to_string()),
                        priority: StringField::new(task.priority.as_str()),
                        done: Some(BoolField {
                            boolean_value: task.done,
                        }),
                    },
                },
            })
            .collect();

        Self {
            fields: DocumentFields {
                data: Some(ArrayField {
                    array_value: ArrayValue { values },
                }),
            },
        }
    }

    fn into_tasks(self) -> TaskDocument {
        let values = self
            .fields
            .data
            .map(|field| field.array_value.values)
            .unwrap_or_default();

        let data = values
            .into_iter()
            .map(|value| {
                let fields = value.map_value.fields;
                let text = fields.text.map(|f| f.string_value).unwrap_or_default();
                let deadline = fields
                    .deadline
                    .map(|f| Deadline::parse(&f.string_value))
                    .unwrap_or_default();
                let priority = fields
                    .priority
                    .map(|f| Priority::parse_lossy(&f.string_value))
                    .unwrap_or_default();
                let mut task = Task::new(TaskId::default(), text, deadline, priority);
                task.done = fields.done.is_some_and(|f| f.boolean_value);
                task
            })
            .collect();

        TaskDocument { data }
    }
}
