use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Literal stored in place of a missing deadline.
pub const NO_DEADLINE: &str = "none";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Session-local handle for a task. Allocated by the controller, never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
    /// Stored label that is not a known level; ranks as `Low` and round-trips verbatim.
    Other(String),
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Accepts the words, their initials and the `高`/`中`/`低` labels.
    pub fn parse_lossy(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_lowercase().as_str() {
            "high" | "h" | "高" => Priority::High,
            "medium" | "m" | "中" => Priority::Medium,
            "low" | "l" | "低" | "" => Priority::Low,
            _ => Priority::Other(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Other(label) => label,
        }
    }

    /// Sort weight; higher is more urgent.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 2,
            Priority::Medium => 1,
            Priority::Low | Priority::Other(_) => 0,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Priority {
    fn from(raw: String) -> Self {
        Priority::parse_lossy(&raw)
    }
}

impl From<Priority> for String {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Deadline {
    #[default]
    Unset,
    On(NaiveDate),
    /// Stored text that is neither the sentinel nor a date; kept so it round-trips.
    Unparsed(String),
}

impl Deadline {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NO_DEADLINE) {
            return Deadline::Unset;
        }

        match NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
            Ok(date) => Deadline::On(date),
            Err(_) => Deadline::Unparsed(trimmed.to_string()),
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Deadline::On(date) => Some(*date),
            _ => None,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Deadline::Unset)
    }

    /// Value for a date input: unset becomes an empty field.
    pub fn form_value(&self) -> String {
        match self {
            Deadline::Unset => String::new(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Deadline::Unset => f.write_str(NO_DEADLINE),
            Deadline::On(date) => write!(f, "{}", date.format(DATE_FORMAT)),
            Deadline::Unparsed(raw) => f.write_str(raw),
        }
    }
}

impl From<String> for Deadline {
    fn from(raw: String) -> Self {
        Deadline::parse(&raw)
    }
}

impl From<Deadline> for String {
    fn from(deadline: Deadline) -> Self {
        deadline.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(skip)]
    pub id: TaskId,

    pub text: String,

    #[serde(default)]
    pub deadline: Deadline,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub done: bool,
}

impl Task {
    pub fn new(id: TaskId, text: String, deadline: Deadline, priority: Priority) -> Self {
        Self {
            id,
            text,
            deadline,
            priority,
            done: false,
        }
    }
}

/// Values of the add form or the edit form before they are applied to a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub text: String,
    pub deadline: String,
    pub priority: Priority,
}

impl TaskDraft {
    pub fn new(text: impl Into<String>, deadline: impl Into<String>, priority: Priority) -> Self {
        Self {
            text: text.into(),
            deadline: deadline.into(),
            priority,
        }
    }

    pub fn from_task(task: &Task) -> Self {
        Self {
            text: task.text.clone(),
            deadline: task.deadline.form_value(),
            priority: task.priority.clone(),
        }
    }

    /// Trimmed text, or `None` when nothing but whitespace was entered.
    pub fn normalized_text(&self) -> Option<String> {
        let trimmed = self.text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

impl Default for TaskDraft {
    fn default() -> Self {
        Self {
            text: String::new(),
            deadline: String::new(),
            priority: Priority::Medium,
        }
    }
}

/// The single per-user document: `{ "data": [task, ...] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDocument {
    #[serde(default)]
    pub data: Vec<Task>,
}

impl TaskDocument {
    /// Snapshot of `tasks` with session-local ids cleared.
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let data = tasks
            .iter()
            .map(|task| Task {
                id: TaskId::default(),
                ..task.clone()
            })
            .collect();
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
