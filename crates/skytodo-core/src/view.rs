use std::cmp::Reverse;

use chrono::NaiveDate;

use crate::task::{
  Deadline,
  Task
};

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
)]
pub enum SortMode {
  /// Source order.
  #[default]
  Insertion,
  Deadline,
  Priority
}

impl SortMode {
  pub const ALL: [SortMode; 3] = [
    SortMode::Insertion,
    SortMode::Deadline,
    SortMode::Priority
  ];

  pub fn from_key(
    key: &str
  ) -> Self {
    match key.trim() {
      | "deadline" => {
        SortMode::Deadline
      }
      | "priority" => {
        SortMode::Priority
      }
      | _ => SortMode::Insertion
    }
  }

  pub fn as_key(
    self
  ) -> &'static str {
    match self {
      | SortMode::Insertion => "none",
      | SortMode::Deadline => {
        "deadline"
      }
      | SortMode::Priority => {
        "priority"
      }
    }
  }

  pub fn label(
    self
  ) -> &'static str {
    match self {
      | SortMode::Insertion => {
        "No sorting"
      }
      | SortMode::Deadline => {
        "Deadline (soonest first)"
      }
      | SortMode::Priority => {
        "Priority (highest first)"
      }
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
)]
pub enum FilterMode {
  #[default]
  All,
  Done,
  NotDone
}

impl FilterMode {
  pub const ALL: [FilterMode; 3] = [
    FilterMode::All,
    FilterMode::Done,
    FilterMode::NotDone
  ];

  pub fn from_key(
    key: &str
  ) -> Self {
    match key.trim() {
      | "done" => FilterMode::Done,
      | "not-done" => {
        FilterMode::NotDone
      }
      | _ => FilterMode::All
    }
  }

  pub fn as_key(
    self
  ) -> &'static str {
    match self {
      | FilterMode::All => "all",
      | FilterMode::Done => "done",
      | FilterMode::NotDone => {
        "not-done"
      }
    }
  }

  pub fn label(
    self
  ) -> &'static str {
    match self {
      | FilterMode::All => "All",
      | FilterMode::Done => "Done",
      | FilterMode::NotDone => {
        "Not done"
      }
    }
  }

  pub fn matches(
    self,
    task: &Task
  ) -> bool {
    match self {
      | FilterMode::All => true,
      | FilterMode::Done => task.done,
      | FilterMode::NotDone => {
        !task.done
      }
    }
  }
}

/// Filtered and sorted view of `tasks`. The slice itself is never reordered.
#[tracing::instrument(skip(tasks), fields(total = tasks.len()))]
pub fn project(
  tasks: &[Task],
  sort: SortMode,
  filter: FilterMode
) -> Vec<&Task> {
  let mut rows: Vec<&Task> = tasks
    .iter()
    .filter(|task| filter.matches(task))
    .collect();

  // sort_by_key is stable, so ties keep source order.
  match sort {
    | SortMode::Insertion => {}
    | SortMode::Deadline => {
      rows.sort_by_key(|task| {
        deadline_key(&task.deadline)
      });
    }
    | SortMode::Priority => {
      rows.sort_by_key(|task| {
        Reverse(task.priority.rank())
      });
    }
  }

  tracing::trace!(
    shown = rows.len(),
    "projected task view"
  );
  rows
}

/// Anything without a real date sorts as the latest possible date.
fn deadline_key(
  deadline: &Deadline
) -> NaiveDate {
  deadline
    .date()
    .unwrap_or(NaiveDate::MAX)
}
