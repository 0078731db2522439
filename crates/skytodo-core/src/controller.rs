use tracing::{
  debug,
  info,
  warn
};

use crate::session::{
  SessionState,
  UserId
};
use crate::store::PendingWrite;
use crate::task::{
  Deadline,
  Task,
  TaskDocument,
  TaskDraft,
  TaskId
};
use crate::view::{
  self,
  FilterMode,
  SortMode
};

#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Eq,
)]
pub enum Phase {
  #[default]
  SignedOut,
  /// Waiting for the user's document.
  Loading(UserId),
  Ready(UserId)
}

/// What the caller has to do after a session notification.
#[derive(
  Debug, Clone, PartialEq, Eq,
)]
pub enum SessionReaction {
  /// Fetch this user's document and hand it to
  /// [`TaskListController::finish_load`].
  Load(UserId),
  Cleared,
  Unchanged
}

/// In-memory task list of the signed-in user.
///
/// Mutations apply synchronously and return the [`PendingWrite`] that has to
/// be sent to the document store, or `None` when nothing changed.
#[derive(Debug, Clone, Default)]
pub struct TaskListController {
  phase:   Phase,
  tasks:   Vec<Task>,
  editing: Option<TaskId>,
  next_id: u64
}

impl TaskListController {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn phase(&self) -> &Phase {
    &self.phase
  }

  pub fn owner(&self) -> Option<&UserId> {
    match &self.phase {
      | Phase::SignedOut => None,
      | Phase::Loading(key)
      | Phase::Ready(key) => Some(key)
    }
  }

  pub fn is_ready(&self) -> bool {
    matches!(
      self.phase,
      Phase::Ready(_)
    )
  }

  pub fn tasks(&self) -> &[Task] {
    &self.tasks
  }

  pub fn get(
    &self,
    id: TaskId
  ) -> Option<&Task> {
    self
      .tasks
      .iter()
      .find(|task| task.id == id)
  }

  pub fn editing(&self) -> Option<TaskId> {
    self.editing
  }

  /// Reacts to session transitions. A repeated notification for the
  /// current owner is ignored.
  #[tracing::instrument(skip_all)]
  pub fn on_session(
    &mut self,
    state: &SessionState
  ) -> SessionReaction {
    match (state, &self.phase) {
      | (
        SessionState::SignedOut,
        Phase::SignedOut
      ) => SessionReaction::Unchanged,
      | (SessionState::SignedOut, _) => {
        info!(
          tasks = self.tasks.len(),
          "clearing task list after \
           sign-out"
        );
        self.reset(Phase::SignedOut);
        SessionReaction::Cleared
      }
      | (
        SessionState::SignedIn(user),
        Phase::Loading(key)
        | Phase::Ready(key)
      ) if *key == user.uid => {
        debug!(uid = %key, "duplicate sign-in notification");
        SessionReaction::Unchanged
      }
      | (
        SessionState::SignedIn(user),
        _
      ) => {
        info!(uid = %user.uid, "loading task list");
        self.reset(Phase::Loading(
          user.uid.clone()
        ));
        SessionReaction::Load(
          user.uid.clone()
        )
      }
    }
  }

  /// Installs a fetched document. Returns `false` and changes nothing when
  /// `key` is not the user currently being loaded.
  #[tracing::instrument(skip(
    self, document
  ))]
  pub fn finish_load(
    &mut self,
    key: &UserId,
    document: Option<TaskDocument>
  ) -> bool {
    if self.phase
      != Phase::Loading(key.clone())
    {
      warn!(
        phase = ?self.phase,
        "discarding stale load result"
      );
      return false;
    }

    let stored = document
      .map(|doc| doc.data)
      .unwrap_or_default();
    let mut tasks =
      Vec::with_capacity(stored.len());
    for task in stored {
      tasks.push(Task {
        id: self.allocate_id(),
        ..task
      });
    }
    self.tasks = tasks;
    self.editing = None;
    self.phase =
      Phase::Ready(key.clone());
    info!(
      tasks = self.tasks.len(),
      "task list loaded"
    );
    true
  }

  /// The user whose load is still outstanding, for a retry after a failed
  /// read.
  pub fn pending_load(
    &self
  ) -> Option<&UserId> {
    match &self.phase {
      | Phase::Loading(key) => Some(key),
      | _ => None
    }
  }

  /// Whether a load result or failure for `key` still belongs to the
  /// current session.
  pub fn awaits_load(
    &self,
    key: &UserId
  ) -> bool {
    self.pending_load() == Some(key)
  }

  #[tracing::instrument(skip(self))]
  pub fn add(
    &mut self,
    draft: &TaskDraft
  ) -> Option<PendingWrite> {
    if !self.is_ready() {
      debug!("add ignored: list not loaded");
      return None;
    }
    let Some(text) =
      draft.normalized_text()
    else {
      debug!("add ignored: empty text");
      return None;
    };

    let id = self.allocate_id();
    self.tasks.push(Task::new(
      id,
      text,
      Deadline::parse(&draft.deadline),
      draft.priority.clone()
    ));
    debug!(%id, "task added");
    self.persist()
  }

  #[tracing::instrument(skip(self))]
  pub fn toggle_done(
    &mut self,
    id: TaskId
  ) -> Option<PendingWrite> {
    let task = self.task_mut(id)?;
    task.done = !task.done;
    debug!(done = task.done, "task toggled");
    self.persist()
  }

  /// Marks `id` as being edited and returns the values to pre-fill the
  /// edit form with. Retargets any edit already in progress.
  #[tracing::instrument(skip(self))]
  pub fn begin_edit(
    &mut self,
    id: TaskId
  ) -> Option<TaskDraft> {
    if !self.is_ready() {
      return None;
    }
    let draft =
      TaskDraft::from_task(self.get(id)?);
    if let Some(previous) = self.editing
      && previous != id
    {
      debug!(%previous, "retargeting edit");
    }
    self.editing = Some(id);
    Some(draft)
  }

  /// Applies the edit form to the task being edited. Blank text leaves the
  /// edit open and changes nothing.
  #[tracing::instrument(skip(self))]
  pub fn confirm_edit(
    &mut self,
    draft: &TaskDraft
  ) -> Option<PendingWrite> {
    let id = self.editing?;
    let Some(text) =
      draft.normalized_text()
    else {
      debug!("edit kept open: empty text");
      return None;
    };

    self.editing = None;
    let task = self.task_mut(id)?;
    task.text = text;
    task.deadline =
      Deadline::parse(&draft.deadline);
    task.priority =
      draft.priority.clone();
    debug!(%id, "task edited");
    self.persist()
  }

  pub fn cancel_edit(&mut self) {
    if let Some(id) = self.editing.take()
    {
      debug!(%id, "edit cancelled");
    }
  }

  /// Precondition: `id` names an existing task; otherwise nothing happens.
  #[tracing::instrument(skip(self))]
  pub fn delete(
    &mut self,
    id: TaskId
  ) -> Option<PendingWrite> {
    if !self.is_ready() {
      return None;
    }
    let index = self
      .tasks
      .iter()
      .position(|task| task.id == id)?;
    self.tasks.remove(index);
    if self.editing == Some(id) {
      self.editing = None;
    }
    debug!(remaining = self.tasks.len(), "task deleted");
    self.persist()
  }

  /// Rows to display. Empty until the list is loaded.
  pub fn render(
    &self,
    sort: SortMode,
    filter: FilterMode
  ) -> Vec<&Task> {
    if !self.is_ready() {
      return Vec::new();
    }
    view::project(
      &self.tasks,
      sort,
      filter
    )
  }

  pub fn document(&self) -> TaskDocument {
    TaskDocument::from_tasks(
      &self.tasks
    )
  }

  /// Write of the complete current list, when a user's list is loaded.
  pub fn persist(
    &self
  ) -> Option<PendingWrite> {
    match &self.phase {
      | Phase::Ready(key) => {
        Some(PendingWrite {
          key:      key.clone(),
          document: self.document()
        })
      }
      | _ => None
    }
  }

  fn task_mut(
    &mut self,
    id: TaskId
  ) -> Option<&mut Task> {
    if !self.is_ready() {
      return None;
    }
    self
      .tasks
      .iter_mut()
      .find(|task| task.id == id)
  }

  fn allocate_id(&mut self) -> TaskId {
    self.next_id += 1;
    TaskId::new(self.next_id)
  }

  fn reset(&mut self, phase: Phase) {
    self.phase = phase;
    self.tasks.clear();
    self.editing = None;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::session::User;
  use crate::task::Priority;

  fn user(uid: &str) -> SessionState {
    SessionState::SignedIn(User {
      uid:   UserId::new(uid),
      email: format!("{uid}@example.com")
    })
  }

  fn ready(uid: &str) -> TaskListController {
    let mut ctl = TaskListController::new();
    assert_eq!(
      ctl.on_session(&user(uid)),
      SessionReaction::Load(
        UserId::new(uid)
      )
    );
    assert!(ctl.finish_load(
      &UserId::new(uid),
      None
    ));
    ctl
  }

  fn add(
    ctl: &mut TaskListController,
    text: &str,
    deadline: &str,
    priority: Priority
  ) -> TaskId {
    ctl
      .add(&TaskDraft::new(
        text, deadline, priority
      ))
      .expect("add should persist");
    ctl.tasks().last().unwrap().id
  }

  #[test]
  fn add_defaults_deadline_and_done() {
    let mut ctl = ready("u1");
    let write = ctl
      .add(&TaskDraft::new(
        "  Buy milk ",
        "",
        Priority::Medium
      ))
      .unwrap();

    assert_eq!(
      write.key,
      UserId::new("u1")
    );
    assert_eq!(write.document.len(), 1);

    let rows = ctl.render(
      SortMode::Insertion,
      FilterMode::All
    );
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].text, "Buy milk");
    assert_eq!(
      rows[0].deadline.to_string(),
      "none"
    );
    assert_eq!(
      rows[0].priority,
      Priority::Medium
    );
    assert!(!rows[0].done);
  }

  #[test]
  fn blank_add_is_a_no_op() {
    let mut ctl = ready("u1");
    assert!(
      ctl
        .add(&TaskDraft::new(
          " \t ",
          "2024-01-01",
          Priority::High
        ))
        .is_none()
    );
    assert!(ctl.tasks().is_empty());
  }

  #[test]
  fn mutations_before_load_do_nothing() {
    let mut ctl = TaskListController::new();
    assert!(
      ctl
        .add(&TaskDraft::new(
          "x",
          "",
          Priority::Low
        ))
        .is_none()
    );

    ctl.on_session(&user("u1"));
    assert!(
      ctl
        .add(&TaskDraft::new(
          "x",
          "",
          Priority::Low
        ))
        .is_none()
    );
    assert!(ctl.persist().is_none());
  }

  #[test]
  fn toggle_twice_restores_done() {
    let mut ctl = ready("u1");
    let id = add(
      &mut ctl,
      "a",
      "",
      Priority::Low
    );

    assert!(ctl.toggle_done(id).is_some());
    assert!(ctl.get(id).unwrap().done);
    assert!(ctl.toggle_done(id).is_some());
    assert!(!ctl.get(id).unwrap().done);
  }

  #[test]
  fn toggle_from_sorted_view_hits_the_right_task()
   {
    let mut ctl = ready("u1");
    let low = add(
      &mut ctl,
      "low",
      "",
      Priority::Low
    );
    let high = add(
      &mut ctl,
      "high",
      "",
      Priority::High
    );

    let shown = ctl.render(
      SortMode::Priority,
      FilterMode::All
    );
    let first = shown[0].id;
    assert_eq!(first, high);

    ctl.toggle_done(first);
    assert!(ctl.get(high).unwrap().done);
    assert!(!ctl.get(low).unwrap().done);
    assert_eq!(
      ctl.tasks()[0].text,
      "low"
    );
  }

  #[test]
  fn delete_removes_exactly_one() {
    let mut ctl = ready("u1");
    add(&mut ctl, "same", "", Priority::Low);
    let second = add(
      &mut ctl,
      "same",
      "",
      Priority::Low
    );

    let write = ctl.delete(second).unwrap();
    assert_eq!(write.document.len(), 1);
    assert_eq!(ctl.tasks().len(), 1);
    assert!(ctl.get(second).is_none());
    assert!(ctl.delete(second).is_none());
  }

  #[test]
  fn edit_workflow_overwrites_on_confirm() {
    let mut ctl = ready("u1");
    let id = add(
      &mut ctl,
      "draft",
      "2024-03-01",
      Priority::Low
    );

    let mut form = ctl.begin_edit(id).unwrap();
    assert_eq!(form.text, "draft");
    assert_eq!(form.deadline, "2024-03-01");
    assert_eq!(ctl.editing(), Some(id));
    assert_eq!(
      ctl.get(id).unwrap().text,
      "draft"
    );

    form.text = "final".to_string();
    form.deadline = String::new();
    form.priority = Priority::High;
    assert!(ctl.confirm_edit(&form).is_some());

    let task = ctl.get(id).unwrap();
    assert_eq!(task.text, "final");
    assert!(task.deadline.is_unset());
    assert_eq!(task.priority, Priority::High);
    assert_eq!(ctl.editing(), None);
  }

  #[test]
  fn confirm_without_edit_is_a_no_op() {
    let mut ctl = ready("u1");
    add(&mut ctl, "a", "", Priority::Low);
    assert!(
      ctl
        .confirm_edit(&TaskDraft::new(
          "b",
          "",
          Priority::Low
        ))
        .is_none()
    );
    assert_eq!(ctl.tasks()[0].text, "a");
  }

  #[test]
  fn cancel_and_retarget_edit() {
    let mut ctl = ready("u1");
    let a = add(&mut ctl, "a", "", Priority::Low);
    let b = add(&mut ctl, "b", "", Priority::Low);

    ctl.begin_edit(a);
    ctl.begin_edit(b);
    assert_eq!(ctl.editing(), Some(b));

    ctl.cancel_edit();
    assert_eq!(ctl.editing(), None);
    assert_eq!(ctl.tasks()[1].text, "b");
  }

  #[test]
  fn blank_edit_keeps_editing() {
    let mut ctl = ready("u1");
    let id = add(&mut ctl, "a", "", Priority::Low);
    ctl.begin_edit(id);

    assert!(
      ctl
        .confirm_edit(&TaskDraft::new(
          "   ",
          "",
          Priority::Low
        ))
        .is_none()
    );
    assert_eq!(ctl.editing(), Some(id));
    assert_eq!(ctl.get(id).unwrap().text, "a");
  }

  #[test]
  fn deleting_edited_task_clears_marker() {
    let mut ctl = ready("u1");
    let id = add(&mut ctl, "a", "", Priority::Low);
    ctl.begin_edit(id);
    ctl.delete(id);
    assert_eq!(ctl.editing(), None);
  }

  #[test]
  fn duplicate_notifications_do_not_reload() {
    let mut ctl = ready("u1");
    add(&mut ctl, "keep me", "", Priority::Low);

    assert_eq!(
      ctl.on_session(&user("u1")),
      SessionReaction::Unchanged
    );
    assert_eq!(ctl.tasks().len(), 1);

    assert_eq!(
      ctl.on_session(
        &SessionState::SignedOut
      ),
      SessionReaction::Cleared
    );
    assert_eq!(
      ctl.on_session(
        &SessionState::SignedOut
      ),
      SessionReaction::Unchanged
    );
    assert!(ctl.tasks().is_empty());
    assert!(ctl.owner().is_none());
  }

  #[test]
  fn stale_load_is_discarded() {
    let mut ctl = TaskListController::new();
    ctl.on_session(&user("u1"));
    ctl.on_session(&SessionState::SignedOut);
    ctl.on_session(&user("u2"));

    let doc = TaskDocument::from_tasks(&[
      Task::new(
        TaskId::default(),
        "not yours".to_string(),
        Deadline::Unset,
        Priority::Low
      )
    ]);
    assert!(!ctl.finish_load(
      &UserId::new("u1"),
      Some(doc)
    ));
    assert_eq!(
      ctl.pending_load(),
      Some(&UserId::new("u2"))
    );
    assert!(ctl.tasks().is_empty());
  }

  #[test]
  fn failure_for_previous_user_is_not_awaited() {
    let mut ctl = TaskListController::new();
    ctl.on_session(&user("u1"));
    assert!(
      ctl.awaits_load(&UserId::new("u1"))
    );

    ctl.on_session(&SessionState::SignedOut);
    assert!(
      !ctl.awaits_load(&UserId::new("u1"))
    );

    ctl.on_session(&user("u2"));
    assert!(
      !ctl.awaits_load(&UserId::new("u1"))
    );
    assert!(
      ctl.awaits_load(&UserId::new("u2"))
    );

    assert!(ctl.finish_load(
      &UserId::new("u2"),
      None
    ));
    assert!(
      !ctl.awaits_load(&UserId::new("u2"))
    );
  }

  #[test]
  fn loaded_tasks_get_distinct_ids() {
    let mut ctl = TaskListController::new();
    ctl.on_session(&user("u1"));
    let doc: TaskDocument = serde_json::from_str(
      r#"{"data":[
        {"text":"a","deadline":"none","priority":"low","done":false},
        {"text":"a","deadline":"none","priority":"low","done":false}
      ]}"#
    )
    .unwrap();
    assert!(ctl.finish_load(
      &UserId::new("u1"),
      Some(doc)
    ));

    let ids: Vec<TaskId> = ctl
      .tasks()
      .iter()
      .map(|task| task.id)
      .collect();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
  }

  #[test]
  fn toggle_keeps_untouched_labels() {
    let mut ctl = TaskListController::new();
    ctl.on_session(&user("u1"));
    let doc: TaskDocument = serde_json::from_str(
      r#"{"data":[
        {"text":"old","deadline":"なし","priority":"高","done":false},
        {"text":"other","deadline":"none","priority":"urgent","done":false}
      ]}"#
    )
    .unwrap();
    assert!(ctl.finish_load(
      &UserId::new("u1"),
      Some(doc)
    ));

    let second = ctl.tasks()[1].id;
    let write =
      ctl.toggle_done(second).unwrap();
    let saved = serde_json::to_value(
      &write.document
    )
    .unwrap();
    assert_eq!(
      saved["data"][0]["priority"],
      "high"
    );
    assert_eq!(
      saved["data"][0]["deadline"],
      "なし"
    );
    assert_eq!(
      saved["data"][1]["priority"],
      "urgent"
    );
    assert_eq!(
      saved["data"][1]["done"],
      true
    );
  }
}
