use std::cell::RefCell;
use std::rc::Rc;

use skytodo_core::memory::{MemoryDocumentStore, MemoryIdentityService};
use skytodo_core::store::fetch;
use skytodo_core::{
    FilterMode, Priority, ServiceError, SessionManager, SessionReaction, SessionState, SortMode,
    TaskDraft, TaskListController, UserId,
};

struct Harness {
    identity: Rc<MemoryIdentityService>,
    store: Rc<MemoryDocumentStore>,
    session: SessionManager,
    seen: Rc<RefCell<Vec<SessionState>>>,
}

impl Harness {
    fn new() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter("skytodo_core=debug")
            .try_init();

        let identity = Rc::new(MemoryIdentityService::new());
        identity
            .insert_account("ada@example.com", "hunter22")
            .expect("seed account");
        let store = Rc::new(MemoryDocumentStore::new());
        let session = SessionManager::new(identity.clone());

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        session.subscribe(move |state| sink.borrow_mut().push(state.clone()));

        Self {
            identity,
            store,
            session,
            seen,
        }
    }

    /// Feeds the latest session notification to `ctl`, loading if asked to.
    async fn sync(&self, ctl: &mut TaskListController) -> SessionReaction {
        let state = self.seen.borrow().last().cloned().unwrap_or_default();
        let reaction = ctl.on_session(&state);
        if let SessionReaction::Load(key) = &reaction {
            let document = fetch(self.store.as_ref(), key).await.expect("load");
            assert!(ctl.finish_load(key, document));
        }
        reaction
    }

    async fn sign_in(&self, ctl: &mut TaskListController) {
        self.session
            .sign_in("ada@example.com", "hunter22")
            .await
            .expect("sign in");
        self.sync(ctl).await;
    }
}

#[tokio::test]
async fn new_user_starts_empty_and_adds_first_task() {
    let h = Harness::new();
    let mut ctl = TaskListController::new();
    h.sync(&mut ctl).await;
    assert!(ctl.owner().is_none());

    h.sign_in(&mut ctl).await;
    assert!(ctl.is_ready());
    assert!(ctl.tasks().is_empty());

    let write = ctl
        .add(&TaskDraft::new("Buy milk", "", Priority::Medium))
        .expect("add");
    write.send(h.store.as_ref()).await.expect("persist");

    let rows = ctl.render(SortMode::Insertion, FilterMode::All);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].text, "Buy milk");
    assert_eq!(rows[0].deadline.to_string(), "none");
    assert_eq!(rows[0].priority, Priority::Medium);
    assert!(!rows[0].done);

    let stored = h.store.raw(ctl.owner().expect("owner")).expect("stored");
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&stored).expect("json"),
        serde_json::json!({
            "data": [{ "text": "Buy milk", "deadline": "none", "priority": "medium", "done": false }]
        })
    );
}

#[tokio::test]
async fn every_mutation_writes_once_and_noops_write_nothing() {
    let h = Harness::new();
    let mut ctl = TaskListController::new();
    h.sign_in(&mut ctl).await;

    let mut writes = Vec::new();
    writes.extend(ctl.add(&TaskDraft::new("a", "2024-02-01", Priority::Low)));
    writes.extend(ctl.add(&TaskDraft::new("   ", "", Priority::Low)));
    writes.extend(ctl.add(&TaskDraft::new("b", "", Priority::High)));
    let first = ctl.tasks()[0].id;
    writes.extend(ctl.toggle_done(first));
    writes.extend(ctl.confirm_edit(&TaskDraft::default()));
    ctl.begin_edit(first);
    writes.extend(ctl.confirm_edit(&TaskDraft::new("a2", "", Priority::Medium)));
    writes.extend(ctl.delete(first));

    for write in writes.iter().cloned() {
        write.send(h.store.as_ref()).await.expect("persist");
    }

    // add, add, toggle, edit, delete
    assert_eq!(writes.len(), 5);
    assert_eq!(h.store.writes(), 5);
    assert_eq!(writes.last().map(|w| w.document.len()), Some(1));
}

#[tokio::test]
async fn fresh_session_reloads_same_content_and_order() {
    let h = Harness::new();
    let mut ctl = TaskListController::new();
    h.sign_in(&mut ctl).await;

    for (text, deadline, priority) in [
        ("write report", "2024-01-01", Priority::High),
        ("water plants", "", Priority::Low),
        ("call bank", "2023-06-15", Priority::Medium),
    ] {
        let write = ctl
            .add(&TaskDraft::new(text, deadline, priority))
            .expect("add");
        write.send(h.store.as_ref()).await.expect("persist");
    }
    let toggled = ctl.tasks()[1].id;
    ctl.toggle_done(toggled)
        .expect("toggle")
        .send(h.store.as_ref())
        .await
        .expect("persist");
    let before = ctl.document();

    h.session.sign_out().await.expect("sign out");
    assert_eq!(h.sync(&mut ctl).await, SessionReaction::Cleared);
    assert!(ctl.tasks().is_empty());

    let mut fresh = TaskListController::new();
    h.sign_in(&mut fresh).await;
    assert_eq!(fresh.document(), before);

    let by_deadline: Vec<String> = fresh
        .render(SortMode::Deadline, FilterMode::All)
        .iter()
        .map(|task| task.deadline.to_string())
        .collect();
    assert_eq!(by_deadline, vec!["2023-06-15", "2024-01-01", "none"]);
}

#[tokio::test]
async fn done_filter_shows_only_completed_high_task() {
    let h = Harness::new();
    let mut ctl = TaskListController::new();
    h.sign_in(&mut ctl).await;

    ctl.add(&TaskDraft::new("finished", "", Priority::High));
    ctl.add(&TaskDraft::new("pending", "", Priority::Low));
    let finished = ctl.tasks()[0].id;
    ctl.toggle_done(finished);

    let rows = ctl.render(SortMode::Insertion, FilterMode::Done);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].text, "finished");
    assert_eq!(rows[0].priority, Priority::High);
}

#[tokio::test]
async fn failed_persist_leaves_memory_ahead_of_storage() {
    let h = Harness::new();
    let mut ctl = TaskListController::new();
    h.sign_in(&mut ctl).await;
    let key = ctl.owner().cloned().expect("owner");

    h.store.set_offline(true);
    let err = ctl
        .add(&TaskDraft::new("unsaved", "", Priority::Low))
        .expect("add")
        .send(h.store.as_ref())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Transport(_)));
    assert_eq!(ctl.tasks().len(), 1);
    assert!(h.store.raw(&key).is_none());

    // The next successful write carries the whole list.
    h.store.set_offline(false);
    ctl.add(&TaskDraft::new("saved", "", Priority::Low))
        .expect("add")
        .send(h.store.as_ref())
        .await
        .expect("persist");
    let stored = fetch(h.store.as_ref(), &key).await.expect("read").expect("doc");
    assert_eq!(stored.len(), 2);
}

#[tokio::test]
async fn failed_load_can_be_retried() {
    let h = Harness::new();
    let mut ctl = TaskListController::new();
    h.session
        .sign_in("ada@example.com", "hunter22")
        .await
        .expect("sign in");

    let state = h.seen.borrow().last().cloned().expect("state");
    let SessionReaction::Load(key) = ctl.on_session(&state) else {
        panic!("expected a load");
    };

    h.store.set_offline(true);
    assert!(fetch(h.store.as_ref(), &key).await.is_err());
    assert_eq!(ctl.pending_load(), Some(&key));
    assert!(ctl.add(&TaskDraft::new("early", "", Priority::Low)).is_none());

    h.store.set_offline(false);
    let retry = ctl.pending_load().cloned().expect("still loading");
    let document = fetch(h.store.as_ref(), &retry).await.expect("load");
    assert!(ctl.finish_load(&retry, document));
    assert!(ctl.is_ready());
    assert_eq!(h.store.reads(), 2);
}

#[tokio::test]
async fn separate_users_get_separate_documents() {
    let h = Harness::new();
    h.identity
        .insert_account("grace@example.com", "cobol-1959")
        .expect("seed");

    let mut ctl = TaskListController::new();
    h.sign_in(&mut ctl).await;
    ctl.add(&TaskDraft::new("ada's task", "", Priority::Low))
        .expect("add")
        .send(h.store.as_ref())
        .await
        .expect("persist");
    h.session.sign_out().await.expect("sign out");
    h.sync(&mut ctl).await;

    h.session
        .sign_in("grace@example.com", "cobol-1959")
        .await
        .expect("sign in");
    h.sync(&mut ctl).await;
    assert!(ctl.is_ready());
    assert!(ctl.tasks().is_empty());
    assert_ne!(ctl.owner(), Some(&UserId::new("local-0001")));
}
