use std::cell::RefCell;
use std::rc::Rc;

use gloo::dialogs::alert;
use skytodo_core::store::fetch;
use skytodo_core::{
  DocumentStore,
  FilterMode,
  PendingWrite,
  Phase,
  SessionReaction,
  SessionState,
  Services,
  SortMode,
  Task,
  TaskDraft,
  TaskId,
  TaskListController,
  UserId
};
use yew::functional::UseForceUpdateHandle;
use yew::{
  Callback,
  Html,
  MouseEvent,
  Properties,
  function_component,
  html,
  use_effect_with,
  use_force_update,
  use_memo,
  use_mut_ref,
  use_state
};

use crate::components::{
  AuthPanel,
  EditModal,
  SessionBar,
  TaskForm,
  TaskList,
  ViewControls
};
use crate::settings::load_config;

#[function_component(App)]
pub fn app() -> Html {
  let services = use_memo((), |_| {
    load_config()
      .and_then(|cfg| {
        Services::connect(&cfg)
      })
      .map_err(|err| {
        tracing::error!(error = %format!("{err:#}"), "startup failed");
        format!("{err:#}")
      })
  });

  match &*services {
    | Ok(services) => html! {
        <Tracker services={services.clone()} />
    },
    | Err(message) => html! {
        <div class="app">
            <h1>{ "skytodo" }</h1>
            <div class="notice error">
                { format!("Cannot start: {message}") }
            </div>
        </div>
    }
  }
}

#[derive(Properties, PartialEq)]
struct TrackerProps {
  services: Services
}

/// Everything a list mutation needs after the controller has applied it.
#[derive(Clone)]
struct ListSync {
  controller:
    Rc<RefCell<TaskListController>>,
  store:      Rc<dyn DocumentStore>,
  redraw:     UseForceUpdateHandle
}

impl ListSync {
  /// Re-renders and sends the write, if the mutation produced one.
  fn commit(
    &self,
    write: Option<PendingWrite>
  ) {
    let Some(write) = write else {
      return;
    };
    self.redraw.force_update();

    let store = self.store.clone();
    wasm_bindgen_futures::spawn_local(
      async move {
        if let Err(err) =
          write.send(store.as_ref()).await
        {
          alert(&format!(
            "Could not save your tasks: \
             {err}"
          ));
        }
      }
    );
  }

  fn load(
    &self,
    key: UserId,
    on_error: Callback<Option<String>>
  ) {
    let sync = self.clone();
    wasm_bindgen_futures::spawn_local(
      async move {
        match fetch(
          sync.store.as_ref(),
          &key
        )
        .await
        {
          | Ok(document) => {
            let applied = sync
              .controller
              .borrow_mut()
              .finish_load(&key, document);
            if applied {
              on_error.emit(None);
              sync.redraw.force_update();
            }
          }
          | Err(err) => {
            let still_loading = sync
              .controller
              .borrow()
              .awaits_load(&key);
            if !still_loading {
              tracing::debug!(uid = %key, error = %err, "dropping failed load for a stale session");
              return;
            }
            let message = format!(
              "Could not load your tasks: \
               {err}"
            );
            on_error
              .emit(Some(message.clone()));
            alert(&message);
          }
        }
      }
    );
  }
}

#[function_component(Tracker)]
fn tracker(
  props: &TrackerProps
) -> Html {
  let services = props.services.clone();
  let session_state =
    use_state(SessionState::default);
  let controller =
    use_mut_ref(TaskListController::new);
  let redraw = use_force_update();
  let sort =
    use_state(SortMode::default);
  let filter =
    use_state(FilterMode::default);
  let draft =
    use_state(TaskDraft::default);
  let edit_form =
    use_state(|| None::<TaskDraft>);
  let email = use_state(String::new);
  let password = use_state(String::new);
  let auth_busy = use_state(|| false);
  let load_error =
    use_state(|| None::<String>);

  let sync = ListSync {
    controller: controller.clone(),
    store:      services.store.clone(),
    redraw:     redraw.clone()
  };
  let on_load_error = {
    let load_error = load_error.clone();
    Callback::from(
      move |message: Option<String>| {
        load_error.set(message)
      }
    )
  };

  {
    let session =
      services.session.clone();
    let session_state =
      session_state.clone();
    use_effect_with((), move |_| {
      session.subscribe(move |state| {
        session_state.set(state.clone())
      });
      || ()
    });
  }

  {
    let sync = sync.clone();
    let edit_form = edit_form.clone();
    let on_load_error =
      on_load_error.clone();
    use_effect_with(
      (*session_state).clone(),
      move |state| {
        let reaction = sync
          .controller
          .borrow_mut()
          .on_session(state);
        match reaction {
          | SessionReaction::Load(key) => {
            tracing::info!(uid = %key, "session started; loading tasks");
            edit_form.set(None);
            sync.redraw.force_update();
            sync.load(key, on_load_error);
          }
          | SessionReaction::Cleared => {
            edit_form.set(None);
            on_load_error.emit(None);
            sync.redraw.force_update();
          }
          | SessionReaction::Unchanged => {}
        }
        || ()
      }
    );
  }

  let on_sign_up = {
    let session =
      services.session.clone();
    let email = email.clone();
    let password = password.clone();
    let auth_busy = auth_busy.clone();
    Callback::from(move |_: ()| {
      let session = session.clone();
      let email_value = (*email).clone();
      let password_value =
        (*password).clone();
      let auth_busy = auth_busy.clone();
      auth_busy.set(true);
      wasm_bindgen_futures::spawn_local(
        async move {
          match session
            .sign_up(
              &email_value,
              &password_value
            )
            .await
          {
            | Ok(_) => alert(
              "Account created. Please \
               sign in."
            ),
            | Err(err) => {
              alert(&err.to_string())
            }
          }
          auth_busy.set(false);
        }
      );
    })
  };

  let on_sign_in = {
    let session =
      services.session.clone();
    let email = email.clone();
    let password = password.clone();
    let auth_busy = auth_busy.clone();
    Callback::from(move |_: ()| {
      let session = session.clone();
      let email_value = (*email).clone();
      let password_value =
        (*password).clone();
      let password = password.clone();
      let auth_busy = auth_busy.clone();
      auth_busy.set(true);
      wasm_bindgen_futures::spawn_local(
        async move {
          match session
            .sign_in(
              &email_value,
              &password_value
            )
            .await
          {
            | Ok(_) => {
              password.set(String::new())
            }
            | Err(err) => {
              alert(&err.to_string())
            }
          }
          auth_busy.set(false);
        }
      );
    })
  };

  let on_sign_out = {
    let session =
      services.session.clone();
    Callback::from(move |_: ()| {
      let session = session.clone();
      wasm_bindgen_futures::spawn_local(
        async move {
          if let Err(err) =
            session.sign_out().await
          {
            alert(&err.to_string());
          }
        }
      );
    })
  };

  let on_email_input = {
    let email = email.clone();
    Callback::from(
      move |value: String| {
        email.set(value)
      }
    )
  };
  let on_password_input = {
    let password = password.clone();
    Callback::from(
      move |value: String| {
        password.set(value)
      }
    )
  };

  let on_draft_change = {
    let draft = draft.clone();
    Callback::from(
      move |next: TaskDraft| {
        draft.set(next)
      }
    )
  };

  let on_add = {
    let sync = sync.clone();
    let draft = draft.clone();
    Callback::from(move |_: ()| {
      let write = sync
        .controller
        .borrow_mut()
        .add(&draft);
      if write.is_some() {
        draft.set(TaskDraft::default());
      }
      sync.commit(write);
    })
  };

  let on_toggle = {
    let sync = sync.clone();
    Callback::from(move |id: TaskId| {
      let write = sync
        .controller
        .borrow_mut()
        .toggle_done(id);
      sync.commit(write);
    })
  };

  let on_delete = {
    let sync = sync.clone();
    let edit_form = edit_form.clone();
    Callback::from(move |id: TaskId| {
      let (write, still_editing) = {
        let mut ctl =
          sync.controller.borrow_mut();
        let write = ctl.delete(id);
        (write, ctl.editing().is_some())
      };
      if !still_editing {
        edit_form.set(None);
      }
      sync.commit(write);
    })
  };

  let on_edit = {
    let controller = controller.clone();
    let edit_form = edit_form.clone();
    Callback::from(move |id: TaskId| {
      let form = controller
        .borrow_mut()
        .begin_edit(id);
      if let Some(form) = form {
        edit_form.set(Some(form));
      }
    })
  };

  let on_edit_change = {
    let edit_form = edit_form.clone();
    Callback::from(
      move |next: TaskDraft| {
        edit_form.set(Some(next))
      }
    )
  };

  let on_edit_confirm = {
    let sync = sync.clone();
    let edit_form = edit_form.clone();
    Callback::from(move |_: ()| {
      let Some(form) =
        (*edit_form).clone()
      else {
        return;
      };
      let (write, still_editing) = {
        let mut ctl =
          sync.controller.borrow_mut();
        let write =
          ctl.confirm_edit(&form);
        (write, ctl.editing().is_some())
      };
      if !still_editing {
        edit_form.set(None);
      }
      sync.commit(write);
    })
  };

  let on_edit_cancel = {
    let controller = controller.clone();
    let edit_form = edit_form.clone();
    Callback::from(move |_: ()| {
      controller
        .borrow_mut()
        .cancel_edit();
      edit_form.set(None);
    })
  };

  let on_sort_change = {
    let sort = sort.clone();
    Callback::from(
      move |mode: SortMode| {
        sort.set(mode)
      }
    )
  };
  let on_filter_change = {
    let filter = filter.clone();
    Callback::from(
      move |mode: FilterMode| {
        filter.set(mode)
      }
    )
  };

  let on_retry_load = {
    let sync = sync.clone();
    let on_load_error =
      on_load_error.clone();
    Callback::from(move |_: MouseEvent| {
      let pending = sync
        .controller
        .borrow()
        .pending_load()
        .cloned();
      if let Some(key) = pending {
        on_load_error.emit(None);
        sync.load(
          key,
          on_load_error.clone()
        );
      }
    })
  };

  let (rows, loading) = {
    let ctl = controller.borrow();
    let rows: Vec<Task> = ctl
      .render(*sort, *filter)
      .into_iter()
      .cloned()
      .collect();
    (
      rows,
      matches!(
        ctl.phase(),
        Phase::Loading(_)
      )
    )
  };

  html! {
      <div class="app">
          <h1>{ "skytodo" }</h1>
          if let Some(user) = session_state.user().cloned() {
              <SessionBar email={user.email} on_sign_out={on_sign_out} />
              <div id="todo-container">
                  <TaskForm
                      draft={(*draft).clone()}
                      on_change={on_draft_change}
                      on_submit={on_add}
                  />
                  <ViewControls
                      sort={*sort}
                      filter={*filter}
                      on_sort_change={on_sort_change}
                      on_filter_change={on_filter_change}
                  />
                  if let Some(message) = (*load_error).clone() {
                      <div class="notice error">
                          <span>{ message }</span>
                          <button onclick={on_retry_load}>{ "Retry" }</button>
                      </div>
                  } else if loading {
                      <div class="notice">{ "Loading tasks…" }</div>
                  }
                  <TaskList
                      tasks={rows}
                      on_toggle={on_toggle}
                      on_edit={on_edit}
                      on_delete={on_delete}
                  />
              </div>
              if let Some(form) = (*edit_form).clone() {
                  <EditModal
                      form={form}
                      on_change={on_edit_change}
                      on_confirm={on_edit_confirm}
                      on_cancel={on_edit_cancel}
                  />
              }
          } else {
              <AuthPanel
                  email={(*email).clone()}
                  password={(*password).clone()}
                  busy={*auth_busy}
                  on_email_input={on_email_input}
                  on_password_input={on_password_input}
                  on_sign_up={on_sign_up}
                  on_sign_in={on_sign_in}
              />
          }
      </div>
  }
}
