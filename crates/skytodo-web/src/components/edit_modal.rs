use skytodo_core::{
  Priority,
  TaskDraft
};
use yew::{
  Callback,
  Html,
  Properties,
  TargetCast,
  function_component,
  html
};

use super::PrioritySelect;

#[derive(Properties, PartialEq)]
pub struct EditModalProps {
  pub form:       TaskDraft,
  pub on_change:  Callback<TaskDraft>,
  pub on_confirm: Callback<()>,
  pub on_cancel:  Callback<()>
}

#[function_component(EditModal)]
pub fn edit_modal(
  props: &EditModalProps
) -> Html {
  let on_text = {
    let form = props.form.clone();
    let on_change = props.on_change.clone();
    Callback::from(
      move |e: web_sys::InputEvent| {
        let input: web_sys::HtmlInputElement =
          e.target_unchecked_into();
        on_change.emit(TaskDraft {
          text: input.value(),
          ..form.clone()
        });
      }
    )
  };
  let on_deadline = {
    let form = props.form.clone();
    let on_change = props.on_change.clone();
    Callback::from(
      move |e: web_sys::InputEvent| {
        let input: web_sys::HtmlInputElement =
          e.target_unchecked_into();
        on_change.emit(TaskDraft {
          deadline: input.value(),
          ..form.clone()
        });
      }
    )
  };
  let on_priority = {
    let form = props.form.clone();
    let on_change = props.on_change.clone();
    Callback::from(
      move |priority: Priority| {
        on_change.emit(TaskDraft {
          priority,
          ..form.clone()
        });
      }
    )
  };
  let on_confirm = props.on_confirm.clone();
  let on_cancel = props.on_cancel.clone();
  let blank = props
    .form
    .normalized_text()
    .is_none();

  html! {
      <div id="edit-modal" class="modal-backdrop">
          <div class="modal">
              <div class="header">{ "Edit task" }</div>
              <input
                  id="edit-text"
                  type="text"
                  value={props.form.text.clone()}
                  oninput={on_text}
              />
              <input
                  id="edit-deadline"
                  type="date"
                  value={props.form.deadline.clone()}
                  oninput={on_deadline}
              />
              <PrioritySelect value={props.form.priority.clone()} on_change={on_priority} />
              if blank {
                  <div class="notice error">{ "Task text cannot be empty." }</div>
              }
              <div class="actions">
                  <button
                      id="save-edit"
                      disabled={blank}
                      onclick={move |_| on_confirm.emit(())}
                  >
                      { "Save" }
                  </button>
                  <button id="cancel-edit" onclick={move |_| on_cancel.emit(())}>
                      { "Cancel" }
                  </button>
              </div>
          </div>
      </div>
  }
}
