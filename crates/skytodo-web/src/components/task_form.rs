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
pub struct TaskFormProps {
  pub draft:     TaskDraft,
  pub on_change: Callback<TaskDraft>,
  pub on_submit: Callback<()>
}

#[function_component(TaskForm)]
pub fn task_form(
  props: &TaskFormProps
) -> Html {
  let on_text = {
    let draft = props.draft.clone();
    let on_change = props.on_change.clone();
    Callback::from(
      move |e: web_sys::InputEvent| {
        let input: web_sys::HtmlInputElement =
          e.target_unchecked_into();
        on_change.emit(TaskDraft {
          text: input.value(),
          ..draft.clone()
        });
      }
    )
  };
  let on_deadline = {
    let draft = props.draft.clone();
    let on_change = props.on_change.clone();
    Callback::from(
      move |e: web_sys::InputEvent| {
        let input: web_sys::HtmlInputElement =
          e.target_unchecked_into();
        on_change.emit(TaskDraft {
          deadline: input.value(),
          ..draft.clone()
        });
      }
    )
  };
  let on_priority = {
    let draft = props.draft.clone();
    let on_change = props.on_change.clone();
    Callback::from(
      move |priority: Priority| {
        on_change.emit(TaskDraft {
          priority,
          ..draft.clone()
        });
      }
    )
  };
  let on_submit = {
    let on_submit =
      props.on_submit.clone();
    Callback::from(
      move |e: web_sys::SubmitEvent| {
        e.prevent_default();
        on_submit.emit(());
      }
    )
  };

  html! {
      <form class="panel add-form" onsubmit={on_submit}>
          <input
              id="todo-input"
              type="text"
              placeholder="What needs doing?"
              value={props.draft.text.clone()}
              oninput={on_text}
          />
          <input
              id="todo-deadline"
              type="date"
              value={props.draft.deadline.clone()}
              oninput={on_deadline}
          />
          <PrioritySelect value={props.draft.priority.clone()} on_change={on_priority} />
          <button id="add-btn" type="submit">{ "Add" }</button>
      </form>
  }
}
