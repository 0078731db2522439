use skytodo_core::{
  Priority,
  Task,
  TaskId
};
use yew::{
  Callback,
  Html,
  Properties,
  classes,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct TaskListRowProps {
  pub task:      Task,
  pub on_toggle: Callback<TaskId>,
  pub on_edit:   Callback<TaskId>,
  pub on_delete: Callback<TaskId>
}

#[function_component(TaskListRow)]
pub fn task_list_row(
  props: &TaskListRowProps
) -> Html {
  let id = props.task.id;
  let on_toggle = props.on_toggle.clone();
  let on_edit = props.on_edit.clone();
  let on_delete = props.on_delete.clone();

  let priority_class =
    match props.task.priority {
      | Priority::High => {
        "priority-high"
      }
      | Priority::Medium => {
        "priority-medium"
      }
      | Priority::Low
      | Priority::Other(_) => {
        "priority-low"
      }
    };
  let done_class =
    props.task.done.then_some("done");

  // Clicking the row toggles; the buttons must not.
  html! {
      <li
          class={classes!("row", priority_class, done_class)}
          onclick={move |_| on_toggle.emit(id)}
      >
          <div class="todo-row">
              <span class="text">
                  { format!(
                      "{} (deadline: {} | priority: {})",
                      props.task.text,
                      props.task.deadline,
                      props.task.priority
                  ) }
              </span>
              <button
                  class="edit"
                  onclick={move |e: yew::MouseEvent| {
                      e.stop_propagation();
                      on_edit.emit(id);
                  }}
              >
                  { "Edit" }
              </button>
              <button
                  class="delete"
                  onclick={move |e: yew::MouseEvent| {
                      e.stop_propagation();
                      on_delete.emit(id);
                  }}
              >
                  { "Delete" }
              </button>
          </div>
      </li>
  }
}
