use skytodo_core::Priority;
use yew::{
  Callback,
  Html,
  Properties,
  TargetCast,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct PrioritySelectProps {
  pub value:     Priority,
  pub on_change: Callback<Priority>
}

#[function_component(PrioritySelect)]
pub fn priority_select(
  props: &PrioritySelectProps
) -> Html {
  let on_change = props.on_change.clone();
  let onchange =
    Callback::from(move |e: web_sys::Event| {
      let select: web_sys::HtmlSelectElement =
        e.target_unchecked_into();
      on_change.emit(
        Priority::parse_lossy(
          &select.value()
        )
      );
    });

  html! {
      <select class="priority" onchange={onchange}>
          {
              for Priority::ALL.into_iter().map(|priority| html! {
                  <option
                      value={priority.to_string()}
                      selected={priority == props.value}
                  >
                      { priority.to_string() }
                  </option>
              })
          }
      </select>
  }
}
