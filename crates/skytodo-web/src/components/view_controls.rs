use skytodo_core::{
  FilterMode,
  SortMode
};
use yew::{
  Callback,
  Html,
  Properties,
  TargetCast,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct ViewControlsProps {
  pub sort:             SortMode,
  pub filter:           FilterMode,
  pub on_sort_change:   Callback<SortMode>,
  pub on_filter_change: Callback<FilterMode>
}

fn select_value(
  e: web_sys::Event
) -> String {
  let select: web_sys::HtmlSelectElement =
    e.target_unchecked_into();
  select.value()
}

#[function_component(ViewControls)]
pub fn view_controls(
  props: &ViewControlsProps
) -> Html {
  let on_sort = {
    let on_sort_change =
      props.on_sort_change.clone();
    Callback::from(move |e: web_sys::Event| {
      on_sort_change.emit(
        SortMode::from_key(
          &select_value(e)
        )
      );
    })
  };
  let on_filter = {
    let on_filter_change =
      props.on_filter_change.clone();
    Callback::from(move |e: web_sys::Event| {
      on_filter_change.emit(
        FilterMode::from_key(
          &select_value(e)
        )
      );
    })
  };

  html! {
      <div class="panel view-controls">
          <label>
              { "Sort " }
              <select id="sort-select" onchange={on_sort}>
                  {
                      for SortMode::ALL.iter().map(|mode| html! {
                          <option value={mode.as_key()} selected={*mode == props.sort}>
                              { mode.label() }
                          </option>
                      })
                  }
              </select>
          </label>
          <label>
              { "Show " }
              <select id="filter-select" onchange={on_filter}>
                  {
                      for FilterMode::ALL.iter().map(|mode| html! {
                          <option value={mode.as_key()} selected={*mode == props.filter}>
                              { mode.label() }
                          </option>
                      })
                  }
              </select>
          </label>
      </div>
  }
}
