use yew::{
  Callback,
  Html,
  Properties,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct SessionBarProps {
  pub email:       String,
  pub on_sign_out: Callback<()>
}

#[function_component(SessionBar)]
pub fn session_bar(
  props: &SessionBarProps
) -> Html {
  let on_sign_out =
    props.on_sign_out.clone();

  html! {
      <div id="logout-container" class="session-bar">
          <span>{ format!("Signed in as {}", props.email) }</span>
          <button onclick={move |_| on_sign_out.emit(())}>
              { "Sign out" }
          </button>
      </div>
  }
}
