use yew::{
  Callback,
  Html,
  Properties,
  TargetCast,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct AuthPanelProps {
  pub email:             String,
  pub password:          String,
  pub busy:              bool,
  pub on_email_input:    Callback<String>,
  pub on_password_input: Callback<String>,
  pub on_sign_up:        Callback<()>,
  pub on_sign_in:        Callback<()>
}

#[function_component(AuthPanel)]
pub fn auth_panel(
  props: &AuthPanelProps
) -> Html {
  let on_email = {
    let on_email_input =
      props.on_email_input.clone();
    Callback::from(
      move |e: web_sys::InputEvent| {
        let input: web_sys::HtmlInputElement =
          e.target_unchecked_into();
        on_email_input.emit(input.value());
      }
    )
  };
  let on_password = {
    let on_password_input =
      props.on_password_input.clone();
    Callback::from(
      move |e: web_sys::InputEvent| {
        let input: web_sys::HtmlInputElement =
          e.target_unchecked_into();
        on_password_input
          .emit(input.value());
      }
    )
  };

  // Enter in either field signs in; the page must not reload.
  let on_submit = {
    let on_sign_in =
      props.on_sign_in.clone();
    Callback::from(
      move |e: web_sys::SubmitEvent| {
        e.prevent_default();
        on_sign_in.emit(());
      }
    )
  };
  let on_sign_up = {
    let on_sign_up =
      props.on_sign_up.clone();
    Callback::from(
      move |e: yew::MouseEvent| {
        e.prevent_default();
        on_sign_up.emit(());
      }
    )
  };

  html! {
      <form id="auth-container" class="panel auth" onsubmit={on_submit}>
          <input
              id="email"
              type="email"
              placeholder="Email"
              autocomplete="username"
              value={props.email.clone()}
              oninput={on_email}
          />
          <input
              id="password"
              type="password"
              placeholder="Password"
              autocomplete="current-password"
              value={props.password.clone()}
              oninput={on_password}
          />
          <div class="actions">
              <button id="signup-btn" type="button" disabled={props.busy} onclick={on_sign_up}>
                  { "Sign up" }
              </button>
              <button id="login-btn" type="submit" disabled={props.busy}>
                  { "Sign in" }
              </button>
          </div>
      </form>
  }
}
