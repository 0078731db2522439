use anyhow::Context;
use skytodo_core::config::{
  AppConfig,
  OVERRIDE_KEYS
};

const BUNDLED_CONFIG: &str =
  include_str!("../skytodo.toml");

/// Bundled config with `rc.*` overrides from the page query string.
pub fn load_config()
-> anyhow::Result<AppConfig> {
  let mut cfg =
    AppConfig::from_toml_str(
      BUNDLED_CONFIG
    )
    .context(
      "bundled skytodo.toml is invalid"
    )?;

  let overrides = query_overrides();
  if !overrides.is_empty() {
    tracing::info!(
      count = overrides.len(),
      "applying query string overrides"
    );
  }
  cfg.apply_overrides(overrides)?;
  Ok(cfg)
}

fn query_overrides()
-> Vec<(String, String)> {
  let Some(search) = web_sys::window()
    .and_then(|window| {
      window.location().search().ok()
    })
  else {
    return Vec::new();
  };
  let Ok(params) =
    web_sys::UrlSearchParams::new_with_str(
      &search
    )
  else {
    return Vec::new();
  };

  OVERRIDE_KEYS
    .iter()
    .filter_map(|key| {
      let rc_key = format!("rc.{key}");
      params
        .get(&rc_key)
        .map(|value| (rc_key, value))
    })
    .collect()
}
