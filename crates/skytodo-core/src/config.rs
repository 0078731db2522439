use anyhow::{
  Context,
  anyhow
};
use serde::Deserialize;
use tracing::{
  debug,
  info,
  warn
};

pub const DEFAULT_COLLECTION: &str =
  "todos";
pub const DEFAULT_AUTH_ENDPOINT: &str =
  "https://identitytoolkit.googleapis.com";
pub const DEFAULT_TOKEN_ENDPOINT: &str =
  "https://securetoken.googleapis.com";
pub const DEFAULT_FIRESTORE_ENDPOINT:
  &str =
  "https://firestore.googleapis.com";

/// Keys accepted by [`AppConfig::apply_overrides`].
pub const OVERRIDE_KEYS: &[&str] = &[
  "backend",
  "firebase.api_key",
  "firebase.project_id",
  "firebase.collection",
  "firebase.auth_endpoint",
  "firebase.token_endpoint",
  "firebase.firestore_endpoint"
];

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
  #[default]
  Firebase,
  Memory
}

impl BackendKind {
  fn parse(
    raw: &str
  ) -> anyhow::Result<Self> {
    match raw
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "firebase" => {
        Ok(BackendKind::Firebase)
      }
      | "memory" => {
        Ok(BackendKind::Memory)
      }
      | other => Err(anyhow!(
        "unknown backend '{other}' \
         (expected firebase or memory)"
      ))
    }
  }
}

#[derive(
  Debug, Clone, PartialEq, Eq,
  Deserialize,
)]
#[serde(default)]
pub struct FirebaseConfig {
  pub api_key:            String,
  pub project_id:         String,
  pub collection:         String,
  pub auth_endpoint:      String,
  pub token_endpoint:     String,
  pub firestore_endpoint: String
}

impl Default for FirebaseConfig {
  fn default() -> Self {
    Self {
      api_key:            String::new(),
      project_id:         String::new(),
      collection:         DEFAULT_COLLECTION
        .to_string(),
      auth_endpoint:
        DEFAULT_AUTH_ENDPOINT
          .to_string(),
      token_endpoint:
        DEFAULT_TOKEN_ENDPOINT
          .to_string(),
      firestore_endpoint:
        DEFAULT_FIRESTORE_ENDPOINT
          .to_string()
    }
  }
}

#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Eq,
  Deserialize,
)]
#[serde(default)]
pub struct AppConfig {
  pub backend:  BackendKind,
  pub firebase: FirebaseConfig
}

impl AppConfig {
  #[tracing::instrument(skip(text))]
  pub fn from_toml_str(
    text: &str
  ) -> anyhow::Result<Self> {
    let cfg: AppConfig =
      toml::from_str(text).context(
        "failed to parse skytodo \
         config"
      )?;
    debug!(backend = ?cfg.backend, "parsed config");
    Ok(cfg)
  }

  /// Applies `key=value` overrides; a leading `rc.` on the key is optional.
  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) -> anyhow::Result<()>
  where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      let value = v.trim().to_string();
      let fb = &mut self.firebase;
      match key.as_str() {
        | "backend" => {
          self.backend =
            BackendKind::parse(&value)?;
        }
        | "firebase.api_key" => {
          fb.api_key = value
        }
        | "firebase.project_id" => {
          fb.project_id = value
        }
        | "firebase.collection" => {
          fb.collection = value
        }
        | "firebase.auth_endpoint" => {
          fb.auth_endpoint = value
        }
        | "firebase.token_endpoint" => {
          fb.token_endpoint = value
        }
        | "firebase.firestore_endpoint" => {
          fb.firestore_endpoint = value
        }
        | _ => {
          warn!(key = %key, "ignoring unknown config override");
          continue;
        }
      }
      debug!(key = %key, "applied override");
    }
    Ok(())
  }

  pub fn validate(
    &self
  ) -> anyhow::Result<()> {
    if self.backend
      == BackendKind::Memory
    {
      info!(
        "memory backend selected; \
         tasks live only in this tab"
      );
      return Ok(());
    }

    let fb = &self.firebase;
    if fb.api_key.trim().is_empty() {
      return Err(anyhow!(
        "firebase.api_key is required \
         for the firebase backend"
      ));
    }
    if fb.project_id.trim().is_empty() {
      return Err(anyhow!(
        "firebase.project_id is \
         required for the firebase \
         backend"
      ));
    }
    if fb.collection.trim().is_empty()
      || fb.collection.contains('/')
    {
      return Err(anyhow!(
        "firebase.collection must be a \
         single collection name, got \
         '{}'",
        fb.collection
      ));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_fill_missing_keys() {
    let cfg = AppConfig::from_toml_str(
      r#"
        [firebase]
        api_key = "k"
        project_id = "demo"
      "#
    )
    .unwrap();

    assert_eq!(
      cfg.backend,
      BackendKind::Firebase
    );
    assert_eq!(
      cfg.firebase.collection,
      "todos"
    );
    assert_eq!(
      cfg.firebase.auth_endpoint,
      DEFAULT_AUTH_ENDPOINT
    );
    cfg.validate().unwrap();
  }

  #[test]
  fn firebase_backend_needs_credentials()
   {
    let cfg = AppConfig::default();
    let err =
      cfg.validate().unwrap_err();
    assert!(
      err
        .to_string()
        .contains("api_key")
    );

    let memory = AppConfig {
      backend: BackendKind::Memory,
      ..AppConfig::default()
    };
    memory.validate().unwrap();
  }

  #[test]
  fn overrides_accept_rc_prefix() {
    let mut cfg = AppConfig::default();
    cfg
      .apply_overrides(vec![
        (
          "rc.backend".to_string(),
          "Memory".to_string()
        ),
        (
          "firebase.firestore_endpoint"
            .to_string(),
          "http://localhost:8080"
            .to_string()
        ),
        (
          "rc.theme".to_string(),
          "dark".to_string()
        ),
      ])
      .unwrap();

    assert_eq!(
      cfg.backend,
      BackendKind::Memory
    );
    assert_eq!(
      cfg.firebase.firestore_endpoint,
      "http://localhost:8080"
    );
  }

  #[test]
  fn every_listed_key_is_accepted() {
    let mut cfg = AppConfig::default();
    let overrides = OVERRIDE_KEYS
      .iter()
      .map(|key| {
        let value = if *key == "backend" {
          "memory"
        } else {
          "x"
        };
        (key.to_string(), value.to_string())
      });
    cfg.apply_overrides(overrides).unwrap();

    assert_eq!(
      cfg.backend,
      BackendKind::Memory
    );
    assert_eq!(cfg.firebase.api_key, "x");
    assert_eq!(
      cfg.firebase.firestore_endpoint,
      "x"
    );
  }

  #[test]
  fn bad_backend_override_is_an_error() {
    let mut cfg = AppConfig::default();
    assert!(
      cfg
        .apply_overrides(vec![(
          "backend".to_string(),
          "sqlite".to_string()
        )])
        .is_err()
    );
  }
}
