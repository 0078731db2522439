use std::rc::Rc;

use anyhow::Context;
use tracing::info;

use crate::config::{
  AppConfig,
  BackendKind
};
use crate::firebase;
use crate::memory::{
  MemoryDocumentStore,
  MemoryIdentityService
};
use crate::session::SessionManager;
use crate::store::DocumentStore;

/// The session manager and document store the app runs against.
#[derive(Clone)]
pub struct Services {
  pub backend: BackendKind,
  pub session: Rc<SessionManager>,
  pub store:   Rc<dyn DocumentStore>
}

/// Identity of the shared handles, so the value can sit in component props.
impl PartialEq for Services {
  fn eq(
    &self,
    other: &Self
  ) -> bool {
    Rc::ptr_eq(
      &self.session,
      &other.session
    ) && Rc::ptr_eq(
      &self.store,
      &other.store
    )
  }
}

impl Services {
  #[tracing::instrument(skip(cfg), fields(backend = ?cfg.backend))]
  pub fn connect(
    cfg: &AppConfig
  ) -> anyhow::Result<Self> {
    cfg.validate().context(
      "invalid skytodo configuration"
    )?;

    let services = match cfg.backend {
      | BackendKind::Firebase => {
        let (auth, store) =
          firebase::connect(
            &cfg.firebase
          );
        Services {
          backend: cfg.backend,
          session: Rc::new(
            SessionManager::new(
              Rc::new(auth)
            )
          ),
          store:   Rc::new(store)
        }
      }
      | BackendKind::Memory => {
        Services::in_memory()
      }
    };

    info!("services connected");
    Ok(services)
  }

  pub fn in_memory() -> Self {
    Services {
      backend: BackendKind::Memory,
      session: Rc::new(
        SessionManager::new(Rc::new(
          MemoryIdentityService::new()
        ))
      ),
      store:   Rc::new(
        MemoryDocumentStore::new()
      )
    }
  }
}
