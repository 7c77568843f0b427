//! Shared application state.
//!
//! `CoreState` bundles the similarity store, credential store, session
//! store and asset resolver. It is built once at startup, wrapped in `Arc`
//! and handed to every request handler; nothing here is global.

use thiserror::Error;

use crate::assets::AssetResolver;
use crate::catalog::{self, CatalogError, SimilarityStore};
use crate::config::AppConfig;
use crate::credentials::{CredentialError, CredentialStore};
use crate::crypto::PasswordHasher;
use crate::session::{transition, Event, SessionState, SessionStore, Transition};

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Cannot load similarity artifacts: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Cannot open credential store: {0}")]
    Credentials(#[from] CredentialError),

    #[error("Cannot bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

pub struct CoreState {
    pub similarity: SimilarityStore,
    pub credentials: CredentialStore,
    pub sessions: SessionStore,
    pub assets: AssetResolver,
}

/// A session as seen by one request.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub id: String,
    pub state: SessionState,
    /// True when the request carried no valid session and one was created.
    pub is_new: bool,
}

impl CoreState {
    pub fn new(
        similarity: SimilarityStore,
        credentials: CredentialStore,
        assets: AssetResolver,
    ) -> Self {
        Self {
            similarity,
            credentials,
            sessions: SessionStore::new(),
            assets,
        }
    }

    /// Load artifacts and open the credential store described by `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self, StartupError> {
        let similarity =
            catalog::load_similarity_store(&config.catalog_path, &config.similarity_path)?;
        let credentials = CredentialStore::open(
            &config.db_path,
            PasswordHasher::new(config.pbkdf2_iterations),
        )?;
        let assets = AssetResolver::new(&config.images_dir);
        Ok(Self::new(similarity, credentials, assets))
    }

    /// Look up the session named by the request cookie, or start a new one.
    pub fn session(&self, cookie_id: Option<&str>) -> SessionHandle {
        if let Some(id) = cookie_id {
            if let Some(state) = self.sessions.get(id) {
                return SessionHandle {
                    id: id.to_string(),
                    state,
                    is_new: false,
                };
            }
        }

        let id = self.sessions.create();
        tracing::debug!("New browser session");
        SessionHandle {
            id,
            state: SessionState::default(),
            is_new: true,
        }
    }

    /// Apply `event` to the session and persist the resulting state.
    pub fn apply(&self, session: &mut SessionHandle, event: Event) -> Transition {
        let result = transition(&session.state, event);
        if result.state.page != session.state.page {
            tracing::info!(
                from = session.state.page.as_str(),
                to = result.state.page.as_str(),
                "Page transition"
            );
        }
        session.state = result.state.clone();
        self.sessions.put(&session.id, result.state.clone());
        result
    }
}
