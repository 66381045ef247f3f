//! Application state owned by the host.

use std::sync::Arc;

use time_capsule_core::{AdminPassword, Clock, SystemClock};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::gateway::HttpGateway;
use crate::navigation::{NavigationCoordinator, Navigator};
use crate::roster::AdminRoster;
use crate::session::SessionStore;
use crate::storage::{DurableStorage, FileStorage};
use crate::theme::ThemePreference;
use crate::viewer::CapsuleViewer;

/// Everything a host needs, wired together once at startup.
///
/// This struct is cheaply cloneable via `Arc`. The session is hydrated from
/// durable storage when the state is created.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ClientConfig,
    session: SessionStore,
    gateway: HttpGateway,
    theme: ThemePreference,
}

impl AppState {
    /// Create state backed by files under `config.state_dir` and the system
    /// clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the state directory or token slot cannot be read,
    /// or the HTTP client cannot be built.
    pub fn init(config: ClientConfig) -> Result<Self, ClientError> {
        let storage = Arc::new(FileStorage::open(&config.state_dir)?);
        Self::with_parts(config, storage, Arc::new(SystemClock))
    }

    /// Create state from explicit storage and clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the token slot cannot be read or the HTTP client
    /// cannot be built.
    pub fn with_parts(
        config: ClientConfig,
        storage: Arc<dyn DurableStorage>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ClientError> {
        let session = SessionStore::hydrate(storage.clone())?;
        let gateway = HttpGateway::new(&config, session.clone(), clock)?;
        let theme = ThemePreference::new(storage);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                session,
                gateway,
                theme,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    #[must_use]
    pub fn gateway(&self) -> &HttpGateway {
        &self.inner.gateway
    }

    #[must_use]
    pub fn theme(&self) -> &ThemePreference {
        &self.inner.theme
    }

    /// A viewer ticking at the configured countdown period.
    #[must_use]
    pub fn viewer(&self) -> CapsuleViewer {
        CapsuleViewer::new(self.inner.gateway.clone(), self.inner.config.countdown_tick)
    }

    /// An empty admin roster using the configured page size. Load it after
    /// logging in.
    #[must_use]
    pub fn roster(&self) -> AdminRoster {
        AdminRoster::new(self.inner.gateway.clone(), self.inner.config.page_size)
    }

    /// Route this state's auth signals to `navigator`.
    pub fn navigation<N: Navigator>(&self, navigator: N) -> NavigationCoordinator<N> {
        NavigationCoordinator::new(&self.inner.gateway, navigator)
    }

    /// Validate `password`, log in and keep the token.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidPassword`] without sending anything if
    /// the input is malformed, otherwise the login error.
    pub async fn login(&self, password: &str) -> Result<(), ClientError> {
        let password = AdminPassword::parse(password)?;
        self.inner
            .session
            .login(&self.inner.gateway, &password)
            .await?;
        Ok(())
    }

    /// Drop the admin session.
    ///
    /// # Errors
    ///
    /// Returns an error if the token slot cannot be erased.
    pub fn logout(&self) -> Result<(), ClientError> {
        Ok(self.inner.session.logout()?)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::ADMIN_TOKEN_SLOT;

    fn config(dir: &std::path::Path) -> ClientConfig {
        ClientConfig {
            state_dir: dir.to_path_buf(),
            ..ClientConfig::default()
        }
    }

    #[test]
    fn test_init_hydrates_session() {
        let dir = tempfile::tempdir().unwrap();
        FileStorage::open(dir.path())
            .unwrap()
            .set(ADMIN_TOKEN_SLOT, "persisted")
            .unwrap();

        let state = AppState::init(config(dir.path())).unwrap();
        assert!(state.session().is_authenticated());
        assert!(state.gateway().session().is_authenticated());
    }

    #[test]
    fn test_logout_clears_shared_session() {
        let dir = tempfile::tempdir().unwrap();
        FileStorage::open(dir.path())
            .unwrap()
            .set(ADMIN_TOKEN_SLOT, "persisted")
            .unwrap();

        let state = AppState::init(config(dir.path())).unwrap();
        state.clone().logout().unwrap();
        assert!(!state.gateway().session().is_authenticated());

        let restarted = AppState::init(config(dir.path())).unwrap();
        assert!(!restarted.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_login_rejects_short_password_locally() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::init(config(dir.path())).unwrap();

        let err = state.login("abc").await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidPassword(_)));
        assert!(!state.session().is_authenticated());
    }
}
