//! Single-flight access to the current session token.
//!
//! [`TokenProvider`] is the only component that reads or writes the
//! [`TokenStore`]. Reads of the current token and the decision to start a
//! refresh happen under one lock, so concurrent callers either see a usable
//! token or join the one refresh that is already running.
//!
//! The refresh itself runs as a spawned task. Callers that stop waiting do
//! not cancel it, and the task installs its result and clears the in-flight
//! handle in the same critical section.

use std::sync::Arc;

use chrono::Utc;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::{Mutex, watch};
use tokio::task::{AbortHandle, JoinError};
use tracing::{debug, info, instrument, warn};

use authwire_core::error::{AuthError, TransportError};
use authwire_core::{
    AccessToken, Error, ExpiryPolicy, RefreshToken, Result, Token, TokenRefresher, TokenStore,
};

type RefreshFuture = Shared<BoxFuture<'static, Result<Token>>>;

/// Observable authentication state of a [`TokenProvider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No token is stored.
    LoggedOut,
    /// A token is stored and no refresh is running.
    LoggedIn,
    /// A token is stored and a refresh is in flight.
    Refreshing,
}

/// Serves valid credentials, refreshing at most once at a time.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct TokenProvider {
    inner: Arc<ProviderInner>,
}

struct ProviderInner {
    store: Arc<dyn TokenStore>,
    refresher: Arc<dyn TokenRefresher>,
    policy: Option<ExpiryPolicy>,
    state: Mutex<ProviderState>,
    session: watch::Sender<SessionState>,
}

#[derive(Default)]
struct ProviderState {
    in_flight: Option<InFlightRefresh>,
    /// Bumped whenever the stored session is replaced or cleared, so a
    /// refresh started for an older session never installs its result.
    epoch: u64,
}

struct InFlightRefresh {
    future: RefreshFuture,
    abort: AbortHandle,
}

impl TokenProvider {
    /// Create a provider over a store and a refresher.
    pub fn new(store: impl TokenStore + 'static, refresher: impl TokenRefresher + 'static) -> Self {
        Self::with_policy(Arc::new(store), Arc::new(refresher), None)
    }

    /// Create a provider that decides staleness with `policy` instead of
    /// asking the refresher.
    pub fn with_expiry_policy(
        store: impl TokenStore + 'static,
        refresher: impl TokenRefresher + 'static,
        policy: ExpiryPolicy,
    ) -> Self {
        Self::with_policy(Arc::new(store), Arc::new(refresher), Some(policy))
    }

    fn with_policy(
        store: Arc<dyn TokenStore>,
        refresher: Arc<dyn TokenRefresher>,
        policy: Option<ExpiryPolicy>,
    ) -> Self {
        let initial = if store.is_authenticated() {
            SessionState::LoggedIn
        } else {
            SessionState::LoggedOut
        };
        let (session, _) = watch::channel(initial);

        Self {
            inner: Arc::new(ProviderInner {
                store,
                refresher,
                policy,
                state: Mutex::new(ProviderState::default()),
                session,
            }),
        }
    }

    /// Return a usable access credential.
    ///
    /// Joins a refresh that is already in flight. Otherwise starts one when
    /// `force_refresh` is set or the expiry policy says the stored token is
    /// stale. If the refresh is abandoned because [`store_token`] installed
    /// a new session, the new session's token is returned instead.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NotLoggedIn`] if no token is stored
    /// - [`AuthError::NoRefreshToken`] if a refresh is needed but impossible
    /// - [`AuthError::AuthorizationFailed`] if the refresh call failed
    ///
    /// [`store_token`]: TokenProvider::store_token
    #[instrument(skip(self))]
    pub async fn get_access_token(&self, force_refresh: bool) -> Result<AccessToken> {
        match self.access_token(force_refresh).await {
            Err(Error::Auth(AuthError::NotLoggedIn)) if self.is_authenticated() => {
                debug!("Refresh abandoned for a new session");
                self.access_token(false).await
            }
            result => result,
        }
    }

    async fn access_token(&self, force_refresh: bool) -> Result<AccessToken> {
        let refresh = {
            let mut state = self.inner.state.lock().await;
            let joined = state.in_flight.as_ref().map(|f| f.future.clone());
            match joined {
                Some(future) => {
                    debug!("Joining in-flight refresh");
                    future
                }
                None => {
                    let token = self.inner.store.read().ok_or(AuthError::NotLoggedIn)?;
                    if !force_refresh && !self.inner.needs_refresh(&token) {
                        return Ok(token.access);
                    }
                    self.start_refresh(&mut state, token)?
                }
            }
        };

        let token = refresh.await?;
        Ok(token.access)
    }

    /// Return the current refresh credential without ever refreshing.
    #[instrument(skip(self))]
    pub async fn get_refresh_token(&self) -> Result<RefreshToken> {
        let _state = self.inner.state.lock().await;
        let token = self.inner.store.read().ok_or(AuthError::NotLoggedIn)?;
        token.refresh.ok_or_else(|| AuthError::NoRefreshToken.into())
    }

    /// Install a token obtained from a login flow.
    ///
    /// Any refresh running for the previous session is abandoned; callers
    /// waiting on it receive the new session's access token.
    #[instrument(skip(self, token))]
    pub async fn store_token(&self, token: Token) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        state.epoch += 1;
        if let Some(in_flight) = state.in_flight.take() {
            in_flight.abort.abort();
        }
        self.inner.store.write(Some(token))?;
        self.inner.session.send_replace(SessionState::LoggedIn);
        info!("Session token stored");
        Ok(())
    }

    /// Clear the stored token.
    ///
    /// Subsequent getters fail with [`AuthError::NotLoggedIn`]. A refresh in
    /// flight is aborted and its awaiters receive the same error.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        state.epoch += 1;
        if let Some(in_flight) = state.in_flight.take() {
            debug!("Aborting in-flight refresh");
            in_flight.abort.abort();
        }
        self.inner.session.send_replace(SessionState::LoggedOut);
        self.inner.store.write(None)?;
        info!("Logged out");
        Ok(())
    }

    /// Returns a snapshot of the stored token.
    pub async fn current_token(&self) -> Option<Token> {
        let _state = self.inner.state.lock().await;
        self.inner.store.read()
    }

    pub fn session_state(&self) -> SessionState {
        *self.inner.session.borrow()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session_state() != SessionState::LoggedOut
    }

    /// Subscribe to session state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.session.subscribe()
    }

    /// Spawn the refresh task and publish its handle. Called with the state lock held.
    fn start_refresh(&self, state: &mut ProviderState, token: Token) -> Result<RefreshFuture> {
        if !token.can_refresh() {
            warn!("Token needs refreshing but has no refresh credential");
            return Err(AuthError::NoRefreshToken.into());
        }

        info!("Refreshing token");
        self.inner.session.send_replace(SessionState::Refreshing);

        let epoch = state.epoch;
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let result = inner.refresher.refresh(&token).await;
            inner.finish_refresh(epoch, result).await
        });

        let abort = task.abort_handle();
        let future = task.map(flatten_join).boxed().shared();
        state.in_flight = Some(InFlightRefresh {
            future: future.clone(),
            abort,
        });
        Ok(future)
    }
}

impl ProviderInner {
    fn needs_refresh(&self, token: &Token) -> bool {
        let now = Utc::now();
        match &self.policy {
            Some(policy) => policy.needs_refresh(token, now),
            None => self.refresher.needs_refresh(token, now),
        }
    }

    /// Install a refresh result and clear the in-flight handle.
    async fn finish_refresh(&self, epoch: u64, result: Result<Token>) -> Result<Token> {
        let mut state = self.state.lock().await;
        if state.epoch != epoch {
            debug!("Discarding refresh result for a replaced session");
            return Err(AuthError::NotLoggedIn.into());
        }
        state.in_flight = None;
        self.session.send_replace(SessionState::LoggedIn);

        match result {
            Ok(token) => {
                self.store
                    .write(Some(token.clone()))
                    .map_err(AuthError::authorization_failed)?;
                info!("Token refreshed");
                Ok(token)
            }
            Err(err) => {
                warn!(error = %err, "Token refresh failed");
                Err(AuthError::authorization_failed(err).into())
            }
        }
    }
}

fn flatten_join(joined: std::result::Result<Result<Token>, JoinError>) -> Result<Token> {
    match joined {
        Ok(result) => result,
        Err(err) if err.is_cancelled() => Err(AuthError::NotLoggedIn.into()),
        Err(err) => Err(AuthError::authorization_failed(Error::Transport(
            TransportError::Http {
                message: format!("refresh task failed: {}", err),
            },
        ))
        .into()),
    }
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("state", &self.session_state())
            .field("token", &"[REDACTED]")
            .finish()
    }
}
