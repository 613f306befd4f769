//! Authentication coordinator.
//!
//! Owns the live [`AuthState`] and funnels every token-changing
//! operation (refresh, login, logout) through the single-flight
//! primitive, so concurrent requests for the same operation collapse
//! into one execution whose outcome every caller shares.
//!
//! Token validity is a small state machine: no token, valid token,
//! expired token, refresh in flight. `get_access_token` answers from the
//! valid state without suspending; every other state funnels into the
//! shared refresh.

use std::sync::Arc;

use beacon_domain::{ApiError, AuthState};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::api::classify;
use crate::auth::AuthStateStore;
use crate::ports::{AuthLibrary, AuthLibraryError, Clock, StateStorage};
use crate::single_flight::SingleFlight;

/// Seconds subtracted from the stored expiry when judging validity, so a
/// token about to lapse mid-request already counts as expired.
const EXPIRY_SKEW_SECONDS: i64 = 30;

const REFRESH_KEY: &str = "refresh";
const LOGIN_KEY: &str = "login";
const LOGOUT_KEY: &str = "logout";

type TokenOutcome = Result<String, ApiError>;

/// Coordinates token acquisition, refresh and invalidation.
///
/// Cheap to clone; clones share the same state. One coordinator is
/// constructed at startup and handed to every component that needs
/// tokens — there is deliberately no process-wide instance.
pub struct AuthCoordinator<A, S, C> {
    inner: Arc<Inner<A, S, C>>,
}

impl<A, S, C> Clone for AuthCoordinator<A, S, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<A, S, C> {
    auth: A,
    store: AuthStateStore<S>,
    clock: C,
    state: RwLock<AuthState>,
    token_flights: SingleFlight<TokenOutcome>,
    logout_flights: SingleFlight<Result<(), ApiError>>,
}

impl<A, S, C> AuthCoordinator<A, S, C>
where
    A: AuthLibrary + 'static,
    S: StateStorage + 'static,
    C: Clock + 'static,
{
    /// Creates a coordinator starting from the empty state.
    #[must_use]
    pub fn new(auth: A, store: AuthStateStore<S>, clock: C) -> Self {
        Self::with_state(auth, store, clock, AuthState::empty())
    }

    /// Creates a coordinator hydrated from the persisted state.
    pub async fn load(auth: A, store: AuthStateStore<S>, clock: C) -> Self {
        let state = store.load().await;
        Self::with_state(auth, store, clock, state)
    }

    fn with_state(auth: A, store: AuthStateStore<S>, clock: C, state: AuthState) -> Self {
        Self {
            inner: Arc::new(Inner {
                auth,
                store,
                clock,
                state: RwLock::new(state),
                token_flights: SingleFlight::new(),
                logout_flights: SingleFlight::new(),
            }),
        }
    }

    /// Returns a valid access token, refreshing when needed.
    ///
    /// The fast path — a cached, unexpired token — completes without
    /// suspending beyond the state read lock.
    ///
    /// # Errors
    ///
    /// [`ApiError`] with [`ErrorCode::LoginRequired`] when no usable
    /// refresh token is held; otherwise the classified refresh failure.
    ///
    /// [`ErrorCode::LoginRequired`]: beacon_domain::ErrorCode::LoginRequired
    pub async fn get_access_token(&self) -> TokenOutcome {
        {
            let state = self.inner.state.read().await;
            if let Some(token) =
                state.valid_access_token(self.inner.clock.now(), EXPIRY_SKEW_SECONDS)
            {
                return Ok(token.to_string());
            }
        }

        self.refresh_access_token().await
    }

    /// Exchanges the held refresh token for a new access token.
    ///
    /// Concurrent calls collapse into one exchange; every caller
    /// receives the same token or the same classified error. A rejected
    /// refresh token clears the whole state, so the next attempt reports
    /// login-required instead of retrying a dead credential.
    ///
    /// # Errors
    ///
    /// The classified refresh failure, shared by all concurrent callers.
    pub async fn refresh_access_token(&self) -> TokenOutcome {
        let inner = Arc::clone(&self.inner);
        let outcome = self
            .inner
            .token_flights
            .execute(REFRESH_KEY, move || async move { inner.refresh_once().await })
            .await;

        match outcome {
            Ok(result) => result,
            Err(_) => Err(classify::from_single_flight_abort(REFRESH_KEY)),
        }
    }

    /// Blanks the access token and its expiry, keeping the refresh
    /// token, and persists the trimmed snapshot.
    ///
    /// The next token request then goes through a silent refresh. This
    /// is the "simulate expired token" hook used by test and demo
    /// surfaces.
    pub async fn clear_access_token(&self) {
        self.inner
            .update(AuthState::without_access_token)
            .await;
    }

    /// Runs the interactive login flow, replacing the state wholesale.
    ///
    /// Concurrent calls collapse into one flow.
    ///
    /// # Errors
    ///
    /// The classified login failure, shared by all concurrent callers.
    pub async fn login(&self) -> TokenOutcome {
        let inner = Arc::clone(&self.inner);
        let outcome = self
            .inner
            .token_flights
            .execute(LOGIN_KEY, move || async move { inner.login_once().await })
            .await;

        match outcome {
            Ok(result) => result,
            Err(_) => Err(classify::from_single_flight_abort(LOGIN_KEY)),
        }
    }

    /// Runs the interactive logout flow and clears the state.
    ///
    /// Local state clears even when the provider-side logout fails;
    /// only the classified failure is reported back.
    ///
    /// # Errors
    ///
    /// The classified logout failure, shared by all concurrent callers.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let inner = Arc::clone(&self.inner);
        let outcome = self
            .inner
            .logout_flights
            .execute(LOGOUT_KEY, move || async move { inner.logout_once().await })
            .await;

        match outcome {
            Ok(result) => result,
            Err(_) => Err(classify::from_single_flight_abort(LOGOUT_KEY)),
        }
    }

    /// Snapshot of the current state, for diagnostics and tests.
    pub async fn current_state(&self) -> AuthState {
        self.inner.state.read().await.clone()
    }
}

impl<A, S, C> Inner<A, S, C>
where
    A: AuthLibrary,
    S: StateStorage,
    C: Clock,
{
    async fn refresh_once(&self) -> TokenOutcome {
        let Some(refresh_token) = self.state.read().await.refresh_token.clone() else {
            return Err(ApiError::login_required());
        };

        match self.auth.refresh_token(&refresh_token).await {
            Ok(grant) => {
                let token = grant.access_token.clone();
                let mut next = AuthState::from_grant(&grant, self.clock.now());
                if next.refresh_token.is_none() {
                    // RFC 6749 §6: a refresh response may omit the
                    // refresh token; the previous one stays valid.
                    next.refresh_token = Some(refresh_token);
                }
                self.update(move |_| next).await;
                debug!("access token refreshed");
                Ok(token)
            }
            Err(error) => {
                if matches!(
                    error,
                    AuthLibraryError::TokenRenewal {
                        invalid_grant: true,
                        ..
                    }
                ) {
                    warn!("refresh token rejected by the provider, clearing auth state");
                    self.update(|_| AuthState::empty()).await;
                }
                Err(classify::from_auth_failure(&error))
            }
        }
    }

    async fn login_once(&self) -> TokenOutcome {
        match self.auth.begin_interactive_login().await {
            Ok(grant) => {
                let token = grant.access_token.clone();
                let next = AuthState::from_grant(&grant, self.clock.now());
                self.update(move |_| next).await;
                debug!("interactive login completed");
                Ok(token)
            }
            Err(error) => Err(classify::from_auth_failure(&error)),
        }
    }

    async fn logout_once(&self) -> Result<(), ApiError> {
        let id_token = self.state.read().await.id_token.clone();
        let result = self.auth.begin_interactive_logout(id_token.as_deref()).await;

        match result {
            Ok(()) => {
                self.update(|_| AuthState::empty()).await;
                debug!("logout completed");
                Ok(())
            }
            Err(error) => {
                warn!(%error, "provider-side logout failed, clearing local session anyway");
                self.update(|_| AuthState::empty()).await;
                Err(classify::from_auth_failure(&error))
            }
        }
    }

    /// Replaces the state wholesale and persists the new snapshot.
    ///
    /// The in-memory copy is installed first and stays authoritative:
    /// a persistence failure is logged and the process continues with
    /// in-memory tokens for its remaining lifetime.
    async fn update(&self, next: impl FnOnce(&AuthState) -> AuthState) -> AuthState {
        let snapshot = {
            let mut state = self.state.write().await;
            let snapshot = next(&state);
            *state = snapshot.clone();
            snapshot
        };

        // Persist outside the state lock; the store has its own, narrower
        // lock around the write itself.
        let persisted = if snapshot.is_empty() {
            self.store.clear().await
        } else {
            self.store.save(&snapshot).await
        };
        if let Err(error) = persisted {
            warn!(%error, "auth state not persisted, continuing in-memory");
        }

        snapshot
    }
}
