//! Session and authentication state management.
//!
//! The [`SessionManager`] owns the only mutable session state in the
//! process: the current user, the bearer token, the loading/anonymous/
//! authenticated status and the connectivity flag. Consumers read it
//! through a `tokio::sync::watch` channel, so every transition is
//! visible before the operation that caused it returns.
//!
//! Concurrency model: mutating operations that suspend on the network
//! (`restore`, `login`, `register`, `refresh`) serialize on an internal
//! async mutex. `logout` bypasses the queue and applies immediately.
//! Each state transition bumps a generation counter; an operation records
//! the generation before its suspension points and discards its result if
//! the generation moved in the meantime, so a late restore/login response
//! can never overwrite a completed logout.

pub mod store;

pub use store::TokenStore;

use crate::api::{
    ApiClient, ApiError, ClientCreate, ClientRecord, DashboardSummary, Invoice, InvoiceCreate,
    MessageResponse, Notification, ProfileRequest, User, UserProfile,
};
use crate::{Error, Result};
use tokio::sync::{Mutex, watch};
use tracing::{debug, warn};

/// Authentication status of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Initial restore attempt has not completed yet. Entered once per
    /// process, at startup, and left exactly once.
    Loading,
    /// No valid credentials.
    Anonymous,
    /// A validated user and token are present.
    Authenticated,
}

/// Last observed reachability of the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Online,
    Offline,
}

/// Immutable snapshot of the session state.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: Option<User>,
    pub token: Option<String>,
    pub status: SessionStatus,
    pub connectivity: Connectivity,
    /// Bumped on every applied auth transition. Used to discard late
    /// responses from superseded operations.
    pub generation: u64,
}

impl Session {
    fn initial() -> Self {
        Self {
            user: None,
            token: None,
            status: SessionStatus::Loading,
            connectivity: Connectivity::Online,
            generation: 0,
        }
    }

    /// Computed, never stored: authenticated means a validated user and
    /// token are both present.
    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }

    pub fn is_online(&self) -> bool {
        self.connectivity == Connectivity::Online
    }
}

/// Owner of the session state machine.
///
/// Constructed once at startup and passed down explicitly; there is no
/// global session. All authenticated resource calls go through this type
/// so a 401 anywhere takes the same forced-logout path as an explicit
/// [`logout`](Self::logout).
#[derive(Debug)]
pub struct SessionManager {
    api: ApiClient,
    store: TokenStore,
    state: watch::Sender<Session>,
    op_lock: Mutex<()>,
}

impl SessionManager {
    pub fn new(api: ApiClient, store: TokenStore) -> Self {
        let (state, _) = watch::channel(Session::initial());
        Self {
            api,
            store,
            state,
            op_lock: Mutex::new(()),
        }
    }

    /// Subscribe to session state changes. The receiver yields an error
    /// once the manager is dropped, which is the "read outside an active
    /// session scope" failure.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Current session snapshot.
    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    fn generation(&self) -> u64 {
        self.state.borrow().generation
    }

    /// Apply a transition only if the session generation is still `gen`.
    /// Returns false when a concurrent transition superseded this one.
    fn apply(&self, r#gen: u64, f: impl FnOnce(&mut Session)) -> bool {
        let mut applied = false;
        self.state.send_modify(|session| {
            if session.generation == r#gen {
                f(session);
                session.generation += 1;
                applied = true;
            }
        });
        if !applied {
            debug!(r#gen, "discarding superseded session transition");
        }
        applied
    }

    /// Connectivity is advisory: updating it neither bumps the generation
    /// nor competes with auth transitions.
    fn set_connectivity(&self, connectivity: Connectivity) {
        self.state.send_if_modified(|session| {
            if session.connectivity == connectivity {
                false
            } else {
                session.connectivity = connectivity;
                true
            }
        });
    }

    /// The single "drop the session" path: explicit logout, forced logout
    /// on 401 and failed restore all come through here. Storage clear is
    /// best-effort.
    fn drop_session(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "failed to clear stored token");
        }
        self.state.send_modify(|session| {
            session.user = None;
            session.token = None;
            session.status = SessionStatus::Anonymous;
            session.generation += 1;
        });
    }

    // ---- State machine operations ----

    /// Attempt to resume a previous session from the stored token.
    ///
    /// No stored token: transitions to Anonymous without any network
    /// call. Otherwise the token is validated against `/auth/me`; any
    /// failure (401, server error, offline) purges the stored token and
    /// lands Anonymous. Always completes the Loading state, and is
    /// idempotent when called again.
    pub async fn restore(&self) -> Session {
        let _guard = self.op_lock.lock().await;
        let r#gen = self.generation();

        let Some(token) = self.store.load() else {
            self.apply(r#gen, |session| {
                session.user = None;
                session.token = None;
                session.status = SessionStatus::Anonymous;
            });
            return self.snapshot();
        };

        match self.api.me(&token).await {
            Ok(user) => {
                self.set_connectivity(Connectivity::Online);
                self.apply(r#gen, |session| {
                    session.user = Some(user);
                    session.token = Some(token);
                    session.status = SessionStatus::Authenticated;
                });
            }
            Err(err) => {
                debug!(error = %err, "session restore failed");
                if err.is_offline() {
                    self.set_connectivity(Connectivity::Offline);
                }
                if self.apply(r#gen, |session| {
                    session.user = None;
                    session.token = None;
                    session.status = SessionStatus::Anonymous;
                }) {
                    // The stored token is proven unusable.
                    if let Err(e) = self.store.clear() {
                        warn!(error = %e, "failed to clear stored token");
                    }
                }
            }
        }

        self.snapshot()
    }

    /// Authenticate with credentials. On failure the prior state is left
    /// untouched; the session never flickers through Authenticated.
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ApiError::Validation("Email et mot de passe requis".to_string()).into());
        }

        let _guard = self.op_lock.lock().await;
        let r#gen = self.generation();

        let auth = match self.api.login(email, password).await {
            Ok(auth) => auth,
            Err(err) => return Err(self.track_failure(err)),
        };
        self.set_connectivity(Connectivity::Online);

        // Persist before publishing so an authenticated snapshot always
        // has its durable mirror.
        self.store.save(&auth.access_token)?;

        let user = auth.user.clone();
        if self.apply(r#gen, |session| {
            session.user = Some(auth.user);
            session.token = Some(auth.access_token);
            session.status = SessionStatus::Authenticated;
        }) {
            Ok(user)
        } else {
            // A logout landed while we were waiting on the network; it
            // wins, and the token we just saved must not survive it.
            if let Err(e) = self.store.clear() {
                warn!(error = %e, "failed to clear stored token");
            }
            Err(Error::Superseded)
        }
    }

    /// Create an account. Same contract as [`login`](Self::login); the
    /// returned user starts with `is_onboarded == false`.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<User> {
        if email.trim().is_empty()
            || password.is_empty()
            || first_name.trim().is_empty()
            || last_name.trim().is_empty()
        {
            return Err(ApiError::Validation("Tous les champs sont requis".to_string()).into());
        }

        let _guard = self.op_lock.lock().await;
        let r#gen = self.generation();

        let auth = match self.api.register(email, password, first_name, last_name).await {
            Ok(auth) => auth,
            Err(err) => return Err(self.track_failure(err)),
        };
        self.set_connectivity(Connectivity::Online);

        self.store.save(&auth.access_token)?;

        let user = auth.user.clone();
        if self.apply(r#gen, |session| {
            session.user = Some(auth.user);
            session.token = Some(auth.access_token);
            session.status = SessionStatus::Authenticated;
        }) {
            Ok(user)
        } else {
            if let Err(e) = self.store.clear() {
                warn!(error = %e, "failed to clear stored token");
            }
            Err(Error::Superseded)
        }
    }

    /// End the session. Never fails outwardly, even if the storage clear
    /// errors. Applies immediately, without waiting behind in-flight
    /// operations; their late responses are discarded by the generation
    /// check.
    pub fn logout(&self) {
        self.drop_session();
    }

    /// Re-validate the current token against `/auth/me` and pull the
    /// fresh user record (e.g. after onboarding completes server-side).
    /// Unlike [`restore`](Self::restore) this never re-enters Loading,
    /// and a non-401 failure leaves the state untouched.
    pub async fn refresh(&self) -> Result<User> {
        let _guard = self.op_lock.lock().await;
        let r#gen = self.generation();
        let token = self.require_token()?;

        match self.api.me(&token).await {
            Ok(user) => {
                self.set_connectivity(Connectivity::Online);
                self.apply(r#gen, |session| {
                    session.user = Some(user.clone());
                });
                Ok(user)
            }
            Err(err) => Err(self.track_failure(err)),
        }
    }

    // ---- Authenticated resource calls ----
    //
    // Thin wrappers that attach the session token and route every
    // outcome through `track_*`, so a 401 from any endpoint forces the
    // logout path exactly once.

    pub async fn get_profile(&self) -> Result<UserProfile> {
        let token = self.require_token()?;
        self.track(self.api.get_profile(&token).await)
    }

    pub async fn create_profile(&self, profile: &ProfileRequest) -> Result<UserProfile> {
        let token = self.require_token()?;
        self.track(self.api.create_profile(&token, profile).await)
    }

    pub async fn update_profile(&self, profile: &ProfileRequest) -> Result<UserProfile> {
        let token = self.require_token()?;
        self.track(self.api.update_profile(&token, profile).await)
    }

    pub async fn list_invoices(&self) -> Result<Vec<Invoice>> {
        let token = self.require_token()?;
        self.track(self.api.list_invoices(&token).await)
    }

    pub async fn create_invoice(&self, invoice: &InvoiceCreate) -> Result<Invoice> {
        let token = self.require_token()?;
        self.track(self.api.create_invoice(&token, invoice).await)
    }

    pub async fn update_invoice_status(
        &self,
        invoice_id: &str,
        status: &str,
    ) -> Result<MessageResponse> {
        let token = self.require_token()?;
        self.track(self.api.update_invoice_status(&token, invoice_id, status).await)
    }

    pub async fn invoice_pdf(&self, invoice_id: &str) -> Result<Vec<u8>> {
        let token = self.require_token()?;
        self.track(self.api.invoice_pdf(&token, invoice_id).await)
    }

    pub async fn list_clients(&self) -> Result<Vec<ClientRecord>> {
        let token = self.require_token()?;
        self.track(self.api.list_clients(&token).await)
    }

    pub async fn create_client(&self, client: &ClientCreate) -> Result<ClientRecord> {
        let token = self.require_token()?;
        self.track(self.api.create_client(&token, client).await)
    }

    pub async fn dashboard(&self) -> Result<DashboardSummary> {
        let token = self.require_token()?;
        self.track(self.api.dashboard(&token).await)
    }

    pub async fn list_notifications(&self) -> Result<Vec<Notification>> {
        let token = self.require_token()?;
        self.track(self.api.list_notifications(&token).await)
    }

    pub async fn mark_notification_read(&self, notification_id: &str) -> Result<MessageResponse> {
        let token = self.require_token()?;
        self.track(self.api.mark_notification_read(&token, notification_id).await)
    }

    pub async fn init_obligations(&self) -> Result<MessageResponse> {
        let token = self.require_token()?;
        self.track(self.api.init_obligations(&token).await)
    }

    pub async fn schedule_notifications(&self) -> Result<MessageResponse> {
        let token = self.require_token()?;
        self.track(self.api.schedule_notifications(&token).await)
    }

    // ---- Internals ----

    fn require_token(&self) -> Result<String> {
        self.state
            .borrow()
            .token
            .clone()
            .ok_or_else(|| ApiError::Validation("Non connecté".to_string()).into())
    }

    /// Classify the outcome of an authenticated call: update the
    /// connectivity flag, and on 401 drop the session before surfacing
    /// the error.
    fn track<T>(&self, result: std::result::Result<T, ApiError>) -> Result<T> {
        match result {
            Ok(value) => {
                self.set_connectivity(Connectivity::Online);
                Ok(value)
            }
            Err(err) => Err(self.track_failure(err)),
        }
    }

    fn track_failure(&self, err: ApiError) -> Error {
        match &err {
            ApiError::Offline => self.set_connectivity(Connectivity::Offline),
            ApiError::Auth(_) => {
                self.set_connectivity(Connectivity::Online);
                self.drop_session();
            }
            _ => self.set_connectivity(Connectivity::Online),
        }
        err.into()
    }
}
