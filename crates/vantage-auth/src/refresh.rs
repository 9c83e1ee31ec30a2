//! Proactive token refresh
//!
//! Owns a per-session timer that exchanges the refresh token shortly before
//! the access token expires, retries with exponential backoff on failure,
//! and notifies registered observers. The session moves through
//! `Idle -> Scheduled -> Refreshing -> {Scheduled | RetryPending} -> Stopped`;
//! one tokio task drives the whole lifecycle, so at most one exchange is
//! ever in flight per session.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::codec::decode_token;
use crate::error::{AuthError, AuthResult};
use crate::exchange::{TokenExchanger, TokenResponse};

/// Tuning for a refresh session.
#[derive(Debug, Clone)]
pub struct RefreshOptions {
    /// How long before expiry the refresh fires.
    pub lookahead: Duration,

    /// Failed attempts after which the session stops and reports
    /// exhaustion.
    pub max_retries: u32,

    /// Base of the exponential backoff between failed attempts.
    pub backoff_base: Duration,

    /// Upper bound on any single backoff delay.
    pub backoff_cap: Duration,
}

impl Default for RefreshOptions {
    fn default() -> Self {
        Self {
            lookahead: Duration::from_secs(60),
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
            backoff_cap: Duration::from_secs(60),
        }
    }
}

/// Removal token returned by observer registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type RefreshObserver = Arc<dyn Fn(&TokenResponse) + Send + Sync>;
type ErrorObserver = Arc<dyn Fn(&AuthError) + Send + Sync>;

#[derive(Default)]
struct Observers {
    refresh: Mutex<Vec<(ObserverId, RefreshObserver)>>,
    error: Mutex<Vec<(ObserverId, ErrorObserver)>>,
    next_id: AtomicU64,
}

impl Observers {
    fn next_id(&self) -> ObserverId {
        ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Invoke every refresh observer. A panicking observer is caught and
    /// swallowed so siblings still run and the schedule survives.
    fn notify_refresh(&self, response: &TokenResponse) {
        let snapshot: Vec<RefreshObserver> = self
            .refresh
            .lock()
            .unwrap()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in snapshot {
            let result =
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| observer(response)));
            if result.is_err() {
                warn!("refresh observer panicked; continuing with remaining observers");
            }
        }
    }

    fn notify_error(&self, err: &AuthError) {
        let snapshot: Vec<ErrorObserver> = self
            .error
            .lock()
            .unwrap()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in snapshot {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| observer(err)));
            if result.is_err() {
                warn!("error observer panicked; continuing with remaining observers");
            }
        }
    }

    fn remove(&self, id: ObserverId) {
        self.refresh.lock().unwrap().retain(|(i, _)| *i != id);
        self.error.lock().unwrap().retain(|(i, _)| *i != id);
    }
}

/// One enabled auto-refresh session. Owns its timer exclusively; stopping
/// is an explicit state transition, not garbage collection of a callback.
struct Session {
    id: Uuid,
    active: Arc<AtomicBool>,
    stop: Arc<Notify>,
    _task: JoinHandle<()>,
}

/// Schedules proactive refresh exchanges for one credential.
///
/// Observers registered here outlive individual sessions: disabling and
/// re-enabling auto-refresh keeps the registration list intact.
pub struct RefreshScheduler {
    exchanger: Arc<dyn TokenExchanger>,
    options: RefreshOptions,
    observers: Arc<Observers>,
    session: Mutex<Option<Session>>,
}

impl RefreshScheduler {
    /// Create an idle scheduler around a token-exchange collaborator.
    pub fn new(exchanger: Arc<dyn TokenExchanger>, options: RefreshOptions) -> Self {
        Self {
            exchanger,
            options,
            observers: Arc::new(Observers::default()),
            session: Mutex::new(None),
        }
    }

    /// Arm the schedule from an access token's expiry.
    ///
    /// The first exchange fires `lookahead` before the token expires (or
    /// immediately if that moment already passed). Re-enabling replaces
    /// any previous session. Fails when the access token cannot be
    /// decoded, since there is no expiry to schedule against.
    pub fn enable(&self, access_token: &str, refresh_token: impl Into<String>) -> AuthResult<()> {
        let claims = decode_token(access_token)?;
        let delay = delay_until_refresh(claims.exp, self.options.lookahead);

        self.stop();

        let id = Uuid::now_v7();
        let active = Arc::new(AtomicBool::new(true));
        let stop = Arc::new(Notify::new());

        debug!(session = %id, delay_secs = delay.as_secs(), "auto-refresh enabled");

        let task = tokio::spawn(run_session(
            Arc::clone(&self.exchanger),
            self.options.clone(),
            Arc::clone(&self.observers),
            Arc::clone(&active),
            Arc::clone(&stop),
            refresh_token.into(),
            delay,
        ));

        *self.session.lock().unwrap() = Some(Session {
            id,
            active,
            stop,
            _task: task,
        });
        Ok(())
    }

    /// Stop the session and cancel any pending timer. Idempotent.
    pub fn stop(&self) {
        if let Some(session) = self.session.lock().unwrap().take() {
            debug!(session = %session.id, "auto-refresh stopped");
            session.active.store(false, Ordering::SeqCst);
            session.stop.notify_one();
        }
    }

    /// Whether the session can still fire.
    pub fn is_active(&self) -> bool {
        self.session
            .lock()
            .unwrap()
            .as_ref()
            .map(|session| session.active.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    /// Register an observer invoked after every successful refresh.
    pub fn on_refresh(
        &self,
        observer: impl Fn(&TokenResponse) + Send + Sync + 'static,
    ) -> ObserverId {
        let id = self.observers.next_id();
        self.observers
            .refresh
            .lock()
            .unwrap()
            .push((id, Arc::new(observer)));
        id
    }

    /// Register an observer invoked when the session stops on its own
    /// (retries exhausted, or an undecodable refreshed token). Invoked at
    /// most once per session.
    pub fn on_error(&self, observer: impl Fn(&AuthError) + Send + Sync + 'static) -> ObserverId {
        let id = self.observers.next_id();
        self.observers
            .error
            .lock()
            .unwrap()
            .push((id, Arc::new(observer)));
        id
    }

    /// Remove a previously registered observer.
    pub fn unsubscribe(&self, id: ObserverId) {
        self.observers.remove(id);
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// `max(expiry - now - lookahead, 0)`.
fn delay_until_refresh(exp: i64, lookahead: Duration) -> Duration {
    let now = Utc::now().timestamp();
    let secs = exp - now - lookahead.as_secs() as i64;
    if secs <= 0 {
        Duration::ZERO
    } else {
        Duration::from_secs(secs as u64)
    }
}

async fn run_session(
    exchanger: Arc<dyn TokenExchanger>,
    options: RefreshOptions,
    observers: Arc<Observers>,
    active: Arc<AtomicBool>,
    stop: Arc<Notify>,
    mut refresh_token: String,
    mut delay: Duration,
) {
    let mut retries: u32 = 0;

    loop {
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = stop.notified() => {}
        }
        // The timer may fire after stop(); the flag decides, not the timer.
        if !active.load(Ordering::SeqCst) {
            return;
        }

        match exchanger.exchange_refresh_token(&refresh_token).await {
            Ok(response) => {
                if !active.load(Ordering::SeqCst) {
                    return;
                }
                retries = 0;
                if let Some(ref rotated) = response.refresh_token {
                    refresh_token = rotated.clone();
                }
                observers.notify_refresh(&response);

                match decode_token(&response.access_token) {
                    Ok(claims) => {
                        delay = delay_until_refresh(claims.exp, options.lookahead);
                        debug!(delay_secs = delay.as_secs(), "refresh succeeded, re-armed");
                    }
                    Err(err) => {
                        // No expiry to schedule against; the session cannot
                        // continue.
                        warn!(error = %err, "refreshed access token is undecodable, stopping");
                        active.store(false, Ordering::SeqCst);
                        observers.notify_error(&err);
                        return;
                    }
                }
            }
            Err(err) => {
                if !active.load(Ordering::SeqCst) {
                    return;
                }
                retries += 1;
                if retries >= options.max_retries {
                    error!(retries, error = %err, "refresh retries exhausted, stopping");
                    active.store(false, Ordering::SeqCst);
                    observers.notify_error(&err);
                    return;
                }
                let backoff = options
                    .backoff_base
                    .saturating_mul(2u32.saturating_pow(retries));
                delay = backoff.min(options.backoff_cap);
                warn!(
                    retries,
                    delay_ms = delay.as_millis() as u64,
                    "refresh failed, backing off with the same refresh token"
                );
            }
        }
    }
}
