//! Magic-link session polling.
//!
//! # Design
//! - One table entry per live attempt; the entry owns the cancel trigger.
//!   Removing the entry (cancel, supersede, completion) is the single way an
//!   attempt ends, and a drop guard removes it on every exit path.
//! - The poll loop is one future: the interval, the lifetime deadline and the
//!   cancel receiver are locals, so returning releases all of them at once.
//! - Cancellation and the deadline are checked before each tick and raced
//!   against each in-flight status check, with priority over the tick.
//! - Status-check errors are transient: logged and retried on the next tick.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use arco_api_models::{AuthStatusSnapshot, SessionKind, TokenPair, User};
use arco_config::SessionSettings;
use arco_gateway::RpcGateway;
use chrono::{DateTime, Utc};
use tokio::sync::oneshot;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};
use tracing::{debug, info, warn};

use crate::error::{SessionError, SessionResult};

/// Callback invoked with every non-terminal status observed while polling.
pub type StatusObserver<'a> = &'a (dyn Fn(&AuthStatusSnapshot) + Send + Sync);

/// Timing of the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    /// Delay between status checks; the first check happens one interval in.
    pub interval: Duration,
    /// Maximum time an attempt may stay pending.
    pub max_lifetime: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self::from(&SessionSettings::default())
    }
}

impl PollerConfig {
    /// Replace a zero interval with the default one.
    ///
    /// A zero lifetime is kept: such attempts simply time out on the first
    /// check of the deadline.
    #[must_use]
    pub fn normalized(self) -> Self {
        if !self.interval.is_zero() {
            return self;
        }
        let interval = Self::default().interval;
        warn!(
            interval_ms = interval.as_millis(),
            "zero poll interval configured; using the default"
        );
        Self { interval, ..self }
    }
}

impl From<&SessionSettings> for PollerConfig {
    fn from(settings: &SessionSettings) -> Self {
        Self {
            interval: settings.poll_interval(),
            max_lifetime: settings.max_lifetime(),
        }
    }
}

/// A started authentication attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Backend-issued identifier.
    pub id: String,
    /// Register or login.
    pub kind: SessionKind,
    /// Email the magic link was sent to.
    pub email: String,
    /// When the attempt started locally.
    pub started_at: DateTime<Utc>,
    /// Backend expiry, when provided.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Terminal success of an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    /// Attempt that succeeded.
    pub session: Session,
    /// Account that signed in.
    pub user: User,
    /// Issued tokens.
    pub tokens: TokenPair,
}

struct PollEntry {
    session: Session,
    cancel: Option<oneshot::Sender<()>>,
    polling: bool,
}

#[derive(Default)]
struct PollTable {
    current: Option<String>,
    entries: HashMap<String, PollEntry>,
}

impl PollTable {
    fn cancel(&mut self, session_id: &str) -> Option<Session> {
        let entry = self.entries.remove(session_id)?;
        if self.current.as_deref() == Some(session_id) {
            self.current = None;
        }
        if let Some(trigger) = entry.cancel {
            let _ = trigger.send(());
        }
        Some(entry.session)
    }

    fn supersede_current(&mut self) -> Option<Session> {
        let current = self.current.take()?;
        self.cancel(&current)
    }
}

/// Runs authentication attempts against the backend.
pub struct SessionPoller {
    gateway: Arc<dyn RpcGateway>,
    config: PollerConfig,
    table: Mutex<PollTable>,
}

impl std::fmt::Debug for SessionPoller {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SessionPoller")
            .field("config", &self.config)
            .field("active", &self.active_count())
            .finish_non_exhaustive()
    }
}

struct PollGuard<'a> {
    poller: &'a SessionPoller,
    session_id: &'a str,
}

impl Drop for PollGuard<'_> {
    fn drop(&mut self) {
        let mut table = self.poller.lock();
        if table.entries.remove(self.session_id).is_some() {
            debug!(session_id = self.session_id, "poll entry released");
        }
        if table.current.as_deref() == Some(self.session_id) {
            table.current = None;
        }
    }
}

impl SessionPoller {
    /// Poller using `gateway` with the given timing.
    ///
    /// A zero interval is replaced by the default (see
    /// [`PollerConfig::normalized`]).
    #[must_use]
    pub fn new(gateway: Arc<dyn RpcGateway>, config: PollerConfig) -> Self {
        Self {
            gateway,
            config: config.normalized(),
            table: Mutex::new(PollTable::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PollTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Timing in effect.
    #[must_use]
    pub const fn config(&self) -> PollerConfig {
        self.config
    }

    /// Ask the backend to send a magic link, superseding any attempt in flight.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Start`] when the backend call fails and
    /// [`SessionError::MissingSessionId`] when it answers without an id.
    pub async fn start_attempt(&self, kind: SessionKind, email: &str) -> SessionResult<Session> {
        let previous = self.lock().supersede_current();
        if let Some(previous) = previous {
            info!(session_id = %previous.id, "superseded previous authentication attempt");
        }

        let started = match kind {
            SessionKind::Register => self.gateway.start_register(email).await,
            SessionKind::Login => self.gateway.start_login(email).await,
        }
        .map_err(|source| SessionError::Start { kind, source })?;

        if started.session_id.trim().is_empty() {
            warn!(%kind, "backend started a session without an identifier");
            return Err(SessionError::MissingSessionId { kind });
        }

        let session = Session {
            id: started.session_id,
            kind,
            email: email.to_string(),
            started_at: Utc::now(),
            expires_at: started.expires_at,
        };
        {
            let mut table = self.lock();
            if let Some(previous) = table.supersede_current() {
                info!(session_id = %previous.id, "superseded previous authentication attempt");
            }
            table.entries.insert(
                session.id.clone(),
                PollEntry {
                    session: session.clone(),
                    cancel: None,
                    polling: false,
                },
            );
            table.current = Some(session.id.clone());
        }
        info!(session_id = %session.id, %kind, "authentication attempt started");
        Ok(session)
    }

    /// Poll until `session` reaches a terminal status, is cancelled, or
    /// outlives the configured lifetime.
    ///
    /// `on_update` sees every `Pending` snapshot. The first status check
    /// happens one interval after the call. The deadline is the configured
    /// lifetime, or the backend's expiry when that is sooner.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Expired`], [`SessionError::Cancelled`] (local
    /// cancel or supersede), [`SessionError::Revoked`] (cancelled on the
    /// backend) or [`SessionError::TimedOut`] for terminal failures,
    /// [`SessionError::NotActive`] when the session is unknown or already
    /// finished, and [`SessionError::AlreadyAwaited`] when another caller is
    /// polling it.
    pub async fn await_completion(
        &self,
        session: &Session,
        on_update: Option<StatusObserver<'_>>,
    ) -> SessionResult<Authenticated> {
        let mut cancelled = self.claim(&session.id)?;
        let _guard = PollGuard {
            poller: self,
            session_id: &session.id,
        };

        let lifetime = self.lifetime(session);
        let deadline = sleep(lifetime);
        tokio::pin!(deadline);
        let mut ticker = interval_at(Instant::now() + self.config.interval, self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut attempt: u32 = 0;

        loop {
            tokio::select! {
                biased;
                _ = &mut cancelled => return Err(self.cancellation(session)),
                () = &mut deadline => return Err(self.timeout(session, lifetime)),
                _ = ticker.tick() => {}
            }

            attempt += 1;
            let checked = tokio::select! {
                biased;
                _ = &mut cancelled => return Err(self.cancellation(session)),
                () = &mut deadline => return Err(self.timeout(session, lifetime)),
                checked = self.gateway.check_auth_status(&session.id) => checked,
            };
            if !self.is_active(&session.id) {
                return Err(self.cancellation(session));
            }

            match checked {
                Ok(AuthStatusSnapshot::Pending) => {
                    debug!(session_id = %session.id, attempt, "authentication still pending");
                    if let Some(observer) = on_update {
                        observer(&AuthStatusSnapshot::Pending);
                    }
                }
                Ok(AuthStatusSnapshot::Authenticated { user, tokens }) => {
                    info!(session_id = %session.id, attempt, "authentication succeeded");
                    return Ok(Authenticated {
                        session: session.clone(),
                        user,
                        tokens,
                    });
                }
                Ok(AuthStatusSnapshot::Expired) => {
                    info!(session_id = %session.id, "authentication session expired");
                    return Err(SessionError::Expired {
                        session_id: session.id.clone(),
                    });
                }
                Ok(AuthStatusSnapshot::Cancelled) => {
                    info!(session_id = %session.id, "authentication session cancelled by backend");
                    return Err(SessionError::Revoked {
                        session_id: session.id.clone(),
                    });
                }
                Err(err) => {
                    warn!(
                        session_id = %session.id,
                        attempt,
                        operation = err.operation(),
                        error = %err,
                        "status check failed; retrying on next tick"
                    );
                }
            }
        }
    }

    /// Stop `session`. Returns whether it was live; unknown sessions are a no-op.
    pub fn cancel(&self, session: &Session) -> bool {
        let cancelled = self.lock().cancel(&session.id);
        if cancelled.is_some() {
            info!(session_id = %session.id, "authentication attempt cancelled");
        }
        cancelled.is_some()
    }

    /// Stop every live attempt.
    pub fn cancel_all(&self) -> usize {
        let mut table = self.lock();
        let ids: Vec<String> = table.entries.keys().cloned().collect();
        let cancelled = ids.iter().filter_map(|id| table.cancel(id)).count();
        drop(table);
        if cancelled > 0 {
            info!(cancelled, "authentication attempts cancelled");
        }
        cancelled
    }

    /// Whether `session_id` is a live attempt.
    #[must_use]
    pub fn is_active(&self, session_id: &str) -> bool {
        self.lock().entries.contains_key(session_id)
    }

    /// Most recently started live attempt.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        let table = self.lock();
        let id = table.current.as_ref()?;
        table.entries.get(id).map(|entry| entry.session.clone())
    }

    /// Number of live attempts.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.lock().entries.len()
    }

    fn claim(&self, session_id: &str) -> SessionResult<oneshot::Receiver<()>> {
        let mut table = self.lock();
        let Some(entry) = table.entries.get_mut(session_id) else {
            return Err(SessionError::NotActive {
                session_id: session_id.to_string(),
            });
        };
        if entry.polling {
            return Err(SessionError::AlreadyAwaited {
                session_id: session_id.to_string(),
            });
        }
        let (trigger, cancelled) = oneshot::channel();
        entry.cancel = Some(trigger);
        entry.polling = true;
        Ok(cancelled)
    }

    fn cancellation(&self, session: &Session) -> SessionError {
        debug!(session_id = %session.id, "poll loop stopped by cancellation");
        SessionError::Cancelled {
            session_id: session.id.clone(),
        }
    }

    /// Time left for `session`: the configured lifetime, cut short by the
    /// backend's expiry when that comes first.
    fn lifetime(&self, session: &Session) -> Duration {
        let Some(expires_at) = session.expires_at else {
            return self.config.max_lifetime;
        };
        let remaining = (expires_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        remaining.min(self.config.max_lifetime)
    }

    fn timeout(&self, session: &Session, lifetime: Duration) -> SessionError {
        warn!(
            session_id = %session.id,
            lifetime_ms = lifetime.as_millis(),
            "authentication attempt timed out"
        );
        SessionError::TimedOut {
            session_id: session.id.clone(),
            lifetime,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use arco_api_models::SessionStart;

    use arco_test_support::fixtures::{
        SAMPLE_EMAIL, authenticated, sample_tokens, sample_user, session_start, settle,
        unavailable,
    };
    use arco_test_support::mocks::{Call, ScriptedGateway};

    fn poller(gateway: &Arc<ScriptedGateway>) -> Arc<SessionPoller> {
        let gateway: Arc<dyn RpcGateway> = gateway.clone();
        Arc::new(SessionPoller::new(
            gateway,
            PollerConfig {
                interval: Duration::from_secs(2),
                max_lifetime: Duration::from_secs(600),
            },
        ))
    }

    fn status_checks(gateway: &ScriptedGateway) -> usize {
        gateway.count(|call| matches!(call, Call::CheckAuthStatus(_)))
    }

    #[tokio::test(start_paused = true)]
    async fn pending_then_authenticated_resolves_once() {
        let gateway = Arc::new(ScriptedGateway::new());
        for _ in 0..3 {
            gateway.queue_auth_status(Ok(AuthStatusSnapshot::Pending));
        }
        gateway.queue_auth_status(Ok(authenticated(1)));
        let poller = poller(&gateway);

        let session = poller
            .start_attempt(SessionKind::Login, SAMPLE_EMAIL)
            .await
            .expect("start");
        let updates = AtomicUsize::new(0);
        let observer = |_: &AuthStatusSnapshot| {
            updates.fetch_add(1, Ordering::SeqCst);
        };
        let started = Instant::now();
        let outcome = poller
            .await_completion(&session, Some(&observer))
            .await
            .expect("authenticated");

        assert_eq!(outcome.user, sample_user());
        assert_eq!(outcome.tokens, sample_tokens(1));
        assert_eq!(updates.load(Ordering::SeqCst), 3);
        assert_eq!(status_checks(&gateway), 4);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(8) && elapsed < Duration::from_secs(9));
        assert_eq!(poller.active_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_first_tick_prevents_any_status_check() {
        let gateway = Arc::new(ScriptedGateway::new());
        let poller = poller(&gateway);
        let session = poller
            .start_attempt(SessionKind::Login, SAMPLE_EMAIL)
            .await
            .expect("start");

        let waiter = {
            let poller = Arc::clone(&poller);
            let session = session.clone();
            tokio::spawn(async move { poller.await_completion(&session, None).await })
        };
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(poller.cancel(&session));
        tokio::time::sleep(Duration::from_secs(10)).await;

        let outcome = waiter.await.expect("join");
        assert!(matches!(outcome, Err(SessionError::Cancelled { .. })));
        assert_eq!(status_checks(&gateway), 0);
        assert_eq!(poller.active_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn lifetime_elapsing_times_out() {
        let gateway = Arc::new(ScriptedGateway::new());
        let gateway_dyn: Arc<dyn RpcGateway> = gateway.clone();
        let poller = SessionPoller::new(
            gateway_dyn,
            PollerConfig {
                interval: Duration::from_secs(2),
                max_lifetime: Duration::from_secs(5),
            },
        );
        let session = poller
            .start_attempt(SessionKind::Register, SAMPLE_EMAIL)
            .await
            .expect("start");

        let outcome = poller.await_completion(&session, None).await;

        assert!(matches!(
            outcome,
            Err(SessionError::TimedOut { lifetime, .. }) if lifetime == Duration::from_secs(5)
        ));
        assert_eq!(status_checks(&gateway), 2);
        assert!(!poller.is_active(&session.id));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_status_check_loses_to_the_deadline() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.queue_auth_status_after(Ok(authenticated(1)), Duration::from_secs(30));
        let gateway_dyn: Arc<dyn RpcGateway> = gateway.clone();
        let poller = SessionPoller::new(
            gateway_dyn,
            PollerConfig {
                interval: Duration::from_secs(2),
                max_lifetime: Duration::from_secs(10),
            },
        );
        let session = poller
            .start_attempt(SessionKind::Login, SAMPLE_EMAIL)
            .await
            .expect("start");

        let outcome = poller.await_completion(&session, None).await;
        assert!(matches!(outcome, Err(SessionError::TimedOut { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_keep_polling() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.queue_auth_status(Err(unavailable("check_auth_status")));
        gateway.queue_auth_status(Err(unavailable("check_auth_status")));
        gateway.queue_auth_status(Ok(AuthStatusSnapshot::Expired));
        let poller = poller(&gateway);
        let session = poller
            .start_attempt(SessionKind::Login, SAMPLE_EMAIL)
            .await
            .expect("start");

        let outcome = poller.await_completion(&session, None).await;

        assert!(matches!(outcome, Err(SessionError::Expired { .. })));
        assert_eq!(status_checks(&gateway), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn backend_cancellation_is_terminal() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.queue_auth_status(Ok(AuthStatusSnapshot::Cancelled));
        let poller = poller(&gateway);
        let session = poller
            .start_attempt(SessionKind::Login, SAMPLE_EMAIL)
            .await
            .expect("start");

        let outcome = poller.await_completion(&session, None).await;
        assert!(matches!(outcome, Err(SessionError::Revoked { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_falls_back_to_the_default() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.queue_auth_status(Ok(AuthStatusSnapshot::Expired));
        let gateway_dyn: Arc<dyn RpcGateway> = gateway.clone();
        let poller = SessionPoller::new(
            gateway_dyn,
            PollerConfig {
                interval: Duration::ZERO,
                max_lifetime: Duration::from_secs(600),
            },
        );
        assert_eq!(poller.config().interval, PollerConfig::default().interval);

        let session = poller
            .start_attempt(SessionKind::Login, SAMPLE_EMAIL)
            .await
            .expect("start");
        let outcome = poller.await_completion(&session, None).await;

        assert!(matches!(outcome, Err(SessionError::Expired { .. })));
        assert_eq!(status_checks(&gateway), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn backend_expiry_shortens_the_deadline() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.queue_session_start(Ok(SessionStart {
            expires_at: Some(Utc::now() + chrono::Duration::seconds(3)),
            ..session_start("short-lived")
        }));
        let poller = poller(&gateway);
        let session = poller
            .start_attempt(SessionKind::Login, SAMPLE_EMAIL)
            .await
            .expect("start");

        let started = Instant::now();
        let outcome = poller.await_completion(&session, None).await;

        assert!(matches!(
            outcome,
            Err(SessionError::TimedOut { lifetime, .. }) if lifetime <= Duration::from_secs(3)
        ));
        assert!(started.elapsed() <= Duration::from_secs(3));
        assert_eq!(status_checks(&gateway), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn new_attempt_supersedes_the_previous_one() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.queue_session_start(Ok(session_start("first")));
        gateway.queue_session_start(Ok(session_start("second")));
        let poller = poller(&gateway);

        let first = poller
            .start_attempt(SessionKind::Login, SAMPLE_EMAIL)
            .await
            .expect("first");
        let waiter = {
            let poller = Arc::clone(&poller);
            let first = first.clone();
            tokio::spawn(async move { poller.await_completion(&first, None).await })
        };
        settle().await;

        let second = poller
            .start_attempt(SessionKind::Login, SAMPLE_EMAIL)
            .await
            .expect("second");

        let outcome = waiter.await.expect("join");
        assert!(matches!(outcome, Err(SessionError::Cancelled { ref session_id }) if session_id == "first"));
        assert_eq!(poller.current().map(|session| session.id), Some(second.id));
        assert_eq!(poller.active_count(), 1);
    }

    #[tokio::test]
    async fn unknown_or_finished_sessions_are_not_active() {
        let gateway = Arc::new(ScriptedGateway::new());
        let poller = poller(&gateway);
        let session = poller
            .start_attempt(SessionKind::Login, SAMPLE_EMAIL)
            .await
            .expect("start");
        assert!(poller.cancel(&session));
        assert!(!poller.cancel(&session));

        let outcome = poller.await_completion(&session, None).await;
        assert!(matches!(outcome, Err(SessionError::NotActive { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn second_waiter_is_rejected() {
        let gateway = Arc::new(ScriptedGateway::new());
        let poller = poller(&gateway);
        let session = poller
            .start_attempt(SessionKind::Login, SAMPLE_EMAIL)
            .await
            .expect("start");
        let waiter = {
            let poller = Arc::clone(&poller);
            let session = session.clone();
            tokio::spawn(async move { poller.await_completion(&session, None).await })
        };
        settle().await;

        let second = poller.await_completion(&session, None).await;
        assert!(matches!(second, Err(SessionError::AlreadyAwaited { .. })));

        poller.cancel(&session);
        assert!(waiter.await.expect("join").is_err());
    }

    #[tokio::test]
    async fn start_failures_are_reported() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.queue_session_start(Err(unavailable("start_login")));
        gateway.queue_session_start(Ok(session_start("  ")));
        let poller = poller(&gateway);

        let rpc = poller.start_attempt(SessionKind::Login, SAMPLE_EMAIL).await;
        assert!(matches!(rpc, Err(SessionError::Start { kind: SessionKind::Login, .. })));

        let empty = poller.start_attempt(SessionKind::Login, SAMPLE_EMAIL).await;
        assert!(matches!(empty, Err(SessionError::MissingSessionId { .. })));
        assert_eq!(poller.active_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_wait_releases_the_entry() {
        let gateway = Arc::new(ScriptedGateway::new());
        let poller = poller(&gateway);
        let session = poller
            .start_attempt(SessionKind::Login, SAMPLE_EMAIL)
            .await
            .expect("start");

        let wait = poller.await_completion(&session, None);
        let timed = tokio::time::timeout(Duration::from_secs(3), wait).await;
        assert!(timed.is_err());
        assert_eq!(poller.active_count(), 0);
    }
}
