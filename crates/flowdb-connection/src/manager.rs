//! Shared connection manager
//!
//! One manager is shared by every node that talks to the same database. It
//! creates the driver pool exactly once, keeps a single active connection
//! as the liveness anchor, reschedules failed attempts after a fixed
//! backoff, runs the periodic health check, and broadcasts lifecycle state
//! over a watch channel.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use flowdb_core::{
    ConnectionState, DatabasePool, Error, ErrorCode, Params, PoolConfig, PoolFactory,
    PooledConnection, Result,
};

use crate::health::HealthCheckConfig;
use crate::reconnect::ReconnectPolicy;

/// Manages the shared database connection for a node configuration.
pub struct ConnectionManager {
    config: PoolConfig,
    factory: Box<dyn PoolFactory>,
    policy: ReconnectPolicy,
    health: HealthCheckConfig,
    state_tx: watch::Sender<ConnectionState>,
    inner: Mutex<ManagerInner>,
    /// Self-reference handed to spawned timers so they never keep the
    /// manager alive on their own
    weak_self: Weak<ConnectionManager>,
}

#[derive(Default)]
struct ManagerInner {
    /// Driver pool, created on the first connection attempt
    pool: Option<Arc<dyn DatabasePool>>,
    /// The held active connection while state is Connected
    active: Option<Box<dyn PooledConnection>>,
    /// A connection attempt is in flight
    connecting: bool,
    /// The manager was torn down
    closed: bool,
    attempt_task: Option<JoinHandle<()>>,
    retry_timer: Option<JoinHandle<()>>,
    health_task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl ConnectionManager {
    /// Create a manager with default reconnect and health-check settings.
    ///
    /// Fails once, at construction, if the configuration is incomplete.
    pub fn new<F: PoolFactory>(config: PoolConfig, factory: F) -> Result<Arc<Self>> {
        Self::with_options(
            config,
            factory,
            ReconnectPolicy::default(),
            HealthCheckConfig::default(),
        )
    }

    /// Create a manager with explicit reconnect and health-check settings.
    pub fn with_options<F: PoolFactory>(
        config: PoolConfig,
        factory: F,
        policy: ReconnectPolicy,
        health: HealthCheckConfig,
    ) -> Result<Arc<Self>> {
        config.validate()?;
        let (state_tx, _) = watch::channel(ConnectionState::Idle);
        Ok(Arc::new_cyclic(|weak| Self {
            config,
            factory: Box::new(factory),
            policy,
            health,
            state_tx,
            inner: Mutex::new(ManagerInner::default()),
            weak_self: weak.clone(),
        }))
    }

    /// Subscribe to lifecycle state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state_tx.borrow().clone()
    }

    /// Check if the active connection is established.
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Begin connecting.
    ///
    /// Idempotent: a no-op while connected or while an attempt is already
    /// in flight, so overlapping triggers (explicit calls, driver errors,
    /// failed health checks) never create a second pool or a second
    /// in-flight attempt.
    #[tracing::instrument(skip(self), fields(host = %self.config.host, port = self.config.port))]
    pub fn connect(&self) {
        let mut inner = self.inner.lock();
        if inner.closed || inner.connecting || self.state().is_connected() {
            return;
        }
        inner.connecting = true;
        self.state_tx.send_replace(ConnectionState::Connecting);
        let weak = self.weak_self.clone();
        inner.attempt_task = Some(tokio::spawn(async move {
            if let Some(this) = weak.upgrade() {
                this.attempt().await;
            }
        }));
    }

    async fn attempt(self: Arc<Self>) {
        let pool = match self.ensure_pool() {
            Ok(pool) => pool,
            Err(err) => {
                self.attempt_failed(err);
                return;
            }
        };

        match pool.acquire().await {
            Ok(conn) => {
                let mut inner = self.inner.lock();
                inner.connecting = false;
                if inner.closed {
                    drop(inner);
                    conn.release();
                    return;
                }
                inner.active = Some(conn);
                self.ensure_health_task(&mut inner);
                self.state_tx.send_replace(ConnectionState::Connected);
                tracing::info!("database connection established");
            }
            Err(err) => self.attempt_failed(err),
        }
    }

    /// Create the driver pool on first use; afterwards hand out the one
    /// existing handle.
    fn ensure_pool(&self) -> Result<Arc<dyn DatabasePool>> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(Error::NotConnected);
        }
        if let Some(pool) = &inner.pool {
            return Ok(pool.clone());
        }
        let pool = self.factory.create_pool(&self.config)?;
        inner.pool = Some(pool.clone());
        Ok(pool)
    }

    fn attempt_failed(&self, err: Error) {
        let code = err.code();
        tracing::error!(error = %err, code = %code, "connection attempt failed");
        let mut inner = self.inner.lock();
        inner.connecting = false;
        if inner.closed {
            return;
        }
        self.state_tx.send_replace(ConnectionState::Error(code));
        self.schedule_retry(&mut inner);
    }

    /// Schedule a reconnect attempt after the fixed backoff.
    fn schedule_retry(&self, inner: &mut ManagerInner) {
        if inner.retry_timer.is_some() {
            return;
        }
        let interval = self.policy.retry_interval();
        let weak = self.weak_self.clone();
        inner.retry_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            if let Some(this) = weak.upgrade() {
                this.inner.lock().retry_timer = None;
                this.connect();
            }
        }));
    }

    /// Start the periodic health check if it is not already running. Runs
    /// for the manager's lifetime once started; individual checks are
    /// skipped while not connected.
    fn ensure_health_task(&self, inner: &mut ManagerInner) {
        if inner.health_task.is_some() {
            return;
        }
        let interval = self.health.interval;
        let weak = self.weak_self.clone();
        inner.health_task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(this) = weak.upgrade() else { break };
                this.run_health_check().await;
            }
        }));
    }

    /// Run one health-check query against a pooled connection.
    async fn run_health_check(&self) {
        if !self.is_connected() {
            return;
        }
        let pool = self.inner.lock().pool.clone();
        let Some(pool) = pool else { return };

        let result = async {
            let mut session = pool.acquire().await?;
            let outcome = session.query(&self.health.query, &Params::Empty).await;
            session.release();
            outcome
        }
        .await;

        if let Err(err) = result {
            tracing::error!(error = %err, "health check failed, reconnecting");
            self.trigger_reconnect(ErrorCode::HealthCheck);
        }
    }

    /// Report a driver-surfaced connection error.
    ///
    /// Codes in the policy's silent set reconnect with only the state
    /// change; anything else is additionally logged at error level.
    pub fn report_error(&self, code: ErrorCode, message: &str) {
        if self.policy.is_silent(&code) {
            tracing::debug!(code = %code, message, "transient connection error, reconnecting");
        } else {
            tracing::error!(code = %code, message, "connection error, reconnecting");
        }
        self.trigger_reconnect(code);
    }

    fn trigger_reconnect(&self, code: ErrorCode) {
        {
            let mut inner = self.inner.lock();
            if inner.closed {
                return;
            }
            if let Some(conn) = inner.active.take() {
                conn.release();
            }
            self.state_tx.send_replace(ConnectionState::Error(code));
        }
        self.connect();
    }

    /// Borrow a pooled connection for one request.
    ///
    /// Fails without touching the driver while not connected.
    pub async fn acquire(&self) -> Result<Box<dyn PooledConnection>> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        let pool = self.inner.lock().pool.clone();
        match pool {
            Some(pool) => pool.acquire().await,
            None => Err(Error::NotConnected),
        }
    }

    /// Tear the manager down: cancel the retry and health-check timers,
    /// release the held connection, and end the pool. Returns only after
    /// the pool has finished draining.
    #[tracing::instrument(skip(self))]
    pub async fn close(&self) -> Result<()> {
        let (pool, active) = {
            let mut inner = self.inner.lock();
            inner.closed = true;
            inner.connecting = false;
            if let Some(task) = inner.attempt_task.take() {
                task.abort();
            }
            if let Some(timer) = inner.retry_timer.take() {
                timer.abort();
            }
            if let Some(task) = inner.health_task.take() {
                task.abort();
            }
            self.state_tx.send_replace(ConnectionState::Idle);
            (inner.pool.take(), inner.active.take())
        };
        if let Some(conn) = active {
            conn.release();
        }
        if let Some(pool) = pool {
            pool.disconnect().await?;
        }
        tracing::info!("connection manager closed");
        Ok(())
    }
}
