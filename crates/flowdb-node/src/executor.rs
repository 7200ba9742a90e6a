//! Query executor node
//!
//! One executor per flow node. Each inbound message is handled
//! independently: the executor borrows its own pooled connection, so
//! concurrency across messages is bounded only by the driver pool.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use flowdb_connection::ConnectionManager;
use flowdb_core::{Error, FlowMessage, Params, PooledConnection as _, Result, StatusIndicator};

use crate::status::state_indicator;

/// How long a per-request status is held before reverting
const STATUS_HOLD: Duration = Duration::from_millis(500);

/// Executes queries from inbound flow messages against the shared
/// connection manager.
pub struct QueryExecutor {
    manager: Arc<ConnectionManager>,
    status_tx: watch::Sender<StatusIndicator>,
    hold: Mutex<StatusHold>,
    mirror_task: Mutex<Option<JoinHandle<()>>>,
    weak_self: Weak<QueryExecutor>,
}

#[derive(Default)]
struct StatusHold {
    /// Status derived from the connection state; what transient statuses
    /// revert to
    persistent: StatusIndicator,
    /// Most recent transient status that arrived while one was displayed
    pending: Option<StatusIndicator>,
    /// A transient status is currently on display
    busy: bool,
    revert_task: Option<JoinHandle<()>>,
}

impl QueryExecutor {
    /// Create the executor and wire it to the manager.
    ///
    /// Subscribes to lifecycle transitions, mirrors them into the status
    /// display, and asks the manager to connect.
    pub fn spawn(manager: Arc<ConnectionManager>) -> Arc<Self> {
        let (status_tx, _) = watch::channel(StatusIndicator::cleared());
        let executor = Arc::new_cyclic(|weak| Self {
            manager: manager.clone(),
            status_tx,
            hold: Mutex::new(StatusHold::default()),
            mirror_task: Mutex::new(None),
            weak_self: weak.clone(),
        });

        let mut states = manager.subscribe();
        let weak = executor.weak_self.clone();
        let task = tokio::spawn(async move {
            loop {
                {
                    let Some(this) = weak.upgrade() else { break };
                    let state = states.borrow_and_update().clone();
                    this.display(state_indicator(&state));
                }
                if states.changed().await.is_err() {
                    break;
                }
            }
        });
        *executor.mirror_task.lock() = Some(task);

        manager.connect();
        executor
    }

    /// Subscribe to status indicator updates.
    pub fn status(&self) -> watch::Receiver<StatusIndicator> {
        self.status_tx.subscribe()
    }

    /// The status currently on display.
    pub fn current_status(&self) -> StatusIndicator {
        self.status_tx.borrow().clone()
    }

    /// Handle one inbound message.
    ///
    /// On success the message is returned with its payload replaced by the
    /// serialized query result. Failures are reported through the error and
    /// the status display; the borrowed connection goes back to the pool in
    /// every case.
    #[tracing::instrument(skip(self, msg), fields(msg_id = %msg.msg_id))]
    pub async fn handle(&self, mut msg: FlowMessage) -> Result<FlowMessage> {
        if !self.manager.is_connected() {
            tracing::error!("query received while database not connected");
            self.flash(StatusIndicator::not_connected());
            return Err(Error::NotConnected);
        }

        let Some(topic) = msg.topic_str() else {
            tracing::error!("msg.topic : the query is not defined as a string");
            return Err(Error::MalformedQuery);
        };
        let sql = topic.to_string();
        let params = Params::from_payload(&msg.payload);

        let result = match self.manager.acquire().await {
            Ok(mut session) => {
                let result = session.query(&sql, &params).await;
                session.release();
                result
            }
            Err(err) => Err(err),
        };

        match result.and_then(|outcome| outcome.to_json()) {
            Ok(payload) => {
                msg.payload = payload;
                self.flash(StatusIndicator::ok());
                Ok(msg)
            }
            Err(err) => {
                let code = err.code();
                tracing::error!(error = %err, code = %code, "query failed");
                self.flash(StatusIndicator::query_error(&code));
                if code.is_connection_class() {
                    self.manager.report_error(code, &err.to_string());
                }
                Err(err)
            }
        }
    }

    /// Tear the node down: cancel the pending status timer and clear the
    /// display. The shared manager is left alone; it may serve other nodes.
    pub fn close(&self) {
        if let Some(task) = self.mirror_task.lock().take() {
            task.abort();
        }
        let mut hold = self.hold.lock();
        if let Some(task) = hold.revert_task.take() {
            task.abort();
        }
        hold.busy = false;
        hold.pending = None;
        hold.persistent = StatusIndicator::cleared();
        self.status_tx.send_replace(StatusIndicator::cleared());
    }

    /// Show a connection-derived status. Bypasses any transient hold and
    /// becomes the status transients revert to.
    fn display(&self, status: StatusIndicator) {
        let mut hold = self.hold.lock();
        hold.persistent = status.clone();
        self.status_tx.send_replace(status);
    }

    /// Show a per-request status for `STATUS_HOLD`, then revert to the
    /// connection-derived status. A transient arriving while one is on
    /// display replaces it when the hold expires.
    fn flash(&self, status: StatusIndicator) {
        let mut hold = self.hold.lock();
        if hold.busy {
            hold.pending = Some(status);
            return;
        }
        hold.busy = true;
        self.status_tx.send_replace(status);

        let weak = self.weak_self.clone();
        hold.revert_task = Some(tokio::spawn(async move {
            tokio::time::sleep(STATUS_HOLD).await;
            let Some(this) = weak.upgrade() else { return };
            let mut hold = this.hold.lock();
            hold.busy = false;
            hold.revert_task = None;
            let next = hold.pending.take().unwrap_or_else(|| hold.persistent.clone());
            this.status_tx.send_replace(next);
        }));
    }
}

#[cfg(test)]
mod tests;
