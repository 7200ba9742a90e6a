//! Tests for the query executor

use super::*;
use async_trait::async_trait;
use flowdb_core::{
    DatabasePool, ErrorCode, ExecStatus, PoolConfig, PoolFactory, PooledConnection, QueryOutcome,
    Row, Value,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Default)]
struct Counters {
    acquires: AtomicU32,
    releases: AtomicU32,
    queries: AtomicU32,
}

impl Counters {
    fn acquires(&self) -> u32 {
        self.acquires.load(Ordering::SeqCst)
    }
    fn releases(&self) -> u32 {
        self.releases.load(Ordering::SeqCst)
    }
    fn queries(&self) -> u32 {
        self.queries.load(Ordering::SeqCst)
    }
}

/// Mock driver returning a configurable outcome from every session
struct MockDriver {
    counters: Arc<Counters>,
    outcome: Arc<Mutex<QueryOutcome>>,
    fail_acquires: Arc<AtomicU32>,
    fail_queries: Arc<AtomicU32>,
}

impl MockDriver {
    fn new() -> Self {
        Self {
            counters: Arc::new(Counters::default()),
            outcome: Arc::new(Mutex::new(QueryOutcome::Rows(vec![Row::new(
                vec!["n".into()],
                vec![Value::Int64(1)],
            )]))),
            fail_acquires: Arc::new(AtomicU32::new(0)),
            fail_queries: Arc::new(AtomicU32::new(0)),
        }
    }

    fn counters(&self) -> Arc<Counters> {
        self.counters.clone()
    }

    fn outcome(&self) -> Arc<Mutex<QueryOutcome>> {
        self.outcome.clone()
    }

    fn fail_queries(&self) -> Arc<AtomicU32> {
        self.fail_queries.clone()
    }
}

impl PoolFactory for MockDriver {
    fn create_pool(&self, _config: &PoolConfig) -> flowdb_core::Result<Arc<dyn DatabasePool>> {
        Ok(Arc::new(MockPool {
            counters: self.counters.clone(),
            outcome: self.outcome.clone(),
            fail_acquires: self.fail_acquires.clone(),
            fail_queries: self.fail_queries.clone(),
        }))
    }
}

struct MockPool {
    counters: Arc<Counters>,
    outcome: Arc<Mutex<QueryOutcome>>,
    fail_acquires: Arc<AtomicU32>,
    fail_queries: Arc<AtomicU32>,
}

#[async_trait]
impl DatabasePool for MockPool {
    async fn acquire(&self) -> flowdb_core::Result<Box<dyn PooledConnection>> {
        self.counters.acquires.fetch_add(1, Ordering::SeqCst);
        if self.fail_acquires.load(Ordering::SeqCst) > 0 {
            self.fail_acquires.fetch_sub(1, Ordering::SeqCst);
            return Err(Error::database(
                ErrorCode::ConnectionRefused,
                "mock connection refused",
            ));
        }
        Ok(Box::new(MockSession {
            counters: self.counters.clone(),
            outcome: self.outcome.clone(),
            fail_queries: self.fail_queries.clone(),
        }))
    }

    async fn disconnect(&self) -> flowdb_core::Result<()> {
        Ok(())
    }
}

struct MockSession {
    counters: Arc<Counters>,
    outcome: Arc<Mutex<QueryOutcome>>,
    fail_queries: Arc<AtomicU32>,
}

#[async_trait]
impl PooledConnection for MockSession {
    async fn query(&mut self, _sql: &str, _params: &Params) -> flowdb_core::Result<QueryOutcome> {
        self.counters.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries.load(Ordering::SeqCst) > 0 {
            self.fail_queries.fetch_sub(1, Ordering::SeqCst);
            return Err(Error::database(
                ErrorCode::ConnectionLost,
                "mock connection lost",
            ));
        }
        Ok(self.outcome.lock().clone())
    }
}

impl Drop for MockSession {
    fn drop(&mut self) {
        self.counters.releases.fetch_add(1, Ordering::SeqCst);
    }
}

async fn connected_executor(driver: MockDriver) -> (Arc<QueryExecutor>, Arc<ConnectionManager>) {
    let manager = ConnectionManager::new(PoolConfig::new("db"), driver).unwrap();
    let mut rx = manager.subscribe();
    let executor = QueryExecutor::spawn(manager.clone());
    tokio::time::timeout(Duration::from_secs(60), async {
        loop {
            if rx.borrow().is_connected() {
                return;
            }
            rx.changed().await.expect("manager dropped");
        }
    })
    .await
    .expect("never connected");
    // let the state mirror catch up before the test observes the status
    tokio::task::yield_now().await;
    (executor, manager)
}

#[tokio::test(start_paused = true)]
async fn successful_query_replaces_payload_and_flashes_ok() {
    let driver = MockDriver::new();
    let counters = driver.counters();
    let (executor, _manager) = connected_executor(driver).await;

    let msg = FlowMessage::new(json!("SELECT 1 AS n"), json!([]));
    let out = executor.handle(msg).await.unwrap();

    assert_eq!(out.payload, json!([{"n": 1}]));
    assert_eq!(executor.current_status(), StatusIndicator::ok());
    assert_eq!(counters.queries(), 1);

    // the transient OK reverts to the connection-derived status
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(executor.current_status(), StatusIndicator::connected());
}

#[tokio::test(start_paused = true)]
async fn dml_status_object_becomes_the_payload() {
    let driver = MockDriver::new();
    *driver.outcome().lock() = QueryOutcome::Status(ExecStatus {
        affected_rows: 2,
        last_insert_id: Some(41),
    });
    let (executor, _manager) = connected_executor(driver).await;

    let msg = FlowMessage::new(json!("UPDATE t SET x = 1"), json!(null));
    let out = executor.handle(msg).await.unwrap();
    assert_eq!(out.payload, json!({"affected_rows": 2, "last_insert_id": 41}));
}

#[tokio::test(start_paused = true)]
async fn query_while_disconnected_never_reaches_the_driver() {
    let driver = MockDriver::new();
    driver.fail_acquires.store(u32::MAX, Ordering::SeqCst);
    let counters = driver.counters();
    let manager = ConnectionManager::new(PoolConfig::new("db"), driver).unwrap();
    let executor = QueryExecutor::spawn(manager.clone());

    let err = executor
        .handle(FlowMessage::new(json!("SELECT 1"), json!([])))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NotConnected));
    assert_eq!(counters.queries(), 0);
    assert_eq!(executor.current_status(), StatusIndicator::not_connected());
}

#[tokio::test(start_paused = true)]
async fn non_string_topic_is_rejected_without_executing() {
    let driver = MockDriver::new();
    let counters = driver.counters();
    let (executor, _manager) = connected_executor(driver).await;
    let acquires_before = counters.acquires();

    let err = executor
        .handle(FlowMessage::new(json!(42), json!([])))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MalformedQuery));
    assert_eq!(counters.queries(), 0);
    assert_eq!(counters.acquires(), acquires_before);
    // no per-request status for a malformed message
    assert_eq!(executor.current_status(), StatusIndicator::connected());
}

#[tokio::test(start_paused = true)]
async fn serialization_failure_still_releases_the_connection() {
    let driver = MockDriver::new();
    *driver.outcome().lock() = QueryOutcome::Rows(vec![Row::new(
        vec!["x".into()],
        vec![Value::Float64(f64::NAN)],
    )]);
    let counters = driver.counters();
    let (executor, manager) = connected_executor(driver).await;

    let err = executor
        .handle(FlowMessage::new(json!("SELECT x FROM t"), json!([])))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Serialization(_)));
    assert_eq!(counters.queries(), 1);
    // the query session was released; only the manager's anchor is held
    assert_eq!(counters.acquires(), 2);
    assert_eq!(counters.releases(), 1);
    // a serialization failure is per-request; the connection state is untouched
    assert!(manager.is_connected());
}

#[tokio::test(start_paused = true)]
async fn connection_class_query_error_triggers_reconnect() {
    let driver = MockDriver::new();
    driver.fail_queries().store(1, Ordering::SeqCst);
    let counters = driver.counters();
    let (executor, manager) = connected_executor(driver).await;
    let mut rx = manager.subscribe();

    let err = executor
        .handle(FlowMessage::new(json!("SELECT 1"), json!([])))
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::ConnectionLost);
    assert_eq!(
        executor.current_status(),
        StatusIndicator::query_error(&ErrorCode::ConnectionLost)
    );

    // the manager was told and recovers on its own
    tokio::time::timeout(Duration::from_secs(120), async {
        loop {
            if rx.borrow().is_connected() {
                return;
            }
            rx.changed().await.expect("manager dropped");
        }
    })
    .await
    .expect("never reconnected");
    assert!(counters.acquires() >= 3);
    assert!(counters.releases() >= 2);
}

#[tokio::test(start_paused = true)]
async fn transient_statuses_coalesce_during_the_hold() {
    let driver = MockDriver::new();
    let fail_queries = driver.fail_queries();
    let (executor, _manager) = connected_executor(driver).await;

    executor
        .handle(FlowMessage::new(json!("SELECT 1"), json!([])))
        .await
        .unwrap();
    assert_eq!(executor.current_status(), StatusIndicator::ok());

    // a failure inside the hold window is displayed when the hold expires
    fail_queries.store(1, Ordering::SeqCst);
    let _ = executor
        .handle(FlowMessage::new(json!("SELECT 1"), json!([])))
        .await
        .unwrap_err();
    assert_eq!(executor.current_status(), StatusIndicator::ok());

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(
        executor.current_status(),
        StatusIndicator::query_error(&ErrorCode::ConnectionLost)
    );
}

#[tokio::test(start_paused = true)]
async fn named_parameters_are_extracted_from_object_payloads() {
    let driver = MockDriver::new();
    let (executor, _manager) = connected_executor(driver).await;

    // object payloads become named parameters; the mock accepts any query
    let msg = FlowMessage::new(json!("SELECT :a"), json!({"a": 1}));
    let out = executor.handle(msg).await.unwrap();
    assert_eq!(out.payload, json!([{"n": 1}]));
}

#[tokio::test(start_paused = true)]
async fn close_clears_the_status_and_stops_mirroring() {
    let driver = MockDriver::new();
    let (executor, manager) = connected_executor(driver).await;
    assert_eq!(executor.current_status(), StatusIndicator::connected());

    executor.close();
    assert!(executor.current_status().is_cleared());

    // state changes no longer reach the closed node's display
    manager.report_error(ErrorCode::ConnectionLost, "mock connection lost");
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(executor.current_status().is_cleared());
}
