/*!
 * Mock transport for testing
 *
 * This module provides a connector that never touches a real database.
 * It counts every connection it opens and closes, answers the detection
 * queries with predetermined rows, and can be told to refuse connections.
 */

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use vitessorm::database::{Connector, Database, DbHandle, Row, SqlValue};
use vitessorm::errors::DriverError;

/// Shared open/close counters
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
}

impl ConnectionTracker {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Connector handing out [`MockDatabase`] connections
#[derive(Debug, Default)]
pub struct MockConnector {
    tracker: Arc<ConnectionTracker>,
    /// Canned `TIMEDIFF` answer
    pub timezone: Option<String>,
    /// Canned default engine answer
    pub engine: Option<String>,
    refuse: AtomicBool,
    last_timeout: Mutex<Option<Duration>>,
    last_target: Mutex<Option<String>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer detection queries with `timezone` and `engine`
    pub fn with_answers(timezone: &str, engine: &str) -> Self {
        Self {
            timezone: Some(timezone.to_string()),
            engine: Some(engine.to_string()),
            ..Self::default()
        }
    }

    pub fn tracker(&self) -> Arc<ConnectionTracker> {
        Arc::clone(&self.tracker)
    }

    /// Make every following `open` fail
    pub fn refuse_connections(&self) {
        self.refuse.store(true, Ordering::SeqCst);
    }

    pub fn last_timeout(&self) -> Option<Duration> {
        *self.last_timeout.lock().unwrap()
    }

    pub fn last_target(&self) -> Option<String> {
        self.last_target.lock().unwrap().clone()
    }
}

impl Connector for MockConnector {
    fn open(&self, host: &str, target: &str, timeout: Duration) -> Result<DbHandle, DriverError> {
        *self.last_timeout.lock().unwrap() = Some(timeout);
        *self.last_target.lock().unwrap() = Some(target.to_string());

        if self.refuse.load(Ordering::SeqCst) {
            return Err(DriverError::Open {
                target: format!("{}{}", host, target),
                message: "connection refused".to_string(),
            });
        }

        self.tracker.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockDatabase {
            tracker: Arc::clone(&self.tracker),
            timezone: self.timezone.clone(),
            engine: self.engine.clone(),
            pool: Mutex::new((0, 0)),
            closed: AtomicBool::new(false),
        }))
    }
}

/// Connection answering only the detection queries
#[derive(Debug)]
pub struct MockDatabase {
    tracker: Arc<ConnectionTracker>,
    timezone: Option<String>,
    engine: Option<String>,
    pool: Mutex<(usize, usize)>,
    closed: AtomicBool,
}

impl MockDatabase {
    fn answer(value: &Option<String>) -> Result<Option<Row>, DriverError> {
        match value {
            Some(text) => Ok(Some(Row::new(vec![SqlValue::Text(text.clone())]))),
            None => Err(DriverError::Query("no canned answer".to_string())),
        }
    }
}

impl Database for MockDatabase {
    fn execute(&self, _sql: &str, _params: &[SqlValue]) -> Result<usize, DriverError> {
        Ok(0)
    }

    fn query_row(&self, sql: &str, _params: &[SqlValue]) -> Result<Option<Row>, DriverError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DriverError::Closed);
        }
        if sql.contains("TIMEDIFF") {
            Self::answer(&self.timezone)
        } else if sql.contains("ENGINE") {
            Self::answer(&self.engine)
        } else {
            Ok(None)
        }
    }

    fn set_max_idle_conns(&self, n: usize) {
        self.pool.lock().unwrap().0 = n;
    }

    fn set_max_open_conns(&self, n: usize) {
        self.pool.lock().unwrap().1 = n;
    }

    fn close(&self) -> Result<(), DriverError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.tracker.closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
