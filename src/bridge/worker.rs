//! Database executor: owns the SQLite connection on its own thread
//!
//! The connection never leaves this thread. Callers talk to it only through
//! request/response messages.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use rusqlite::types::ValueRef;
use rusqlite::{Connection, ErrorCode};
use serde_json::{Number, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::protocol::{
    Closed, ResponseData, Row, VersionInfo, WorkerOutcome, WorkerRequest, WorkerRequestMessage,
    WorkerResponseMessage,
};
use crate::cancel::CancellationToken;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("database not initialized")]
    NotInitialized,
    #[error("interrupted")]
    Interrupted,
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

impl WorkerError {
    /// Fold SQLite's own interrupt code into `Interrupted`
    fn from_sqlite(err: rusqlite::Error) -> Self {
        if err.sqlite_error_code() == Some(ErrorCode::OperationInterrupted) {
            WorkerError::Interrupted
        } else {
            WorkerError::Sqlite(err)
        }
    }
}

pub struct DbWorker {
    conn: Option<Connection>,
    /// Rows between cancellation checks
    cancel_poll_rows: usize,
}

impl DbWorker {
    pub fn new(cancel_poll_rows: usize) -> Self {
        Self {
            conn: None,
            cancel_poll_rows: cancel_poll_rows.max(1),
        }
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Process one request into exactly one response
    pub fn handle(&mut self, message: WorkerRequestMessage) -> WorkerResponseMessage {
        let request_id = message.request_id;
        let kind = message.request.kind();
        let result = match message.request {
            WorkerRequest::Init { file_path } => self
                .init(&file_path)
                .map(|version| ResponseData::Init { version }),
            WorkerRequest::Exec { sql, cancellation } => self
                .exec(&sql, cancellation.as_ref())
                .map(|rows| ResponseData::Exec { rows }),
            WorkerRequest::Close => {
                self.close();
                Ok(ResponseData::Close(Closed {}))
            }
        };

        if let Err(err) = &result {
            warn!(request_id, kind, "Worker request failed: {}", err);
        }
        WorkerResponseMessage {
            request_id,
            outcome: WorkerOutcome::from(result),
        }
    }

    /// Open the database. A second call keeps the open handle.
    pub fn init(&mut self, file_path: &str) -> Result<VersionInfo, WorkerError> {
        if self.conn.is_none() {
            let conn = Connection::open(file_path)?;
            conn.busy_timeout(Duration::from_secs(5))?;
            info!(path = file_path, "Opened database");
            self.conn = Some(conn);
        }
        let conn = self.conn.as_ref().ok_or(WorkerError::NotInitialized)?;
        let source_id: String = conn.query_row("SELECT sqlite_source_id()", [], |row| row.get(0))?;
        Ok(VersionInfo {
            lib_version: rusqlite::version().to_string(),
            lib_version_number: rusqlite::version_number(),
            source_id,
        })
    }

    /// Run one statement and collect its rows as JSON objects.
    ///
    /// The token is checked every `cancel_poll_rows` rows, so a query that
    /// finishes between checks completes even if cancelled.
    pub fn exec(
        &mut self,
        sql: &str,
        cancellation: Option<&CancellationToken>,
    ) -> Result<Vec<Row>, WorkerError> {
        let conn = self.conn.as_ref().ok_or(WorkerError::NotInitialized)?;
        let mut stmt = conn.prepare(sql).map_err(WorkerError::from_sqlite)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

        let mut rows = stmt.query([]).map_err(WorkerError::from_sqlite)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(WorkerError::from_sqlite)? {
            let mut record = Row::new();
            for (i, name) in columns.iter().enumerate() {
                let value = row.get_ref(i).map_err(WorkerError::from_sqlite)?;
                record.insert(name.clone(), to_json(value));
            }
            out.push(record);

            if out.len() % self.cancel_poll_rows == 0
                && cancellation.is_some_and(|token| token.is_cancelled())
            {
                debug!(rows = out.len(), "Query cancelled");
                return Err(WorkerError::Interrupted);
            }
        }
        debug!(rows = out.len(), "Query finished");
        Ok(out)
    }

    /// Release the connection. Later queries fail until `init` runs again.
    pub fn close(&mut self) {
        if self.conn.take().is_some() {
            info!("Closed database");
        }
    }

    /// Serve requests until the request channel closes
    pub fn spawn(
        mut self,
        requests: flume::Receiver<WorkerRequestMessage>,
        responses: flume::Sender<WorkerResponseMessage>,
    ) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("shotchart-db".into())
            .spawn(move || {
                for message in requests.iter() {
                    if responses.send(self.handle(message)).is_err() {
                        break;
                    }
                }
                self.close();
            })
    }
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
    }
}
