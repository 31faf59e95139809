//! Caller side of the query bridge

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::pending::{PendingRequests, Resolution};
use super::protocol::{
    ResponseData, Row, VersionInfo, WorkerRequest, WorkerRequestMessage, WorkerResponseMessage,
};
use super::worker::DbWorker;
use crate::cancel::CancellationToken;

#[derive(Debug, Error, PartialEq)]
pub enum BridgeError {
    #[error("query worker disconnected")]
    Disconnected,
    #[error("{0}")]
    Worker(String),
    #[error("unexpected response kind for request")]
    UnexpectedResponse,
    #[error("timed out waiting for response")]
    Timeout,
}

/// A response that has not arrived yet
#[derive(Debug)]
pub struct PendingResponse {
    request_id: u64,
    rx: flume::Receiver<Resolution>,
}

impl PendingResponse {
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    pub fn wait(self) -> Result<ResponseData, BridgeError> {
        match self.rx.recv() {
            Ok(resolution) => resolution.map_err(BridgeError::Worker),
            Err(_) => Err(BridgeError::Disconnected),
        }
    }

    pub fn wait_timeout(self, timeout: Duration) -> Result<ResponseData, BridgeError> {
        match self.rx.recv_timeout(timeout) {
            Ok(resolution) => resolution.map_err(BridgeError::Worker),
            Err(flume::RecvTimeoutError::Timeout) => Err(BridgeError::Timeout),
            Err(flume::RecvTimeoutError::Disconnected) => Err(BridgeError::Disconnected),
        }
    }
}

/// An in-flight query
#[derive(Debug)]
pub struct PendingQuery {
    response: PendingResponse,
    cancellation: Option<CancellationToken>,
}

impl PendingQuery {
    pub fn request_id(&self) -> u64 {
        self.response.request_id
    }

    /// Ask the worker to stop at its next poll checkpoint
    pub fn cancel(&self) -> bool {
        self.cancellation.as_ref().is_some_and(|token| token.cancel())
    }

    pub fn wait(self) -> Result<Vec<Row>, BridgeError> {
        exec_rows(self.response.wait()?)
    }

    pub fn wait_timeout(self, timeout: Duration) -> Result<Vec<Row>, BridgeError> {
        exec_rows(self.response.wait_timeout(timeout)?)
    }
}

fn exec_rows(data: ResponseData) -> Result<Vec<Row>, BridgeError> {
    match data {
        ResponseData::Exec { rows } => Ok(rows),
        _ => Err(BridgeError::UnexpectedResponse),
    }
}

/// Talks to a [`DbWorker`] thread. Requests may overlap; each response is
/// routed back by request id.
pub struct DbClient {
    requests: Option<flume::Sender<WorkerRequestMessage>>,
    pending: Arc<PendingRequests>,
    worker: Option<JoinHandle<()>>,
    dispatcher: Option<JoinHandle<()>>,
}

impl DbClient {
    /// Start the worker and response dispatcher threads
    pub fn spawn(cancel_poll_rows: usize) -> std::io::Result<Self> {
        let (request_tx, request_rx) = flume::unbounded::<WorkerRequestMessage>();
        let (response_tx, response_rx) = flume::unbounded::<WorkerResponseMessage>();
        let pending = Arc::new(PendingRequests::new());

        let worker = DbWorker::new(cancel_poll_rows).spawn(request_rx, response_tx)?;

        let routes = Arc::clone(&pending);
        let dispatcher = thread::Builder::new()
            .name("shotchart-db-responses".into())
            .spawn(move || {
                for message in response_rx.iter() {
                    routes.resolve(message.request_id, message.outcome.into_result());
                }
                let orphaned = routes.clear();
                if orphaned > 0 {
                    warn!(orphaned, "Query worker stopped with requests outstanding");
                }
            })?;

        Ok(Self {
            requests: Some(request_tx),
            pending,
            worker: Some(worker),
            dispatcher: Some(dispatcher),
        })
    }

    fn send(&self, request: WorkerRequest) -> Result<PendingResponse, BridgeError> {
        let requests = self.requests.as_ref().ok_or(BridgeError::Disconnected)?;
        let (request_id, rx) = self.pending.register();
        debug!(request_id, kind = request.kind(), "Sending worker request");

        if requests
            .send(WorkerRequestMessage {
                request_id,
                request,
            })
            .is_err()
        {
            self.pending.cancel(request_id);
            return Err(BridgeError::Disconnected);
        }
        Ok(PendingResponse { request_id, rx })
    }

    /// Open the database file. Safe to call more than once.
    pub fn init(&self, file_path: &str) -> Result<VersionInfo, BridgeError> {
        let data = self
            .send(WorkerRequest::Init {
                file_path: file_path.to_string(),
            })?
            .wait()?;
        match data {
            ResponseData::Init { version } => {
                info!(version = %version.lib_version, "SQLite initialized");
                Ok(version)
            }
            _ => Err(BridgeError::UnexpectedResponse),
        }
    }

    /// Submit a query without waiting for it
    pub fn exec(
        &self,
        sql: &str,
        cancellation: Option<CancellationToken>,
    ) -> Result<PendingQuery, BridgeError> {
        let response = self.send(WorkerRequest::Exec {
            sql: sql.to_string(),
            cancellation: cancellation.clone(),
        })?;
        Ok(PendingQuery {
            response,
            cancellation,
        })
    }

    /// Submit a query and wait for its rows
    pub fn query(&self, sql: &str) -> Result<Vec<Row>, BridgeError> {
        self.exec(sql, None)?.wait()
    }

    pub fn close(&self) -> Result<(), BridgeError> {
        match self.send(WorkerRequest::Close)?.wait()? {
            ResponseData::Close(_) => Ok(()),
            _ => Err(BridgeError::UnexpectedResponse),
        }
    }

    /// Requests still waiting for a response
    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }
}

impl Drop for DbClient {
    fn drop(&mut self) {
        // Closing the request channel ends the worker, which ends the dispatcher
        self.requests.take();
        for handle in [self.worker.take(), self.dispatcher.take()].into_iter().flatten() {
            let _ = handle.join();
        }
    }
}
