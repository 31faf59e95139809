//! Query bridge - request/response messaging to a SQLite worker thread
//!
//! Requests carry ascending ids and may overlap. The worker answers each
//! exactly once; the client matches answers to callers by id and drops any
//! it does not recognize. Cancellation is cooperative through a shared
//! [`CancellationToken`](crate::cancel::CancellationToken).

mod client;
mod pending;
mod protocol;
mod worker;

pub use client::{BridgeError, DbClient, PendingQuery, PendingResponse};
pub use pending::{PendingRequests, Resolution};
pub use protocol::{
    Closed, ResponseData, Row, VersionInfo, WorkerOutcome, WorkerRequest, WorkerRequestMessage,
    WorkerResponseMessage,
};
pub use worker::{DbWorker, WorkerError};
