//! Wire messages between the query client and the database worker

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cancel::CancellationToken;

/// One result row, column name to value
pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "message", rename_all = "lowercase")]
pub enum WorkerRequest {
    Init {
        #[serde(rename = "filePath")]
        file_path: String,
    },
    Exec {
        sql: String,
        /// Shared with the worker in-process, never serialized
        #[serde(skip)]
        cancellation: Option<CancellationToken>,
    },
    Close,
}

impl WorkerRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerRequest::Init { .. } => "init",
            WorkerRequest::Exec { .. } => "exec",
            WorkerRequest::Close => "close",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerRequestMessage {
    #[serde(rename = "requestId")]
    pub request_id: u64,
    #[serde(flatten)]
    pub request: WorkerRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub lib_version: String,
    pub lib_version_number: i32,
    pub source_id: String,
}

/// Success payload; the shape depends on the request kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseData {
    Init { version: VersionInfo },
    Exec { rows: Vec<Row> },
    Close(Closed),
}

/// Close acknowledgement, exactly `{}` on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Closed {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum WorkerOutcome {
    Success { data: ResponseData },
    Error { error: String },
}

impl WorkerOutcome {
    pub fn into_result(self) -> Result<ResponseData, String> {
        match self {
            WorkerOutcome::Success { data } => Ok(data),
            WorkerOutcome::Error { error } => Err(error),
        }
    }
}

impl<E: std::fmt::Display> From<Result<ResponseData, E>> for WorkerOutcome {
    fn from(result: Result<ResponseData, E>) -> Self {
        match result {
            Ok(data) => WorkerOutcome::Success { data },
            Err(err) => WorkerOutcome::Error {
                error: err.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerResponseMessage {
    #[serde(rename = "requestId")]
    pub request_id: u64,
    #[serde(flatten)]
    pub outcome: WorkerOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_shape() {
        let init = WorkerRequestMessage {
            request_id: 1,
            request: WorkerRequest::Init {
                file_path: "nba.sqlite3".into(),
            },
        };
        assert_eq!(
            serde_json::to_value(&init).unwrap(),
            json!({ "requestId": 1, "message": "init", "filePath": "nba.sqlite3" })
        );

        let exec = WorkerRequestMessage {
            request_id: 2,
            request: WorkerRequest::Exec {
                sql: "SELECT 1".into(),
                cancellation: Some(CancellationToken::new()),
            },
        };
        assert_eq!(
            serde_json::to_value(&exec).unwrap(),
            json!({ "requestId": 2, "message": "exec", "sql": "SELECT 1" })
        );

        let close = WorkerRequestMessage {
            request_id: 3,
            request: WorkerRequest::Close,
        };
        assert_eq!(
            serde_json::to_value(&close).unwrap(),
            json!({ "requestId": 3, "message": "close" })
        );
    }

    #[test]
    fn test_request_parses_from_wire() {
        let parsed: WorkerRequestMessage =
            serde_json::from_value(json!({ "requestId": 7, "message": "exec", "sql": "SELECT 2" }))
                .unwrap();
        assert_eq!(parsed.request_id, 7);
        match parsed.request {
            WorkerRequest::Exec { sql, cancellation } => {
                assert_eq!(sql, "SELECT 2");
                assert!(cancellation.is_none());
            }
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[test]
    fn test_response_wire_shape() {
        let ok = WorkerResponseMessage {
            request_id: 4,
            outcome: WorkerOutcome::Success {
                data: ResponseData::Exec { rows: vec![] },
            },
        };
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({ "requestId": 4, "result": "success", "data": { "rows": [] } })
        );

        let err = WorkerResponseMessage {
            request_id: 5,
            outcome: WorkerOutcome::Error {
                error: "database not initialized".into(),
            },
        };
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({ "requestId": 5, "result": "error", "error": "database not initialized" })
        );
    }

    #[test]
    fn test_untagged_data_picks_variant() {
        let init: ResponseData = serde_json::from_value(json!({
            "version": { "libVersion": "3.45.0", "libVersionNumber": 3045000, "sourceId": "abc" }
        }))
        .unwrap();
        assert!(matches!(init, ResponseData::Init { .. }));

        let close: ResponseData = serde_json::from_value(json!({})).unwrap();
        assert_eq!(close, ResponseData::Close(Closed {}));
        assert_eq!(serde_json::to_value(&close).unwrap(), json!({}));
    }

    #[test]
    fn test_malformed_data_is_rejected() {
        // Neither init nor exec, and not an empty close either
        for payload in [
            json!({ "rows": 5 }),
            json!({ "version": "3.45.0" }),
            json!({ "unexpected": true }),
        ] {
            assert!(serde_json::from_value::<ResponseData>(payload.clone()).is_err(), "{}", payload);
        }

        let message: Result<WorkerResponseMessage, _> = serde_json::from_value(json!({
            "requestId": 9, "result": "success", "data": { "rows": "nope" }
        }));
        assert!(message.is_err());
    }
}
