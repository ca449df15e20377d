use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 0x-prefixed hex string (e.g. "0x1234...").
pub type Hex = String;

/// Opaque task identifier handed out by the relay provider on submission.
pub type TaskId = String;

/// On-chain transaction hash produced by an executed relay task.
pub type TransactionHash = Hex;

/// Fallback text reported when a failed task carries no diagnostic message.
pub const NO_ERROR_MESSAGE: &str = "no error";

/// Relay provider task state.
///
/// Unknown values reported by the provider are kept verbatim in `Other`
/// and treated as terminal failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskState {
    CheckPending,
    ExecPending,
    WaitingForConfirmation,
    ExecSuccess,
    ExecReverted,
    Cancelled,
    Blacklisted,
    NotFound,
    Other(String),
}

impl TaskState {
    pub fn as_str(&self) -> &str {
        match self {
            TaskState::CheckPending => "CheckPending",
            TaskState::ExecPending => "ExecPending",
            TaskState::WaitingForConfirmation => "WaitingForConfirmation",
            TaskState::ExecSuccess => "ExecSuccess",
            TaskState::ExecReverted => "ExecReverted",
            TaskState::Cancelled => "Cancelled",
            TaskState::Blacklisted => "Blacklisted",
            TaskState::NotFound => "NotFound",
            TaskState::Other(s) => s,
        }
    }

    /// The relay is still working on the task.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            TaskState::CheckPending | TaskState::ExecPending | TaskState::WaitingForConfirmation
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TaskState::ExecSuccess)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_in_flight()
    }
}

impl From<String> for TaskState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "CheckPending" => TaskState::CheckPending,
            "ExecPending" => TaskState::ExecPending,
            "WaitingForConfirmation" => TaskState::WaitingForConfirmation,
            "ExecSuccess" => TaskState::ExecSuccess,
            "ExecReverted" => TaskState::ExecReverted,
            "Cancelled" => TaskState::Cancelled,
            "Blacklisted" => TaskState::Blacklisted,
            "NotFound" => TaskState::NotFound,
            _ => TaskState::Other(s),
        }
    }
}

impl From<TaskState> for String {
    fn from(state: TaskState) -> Self {
        match state {
            TaskState::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task status as reported by the relay provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayTaskStatus {
    pub task_id: TaskId,
    #[serde(default)]
    pub chain_id: Option<u64>,
    pub task_state: TaskState,
    #[serde(default)]
    pub transaction_hash: Option<TransactionHash>,
    #[serde(default)]
    pub last_check_message: Option<String>,
    #[serde(default)]
    pub block_number: Option<u64>,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub execution_date: Option<String>,
}

impl RelayTaskStatus {
    /// Minimal status with only a task id and state set.
    pub fn new(task_id: impl Into<TaskId>, task_state: TaskState) -> Self {
        Self {
            task_id: task_id.into(),
            chain_id: None,
            task_state,
            transaction_hash: None,
            last_check_message: None,
            block_number: None,
            creation_date: None,
            execution_date: None,
        }
    }

    pub fn with_transaction_hash(mut self, hash: impl Into<TransactionHash>) -> Self {
        self.transaction_hash = Some(hash.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.last_check_message = Some(message.into());
        self
    }
}

/// How a relay failure should be presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Cancelled,
    InsufficientFees,
    Generic,
}

impl FailureKind {
    /// Short text shown to the user when a relayed payment fails.
    pub fn notification(&self) -> &'static str {
        match self {
            FailureKind::Cancelled => "Cancelled",
            FailureKind::InsufficientFees => "Insufficient Gas Fees",
            FailureKind::Generic => "Relay transaction failed",
        }
    }
}

/// Payflow relay error types.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("no status returned by relay for task {task_id}")]
    NoResponse { task_id: TaskId },

    #[error("relay task {task_id} failed: {state}, {message}")]
    Failed {
        task_id: TaskId,
        state: TaskState,
        message: String,
    },

    #[error("relay task {task_id} succeeded without a transaction hash")]
    MissingTransactionHash { task_id: TaskId },

    #[error("invalid wait configuration: {0}")]
    InvalidWaitConfig(String),

    #[error("task id must not be empty")]
    InvalidTaskId,

    #[error("relay not supported on chain {0}")]
    UnsupportedChain(u64),

    #[error("relay request failed: {0}")]
    Transport(String),

    #[error("failed to decode relay response: {0}")]
    Decode(String),

    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl RelayError {
    /// Classify a failure for user-facing notifications.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            RelayError::Failed { state: TaskState::Cancelled, .. } => FailureKind::Cancelled,
            RelayError::Failed { message, .. }
                if message.to_ascii_lowercase().contains("insufficient") =>
            {
                FailureKind::InsufficientFees
            }
            _ => FailureKind::Generic,
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;

/// Parse a hex string to a big-endian byte array.
pub fn hex_to_bytes(hex_str: &str) -> Result<Vec<u8>> {
    let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    hex::decode(hex_str).map_err(|e| RelayError::InvalidHex(e.to_string()))
}

/// Convert bytes to a 0x-prefixed hex string.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Whether `s` looks like a 32-byte EVM transaction hash.
pub fn is_tx_hash(s: &str) -> bool {
    match s.strip_prefix("0x") {
        Some(body) => body.len() == 64 && hex::decode(body).is_ok(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_state_classification() {
        assert!(TaskState::CheckPending.is_in_flight());
        assert!(TaskState::ExecPending.is_in_flight());
        assert!(TaskState::WaitingForConfirmation.is_in_flight());
        assert!(TaskState::ExecSuccess.is_success());
        assert!(TaskState::ExecSuccess.is_terminal());
        assert!(TaskState::ExecReverted.is_terminal());
        assert!(!TaskState::Cancelled.is_success());
        assert!(TaskState::Other("Paused".into()).is_terminal());
    }

    #[test]
    fn test_unknown_state_kept_verbatim() {
        let state: TaskState = serde_json::from_str("\"SomethingNew\"").unwrap();
        assert_eq!(state, TaskState::Other("SomethingNew".into()));
        assert_eq!(serde_json::to_string(&state).unwrap(), "\"SomethingNew\"");
        assert_eq!(state.to_string(), "SomethingNew");
    }

    #[test]
    fn test_status_from_provider_json() {
        let json = r#"{
            "chainId": 8453,
            "taskId": "0xtask",
            "taskState": "ExecSuccess",
            "creationDate": "2023-10-01T12:00:00.000Z",
            "transactionHash": "0xabc",
            "blockNumber": 5000000
        }"#;
        let status: RelayTaskStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.task_id, "0xtask");
        assert_eq!(status.chain_id, Some(8453));
        assert_eq!(status.task_state, TaskState::ExecSuccess);
        assert_eq!(status.transaction_hash.as_deref(), Some("0xabc"));
        assert_eq!(status.last_check_message, None);
    }

    #[test]
    fn test_failure_kind() {
        let cancelled = RelayError::Failed {
            task_id: "t".into(),
            state: TaskState::Cancelled,
            message: NO_ERROR_MESSAGE.into(),
        };
        assert_eq!(cancelled.failure_kind(), FailureKind::Cancelled);

        let fees = RelayError::Failed {
            task_id: "t".into(),
            state: TaskState::ExecReverted,
            message: "Insufficient funds in 1Balance".into(),
        };
        assert_eq!(fees.failure_kind(), FailureKind::InsufficientFees);

        let none = RelayError::NoResponse { task_id: "t".into() };
        assert_eq!(none.failure_kind(), FailureKind::Generic);
    }

    #[test]
    fn test_failure_notifications() {
        let cancelled = RelayError::Failed {
            task_id: "t".into(),
            state: TaskState::Cancelled,
            message: NO_ERROR_MESSAGE.into(),
        };
        assert_eq!(cancelled.failure_kind().notification(), "Cancelled");

        let fees = RelayError::Failed {
            task_id: "t".into(),
            state: TaskState::ExecReverted,
            message: "insufficient balance".into(),
        };
        assert_eq!(fees.failure_kind().notification(), "Insufficient Gas Fees");

        let timeout = RelayError::Failed {
            task_id: "t".into(),
            state: TaskState::CheckPending,
            message: NO_ERROR_MESSAGE.into(),
        };
        assert_eq!(timeout.failure_kind().notification(), "Relay transaction failed");
    }

    #[test]
    fn test_failed_message_format() {
        let err = RelayError::Failed {
            task_id: "0x01".into(),
            state: TaskState::ExecReverted,
            message: "reverted".into(),
        };
        assert_eq!(err.to_string(), "relay task 0x01 failed: ExecReverted, reverted");
    }

    #[test]
    fn test_hex_helpers() {
        assert_eq!(hex_to_bytes("0x0a0b").unwrap(), vec![0x0a, 0x0b]);
        assert_eq!(bytes_to_hex(&[0xde, 0xad]), "0xdead");
        assert!(hex_to_bytes("0xzz").is_err());

        let hash = format!("0x{}", "ab".repeat(32));
        assert!(is_tx_hash(&hash));
        assert!(!is_tx_hash("0xabc"));
        assert!(!is_tx_hash(&"ab".repeat(32)));
    }
}
