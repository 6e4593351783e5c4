use recog_client::ClientError;
use recog_core::{OperationStatus, RecordId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Client(#[from] ClientError),

    /// A newer request was issued before this response arrived.
    #[error("stale response #{issued} (latest #{latest})")]
    Stale { issued: u64, latest: u64 },

    #[error("no operations are ready to process")]
    NothingReady,

    #[error("a processing batch is already running")]
    BatchInFlight,

    #[error("a check is already running")]
    CheckInFlight,

    #[error("cannot {action} operation {id}: it is {status}")]
    InvalidTransition {
        id: RecordId,
        status: OperationStatus,
        action: &'static str,
    },

    #[error("no loaded record with id {0}")]
    UnknownRecord(RecordId),
}

impl StoreError {
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }

    /// Short text suitable for a notice.
    pub fn user_message(&self) -> String {
        match self {
            Self::Client(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}
