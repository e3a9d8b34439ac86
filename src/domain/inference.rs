// Inference trigger domain models
use serde::{Deserialize, Serialize};

/// Counts confirmed predictions so dependent views know to refresh.
/// Only ever moves forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TriggerCounter(u64);

impl TriggerCounter {
    pub fn value(&self) -> u64 {
        self.0
    }

    pub(crate) fn advance(&mut self) {
        self.0 += 1;
    }
}

/// Body returned by the inference endpoint
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InferenceResponse {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl InferenceResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Failure,
}

/// Result of the most recent trigger attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InferenceOutcome {
    pub status: OutcomeStatus,
    pub message: String,
    pub timestamp: Option<String>,
}

impl InferenceOutcome {
    pub fn success(timestamp: String) -> Self {
        Self {
            status: OutcomeStatus::Success,
            message: format!("Prediction completed for {}", timestamp),
            timestamp: Some(timestamp),
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Failure,
            message: format!("Error: {}", reason.into()),
            timestamp: None,
        }
    }

    pub fn from_response(response: InferenceResponse) -> Self {
        if response.is_success() {
            Self::success(response.timestamp.unwrap_or_default())
        } else {
            Self::failure(
                response
                    .message
                    .unwrap_or_else(|| "Unknown error".to_string()),
            )
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}
