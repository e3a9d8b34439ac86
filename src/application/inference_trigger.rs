// Inference trigger controller - One remote prediction per user action
use crate::domain::inference::{InferenceOutcome, InferenceResponse, TriggerCounter};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InferenceError {
    /// Non-2xx reply; the body is reported verbatim
    #[error("{body}")]
    Status { status: u16, body: String },

    #[error("{0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl InferenceError {
    pub fn status(status: u16, body: String) -> Self {
        let body = if body.trim().is_empty() {
            format!("HTTP {}", status)
        } else {
            body
        };
        Self::Status { status, body }
    }
}

#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Ask the remote service to compute the next prediction
    async fn run_inference(&self) -> Result<InferenceResponse, InferenceError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("an inference request is already in flight")]
pub struct TriggerBusy;

/// Per-session trigger state: counter, last outcome, and whether the
/// control is currently disabled.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TriggerState {
    counter: TriggerCounter,
    outcome: Option<InferenceOutcome>,
    in_flight: bool,
}

impl TriggerState {
    pub fn counter(&self) -> TriggerCounter {
        self.counter
    }

    pub fn outcome(&self) -> Option<&InferenceOutcome> {
        self.outcome.as_ref()
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Disable the control for the duration of one call
    pub fn begin(&mut self) -> Result<(), TriggerBusy> {
        if self.in_flight {
            return Err(TriggerBusy);
        }
        self.in_flight = true;
        Ok(())
    }

    /// Record the call's result and re-enable the control.
    /// Returns true when the counter advanced.
    pub fn complete(&mut self, result: Result<InferenceResponse, InferenceError>) -> bool {
        self.in_flight = false;

        let outcome = match result {
            Ok(response) => InferenceOutcome::from_response(response),
            Err(e) => InferenceOutcome::failure(e.to_string()),
        };

        let advanced = outcome.is_success();
        if advanced {
            self.counter.advance();
        }
        self.outcome = Some(outcome);
        advanced
    }

    /// The call was dropped before it returned. Re-enables the control
    /// without advancing the counter; a no-op when nothing is in flight.
    pub fn abandon(&mut self) {
        if !self.in_flight {
            return;
        }
        self.in_flight = false;
        self.outcome = Some(InferenceOutcome::failure("inference request cancelled"));
    }

    pub fn status_text(&self) -> &str {
        self.outcome.as_ref().map(|o| o.message.as_str()).unwrap_or("")
    }
}

#[derive(Clone)]
pub struct InferenceTriggerController {
    client: Arc<dyn InferenceClient>,
}

impl InferenceTriggerController {
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self { client }
    }

    /// Issue exactly one remote request. No retries.
    pub async fn trigger(&self) -> Result<InferenceResponse, InferenceError> {
        tracing::info!("Requesting a new prediction");
        let result = self.client.run_inference().await;
        match &result {
            Ok(response) if response.is_success() => {
                tracing::info!(timestamp = ?response.timestamp, "Prediction completed")
            }
            Ok(response) => {
                tracing::warn!(status = %response.status, message = ?response.message, "Inference reported failure")
            }
            Err(InferenceError::Status { status, body }) => {
                tracing::error!(status, "Inference service returned an error: {}", body)
            }
            Err(e) => tracing::error!("Inference request failed: {}", e),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(json: &str) -> Result<InferenceResponse, InferenceError> {
        Ok(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_counter_advances_only_on_success() {
        let mut state = TriggerState::default();
        let attempts = vec![
            ok(r#"{"status":"success","timestamp":"2024-01-01T10:00:00"}"#),
            ok(r#"{"status":"error","message":"no model"}"#),
            Err(InferenceError::Status {
                status: 500,
                body: "boom".to_string(),
            }),
            Err(InferenceError::Transport("connection refused".to_string())),
            Err(InferenceError::Malformed("expected value".to_string())),
            ok(r#"{"status":"success","timestamp":"2024-01-01T11:00:00"}"#),
        ];

        let mut previous = state.counter();
        for attempt in attempts {
            state.begin().unwrap();
            let expected_success = matches!(&attempt, Ok(r) if r.is_success());
            let advanced = state.complete(attempt);

            assert_eq!(advanced, expected_success);
            assert!(state.counter() >= previous);
            assert!(!state.in_flight());
            previous = state.counter();
        }
        assert_eq!(state.counter().value(), 2);
        assert_eq!(state.status_text(), "Prediction completed for 2024-01-01T11:00:00");
    }

    #[test]
    fn test_failure_messages() {
        let mut state = TriggerState::default();

        state.complete(Err(InferenceError::Status {
            status: 500,
            body: "Internal Server Error: model missing".to_string(),
        }));
        assert_eq!(state.status_text(), "Error: Internal Server Error: model missing");

        state.complete(Err(InferenceError::status(502, String::new())));
        assert_eq!(state.status_text(), "Error: HTTP 502");

        state.complete(ok(r#"{"status":"failed","message":"stale features"}"#));
        assert_eq!(state.status_text(), "Error: stale features");
        assert_eq!(state.outcome().unwrap().timestamp, None);
        assert_eq!(state.counter().value(), 0);
    }

    #[test]
    fn test_begin_rejects_overlap() {
        let mut state = TriggerState::default();
        assert_eq!(state.status_text(), "");
        state.begin().unwrap();
        assert_eq!(state.begin(), Err(TriggerBusy));
        state.complete(Err(InferenceError::Transport("timeout".to_string())));
        assert!(state.begin().is_ok());
    }

    #[test]
    fn test_abandon_reenables_without_advancing() {
        let mut state = TriggerState::default();
        state.begin().unwrap();
        state.complete(ok(r#"{"status":"success","timestamp":"2024-01-01T10:00:00"}"#));

        state.begin().unwrap();
        state.abandon();
        assert!(!state.in_flight());
        assert_eq!(state.counter().value(), 1);
        assert_eq!(state.status_text(), "Error: inference request cancelled");

        // nothing in flight: the last outcome stays
        state.complete(ok(r#"{"status":"success","timestamp":"2024-01-01T11:00:00"}"#));
        state.abandon();
        assert_eq!(state.status_text(), "Prediction completed for 2024-01-01T11:00:00");
    }
}
