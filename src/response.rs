use crate::transport::RawResponse;
use crate::types::{OperationKind, PollEnvelope, SubmitEnvelope};

/// What a decoded submission response tells the client to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitDecision {
    /// Backend accepted the job; track `session_id` until a terminal poll.
    StartPolling { session_id: String },
    /// The operation completed inline, no session to track.
    DirectAudio { audio_base64: String, generation_time: Option<f64> },
    Error { message: String },
}

/// What a decoded poll response tells the state machine to do.
#[derive(Debug, Clone, PartialEq)]
pub enum PollDecision {
    /// Parse or transport failure during polling; ignored, next tick retries.
    Transient,
    /// Job still running; progress already clamped to 0..=100.
    InProgress { percent: u8 },
    Completed { audio_base64: String },
    /// `success: false` from the poll endpoint.
    ProcessingFailed,
    /// Terminal `status: "failed"` with the backend's error text.
    FailedStatus { error: String },
    /// Terminal completion with no audio payload.
    CompletedNoAudio,
    /// Nothing recognizable yet; keep polling.
    Pending,
}

pub fn decode_submit(kind: OperationKind, raw: &RawResponse) -> SubmitDecision {
    if raw.is_failure() {
        return SubmitDecision::Error {
            message: format!("{} request failed (HTTP 0)", kind.label()),
        };
    }

    let Ok(envelope) = serde_json::from_str::<SubmitEnvelope>(&raw.body) else {
        return SubmitDecision::Error {
            message: format!("{} failed: invalid response from server", kind.label()),
        };
    };

    if !envelope.success {
        let error = envelope.error.unwrap_or_else(|| "unknown error".into());
        return SubmitDecision::Error { message: format!("{} failed: {error}", kind.label()) };
    }

    match kind {
        OperationKind::Generate | OperationKind::Continue | OperationKind::Transform => {
            match envelope.session_id.filter(|id| !id.is_empty()) {
                Some(session_id) => SubmitDecision::StartPolling { session_id },
                None => SubmitDecision::Error {
                    message: format!("{} failed: invalid response from server", kind.label()),
                },
            }
        }
        OperationKind::Extend => match envelope.audio_base64.filter(|audio| !audio.is_empty()) {
            Some(audio_base64) => SubmitDecision::DirectAudio {
                audio_base64,
                generation_time: envelope.metadata.and_then(|m| m.generation_time),
            },
            None => SubmitDecision::Error {
                message: format!("{} completed but no audio was received", kind.noun()),
            },
        },
        // Undo normally answers inline with the previous audio; some backends
        // queue it instead and answer with a session id.
        OperationKind::Undo => {
            if let Some(audio_base64) = envelope.audio_data.filter(|audio| !audio.is_empty()) {
                return SubmitDecision::DirectAudio { audio_base64, generation_time: None };
            }
            match envelope.session_id.filter(|id| !id.is_empty()) {
                Some(session_id) => SubmitDecision::StartPolling { session_id },
                None => SubmitDecision::Error {
                    message: format!("{} completed but no audio was received", kind.noun()),
                },
            }
        }
    }
}

pub fn decode_poll(raw: &RawResponse) -> PollDecision {
    if raw.is_failure() {
        return PollDecision::Transient;
    }
    let Ok(envelope) = serde_json::from_str::<PollEnvelope>(&raw.body) else {
        return PollDecision::Transient;
    };

    if !envelope.success {
        return PollDecision::ProcessingFailed;
    }

    if envelope.generation_in_progress || envelope.transform_in_progress {
        let percent = envelope.progress.clamp(0, 100) as u8;
        return PollDecision::InProgress { percent };
    }

    if let Some(audio) = envelope.audio_data.filter(|audio| !audio.is_empty()) {
        return PollDecision::Completed { audio_base64: audio };
    }

    match envelope.status.as_deref() {
        Some("failed") => PollDecision::FailedStatus {
            error: envelope.error.unwrap_or_else(|| "unknown error".into()),
        },
        Some("completed") => PollDecision::CompletedNoAudio,
        _ => PollDecision::Pending,
    }
}
