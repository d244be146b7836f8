use serde::Deserialize;

/// Events delivered to the UI over the client's event channel. One operation
/// produces zero or more `Status`/`Progress` events followed by exactly one
/// terminal delivery; cancellation produces a single `Status` and no terminal.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Status { message: String, duration_ms: u32 },
    Progress { percent: u8 },
    AudioReady { audio_base64: String, session_id: String },
    Error { message: String },
    OperationComplete,
}

/// The backend operation an in-flight session belongs to. Carries the
/// user-facing wording choice; protocol behavior is identical across kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Generate,
    Continue,
    Extend,
    Transform,
    Undo,
}

impl OperationKind {
    /// Short label used in request-level error prefixes.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Generate => "Generate",
            Self::Continue => "Continue",
            Self::Extend => "Extend",
            Self::Transform => "Transform",
            Self::Undo => "Undo",
        }
    }

    /// Noun used in completion and failure wording.
    pub fn noun(&self) -> &'static str {
        if self.is_transform() {
            "Transform"
        } else {
            "Generation"
        }
    }

    /// Verb used in progress wording.
    pub fn progress_verb(&self) -> &'static str {
        if self.is_transform() {
            "Transforming"
        } else {
            "Generating"
        }
    }

    pub fn is_transform(&self) -> bool {
        matches!(self, Self::Transform)
    }
}

/// Parameters for `Generate` and `Continue`; the two operations share a body
/// and differ only in endpoint path.
#[derive(Debug, Clone)]
pub struct GenerateParams {
    pub audio_base64: String,
    /// Seconds of audio to generate, clamped to 1..=15 at encode time.
    pub prompt_duration_seconds: u8,
    /// Index into [`crate::MODEL_NAMES`], clamped into range at encode time.
    pub model_index: usize,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct ExtendParams {
    pub prompt: String,
    /// Diffusion steps, clamped to 4..=50 at encode time.
    pub steps: u8,
    pub cfg_scale: f64,
    pub generate_as_loop: bool,
    pub loop_type: LoopType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopType {
    Auto,
    Drums,
    Instruments,
}

impl LoopType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Drums => "drums",
            Self::Instruments => "instruments",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransformParams {
    pub audio_base64: String,
    /// Flow-matching step size, clamped to 0.05..=0.15 at encode time.
    pub flowstep: f64,
    pub use_midpoint_solver: bool,
    /// Index into [`crate::VARIATIONS`]; negative selects `custom_prompt`
    /// instead. A non-negative index wins over a non-empty custom prompt.
    pub variation_index: i32,
    pub custom_prompt: String,
}

#[derive(Debug, Clone)]
pub struct UndoParams {
    pub session_id: String,
}

/// Envelope returned by every submission endpoint. Absent fields default so
/// each decoder can pick out the shape it expects.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub audio_base64: Option<String>,
    #[serde(default)]
    pub audio_data: Option<String>,
    #[serde(default)]
    pub metadata: Option<SubmitMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitMetadata {
    #[serde(default)]
    pub generation_time: Option<f64>,
}

/// Envelope returned by `GET /api/juce/poll_status/{session_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PollEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub generation_in_progress: bool,
    #[serde(default)]
    pub transform_in_progress: bool,
    #[serde(default)]
    pub progress: i64,
    #[serde(default)]
    pub audio_data: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
