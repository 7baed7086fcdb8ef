use thiserror::Error;

/// All errors produced by luma-core.
#[derive(Debug, Error)]
pub enum LumaError {
    #[error("document decode error: {0}")]
    Decode(String),

    #[error("summarization service returned HTTP {status}: {body}")]
    SummarizationService { status: u16, body: String },

    #[error("summarization transport error: {0}")]
    SummarizationTransport(String),

    #[error("speech recognition is not available")]
    UnsupportedCapability,

    #[error("recognition error: {0}")]
    Recognition(String),

    #[error("speech synthesis error: {0}")]
    Synthesis(String),

    #[error("an extraction job is already outstanding")]
    ExtractionBusy,

    #[error("a summarization request is already pending")]
    SummarizationBusy,

    #[error("a dictation session is already listening")]
    AlreadyListening,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, LumaError>;
