use thiserror::Error;

/// Failure taxonomy for the playback engine. None of these are fatal to the
/// surrounding application; the worst case is a lost interval of progress.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Backend query failed: {0}")]
    BackendQuery(String),

    #[error("Widget script failed to load")]
    ScriptLoad,

    #[error("Seek rejected by backend: {0}")]
    Seek(String),

    #[error("Progress save failed: {0}")]
    Save(String),

    #[error("Module is locked for this student")]
    Locked,

    #[error("Unknown module or video: {0}")]
    UnknownTarget(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
