use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("not initialized: run 'sprint init'")]
    NotInitialized,

    #[error("member not found: {0}")]
    MemberNotFound(String),

    #[error("story not found: {0}")]
    StoryNotFound(String),

    #[error("sub-task not found: {0}")]
    SubTaskNotFound(String),

    #[error("ambiguous id prefix '{prefix}': matches {matches}")]
    AmbiguousId { prefix: String, matches: String },

    #[error("invalid {kind} '{value}'")]
    InvalidValue { kind: &'static str, value: String },

    #[error("remote {op} failed: {message}")]
    Remote { op: String, message: String },

    #[error("no remote configured: add a 'remote' section to .sprint/config.yaml")]
    RemoteNotConfigured,

    #[error("remote api key not found: set the {0} environment variable")]
    ApiKeyMissing(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl PlanError {
    pub fn remote(op: impl Into<String>, message: impl Into<String>) -> Self {
        PlanError::Remote {
            op: op.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlanError>;
