use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("Simulator connection failed: {reason}")]
    Connection { reason: String },

    #[error("Command for agent {agent} rejected: {reason}")]
    AgentCommand { agent: String, reason: String },

    #[error("Visualization primitive not supported: {primitive}")]
    VisualizationUnsupported { primitive: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Replay error: {0}")]
    Replay(#[from] ReplayError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Configuration(#[from] anyhow::Error),
}

pub type ReplayResult<T> = Result<T, ReplayError>;
pub type ApplicationResult<T> = Result<T, ApplicationError>;
