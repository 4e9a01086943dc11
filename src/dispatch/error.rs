use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no callback registered for output '{0}'")]
    UnknownOutput(String),

    #[error("callback for output '{0}' is already registered")]
    DuplicateOutput(String),

    #[error("callback graph contains a cycle through '{tile}'")]
    CircularDependency { tile: String },
}
