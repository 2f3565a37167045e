use thiserror::Error;
use tokio::task::JoinError;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("{task} loop failed to join: {source}")]
    Join {
        task: &'static str,
        #[source]
        source: JoinError,
    },
}
