use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessorError>;

#[derive(Debug, Error)]
pub enum ProcessorError {
    /// The pending test source could not be read or acknowledged.
    #[error("Source error: {0}")]
    Source(String),

    /// A result could not be handed to the publisher.
    #[error("Publish error: {0}")]
    Publish(String),

    /// A target's run could not be carried out at all.
    #[error("Run failed for {target}: {reason}")]
    Run { target: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
