use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncoderError {
    #[error("{operation} failed (0x{code:08x})")]
    Transform { operation: &'static str, code: u32 },

    #[error("transform activation failed: {0}")]
    Activation(String),

    #[error("no H.264 transform available")]
    NoTransform,

    #[error("media type negotiation failed: {0}")]
    TypeNegotiation(String),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("buffer allocation failed: {0}")]
    Allocation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EncoderError {
    /// Hard transform failure, tagged with the originating operation so the
    /// platform status code stays diagnosable from logs alone.
    pub fn transform(operation: &'static str, code: u32) -> Self {
        EncoderError::Transform { operation, code }
    }
}

pub type Result<T> = std::result::Result<T, EncoderError>;
