pub type SlidecastResult<T> = Result<T, SlidecastError>;

#[derive(thiserror::Error, Debug)]
pub enum SlidecastError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("speech synthesis error: {0}")]
    Synthesis(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SlidecastError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn synthesis(msg: impl Into<String>) -> Self {
        Self::Synthesis(msg.into())
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }
}
