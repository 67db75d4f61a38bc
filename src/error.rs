pub type HoverfxResult<T> = Result<T, HoverfxError>;

#[derive(thiserror::Error, Debug)]
pub enum HoverfxError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("animation error: {0}")]
    Animation(String),

    #[error("effect error: {0}")]
    Effect(String),

    #[error("resource error: {0}")]
    Resource(String),

    #[error("state error: {0}")]
    State(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HoverfxError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn animation(msg: impl Into<String>) -> Self {
        Self::Animation(msg.into())
    }

    pub fn effect(msg: impl Into<String>) -> Self {
        Self::Effect(msg.into())
    }

    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }
}
