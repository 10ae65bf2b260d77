//! Error types for item banks, estimation and sessions.

use thiserror::Error;

use crate::item::ItemId;

#[derive(Debug, Error)]
pub enum IrtError {
    #[error("cannot estimate ability from an empty response set")]
    EmptyResponses,

    #[error("item {id}: discrimination must be a finite positive number, got {value}")]
    InvalidDiscrimination { id: ItemId, value: f64 },

    #[error("item {id}: difficulty must be finite, got {value}")]
    InvalidDifficulty { id: ItemId, value: f64 },

    #[error("item {id}: response {value} outside the scale 1..={max}")]
    ResponseOutOfRange { id: ItemId, value: i32, max: u32 },

    #[error("unknown item: {0}")]
    UnknownItem(ItemId),

    #[error("duplicate item id: {0}")]
    DuplicateItem(ItemId),

    #[error("item {0} is not available in the pool")]
    ItemNotAvailable(ItemId),

    #[error("session already finished")]
    SessionFinished,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for IrtError {
    fn from(err: serde_json::Error) -> Self {
        IrtError::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for IrtError {
    fn from(err: toml::de::Error) -> Self {
        IrtError::Parse(err.to_string())
    }
}

pub type IrtResult<T> = Result<T, IrtError>;
