//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`KeyNotFound`] thrown when an item are not found.
//! - [`ExistingKey`] thrown when a unique value is already taken.
//! - [`NoEffect`] thrown when a mutation matched zero rows.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`NoEffect`]: EngineError::NoEffect
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid consumers: {0}")]
    InvalidConsumers(String),
    #[error("{0}")]
    NoEffect(String),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Publish failed: {0}")]
    Publish(String),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidConsumers(a), Self::InvalidConsumers(b)) => a == b,
            (Self::NoEffect(a), Self::NoEffect(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            (Self::Publish(a), Self::Publish(b)) => a == b,
            _ => false,
        }
    }
}
