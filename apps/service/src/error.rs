use std::any::Any;

use thiserror::Error;

/// Failure to retrieve a target's page. Collapses every transport problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("server responded with status {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::Connect(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Request(err.to_string())
        }
    }
}

/// A pattern matched but its capture could not be read as the expected type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("stock capture {0:?} is not a non-negative integer")]
    InvalidStock(String),
    #[error("price capture {0:?} is not a non-negative decimal")]
    InvalidPrice(String),
}

/// Failure to hand a message to the notification sink.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("notification sink responded with status {0}")]
    Status(u16),
    #[error("notification rejected: {0}")]
    Rejected(String),
}

/// Unexpected failure while handling one target's result within a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("no result was collected for {0}")]
    MissingResult(String),
    #[error("target check panicked: {0}")]
    Panicked(String),
}

/// Failure that escaped the cycle coordinator entirely.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CycleError {
    #[error("monitoring cycle panicked: {0}")]
    Panicked(String),
}

/// Text of a caught panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
