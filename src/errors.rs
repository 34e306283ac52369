// src/errors.rs

//! Crate-wide error type.
//!
//! Only two kinds of failure stop the process: [`RfileError::User`] (bad
//! rfile, missing dependency, missing watch path, ...) and
//! [`RfileError::Internal`] (an engine invariant broke). A task that exits
//! nonzero is *not* an error; it comes back as data in
//! [`RunOutput`](crate::engine::RunOutput).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RfileError {
    #[error("{0}")]
    User(String),

    #[error("{0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("file watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RfileError {
    pub fn user(msg: impl Into<String>) -> Self {
        RfileError::User(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        RfileError::Internal(msg.into())
    }

    /// Whether this error is the user's to fix (as opposed to an rfile bug or
    /// an environment failure).
    pub fn is_user_error(&self) -> bool {
        matches!(self, RfileError::User(_))
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RfileError>;
