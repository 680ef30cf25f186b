// Copyright 2026 Platform Operator Maintainers
// SPDX-License-Identifier: Apache-2.0

//! Operator internals

/// Generic Error for controller lifecycle
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Kubernetes internal error
    #[error("Kube Error: {0}")]
    KubeError(#[from] kube::Error),

    /// `serde_json` errors
    #[error("Serialization Error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// `serde_yaml` errors
    #[error("Yaml Error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A spec side-channel annotation holds an unparsable payload
    #[error("conversion corrupted annotation {annotation}: {source}")]
    CorruptedAnnotation {
        /// The offending annotation key
        annotation: String,
        /// The underlying parse failure
        source: serde_yaml::Error,
    },

    /// Startup-time configuration errors
    #[error("Configuration Error: {0}")]
    Configuration(String),

    /// Invalid removal-list regular expression
    #[error("Regex Error: {0}")]
    RegexError(#[from] regex::Error),

    /// A destination object is retained and cannot be replaced
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Generic string error messages
    #[error("{0}")]
    Message(String),
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Message(msg)
    }
}

/// Generic result type to be used in the controller
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub mod cleanup;
pub mod config;
pub mod constants;
pub mod controller;
pub mod conversion;
mod diagnostics;
pub mod infra;
pub mod lease;
pub mod namespace_cache;
pub mod telemetry;
pub mod webhook;
pub mod workspace_config;

pub use crate::diagnostics::*;
