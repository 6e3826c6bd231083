// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use thiserror::Error;

use crate::domain::runtime::RuntimeError;

/// Errors raised while building or starting the application graph.
///
/// Construction-time errors abort graph construction. Errors returned from a
/// deferred callback abort the startup of the whole run.
#[derive(Debug, Error)]
pub enum AppHostError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Resource '{0}' already exists in the application model")]
    DuplicateResource(String),
    #[error("Endpoint '{endpoint}' already exists on resource '{resource}'")]
    DuplicateEndpoint { resource: String, endpoint: String },
    #[error("Endpoint '{endpoint}' not found on resource '{resource}'")]
    EndpointNotFound { resource: String, endpoint: String },
    #[error("Parameter '{0}' has no value. Set it under spec.parameters or via PARAMETERS__{1}")]
    MissingParameterValue(String, String),
    #[error("Application startup was cancelled")]
    Cancelled,
    #[error("Callback failed for resource '{resource}': {message}")]
    Callback { resource: String, message: String },
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
