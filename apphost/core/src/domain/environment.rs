// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::error::AppHostError;
use crate::domain::parameter::{ParameterResource, ParameterValues};

/// A value bound to an environment variable, resolved when the container is
/// launched rather than when it is declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentValue {
    Literal(String),
    Parameter(ParameterResource),
}

impl EnvironmentValue {
    pub fn resolve(&self, values: &ParameterValues) -> Result<String, AppHostError> {
        match self {
            Self::Literal(value) => Ok(value.clone()),
            Self::Parameter(param) => param.value(values),
        }
    }

    pub fn manifest_expression(&self) -> String {
        match self {
            Self::Literal(value) => value.clone(),
            Self::Parameter(param) => param.manifest_expression(),
        }
    }

    pub fn is_secret(&self) -> bool {
        matches!(self, Self::Parameter(p) if p.is_secret())
    }
}

impl From<&str> for EnvironmentValue {
    fn from(value: &str) -> Self {
        Self::Literal(value.to_string())
    }
}

impl From<String> for EnvironmentValue {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

impl From<ParameterResource> for EnvironmentValue {
    fn from(value: ParameterResource) -> Self {
        Self::Parameter(value)
    }
}

/// Passed to environment callbacks, which fill in `environment_variables`.
#[derive(Debug, Default)]
pub struct EnvironmentContext {
    pub environment_variables: BTreeMap<String, EnvironmentValue>,
}

impl EnvironmentContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<EnvironmentValue>) {
        self.environment_variables.insert(key.into(), value.into());
    }
}

pub type EnvironmentCallback =
    Arc<dyn Fn(&mut EnvironmentContext) -> Result<(), AppHostError> + Send + Sync>;

/// Resolve every binding to its concrete string value.
pub fn resolve_environment(
    bindings: &BTreeMap<String, EnvironmentValue>,
    values: &ParameterValues,
) -> Result<BTreeMap<String, String>, AppHostError> {
    bindings
        .iter()
        .map(|(key, value)| Ok((key.clone(), value.resolve(values)?)))
        .collect()
}
