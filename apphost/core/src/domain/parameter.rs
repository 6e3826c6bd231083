// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::error::AppHostError;

const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const NUMERIC: &[u8] = b"0123456789";
const SPECIAL: &[u8] = b"-_.~!*()";

/// Policy for generating a parameter value when none is supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateParameterDefault {
    pub min_length: usize,
    pub lower: bool,
    pub upper: bool,
    pub numeric: bool,
    pub special: bool,
}

impl GenerateParameterDefault {
    /// The policy used for synthesized passwords.
    pub fn password() -> Self {
        Self {
            min_length: 22,
            lower: true,
            upper: true,
            numeric: true,
            special: true,
        }
    }

    /// Generate a value with at least one character from every enabled class.
    pub fn generate(&self) -> String {
        let classes: Vec<&[u8]> = [
            (self.lower, LOWER),
            (self.upper, UPPER),
            (self.numeric, NUMERIC),
            (self.special, SPECIAL),
        ]
        .into_iter()
        .filter_map(|(enabled, set)| enabled.then_some(set))
        .collect();

        let classes = if classes.is_empty() { vec![LOWER] } else { classes };
        let alphabet: Vec<u8> = classes.iter().flat_map(|c| c.iter().copied()).collect();
        let length = self.min_length.max(classes.len());

        let mut rng = rand::rng();
        let mut out: Vec<u8> = classes
            .iter()
            .map(|set| set[rng.random_range(0..set.len())])
            .collect();
        while out.len() < length {
            out.push(alphabet[rng.random_range(0..alphabet.len())]);
        }
        out.shuffle(&mut rng);

        String::from_utf8_lossy(&out).into_owned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterSource {
    /// Value is looked up by parameter name when the graph is launched.
    Configuration,
    /// Value was generated when the parameter was declared.
    Generated {
        value: String,
        policy: GenerateParameterDefault,
    },
}

/// A named input value of the application, optionally secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterResource {
    name: String,
    secret: bool,
    source: ParameterSource,
}

impl ParameterResource {
    pub fn configured(name: impl Into<String>, secret: bool) -> Self {
        Self {
            name: name.into(),
            secret,
            source: ParameterSource::Configuration,
        }
    }

    pub fn generated(name: impl Into<String>, policy: GenerateParameterDefault) -> Self {
        let value = policy.generate();
        Self {
            name: name.into(),
            secret: true,
            source: ParameterSource::Generated { value, policy },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_secret(&self) -> bool {
        self.secret
    }

    pub fn source(&self) -> &ParameterSource {
        &self.source
    }

    /// Resolve the parameter to its value.
    pub fn value(&self, values: &ParameterValues) -> Result<String, AppHostError> {
        match &self.source {
            ParameterSource::Generated { value, .. } => Ok(value.clone()),
            ParameterSource::Configuration => values.get(&self.name).ok_or_else(|| {
                AppHostError::MissingParameterValue(self.name.clone(), env_key(&self.name))
            }),
        }
    }

    /// Expression used in the publish manifest to reference this parameter.
    pub fn manifest_expression(&self) -> String {
        format!("{{{}.value}}", self.name)
    }
}

/// Parameter values supplied by configuration, with environment fallback.
#[derive(Debug, Clone, Default)]
pub struct ParameterValues {
    values: HashMap<String, String>,
    read_environment: bool,
}

impl ParameterValues {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values, read_environment: false }
    }

    /// Also consult `PARAMETERS__<NAME>` environment variables for names that
    /// are not configured explicitly.
    pub fn with_environment(mut self) -> Self {
        self.read_environment = true;
        self
    }

    pub fn get(&self, name: &str) -> Option<String> {
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        if self.read_environment {
            return std::env::var(env_key(name)).ok();
        }
        None
    }
}

fn env_key(name: &str) -> String {
    format!("PARAMETERS__{}", name.to_uppercase().replace('-', "_"))
}
