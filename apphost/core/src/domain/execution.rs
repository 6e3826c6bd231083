// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// How the application graph is being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Interactive local run: containers are started directly.
    Run,
    /// Manifest generation: a static deployment description is emitted.
    Publish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionContext {
    mode: ExecutionMode,
}

impl ExecutionContext {
    pub fn new(mode: ExecutionMode) -> Self {
        Self { mode }
    }

    pub fn is_run_mode(&self) -> bool {
        self.mode == ExecutionMode::Run
    }

    pub fn is_publish_mode(&self) -> bool {
        self.mode == ExecutionMode::Publish
    }
}

/// Stable identity of the application, used to derive names that must survive
/// across runs (e.g. volume names).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationIdentity {
    name: String,
    hash: String,
}

impl ApplicationIdentity {
    /// Derive the identity from the application name and the directory the
    /// AppHost lives in. The hash is the first 10 hex chars of SHA-256 over the
    /// directory path.
    pub fn new(name: impl Into<String>, app_dir: impl AsRef<Path>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(app_dir.as_ref().to_string_lossy().as_bytes());
        let digest = hex::encode(hasher.finalize());

        Self {
            name: name.into(),
            hash: digest[..10].to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }
}
